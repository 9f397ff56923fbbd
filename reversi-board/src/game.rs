//! Implements game-level Othello logic.
//!
//! For correctness, this higher-level interface is preferred, but for
//! performance you may use [`Board`](crate::Board) or [`Position`] directly.

use crate::board::MoveError;
use crate::location::{Location, LocationList, ParseLocationError};
use crate::position::{Outcome, Position, Status};
use derive_more::{Display, Error};
use std::fmt;
use std::str::FromStr;

/// One of the two players in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum Player {
    Black,
    White,
}

impl Default for Player {
    /// Gets the starting player (black).
    fn default() -> Self {
        Self::Black
    }
}

impl std::ops::Not for Player {
    type Output = Self;

    /// Gets the other player.
    fn not(self) -> Self {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }
}

impl Player {
    /// Stable index for per-colour tables: 0 for Black, 1 for White.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Player::Black => 0,
            Player::White => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
#[display(fmt = "expected \"black\" or \"white\"")]
pub struct ParsePlayerError;

impl FromStr for Player {
    type Err = ParsePlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" | "b" => Ok(Player::Black),
            "white" | "w" => Ok(Player::White),
            _ => Err(ParsePlayerError),
        }
    }
}

/// An action in an Othello game: pass or place a disc.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Piece(Location),
    Pass,
}

impl From<Location> for Move {
    fn from(loc: Location) -> Self {
        Self::Piece(loc)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Piece(loc) => write!(f, "{}", loc),
            Move::Pass => f.write_str("PASS"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
#[display(fmt = "invalid move string")]
pub struct ParseMoveError;

impl From<ParseLocationError> for ParseMoveError {
    fn from(_: ParseLocationError) -> Self {
        ParseMoveError
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("pass") {
            return Ok(Move::Pass);
        }
        Ok(Move::Piece(s.parse()?))
    }
}

/// The complete state of an Othello game, with checked transitions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Game {
    position: Position,
    last_move: Option<Move>,
}

impl From<Position> for Game {
    fn from(position: Position) -> Self {
        Self {
            position,
            last_move: None,
        }
    }
}

impl Game {
    /// A new game from the standard starting position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `mv` for the player to move, returning the resulting game.
    /// Passing is only allowed when no placement is legal.
    pub fn apply_move(self, mv: Move) -> Result<Self, MoveError> {
        let mut position = self.position;

        match (mv, self.status()) {
            (_, Status::Finished(_)) => return Err(MoveError::GameOver),
            (Move::Pass, Status::Moves(_)) => return Err(MoveError::PassWithMoves),
            (Move::Pass, Status::MustPass) => {
                position.make_pass();
            }
            (Move::Piece(loc), _) => {
                position.make_move(loc)?;
            }
        }

        Ok(Self {
            position,
            last_move: Some(mv),
        })
    }

    /// The underlying position, for engines.
    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn side_to_move(&self) -> Player {
        self.position.side_to_move
    }

    #[inline]
    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn status(&self) -> Status {
        self.position.status()
    }

    pub fn legal_moves(&self) -> LocationList {
        self.position.board.legal_moves()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status(), Status::Finished(_))
    }

    /// The winner of a finished game; `None` while in progress or drawn.
    pub fn winner(&self) -> Option<Player> {
        match self.status() {
            Status::Finished(Outcome::Win(player)) => Some(player),
            _ => None,
        }
    }

    pub fn disc_count(&self, player: Player) -> u8 {
        self.position.discs(player).count_occupied()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.position)?;
        if self.last_move == Some(Move::Pass) {
            f.write_str("\n(Last move was a pass)")?;
        }
        Ok(())
    }
}
