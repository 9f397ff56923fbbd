//! A [`Board`] tagged with its side to move and Zobrist hash.
//!
//! [`Position`] is what search engines mutate: every move returns an
//! [`UndoState`], and [`Position::unmake`] restores the position bit-exactly.
//! The hash is maintained incrementally and always equals a from-scratch
//! [`ZobristKeys::hash`](crate::zobrist::ZobristKeys::hash).

use crate::bitboard::Bitboard;
use crate::board::{Board, MoveError};
use crate::game::Player;
use crate::location::{Location, LocationList};
use crate::utils;
use crate::zobrist;
use derive_more::{Display, Error};
use std::fmt;

/// A board, whose turn it is, and the matching hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    /// Discs from the perspective of `side_to_move`.
    pub board: Board,
    pub side_to_move: Player,
    pub hash: u64,
}

/// Everything needed to take back one move or pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UndoState {
    board: Board,
    side_to_move: Player,
    hash: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
pub enum PositionError {
    #[display(fmt = "black and white discs overlap:\n{}", squares)]
    Overlap { squares: Bitboard },
}

/// The result of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win(Player),
    Draw,
}

/// What the side to move can do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Moves(LocationList),
    /// No legal placement, but the opponent can move.
    MustPass,
    /// Neither side can move.
    Finished(Outcome),
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// The standard starting position, Black to move.
    pub fn new() -> Self {
        Self::from_board(Board::new(), Player::Black)
    }

    /// Wrap a mover-relative board, hashing it from scratch.
    pub fn from_board(board: Board, side_to_move: Player) -> Self {
        let (black, white) = match side_to_move {
            Player::Black => (board.mover, board.opponent),
            Player::White => (board.opponent, board.mover),
        };
        Self {
            board,
            side_to_move,
            hash: zobrist::keys().hash(black, white, side_to_move),
        }
    }

    /// Build a position from absolute colour bitboards.
    pub fn from_colors(
        black: Bitboard,
        white: Bitboard,
        side_to_move: Player,
    ) -> Result<Self, PositionError> {
        let overlap = black & white;
        if !overlap.is_empty() {
            return Err(PositionError::Overlap { squares: overlap });
        }

        let board = match side_to_move {
            Player::Black => Board::from_bitboards(black, white),
            Player::White => Board::from_bitboards(white, black),
        };
        Ok(Self::from_board(board, side_to_move))
    }

    /// The discs owned by `player`.
    #[inline]
    pub fn discs(&self, player: Player) -> Bitboard {
        if player == self.side_to_move {
            self.board.mover
        } else {
            self.board.opponent
        }
    }

    #[inline]
    pub fn black(&self) -> Bitboard {
        self.discs(Player::Black)
    }

    #[inline]
    pub fn white(&self) -> Bitboard {
        self.discs(Player::White)
    }

    /// Discs placed since the starting position (passes do not count).
    #[inline]
    pub fn move_number(&self) -> u8 {
        self.board.count_discs().saturating_sub(4)
    }

    fn snapshot(&self) -> UndoState {
        UndoState {
            board: self.board,
            side_to_move: self.side_to_move,
            hash: self.hash,
        }
    }

    /// Play at `loc` for the side to move. Illegal moves leave the position untouched.
    pub fn make_move(&mut self, loc: Location) -> Result<UndoState, MoveError> {
        let (board, flips) = self.board.play(loc)?;
        let undo = self.snapshot();

        self.hash = zobrist::keys().update(self.hash, self.side_to_move, loc, flips);
        self.board = board;
        self.side_to_move = !self.side_to_move;
        Ok(undo)
    }

    /// Play at `loc` with precomputed flips from [`Board::flips`].
    #[inline]
    pub fn make_move_unchecked(&mut self, loc: Location, flips: Bitboard) -> UndoState {
        let undo = self.snapshot();

        self.hash = zobrist::keys().update(self.hash, self.side_to_move, loc, flips);
        self.board = self.board.play_unchecked(loc, flips);
        self.side_to_move = !self.side_to_move;
        undo
    }

    /// Hand the turn over without placing a disc.
    #[inline]
    pub fn make_pass(&mut self) -> UndoState {
        let undo = self.snapshot();

        self.hash = zobrist::keys().toggle_side(self.hash);
        self.board = self.board.pass();
        self.side_to_move = !self.side_to_move;
        undo
    }

    /// Take back the move that produced `undo`.
    #[inline]
    pub fn unmake(&mut self, undo: UndoState) {
        self.board = undo.board;
        self.side_to_move = undo.side_to_move;
        self.hash = undo.hash;
    }

    pub fn status(&self) -> Status {
        let moves = self.board.legal_moves();
        if !moves.is_empty() {
            return Status::Moves(moves);
        }
        if self.board.pass().has_moves() {
            return Status::MustPass;
        }

        let black = self.black().count_occupied();
        let white = self.white().count_occupied();
        let outcome = match black.cmp(&white) {
            std::cmp::Ordering::Greater => Outcome::Win(Player::Black),
            std::cmp::Ordering::Less => Outcome::Win(Player::White),
            std::cmp::Ordering::Equal => Outcome::Draw,
        };
        Status::Finished(outcome)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (black, white) = (self.black(), self.white());
        utils::format_grid(f, |loc| {
            if black.contains(loc) {
                'X'
            } else if white.contains(loc) {
                'O'
            } else {
                '.'
            }
        })?;
        write!(f, "\n{} to move", self.side_to_move)
    }
}
