//! Othello board dynamics from the point of view of the player to move.
//!
//! A [`Board`] is a pair of disjoint bitboards: the mover's discs and the
//! opponent's discs. Making a move hands the board to the other player, so
//! the result is again seen from the (new) mover's perspective.

use crate::bitboard::{self, Bitboard, BLACK_START, WHITE_START};
use crate::location::{Location, LocationList};
use crate::utils;
use derive_more::{Display, Error};
use std::fmt;

/// A pair of bitboards storing the complete disc placement.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Board {
    pub mover: Bitboard,
    pub opponent: Bitboard,
}

/// Why a requested move was refused. Refused moves are never applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    #[display(fmt = "{} is already occupied", location)]
    Occupied { location: Location },
    #[display(fmt = "{} does not flip any discs", location)]
    NoFlips { location: Location },
    #[display(fmt = "cannot pass while a legal move exists")]
    PassWithMoves,
    #[display(fmt = "the game is already finished")]
    GameOver,
}

impl Default for Board {
    /// The standard starting position, Black to move.
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The standard starting position from Black's (the first mover's) perspective.
    pub const fn new() -> Self {
        Self {
            mover: BLACK_START,
            opponent: WHITE_START,
        }
    }

    /// Build a board from the mover's and the opponent's discs.
    /// The two bitboards must not overlap.
    pub const fn from_bitboards(mover: Bitboard, opponent: Bitboard) -> Self {
        Self { mover, opponent }
    }

    /// Hand the turn to the opponent without placing a disc.
    #[inline]
    pub fn pass(self) -> Self {
        Self {
            mover: self.opponent,
            opponent: self.mover,
        }
    }

    /// Get the legal moves for the mover.
    #[inline]
    pub fn legal_moves(self) -> LocationList {
        bitboard::move_mask(self.mover, self.opponent).locations()
    }

    /// Whether the mover has at least one legal move.
    #[inline]
    pub fn has_moves(self) -> bool {
        !bitboard::move_mask(self.mover, self.opponent).is_empty()
    }

    /// The discs flipped if the mover plays at `loc`; empty if that move is illegal.
    #[inline]
    pub fn flips(self, loc: Location) -> Bitboard {
        bitboard::flips_for(self.mover, self.opponent, loc)
    }

    #[inline]
    pub fn is_legal(self, loc: Location) -> bool {
        !self.flips(loc).is_empty()
    }

    /// Play at `loc`, returning the board from the opponent's perspective and the flipped discs.
    pub fn play(self, loc: Location) -> Result<(Self, Bitboard), MoveError> {
        if self.occupied_mask().contains(loc) {
            return Err(MoveError::Occupied { location: loc });
        }

        let flips = self.flips(loc);
        if flips.is_empty() {
            return Err(MoveError::NoFlips { location: loc });
        }

        Ok((self.play_unchecked(loc, flips), flips))
    }

    /// Play at `loc` with a precomputed, non-empty `flips` mask.
    /// Results in inconsistent state if `flips` was not computed for this board and location.
    #[inline]
    pub fn play_unchecked(self, loc: Location, flips: Bitboard) -> Self {
        Self {
            mover: self.opponent ^ flips,
            opponent: self.mover | flips | loc.to_onehot(),
        }
    }

    /// Neither player can move: the game is over.
    #[inline]
    pub fn is_finished(self) -> bool {
        !self.has_moves() && !self.pass().has_moves()
    }

    /// Get a mask indicating where the occupied spaces are.
    #[inline]
    pub fn occupied_mask(self) -> Bitboard {
        self.mover | self.opponent
    }

    /// Get a mask indicating where the empty spaces are.
    #[inline]
    pub fn empty_mask(self) -> Bitboard {
        !self.occupied_mask()
    }

    #[inline]
    pub fn count_empty(self) -> u8 {
        self.occupied_mask().count_empty()
    }

    /// Number of discs on the board.
    #[inline]
    pub fn count_discs(self) -> u8 {
        self.occupied_mask().count_occupied()
    }

    /// Score a board as: # my pieces - # opponent pieces.
    #[inline]
    pub fn score_absolute_difference(self) -> i8 {
        bitboard::score_absolute_difference(self.mover, self.opponent)
    }

    /// Score a board as: # my spaces - # opponent spaces, where empty spaces are scored for the winner.
    #[inline]
    pub fn score_winner_gets_empties(self) -> i8 {
        bitboard::score_winner_gets_empties(self.mover, self.opponent)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        utils::format_grid(f, |loc| {
            if self.mover.contains(loc) {
                '#'
            } else if self.opponent.contains(loc) {
                'O'
            } else {
                '.'
            }
        })
    }
}
