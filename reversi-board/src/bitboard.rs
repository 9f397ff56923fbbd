//! Low-level bitboard operations.
//!
//! Under the hood, all these operations work on u64 bitboards. By convention,
//! the MSB is the upper-left of the board (A1), and uses row-major order, so
//! square index 0 is H8 and square index 63 is A1.
//!
//! Everything here is branch-light and unchecked: callers are responsible for
//! passing disjoint mover / opponent masks.

use crate::location::{Location, LocationList};
use crate::utils;
use derive_more::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, From, Into, Not,
};
use std::fmt::{self, Display, Formatter};

/// Holds a single bit per location on an Othello board.
/// Wraps [`u64`] for efficient bit-twiddling, but avoids mixing with numerics.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    Default,
    From,
    Into,
    BitAnd,
    BitAndAssign,
    BitOr,
    BitOrAssign,
    BitXor,
    BitXorAssign,
    Not,
)]
pub struct Bitboard(u64);

/// Starting bitboard for Black (E4, D5).
pub const BLACK_START: Bitboard = Bitboard(0x0000_0008_1000_0000);

/// Starting bitboard for White (D4, E5).
pub const WHITE_START: Bitboard = Bitboard(0x0000_0010_0800_0000);

/// The four corners.
pub const CORNERS: Bitboard = Bitboard(0x8100_0000_0000_0081);

/// The outer ring of the board, corners included.
pub const EDGES: Bitboard = Bitboard(0xFF81_8181_8181_81FF);

/// Squares diagonally adjacent to a corner (B2, G2, B7, G7).
pub const X_SQUARES: Bitboard = Bitboard(0x0042_0000_0000_4200);

/// Edge squares orthogonally adjacent to a corner.
pub const C_SQUARES: Bitboard = Bitboard(0x4281_0000_0000_8142);

// Column masks. File A holds the most significant bit of every row.
const FILE_A: u64 = 0x8080_8080_8080_8080;
const FILE_H: u64 = 0x0101_0101_0101_0101;
const NOT_FILE_A: u64 = !FILE_A;
const NOT_FILE_H: u64 = !FILE_H;

impl Display for Bitboard {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        utils::format_grid(f, |loc| match self.contains(loc) {
            false => '.',
            true => '#',
        })
    }
}

impl Bitboard {
    /// A bitboard with no squares set.
    pub const EMPTY: Self = Self(0);

    /// A bitboard with every square set.
    pub const FULL: Self = Self(u64::MAX);

    /// Count the number of occupied spaces in the bitboard.
    #[inline]
    pub fn count_occupied(self) -> u8 {
        self.0.count_ones() as u8
    }

    /// Count the number of empty spaces in the bitboard.
    #[inline]
    pub fn count_empty(self) -> u8 {
        self.0.count_zeros() as u8
    }

    /// Return true if this bitboard is empty.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Return true if `loc` is set in this bitboard.
    #[inline]
    pub fn contains(self, loc: Location) -> bool {
        !(self & Bitboard::from(loc)).is_empty()
    }

    /// The set square with the lowest index, if any.
    #[inline]
    pub fn lowest(self) -> Option<Location> {
        if self.is_empty() {
            None
        } else {
            Some(Location::from_index(self.0.trailing_zeros() as u8))
        }
    }

    /// The set squares of this bitboard, lowest index first.
    #[inline]
    pub fn locations(self) -> LocationList {
        LocationList::from(self)
    }
}

/// One of the eight compass directions on the board.
/// North is towards row 1, east is towards file H.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Bit distance of one step, and whether the step moves towards the MSB.
    #[inline]
    const fn step(self) -> (u32, bool) {
        match self {
            Direction::North => (8, true),
            Direction::NorthEast => (7, true),
            Direction::East => (1, false),
            Direction::SouthEast => (9, false),
            Direction::South => (8, false),
            Direction::SouthWest => (7, false),
            Direction::West => (1, true),
            Direction::NorthWest => (9, true),
        }
    }

    /// Mask clearing the file a step in this direction would wrap into.
    #[inline]
    const fn wrap_mask(self) -> u64 {
        match self {
            Direction::North | Direction::South => u64::MAX,
            Direction::NorthEast | Direction::East | Direction::SouthEast => NOT_FILE_A,
            Direction::SouthWest | Direction::West | Direction::NorthWest => NOT_FILE_H,
        }
    }

    /// Shift `bits` by `steps` steps in this direction, without edge masking.
    #[inline]
    fn raw_shift(self, bits: u64, steps: u32) -> u64 {
        let (distance, towards_msb) = self.step();
        if towards_msb {
            bits << (distance * steps)
        } else {
            bits >> (distance * steps)
        }
    }

    /// Move every set square one step in this direction.
    /// Squares that would leave the board (or wrap to the far file) are dropped.
    #[inline]
    pub fn shift(self, bitboard: Bitboard) -> Bitboard {
        Bitboard(self.raw_shift(bitboard.0, 1) & self.wrap_mask())
    }

    /// Kogge-Stone occluded fill: extend `generator` through consecutive squares
    /// of `propagator` in this direction. Three doubling steps cover the board.
    #[inline]
    fn occluded_fill(self, generator: u64, propagator: u64) -> u64 {
        let mut gen = generator;
        let mut pro = propagator & self.wrap_mask();

        gen |= pro & self.raw_shift(gen, 1);
        pro &= self.raw_shift(pro, 1);
        gen |= pro & self.raw_shift(gen, 2);
        pro &= self.raw_shift(pro, 2);
        gen |= pro & self.raw_shift(gen, 4);

        gen
    }
}

/// Score a board as: # my pieces - # opponent pieces.
/// Faster than [`score_winner_gets_empties()`], but less common.
#[inline]
pub fn score_absolute_difference(active: Bitboard, opponent: Bitboard) -> i8 {
    (active.0.count_ones() as i8) - (opponent.0.count_ones() as i8)
}

/// Score a board as: # my spaces - # opponent spaces, where empty spaces are scored for the winner.
#[inline]
pub fn score_winner_gets_empties(active: Bitboard, opponent: Bitboard) -> i8 {
    let absolute_difference = score_absolute_difference(active, opponent);
    let empties = (active | opponent).0.count_zeros() as i8;

    if absolute_difference.is_positive() {
        absolute_difference + empties
    } else if absolute_difference.is_negative() {
        absolute_difference - empties
    } else {
        0
    }
}

/// Compute a mask of the legal moves for the active player from
/// masks of the active player's pieces and the opponent's pieces.
#[inline]
pub fn move_mask(active: Bitboard, opponent: Bitboard) -> Bitboard {
    let empties = !(active.0 | opponent.0);
    let mut moves = 0;

    for dir in Direction::ALL {
        // Opponent runs reachable from one of our pieces; one more step must land on an empty.
        let run = dir.occluded_fill(active.0, opponent.0) & opponent.0;
        moves |= dir.shift(Bitboard(run)).0;
    }

    Bitboard(moves & empties)
}

/// Compute the opponent pieces flipped by the active player playing at `loc`.
/// Empty if `loc` is occupied or would flip nothing (that is, the move is illegal).
#[inline]
pub fn flips_for(active: Bitboard, opponent: Bitboard, loc: Location) -> Bitboard {
    let placed = Bitboard::from(loc);
    if !((active | opponent) & placed).is_empty() {
        return Bitboard::EMPTY;
    }

    let mut flips = Bitboard::EMPTY;
    for dir in Direction::ALL {
        let mut run = Bitboard::EMPTY;
        let mut cursor = dir.shift(placed);

        while !(cursor & opponent).is_empty() {
            run |= cursor;
            cursor = dir.shift(cursor);
        }

        // Only a run closed by one of our own pieces is captured.
        if !(cursor & active).is_empty() {
            flips |= run;
        }
    }

    flips
}

/// Every square adjacent (in any of the 8 directions) to a set square of `bitboard`.
#[inline]
pub fn adjacent(bitboard: Bitboard) -> Bitboard {
    Direction::ALL
        .iter()
        .fold(Bitboard::EMPTY, |acc, dir| acc | dir.shift(bitboard))
}
