//! Code for working with [`Location`]s on the Othello board.

use crate::bitboard::Bitboard;
use crate::EDGE_LENGTH;
use derive_more::{Display, Error, From, Into};
use std::fmt::{self, Formatter, Write};

/// A location on the Othello board.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Into)]
pub struct Location(Bitboard);

/// A list of locations on the Othello board, which can be iterated to retrieve them.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord, From, Into)]
pub struct LocationList(Bitboard);

impl Location {
    /// Convert from a one-hot [`Bitboard`].
    /// Returns `None` unless exactly one square is set.
    #[inline]
    pub fn from_onehot(bitboard: Bitboard) -> Option<Self> {
        match bitboard.count_occupied() {
            1 => Some(Self(bitboard)),
            _ => None,
        }
    }

    /// Convert from a square index: 0 for H8, 63 for A1.
    #[inline]
    pub fn from_index(index: u8) -> Self {
        debug_assert!(index < 64);
        Self(Bitboard::from(1u64 << index))
    }

    /// Convert into a square index: 0 for H8, 63 for A1.
    #[inline]
    pub fn to_index(self) -> u8 {
        let bitboard: u64 = self.0.into();
        bitboard.trailing_zeros() as u8
    }

    /// Convert from zero-based row and column coordinates ((0, 0) is A1).
    /// Returns `None` if the coordinates are off the board.
    pub fn from_coords(row: usize, col: usize) -> Option<Self> {
        if row >= EDGE_LENGTH || col >= EDGE_LENGTH {
            return None;
        }

        let index = (EDGE_LENGTH - 1 - col) + (EDGE_LENGTH - 1 - row) * EDGE_LENGTH;
        Some(Self::from_index(index as u8))
    }

    /// Get the zero-based (row, column) coordinates.
    pub fn to_coords(self) -> (usize, usize) {
        let index = self.to_index() as usize;
        let row = EDGE_LENGTH - 1 - index / EDGE_LENGTH;
        let col = EDGE_LENGTH - 1 - index % EDGE_LENGTH;
        (row, col)
    }

    /// The one-hot bitboard for this location.
    #[inline]
    pub fn to_onehot(self) -> Bitboard {
        self.0
    }
}

/// Convert this [`Location`] into string notation ("A4").
impl fmt::Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (row, col) = self.to_coords();
        let row_str = "12345678".chars().nth(row).ok_or(fmt::Error)?;
        let col_str = "ABCDEFGH".chars().nth(col).ok_or(fmt::Error)?;
        f.write_char(col_str)?;
        f.write_char(row_str)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
#[display(fmt = "invalid location string")]
pub struct ParseLocationError;

/// Build a [`Location`] from a 1-indexed string notation ("A4").
impl std::str::FromStr for Location {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let col_str = chars.next().ok_or(ParseLocationError)?.to_ascii_uppercase();
        let col = "ABCDEFGH".find(col_str).ok_or(ParseLocationError)?;
        let row = chars
            .next()
            .ok_or(ParseLocationError)?
            .to_digit(10)
            .ok_or(ParseLocationError)? as usize;

        if row == 0 || chars.next().is_some() {
            return Err(ParseLocationError);
        }

        Self::from_coords(row - 1, col).ok_or(ParseLocationError)
    }
}

impl LocationList {
    /// Returns whether `loc` is in this list.
    #[inline]
    pub fn contains(self, loc: Location) -> bool {
        self.0.contains(loc)
    }

    /// Returns whether the list holds no locations.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    /// The location with the lowest index, if any.
    #[inline]
    pub fn first(self) -> Option<Location> {
        self.0.lowest()
    }
}

impl ExactSizeIterator for LocationList {
    fn len(&self) -> usize {
        self.0.count_occupied() as usize
    }
}

impl Iterator for LocationList {
    type Item = Location;

    fn next(&mut self) -> Option<Location> {
        let next_move = self.0.lowest()?;
        self.0 ^= next_move.0;
        Some(next_move)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }
}

impl fmt::Display for LocationList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let string = self
            .into_iter()
            .map(|mv| mv.to_string())
            .collect::<Vec<String>>()
            .join(", ");

        f.write_fmt(format_args!("[{}]", string))
    }
}
