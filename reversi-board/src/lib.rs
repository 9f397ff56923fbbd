//! `reversi-board` is a fast Othello rules library for engines and UIs.
//!
//! This package implements three levels of abstraction:
//!
//!  - [`bitboard`] contains the raw, unchecked operations for working with Othello boards:
//!    edge-masked shifts, Kogge-Stone move generation and flip computation.
//!  - [`Board`] and [`Position`] implement the core game logic in the same fast way.
//!    [`Position`] adds the side to move, an incrementally updated Zobrist hash,
//!    and make/unmake with [`UndoState`]. This is what engines search with.
//!  - [`Game`] is a high-level, safe interface to all of the Othello game logic.
//!    It is slower but safer and more complete than [`Position`].

pub mod bitboard;
pub mod test_utils;
pub mod zobrist;

mod board;
mod game;
mod location;
mod position;
mod utils;

pub use bitboard::Bitboard;
pub use board::*;
pub use game::*;
pub use location::*;
pub use position::*;

/// The number of spaces on one edge of an Othello board.
pub const EDGE_LENGTH: usize = 8;

/// The number of spaces on an Othello board.
pub const NUM_SPACES: usize = 64;
