//! `reversi-engine` chooses Othello moves on top of `reversi-board`.
//!
//!  - [`eval`] scores positions with phase-dependent heuristics.
//!  - [`tt`] caches search results by Zobrist hash.
//!  - [`book`] replays historical WTHOR games into an opening book.
//!  - [`search`] is the iterative-deepening negamax engine that uses all of the above.
//!  - [`strategy`] wraps the engine and simpler players behind one closed set of difficulties.
//!  - [`worker`] runs a strategy on a background thread so a UI never blocks on it.

pub mod book;
pub mod config;
pub mod eval;
pub mod search;
pub mod strategy;
pub mod tt;
pub mod worker;

/// Search and evaluation scores, from the point of view of the side to move.
pub type Score = i32;

pub use config::EngineConfig;
pub use search::{Budget, SearchEngine, SearchStats};
pub use strategy::{Difficulty, Strategy};
pub use worker::Thinker;
