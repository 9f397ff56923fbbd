//! Utilities used for testing and benchmarking.

pub mod perft;
pub use perft::{run_perft, run_perft_from};

mod playout;
pub use playout::random_playout;
