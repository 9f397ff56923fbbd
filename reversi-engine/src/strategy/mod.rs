//! Move choosers for each difficulty level.
//!
//! The set of players is closed: a [`Difficulty`] picks one [`StrategyKind`]
//! when the [`Strategy`] is built, and it never changes afterwards.

mod minimax;

pub use minimax::{AlphaBetaMinimax, FixedDepthMinimax, RootResult};

use crate::config::EngineConfig;
use crate::search::{MoveSource, SearchEngine, SearchStats};
use derive_more::{Display, Error};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use reversi_board::{Location, Position};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[display(fmt = "easy")]
    Easy,
    #[display(fmt = "normal")]
    Normal,
    #[display(fmt = "hard")]
    Hard,
    #[default]
    #[display(fmt = "extreme")]
    Extreme,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Extreme,
    ];
}

#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
#[display(fmt = "unknown difficulty {:?} (expected easy, normal, hard or extreme)", input)]
pub struct ParseDifficultyError {
    input: String,
}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" | "medium" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            "extreme" => Ok(Difficulty::Extreme),
            _ => Err(ParseDifficultyError {
                input: s.to_owned(),
            }),
        }
    }
}

/// The algorithm behind a [`Strategy`].
pub enum StrategyKind {
    /// A uniformly random legal move.
    Random(StdRng),
    FixedDepthMinimax(FixedDepthMinimax),
    AlphaBetaMinimax(AlphaBetaMinimax),
    /// The full engine: iterative deepening with a transposition table and an opening book.
    IterativeDeepening(Box<SearchEngine>),
}

/// A player for one difficulty, remembering statistics about its last move.
pub struct Strategy {
    difficulty: Difficulty,
    kind: StrategyKind,
    stats: SearchStats,
}

impl Strategy {
    /// Build the player for `config.difficulty`. Loads the opening book for
    /// [`Difficulty::Extreme`] if one is configured.
    pub fn new(config: &EngineConfig) -> Self {
        let kind = match config.difficulty {
            Difficulty::Easy => StrategyKind::Random(match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            }),
            Difficulty::Normal => StrategyKind::FixedDepthMinimax(FixedDepthMinimax::new(
                FixedDepthMinimax::DEFAULT_DEPTH,
            )),
            Difficulty::Hard => StrategyKind::AlphaBetaMinimax(AlphaBetaMinimax::new(
                AlphaBetaMinimax::DEFAULT_DEPTH,
                AlphaBetaMinimax::DEFAULT_NODE_LIMIT,
            )),
            Difficulty::Extreme => {
                StrategyKind::IterativeDeepening(Box::new(SearchEngine::from_config(config)))
            }
        };

        Self::with_kind(config.difficulty, kind)
    }

    pub fn with_kind(difficulty: Difficulty, kind: StrategyKind) -> Self {
        Self {
            difficulty,
            kind,
            stats: SearchStats::default(),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn kind(&self) -> &StrategyKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            StrategyKind::Random(_) => "random",
            StrategyKind::FixedDepthMinimax(_) => "minimax",
            StrategyKind::AlphaBetaMinimax(_) => "alpha-beta",
            StrategyKind::IterativeDeepening(_) => "iterative deepening",
        }
    }

    /// Statistics about the last call to [`Strategy::choose_move`].
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Choose a move for the side to move, or `None` if it has to pass.
    pub fn choose_move(&mut self, position: &Position) -> Option<Location> {
        let start = Instant::now();
        let moves = position.board.legal_moves();
        if moves.is_empty() {
            self.stats = SearchStats::default();
            return None;
        }

        let chosen = match &mut self.kind {
            StrategyKind::Random(rng) => {
                let choice = moves.choose(rng);
                self.stats = SearchStats {
                    source: MoveSource::Search,
                    ..SearchStats::default()
                };
                choice
            }
            StrategyKind::FixedDepthMinimax(minimax) => {
                let result = minimax.choose_move(position);
                self.stats = root_stats(result, minimax.nodes());
                result.map(|result| result.location)
            }
            StrategyKind::AlphaBetaMinimax(search) => {
                let result = search.choose_move(position);
                self.stats = root_stats(result, search.nodes());
                result.map(|result| result.location)
            }
            StrategyKind::IterativeDeepening(engine) => {
                let budget = engine.default_budget();
                let chosen = engine.best_move(position, budget);
                self.stats = engine.stats();
                chosen
            }
        };

        self.stats.elapsed = start.elapsed();
        if let Some(loc) = chosen {
            debug!(
                "{} chose {} ({} nodes, score {})",
                self.name(),
                loc,
                self.stats.nodes,
                self.stats.score
            );
        }
        chosen
    }
}

fn root_stats(result: Option<RootResult>, nodes: u64) -> SearchStats {
    SearchStats {
        nodes,
        depth_reached: result.map_or(0, |result| result.depth),
        score: result.map_or(0, |result| result.score),
        source: MoveSource::Search,
        ..SearchStats::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(difficulty: Difficulty) -> EngineConfig {
        EngineConfig {
            difficulty,
            seed: Some(7),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn difficulty_parses_and_displays() {
        for difficulty in Difficulty::ALL {
            assert_eq!(difficulty.to_string().parse::<Difficulty>(), Ok(difficulty));
        }
        assert_eq!(" Hard ".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn each_difficulty_has_its_own_algorithm() {
        let names: Vec<_> = Difficulty::ALL
            .iter()
            .map(|&difficulty| Strategy::new(&config(difficulty)).name())
            .collect();
        assert_eq!(
            names,
            ["random", "minimax", "alpha-beta", "iterative deepening"]
        );
    }

    #[test]
    fn seeded_random_is_repeatable() {
        let position = Position::new();
        let mut first = Strategy::new(&config(Difficulty::Easy));
        let mut second = Strategy::new(&config(Difficulty::Easy));
        for _ in 0..10 {
            assert_eq!(first.choose_move(&position), second.choose_move(&position));
        }
    }

    #[test]
    fn every_strategy_plays_a_legal_opening_move() {
        let position = Position::new();
        for difficulty in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            let mut strategy = Strategy::new(&config(difficulty));
            let loc = strategy.choose_move(&position).unwrap();
            assert!(position.board.is_legal(loc), "{} played {}", difficulty, loc);
        }
    }

    #[test]
    fn minimax_reports_its_search() {
        let mut strategy = Strategy::new(&config(Difficulty::Normal));
        strategy.choose_move(&Position::new());
        let stats = strategy.stats();
        assert_eq!(stats.depth_reached, FixedDepthMinimax::DEFAULT_DEPTH);
        assert_eq!(stats.source, MoveSource::Search);
        assert!(stats.nodes > 0);
    }
}
