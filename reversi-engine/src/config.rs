//! Engine configuration, loadable from a TOML file.
//!
//! Every field has a default, so a file only needs to list what it changes:
//!
//! ```toml
//! difficulty = "hard"
//! book_path = "resources/wthor"
//!
//! [search]
//! time_limit_ms = 5000
//! ```

use crate::strategy::Difficulty;
use crate::Score;
use derive_more::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub difficulty: Difficulty,
    /// Seed for every random choice the engine makes; `None` draws from entropy.
    pub seed: Option<u64>,
    /// A WTHOR file, or a directory of `*.wtb` files.
    pub book_path: Option<PathBuf>,
    pub search: SearchConfig,
    pub book: BookConfig,
    pub weights: EvalWeights,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Wall-clock budget per move; `None` means unlimited.
    pub time_limit_ms: Option<u64>,
    /// Node budget per move; `None` means unlimited.
    pub node_limit: Option<u64>,
    pub max_depth: u8,
    /// Depth cap once few enough squares are empty.
    pub endgame_depth: u8,
    pub endgame_empties: u8,
    pub tt_size_mb: usize,
    /// Nodes between clock reads.
    pub time_check_interval: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookConfig {
    pub enabled: bool,
    /// Plies replayed per game, and the last ply at which the book is probed.
    pub max_depth: u8,
    pub min_games: u32,
    /// Chance of playing the second-ranked candidate.
    pub second_choice_probability: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalWeights {
    pub mobility: Score,
    pub corner: Score,
    pub stability: Score,
    pub frontier: Score,
    pub endgame_disc: Score,
    /// At or below this many empties, only discs count.
    pub endgame_empties: u8,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config {}: {}", path.display(), source)
            }
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Extreme,
            seed: None,
            book_path: None,
            search: SearchConfig::default(),
            book: BookConfig::default(),
            weights: EvalWeights::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: Some(15_000),
            node_limit: None,
            max_depth: 12,
            endgame_depth: 16,
            endgame_empties: 12,
            tt_size_mb: 64,
            time_check_interval: 1024,
        }
    }
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: 12,
            min_games: 2,
            second_choice_probability: 0.15,
        }
    }
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            mobility: 10,
            corner: 100,
            stability: 15,
            frontier: 5,
            endgame_disc: 10,
            endgame_empties: 10,
        }
    }
}

impl EngineConfig {
    /// Read a config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

impl SearchConfig {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}
