//! Opening book built from WTHOR game databases.
//!
//! A WTHOR file is a 16-byte header (game count as a little-endian `u32` at
//! bytes 4..8) followed by 68-byte game records. Byte 7 of a record is
//! Black's final disc count (0 to 64), and bytes 8..68 hold up to 60 moves
//! encoded as `row * 10 + col + 10` with zero-based coordinates, so A1 is 10
//! and H8 is 87. A 0 byte or an off-board code ends the game.
//!
//! Every game is replayed from the start position for the first few plies,
//! and each (position, move) pair accumulates win/draw/loss counts from the
//! point of view of the player who made the move.

use crate::config::BookConfig;
use byteorder::{ByteOrder, LittleEndian};
use itertools::Itertools;
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reversi_board::{Location, Player, Position};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

const WTHOR_DB_HEADER_BYTES: usize = 16;
const WTHOR_GAME_BYTES: usize = 68;
const WTHOR_GAME_HEADER_BYTES: usize = 8;
const WTHOR_SCORE_BYTE: usize = 7;

/// Disc count at which a finished game is drawn.
const DRAW_DISCS: u8 = 32;
/// Largest valid final disc count.
const MAX_DISCS: u8 = 64;
const WTHOR_MOVE_OFFSET: u8 = 10;
/// Sample size at which the confidence term of a candidate's score saturates.
const CONFIDENT_GAMES: f64 = 100.0;
const WIN_RATE_WEIGHT: f64 = 0.8;
const CONFIDENCE_WEIGHT: f64 = 0.2;

/// Statistics for one move out of one book position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveStats {
    pub location: Location,
    pub games: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl MoveStats {
    fn new(location: Location) -> Self {
        Self {
            location,
            games: 0,
            wins: 0,
            draws: 0,
            losses: 0,
        }
    }

    /// Wins plus half the draws, per game played.
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        (f64::from(self.wins) + 0.5 * f64::from(self.draws)) / f64::from(self.games)
    }

    /// Ranking score: mostly win rate, with a bonus for larger samples.
    pub fn score(&self) -> f64 {
        let confidence = (f64::from(self.games) / CONFIDENT_GAMES).min(1.0);
        WIN_RATE_WEIGHT * self.win_rate() + CONFIDENCE_WEIGHT * confidence
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BookStats {
    pub games_loaded: u64,
    pub games_skipped: u64,
    pub positions: usize,
    /// Deepest ply recorded from any game.
    pub deepest_ply: u8,
}

#[derive(Debug, derive_more::Error)]
pub enum BookError {
    Open { path: PathBuf, source: io::Error },
    Read { source: io::Error },
    TruncatedHeader { len: usize },
    MissingDirectory { path: PathBuf },
    Pattern { source: glob::PatternError },
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::Open { path, source } => {
                write!(f, "cannot open book {}: {}", path.display(), source)
            }
            BookError::Read { source } => write!(f, "cannot read book: {}", source),
            BookError::TruncatedHeader { len } => write!(
                f,
                "book header is {} bytes, expected {}",
                len, WTHOR_DB_HEADER_BYTES
            ),
            BookError::MissingDirectory { path } => {
                write!(f, "book directory {} does not exist", path.display())
            }
            BookError::Pattern { source } => write!(f, "bad book path pattern: {}", source),
        }
    }
}

/// Decode one move byte into a location; `None` for the end marker or any off-board code.
fn parse_wthor_move(move_byte: u8) -> Option<Location> {
    let code = move_byte.checked_sub(WTHOR_MOVE_OFFSET)?;
    Location::from_coords(usize::from(code / 10), usize::from(code % 10))
}

/// Decode a whole record into its moves and Black's final disc count.
fn parse_wthor_game(game_data: &[u8]) -> (Vec<Location>, u8) {
    let moves = game_data[WTHOR_GAME_HEADER_BYTES..]
        .iter()
        .map_while(|&byte| parse_wthor_move(byte))
        .collect();
    (moves, game_data[WTHOR_SCORE_BYTE])
}

pub struct OpeningBook {
    positions: HashMap<u64, Vec<MoveStats>>,
    config: BookConfig,
    rng: StdRng,
    stats: BookStats,
}

impl OpeningBook {
    /// An empty book. `seed` fixes the second-choice coin flips; `None` uses entropy.
    pub fn new(config: BookConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            positions: HashMap::new(),
            config,
            rng,
            stats: BookStats::default(),
        }
    }

    /// Build a book from `path` (a file or a directory of `*.wtb` files).
    /// Any failure is logged and leaves the book empty or partially filled.
    pub fn load_or_empty(path: &Path, config: BookConfig, seed: Option<u64>) -> Self {
        let mut book = Self::new(config, seed);
        let loaded = if path.is_dir() {
            book.load_dir(path)
        } else {
            book.load_file(path)
        };

        match loaded {
            Ok(games) => info!(
                "opening book: {} games from {}, {} positions, {} games skipped",
                games,
                path.display(),
                book.stats.positions,
                book.stats.games_skipped
            ),
            Err(err) => warn!("opening book unavailable, searching every move: {}", err),
        }
        book
    }

    /// Read one WTHOR file. Returns the number of games added.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, BookError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| BookError::Open {
            path: path.to_owned(),
            source,
        })?;
        let games = self.read_games(BufReader::new(file))?;
        debug!("read {} book games from {}", games, path.display());
        Ok(games)
    }

    /// Read every `*.wtb` file in `dir`. Unreadable files are logged and skipped.
    pub fn load_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize, BookError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(BookError::MissingDirectory {
                path: dir.to_owned(),
            });
        }

        let pattern = dir.join("*.wtb");
        let paths = glob::glob(&pattern.to_string_lossy())
            .map_err(|source| BookError::Pattern { source })?;

        let mut total = 0;
        for path in paths {
            let loaded = match path {
                Ok(path) => self.load_file(&path),
                Err(err) => {
                    warn!("skipping book file: {}", err);
                    continue;
                }
            };
            match loaded {
                Ok(games) => total += games,
                Err(err) => warn!("skipping book file: {}", err),
            }
        }
        Ok(total)
    }

    /// Read a WTHOR database from `reader`. Returns the number of games added.
    /// A truncated final record and games that cannot be replayed are skipped.
    pub fn read_games<R: Read>(&mut self, mut reader: R) -> Result<usize, BookError> {
        let mut file_bytes = Vec::new();
        reader
            .read_to_end(&mut file_bytes)
            .map_err(|source| BookError::Read { source })?;

        if file_bytes.len() < WTHOR_DB_HEADER_BYTES {
            return Err(BookError::TruncatedHeader {
                len: file_bytes.len(),
            });
        }
        let declared = LittleEndian::read_u32(&file_bytes[4..8]) as usize;

        let mut added = 0;
        for game_bytes in file_bytes[WTHOR_DB_HEADER_BYTES..]
            .chunks(WTHOR_GAME_BYTES)
            .take(declared)
        {
            if game_bytes.len() < WTHOR_GAME_BYTES {
                trace!("skipping truncated game record ({} bytes)", game_bytes.len());
                self.stats.games_skipped += 1;
                continue;
            }

            let (moves, black_discs) = parse_wthor_game(game_bytes);
            if self.add_game(&moves, black_discs) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Replay one game and fold its result into the book.
    /// Returns `false` (and changes nothing) if the record is malformed: no moves,
    /// a disc count above 64, or a move that is illegal when replayed.
    pub fn add_game(&mut self, moves: &[Location], black_discs: u8) -> bool {
        if moves.is_empty() || black_discs > MAX_DISCS {
            trace!(
                "skipping malformed book game: {} moves, {} black discs",
                moves.len(),
                black_discs
            );
            self.stats.games_skipped += 1;
            return false;
        }

        let winner = match black_discs.cmp(&DRAW_DISCS) {
            std::cmp::Ordering::Greater => Some(Player::Black),
            std::cmp::Ordering::Less => Some(Player::White),
            std::cmp::Ordering::Equal => None,
        };

        let mut position = Position::new();
        let mut plies = Vec::with_capacity(self.config.max_depth as usize);

        for &loc in moves.iter().take(self.config.max_depth as usize) {
            // No moves: this player must pass
            if !position.board.has_moves() {
                if position.board.is_finished() {
                    trace!(
                        "skipping book game: {} played after both players passed at ply {}",
                        loc,
                        plies.len()
                    );
                    self.stats.games_skipped += 1;
                    return false;
                }
                position.make_pass();
            }

            let flips = position.board.flips(loc);
            if flips.is_empty() {
                trace!("skipping book game: {} is illegal at ply {}", loc, plies.len());
                self.stats.games_skipped += 1;
                return false;
            }

            plies.push((position.hash, position.side_to_move, loc));
            position.make_move_unchecked(loc, flips);
        }

        for &(hash, mover, loc) in &plies {
            let candidates = self.positions.entry(hash).or_default();
            let index = match candidates.iter().position(|stats| stats.location == loc) {
                Some(index) => index,
                None => {
                    candidates.push(MoveStats::new(loc));
                    candidates.len() - 1
                }
            };

            let stats = &mut candidates[index];
            stats.games += 1;
            match winner {
                Some(player) if player == mover => stats.wins += 1,
                Some(_) => stats.losses += 1,
                None => stats.draws += 1,
            }
        }

        self.stats.games_loaded += 1;
        self.stats.positions = self.positions.len();
        self.stats.deepest_ply = self.stats.deepest_ply.max(plies.len() as u8);
        true
    }

    /// Candidates that pass the sample-size filter, best first.
    pub fn ranked(&self, position: &Position) -> Vec<MoveStats> {
        self.moves(position)
            .iter()
            .filter(|stats| stats.games >= self.config.min_games)
            .copied()
            .sorted_by(|a, b| b.score().total_cmp(&a.score()))
            .collect()
    }

    /// Pick a book move for `position`, if it is early enough and covered.
    /// Usually the top-ranked candidate; occasionally the runner-up.
    pub fn probe(&mut self, position: &Position) -> Option<Location> {
        if !self.config.enabled || position.move_number() > self.config.max_depth {
            return None;
        }

        let candidates = self.ranked(position);
        let top = candidates.first()?;

        let probability = if self.config.second_choice_probability.is_finite() {
            self.config.second_choice_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let chosen = match candidates.get(1) {
            Some(second) if self.rng.gen_bool(probability) => second,
            _ => top,
        };

        if position.board.is_legal(chosen.location) {
            Some(chosen.location)
        } else {
            warn!("book move {} is illegal here; ignoring the book", chosen.location);
            None
        }
    }

    /// Every recorded move out of `position`, unfiltered.
    pub fn moves(&self, position: &Position) -> &[MoveStats] {
        self.positions
            .get(&position.hash)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, position: &Position) -> bool {
        self.positions.contains_key(&position.hash)
    }

    /// Number of distinct positions in the book.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn stats(&self) -> BookStats {
        self.stats
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locs(names: &[&str]) -> Vec<Location> {
        names.iter().map(|name| name.parse().unwrap()).collect()
    }

    fn book() -> OpeningBook {
        OpeningBook::new(BookConfig::default(), Some(7))
    }

    #[test]
    fn move_codes() {
        assert_eq!(parse_wthor_move(10), Some("A1".parse().unwrap()));
        assert_eq!(parse_wthor_move(17), Some("H1".parse().unwrap()));
        assert_eq!(parse_wthor_move(20), Some("A2".parse().unwrap()));
        assert_eq!(parse_wthor_move(87), Some("H8".parse().unwrap()));
        assert_eq!(parse_wthor_move(55), Some("F5".parse().unwrap()));
        assert_eq!(parse_wthor_move(0), None);
        assert_eq!(parse_wthor_move(9), None);
        assert_eq!(parse_wthor_move(18), None);
        assert_eq!(parse_wthor_move(90), None);
    }

    #[test]
    fn statistics_follow_the_mover() {
        let mut book = book();
        // Black wins both games; White's reply differs.
        assert!(book.add_game(&locs(&["F5", "D6"]), 40));
        assert!(book.add_game(&locs(&["F5", "F6"]), 40));

        let start = Position::new();
        assert_eq!(
            book.moves(&start),
            &[MoveStats {
                location: "F5".parse().unwrap(),
                games: 2,
                wins: 2,
                draws: 0,
                losses: 0,
            }]
        );

        let mut after = start;
        after.make_move("F5".parse().unwrap()).unwrap();
        let replies = book.moves(&after);
        assert_eq!(replies.len(), 2);
        assert!(replies.iter().all(|stats| stats.losses == 1 && stats.games == 1));
        assert_eq!(book.stats().games_loaded, 2);
        assert_eq!(book.stats().deepest_ply, 2);
    }

    #[test]
    fn draws_count_half() {
        let stats = MoveStats {
            location: "F5".parse().unwrap(),
            games: 4,
            wins: 1,
            draws: 2,
            losses: 1,
        };
        assert!((stats.win_rate() - 0.5).abs() < 1e-9);
        assert!((stats.score() - (0.8 * 0.5 + 0.2 * 0.04)).abs() < 1e-9);
    }

    #[test]
    fn game_bytes_stop_at_the_first_bad_code() {
        let mut record = [0u8; WTHOR_GAME_BYTES];
        record[WTHOR_SCORE_BYTE] = 40;
        record[8..12].copy_from_slice(&[55, 63, 10, 99]);
        let (moves, black_discs) = parse_wthor_game(&record);
        assert_eq!(moves, locs(&["F5", "D6", "A1"]));
        assert_eq!(black_discs, 40);
    }

    #[test]
    fn malformed_games_are_skipped() {
        let mut book = book();
        assert!(!book.add_game(&locs(&["F5"]), 200));
        assert!(!book.add_game(&[], 40));
        assert!(book.add_game(&locs(&["F5"]), 64));
        assert_eq!(book.stats().games_skipped, 2);
        assert_eq!(book.stats().games_loaded, 1);
        assert_eq!(book.moves(&Position::new())[0].games, 1);
    }

    #[test]
    fn moves_after_a_finished_game_are_skipped() {
        // Black wipes White out on the ninth move; nobody can play A1 afterwards.
        let wipeout = locs(&["E6", "F4", "E3", "F6", "G5", "D6", "E7", "F5", "C5"]);
        let mut book = book();
        assert!(book.add_game(&wipeout, 13));

        let mut game = wipeout;
        game.push("A1".parse().unwrap());
        assert!(!book.add_game(&game, 13));
        assert_eq!(book.stats().games_skipped, 1);
        assert_eq!(book.stats().games_loaded, 1);
    }

    #[test]
    fn illegal_game_is_skipped_entirely() {
        let mut book = book();
        assert!(!book.add_game(&locs(&["F5", "A1"]), 40));
        assert!(book.is_empty());
        assert_eq!(book.stats().games_skipped, 1);
    }

    #[test]
    fn thin_candidates_are_filtered() {
        let mut book = book();
        book.add_game(&locs(&["F5"]), 40);
        assert_eq!(book.probe(&Position::new()), None);

        book.add_game(&locs(&["F5"]), 20);
        assert_eq!(book.probe(&Position::new()), Some("F5".parse().unwrap()));
    }

    #[test]
    fn late_positions_are_not_probed() {
        let config = BookConfig {
            max_depth: 1,
            ..BookConfig::default()
        };
        let mut book = OpeningBook::new(config, Some(1));
        book.add_game(&locs(&["F5", "D6", "C3"]), 40);
        book.add_game(&locs(&["F5", "D6", "C3"]), 40);
        assert_eq!(book.stats().deepest_ply, 1);

        let mut position = Position::new();
        for name in ["F5", "D6"] {
            position.make_move(name.parse().unwrap()).unwrap();
        }
        assert_eq!(book.probe(&position), None);
    }

    #[test]
    fn short_header_is_an_error() {
        let mut book = book();
        let err = book.read_games(&[0u8; 10][..]).unwrap_err();
        assert!(matches!(err, BookError::TruncatedHeader { len: 10 }));
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let book = OpeningBook::load_or_empty(
            Path::new("/definitely/not/a/book.wtb"),
            BookConfig::default(),
            Some(0),
        );
        assert!(book.is_empty());
    }
}
