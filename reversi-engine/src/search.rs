//! Iterative-deepening negamax with alpha-beta pruning.
//!
//! The engine searches a private copy of the caller's position, mutating it
//! with make/unmake. Results are cached in a [`TranspositionTable`] and the
//! first plies may come straight from an [`OpeningBook`].
//!
//! Budgets are cooperative: the clock is read every few hundred nodes, and
//! once the budget runs out the search unwinds by returning static
//! evaluations. The interrupted iteration is thrown away and the move from
//! the last completed depth is played.

use crate::book::OpeningBook;
use crate::config::{EngineConfig, SearchConfig};
use crate::eval::Evaluator;
use crate::tt::{Bound, TranspositionTable};
use crate::Score;
use arrayvec::ArrayVec;
use log::{debug, info};
use reversi_board::bitboard::{Bitboard, CORNERS, EDGES, X_SQUARES};
use reversi_board::{Board, Location, Position};
use std::time::{Duration, Instant};

/// Larger than any reachable score.
pub const INFINITY: Score = 1_000_000;
/// Score of a finished game won by the side to move.
pub const WIN: Score = 100_000;
/// Score of a finished game lost by the side to move.
pub const LOSS: Score = -WIN;

const CORNER_ORDER: Score = 10_000;
const X_SQUARE_ORDER: Score = -5_000;
const EDGE_ORDER: Score = 100;
const FLIP_ORDER: Score = 10;
const REPLY_MOBILITY_ORDER: Score = 5;

/// Resource limits for one call to [`SearchEngine::best_move`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Budget {
    pub time: Option<Duration>,
    pub nodes: Option<u64>,
}

impl Budget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn time(time: Duration) -> Self {
        Self {
            time: Some(time),
            nodes: None,
        }
    }

    pub fn nodes(nodes: u64) -> Self {
        Self {
            time: None,
            nodes: Some(nodes),
        }
    }
}

/// Where the last move came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MoveSource {
    Book,
    SingleMove,
    Search,
    #[default]
    NoMoves,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub cutoffs: u64,
    /// Deepest fully completed iteration.
    pub depth_reached: u8,
    /// Score of the chosen move at `depth_reached`, for the side to move.
    pub score: Score,
    pub elapsed: Duration,
    pub source: MoveSource,
}

pub struct SearchEngine {
    evaluator: Evaluator,
    tt: TranspositionTable,
    book: Option<OpeningBook>,
    config: SearchConfig,
    stats: SearchStats,
    deadline: Option<Instant>,
    node_limit: Option<u64>,
    aborts_enabled: bool,
    aborted: bool,
}

/// A legal move with its flips and ordering key.
type OrderedMoves = ArrayVec<(Location, Bitboard, Score), 64>;

impl SearchEngine {
    pub fn new(
        config: SearchConfig,
        evaluator: Evaluator,
        tt: TranspositionTable,
        book: Option<OpeningBook>,
    ) -> Self {
        Self {
            evaluator,
            tt,
            book,
            config,
            stats: SearchStats::default(),
            deadline: None,
            node_limit: None,
            aborts_enabled: false,
            aborted: false,
        }
    }

    /// Build an engine from a full configuration, loading the book if one is configured.
    pub fn from_config(config: &EngineConfig) -> Self {
        let book = match &config.book_path {
            Some(path) if config.book.enabled => Some(OpeningBook::load_or_empty(
                path,
                config.book.clone(),
                config.seed,
            )),
            _ => None,
        };

        Self::new(
            config.search.clone(),
            Evaluator::new(config.weights.clone()),
            TranspositionTable::with_size_mb(config.search.tt_size_mb),
            book,
        )
    }

    /// The budget described by the configuration.
    pub fn default_budget(&self) -> Budget {
        Budget {
            time: self.config.time_limit(),
            nodes: self.config.node_limit,
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    pub fn book(&self) -> Option<&OpeningBook> {
        self.book.as_ref()
    }

    pub fn set_book(&mut self, book: Option<OpeningBook>) {
        self.book = book;
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Forget everything learned in earlier searches.
    pub fn clear(&mut self) {
        self.tt.clear();
    }

    /// Choose a move for the side to move in `position`.
    /// Returns `None` only if the side to move has no legal move (it must pass).
    pub fn best_move(&mut self, position: &Position, budget: Budget) -> Option<Location> {
        let start = Instant::now();
        self.stats = SearchStats::default();

        let moves = position.board.legal_moves();
        match moves.len() {
            0 => {
                self.stats.source = MoveSource::NoMoves;
                return None;
            }
            1 => {
                self.stats.source = MoveSource::SingleMove;
                return moves.first();
            }
            _ => {}
        }

        if let Some(loc) = self.book.as_mut().and_then(|book| book.probe(position)) {
            self.stats.source = MoveSource::Book;
            info!("book move {}", loc);
            return Some(loc);
        }

        self.tt.new_search();
        self.deadline = budget.time.map(|time| start + time);
        self.node_limit = budget.nodes;
        self.aborts_enabled = false;
        self.aborted = false;
        self.stats.source = MoveSource::Search;

        let max_depth = match position.board.count_empty() {
            empties if empties <= self.config.endgame_empties => self.config.endgame_depth,
            _ => self.config.max_depth,
        };

        let mut root = *position;
        let mut best = moves.first();
        let mut pv = None;

        for depth in 1..=max_depth.max(1) {
            let (mv, score) = self.search_root(&mut root, depth, pv);
            if self.aborted {
                debug!("depth {} abandoned after {} nodes", depth, self.stats.nodes);
                break;
            }

            best = mv.or(best);
            pv = mv;
            self.stats.depth_reached = depth;
            self.stats.score = score;
            debug!(
                "depth {}: {} score {} ({} nodes, {} cutoffs)",
                depth,
                mv.map_or_else(|| "-".to_owned(), |loc| loc.to_string()),
                score,
                self.stats.nodes,
                self.stats.cutoffs
            );

            // Depth 1 always completes; later iterations may be cut short.
            self.aborts_enabled = true;

            if score >= WIN || score <= LOSS || self.budget_exhausted() {
                break;
            }
        }

        self.stats.elapsed = start.elapsed();
        info!(
            "searched {} nodes to depth {} in {:?}, score {}",
            self.stats.nodes, self.stats.depth_reached, self.stats.elapsed, self.stats.score
        );
        best
    }

    /// Search `position` to exactly `depth` plies with no budget.
    /// Returns the best move and its score, or `None` if the side to move must pass.
    pub fn search_depth(&mut self, position: &Position, depth: u8) -> Option<(Location, Score)> {
        let start = Instant::now();
        self.stats = SearchStats {
            source: MoveSource::Search,
            ..SearchStats::default()
        };
        self.tt.new_search();
        self.deadline = None;
        self.node_limit = None;
        self.aborts_enabled = false;
        self.aborted = false;

        let depth = depth.max(1);
        let mut root = *position;
        let (mv, score) = self.search_root(&mut root, depth, None);

        self.stats.depth_reached = depth;
        self.stats.score = score;
        self.stats.elapsed = start.elapsed();
        mv.map(|loc| (loc, score))
    }

    fn budget_exhausted(&self) -> bool {
        let out_of_nodes = self
            .node_limit
            .map_or(false, |limit| self.stats.nodes >= limit);
        let out_of_time = self
            .deadline
            .map_or(false, |deadline| Instant::now() >= deadline);
        out_of_nodes || out_of_time
    }

    /// Called once per node. Latches `aborted` once the budget runs out.
    #[inline]
    fn should_abort(&mut self) -> bool {
        if !self.aborts_enabled || self.aborted {
            return self.aborted;
        }

        if let Some(limit) = self.node_limit {
            if self.stats.nodes >= limit {
                self.aborted = true;
            }
        }

        let interval = self.config.time_check_interval.max(1);
        if self.stats.nodes % interval == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.aborted = true;
                }
            }
        }

        self.aborted
    }

    fn search_root(
        &mut self,
        position: &mut Position,
        depth: u8,
        hint: Option<Location>,
    ) -> (Option<Location>, Score) {
        self.stats.nodes += 1;

        let hint = hint.or_else(|| self.tt.best_move(position.hash));
        let mut alpha = -INFINITY;
        let beta = INFINITY;
        let mut best_move = None;
        let mut best_score = -INFINITY;

        for (loc, flips, _) in order_moves(position.board, hint) {
            let undo = position.make_move_unchecked(loc, flips);
            let score = -self.negamax(position, depth - 1, -beta, -alpha);
            position.unmake(undo);

            if self.aborted {
                break;
            }
            if score > best_score {
                best_score = score;
                best_move = Some(loc);
            }
            alpha = alpha.max(score);
        }

        if !self.aborted {
            let hash = position.hash;
            self.tt.store(hash, depth, best_score, Bound::Exact, best_move);
        }
        (best_move, best_score)
    }

    fn negamax(
        &mut self,
        position: &mut Position,
        depth: u8,
        mut alpha: Score,
        beta: Score,
    ) -> Score {
        self.stats.nodes += 1;
        if self.should_abort() {
            return self.evaluator.evaluate(position.board);
        }

        let probe = self.tt.probe(position.hash, depth, alpha, beta);
        if let Some(score) = probe.score {
            return score;
        }

        if depth == 0 {
            let score = self.evaluator.evaluate(position.board);
            self.tt.store(position.hash, 0, score, Bound::Exact, None);
            return score;
        }

        if !position.board.has_moves() {
            if !position.board.pass().has_moves() {
                return terminal_score(position.board);
            }

            let undo = position.make_pass();
            let score = -self.negamax(position, depth - 1, -beta, -alpha);
            position.unmake(undo);
            return score;
        }

        let alpha_orig = alpha;
        let mut best_score = -INFINITY;
        let mut best_move = None;

        for (loc, flips, _) in order_moves(position.board, probe.best_move) {
            let undo = position.make_move_unchecked(loc, flips);
            let score = -self.negamax(position, depth - 1, -beta, -alpha);
            position.unmake(undo);

            if self.aborted {
                return best_score.max(score);
            }
            if score > best_score {
                best_score = score;
                best_move = Some(loc);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score > alpha_orig {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt.store(position.hash, depth, best_score, bound, best_move);
        best_score
    }
}

/// Final score of a game neither side can continue, for the side to move.
pub fn terminal_score(board: Board) -> Score {
    match board.score_absolute_difference() {
        diff if diff > 0 => WIN,
        diff if diff < 0 => LOSS,
        _ => 0,
    }
}

/// Legal moves of `board`, most promising first. `hint` goes to the front if legal.
fn order_moves(board: Board, hint: Option<Location>) -> OrderedMoves {
    let mut moves: OrderedMoves = board
        .legal_moves()
        .map(|loc| {
            let flips = board.flips(loc);
            let key = if Some(loc) == hint {
                Score::MAX
            } else {
                order_key(board, loc, flips)
            };
            (loc, flips, key)
        })
        .collect();

    moves.sort_unstable_by(|a, b| b.2.cmp(&a.2));
    moves
}

fn order_key(board: Board, loc: Location, flips: Bitboard) -> Score {
    let square = if CORNERS.contains(loc) {
        CORNER_ORDER
    } else if X_SQUARES.contains(loc) {
        X_SQUARE_ORDER
    } else if EDGES.contains(loc) {
        EDGE_ORDER
    } else {
        0
    };

    let replies = board.play_unchecked(loc, flips).legal_moves().len() as Score;
    square + FLIP_ORDER * Score::from(flips.count_occupied()) - REPLY_MOBILITY_ORDER * replies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalWeights;
    use reversi_board::Player;

    fn engine() -> SearchEngine {
        SearchEngine::new(
            SearchConfig::default(),
            Evaluator::new(EvalWeights::default()),
            TranspositionTable::with_capacity(1 << 16),
            None,
        )
    }

    fn loc(name: &str) -> Location {
        name.parse().unwrap()
    }

    fn bits(names: &[&str]) -> Bitboard {
        names
            .iter()
            .fold(Bitboard::EMPTY, |acc, name| acc | loc(name).to_onehot())
    }

    #[test]
    fn ordering_prefers_hint_then_corners() {
        // The corner A1 captures along the first row and the diagonal.
        let board = Board::from_bitboards(bits(&["C1", "C3"]), bits(&["B1", "B2", "D2"]));
        let moves = order_moves(board, None);
        assert_eq!(moves[0].0, loc("A1"));

        let hinted = order_moves(board, Some(moves[1].0));
        assert_eq!(hinted[0].0, moves[1].0);
    }

    #[test]
    fn terminal_scores_dominate() {
        let win = Board::from_bitboards(bits(&["A1", "B1"]), bits(&["H8"]));
        assert_eq!(terminal_score(win), WIN);
        assert_eq!(terminal_score(win.pass()), LOSS);
        let draw = Board::from_bitboards(bits(&["A1"]), bits(&["H8"]));
        assert_eq!(terminal_score(draw), 0);
    }

    #[test]
    fn no_moves_returns_none() {
        let position = Position::from_colors(bits(&["B1"]), bits(&["A1"]), Player::Black).unwrap();
        let mut engine = engine();
        assert_eq!(engine.best_move(&position, Budget::unlimited()), None);
        assert_eq!(engine.stats().source, MoveSource::NoMoves);
    }

    #[test]
    fn single_move_skips_search() {
        // White's only move is C1.
        let position = Position::from_colors(bits(&["B1"]), bits(&["A1"]), Player::White).unwrap();
        let mut engine = engine();
        assert_eq!(engine.best_move(&position, Budget::unlimited()), Some(loc("C1")));
        assert_eq!(engine.stats().nodes, 0);
        assert_eq!(engine.stats().source, MoveSource::SingleMove);
    }

    #[test]
    fn finds_winning_capture() {
        // F5 captures both white discs; E6 and E8 take only one.
        let position = Position::from_colors(
            bits(&["G6", "B1", "F8"]),
            bits(&["F6", "F7"]),
            Player::Black,
        )
        .unwrap();
        let mut engine = engine();
        let mv = engine.best_move(&position, Budget::nodes(10_000));
        assert_eq!(mv, Some(loc("F5")));
        assert_eq!(engine.stats().score, WIN);
    }

    #[test]
    fn node_budget_stops_deepening() {
        let mut engine = engine();
        let mv = engine.best_move(&Position::new(), Budget::nodes(200));
        assert!(mv.is_some());
        let stats = engine.stats();
        assert!(stats.depth_reached >= 1);
        assert!(stats.depth_reached < 12);
        assert_eq!(stats.source, MoveSource::Search);
    }
}
