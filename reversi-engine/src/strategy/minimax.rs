//! Fixed-depth searchers used by the lower difficulty levels.
//!
//! Neither uses a transposition table or the opening book. Both score
//! positions from the point of view of the side to move (negamax form).

use crate::Score;
use arrayvec::ArrayVec;
use reversi_board::bitboard::CORNERS;
use reversi_board::{Board, Location, Position};

/// Plain minimax over disc difference.
#[derive(Clone, Debug)]
pub struct FixedDepthMinimax {
    depth: u8,
    nodes: u64,
}

/// Alpha-beta over a positional evaluation, with a node limit.
#[derive(Clone, Debug)]
pub struct AlphaBetaMinimax {
    depth: u8,
    node_limit: u64,
    nodes: u64,
}

/// Result of a root search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootResult {
    pub location: Location,
    pub score: Score,
    pub depth: u8,
}

impl FixedDepthMinimax {
    pub const DEFAULT_DEPTH: u8 = 4;
    /// Score of a finished game, for the winner.
    pub const WIN: Score = 10_000;

    pub fn new(depth: u8) -> Self {
        Self {
            depth: depth.max(1),
            nodes: 0,
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn choose_move(&mut self, position: &Position) -> Option<RootResult> {
        self.nodes = 0;
        let mut position = *position;
        let mut best: Option<RootResult> = None;

        for loc in position.board.legal_moves() {
            let undo = position.make_move_unchecked(loc, position.board.flips(loc));
            let score = -self.minimax(&mut position, self.depth - 1);
            position.unmake(undo);

            if best.map_or(true, |best| score > best.score) {
                best = Some(RootResult {
                    location: loc,
                    score,
                    depth: self.depth,
                });
            }
        }

        best
    }

    fn minimax(&mut self, position: &mut Position, depth: u8) -> Score {
        self.nodes += 1;

        let moves = position.board.legal_moves();
        if moves.is_empty() {
            // Both players pass: game ends
            if !position.board.pass().has_moves() {
                return terminal(position.board, Self::WIN);
            }
            if depth == 0 {
                return Score::from(position.board.score_absolute_difference());
            }

            let undo = position.make_pass();
            let score = -self.minimax(position, depth - 1);
            position.unmake(undo);
            return score;
        }

        if depth == 0 {
            return Score::from(position.board.score_absolute_difference());
        }

        moves
            .map(|loc| {
                let undo = position.make_move_unchecked(loc, position.board.flips(loc));
                let score = -self.minimax(position, depth - 1);
                position.unmake(undo);
                score
            })
            .max()
            .unwrap_or(0)
    }
}

/// Positional weights for [`AlphaBetaMinimax`]. Symmetric, so readable by bit index.
#[rustfmt::skip]
const POSITION_WEIGHTS: [Score; 64] = [
     500, -150,  30,  10,  10,  30, -150,  500,
    -150, -250,   0,   0,   0,   0, -250, -150,
      30,    0,   1,   2,   2,   1,    0,   30,
      10,    0,   2,  16,  16,   2,    0,   10,
      10,    0,   2,  16,  16,   2,    0,   10,
      30,    0,   1,   2,   2,   1,    0,   30,
    -150, -250,   0,   0,   0,   0, -250, -150,
     500, -150,  30,  10,  10,  30, -150,  500,
];

impl AlphaBetaMinimax {
    pub const DEFAULT_DEPTH: u8 = 8;
    pub const DEFAULT_NODE_LIMIT: u64 = 500_000;
    /// Score of a finished game, for the winner.
    pub const WIN: Score = 100_000;

    const OPENING_DISCS: u8 = 20;
    const ENDGAME_DISCS: u8 = 52;
    const ENDGAME_MAX_DEPTH: u8 = 15;

    pub fn new(depth: u8, node_limit: u64) -> Self {
        Self {
            depth: depth.max(1),
            node_limit: node_limit.max(1),
            nodes: 0,
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Search depth for a position: shallower in the opening, exhaustive near the end.
    pub fn depth_for(&self, board: Board) -> u8 {
        let discs = board.count_discs();
        if discs > Self::ENDGAME_DISCS {
            (64 - discs).min(Self::ENDGAME_MAX_DEPTH).max(1)
        } else if discs < Self::OPENING_DISCS {
            self.depth.saturating_sub(2).max(1)
        } else {
            self.depth
        }
    }

    pub fn choose_move(&mut self, position: &Position) -> Option<RootResult> {
        self.nodes = 0;
        let depth = self.depth_for(position.board);
        let mut position = *position;
        let mut best: Option<RootResult> = None;
        let mut alpha = -Score::MAX;

        for loc in ordered(position.board) {
            if self.nodes >= self.node_limit {
                break;
            }

            let undo = position.make_move_unchecked(loc, position.board.flips(loc));
            let score = -self.window(&mut position, depth - 1, -Score::MAX, -alpha);
            position.unmake(undo);

            if best.map_or(true, |best| score > best.score) {
                best = Some(RootResult {
                    location: loc,
                    score,
                    depth,
                });
            }
            alpha = alpha.max(score);
        }

        best
    }

    /// Fail-hard window search.
    fn window(
        &mut self,
        position: &mut Position,
        depth: u8,
        mut alpha: Score,
        beta: Score,
    ) -> Score {
        self.nodes += 1;

        if self.nodes >= self.node_limit || depth == 0 {
            return self.evaluate(position.board);
        }

        if !position.board.has_moves() {
            // Both players pass: game ends
            if !position.board.pass().has_moves() {
                return terminal(position.board, Self::WIN);
            }

            // I pass, but my opponent may have moves
            let undo = position.make_pass();
            let score = -self.window(position, depth - 1, -beta, -alpha);
            position.unmake(undo);
            return score;
        }

        for loc in ordered(position.board) {
            let undo = position.make_move_unchecked(loc, position.board.flips(loc));
            let score = -self.window(position, depth - 1, -beta, -alpha);
            position.unmake(undo);

            // Fail high: this branch has a line so good for me my opponent won't allow it
            if score >= beta {
                return beta;
            }

            if score > alpha {
                alpha = score;
            }

            if self.nodes >= self.node_limit {
                break;
            }
        }

        alpha
    }

    fn evaluate(&self, board: Board) -> Score {
        let (own, opp) = (board.mover, board.opponent);
        let discs = board.count_discs();

        let positional: Score = own
            .locations()
            .map(|loc| POSITION_WEIGHTS[loc.to_index() as usize])
            .sum::<Score>()
            - opp
                .locations()
                .map(|loc| POSITION_WEIGHTS[loc.to_index() as usize])
                .sum::<Score>();

        let mobility =
            board.legal_moves().len() as Score - board.pass().legal_moves().len() as Score;
        let mobility_weight = if discs < 50 { 80 } else { 30 };

        let parity = if discs > 50 {
            150 * Score::from(board.score_absolute_difference())
        } else {
            0
        };

        let corners = Score::from((own & CORNERS).count_occupied())
            - Score::from((opp & CORNERS).count_occupied());

        positional + mobility_weight * mobility + parity + 500 * corners
    }
}

/// Legal moves, best square first.
fn ordered(board: Board) -> ArrayVec<Location, 64> {
    let mut moves: ArrayVec<Location, 64> = board.legal_moves().collect();
    moves.sort_by_key(|loc| -POSITION_WEIGHTS[loc.to_index() as usize]);
    moves
}

fn terminal(board: Board, win: Score) -> Score {
    match board.score_absolute_difference() {
        diff if diff > 0 => win,
        diff if diff < 0 => -win,
        _ => 0,
    }
}
