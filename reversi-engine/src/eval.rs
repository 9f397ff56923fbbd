//! Static evaluation of Othello positions.
//!
//! Scores are from the mover's point of view. The blend of features depends
//! on the number of empty squares: positional features dominate the opening
//! and midgame, disc count takes over near the end.

use crate::config::EvalWeights;
use crate::Score;
use reversi_board::bitboard::{self, Bitboard, CORNERS, EDGES};
use reversi_board::{Board, Player, Position};

/// Positional value of each square. The table is symmetric under every
/// reflection of the board, so it can be read by bit index directly.
#[rustfmt::skip]
const PIECE_SQUARE_TABLE: [Score; 64] = [
    100, -20,  10,   5,   5,  10, -20, 100,
    -20, -50,  -2,  -2,  -2,  -2, -50, -20,
     10,  -2,   5,   1,   1,   5,  -2,  10,
      5,  -2,   1,   1,   1,   1,  -2,   5,
      5,  -2,   1,   1,   1,   1,  -2,   5,
     10,  -2,   5,   1,   1,   5,  -2,  10,
    -20, -50,  -2,  -2,  -2,  -2, -50, -20,
    100, -20,  10,   5,   5,  10, -20, 100,
];

/// Stability only counts once fewer squares than this are empty.
const STABILITY_EMPTIES: u8 = 30;
/// Frontier only counts while more squares than this are empty.
const FRONTIER_EMPTIES: u8 = 20;
/// Disc parity starts counting below this many empties, weighted `(30 - E)`.
const PARITY_EMPTIES: u8 = 20;
const PARITY_BASE: Score = 30;
/// Corners count this many times an edge disc in the stability term.
const CORNER_STABILITY: Score = 5;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evaluator {
    weights: EvalWeights,
}

impl Evaluator {
    pub fn new(weights: EvalWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    /// Score `board` for its mover. Positive is good for the mover.
    pub fn evaluate(&self, board: Board) -> Score {
        let empties = board.count_empty();
        let discs = disc_difference(board);

        if empties <= self.weights.endgame_empties {
            return self.weights.endgame_disc * discs;
        }

        let (own, opp) = (board.mover, board.opponent);
        let mut score = self.weights.mobility * mobility(board)
            + self.weights.corner * difference(own & CORNERS, opp & CORNERS)
            + positional(own)
            - positional(opp);

        if empties < STABILITY_EMPTIES {
            score += self.weights.stability * stability(own, opp);
        }

        if empties > FRONTIER_EMPTIES {
            let frontier = bitboard::adjacent(board.empty_mask());
            score += self.weights.frontier * difference(opp & frontier, own & frontier);
        }

        if empties < PARITY_EMPTIES {
            score += (PARITY_BASE - Score::from(empties)) * discs;
        }

        score
    }

    /// Score `position` from `player`'s side, whoever is to move.
    pub fn evaluate_for(&self, position: &Position, player: Player) -> Score {
        if position.side_to_move == player {
            self.evaluate(position.board)
        } else {
            self.evaluate(position.board.pass())
        }
    }
}

#[inline]
fn difference(own: Bitboard, opp: Bitboard) -> Score {
    Score::from(own.count_occupied()) - Score::from(opp.count_occupied())
}

#[inline]
fn disc_difference(board: Board) -> Score {
    Score::from(board.score_absolute_difference())
}

#[inline]
fn mobility(board: Board) -> Score {
    board.legal_moves().len() as Score - board.pass().legal_moves().len() as Score
}

#[inline]
fn positional(discs: Bitboard) -> Score {
    discs
        .locations()
        .map(|loc| PIECE_SQUARE_TABLE[loc.to_index() as usize])
        .sum()
}

#[inline]
fn stability(own: Bitboard, opp: Bitboard) -> Score {
    CORNER_STABILITY * difference(own & CORNERS, opp & CORNERS) + difference(own & EDGES, opp & EDGES)
}
