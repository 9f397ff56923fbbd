use crate::{Move, Position, Status};
use rand::seq::IteratorRandom;
use rand::Rng;

/// Play up to `max_plies` uniformly random actions from the starting position.
/// Returns every position visited (starting position first) and the actions taken.
/// Stops early if the game ends.
pub fn random_playout<R: Rng>(rng: &mut R, max_plies: usize) -> (Vec<Position>, Vec<Move>) {
    let mut position = Position::new();
    let mut positions = vec![position];
    let mut moves = Vec::new();

    for _ in 0..max_plies {
        let mv = match position.status() {
            Status::Finished(_) => break,
            Status::MustPass => {
                position.make_pass();
                Move::Pass
            }
            Status::Moves(legal) => match legal.choose(rng) {
                Some(loc) => {
                    let flips = position.board.flips(loc);
                    position.make_move_unchecked(loc, flips);
                    Move::Piece(loc)
                }
                None => break,
            },
        };

        positions.push(position);
        moves.push(mv);
    }

    (positions, moves)
}
