//! "Perft" performance test: count the number of leaves at a given depth.
//! Useful for tuning bitboard, and for checking make/unmake.
//! See: http://www.aartbik.com/MISC/reversi.html

use crate::position::Position;

pub fn run_perft(depth: u64) -> u64 {
    run_perft_from(&mut Position::new(), depth)
}

/// Count leaves below `position`, mutating it in place and restoring it before returning.
pub fn run_perft_from(position: &mut Position, depth: u64) -> u64 {
    leaves_below(position, depth, false)
}

fn leaves_below(position: &mut Position, depth: u64, passed: bool) -> u64 {
    // Leaf node for this depth
    if depth == 0 {
        return 1;
    }

    let all_moves = position.board.legal_moves();
    if all_moves.is_empty() {
        // Both players passed: game is over
        if passed {
            return 1;
        }

        let undo = position.make_pass();
        let leaves = leaves_below(position, depth - 1, true);
        position.unmake(undo);
        return leaves;
    }

    all_moves
        .map(|mv| {
            let flips = position.board.flips(mv);
            let undo = position.make_move_unchecked(mv, flips);
            let leaves = leaves_below(position, depth - 1, false);
            position.unmake(undo);
            leaves
        })
        .sum()
}

#[test]
fn perft_01() {
    assert_eq!(run_perft(1), 4);
}

#[test]
fn perft_02() {
    assert_eq!(run_perft(2), 12);
}

#[test]
fn perft_03() {
    assert_eq!(run_perft(3), 56);
}

#[test]
fn perft_04() {
    assert_eq!(run_perft(4), 244);
}

#[test]
fn perft_05() {
    assert_eq!(run_perft(5), 1396);
}

#[test]
fn perft_06() {
    assert_eq!(run_perft(6), 8200);
}

#[test]
fn perft_07() {
    assert_eq!(run_perft(7), 55092);
}

#[test]
#[ignore = "slow in debug builds"]
fn perft_08() {
    assert_eq!(run_perft(8), 390216);
}

// Passing moves begin here.
#[test]
#[ignore = "slow in debug builds"]
fn perft_09() {
    assert_eq!(run_perft(9), 3005288);
}

#[test]
fn perft_restores_position() {
    let mut position = Position::new();
    let before = position;
    run_perft_from(&mut position, 4);
    assert_eq!(position, before);
}
