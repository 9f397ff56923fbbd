use criterion::*;

#[cfg(unix)]
use pprof::criterion::{Output, PProfProfiler};

use reversi_board::bitboard;
use reversi_board::test_utils::perft;
use reversi_board::Position;

fn criterion_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.sample_size(50);

    for depth in 1..7 {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| perft::run_perft(black_box(depth)))
        });
    }

    group.finish();
}

fn criterion_movegen(c: &mut Criterion) {
    let mut position = Position::new();
    for name in ["F5", "D6", "C3", "D3", "C4", "F4", "F6", "F3", "E6", "E7"] {
        if let Ok(loc) = name.parse() {
            let _ = position.make_move(loc);
        }
    }
    let board = position.board;

    c.bench_function("move_mask", |b| {
        b.iter(|| bitboard::move_mask(black_box(board.mover), black_box(board.opponent)))
    });
    c.bench_function("flips_all_moves", |b| {
        b.iter(|| {
            black_box(board)
                .legal_moves()
                .fold(0u8, |acc, loc| acc + board.flips(loc).count_occupied())
        })
    });
}

#[cfg(unix)]
criterion_group! {
    name = perft;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = criterion_perft, criterion_movegen
}

#[cfg(not(unix))]
criterion_group! {
    name = perft;
    config = Criterion::default();
    targets = criterion_perft, criterion_movegen
}

criterion_main!(perft);
