use byteorder::{ByteOrder, LittleEndian};
use reversi_board::bitboard::Bitboard;
use reversi_board::{Game, Location, Move, Player, Position};
use reversi_engine::book::OpeningBook;
use reversi_engine::config::{BookConfig, EngineConfig, SearchConfig};
use reversi_engine::eval::Evaluator;
use reversi_engine::search::MoveSource;
use reversi_engine::strategy::{AlphaBetaMinimax, FixedDepthMinimax, StrategyKind};
use reversi_engine::tt::TranspositionTable;
use reversi_engine::worker::Thinker;
use reversi_engine::{Budget, Difficulty, SearchEngine, Strategy};
use std::collections::HashSet;
use std::fs;
use std::time::Duration;

fn loc(name: &str) -> Location {
    name.parse().unwrap()
}

fn bits(names: &[&str]) -> Bitboard {
    names
        .iter()
        .fold(Bitboard::EMPTY, |acc, name| acc | loc(name).to_onehot())
}

/// One 68-byte WTHOR game record.
fn wthor_record(moves: &[&str], black_discs: u8) -> Vec<u8> {
    let mut record = vec![0u8; 68];
    record[7] = black_discs;
    for (i, name) in moves.iter().enumerate() {
        let (row, col) = loc(name).to_coords();
        record[8 + i] = (row * 10 + col + 10) as u8;
    }
    record
}

/// A WTHOR database declaring `declared` games, followed by `records` as-is.
fn wthor_database(records: &[Vec<u8>], declared: u32) -> Vec<u8> {
    let mut bytes = vec![0u8; 16];
    LittleEndian::write_u32(&mut bytes[4..8], declared);
    for record in records {
        bytes.extend_from_slice(record);
    }
    bytes
}

fn small_engine(book: Option<OpeningBook>) -> SearchEngine {
    SearchEngine::new(
        SearchConfig::default(),
        Evaluator::default(),
        TranspositionTable::with_capacity(1 << 16),
        book,
    )
}

#[test]
fn book_loads_from_file_and_skips_truncated_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("games.wtb");

    let mut truncated = wthor_record(&["F5", "F6"], 40);
    truncated.truncate(30);
    let bytes = wthor_database(
        &[
            wthor_record(&["F5", "D6", "C3"], 40),
            wthor_record(&["F5", "D6"], 40),
            truncated,
        ],
        3,
    );
    fs::write(&path, bytes).unwrap();

    let mut book = OpeningBook::new(BookConfig::default(), Some(1));
    assert_eq!(book.load_file(&path).unwrap(), 2);
    assert_eq!(book.stats().games_loaded, 2);
    assert_eq!(book.stats().games_skipped, 1);
    assert_eq!(book.stats().deepest_ply, 3);
    assert_eq!(book.probe(&Position::new()), Some(loc("F5")));
}

#[test]
fn book_decodes_corner_and_edge_codes() {
    // A1 is code 10 and H8 is 87; both must survive as moves, not end markers.
    let record = wthor_record(&["F5", "D6", "C3"], 40);
    assert_eq!(&record[8..11], &[55, 63, 32]);
    assert_eq!(wthor_record(&["A1"], 0)[8], 10);
    assert_eq!(wthor_record(&["H8"], 0)[8], 87);

    let bytes = wthor_database(&[record.clone(), record], 2);
    let mut book = OpeningBook::new(BookConfig::default(), Some(1));
    assert_eq!(book.read_games(&bytes[..]).unwrap(), 2);
    assert_eq!(book.stats().games_skipped, 0);
    assert_eq!(book.probe(&Position::new()), Some(loc("F5")));
}

#[test]
fn book_skips_impossible_scores_and_empty_games() {
    let bytes = wthor_database(
        &[
            wthor_record(&["F5"], 200),
            wthor_record(&["F5"], 65),
            wthor_record(&[], 40),
            wthor_record(&["F5"], 40),
        ],
        4,
    );
    let mut book = OpeningBook::new(BookConfig::default(), Some(1));
    assert_eq!(book.read_games(&bytes[..]).unwrap(), 1);
    assert_eq!(book.stats().games_loaded, 1);
    assert_eq!(book.stats().games_skipped, 3);
    assert_eq!(book.moves(&Position::new())[0].wins, 1);
}

#[test]
fn book_ignores_records_past_the_declared_count() {
    let bytes = wthor_database(
        &[
            wthor_record(&["F5"], 40),
            wthor_record(&["F5"], 40),
            wthor_record(&["F5"], 40),
        ],
        2,
    );
    let mut book = OpeningBook::new(BookConfig::default(), Some(1));
    assert_eq!(book.read_games(&bytes[..]).unwrap(), 2);
    assert_eq!(book.moves(&Position::new())[0].games, 2);
}

#[test]
fn book_loads_every_wtb_file_in_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let game = wthor_record(&["F5", "D6"], 40);
    fs::write(dir.path().join("a.wtb"), wthor_database(&[game.clone()], 1)).unwrap();
    fs::write(
        dir.path().join("b.wtb"),
        wthor_database(&[game.clone(), game.clone()], 2),
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), wthor_database(&[game], 1)).unwrap();

    let mut book = OpeningBook::new(BookConfig::default(), Some(1));
    assert_eq!(book.load_dir(dir.path()).unwrap(), 3);
    assert_eq!(book.len(), 2);
}

#[test]
fn missing_book_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut book = OpeningBook::new(BookConfig::default(), Some(1));
    assert!(book.load_dir(dir.path().join("nope")).is_err());
}

#[test]
fn book_choices_stay_in_the_top_two() {
    let config = BookConfig {
        second_choice_probability: 0.5,
        ..BookConfig::default()
    };
    let mut book = OpeningBook::new(config, Some(99));
    // White wins with D6 three times and F6 twice; F4 loses twice.
    for _ in 0..3 {
        assert!(book.add_game(&[loc("F5"), loc("D6")], 20));
    }
    for _ in 0..2 {
        assert!(book.add_game(&[loc("F5"), loc("F6")], 20));
        assert!(book.add_game(&[loc("F5"), loc("F4")], 50));
    }

    let mut position = Position::new();
    position.make_move(loc("F5")).unwrap();

    let ranked: Vec<Location> = book.ranked(&position).iter().map(|s| s.location).collect();
    assert_eq!(ranked, vec![loc("D6"), loc("F6"), loc("F4")]);

    let chosen: HashSet<Location> = (0..200).filter_map(|_| book.probe(&position)).collect();
    assert_eq!(chosen, HashSet::from([loc("D6"), loc("F6")]));
}

#[test]
fn engine_plays_from_the_book() {
    let mut book = OpeningBook::new(BookConfig::default(), Some(5));
    book.add_game(&[loc("F5"), loc("D6")], 40);
    book.add_game(&[loc("F5"), loc("D6")], 40);

    let mut engine = small_engine(Some(book));
    assert_eq!(
        engine.best_move(&Position::new(), Budget::nodes(1000)),
        Some(loc("F5"))
    );
    assert_eq!(engine.stats().source, MoveSource::Book);
    assert_eq!(engine.stats().nodes, 0);
}

#[test]
fn single_legal_move_is_played_without_search() {
    let position = Position::from_colors(bits(&["B1"]), bits(&["A1"]), Player::White).unwrap();
    let mut engine = small_engine(None);
    assert_eq!(
        engine.best_move(&position, Budget::unlimited()),
        Some(loc("C1"))
    );
    assert_eq!(engine.stats().source, MoveSource::SingleMove);
    assert_eq!(engine.stats().nodes, 0);
}

#[test]
fn first_iteration_always_completes() {
    let mut engine = small_engine(None);
    let position = Position::new();
    let mv = engine
        .best_move(&position, Budget::time(Duration::ZERO))
        .unwrap();
    assert!(position.board.is_legal(mv));
    assert_eq!(engine.stats().depth_reached, 1);
    assert_eq!(engine.stats().source, MoveSource::Search);
}

#[test]
fn node_budget_is_respected() {
    let mut engine = small_engine(None);
    let mut position = Position::new();
    position.make_move(loc("F5")).unwrap();

    let mv = engine.best_move(&position, Budget::nodes(500)).unwrap();
    assert!(position.board.is_legal(mv));
    assert!(engine.stats().nodes <= 510, "{} nodes", engine.stats().nodes);
    assert!(engine.stats().depth_reached >= 1);
}

#[test]
fn search_leaves_the_callers_position_alone() {
    let mut engine = small_engine(None);
    let position = Position::new();
    let before = position;
    engine.search_depth(&position, 4);
    assert_eq!(position, before);
}

fn play_game(black: &mut Strategy, white: &mut Strategy) -> Game {
    let mut game = Game::new();
    while !game.is_finished() {
        let strategy = match game.side_to_move() {
            Player::Black => &mut *black,
            Player::White => &mut *white,
        };
        let mv = strategy
            .choose_move(game.position())
            .map_or(Move::Pass, Move::Piece);
        game = game.apply_move(mv).unwrap();
    }
    game
}

fn random_player(seed: u64) -> Strategy {
    Strategy::new(&EngineConfig {
        difficulty: Difficulty::Easy,
        seed: Some(seed),
        ..EngineConfig::default()
    })
}

#[test]
fn every_strategy_finishes_a_legal_game() {
    let extreme_config = EngineConfig {
        difficulty: Difficulty::Extreme,
        seed: Some(11),
        search: SearchConfig {
            time_limit_ms: None,
            node_limit: Some(2_000),
            tt_size_mb: 1,
            ..SearchConfig::default()
        },
        ..EngineConfig::default()
    };

    let opponents = [
        Strategy::with_kind(
            Difficulty::Normal,
            StrategyKind::FixedDepthMinimax(FixedDepthMinimax::new(2)),
        ),
        Strategy::with_kind(
            Difficulty::Hard,
            StrategyKind::AlphaBetaMinimax(AlphaBetaMinimax::new(3, 5_000)),
        ),
        Strategy::new(&extreme_config),
    ];

    for (seed, mut strategy) in (0..).zip(opponents) {
        let mut random = random_player(seed);
        let game = play_game(&mut strategy, &mut random);
        assert!(game.is_finished(), "{} did not finish", strategy.name());
        assert!(game.disc_count(Player::Black) + game.disc_count(Player::White) <= 64);
    }
}

#[test]
fn thinkers_play_a_whole_game() {
    let mut thinkers = [
        Thinker::new(random_player(1)),
        Thinker::new(Strategy::with_kind(
            Difficulty::Normal,
            StrategyKind::FixedDepthMinimax(FixedDepthMinimax::new(2)),
        )),
    ];

    let mut game = Game::new();
    while !game.is_finished() {
        let thinker = &mut thinkers[game.side_to_move().index()];
        thinker.think(*game.position()).unwrap();
        let thought = thinker.wait().unwrap().unwrap();
        assert_eq!(thought.position_hash, game.position().hash);
        game = game
            .apply_move(thought.mv.map_or(Move::Pass, Move::Piece))
            .unwrap();
    }
    assert!(thinkers.iter().all(|thinker| !thinker.is_thinking()));
}
