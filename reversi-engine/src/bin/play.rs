use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use reversi_board::{Game, Move, Player};
use reversi_engine::strategy::{Difficulty, ParseDifficultyError};
use reversi_engine::worker::Thinker;
use reversi_engine::{EngineConfig, Strategy};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Play Othello in the terminal, against the engine or between engines.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Who plays black: "human" or a difficulty (easy, normal, hard, extreme)
    #[arg(long, default_value = "human")]
    black: Seat,

    /// Who plays white: "human" or a difficulty (easy, normal, hard, extreme)
    #[arg(long, default_value = "extreme")]
    white: Seat,

    /// Engine settings in TOML; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// WTHOR file or directory of *.wtb files for the opening book
    #[arg(long)]
    book: Option<PathBuf>,

    /// Thinking time per move, in milliseconds
    #[arg(long)]
    time: Option<u64>,

    /// Node budget per move
    #[arg(long)]
    nodes: Option<u64>,

    /// Seed for the engine's random choices
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Seat {
    Human,
    Engine(Difficulty),
}

impl FromStr for Seat {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("human") {
            Ok(Seat::Human)
        } else {
            s.parse().map(Seat::Engine)
        }
    }
}

enum Controller {
    Human,
    Engine(Thinker),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if args.book.is_some() {
        config.book_path = args.book.clone();
    }
    if args.time.is_some() {
        config.search.time_limit_ms = args.time;
    }
    if args.nodes.is_some() {
        config.search.node_limit = args.nodes;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let mut controllers = [args.black, args.white].map(|seat| match seat {
        Seat::Human => Controller::Human,
        Seat::Engine(difficulty) => {
            let config = EngineConfig {
                difficulty,
                ..config.clone()
            };
            info!("engine at {} difficulty", difficulty);
            Controller::Engine(Thinker::new(Strategy::new(&config)))
        }
    });

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut game = Game::new();

    while !game.is_finished() {
        println!("\n{}\n", game);

        let side = game.side_to_move();
        let mv = match &mut controllers[side.index()] {
            Controller::Human => match read_human_move(&game, &mut lines)? {
                Some(mv) => mv,
                None => {
                    println!("Goodbye.");
                    return Ok(());
                }
            },
            Controller::Engine(thinker) => engine_move(thinker, &game, side)?,
        };

        game = game
            .apply_move(mv)
            .with_context(|| format!("{} played {}", side, mv))?;
    }

    println!("\n{}\n", game);
    let (black, white) = (game.disc_count(Player::Black), game.disc_count(Player::White));
    match game.winner() {
        Some(winner) => println!("Winner: {} ({}-{}).", winner, black, white),
        None => println!("Draw ({}-{}).", black, white),
    }
    Ok(())
}

fn engine_move(thinker: &mut Thinker, game: &Game, side: Player) -> Result<Move> {
    thinker.think(*game.position())?;
    let thought = thinker
        .wait()?
        .context("thinker finished without an answer")?;

    let mv = thought.mv.map_or(Move::Pass, Move::Piece);
    let stats = thought.stats;
    println!(
        "{} plays {} (depth {}, score {}, {} nodes, {:?}, {:?})",
        side, mv, stats.depth_reached, stats.score, stats.nodes, stats.source, stats.elapsed
    );
    Ok(mv)
}

/// Prompt until the human enters a legal move. `None` means they quit.
fn read_human_move<B: BufRead>(
    game: &Game,
    lines: &mut io::Lines<B>,
) -> Result<Option<Move>> {
    loop {
        print!("{} to move: ", game.side_to_move());
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            return Ok(None);
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            return Ok(None);
        }

        let mv: Move = match line.parse() {
            Ok(mv) => mv,
            Err(_) => {
                println!("Cannot parse move.");
                continue;
            }
        };

        match game.apply_move(mv) {
            Ok(_) => return Ok(Some(mv)),
            Err(_) if game.legal_moves().is_empty() => {
                println!("Invalid move. Please enter 'pass'.")
            }
            Err(_) => println!("Invalid move. Legal moves: {}", game.legal_moves()),
        }
    }
}
