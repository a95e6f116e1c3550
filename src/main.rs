//! ThinkGo: a UCT Go engine.
//!
//! ## Usage
//!
//! - `thinkgo` - Show a demo
//! - `thinkgo gtp` - Start GTP server for GUI integration
//! - `thinkgo selfplay --games 10 --black uct --white policy` - Engine matches
//! - `thinkgo demo` - Search one position and print the root statistics
//!
//! Logs go to stderr; set `RUST_LOG` (e.g. `RUST_LOG=thinkgo=debug`) to
//! see more.

use std::time::Duration;

use anyhow::{Result, ensure};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use thinkgo::board::{Board, Color};
use thinkgo::constants::{
    DEFAULT_KOMI, DEFAULT_SEED, DEFAULT_SIZE, MAX_SIZE, MIN_SIZE, N_SIMS,
    RESIGN_THRES,
};
use thinkgo::game::{Outcome, play_game};
use thinkgo::gtp::GtpEngine;
use thinkgo::mcts::{SearchBudget, SearchConfig, UctSearch};
use thinkgo::player::{Player, PolicyPlayer, RandomPlayer, UctPlayer};

/// ThinkGo: a UCT Go engine with RAVE and a tactical playout policy
#[derive(Parser)]
#[command(name = "thinkgo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    search: SearchArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GTP (Go Text Protocol) server for use with GUI applications
    Gtp,
    /// Play engine games against each other and report the results
    Selfplay(SelfplayArgs),
    /// Search a short opening position and print what the search found
    Demo,
}

#[derive(Args)]
struct SearchArgs {
    /// Simulations per move
    #[arg(long, global = true, default_value_t = N_SIMS)]
    sims: usize,
    /// Search time per move in milliseconds; overrides --sims
    #[arg(long, global = true)]
    millis: Option<u64>,
    /// Random seed for the search
    #[arg(long, global = true, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

impl SearchArgs {
    fn config(&self) -> SearchConfig {
        let budget = match self.millis {
            Some(ms) => SearchBudget::Time(Duration::from_millis(ms)),
            None => SearchBudget::Simulations(self.sims),
        };
        SearchConfig {
            budget,
            seed: self.seed,
            ..SearchConfig::default()
        }
    }
}

#[derive(Args)]
struct SelfplayArgs {
    /// Number of games
    #[arg(long, default_value_t = 1)]
    games: usize,
    #[arg(long, value_enum, default_value_t = PlayerKind::Uct)]
    black: PlayerKind,
    #[arg(long, value_enum, default_value_t = PlayerKind::Policy)]
    white: PlayerKind,
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,
    #[arg(long, default_value_t = DEFAULT_KOMI)]
    komi: f32,
    #[arg(long, default_value_t = 0)]
    handicap: usize,
    /// Print the game record after each game
    #[arg(long)]
    records: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum PlayerKind {
    Uct,
    Policy,
    Random,
}

impl PlayerKind {
    fn name(self) -> &'static str {
        match self {
            PlayerKind::Uct => "uct",
            PlayerKind::Policy => "policy",
            PlayerKind::Random => "random",
        }
    }

    fn create(self, config: &SearchConfig, seed: u64) -> Box<dyn Player> {
        match self {
            PlayerKind::Uct => Box::new(
                UctPlayer::new(SearchConfig {
                    seed,
                    ..config.clone()
                })
                .with_resign_threshold(RESIGN_THRES),
            ),
            PlayerKind::Policy => Box::new(PolicyPlayer::new(seed)),
            PlayerKind::Random => Box::new(RandomPlayer::new(seed)),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thinkgo=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.search.config();

    match cli.command {
        Some(Commands::Gtp) => {
            info!("starting GTP engine");
            GtpEngine::with_config(config).run()
        }
        Some(Commands::Selfplay(args)) => run_selfplay(&args, &config),
        Some(Commands::Demo) | None => {
            run_demo(config);
            Ok(())
        }
    }
}

fn run_selfplay(args: &SelfplayArgs, config: &SearchConfig) -> Result<()> {
    ensure!(
        (MIN_SIZE..=MAX_SIZE).contains(&args.size),
        "board size must be between {MIN_SIZE} and {MAX_SIZE}"
    );

    let mut wins = [0usize; 2];
    for game in 0..args.games {
        let seed = config.seed.wrapping_add(2 * game as u64);
        let mut black = args.black.create(config, seed);
        let mut white = args.white.create(config, seed.wrapping_add(1));

        let result = play_game(
            black.as_mut(),
            white.as_mut(),
            args.size,
            args.komi,
            args.handicap,
        )?;
        let winner = result.outcome.winner();
        if let Some(color) = winner {
            wins[color.index()] += 1;
        }
        let how = match result.outcome {
            Outcome::Score(score) => format!("{score:+}"),
            Outcome::Resignation(color) => format!("{color} resigned"),
        };
        info!(
            game = game + 1,
            black = black.name(),
            white = white.name(),
            moves = result.record.moves.len(),
            winner = winner.map_or_else(|| "none".to_string(), |c| c.to_string()),
            result = %how,
            "game over"
        );
        if args.records {
            println!("{}", result.record.to_properties());
        }
    }

    println!(
        "black ({}) {} - {} white ({})",
        args.black.name(),
        wins[Color::Black.index()],
        wins[Color::White.index()],
        args.white.name(),
    );
    Ok(())
}

fn run_demo(config: SearchConfig) {
    println!("ThinkGo: UCT Go engine\n");

    let mut board = Board::new(DEFAULT_SIZE);
    board.set_komi(DEFAULT_KOMI);
    for s in ["E5", "C3"] {
        if let Ok(p) = board.parse_point(s) {
            board.place_stone(p);
        }
    }
    println!("{board}");

    let mut search = UctSearch::new(&board, config);
    let sims = search.run_search();
    println!("Ran {sims} simulations");
    for child in search.root_children().iter().take(5) {
        println!(
            "  {:>5}  visits {:>6}  mean {:.3}  rave {:.3} ({:.0})",
            board.point_notation(child.mv),
            child.visits,
            child.mean,
            child.rave_value,
            child.rave_count,
        );
    }
    let pv: Vec<String> = search
        .principal_variation()
        .iter()
        .map(|&mv| board.point_notation(mv))
        .collect();
    println!("Best move: {}", board.point_notation(search.best_move()));
    println!("Principal variation: {}", pv.join(" "));
}
