//! Endtrack-Rust: an End of the Track engine.
//!
//! ## Usage
//!
//! - `endtrack-rust` - Start the text console (same as `console`)
//! - `endtrack-rust console` - Play through the line protocol on stdin/stdout
//! - `endtrack-rust demo` - Show one engine move from the starting position
//! - `endtrack-rust selfplay --games 3` - Let the engine play itself

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flexi_logger::Logger;

use endtrack_rust::board::{Board, Color};
use endtrack_rust::console::ConsoleEngine;
use endtrack_rust::constants::{DEFAULT_LEVEL, MAX_ROLLOUT_PLIES};
use endtrack_rust::mcts::{MctsPlayer, SearchConfig};
use endtrack_rust::rules::Status;

/// Endtrack-Rust: an End of the Track engine driven by MCTS
#[derive(Parser)]
#[command(name = "endtrack-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Difficulty level; level n searches for 60 * (2n - 1) ms per move
    #[arg(long, global = true, default_value_t = DEFAULT_LEVEL,
          value_parser = clap::value_parser!(u32).range(1..))]
    level: u32,

    /// Seed for the search's random generator
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Plies after which a rollout is abandoned
    #[arg(long, global = true, default_value_t = MAX_ROLLOUT_PLIES)]
    max_rollout_plies: usize,

    /// Log search details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin and answer on stdout
    Console,
    /// Run one search from the starting position and show the result
    Demo,
    /// Let the engine play both sides
    Selfplay {
        /// Number of games to play
        #[arg(long, default_value_t = 1)]
        games: u32,
        /// Moves after which an unfinished game is abandoned
        #[arg(long, default_value_t = 200)]
        max_moves: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _logger = Logger::try_with_env_or_str(if cli.verbose { "debug" } else { "warn" })?
        .format(flexi_logger::colored_default_format)
        .start()
        .context("failed to start the logger")?;

    let mut config = SearchConfig::default().with_max_rollout_plies(cli.max_rollout_plies);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    match cli.command {
        Some(Commands::Console) | None => ConsoleEngine::with_config(cli.level, config)
            .run()
            .context("console I/O failed"),
        Some(Commands::Demo) => run_demo(cli.level, config),
        Some(Commands::Selfplay { games, max_moves }) => {
            run_selfplay(cli.level, config, games, max_moves)
        }
    }
}

fn run_demo(level: u32, config: SearchConfig) -> Result<()> {
    println!("Endtrack-Rust: End of the Track MCTS engine\n");

    let board = Board::new();
    println!("{board}");

    let mut player = MctsPlayer::new(config);
    let outcome = player
        .find_next_move(&board, level)
        .context("search from the starting position failed")?;

    println!(
        "{} plays {} after {} iterations ({} nodes)\n",
        Color::White,
        outcome.chosen,
        outcome.iterations,
        outcome.tree_nodes
    );
    println!("{}", outcome.board);
    Ok(())
}

fn run_selfplay(level: u32, config: SearchConfig, games: u32, max_moves: u32) -> Result<()> {
    let mut wins = [0u32; 2];
    let mut unfinished = 0;

    for game in 0..games {
        // each side draws from its own generator
        let player_config = |offset: u64| match config.seed {
            Some(seed) => config
                .clone()
                .with_seed(seed.wrapping_add(2 * u64::from(game) + offset)),
            None => config.clone(),
        };
        let mut white = MctsPlayer::new(player_config(0));
        let mut black = MctsPlayer::new(player_config(1));

        let mut board = Board::new();
        let mut moves = 0;
        while board.status() == Status::InProgress && moves < max_moves {
            let player = match board.current() {
                Color::White => &mut white,
                Color::Black => &mut black,
            };
            let outcome = player
                .find_next_move(&board, level)
                .with_context(|| format!("game {} move {} failed", game + 1, moves + 1))?;
            println!(
                "game {} move {}: {} {} ({:?})",
                game + 1,
                moves + 1,
                board.current(),
                outcome.chosen,
                outcome.mode
            );
            board = outcome.board;
            moves += 1;
        }

        match board.status() {
            Status::Won(winner) => {
                wins[usize::from(winner == Color::Black)] += 1;
                println!("game {}: {winner} wins after {moves} moves\n{board}", game + 1);
            }
            Status::InProgress => {
                unfinished += 1;
                println!("game {}: abandoned after {moves} moves\n{board}", game + 1);
            }
        }
    }

    println!(
        "white {} - black {} ({unfinished} unfinished)",
        wins[0], wins[1]
    );
    Ok(())
}
