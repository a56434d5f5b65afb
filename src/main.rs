//! Haul CLI - play against a game engine or run local self-play.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Parser, Subcommand};
use haul::StrategyConfig;
use std::process::ExitCode;

/// Haul - a fleet decision engine for halite-harvesting contests
#[derive(Parser, Debug)]
#[command(name = "haul")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play one game over stdin/stdout against the contest engine
    Play {
        /// Seed for the rollout generator (default: from the clock)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Strategy config file (JSON)
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Directory for the per-player log file (default: no logging)
        #[arg(long)]
        log_dir: Option<std::path::PathBuf>,
    },

    /// Run local games between copies of the strategy and aggregate statistics
    Selfplay {
        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Players per game: 2 or 4
        #[arg(long, default_value = "2")]
        players: usize,

        /// Map side length
        #[arg(long, default_value = "32")]
        size: u16,

        /// Maximum turns per game (default: derived from the map size)
        #[arg(short = 't', long)]
        turns: Option<u32>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Strategy config for player 0; the others use the default
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::SelfplayFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Print the default strategy config as JSON
    Config,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Play {
            seed,
            config,
            log_dir,
        } => cli::play::execute(seed, config, log_dir),

        Commands::Selfplay {
            games,
            seed,
            players,
            size,
            turns,
            threads,
            config,
            format,
            progress,
        } => cli::selfplay::execute(cli::selfplay::SelfplayOptions {
            games,
            seed,
            players,
            size,
            turns,
            threads,
            config,
            format,
            progress,
        }),

        Commands::Config => serde_json::to_string_pretty(&StrategyConfig::default())
            .map(|json| println!("{json}"))
            .map_err(|e| cli::CliError::new(format!("JSON serialization failed: {e}"))),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
