//! Selfplay command: many local games in parallel, aggregated.

use super::output::{format_selfplay_csv, format_selfplay_text, JsonSelfplayResult, SelfplayStats};
use super::{seed_or_clock, CliError, SelfplayFormat};
use haul::sim::{run_game, SimConfig};
use haul::StrategyConfig;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Options for the selfplay command.
#[derive(Debug)]
pub(crate) struct SelfplayOptions {
    /// Number of games.
    pub(crate) games: u64,
    /// Starting seed (increments for each game).
    pub(crate) seed: Option<u64>,
    /// Players per game.
    pub(crate) players: usize,
    /// Map side length.
    pub(crate) size: u16,
    /// Turn limit override.
    pub(crate) turns: Option<u32>,
    /// Worker threads.
    pub(crate) threads: Option<usize>,
    /// Config for player 0; everyone else uses the default.
    pub(crate) config: Option<PathBuf>,
    /// Output format.
    pub(crate) format: SelfplayFormat,
    /// Show a progress bar.
    pub(crate) progress: bool,
}

/// Execute the selfplay command.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or the options are invalid.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn execute(options: SelfplayOptions) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed by a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    if options.players != 2 && options.players != 4 {
        return Err(CliError::new(format!(
            "--players must be 2 or 4, got {}",
            options.players
        )));
    }

    let mut strategies = Vec::new();
    let mut labels = vec!["default".to_string(); options.players];
    if let Some(path) = &options.config {
        strategies.push(StrategyConfig::from_file(path)?);
        labels[0] = path
            .file_name()
            .map_or_else(|| "candidate".to_string(), |n| n.to_string_lossy().to_string());
    }

    // Set thread pool size if specified
    if let Some(num_threads) = options.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed_or_clock(options.seed);
    let config = SimConfig {
        width: options.size,
        height: options.size,
        players: options.players,
        max_turns: options.turns,
        strategies,
        check_invariants: false,
    };

    let pb = if options.progress {
        let pb = ProgressBar::new(options.games);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let num_players = options.players;

    // Each thread accumulates into its own stats, merged at the end
    let stats = (0..options.games)
        .into_par_iter()
        .fold(
            || SelfplayStats::new(num_players),
            |mut local, i| {
                let game_seed = base_seed.wrapping_add(i);
                match run_game(game_seed, &config) {
                    Ok(result) => local.add_result(&result),
                    Err(e) => {
                        tracing::warn!(seed = game_seed, error = %e, "game failed");
                        local.add_failure();
                    }
                }
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                local
            },
        )
        .reduce(
            || SelfplayStats::new(num_players),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    #[allow(clippy::cast_precision_loss)]
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match options.format {
        SelfplayFormat::Text => {
            println!();
            print!("{}", format_selfplay_text(&stats, &labels));
            println!();
            println!("Duration: {:.2}s ({:.1} games/sec)", duration.as_secs_f64(), games_per_sec);
        }
        SelfplayFormat::Json => {
            let json_result = JsonSelfplayResult::from_stats(&stats);
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        SelfplayFormat::Csv => {
            print!("{}", format_selfplay_csv(&stats, &labels));
        }
    }

    Ok(())
}
