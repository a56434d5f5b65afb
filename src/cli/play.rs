//! Play command: drive one bot over the engine's stdin/stdout protocol.

use super::{seed_or_clock, CliError};
use haul::protocol::{EngineReader, EngineWriter};
use haul::{Deadline, GameState, HaulResult, Strategy, StrategyConfig};
use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Name the bot announces during the handshake.
const BOT_NAME: &str = "haul";

/// Execute the play command.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, the log file cannot be
/// created, or the engine connection breaks.
pub(crate) fn execute(
    seed: Option<u64>,
    config: Option<PathBuf>,
    log_dir: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = match config {
        Some(path) => StrategyConfig::from_file(&path)?,
        None => StrategyConfig::default(),
    };

    let stdin = io::stdin();
    let mut reader = EngineReader::new(stdin.lock());
    let mut state = reader.read_init()?;

    init_logging(log_dir.as_deref(), state.my_id)?;
    tracing::info!(
        player = state.my_id,
        width = state.map.width(),
        height = state.map.height(),
        players = state.player_count(),
        "connected"
    );

    let stdout = io::stdout();
    let mut writer = EngineWriter::new(stdout.lock());
    writer.send_name(BOT_NAME)?;

    let seed = seed_or_clock(seed) ^ u64::from(state.my_id);
    let budget = Duration::from_millis(config.timing.turn_budget_ms);
    let mut strategy = Strategy::new(config, seed);
    let result = session(&mut reader, &mut writer, &mut state, &mut strategy, budget);
    if let Err(e) = &result {
        tracing::error!(turn = state.turn, error = %e, "engine session ended with an error");
    } else {
        tracing::info!(turn = state.turn, halite = state.me().halite, "game over");
    }
    result.map_err(CliError::from)
}

/// Answer every frame until the engine closes the stream.
fn session<R: BufRead, W: Write>(
    reader: &mut EngineReader<R>,
    writer: &mut EngineWriter<W>,
    state: &mut GameState,
    strategy: &mut Strategy,
    budget: Duration,
) -> HaulResult<()> {
    while reader.read_frame(state)? {
        let deadline = Deadline::after(budget);
        let plan = strategy.decide(state, &deadline);
        writer.send_commands(&plan.commands)?;
    }
    Ok(())
}

/// Route logs to a per-player file; stdout belongs to the protocol.
fn init_logging(log_dir: Option<&Path>, player: u8) -> Result<(), CliError> {
    let Some(dir) = log_dir else {
        return Ok(());
    };
    fs::create_dir_all(dir)
        .map_err(|e| CliError::new(format!("Failed to create {}: {e}", dir.display())))?;
    let path = dir.join(format!("haul-{player}.log"));
    let file = File::create(&path)
        .map_err(|e| CliError::new(format!("Failed to create {}: {e}", path.display())))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| CliError::new(format!("Failed to initialise logging: {e}")))
}
