//! Error types for the decision engine.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::protocol::ProtocolError;
use crate::sim::SimError;

/// Top-level error for a bot run or a self-play session.
#[derive(Debug, Error)]
pub enum HaulError {
    /// Reading from or writing to the engine failed.
    #[error("engine I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The engine sent something the reader could not parse.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The strategy configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A local game could not be set up or ran into a rule violation.
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Result type used by the bot driver and the CLI.
pub type HaulResult<T> = Result<T, HaulError>;
