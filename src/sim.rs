//! Headless local engine for self-play.
//!
//! Provides a pure function interface: `(seed, config) -> GameResult`
//!
//! The runner handles:
//! - Deterministic, symmetric map generation
//! - One [`Strategy`] per player, each fed its own view of the state
//! - Turn resolution: construction, production, movement, collisions,
//!   mining with inspiration, and deposits
//! - Invariant checks after every turn when enabled

mod engine;
mod mapgen;

pub use engine::{Engine, TurnEvents};
pub use mapgen::{default_max_turns, generate_map};

use thiserror::Error;

use crate::config::{ConfigError, StrategyConfig};
use crate::game::{Constants, InvariantViolation, PlayerId};
use crate::strategy::{Deadline, Strategy};

/// Error type for local games.
#[derive(Debug, Error)]
pub enum SimError {
    /// Only two- and four-player games are supported.
    #[error("unsupported player count: {0} (expected 2 or 4)")]
    PlayerCount(usize),
    /// Map dimensions too small for the requested players.
    #[error("invalid map size {width}x{height}")]
    MapSize {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
    },
    /// A per-player strategy override failed validation.
    #[error("player {player} config: {source}")]
    Config {
        /// Which player.
        player: usize,
        /// Validation failure.
        source: ConfigError,
    },
    /// The engine reached a state that breaks the rules.
    #[error("turn {turn}: {violation}")]
    Invariant {
        /// Turn on which the check failed.
        turn: u32,
        /// First violation found.
        violation: InvariantViolation,
    },
}

/// Configuration for a local game.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Map width.
    pub width: u16,
    /// Map height.
    pub height: u16,
    /// Number of players, 2 or 4.
    pub players: usize,
    /// Turn limit; derived from the map size when `None`.
    pub max_turns: Option<u32>,
    /// Strategy configuration per player; missing entries use the default.
    pub strategies: Vec<StrategyConfig>,
    /// Run the invariant checks after every turn.
    pub check_invariants: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            players: 2,
            max_turns: None,
            strategies: Vec::new(),
            check_invariants: cfg!(debug_assertions),
        }
    }
}

impl SimConfig {
    /// Strategy configuration for one player.
    #[must_use]
    pub fn strategy_for(&self, player: usize) -> StrategyConfig {
        self.strategies.get(player).cloned().unwrap_or_default()
    }
}

/// Statistics for a single player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerStats {
    /// Player identifier.
    pub player_id: PlayerId,
    /// Banked halite at the end of the game.
    pub final_halite: u32,
    /// Total halite deposited at bases.
    pub deposited: u64,
    /// Ships produced.
    pub ships_built: u32,
    /// Ships destroyed in collisions.
    pub ships_lost: u32,
    /// Dropoffs constructed.
    pub dropoffs_built: u32,
}

/// Final result of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    /// The seed used for this game.
    pub seed: u64,
    /// The winning player (None if the top scores tie).
    pub winner: Option<PlayerId>,
    /// Final banked halite per player.
    pub scores: Vec<u32>,
    /// Total turns played.
    pub turns_played: u32,
    /// Per-player statistics.
    pub player_stats: Vec<PlayerStats>,
}

/// Run a complete game with the given seed.
///
/// # Determinism
///
/// Given the same seed and config, this function always produces the same
/// `GameResult`: every strategy runs without a wall-clock deadline and with
/// a generator seeded from the game seed.
///
/// # Errors
///
/// Returns an error if:
/// - The player count is not 2 or 4
/// - The map is too small
/// - A strategy override is invalid
/// - An invariant check fails
pub fn run_game(seed: u64, config: &SimConfig) -> Result<GameResult, SimError> {
    if config.players != 2 && config.players != 4 {
        return Err(SimError::PlayerCount(config.players));
    }
    let constants = Constants {
        max_turns: config
            .max_turns
            .unwrap_or_else(|| default_max_turns(config.width)),
        ..Constants::default()
    };
    let (map, players) = generate_map(
        seed,
        config.width,
        config.height,
        config.players,
        constants.initial_halite,
    )?;

    let mut strategies = Vec::with_capacity(config.players);
    for player in 0..config.players {
        let strategy_config = config.strategy_for(player);
        strategy_config
            .validate()
            .map_err(|source| SimError::Config { player, source })?;
        let player_seed = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(player as u64);
        strategies.push(Strategy::new(strategy_config, player_seed));
    }

    let mut engine = Engine::new(map, players, constants);
    let deadline = Deadline::unlimited();
    tracing::debug!(seed, players = config.players, max_turns = constants.max_turns, "game start");

    while !engine.is_finished() {
        let mut orders = Vec::with_capacity(strategies.len());
        for (player, strategy) in strategies.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let view = engine.view_for(player as PlayerId);
            orders.push(strategy.decide(&view, &deadline).commands);
        }
        let events = engine.step(&orders);
        if events.collisions > 0 {
            tracing::trace!(turn = engine.turn(), collisions = events.collisions, "collisions");
        }
        if config.check_invariants
            && let Some(violation) = engine.check().into_iter().next()
        {
            return Err(SimError::Invariant {
                turn: engine.turn(),
                violation,
            });
        }
    }

    let result = engine.finish(seed);
    tracing::debug!(seed, winner = ?result.winner, scores = ?result.scores, "game over");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_three_players() {
        let config = SimConfig {
            players: 3,
            ..SimConfig::default()
        };
        assert!(matches!(run_game(1, &config), Err(SimError::PlayerCount(3))));
    }

    #[test]
    fn test_rejects_bad_override() {
        let mut bad = StrategyConfig::default();
        bad.task.return_fraction = 3.0;
        let config = SimConfig {
            strategies: vec![StrategyConfig::default(), bad],
            max_turns: Some(5),
            ..SimConfig::default()
        };
        assert!(matches!(
            run_game(1, &config),
            Err(SimError::Config { player: 1, .. })
        ));
    }

    #[test]
    fn test_short_game_is_deterministic() {
        let config = SimConfig {
            max_turns: Some(30),
            check_invariants: true,
            ..SimConfig::default()
        };
        let a = run_game(11, &config).unwrap();
        let b = run_game(11, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.turns_played, 30);
        assert_eq!(a.scores.len(), 2);
    }
}
