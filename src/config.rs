//! Strategy configuration.
//!
//! Every tuned threshold and multiplier used by the decision pipeline lives
//! here. Configurations load from JSON; any omitted field keeps its default,
//! so a file only needs the values it overrides.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config from {path:?}: {source}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The JSON was malformed or had wrong types.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value was out of its valid range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Root configuration for the decision engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Task classifier thresholds.
    pub task: TaskConfig,
    /// Distance/profit estimator settings.
    pub estimator: EstimatorConfig,
    /// Monte-Carlo rollout settings.
    pub rollout: RolloutConfig,
    /// Target and move assignment settings.
    pub assignment: AssignmentConfig,
    /// Move safety classification.
    pub safety: SafetyConfig,
    /// Base placement heuristic.
    pub bases: BaseConfig,
    /// Production control loop.
    pub economy: EconomyConfig,
    /// Wall-clock budget.
    pub timing: TimingConfig,
}

impl StrategyConfig {
    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fractions = [
            ("task.return_fraction", self.task.return_fraction),
            ("task.early_return_fraction", self.task.early_return_fraction),
            ("task.exhausted_field_fraction", self.task.exhausted_field_fraction),
            ("task.hold_quantile", self.task.hold_quantile),
            ("bases.max_turn_fraction", self.bases.max_turn_fraction),
            ("bases.harvest_fraction", self.bases.harvest_fraction),
            ("economy.min_field_fraction", self.economy.min_field_fraction),
            ("economy.floor_turn_fraction", self.economy.floor_turn_fraction),
            ("timing.rollout_share", self.timing.rollout_share),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} = {value} not in [0, 1]")));
            }
        }
        if !(self.economy.smoothing > 0.0 && self.economy.smoothing <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "economy.smoothing = {} not in (0, 1]",
                self.economy.smoothing
            )));
        }
        if self.economy.sample_interval == 0 {
            return Err(ConfigError::Invalid("economy.sample_interval must be > 0".into()));
        }
        if self.assignment.top_k == 0 {
            return Err(ConfigError::Invalid("assignment.top_k must be > 0".into()));
        }
        if self.assignment.move_cost_base <= 1.0 {
            return Err(ConfigError::Invalid("assignment.move_cost_base must be > 1".into()));
        }
        if self.bases.radius_divisor == 0 || self.bases.density_divisor == 0 {
            return Err(ConfigError::Invalid("bases divisors must be > 0".into()));
        }
        Ok(())
    }
}

/// Task classifier thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Cargo fraction of capacity above which an explorer returns.
    pub return_fraction: f64,
    /// Relaxed return fraction used early in small games.
    pub early_return_fraction: f64,
    /// The relaxed fraction applies while `turn <= max_turns × this`.
    pub early_return_turn_fraction: f64,
    /// The relaxed fraction applies with at most this many players.
    pub early_return_max_players: usize,
    /// Turns of congestion budgeted per fleet member when projecting the final return.
    pub congestion_factor: f64,
    /// Field halite at or below this fraction of the initial field triggers the endgame.
    pub exhausted_field_fraction: f64,
    /// Explorers that stay still this many turns switch to returning.
    pub stall_turns: u32,
    /// Whether non-full ships keep mining rich cells instead of moving.
    pub mining_hold: bool,
    /// Halite quantile (over all cells) that counts as a rich cell.
    pub hold_quantile: f64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            return_fraction: 0.95,
            early_return_fraction: 0.75,
            early_return_turn_fraction: 0.75,
            early_return_max_players: 2,
            congestion_factor: 0.3,
            exhausted_field_fraction: 0.01,
            stall_turns: 10,
            mining_hold: true,
            hold_quantile: 0.5,
        }
    }
}

/// Distance/profit estimator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Do not route through cells holding opposing ships.
    pub avoid_enemy_cells: bool,
    /// Fraction of an immobilized opponent's cargo counted as capturable.
    pub capture_share: f64,
    /// Score assigned to unreachable or unprofitable targets.
    pub sentinel_score: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            avoid_enemy_cells: true,
            capture_share: 0.5,
            sentinel_score: -1.0e9,
        }
    }
}

/// Monte-Carlo rollout settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    /// Samples per legal first move before time pressure scaling.
    pub samples_per_move: usize,
    /// Maximum simulated turns per walk.
    pub turn_cap: u32,
    /// Weight random choices by cell halite instead of choosing uniformly.
    pub weighted: bool,
    /// Check the deadline every this many samples.
    pub poll_interval: usize,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            samples_per_move: 16,
            turn_cap: 24,
            weighted: true,
            poll_interval: 8,
        }
    }
}

/// Target and move assignment settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentConfig {
    /// Columns kept per explorer before taking the union.
    pub top_k: usize,
    /// Cost used for inadmissible matrix entries.
    pub sentinel_cost: f64,
    /// Base of the exponential move cost; the worst legal direction costs this much.
    pub move_cost_base: f64,
    /// Multiplier applied to moves onto ACCEPTABLE cells.
    pub acceptable_penalty: f64,
    /// Finite cost of staying on an UNSAFE cell, keeping every row feasible.
    pub unsafe_stay_cost: f64,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            top_k: 12,
            sentinel_cost: 1.0e9,
            move_cost_base: 16.0,
            acceptable_penalty: 3.0,
            unsafe_stay_cost: 1.0e6,
        }
    }
}

/// Move safety classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Radius of the closer-fleet vote.
    pub vote_radius: u32,
    /// Require strictly more friendly weight than enemy weight.
    pub strict_majority: bool,
    /// Minimum cargo advantage for a collision to count as a gain.
    pub min_capture_gain: i64,
    /// Treat cells next to opposing ships as contested in games with at least this many players.
    pub guard_enemy_reach_min_players: usize,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            vote_radius: 4,
            strict_majority: true,
            min_capture_gain: 0,
            guard_enemy_reach_min_players: 4,
        }
    }
}

/// Base placement heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseConfig {
    /// Whether new bases are considered at all.
    pub enabled: bool,
    /// Density radius is `width / radius_divisor`.
    pub radius_divisor: u16,
    /// Minimum base spacing is `width / spacing_divisor_duel` in two-player games.
    pub spacing_divisor_duel: u16,
    /// Minimum base spacing is `width / spacing_divisor_ffa` otherwise.
    pub spacing_divisor_ffa: u16,
    /// Minimum local halite is `capacity × width / density_divisor`.
    pub density_divisor: u32,
    /// Minimum fleet size before building.
    pub min_fleet: usize,
    /// No new bases after `max_turns × this`.
    pub max_turn_fraction: f64,
    /// Share of local halite expected to be harvested through the new base.
    pub harvest_fraction: f64,
    /// Income per ship per turn assumed before the first economy sample.
    pub income_prior: f64,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius_divisor: 8,
            spacing_divisor_duel: 3,
            spacing_divisor_ffa: 6,
            density_divisor: 4,
            min_fleet: 8,
            max_turn_fraction: 0.666,
            harvest_fraction: 0.6,
            income_prior: 20.0,
        }
    }
}

/// Spawn-factor table entry: keep producing until `max_turns × factor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnFactor {
    /// Map width.
    pub width: u16,
    /// Player count.
    pub players: usize,
    /// Fraction of the game during which production continues.
    pub factor: f64,
}

/// Production control loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// EWMA smoothing factor.
    pub smoothing: f64,
    /// Income is sampled every this many turns.
    pub sample_interval: u32,
    /// Turns at the end of the game that do not count toward amortizing a ship.
    pub cutoff_turns: u32,
    /// A ship must earn `ship_cost × amortize_factor` before the cutoff.
    pub amortize_factor: f64,
    /// Stop producing when less than this fraction of the initial field remains.
    pub min_field_fraction: f64,
    /// Fleet ceiling is `max opponent fleet × ceiling_ratio + ceiling_slack`.
    pub ceiling_ratio: f64,
    /// Additive slack of the fleet ceiling.
    pub ceiling_slack: usize,
    /// Keep pace with the smallest opponent fleet until `max_turns × this`.
    pub floor_turn_fraction: f64,
    /// Production horizon used before the first income sample.
    pub spawn_factors: Vec<SpawnFactor>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        let table = [
            (32, 2, 0.5),
            (40, 2, 0.5),
            (48, 2, 0.5),
            (56, 2, 0.55),
            (64, 2, 0.625),
            (32, 4, 0.35),
            (40, 4, 0.375),
            (48, 4, 0.5),
            (56, 4, 0.525),
            (64, 4, 0.525),
        ];
        Self {
            smoothing: 0.35,
            sample_interval: 5,
            cutoff_turns: 40,
            amortize_factor: 1.0,
            min_field_fraction: 0.15,
            ceiling_ratio: 1.5,
            ceiling_slack: 10,
            floor_turn_fraction: 0.95,
            spawn_factors: table
                .into_iter()
                .map(|(width, players, factor)| SpawnFactor {
                    width,
                    players,
                    factor,
                })
                .collect(),
        }
    }
}

impl EconomyConfig {
    /// Spawn factor for the closest listed map width with the given player count.
    #[must_use]
    pub fn spawn_factor(&self, width: u16, players: usize) -> f64 {
        let key = if players <= 2 { 2 } else { 4 };
        self.spawn_factors
            .iter()
            .filter(|f| f.players == key)
            .min_by_key(|f| f.width.abs_diff(width))
            .map_or(0.5, |f| f.factor)
    }
}

/// Wall-clock budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Soft budget for one turn, in milliseconds.
    pub turn_budget_ms: u64,
    /// Share of the budget the rollout phase may consume.
    pub rollout_share: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            turn_budget_ms: 1500,
            rollout_share: 0.6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(StrategyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            StrategyConfig::from_json_str(r#"{"task": {"return_fraction": 0.9}}"#).unwrap();
        assert!((config.task.return_fraction - 0.9).abs() < 1e-12);
        assert_eq!(config.task.stall_turns, 10);
        assert_eq!(config.economy, EconomyConfig::default());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = StrategyConfig::from_json_str(r#"{"economy": {"smoothing": 0.0}}"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
        let err = StrategyConfig::from_json_str(r#"{"task": {"hold_quantile": 1.5}}"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"rollout": {{"samples_per_move": 4}}}}"#).unwrap();
        let config = StrategyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.rollout.samples_per_move, 4);

        let missing = StrategyConfig::from_file(Path::new("/nonexistent/haul.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_json_round_trip() {
        let config = StrategyConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(StrategyConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_spawn_factor_lookup() {
        let economy = EconomyConfig::default();
        assert!((economy.spawn_factor(64, 2) - 0.625).abs() < 1e-12);
        assert!((economy.spawn_factor(33, 4) - 0.35).abs() < 1e-12);
    }
}
