//! Income tracking and the production gate.

use crate::config::{EconomyConfig, StrategyConfig};
use crate::game::GameState;
use crate::strategy::context::TurnContext;

/// Exponential moving average of income per ship per turn.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Economy {
    ewma: Option<f64>,
    last_sample: Option<(u32, u32)>,
    spent: u64,
}

impl Economy {
    /// Smoothed income per ship per turn, once at least one sample exists.
    #[must_use]
    pub const fn income_rate(&self) -> Option<f64> {
        self.ewma
    }

    /// Note halite spent on ships or bases since the last sample.
    pub fn record_spend(&mut self, amount: u32) {
        self.spent += u64::from(amount);
    }

    /// Take an income sample if the interval has elapsed.
    ///
    /// Income over the interval is the change in stored halite plus whatever
    /// was spent, spread over the fleet.
    pub fn observe(&mut self, turn: u32, stored: u32, fleet: usize, config: &EconomyConfig) {
        let Some((since, before)) = self.last_sample else {
            self.last_sample = Some((turn, stored));
            self.spent = 0;
            return;
        };
        let elapsed = turn.saturating_sub(since);
        if elapsed < config.sample_interval {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let earned = (i64::from(stored) - i64::from(before) + self.spent as i64).max(0) as f64;
        #[allow(clippy::cast_precision_loss)]
        let sample = earned / (fleet.max(1) as f64 * f64::from(elapsed));
        self.ewma = Some(match self.ewma {
            Some(prev) => config.smoothing * sample + (1.0 - config.smoothing) * prev,
            None => sample,
        });
        self.last_sample = Some((turn, stored));
        self.spent = 0;
    }

    /// Whether a ship built now would still pay for itself.
    #[must_use]
    pub fn continue_producing(
        &self,
        state: &GameState,
        field_fraction: f64,
        config: &EconomyConfig,
    ) -> bool {
        if field_fraction < config.min_field_fraction {
            return false;
        }
        let constants = &state.constants;
        match self.ewma {
            Some(rate) => {
                let horizon = f64::from(state.turns_remaining()) - f64::from(config.cutoff_turns);
                rate * horizon >= f64::from(constants.ship_cost) * config.amortize_factor
            }
            None => {
                let factor = config.spawn_factor(state.map.width(), state.player_count());
                f64::from(state.turn) <= f64::from(constants.max_turns) * factor
            }
        }
    }
}

/// Inputs to the production gate that the pipeline computes during the turn.
#[derive(Debug, Clone, Copy)]
pub struct ProductionInputs {
    /// Halite set aside for a pending base conversion.
    pub reserved: u32,
    /// Halite already committed this turn to a conversion.
    pub committed: u32,
    /// The sticky endgame flag.
    pub endgame: bool,
    /// Field halite left relative to the start of the game.
    pub field_fraction: f64,
}

/// Whether to build a ship this turn.
#[must_use]
pub fn should_spawn(
    state: &GameState,
    ctx: &TurnContext,
    economy: &Economy,
    config: &StrategyConfig,
    inputs: &ProductionInputs,
) -> bool {
    let me = state.me();
    let constants = &state.constants;
    let needed = u64::from(constants.ship_cost) + u64::from(inputs.reserved) + u64::from(inputs.committed);
    if inputs.endgame || u64::from(me.halite) < needed || ctx.is_reserved(&state.map, me.shipyard) {
        return false;
    }

    let fleet = me.fleet_size();
    let opponents: Vec<usize> = state.opponents().map(|p| p.fleet_size()).collect();
    let eco = &config.economy;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let ceiling = (opponents.iter().copied().max().unwrap_or(0) as f64 * eco.ceiling_ratio) as usize
        + eco.ceiling_slack;
    if fleet >= ceiling {
        return false;
    }
    let keep_pace = f64::from(state.turn) <= f64::from(constants.max_turns) * eco.floor_turn_fraction
        && opponents.iter().copied().min().is_some_and(|floor| fleet < floor);
    keep_pace || economy.continue_producing(state, inputs.field_fraction, eco)
}
