//! Engine-provided game constants.
//!
//! The engine sends these as a single JSON object on the first line of the
//! init handshake. Unknown keys are ignored and missing keys take the
//! standard ruleset values.

use serde::{Deserialize, Serialize};

/// Rule constants for one game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constants {
    /// Cost of producing a new ship.
    #[serde(rename = "NEW_ENTITY_ENERGY_COST")]
    pub ship_cost: u32,
    /// Cost of converting a ship into a dropoff.
    #[serde(rename = "DROPOFF_COST")]
    pub dropoff_cost: u32,
    /// Maximum halite a ship can carry.
    #[serde(rename = "MAX_ENERGY")]
    pub max_halite: u32,
    /// Turn limit.
    #[serde(rename = "MAX_TURNS")]
    pub max_turns: u32,
    /// A ship extracts `ceil(halite / extract_ratio)` per turn spent still.
    #[serde(rename = "EXTRACT_RATIO")]
    pub extract_ratio: u32,
    /// Moving costs `halite / move_cost_ratio` of the cell being left.
    #[serde(rename = "MOVE_COST_RATIO")]
    pub move_cost_ratio: u32,
    /// Whether inspiration is active.
    #[serde(rename = "INSPIRATION_ENABLED")]
    pub inspiration_enabled: bool,
    /// Radius within which opposing ships inspire a cell.
    #[serde(rename = "INSPIRATION_RADIUS")]
    pub inspiration_radius: u32,
    /// Opposing ships needed within the radius for inspiration.
    #[serde(rename = "INSPIRATION_SHIP_COUNT")]
    pub inspiration_ship_count: u32,
    /// Extra fraction of the extracted amount granted when inspired.
    #[serde(rename = "INSPIRED_BONUS_MULTIPLIER")]
    pub inspired_bonus_multiplier: f64,
    /// Halite each player starts with.
    #[serde(rename = "INITIAL_ENERGY")]
    pub initial_halite: u32,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            ship_cost: 1000,
            dropoff_cost: 4000,
            max_halite: 1000,
            max_turns: 400,
            extract_ratio: 4,
            move_cost_ratio: 10,
            inspiration_enabled: true,
            inspiration_radius: 4,
            inspiration_ship_count: 2,
            inspired_bonus_multiplier: 2.0,
            initial_halite: 5000,
        }
    }
}

impl Constants {
    /// Parse the engine's constants line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a JSON object.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Halite burned when leaving a cell holding `cell_halite`.
    #[must_use]
    pub const fn move_cost(&self, cell_halite: u32) -> u32 {
        if self.move_cost_ratio == 0 {
            return 0;
        }
        cell_halite / self.move_cost_ratio
    }

    /// Halite removed from a cell holding `cell_halite` when a ship mines it.
    #[must_use]
    pub const fn extract_amount(&self, cell_halite: u32) -> u32 {
        if self.extract_ratio == 0 {
            return cell_halite;
        }
        cell_halite.div_ceil(self.extract_ratio)
    }

    /// Halite gained by a ship carrying `ship_halite` that mines a cell for one turn.
    ///
    /// Returns `(removed_from_cell, gained_by_ship)`; the inspiration bonus is
    /// credited to the ship without depleting the cell.
    #[must_use]
    pub fn mine(&self, cell_halite: u32, ship_halite: u32, inspired: bool) -> (u32, u32) {
        let room = self.max_halite.saturating_sub(ship_halite);
        let removed = self.extract_amount(cell_halite).min(room);
        let bonus = if inspired && self.inspiration_enabled {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let bonus = (f64::from(removed) * self.inspired_bonus_multiplier) as u32;
            bonus
        } else {
            0
        };
        (removed, (removed + bonus).min(room))
    }
}
