//! Game invariants - sanity checks that detect bugs.
//!
//! The local engine checks these after every turn in debug runs and the
//! integration tests assert that they never fire. They are bug detectors,
//! not gameplay limits.

use std::collections::HashSet;

use crate::game::GameState;

/// Invariant violation error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Invariant violation: {message}")]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let capacity = state.constants.max_halite;

    let mut seen = HashSet::new();
    for ship in state.ships.values() {
        if ship.halite > capacity {
            violations.push(InvariantViolation {
                message: format!(
                    "Ship {} carries {} > capacity {}",
                    ship.id, ship.halite, capacity
                ),
            });
        }
        if !seen.insert(ship.position) {
            violations.push(InvariantViolation {
                message: format!("Two ships share cell {}", ship.position),
            });
        }
        if state.map.at(ship.position).occupant != Some(ship.id) {
            violations.push(InvariantViolation {
                message: format!(
                    "Ship {} at {} is not recorded as the cell occupant",
                    ship.id, ship.position
                ),
            });
        }
        if state.player(ship.owner).is_none() {
            violations.push(InvariantViolation {
                message: format!("Ship {} has unknown owner {}", ship.id, ship.owner),
            });
        }
    }

    for player in &state.players {
        for base in player.bases() {
            if !state.is_base_of(base, player.id) {
                violations.push(InvariantViolation {
                    message: format!("Player {} base at {} missing from map", player.id, base),
                });
            }
        }
        for id in &player.ships {
            if state.ship(*id).is_none_or(|s| s.owner != player.id) {
                violations.push(InvariantViolation {
                    message: format!("Player {} lists ship {} it does not own", player.id, id),
                });
            }
        }
    }

    violations
}
