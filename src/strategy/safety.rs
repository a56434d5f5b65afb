//! Three-way safety classification of a cell for one of our ships.

use crate::config::SafetyConfig;
use crate::game::{GameMap, GameState, Position, Ship};
use crate::strategy::context::TurnContext;

/// How risky it is for a ship to end the turn on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Safety {
    /// No opposing ship can contest the cell.
    Safe,
    /// A collision may happen, but it favours us.
    Acceptable,
    /// Entering is forbidden.
    Unsafe,
}

/// Classify `cell` for `ship`.
///
/// With `check_reserved`, cells already committed by our own fleet are
/// unsafe; target scoring leaves it off since those commitments only bind
/// for the next turn.
#[must_use]
pub fn classify(
    map: &GameMap,
    ctx: &TurnContext,
    config: &SafetyConfig,
    ship: &Ship,
    cell: Position,
    check_reserved: bool,
) -> Safety {
    let idx = map.index(cell);
    if check_reserved && ctx.reserved[idx] {
        return Safety::Unsafe;
    }
    if ctx.hostile_base_zone[idx] {
        return Safety::Unsafe;
    }
    match ctx.contest[idx] {
        Some(contest) if contest.enemy_on_cell || ctx.guard_enemy_reach => {
            if contest.favoured
                && capture_gain(contest.weakest_cargo, ship.halite, config.min_capture_gain)
            {
                Safety::Acceptable
            } else {
                Safety::Unsafe
            }
        }
        _ => Safety::Safe,
    }
}

/// Whether a collision transfers enough cargo our way to be worth it.
#[must_use]
pub fn capture_gain(enemy_cargo: u32, own_cargo: u32, min_gain: i64) -> bool {
    i64::from(enemy_cargo) - i64::from(own_cargo) > min_gain
}

/// Inverse-distance vote of nearby ships around `pos`.
///
/// Each ship within `radius` contributes `1 / (1 + d)` to its side. Returns
/// whether our side wins; `strict` decides ties against us.
#[must_use]
pub fn closer_fleet_vote(state: &GameState, pos: Position, radius: u32, strict: bool) -> bool {
    let mut friendly = 0.0;
    let mut enemy = 0.0;
    for ship in state.ships.values() {
        let d = state.map.distance(pos, ship.position);
        if d > radius {
            continue;
        }
        let weight = 1.0 / (1.0 + f64::from(d));
        if ship.owner == state.my_id {
            friendly += weight;
        } else {
            enemy += weight;
        }
    }
    if strict {
        friendly > enemy
    } else {
        friendly >= enemy
    }
}
