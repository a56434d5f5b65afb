//! Base placement.
//!
//! A new base pays for itself through shorter round trips: every full load
//! harvested near it saves twice the distance to the old nearest base, and
//! every saved turn is worth the current income rate.

use crate::config::StrategyConfig;
use crate::game::{GameMap, GameState, Position, ShipId};
use crate::strategy::context::TurnContext;
use crate::strategy::fleet::{FleetState, Task};
use crate::strategy::task;

/// The chosen conversion site for this turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasePlan {
    /// Ship standing on the site.
    pub ship: ShipId,
    /// The site.
    pub position: Position,
    /// Estimated net benefit.
    pub score: f64,
    /// Whether the conversion can be paid for now.
    pub affordable: bool,
    /// Halite the player must contribute on top of the ship's cargo and the cell.
    pub cost: u32,
}

/// Halite within Chebyshev `radius` of `center`.
#[must_use]
pub fn local_halite(map: &GameMap, center: Position, radius: u16) -> u64 {
    let r = i32::from(radius);
    let w = i32::from(map.width());
    let h = i32::from(map.height());
    // Clamp the window so wrapped edges are not counted twice.
    let (rx, ry) = (r.min((w - 1) / 2), r.min((h - 1) / 2));
    let mut total = 0;
    for dy in -ry..=ry {
        for dx in -rx..=rx {
            let pos = map.normalize(i32::from(center.x) + dx, i32::from(center.y) + dy);
            total += u64::from(map.halite(pos));
        }
    }
    total
}

/// Minimum spacing between bases for this player count.
#[must_use]
pub fn min_spacing(state: &GameState, config: &StrategyConfig) -> u32 {
    let divisor = if state.player_count() <= 2 {
        config.bases.spacing_divisor_duel
    } else {
        config.bases.spacing_divisor_ffa
    };
    u32::from(state.map.width() / divisor.max(1))
}

/// Pick the best site among cells under our exploring ships.
#[must_use]
pub fn plan_base(
    state: &GameState,
    ctx: &TurnContext,
    fleet: &FleetState,
    config: &StrategyConfig,
) -> Option<BasePlan> {
    let bases = &config.bases;
    let constants = &state.constants;
    if !bases.enabled
        || fleet.endgame
        || state.me().fleet_size() < bases.min_fleet
        || f64::from(state.turn) > f64::from(constants.max_turns) * bases.max_turn_fraction
    {
        return None;
    }

    let map = &state.map;
    let radius = map.width() / bases.radius_divisor.max(1);
    let spacing = min_spacing(state, config);
    let min_local = u64::from(constants.max_halite) * u64::from(map.width())
        / u64::from(bases.density_divisor);
    let income = fleet.economy.income_rate().unwrap_or(bases.income_prior);
    let structures: Vec<Position> = map
        .iter()
        .filter_map(|(pos, cell)| cell.structure.map(|_| pos))
        .collect();

    let mut best: Option<BasePlan> = None;
    for ship in state.my_ships() {
        if fleet.task(ship.id) != Some(Task::Explore)
            || map.at(ship.position).structure.is_some()
            || task::is_hard_stuck(state, ship)
        {
            continue;
        }
        if structures
            .iter()
            .any(|&s| map.distance(s, ship.position) < spacing)
        {
            continue;
        }
        let density = local_halite(map, ship.position, radius);
        if density < min_local {
            continue;
        }
        let reduction = f64::from(ctx.base_distance(map, ship.position));
        #[allow(clippy::cast_precision_loss)]
        let trips = density as f64 * bases.harvest_fraction / f64::from(constants.max_halite);
        let score = trips * 2.0 * reduction * income - f64::from(constants.dropoff_cost);
        if score <= 0.0 || best.is_some_and(|b| b.score >= score) {
            continue;
        }
        let cost = constants
            .dropoff_cost
            .saturating_sub(ship.halite + map.halite(ship.position));
        best = Some(BasePlan {
            ship: ship.id,
            position: ship.position,
            score,
            affordable: state.me().halite >= cost,
            cost,
        });
    }
    if let Some(plan) = best {
        tracing::debug!(
            ship = plan.ship,
            at = %plan.position,
            score = plan.score,
            affordable = plan.affordable,
            "base candidate"
        );
    }
    best
}
