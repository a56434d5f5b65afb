//! Collision-free move assignment.
//!
//! Rows are moving units, columns are the cells they could end the turn on.
//! Each unit's own cell stays admissible no matter how dangerous, so a
//! perfect matching always exists and no two of our units share a cell.

use std::collections::BTreeMap;

use crate::config::StrategyConfig;
use crate::game::{Direction, GameState, Position, ShipId};
use crate::strategy::context::TurnContext;
use crate::strategy::hungarian::{self, CostMatrix};
use crate::strategy::rollout::Preferences;
use crate::strategy::safety::{self, Safety};

/// A unit that still needs a concrete move.
#[derive(Debug, Clone, Copy)]
pub struct MoveRequest {
    /// The unit.
    pub ship: ShipId,
    /// Ranked immediate actions.
    pub preferences: Preferences,
}

/// Cost of ending on the cell reached by `dir`, or `None` if inadmissible.
fn move_cost(
    state: &GameState,
    ctx: &TurnContext,
    config: &StrategyConfig,
    request: &MoveRequest,
    dir: Direction,
) -> Option<f64> {
    let ship = state.ship(request.ship)?;
    let assignment = &config.assignment;
    let normalized = request.preferences.normalized(dir)?;
    let base = assignment.move_cost_base.powf(1.0 - normalized);
    let cell = state.map.offset(ship.position, dir);
    match safety::classify(&state.map, ctx, &config.safety, ship, cell, true) {
        Safety::Safe => Some(base),
        Safety::Acceptable => Some(base * assignment.acceptable_penalty),
        Safety::Unsafe if dir == Direction::Still => Some(assignment.unsafe_stay_cost),
        Safety::Unsafe => None,
    }
}

/// Solve moves for all requests and reserve the chosen cells in `ctx`.
///
/// Returns one direction per request, in request order.
pub fn assign_moves(
    state: &GameState,
    ctx: &mut TurnContext,
    config: &StrategyConfig,
    requests: &[MoveRequest],
) -> Vec<(ShipId, Direction)> {
    let map = &state.map;
    let mut columns: BTreeMap<usize, usize> = BTreeMap::new();
    let mut starts = Vec::with_capacity(requests.len());
    for request in requests {
        let start = state
            .ship(request.ship)
            .map_or(Position::new(0, 0), |s| s.position);
        starts.push(start);
        for dir in Direction::ALL {
            let next = columns.len();
            columns.entry(map.index(map.offset(start, dir))).or_insert(next);
        }
    }

    let sentinel = config.assignment.sentinel_cost;
    let mut matrix = CostMatrix::new(requests.len(), columns.len(), sentinel);
    for (row, request) in requests.iter().enumerate() {
        for dir in Direction::ALL {
            if let Some(cost) = move_cost(state, ctx, config, request, dir) {
                let cell = map.index(map.offset(starts[row], dir));
                if let Some(&col) = columns.get(&cell) {
                    matrix.set(row, col, cost);
                }
            }
        }
    }

    let by_column: BTreeMap<usize, usize> = columns.iter().map(|(&cell, &col)| (col, cell)).collect();
    let assignment = hungarian::solve(&matrix);
    let mut chosen: Vec<Direction> = assignment
        .iter()
        .enumerate()
        .map(|(row, col)| {
            col.filter(|&c| matrix.get(row, c) < sentinel)
                .and_then(|c| by_column.get(&c))
                .and_then(|&cell| map.direction_to_neighbour(starts[row], map.position(cell)))
                .unwrap_or(Direction::Still)
        })
        .collect();

    // A unit forced to stay blocks its own cell; anyone routed onto it stays too.
    loop {
        let mut stays = vec![false; map.len()];
        for (row, dir) in chosen.iter().enumerate() {
            if *dir == Direction::Still {
                stays[map.index(starts[row])] = true;
            }
        }
        let mut changed = false;
        for (row, dir) in chosen.iter_mut().enumerate() {
            if *dir != Direction::Still && stays[map.index(map.offset(starts[row], *dir))] {
                *dir = Direction::Still;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    for (row, dir) in chosen.iter().enumerate() {
        ctx.reserve(map, map.offset(starts[row], *dir));
    }
    tracing::debug!(rows = requests.len(), columns = columns.len(), "move assignment");
    requests
        .iter()
        .zip(chosen)
        .map(|(r, d)| (r.ship, d))
        .collect()
}
