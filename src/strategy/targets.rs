//! Harvest target assignment for exploring units.
//!
//! Every explorer scores every harvestable cell, keeps its best `top_k`, and
//! the matrix is solved over the union of those columns only. Without this
//! compression the matrix would span every cell of the map.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::StrategyConfig;
use crate::game::{GameState, Position, ShipId};
use crate::strategy::context::TurnContext;
use crate::strategy::estimate::{score_target, table_for};
use crate::strategy::hungarian::{self, CostMatrix};

/// Outcome of target assignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetAssignment {
    /// Destination of each explorer that keeps exploring.
    pub targets: BTreeMap<ShipId, Position>,
    /// Explorers switched to returning: nothing profitable, or left unmatched.
    pub returning: Vec<ShipId>,
}

/// Full score row of one explorer: `(cell index, score)` for every positive target.
fn score_row(
    state: &GameState,
    ctx: &TurnContext,
    config: &StrategyConfig,
    ship: ShipId,
) -> Vec<(usize, f64)> {
    let Some(ship) = state.ship(ship) else {
        return Vec::new();
    };
    let map = &state.map;
    let table = table_for(state, config, ship);
    (0..map.len())
        .filter_map(|idx| {
            let score = score_target(state, ctx, config, &table, ship, map.position(idx));
            (score > 0.0).then_some((idx, score))
        })
        .collect()
}

/// Assign each explorer a distinct harvest target.
#[must_use]
pub fn assign_targets(
    state: &GameState,
    ctx: &TurnContext,
    config: &StrategyConfig,
    explorers: &[ShipId],
) -> TargetAssignment {
    let mut result = TargetAssignment::default();
    let mut rows: Vec<(ShipId, Vec<(usize, f64)>)> = Vec::with_capacity(explorers.len());
    for &id in explorers {
        let scores = score_row(state, ctx, config, id);
        if scores.is_empty() {
            result.returning.push(id);
        } else {
            rows.push((id, scores));
        }
    }
    if rows.is_empty() {
        return result;
    }

    let top_k = config.assignment.top_k;
    let mut columns = BTreeSet::new();
    for (_, scores) in &mut rows {
        scores.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        columns.extend(scores.iter().take(top_k).map(|&(idx, _)| idx));
    }
    let columns: Vec<usize> = columns.into_iter().collect();
    let max_score = rows
        .iter()
        .filter_map(|(_, scores)| scores.first().map(|&(_, s)| s))
        .fold(0.0, f64::max);

    let sentinel = config.assignment.sentinel_cost;
    let width = columns.len().max(rows.len());
    let mut matrix = CostMatrix::new(rows.len(), width, sentinel);
    for (r, (_, scores)) in rows.iter().enumerate() {
        for &(idx, score) in scores {
            if let Ok(c) = columns.binary_search(&idx) {
                matrix.set(r, c, max_score - score);
            }
        }
    }

    let assignment = hungarian::solve(&matrix);
    for (r, col) in assignment.into_iter().enumerate() {
        let id = rows[r].0;
        match col {
            Some(c) if c < columns.len() && matrix.get(r, c) < sentinel => {
                result.targets.insert(id, state.map.position(columns[c]));
            }
            _ => result.returning.push(id),
        }
    }
    tracing::debug!(
        rows = matrix.rows(),
        columns = columns.len(),
        matched = result.targets.len(),
        "target assignment"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Constants, GameMap, Player, Ship};

    fn solo(halite: &[(u16, u16, u32)]) -> GameState {
        let mut map = GameMap::new(8, 8).unwrap();
        for &(x, y, h) in halite {
            map.at_mut(Position::new(x, y)).halite = h;
        }
        let players = vec![Player::new(0, Position::new(0, 0), 0)];
        GameState::new(map, players, Constants::default(), 0)
    }

    #[test]
    fn test_single_rich_cell_selected() {
        let mut game = solo(&[(4, 4, 1000)]);
        game.add_ship(Ship::new(1, 0, Position::new(0, 0), 0));
        let config = StrategyConfig::default();
        let ctx = TurnContext::build(&game, &config);
        let result = assign_targets(&game, &ctx, &config, &[1]);
        assert_eq!(result.targets.get(&1), Some(&Position::new(4, 4)));
        assert!(result.returning.is_empty());
    }

    #[test]
    fn test_targets_are_distinct() {
        let mut game = solo(&[(2, 3, 900), (5, 5, 300), (6, 1, 200)]);
        game.add_ship(Ship::new(1, 0, Position::new(2, 2), 0));
        game.add_ship(Ship::new(2, 0, Position::new(3, 3), 0));
        game.add_ship(Ship::new(3, 0, Position::new(1, 3), 0));
        let config = StrategyConfig::default();
        let ctx = TurnContext::build(&game, &config);
        let result = assign_targets(&game, &ctx, &config, &[1, 2, 3]);
        assert_eq!(result.targets.len(), 3);
        let unique: BTreeSet<_> = result.targets.values().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_more_explorers_than_targets() {
        let mut game = solo(&[(3, 3, 500)]);
        game.add_ship(Ship::new(1, 0, Position::new(3, 2), 0));
        game.add_ship(Ship::new(2, 0, Position::new(6, 6), 0));
        let config = StrategyConfig::default();
        let ctx = TurnContext::build(&game, &config);
        let result = assign_targets(&game, &ctx, &config, &[1, 2]);
        assert_eq!(result.targets.get(&1), Some(&Position::new(3, 3)));
        assert_eq!(result.returning, vec![2]);
    }

    #[test]
    fn test_barren_field_sends_everyone_home() {
        let mut game = solo(&[]);
        game.add_ship(Ship::new(1, 0, Position::new(3, 2), 0));
        let config = StrategyConfig::default();
        let ctx = TurnContext::build(&game, &config);
        let result = assign_targets(&game, &ctx, &config, &[1]);
        assert!(result.targets.is_empty());
        assert_eq!(result.returning, vec![1]);
    }
}
