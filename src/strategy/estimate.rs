//! Travel-cost tables and target scoring.
//!
//! One Dijkstra per exploring unit over the torus. The edge weight between
//! neighbours `u` and `v` is `ε + (mc(u) + mc(v)) / 2`, where `mc` is the
//! halite burned leaving a cell. The averaged form keeps the table a metric:
//! the cost from A to B equals the cost from B to A.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::config::StrategyConfig;
use crate::game::{Constants, GameMap, GameState, Position, Ship};
use crate::strategy::context::TurnContext;
use crate::strategy::safety::{self, Safety};

/// Fixed per-step cost, so equal-burn paths prefer fewer hops.
pub const STEP_EPSILON: f64 = 1.0e-3;

/// Single-source travel costs and hop counts.
#[derive(Debug, Clone)]
pub struct DistanceTable {
    source: Position,
    cost: Vec<f64>,
    hops: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    cost: f64,
    index: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl DistanceTable {
    /// Run Dijkstra from `source`.
    ///
    /// Cells for which `blocked` returns true are reachable as endpoints but
    /// never expanded through. The source is always expanded.
    #[must_use]
    pub fn compute(
        map: &GameMap,
        constants: &Constants,
        source: Position,
        blocked: impl Fn(usize) -> bool,
    ) -> Self {
        let cells = map.len();
        let mut cost = vec![f64::INFINITY; cells];
        let mut hops = vec![u32::MAX; cells];
        let burn: Vec<f64> = map
            .cells()
            .iter()
            .map(|c| f64::from(constants.move_cost(c.halite)))
            .collect();

        let start = map.index(source);
        cost[start] = 0.0;
        hops[start] = 0;
        let mut heap = BinaryHeap::new();
        heap.push(Frontier {
            cost: 0.0,
            index: start,
        });

        while let Some(Frontier { cost: c, index }) = heap.pop() {
            if c > cost[index] {
                continue;
            }
            if index != start && blocked(index) {
                continue;
            }
            let pos = map.position(index);
            for next in map.neighbours(pos) {
                let n = map.index(next);
                let candidate = c + STEP_EPSILON + (burn[index] + burn[n]) / 2.0;
                if candidate < cost[n] {
                    cost[n] = candidate;
                    hops[n] = hops[index] + 1;
                    heap.push(Frontier {
                        cost: candidate,
                        index: n,
                    });
                }
            }
        }

        Self { source, cost, hops }
    }

    /// The source position.
    #[must_use]
    pub const fn source(&self) -> Position {
        self.source
    }

    /// Travel cost to a cell, or `None` if unreachable.
    #[must_use]
    pub fn cost(&self, map: &GameMap, pos: Position) -> Option<f64> {
        let c = self.cost[map.index(pos)];
        c.is_finite().then_some(c)
    }

    /// Steps along the cheapest path, or `None` if unreachable.
    #[must_use]
    pub fn hops(&self, map: &GameMap, pos: Position) -> Option<u32> {
        let h = self.hops[map.index(pos)];
        (h != u32::MAX).then_some(h)
    }
}

/// Distance table for one of our ships, routing around opposing ships when configured.
#[must_use]
pub fn table_for(state: &GameState, config: &StrategyConfig, ship: &Ship) -> DistanceTable {
    let map = &state.map;
    let avoid = config.estimator.avoid_enemy_cells;
    DistanceTable::compute(map, &state.constants, ship.position, |idx| {
        avoid
            && map.cells()[idx]
                .occupant
                .and_then(|id| state.ship(id))
                .is_some_and(|s| s.owner != state.my_id)
    })
}

/// Profit-per-turn score of sending `ship` to `target`.
///
/// Returns the configured sentinel for bases, empty cells, unreachable cells,
/// and targets without positive profit.
#[must_use]
pub fn score_target(
    state: &GameState,
    ctx: &TurnContext,
    config: &StrategyConfig,
    table: &DistanceTable,
    ship: &Ship,
    target: Position,
) -> f64 {
    let map = &state.map;
    let sentinel = config.estimator.sentinel_score;
    let cell = map.at(target);
    if cell.structure.is_some() || cell.halite == 0 {
        return sentinel;
    }
    let (Some(cost), Some(hops)) = (table.cost(map, target), table.hops(map, target)) else {
        return sentinel;
    };

    let halite = f64::from(cell.halite);
    let constants = &state.constants;
    let mut profit = halite - cost;
    if ctx.is_inspired(map, target) && hops <= constants.inspiration_radius {
        profit += constants.inspired_bonus_multiplier * halite;
    }
    let capturable = ctx
        .immobile_enemies
        .iter()
        .filter(|&&(pos, _)| map.distance(pos, target) <= 1)
        .map(|&(_, cargo)| f64::from(cargo))
        .fold(0.0, f64::max);
    profit += config.estimator.capture_share * capturable;

    if safety::classify(map, ctx, &config.safety, ship, target, false) == Safety::Unsafe {
        profit = 0.0;
    }

    let home = f64::from(ctx.base_distance(map, target));
    let score = profit / (1.0 + f64::from(hops) + home.sqrt());
    if score > 0.0 { score } else { sentinel }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Player, Ship};

    fn solo(width: u16, halite: &[(u16, u16, u32)]) -> GameState {
        let mut map = GameMap::new(width, width).unwrap();
        for &(x, y, h) in halite {
            map.at_mut(Position::new(x, y)).halite = h;
        }
        let players = vec![Player::new(0, Position::new(0, 0), 0)];
        GameState::new(map, players, Constants::default(), 0)
    }

    #[test]
    fn test_flat_map_costs_are_hops() {
        let game = solo(8, &[]);
        let table = DistanceTable::compute(&game.map, &game.constants, Position::new(0, 0), |_| false);
        let target = Position::new(4, 4);
        assert_eq!(table.hops(&game.map, target), Some(8));
        let cost = table.cost(&game.map, target).unwrap();
        assert!((cost - 8.0 * STEP_EPSILON).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric() {
        let game = solo(8, &[(1, 0, 300), (2, 3, 90), (5, 5, 700), (7, 2, 40)]);
        let a = Position::new(0, 1);
        let b = Position::new(6, 4);
        let from_a = DistanceTable::compute(&game.map, &game.constants, a, |_| false);
        let from_b = DistanceTable::compute(&game.map, &game.constants, b, |_| false);
        let ab = from_a.cost(&game.map, b).unwrap();
        let ba = from_b.cost(&game.map, a).unwrap();
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_expensive_cells_routed_around() {
        // A wall of rich cells in column 1 except at row 3.
        let wall: Vec<_> = (0..8).filter(|&y| y != 3).map(|y| (1, y, 900)).collect();
        let game = solo(8, &wall);
        let table = DistanceTable::compute(&game.map, &game.constants, Position::new(0, 0), |_| false);
        let cost = table.cost(&game.map, Position::new(2, 0)).unwrap();
        assert!(cost < 1.0);
    }

    #[test]
    fn test_blocked_cells_are_endpoints_only() {
        let game = solo(5, &[]);
        let blocked = game.map.index(Position::new(1, 0));
        let table =
            DistanceTable::compute(&game.map, &game.constants, Position::new(0, 0), |i| i == blocked);
        assert_eq!(table.hops(&game.map, Position::new(1, 0)), Some(1));
        assert_eq!(table.hops(&game.map, Position::new(2, 0)), Some(3));
    }

    #[test]
    fn test_score_prefers_the_only_rich_cell() {
        let mut game = solo(8, &[(4, 4, 1000)]);
        game.add_ship(Ship::new(1, 0, Position::new(0, 0), 0));
        let config = StrategyConfig::default();
        let ctx = TurnContext::build(&game, &config);
        let ship = game.ship(1).copied().unwrap();
        let table = table_for(&game, &config, &ship);

        let rich = score_target(&game, &ctx, &config, &table, &ship, Position::new(4, 4));
        assert!(rich > 0.0);
        let empty = score_target(&game, &ctx, &config, &table, &ship, Position::new(3, 3));
        assert!(empty < 0.0);
        let base = score_target(&game, &ctx, &config, &table, &ship, Position::new(0, 0));
        assert!(base < 0.0);
    }

    #[test]
    fn test_capture_bonus_raises_score() {
        let mut game = solo(16, &[(8, 8, 200), (8, 9, 500)]);
        game.players.push(Player::new(1, Position::new(15, 15), 0));
        game.stamp_structures();
        game.add_ship(Ship::new(1, 0, Position::new(6, 8), 0));
        game.add_ship(Ship::new(2, 0, Position::new(7, 9), 0));
        game.add_ship(Ship::new(3, 0, Position::new(9, 9), 0));
        let config = StrategyConfig::default();
        let ship = game.ship(1).copied().unwrap();
        let target = Position::new(8, 8);

        let ctx = TurnContext::build(&game, &config);
        let table = table_for(&game, &config, &ship);
        let plain = score_target(&game, &ctx, &config, &table, &ship, target);

        game.add_ship(Ship::new(9, 1, Position::new(8, 9), 30));
        let ctx = TurnContext::build(&game, &config);
        let table = table_for(&game, &config, &ship);
        let with_capture = score_target(&game, &ctx, &config, &table, &ship, target);
        assert!(with_capture > plain);
    }
}
