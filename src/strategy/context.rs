//! Per-turn derived annotations over the grid.
//!
//! Rebuilt from scratch at the start of every turn. Every vector is indexed
//! by cell index.

use crate::config::StrategyConfig;
use crate::game::{GameMap, GameState, Position};
use crate::strategy::safety;

/// Opposing presence on or next to a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contest {
    /// An opposing ship stands on the cell.
    pub enemy_on_cell: bool,
    /// The closer-fleet vote around the cell favours us.
    pub favoured: bool,
    /// Smallest cargo among opposing ships on or next to the cell.
    pub weakest_cargo: u32,
}

/// Turn-local annotations shared by every phase of the pipeline.
#[derive(Debug, Clone)]
pub struct TurnContext {
    /// Own bases, including a base provisionally placed this turn.
    pub bases: Vec<Position>,
    /// Nearest own base of each cell.
    pub closest_base: Vec<Position>,
    /// Distance from each cell to its nearest own base.
    pub base_distance: Vec<u32>,
    /// Cells where our ships would mine with the inspiration bonus.
    pub inspired: Vec<bool>,
    /// Cells with opposing ships on or next to them.
    pub contest: Vec<Option<Contest>>,
    /// Cells holding or adjacent to an opposing base.
    pub hostile_base_zone: Vec<bool>,
    /// Cells committed for next turn by one of our ships.
    pub reserved: Vec<bool>,
    /// Opposing ships that cannot afford to leave their cell, with their cargo.
    pub immobile_enemies: Vec<(Position, u32)>,
    /// Halite left on the field.
    pub field_total: u64,
    /// Halite at the configured quantile of all cells.
    pub halite_cutoff: u32,
    /// Cargo at which an explorer turns for home.
    pub return_threshold: u32,
    /// Whether cells next to opposing ships count as contested.
    pub guard_enemy_reach: bool,
}

impl TurnContext {
    /// Build all annotations for the viewer of `state`.
    #[must_use]
    pub fn build(state: &GameState, config: &StrategyConfig) -> Self {
        let map = &state.map;
        let cells = map.len();
        let mut ctx = Self {
            bases: state.me().bases().collect(),
            closest_base: vec![state.me().shipyard; cells],
            base_distance: vec![0; cells],
            inspired: vec![false; cells],
            contest: vec![None; cells],
            hostile_base_zone: vec![false; cells],
            reserved: vec![false; cells],
            immobile_enemies: Vec::new(),
            field_total: map.total_halite(),
            halite_cutoff: halite_quantile(map, config.task.hold_quantile),
            return_threshold: return_threshold(state, config),
            guard_enemy_reach: state.player_count() >= config.safety.guard_enemy_reach_min_players,
        };
        ctx.refresh_closest_bases(map);
        ctx.mark_inspiration(state);
        ctx.mark_contests(state, config);

        for (pos, cell) in map.iter() {
            if cell.structure.is_some_and(|s| s.owner != state.my_id) {
                ctx.hostile_base_zone[map.index(pos)] = true;
                for n in map.neighbours(pos) {
                    ctx.hostile_base_zone[map.index(n)] = true;
                }
            }
        }
        ctx.immobile_enemies = state
            .enemy_ships()
            .filter(|s| s.halite < state.constants.move_cost(map.halite(s.position)))
            .map(|s| (s.position, s.halite))
            .collect();
        ctx
    }

    /// Add a base placed this turn and recompute nearest-base annotations.
    pub fn add_base(&mut self, map: &GameMap, pos: Position) {
        if !self.bases.contains(&pos) {
            self.bases.push(pos);
            self.refresh_closest_bases(map);
        }
    }

    /// Nearest own base of a position.
    #[must_use]
    pub fn closest_base(&self, map: &GameMap, pos: Position) -> Position {
        self.closest_base[map.index(pos)]
    }

    /// Distance from a position to its nearest own base.
    #[must_use]
    pub fn base_distance(&self, map: &GameMap, pos: Position) -> u32 {
        self.base_distance[map.index(pos)]
    }

    /// Whether one of our ships mining at `pos` would be inspired.
    #[must_use]
    pub fn is_inspired(&self, map: &GameMap, pos: Position) -> bool {
        self.inspired[map.index(pos)]
    }

    /// Commit a cell for next turn.
    pub fn reserve(&mut self, map: &GameMap, pos: Position) {
        self.reserved[map.index(pos)] = true;
    }

    /// Whether a cell is committed for next turn.
    #[must_use]
    pub fn is_reserved(&self, map: &GameMap, pos: Position) -> bool {
        self.reserved[map.index(pos)]
    }

    fn refresh_closest_bases(&mut self, map: &GameMap) {
        for idx in 0..map.len() {
            let pos = map.position(idx);
            if let Some((base, dist)) = self
                .bases
                .iter()
                .map(|&b| (b, map.distance(pos, b)))
                .min_by_key(|&(_, d)| d)
            {
                self.closest_base[idx] = base;
                self.base_distance[idx] = dist;
            }
        }
    }

    fn mark_inspiration(&mut self, state: &GameState) {
        let constants = &state.constants;
        if !constants.inspiration_enabled {
            return;
        }
        let map = &state.map;
        #[allow(clippy::cast_possible_wrap)]
        let radius = constants.inspiration_radius as i32;
        let mut counts = vec![0u32; map.len()];
        let mut stamp = vec![usize::MAX; map.len()];

        for (n, ship) in state.enemy_ships().enumerate() {
            for dx in -radius..=radius {
                let span = radius - dx.abs();
                for dy in -span..=span {
                    let pos = map.normalize(
                        i32::from(ship.position.x) + dx,
                        i32::from(ship.position.y) + dy,
                    );
                    let idx = map.index(pos);
                    // Small maps wrap the diamond onto itself; count each ship once.
                    if stamp[idx] != n {
                        stamp[idx] = n;
                        counts[idx] += 1;
                    }
                }
            }
        }
        for (flag, count) in self.inspired.iter_mut().zip(counts) {
            *flag = count >= constants.inspiration_ship_count;
        }
    }

    fn mark_contests(&mut self, state: &GameState, config: &StrategyConfig) {
        let map = &state.map;
        for ship in state.enemy_ships() {
            let around = std::iter::once(ship.position).chain(map.neighbours(ship.position));
            for pos in around {
                let on_cell = pos == ship.position;
                let entry = self.contest[map.index(pos)].get_or_insert(Contest {
                    enemy_on_cell: false,
                    favoured: false,
                    weakest_cargo: u32::MAX,
                });
                entry.enemy_on_cell |= on_cell;
                entry.weakest_cargo = entry.weakest_cargo.min(ship.halite);
            }
        }
        for idx in 0..map.len() {
            if let Some(contest) = self.contest[idx].as_mut() {
                contest.favoured = safety::closer_fleet_vote(
                    state,
                    map.position(idx),
                    config.safety.vote_radius,
                    config.safety.strict_majority,
                );
            }
        }
    }
}

/// Cargo at which an exploring unit heads home.
///
/// Small games relax the threshold during the first part of the game.
#[must_use]
pub fn return_threshold(state: &GameState, config: &StrategyConfig) -> u32 {
    let task = &config.task;
    let early = state.player_count() <= task.early_return_max_players
        && f64::from(state.turn) <= f64::from(state.constants.max_turns) * task.early_return_turn_fraction;
    let fraction = if early {
        task.early_return_fraction
    } else {
        task.return_fraction
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let threshold = (f64::from(state.constants.max_halite) * fraction) as u32;
    threshold
}

/// Halite value at quantile `q` over all cells.
#[must_use]
pub fn halite_quantile(map: &GameMap, q: f64) -> u32 {
    let mut values: Vec<u32> = map.cells().iter().map(|c| c.halite).collect();
    if values.is_empty() {
        return 0;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let k = ((values.len() - 1) as f64 * q.clamp(0.0, 1.0)).floor() as usize;
    *values.select_nth_unstable(k).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Constants, Player, Ship};

    fn state(players: usize) -> GameState {
        let map = GameMap::new(16, 16).unwrap();
        let mut list = vec![
            Player::new(0, Position::new(2, 2), 0),
            Player::new(1, Position::new(12, 12), 0),
        ];
        if players == 4 {
            list.push(Player::new(2, Position::new(2, 12), 0));
            list.push(Player::new(3, Position::new(12, 2), 0));
        }
        GameState::new(map, list, Constants::default(), 0)
    }

    #[test]
    fn test_closest_base_and_provisional() {
        let game = state(2);
        let mut ctx = TurnContext::build(&game, &StrategyConfig::default());
        let far = Position::new(10, 2);
        assert_eq!(ctx.closest_base(&game.map, far), Position::new(2, 2));
        assert_eq!(ctx.base_distance(&game.map, far), 8);

        ctx.add_base(&game.map, Position::new(9, 2));
        assert_eq!(ctx.closest_base(&game.map, far), Position::new(9, 2));
        assert_eq!(ctx.base_distance(&game.map, far), 1);
    }

    #[test]
    fn test_inspiration_needs_two_enemies() {
        let mut game = state(2);
        game.add_ship(Ship::new(1, 1, Position::new(8, 8), 0));
        let ctx = TurnContext::build(&game, &StrategyConfig::default());
        assert!(!ctx.is_inspired(&game.map, Position::new(8, 9)));

        game.add_ship(Ship::new(2, 1, Position::new(8, 10), 0));
        let ctx = TurnContext::build(&game, &StrategyConfig::default());
        assert!(ctx.is_inspired(&game.map, Position::new(8, 9)));
        assert!(!ctx.is_inspired(&game.map, Position::new(0, 0)));
    }

    #[test]
    fn test_hostile_base_zone() {
        let game = state(2);
        let ctx = TurnContext::build(&game, &StrategyConfig::default());
        let idx = |x, y| game.map.index(Position::new(x, y));
        assert!(ctx.hostile_base_zone[idx(12, 12)]);
        assert!(ctx.hostile_base_zone[idx(12, 11)]);
        assert!(!ctx.hostile_base_zone[idx(12, 10)]);
        assert!(!ctx.hostile_base_zone[idx(2, 2)]);
    }

    #[test]
    fn test_return_threshold_relaxed_early_in_duels() {
        let config = StrategyConfig::default();
        let mut duel = state(2);
        duel.turn = 10;
        assert_eq!(return_threshold(&duel, &config), 750);
        duel.turn = 350;
        assert_eq!(return_threshold(&duel, &config), 950);

        let mut ffa = state(4);
        ffa.turn = 10;
        assert_eq!(return_threshold(&ffa, &config), 950);
        assert!(TurnContext::build(&ffa, &config).guard_enemy_reach);
    }

    #[test]
    fn test_halite_quantile() {
        let halite: Vec<u32> = (0..16).collect();
        let map = GameMap::from_halite(4, 4, &halite).unwrap();
        assert_eq!(halite_quantile(&map, 0.5), 7);
        assert_eq!(halite_quantile(&map, 1.0), 15);
        assert_eq!(halite_quantile(&map, 0.0), 0);
    }

    #[test]
    fn test_immobile_enemies() {
        let mut game = state(2);
        game.map.at_mut(Position::new(5, 5)).halite = 500;
        game.add_ship(Ship::new(1, 1, Position::new(5, 5), 20));
        game.add_ship(Ship::new(2, 1, Position::new(6, 6), 20));
        let ctx = TurnContext::build(&game, &StrategyConfig::default());
        assert_eq!(ctx.immobile_enemies, vec![(Position::new(5, 5), 20)]);
    }
}
