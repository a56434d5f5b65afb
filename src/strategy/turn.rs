//! The per-turn decision pipeline.

use std::collections::BTreeMap;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::StrategyConfig;
use crate::game::{Command, Direction, GameState, ShipId};
use crate::strategy::bases;
use crate::strategy::context::TurnContext;
use crate::strategy::deadline::Deadline;
use crate::strategy::economy::{self, ProductionInputs};
use crate::strategy::fleet::{FleetState, Task};
use crate::strategy::moves::{self, MoveRequest};
use crate::strategy::rollout::{self, RolloutInput};
use crate::strategy::targets;
use crate::strategy::task;

/// Everything decided for one turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnPlan {
    /// Commands to commit, one per owned ship plus an optional spawn.
    pub commands: Vec<Command>,
    /// Whether a ship is produced.
    pub spawn: bool,
    /// Ship converted into a base, if any.
    pub conversion: Option<ShipId>,
    /// Whether the endgame flag is set.
    pub endgame: bool,
}

impl TurnPlan {
    /// Direction given to a ship, if it received a move command.
    #[must_use]
    pub fn direction_of(&self, ship: ShipId) -> Option<Direction> {
        self.commands.iter().find_map(|c| match *c {
            Command::Move { ship: s, direction } if s == ship => Some(direction),
            _ => None,
        })
    }
}

/// Decision engine for one player, holding its memory across turns.
#[derive(Debug, Clone)]
pub struct Strategy {
    config: StrategyConfig,
    fleet: FleetState,
    rng: SmallRng,
}

impl Strategy {
    /// Create a strategy with a seeded generator for rollouts.
    #[must_use]
    pub fn new(config: StrategyConfig, seed: u64) -> Self {
        Self {
            config,
            fleet: FleetState::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Per-unit records and economy state.
    #[must_use]
    pub const fn fleet(&self) -> &FleetState {
        &self.fleet
    }

    /// Mutable access to the per-unit records.
    pub fn fleet_mut(&mut self) -> &mut FleetState {
        &mut self.fleet
    }

    /// Decide every action for the viewer of `state`.
    #[allow(clippy::too_many_lines)]
    pub fn decide(&mut self, state: &GameState, deadline: &Deadline) -> TurnPlan {
        let started = Instant::now();
        let Self { config, fleet, rng } = self;
        let map = &state.map;
        let me = state.me();

        fleet.sync(state);
        fleet
            .economy
            .observe(state.turn, me.halite, me.fleet_size(), &config.economy);
        let mut ctx = TurnContext::build(state, config);
        task::classify_fleet(state, &ctx, fleet, config);

        // Units whose action is fixed before any solver runs.
        let mut directions: BTreeMap<ShipId, Direction> = BTreeMap::new();
        let mut pending = Vec::new();
        for ship in state.my_ships() {
            let current = fleet.task(ship.id).unwrap_or(Task::Explore);
            if task::is_hard_stuck(state, ship) {
                directions.insert(ship.id, Direction::Still);
                ctx.reserve(map, ship.position);
            } else if current == Task::HardReturn && ctx.base_distance(map, ship.position) <= 1 {
                // Final approach: stacking on our own base is fine.
                let base = ctx.closest_base(map, ship.position);
                let dir = map
                    .direction_to_neighbour(ship.position, base)
                    .unwrap_or(Direction::Still);
                directions.insert(ship.id, dir);
            } else if task::holds_to_mine(state, &ctx, config, ship, current) {
                directions.insert(ship.id, Direction::Still);
                ctx.reserve(map, ship.position);
            } else {
                pending.push(ship.id);
            }
        }
        tracing::debug!(
            fixed = directions.len(),
            pending = pending.len(),
            endgame = fleet.endgame,
            "classification"
        );

        let mut conversion = None;
        let mut reserved = 0;
        let mut committed = 0;
        if let Some(plan) = bases::plan_base(state, &ctx, fleet, config) {
            pending.retain(|&id| id != plan.ship);
            if plan.affordable {
                directions.remove(&plan.ship);
                conversion = Some(plan.ship);
                committed = plan.cost;
                fleet.economy.record_spend(plan.cost);
                ctx.add_base(map, plan.position);
                tracing::info!(ship = plan.ship, at = %plan.position, "converting to base");
            } else {
                reserved = plan.cost;
                directions.insert(plan.ship, Direction::Still);
                ctx.reserve(map, plan.position);
            }
        }

        let explorers: Vec<ShipId> = pending
            .iter()
            .copied()
            .filter(|&id| fleet.task(id) == Some(Task::Explore))
            .collect();
        let assignment = targets::assign_targets(state, &ctx, config, &explorers);
        for record in fleet.units.values_mut() {
            record.target = None;
        }
        for &id in &assignment.returning {
            fleet.set_task(id, Task::Return);
        }
        for (&id, &target) in &assignment.targets {
            if let Some(record) = fleet.units.get_mut(&id) {
                record.target = Some(target);
            }
        }

        let rollout_deadline = deadline.portion(config.timing.rollout_share);
        let mut requests = Vec::with_capacity(pending.len());
        let mut fallbacks = 0;
        for &id in &pending {
            let Some(ship) = state.ship(id) else {
                continue;
            };
            let current = fleet.task(id).unwrap_or(Task::Explore);
            let destination = assignment
                .targets
                .get(&id)
                .copied()
                .filter(|_| current == Task::Explore)
                .unwrap_or_else(|| ctx.closest_base(map, ship.position));
            let input = RolloutInput {
                map,
                constants: &state.constants,
                inspired: &ctx.inspired,
                start: ship.position,
                cargo: ship.halite,
                destination,
                task: current,
                return_threshold: ctx.return_threshold,
            };
            let preferences = rollout::evaluate(&input, &config.rollout, &rollout_deadline, rng);
            if !preferences.is_sampled() {
                fallbacks += 1;
            }
            requests.push(MoveRequest {
                ship: id,
                preferences,
            });
        }
        if fallbacks > 0 {
            tracing::warn!(
                turn = state.turn,
                fallbacks,
                "rollout budget exhausted, using distance preferences"
            );
        }

        directions.extend(moves::assign_moves(state, &mut ctx, config, &requests));

        #[allow(clippy::cast_precision_loss)]
        let field_fraction = fleet
            .initial_field
            .filter(|&initial| initial > 0)
            .map_or(1.0, |initial| ctx.field_total as f64 / initial as f64);
        let spawn = economy::should_spawn(
            state,
            &ctx,
            &fleet.economy,
            config,
            &ProductionInputs {
                reserved,
                committed,
                endgame: fleet.endgame,
                field_fraction,
            },
        );
        if spawn {
            fleet.economy.record_spend(state.constants.ship_cost);
        }

        let mut commands: Vec<Command> = directions
            .into_iter()
            .map(|(ship, direction)| Command::Move { ship, direction })
            .collect();
        if let Some(ship) = conversion {
            commands.push(Command::Construct { ship });
        }
        if spawn {
            commands.push(Command::Spawn);
        }

        tracing::info!(
            turn = state.turn,
            ships = me.fleet_size(),
            halite = me.halite,
            spawn,
            converted = conversion.is_some(),
            elapsed_ms = started.elapsed().as_millis(),
            "turn decided"
        );
        TurnPlan {
            commands,
            spawn,
            conversion,
            endgame: fleet.endgame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Constants, GameMap, Player, Position, Ship};
    use std::collections::HashSet;

    fn game() -> GameState {
        let mut map = GameMap::new(16, 16).unwrap();
        for (i, cell) in map.cells_mut().iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let h = ((i * 53) % 300) as u32;
            cell.halite = h;
        }
        let players = vec![
            Player::new(0, Position::new(4, 4), 5000),
            Player::new(1, Position::new(12, 12), 5000),
        ];
        let mut state = GameState::new(map, players, Constants::default(), 0);
        state.map.at_mut(Position::new(4, 4)).halite = 0;
        state.map.at_mut(Position::new(12, 12)).halite = 0;
        state.turn = 5;
        state
    }

    #[test]
    fn test_one_command_per_ship() {
        let mut state = game();
        for (id, x) in (0..).zip(2..8) {
            state.add_ship(Ship::new(id, 0, Position::new(x, 5), 100));
        }
        state.add_ship(Ship::new(40, 1, Position::new(10, 10), 100));
        let mut strategy = Strategy::new(StrategyConfig::default(), 1);
        let plan = strategy.decide(&state, &Deadline::unlimited());

        let moved: Vec<ShipId> = plan.commands.iter().filter_map(Command::ship).collect();
        let unique: HashSet<_> = moved.iter().collect();
        assert_eq!(moved.len(), 6);
        assert_eq!(unique.len(), 6);

        let ends: HashSet<Position> = plan
            .commands
            .iter()
            .filter_map(|c| match *c {
                Command::Move { ship, direction } => {
                    Some(state.map.offset(state.ship(ship).unwrap().position, direction))
                }
                _ => None,
            })
            .collect();
        assert_eq!(ends.len(), 6);
    }

    #[test]
    fn test_hard_stuck_ship_stays() {
        let mut state = game();
        state.map.at_mut(Position::new(8, 8)).halite = 900;
        state.add_ship(Ship::new(1, 0, Position::new(8, 8), 10));
        let mut strategy = Strategy::new(StrategyConfig::default(), 2);
        let plan = strategy.decide(&state, &Deadline::unlimited());
        assert_eq!(plan.direction_of(1), Some(Direction::Still));
    }

    #[test]
    fn test_first_turn_spawns() {
        let state = game();
        let mut strategy = Strategy::new(StrategyConfig::default(), 3);
        let plan = strategy.decide(&state, &Deadline::unlimited());
        assert!(plan.spawn);
        assert_eq!(plan.commands, vec![Command::Spawn]);
    }

    #[test]
    fn test_seeded_decisions_repeat() {
        let mut state = game();
        state.add_ship(Ship::new(1, 0, Position::new(5, 4), 0));
        state.add_ship(Ship::new(2, 0, Position::new(3, 4), 0));
        let a = Strategy::new(StrategyConfig::default(), 9).decide(&state, &Deadline::unlimited());
        let b = Strategy::new(StrategyConfig::default(), 9).decide(&state, &Deadline::unlimited());
        assert_eq!(a, b);
    }
}
