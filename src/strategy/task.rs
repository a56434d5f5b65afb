//! Per-unit task state machine.
//!
//! Precedence, highest first: the endgame sends everyone home for good; a
//! loaded or stalled explorer turns for home; a returning unit that reached a
//! base goes back out.

use crate::config::StrategyConfig;
use crate::game::{GameState, Ship};
use crate::strategy::context::TurnContext;
use crate::strategy::fleet::{FleetState, Task};

/// Whether any of our ships can no longer finish a trip home before the turn
/// limit, or the field is exhausted.
///
/// Scans the whole fleet before anything is classified, so the outcome does
/// not depend on classification order.
#[must_use]
pub fn endgame_due(
    state: &GameState,
    ctx: &TurnContext,
    config: &StrategyConfig,
    initial_field: Option<u64>,
) -> bool {
    #[allow(clippy::cast_precision_loss)]
    let congestion = state.me().fleet_size() as f64 * config.task.congestion_factor;
    let limit = f64::from(state.constants.max_turns);
    let too_late = state.my_ships().any(|ship| {
        let dist = f64::from(ctx.base_distance(&state.map, ship.position));
        f64::from(state.turn) + dist + congestion >= limit
    });

    #[allow(clippy::cast_precision_loss)]
    let exhausted = initial_field.is_some_and(|initial| {
        initial > 0
            && ctx.field_total as f64 <= initial as f64 * config.task.exhausted_field_fraction
    });
    too_late || exhausted
}

/// Next task of one unit.
#[must_use]
pub fn next_task(
    previous: Task,
    cargo: u32,
    base_distance: u32,
    stalled: bool,
    endgame: bool,
    return_threshold: u32,
) -> Task {
    if endgame {
        return Task::HardReturn;
    }
    match previous {
        Task::Explore if base_distance > 0 && (cargo >= return_threshold || stalled) => {
            Task::Return
        }
        Task::Explore => Task::Explore,
        Task::Return if base_distance == 0 => Task::Explore,
        Task::Return => Task::Return,
        Task::HardReturn => Task::HardReturn,
    }
}

/// Classify every unit in the fleet, setting the sticky endgame flag first.
pub fn classify_fleet(
    state: &GameState,
    ctx: &TurnContext,
    fleet: &mut FleetState,
    config: &StrategyConfig,
) {
    if !fleet.endgame && endgame_due(state, ctx, config, fleet.initial_field) {
        tracing::info!(turn = state.turn, "endgame triggered");
        fleet.endgame = true;
    }
    let endgame = fleet.endgame;
    for ship in state.my_ships() {
        let Some(record) = fleet.units.get_mut(&ship.id) else {
            continue;
        };
        let stalled =
            state.turn.saturating_sub(record.last_moved) >= config.task.stall_turns;
        record.task = next_task(
            record.task,
            ship.halite,
            ctx.base_distance(&state.map, ship.position),
            stalled,
            endgame,
            ctx.return_threshold,
        );
    }
}

/// A ship that cannot pay to leave its cell.
#[must_use]
pub fn is_hard_stuck(state: &GameState, ship: &Ship) -> bool {
    ship.halite < state.constants.move_cost(state.map.halite(ship.position))
}

/// A non-full ship on a rich cell keeps mining instead of moving.
#[must_use]
pub fn holds_to_mine(
    state: &GameState,
    ctx: &TurnContext,
    config: &StrategyConfig,
    ship: &Ship,
    task: Task,
) -> bool {
    if !config.task.mining_hold || task == Task::HardReturn {
        return false;
    }
    let cell = state.map.at(ship.position);
    ship.halite < state.constants.max_halite
        && cell.structure.is_none()
        && cell.halite > 0
        && cell.halite >= ctx.halite_cutoff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Constants, GameMap, Player, Position};

    fn state() -> GameState {
        let map = GameMap::new(16, 16).unwrap();
        let players = vec![
            Player::new(0, Position::new(0, 0), 0),
            Player::new(1, Position::new(8, 8), 0),
        ];
        GameState::new(map, players, Constants::default(), 0)
    }

    #[test]
    fn test_loaded_explorer_returns() {
        assert_eq!(next_task(Task::Explore, 950, 5, false, false, 950), Task::Return);
        assert_eq!(next_task(Task::Explore, 949, 5, false, false, 950), Task::Explore);
    }

    #[test]
    fn test_explorer_on_base_keeps_exploring() {
        assert_eq!(next_task(Task::Explore, 1000, 0, true, false, 950), Task::Explore);
    }

    #[test]
    fn test_returner_on_base_explores() {
        assert_eq!(next_task(Task::Return, 0, 0, false, false, 950), Task::Explore);
        assert_eq!(next_task(Task::Return, 600, 3, false, false, 950), Task::Return);
    }

    #[test]
    fn test_stalled_explorer_returns() {
        assert_eq!(next_task(Task::Explore, 10, 4, true, false, 950), Task::Return);
    }

    #[test]
    fn test_endgame_overrides_everything() {
        for task in [Task::Explore, Task::Return, Task::HardReturn] {
            assert_eq!(next_task(task, 0, 0, false, true, 950), Task::HardReturn);
        }
        assert_eq!(next_task(Task::HardReturn, 0, 0, false, false, 950), Task::HardReturn);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let mut game = state();
        game.turn = 20;
        game.add_ship(Ship::new(1, 0, Position::new(0, 0), 0));
        game.add_ship(Ship::new(2, 0, Position::new(3, 3), 990));
        game.add_ship(Ship::new(3, 0, Position::new(5, 1), 100));
        let config = StrategyConfig::default();
        let ctx = TurnContext::build(&game, &config);
        let mut fleet = FleetState::new();
        fleet.sync(&game);
        fleet.set_task(1, Task::Return);

        classify_fleet(&game, &ctx, &mut fleet, &config);
        let first = fleet.units.clone();
        classify_fleet(&game, &ctx, &mut fleet, &config);
        assert_eq!(fleet.units, first);
        assert_eq!(fleet.task(1), Some(Task::Explore));
        assert_eq!(fleet.task(2), Some(Task::Return));
        assert_eq!(fleet.task(3), Some(Task::Explore));
    }

    #[test]
    fn test_endgame_prescan_is_sticky() {
        let mut game = state();
        game.turn = 390;
        game.add_ship(Ship::new(1, 0, Position::new(0, 1), 0));
        game.add_ship(Ship::new(2, 0, Position::new(6, 6), 0));
        let config = StrategyConfig::default();
        let mut fleet = FleetState::new();
        fleet.sync(&game);

        let ctx = TurnContext::build(&game, &config);
        classify_fleet(&game, &ctx, &mut fleet, &config);
        assert!(fleet.endgame);
        assert_eq!(fleet.task(1), Some(Task::HardReturn));
        assert_eq!(fleet.task(2), Some(Task::HardReturn));

        // The far ship is gone; the flag stays set.
        game.ships.remove(&2);
        game.rebuild_occupancy();
        fleet.sync(&game);
        let ctx = TurnContext::build(&game, &config);
        classify_fleet(&game, &ctx, &mut fleet, &config);
        assert!(fleet.endgame);
        assert_eq!(fleet.task(1), Some(Task::HardReturn));
    }

    #[test]
    fn test_exhausted_field_triggers_endgame() {
        let mut game = state();
        game.map.at_mut(Position::new(4, 4)).halite = 5;
        let config = StrategyConfig::default();
        let ctx = TurnContext::build(&game, &config);
        assert!(endgame_due(&game, &ctx, &config, Some(10_000)));
        assert!(!endgame_due(&game, &ctx, &config, Some(100)));
    }

    #[test]
    fn test_hard_stuck_and_hold() {
        let mut game = state();
        game.map.at_mut(Position::new(3, 3)).halite = 400;
        game.add_ship(Ship::new(1, 0, Position::new(3, 3), 39));
        let ship = game.ship(1).copied().unwrap();
        assert!(is_hard_stuck(&game, &ship));

        let config = StrategyConfig::default();
        let ctx = TurnContext::build(&game, &config);
        assert!(holds_to_mine(&game, &ctx, &config, &ship, Task::Explore));
        assert!(!holds_to_mine(&game, &ctx, &config, &ship, Task::HardReturn));

        let full = Ship::new(1, 0, Position::new(3, 3), 1000);
        assert!(!is_hard_stuck(&game, &full));
        assert!(!holds_to_mine(&game, &ctx, &config, &full, Task::Return));
    }
}
