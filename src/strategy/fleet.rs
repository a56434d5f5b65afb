//! Per-unit records that persist across turns.

use std::collections::BTreeMap;

use crate::game::{GameState, Position, ShipId};
use crate::strategy::economy::Economy;

/// What a unit is trying to do this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Head for a harvest target and mine it.
    Explore,
    /// Carry cargo to the nearest base.
    Return,
    /// Final trip home before the turn limit.
    HardReturn,
}

impl Task {
    /// Whether the unit is heading for a base.
    #[must_use]
    pub const fn is_returning(self) -> bool {
        matches!(self, Task::Return | Task::HardReturn)
    }
}

/// Memory kept for one live unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitRecord {
    /// Current task.
    pub task: Task,
    /// Last turn on which the unit changed cell.
    pub last_moved: u32,
    /// Position seen on the previous turn.
    pub last_position: Position,
    /// Destination chosen by target assignment, bridging it to move assignment.
    pub target: Option<Position>,
}

impl UnitRecord {
    /// Record for a freshly spawned unit.
    #[must_use]
    pub const fn spawned(position: Position, turn: u32) -> Self {
        Self {
            task: Task::Explore,
            last_moved: turn,
            last_position: position,
            target: None,
        }
    }
}

/// Everything the engine remembers between turns for one player.
#[derive(Debug, Clone, Default)]
pub struct FleetState {
    /// Records keyed by ship id.
    pub units: BTreeMap<ShipId, UnitRecord>,
    /// Set once any unit enters the endgame; never cleared.
    pub endgame: bool,
    /// Income tracking for the production gate.
    pub economy: Economy,
    /// Field halite on the first observed turn.
    pub initial_field: Option<u64>,
}

impl FleetState {
    /// Create an empty fleet state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Align records with the viewer's live ships.
    ///
    /// Records of lost or converted ships are dropped, new ships start out
    /// exploring, and movement since the previous turn refreshes
    /// `last_moved`.
    pub fn sync(&mut self, state: &GameState) {
        let turn = state.turn;
        self.units.retain(|id, _| {
            state
                .ship(*id)
                .is_some_and(|ship| ship.owner == state.my_id)
        });
        for ship in state.my_ships() {
            let record = self
                .units
                .entry(ship.id)
                .or_insert_with(|| UnitRecord::spawned(ship.position, turn));
            if record.last_position != ship.position {
                record.last_position = ship.position;
                record.last_moved = turn;
            }
        }
        if self.initial_field.is_none() {
            self.initial_field = Some(state.map.total_halite());
        }
    }

    /// Task of a unit, if it has a record.
    #[must_use]
    pub fn task(&self, id: ShipId) -> Option<Task> {
        self.units.get(&id).map(|r| r.task)
    }

    /// Set the task of a unit that has a record.
    pub fn set_task(&mut self, id: ShipId, task: Task) {
        if let Some(record) = self.units.get_mut(&id) {
            record.task = task;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Constants, GameMap, Player, Ship};

    fn state() -> GameState {
        let map = GameMap::new(8, 8).unwrap();
        let players = vec![
            Player::new(0, Position::new(1, 1), 0),
            Player::new(1, Position::new(5, 5), 0),
        ];
        GameState::new(map, players, Constants::default(), 0)
    }

    #[test]
    fn test_sync_tracks_lifecycle() {
        let mut game = state();
        game.turn = 3;
        game.add_ship(Ship::new(1, 0, Position::new(2, 2), 0));
        game.add_ship(Ship::new(2, 1, Position::new(6, 6), 0));

        let mut fleet = FleetState::new();
        fleet.sync(&game);
        assert_eq!(fleet.units.len(), 1);
        assert_eq!(fleet.task(1), Some(Task::Explore));
        assert_eq!(fleet.units[&1].last_moved, 3);

        game.turn = 8;
        fleet.sync(&game);
        assert_eq!(fleet.units[&1].last_moved, 3);

        game.turn = 9;
        game.ships.get_mut(&1).unwrap().position = Position::new(2, 3);
        game.rebuild_occupancy();
        fleet.sync(&game);
        assert_eq!(fleet.units[&1].last_moved, 9);

        game.ships.remove(&1);
        game.rebuild_occupancy();
        fleet.sync(&game);
        assert!(fleet.units.is_empty());
    }

    #[test]
    fn test_initial_field_recorded_once() {
        let mut game = state();
        game.map.at_mut(Position::new(0, 0)).halite = 500;
        let mut fleet = FleetState::new();
        fleet.sync(&game);
        game.map.at_mut(Position::new(0, 0)).halite = 100;
        fleet.sync(&game);
        assert_eq!(fleet.initial_field, Some(500));
    }
}
