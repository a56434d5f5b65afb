//! Turn resolution for the local engine.

use std::collections::{BTreeMap, BTreeSet};

use crate::game::{
    check_invariants, Command, Constants, Direction, GameMap, GameState, InvariantViolation,
    Player, PlayerId, Position, Ship, ShipId, Structure, StructureId, StructureKind, StructureRef,
};
use crate::sim::{GameResult, PlayerStats};

/// What happened during one resolved turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnEvents {
    /// Cells on which ships collided.
    pub collisions: usize,
    /// Ships destroyed in collisions.
    pub destroyed: Vec<ShipId>,
    /// Ships produced at shipyards.
    pub spawned: Vec<ShipId>,
    /// Dropoffs constructed.
    pub constructed: Vec<Position>,
    /// Commands ignored because the ship was missing, foreign, or already commanded.
    pub rejected: usize,
}

/// Authoritative game state plus the bookkeeping the rules need.
#[derive(Debug, Clone)]
pub struct Engine {
    state: GameState,
    next_ship: ShipId,
    next_structure: StructureId,
    stats: Vec<PlayerStats>,
}

impl Engine {
    /// Start a game on turn 1.
    #[must_use]
    pub fn new(map: GameMap, players: Vec<Player>, constants: Constants) -> Self {
        let stats = players
            .iter()
            .map(|p| PlayerStats {
                player_id: p.id,
                ..PlayerStats::default()
            })
            .collect();
        #[allow(clippy::cast_possible_truncation)]
        let next_structure = players.len() as StructureId;
        let mut state = GameState::new(map, players, constants, 0);
        state.turn = 1;
        Self {
            state,
            next_ship: 0,
            next_structure,
            stats,
        }
    }

    /// The authoritative state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// The turn about to be played.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.state.turn
    }

    /// Whether the turn limit has been reached.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.state.turn > self.state.constants.max_turns
    }

    /// The state as seen by one player.
    #[must_use]
    pub fn view_for(&self, player: PlayerId) -> GameState {
        let mut view = self.state.clone();
        view.my_id = player;
        view
    }

    /// Run the rule checks on the current state.
    #[must_use]
    pub fn check(&self) -> Vec<InvariantViolation> {
        check_invariants(&self.state)
    }

    /// Resolve one turn. `orders[i]` holds the commands of player `i`.
    pub fn step(&mut self, orders: &[Vec<Command>]) -> TurnEvents {
        let mut events = TurnEvents::default();
        let mut moves: BTreeMap<ShipId, Direction> = BTreeMap::new();
        let mut conversions = Vec::new();
        let mut spawns = BTreeSet::new();

        for (player, commands) in orders.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let player = player as PlayerId;
            let mut commanded = BTreeSet::new();
            for command in commands {
                if let Some(ship) = command.ship() {
                    let owned = self.state.ship(ship).is_some_and(|s| s.owner == player);
                    if !owned || !commanded.insert(ship) {
                        events.rejected += 1;
                        continue;
                    }
                }
                match *command {
                    Command::Move { ship, direction } => {
                        moves.insert(ship, direction);
                    }
                    Command::Construct { ship } => conversions.push(ship),
                    Command::Spawn => {
                        spawns.insert(player);
                    }
                }
            }
        }
        if events.rejected > 0 {
            tracing::warn!(turn = self.state.turn, rejected = events.rejected, "ignored commands");
        }

        for ship in conversions {
            self.construct(ship, &mut events);
        }
        let spawned = self.spawn(&spawns, &mut events);
        let moved = self.move_ships(&moves, &spawned);
        self.resolve_collisions(&mut events);
        self.mine(&moved, &spawned);
        self.deposit();

        self.state.rebuild_occupancy();
        self.state.turn += 1;
        events
    }

    /// Convert a ship into a dropoff if its owner can pay.
    fn construct(&mut self, id: ShipId, events: &mut TurnEvents) {
        let Some(ship) = self.state.ship(id).copied() else {
            return;
        };
        let pos = ship.position;
        if self.state.map.at(pos).structure.is_some() {
            return;
        }
        let cost = self
            .state
            .constants
            .dropoff_cost
            .saturating_sub(ship.halite + self.state.map.halite(pos));
        let structure = self.next_structure;
        let Some(owner) = self.state.player_mut(ship.owner) else {
            return;
        };
        if owner.halite < cost {
            return;
        }
        owner.halite -= cost;
        owner.dropoffs.push(Structure {
            id: structure,
            owner: ship.owner,
            position: pos,
            kind: StructureKind::Dropoff,
        });
        let cell = self.state.map.at_mut(pos);
        cell.halite = 0;
        cell.structure = Some(StructureRef {
            owner: ship.owner,
            id: structure,
            kind: StructureKind::Dropoff,
        });
        self.state.ships.remove(&id);
        self.next_structure += 1;
        if let Some(stats) = self.stats.get_mut(usize::from(ship.owner)) {
            stats.dropoffs_built += 1;
        }
        events.constructed.push(pos);
    }

    /// Produce ships at the shipyards of players who asked and can pay.
    fn spawn(&mut self, players: &BTreeSet<PlayerId>, events: &mut TurnEvents) -> BTreeSet<ShipId> {
        let cost = self.state.constants.ship_cost;
        let mut spawned = BTreeSet::new();
        for &player in players {
            let Some(owner) = self.state.player_mut(player) else {
                continue;
            };
            if owner.halite < cost {
                continue;
            }
            owner.halite -= cost;
            let shipyard = owner.shipyard;
            let id = self.next_ship;
            self.next_ship += 1;
            self.state.ships.insert(id, Ship::new(id, player, shipyard, 0));
            spawned.insert(id);
            events.spawned.push(id);
            if let Some(stats) = self.stats.get_mut(usize::from(player)) {
                stats.ships_built += 1;
            }
        }
        spawned
    }

    /// Move every commanded ship that can pay for leaving its cell.
    ///
    /// Returns the ships that changed cell.
    fn move_ships(
        &mut self,
        moves: &BTreeMap<ShipId, Direction>,
        spawned: &BTreeSet<ShipId>,
    ) -> BTreeSet<ShipId> {
        let constants = self.state.constants;
        let map = &self.state.map;
        let mut moved = BTreeSet::new();
        for ship in self.state.ships.values_mut() {
            if spawned.contains(&ship.id) {
                continue;
            }
            let Some(&dir) = moves.get(&ship.id) else {
                continue;
            };
            if dir == Direction::Still {
                continue;
            }
            let cost = constants.move_cost(map.halite(ship.position));
            if ship.halite < cost {
                continue;
            }
            ship.halite -= cost;
            ship.position = map.offset(ship.position, dir);
            moved.insert(ship.id);
        }
        moved
    }

    /// Destroy every ship sharing a cell and spill its cargo.
    ///
    /// Cargo lost on a structure goes to the structure's owner; elsewhere it
    /// returns to the cell.
    fn resolve_collisions(&mut self, events: &mut TurnEvents) {
        let mut cells: BTreeMap<Position, Vec<ShipId>> = BTreeMap::new();
        for ship in self.state.ships.values() {
            cells.entry(ship.position).or_default().push(ship.id);
        }
        for (pos, ids) in cells {
            if ids.len() < 2 {
                continue;
            }
            events.collisions += 1;
            let mut spilled = 0;
            for id in ids {
                if let Some(ship) = self.state.ships.remove(&id) {
                    spilled += ship.halite;
                    if let Some(stats) = self.stats.get_mut(usize::from(ship.owner)) {
                        stats.ships_lost += 1;
                    }
                    events.destroyed.push(id);
                }
            }
            match self.state.map.at(pos).structure.map(|s| s.owner) {
                Some(owner) => {
                    if let Some(player) = self.state.player_mut(owner) {
                        player.halite += spilled;
                    }
                }
                None => self.state.map.at_mut(pos).halite += spilled,
            }
        }
    }

    /// Extract halite for every ship that stayed put off a structure.
    fn mine(&mut self, moved: &BTreeSet<ShipId>, spawned: &BTreeSet<ShipId>) {
        let constants = self.state.constants;
        let positions: Vec<(PlayerId, Position)> = self
            .state
            .ships
            .values()
            .map(|s| (s.owner, s.position))
            .collect();
        let map = &mut self.state.map;
        for ship in self.state.ships.values_mut() {
            if moved.contains(&ship.id) || spawned.contains(&ship.id) {
                continue;
            }
            let cell = map.at(ship.position);
            if cell.structure.is_some() || cell.halite == 0 {
                continue;
            }
            let enemies = positions
                .iter()
                .filter(|&&(owner, pos)| {
                    owner != ship.owner
                        && map.distance(pos, ship.position) <= constants.inspiration_radius
                })
                .count();
            let inspired = enemies >= constants.inspiration_ship_count as usize;
            let (removed, gained) = constants.mine(cell.halite, ship.halite, inspired);
            map.at_mut(ship.position).halite -= removed;
            ship.halite += gained;
        }
    }

    /// Bank the cargo of every ship standing on one of its owner's bases.
    fn deposit(&mut self) {
        let map = &self.state.map;
        for ship in self.state.ships.values_mut() {
            if ship.halite == 0
                || !map
                    .at(ship.position)
                    .structure
                    .is_some_and(|s| s.owner == ship.owner)
            {
                continue;
            }
            if let Some(owner) = self.state.players.get_mut(usize::from(ship.owner)) {
                owner.halite += ship.halite;
            }
            if let Some(stats) = self.stats.get_mut(usize::from(ship.owner)) {
                stats.deposited += u64::from(ship.halite);
            }
            ship.halite = 0;
        }
    }

    /// Close the game and report the standings.
    #[must_use]
    pub fn finish(mut self, seed: u64) -> GameResult {
        let scores: Vec<u32> = self.state.players.iter().map(|p| p.halite).collect();
        for (stats, &score) in self.stats.iter_mut().zip(&scores) {
            stats.final_halite = score;
        }
        let best = scores.iter().copied().max().unwrap_or(0);
        let leaders: Vec<PlayerId> = self
            .state
            .players
            .iter()
            .filter(|p| p.halite == best)
            .map(|p| p.id)
            .collect();
        GameResult {
            seed,
            winner: (leaders.len() == 1).then(|| leaders[0]),
            scores,
            turns_played: self.state.turn.saturating_sub(1),
            player_stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        let mut map = GameMap::new(16, 16).unwrap();
        for cell in map.cells_mut() {
            cell.halite = 100;
        }
        let players = vec![
            Player::new(0, Position::new(4, 8), 5000),
            Player::new(1, Position::new(11, 8), 5000),
        ];
        Engine::new(map, players, Constants::default())
    }

    fn place(engine: &mut Engine, id: ShipId, owner: PlayerId, pos: Position, halite: u32) {
        engine.state.add_ship(Ship::new(id, owner, pos, halite));
        engine.next_ship = engine.next_ship.max(id + 1);
    }

    #[test]
    fn test_spawn_charges_cost() {
        let mut engine = engine();
        let events = engine.step(&[vec![Command::Spawn], vec![]]);
        assert_eq!(events.spawned, vec![0]);
        assert_eq!(engine.state().players[0].halite, 4000);
        assert_eq!(engine.state().ship(0).map(|s| s.position), Some(Position::new(4, 8)));
        assert_eq!(engine.turn(), 2);
    }

    #[test]
    fn test_move_pays_cost_or_stays() {
        let mut engine = engine();
        place(&mut engine, 1, 0, Position::new(1, 1), 50);
        place(&mut engine, 2, 0, Position::new(1, 3), 5);
        let east = |ship| Command::Move {
            ship,
            direction: Direction::East,
        };
        engine.step(&[vec![east(1), east(2)], vec![]]);
        let state = engine.state();
        assert_eq!(state.ship(1).map(|s| (s.position, s.halite)), Some((Position::new(2, 1), 40)));
        // Could not pay 10 to leave, so it stayed and mined 25.
        assert_eq!(state.ship(2).map(|s| (s.position, s.halite)), Some((Position::new(1, 3), 30)));
    }

    #[test]
    fn test_collision_spills_cargo() {
        let mut engine = engine();
        place(&mut engine, 1, 0, Position::new(2, 2), 200);
        place(&mut engine, 2, 1, Position::new(4, 2), 300);
        let events = engine.step(&[
            vec![Command::Move {
                ship: 1,
                direction: Direction::East,
            }],
            vec![Command::Move {
                ship: 2,
                direction: Direction::West,
            }],
        ]);
        assert_eq!(events.collisions, 1);
        assert_eq!(events.destroyed, vec![1, 2]);
        assert!(engine.state().ships.is_empty());
        // 200 - 10 + 300 - 10 lands on a cell holding 100.
        assert_eq!(engine.state().map.halite(Position::new(3, 2)), 580);
    }

    #[test]
    fn test_inspired_mining() {
        let mut engine = engine();
        place(&mut engine, 1, 0, Position::new(8, 2), 0);
        place(&mut engine, 2, 1, Position::new(9, 2), 0);
        place(&mut engine, 3, 1, Position::new(8, 4), 0);
        engine.step(&[vec![], vec![]]);
        let state = engine.state();
        assert_eq!(state.ship(1).map(|s| s.halite), Some(75));
        assert_eq!(state.map.halite(Position::new(8, 2)), 75);
        // Player 1's ships see only one enemy.
        assert_eq!(state.ship(2).map(|s| s.halite), Some(25));
    }

    #[test]
    fn test_deposit_and_construct() {
        let mut engine = engine();
        place(&mut engine, 1, 0, Position::new(4, 7), 400);
        place(&mut engine, 2, 0, Position::new(10, 1), 500);
        engine.step(&[
            vec![
                Command::Move {
                    ship: 1,
                    direction: Direction::South,
                },
                Command::Construct { ship: 2 },
            ],
            vec![],
        ]);
        let state = engine.state();
        // 5000 - (4000 - 500 - 100) + (400 - 10)
        assert_eq!(state.players[0].halite, 5000 - 3400 + 390);
        assert!(state.is_base_of(Position::new(10, 1), 0));
        assert!(state.ship(2).is_none());
        assert_eq!(state.map.halite(Position::new(10, 1)), 0);
        assert!(engine.check().is_empty());
    }

    #[test]
    fn test_foreign_commands_rejected() {
        let mut engine = engine();
        place(&mut engine, 1, 0, Position::new(2, 2), 0);
        let events = engine.step(&[
            vec![],
            vec![Command::Move {
                ship: 1,
                direction: Direction::North,
            }],
        ]);
        assert_eq!(events.rejected, 1);
        assert_eq!(engine.state().ship(1).map(|s| s.position), Some(Position::new(2, 2)));
    }

    #[test]
    fn test_finish_reports_winner() {
        let mut engine = engine();
        engine.state.players[1].halite = 6000;
        let result = engine.finish(3);
        assert_eq!(result.winner, Some(1));
        assert_eq!(result.scores, vec![5000, 6000]);
        assert_eq!(result.player_stats[1].final_halite, 6000);
    }
}
