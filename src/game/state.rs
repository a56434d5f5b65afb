//! Game state snapshot.

use std::collections::BTreeMap;

use crate::game::{
    Constants, GameMap, Player, PlayerId, Position, Ship, ShipId, StructureId, StructureKind,
    StructureRef,
};

/// Complete game state as seen by one player.
///
/// This is the single source of truth for a turn: cells reference ships by
/// id, players list their ship ids, and ships live in `ships`.
#[derive(Debug, Clone)]
pub struct GameState {
    /// The game map.
    pub map: GameMap,
    /// All players in the game; `players[i].id == i`.
    pub players: Vec<Player>,
    /// All live ships, keyed by id.
    pub ships: BTreeMap<ShipId, Ship>,
    /// Current turn number (the engine counts from 1).
    pub turn: u32,
    /// Rule constants.
    pub constants: Constants,
    /// The player this state is viewed by.
    pub my_id: PlayerId,
}

impl GameState {
    /// Create a new game state with the given map and players.
    ///
    /// Shipyards are stamped onto the map.
    #[must_use]
    pub fn new(map: GameMap, players: Vec<Player>, constants: Constants, my_id: PlayerId) -> Self {
        let mut state = Self {
            map,
            players,
            ships: BTreeMap::new(),
            turn: 0,
            constants,
            my_id,
        };
        state.stamp_structures();
        state
    }

    /// Get the current turn number.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Turns left before the limit.
    #[must_use]
    pub fn turns_remaining(&self) -> u32 {
        self.constants.max_turns.saturating_sub(self.turn)
    }

    /// Get a player by ID.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(usize::from(id))
    }

    /// Get a mutable reference to a player by ID.
    #[must_use]
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(usize::from(id))
    }

    /// The viewing player.
    ///
    /// # Panics
    ///
    /// Panics if `my_id` does not index `players`; the protocol reader and the
    /// local engine always build states where it does.
    #[must_use]
    pub fn me(&self) -> &Player {
        &self.players[usize::from(self.my_id)]
    }

    /// All players other than the viewer.
    pub fn opponents(&self) -> impl Iterator<Item = &Player> {
        let me = self.my_id;
        self.players.iter().filter(move |p| p.id != me)
    }

    /// Ships owned by the viewer, ordered by id.
    pub fn my_ships(&self) -> impl Iterator<Item = &Ship> {
        let me = self.my_id;
        self.ships.values().filter(move |s| s.owner == me)
    }

    /// Ships not owned by the viewer.
    pub fn enemy_ships(&self) -> impl Iterator<Item = &Ship> {
        let me = self.my_id;
        self.ships.values().filter(move |s| s.owner != me)
    }

    /// Look up a ship by id.
    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(&id)
    }

    /// Ship standing on a position, if any.
    #[must_use]
    pub fn ship_at(&self, pos: Position) -> Option<&Ship> {
        self.map.at(pos).occupant.and_then(|id| self.ships.get(&id))
    }

    /// Whether a position holds a base owned by `player`.
    #[must_use]
    pub fn is_base_of(&self, pos: Position, player: PlayerId) -> bool {
        self.map.at(pos).structure.is_some_and(|s| s.owner == player)
    }

    /// Number of players in the game.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Write shipyards and dropoffs onto their cells.
    pub fn stamp_structures(&mut self) {
        for player in &self.players {
            self.map.at_mut(player.shipyard).structure = Some(StructureRef {
                owner: player.id,
                id: StructureId::from(player.id),
                kind: StructureKind::Shipyard,
            });
            for dropoff in &player.dropoffs {
                self.map.at_mut(dropoff.position).structure = Some(StructureRef {
                    owner: player.id,
                    id: dropoff.id,
                    kind: StructureKind::Dropoff,
                });
            }
        }
    }

    /// Rebuild cell occupancy from the ship roster and each player's ship list.
    pub fn rebuild_occupancy(&mut self) {
        self.map.clear_occupants();
        for player in &mut self.players {
            player.ships.clear();
        }
        for ship in self.ships.values() {
            self.map.at_mut(ship.position).occupant = Some(ship.id);
        }
        for ship in self.ships.values() {
            if let Some(player) = self.players.get_mut(usize::from(ship.owner)) {
                player.ships.push(ship.id);
            }
        }
    }

    /// Insert a ship and keep occupancy consistent.
    pub fn add_ship(&mut self, ship: Ship) {
        self.ships.insert(ship.id, ship);
        self.map.at_mut(ship.position).occupant = Some(ship.id);
        if let Some(player) = self.player_mut(ship.owner) {
            player.ships.push(ship.id);
            player.ships.sort_unstable();
        }
    }
}
