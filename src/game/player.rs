//! Players, ships, and structures.

use crate::game::{Position, StructureKind};

/// Unique identifier for a player.
pub type PlayerId = u8;

/// Unique identifier for a ship, stable for the ship's lifetime.
pub type ShipId = u32;

/// Unique identifier for a structure.
pub type StructureId = u32;

/// A mobile collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ship {
    /// Ship identifier.
    pub id: ShipId,
    /// Owning player.
    pub owner: PlayerId,
    /// Current position.
    pub position: Position,
    /// Carried halite.
    pub halite: u32,
}

impl Ship {
    /// Create a new ship.
    #[must_use]
    pub const fn new(id: ShipId, owner: PlayerId, position: Position, halite: u32) -> Self {
        Self {
            id,
            owner,
            position,
            halite,
        }
    }
}

/// A banking structure (shipyard or dropoff).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Structure {
    /// Structure identifier.
    pub id: StructureId,
    /// Owning player.
    pub owner: PlayerId,
    /// Fixed position.
    pub position: Position,
    /// Shipyard or dropoff.
    pub kind: StructureKind,
}

/// State for a single player.
#[derive(Debug, Clone)]
pub struct Player {
    /// Unique identifier for this player.
    pub id: PlayerId,
    /// Location of the player's shipyard.
    pub shipyard: Position,
    /// Banked halite.
    pub halite: u32,
    /// Live ships, ordered by id.
    pub ships: Vec<ShipId>,
    /// Dropoffs owned by this player.
    pub dropoffs: Vec<Structure>,
}

impl Player {
    /// Create a new player with the given ID and shipyard location.
    #[must_use]
    pub fn new(id: PlayerId, shipyard: Position, halite: u32) -> Self {
        Self {
            id,
            shipyard,
            halite,
            ships: Vec::new(),
            dropoffs: Vec::new(),
        }
    }

    /// All base positions: the shipyard followed by every dropoff.
    pub fn bases(&self) -> impl Iterator<Item = Position> + '_ {
        std::iter::once(self.shipyard).chain(self.dropoffs.iter().map(|d| d.position))
    }

    /// Number of live ships.
    #[must_use]
    pub fn fleet_size(&self) -> usize {
        self.ships.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let player = Player::new(1, Position::new(5, 5), 5000);
        assert_eq!(player.id, 1);
        assert_eq!(player.shipyard, Position::new(5, 5));
        assert_eq!(player.fleet_size(), 0);
    }

    #[test]
    fn test_bases_include_dropoffs() {
        let mut player = Player::new(0, Position::new(1, 1), 0);
        player.dropoffs.push(Structure {
            id: 7,
            owner: 0,
            position: Position::new(4, 4),
            kind: StructureKind::Dropoff,
        });
        let bases: Vec<_> = player.bases().collect();
        assert_eq!(bases, vec![Position::new(1, 1), Position::new(4, 4)]);
    }
}
