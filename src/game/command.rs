//! Commands sent to the engine at the end of a turn.

use std::fmt;

use crate::game::{Direction, ShipId};

/// A command issued by a player during their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move a ship one cell, or keep it still.
    Move {
        /// Ship to move.
        ship: ShipId,
        /// Direction of travel.
        direction: Direction,
    },
    /// Convert a ship into a dropoff on its current cell.
    Construct {
        /// Ship to convert.
        ship: ShipId,
    },
    /// Produce a new ship at the shipyard.
    Spawn,
}

impl Command {
    /// Ship this command applies to, if any.
    #[must_use]
    pub const fn ship(&self) -> Option<ShipId> {
        match self {
            Command::Move { ship, .. } | Command::Construct { ship } => Some(*ship),
            Command::Spawn => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move { ship, direction } => write!(f, "m {ship} {}", direction.as_char()),
            Command::Construct { ship } => write!(f, "c {ship}"),
            Command::Spawn => write!(f, "g"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let mv = Command::Move {
            ship: 12,
            direction: Direction::West,
        };
        assert_eq!(mv.to_string(), "m 12 w");
        assert_eq!(Command::Construct { ship: 3 }.to_string(), "c 3");
        assert_eq!(Command::Spawn.to_string(), "g");
        assert_eq!(Command::Spawn.ship(), None);
        assert_eq!(mv.ship(), Some(12));
    }
}
