//! Game layer for haul.
//!
//! Models the contest as the decision engine sees it:
//! - Toroidal map with halite per cell, occupancy, and structures
//! - Players with shipyards, dropoffs, banked halite, and fleets
//! - Rule constants sent by the engine
//! - Commands returned to the engine

mod command;
mod constants;
mod invariants;
mod map;
mod player;
mod state;

pub use command::Command;
pub use constants::Constants;
pub use invariants::{check_invariants, InvariantViolation};
pub use map::{Cell, Direction, GameMap, Position, StructureKind, StructureRef};
pub use player::{Player, PlayerId, Ship, ShipId, Structure, StructureId};
pub use state::GameState;
