// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Haul: a per-turn fleet decision engine for toroidal halite-harvesting contests.
//!
//! Every turn the engine reads the full game state and commits one action per
//! owned ship plus an optional production order, under a wall-clock budget.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   CLI (play / selfplay / config)    │
//! ├──────────────────┬──────────────────┤
//! │  Engine protocol │   Local engine   │
//! ├──────────────────┴──────────────────┤
//! │        Decision pipeline            │
//! ├─────────────────────────────────────┤
//! │   Game model (map, ships, rules)    │
//! └─────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod protocol;
pub mod sim;
pub mod strategy;

pub use config::{ConfigError, StrategyConfig};
pub use error::{HaulError, HaulResult};

// Re-export key game types at crate root for convenience
pub use game::{Command, Direction, GameMap, GameState, Player, PlayerId, Position, Ship, ShipId};
pub use strategy::{Deadline, Strategy, TurnPlan};
