//! Decision pipeline for one player.
//!
//! Each turn runs the same stages in order:
//! - Fleet sync and task classification (explore, return, hard return)
//! - Units with fixed actions: stuck, final approach, mining hold
//! - Base placement
//! - Target assignment over profit estimates
//! - Stochastic rollouts ranking each unit's immediate moves
//! - Collision-free move assignment
//! - The production gate
//!
//! All tunables live in [`StrategyConfig`](crate::config::StrategyConfig);
//! all memory across turns lives in [`FleetState`].

pub mod bases;
pub mod context;
pub mod deadline;
pub mod economy;
pub mod estimate;
pub mod fleet;
pub mod hungarian;
pub mod moves;
pub mod rollout;
pub mod safety;
pub mod targets;
pub mod task;
mod turn;

pub use bases::BasePlan;
pub use context::{Contest, TurnContext};
pub use deadline::Deadline;
pub use economy::{Economy, ProductionInputs};
pub use estimate::DistanceTable;
pub use fleet::{FleetState, Task, UnitRecord};
pub use hungarian::CostMatrix;
pub use moves::MoveRequest;
pub use rollout::{Preferences, RolloutInput};
pub use safety::Safety;
pub use targets::TargetAssignment;
pub use turn::{Strategy, TurnPlan};
