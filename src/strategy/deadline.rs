//! Soft wall-clock budget for a turn.

use std::time::{Duration, Instant};

/// A soft deadline polled by the sampling phases.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// A deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget: Some(budget),
        }
    }

    /// A deadline that never expires. Used by self-play for reproducible runs.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            start: Instant::now(),
            budget: None,
        }
    }

    /// A deadline covering `share` of whatever budget is left.
    #[must_use]
    pub fn portion(&self, share: f64) -> Self {
        match self.remaining() {
            Some(left) => Self::after(left.mul_f64(share.clamp(0.0, 1.0))),
            None => Self::unlimited(),
        }
    }

    /// Time left, or `None` when unlimited.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.budget
            .map(|budget| budget.saturating_sub(self.start.elapsed()))
    }

    /// Whether the budget is used up.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Fraction of the budget still available, in `[0, 1]`.
    #[must_use]
    pub fn slack(&self) -> f64 {
        match (self.budget, self.remaining()) {
            (Some(budget), Some(left)) if !budget.is_zero() => {
                left.as_secs_f64() / budget.as_secs_f64()
            }
            (Some(_), _) => 0.0,
            (None, _) => 1.0,
        }
    }
}
