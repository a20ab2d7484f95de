//! Iteration control for solvers.

use serde::{Deserialize, Serialize};

/// Default iteration limit.
pub const DEFAULT_MAX_STEPS: usize = 1_000;

/// Default absolute residual tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// When to stop iterating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverControl {
    /// Maximum number of iterations.
    pub max_steps: usize,
    /// Absolute tolerance on the residual's Euclidean norm.
    pub tolerance: f64,
}

impl Default for SolverControl {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl SolverControl {
    /// Create a control with the given limits.
    #[must_use]
    pub fn new(max_steps: usize, tolerance: f64) -> Self {
        Self {
            max_steps,
            tolerance,
        }
    }

    /// Replace zero or non-finite values with defaults.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.max_steps == 0 {
            self.max_steps = DEFAULT_MAX_STEPS;
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            self.tolerance = DEFAULT_TOLERANCE;
        }
        self
    }
}
