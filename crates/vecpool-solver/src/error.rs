//! Solver error types.

/// Errors from iterative solves.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// The iteration limit was reached before the tolerance.
    #[error("no convergence after {steps} steps (residual {residual:e})")]
    NoConvergence {
        /// Steps performed.
        steps: usize,
        /// Residual norm at the last step.
        residual: f64,
    },

    /// Vector lengths do not match the operator.
    #[error("dimension mismatch: operator has size {expected}, vector has length {found}")]
    DimensionMismatch {
        /// Operator size.
        expected: usize,
        /// Offending vector length.
        found: usize,
    },

    /// The search direction lost positive curvature; the operator is not
    /// symmetric positive definite.
    #[error("breakdown at step {step}: operator is not positive definite")]
    Breakdown {
        /// Step at which the breakdown was detected.
        step: usize,
    },
}
