//! Error handling and exit codes.

use vecpool_solver::SolverError;

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// A solve reached its iteration limit.
    pub const ERROR_NO_CONVERGENCE: i32 = 2;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
}

/// Invalid command-line configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A count that must be positive was zero.
    #[error("--{0} must be at least 1")]
    Zero(&'static str),

    /// Tolerance is not a positive finite number.
    #[error("--tolerance must be a positive finite number, got {0}")]
    Tolerance(f64),
}

/// Map an application error to the process exit code.
pub fn handle_error(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.downcast_ref::<ConfigError>().is_some() {
            return exit_codes::ERROR_CONFIG;
        }
        if let Some(SolverError::NoConvergence { .. }) = cause.downcast_ref::<SolverError>() {
            return exit_codes::ERROR_NO_CONVERGENCE;
        }
    }
    exit_codes::ERROR_GENERIC
}
