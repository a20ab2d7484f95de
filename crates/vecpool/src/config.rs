//! Application configuration from CLI flags and environment.

use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::errors::ConfigError;

/// Which allocators to run the workload with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Fresh vector per request.
    Direct,
    /// Shared pool with reuse.
    Pooled,
    /// Run both, direct first.
    Both,
}

/// The allocator backing one run of the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocatorKind {
    /// `DirectAllocator`.
    Direct,
    /// `PooledAllocator`.
    Pooled,
}

impl AllocatorKind {
    /// Name used in reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Pooled => "pooled",
        }
    }
}

impl Strategy {
    /// The allocators to run, in order.
    #[must_use]
    pub fn expand(self) -> &'static [AllocatorKind] {
        match self {
            Self::Direct => &[AllocatorKind::Direct],
            Self::Pooled => &[AllocatorKind::Pooled],
            Self::Both => &[AllocatorKind::Direct, AllocatorKind::Pooled],
        }
    }
}

/// vecpool — repeated conjugate-gradient solves with direct or pooled
/// vector allocation.
#[derive(Parser, Debug)]
#[command(name = "vecpool", version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Number of unknowns per solve.
    #[arg(short = 'n', long, default_value = "200", env = "VECPOOL_SIZE")]
    pub size: usize,

    /// Number of independent solves per strategy.
    #[arg(short, long, default_value = "50", env = "VECPOOL_SOLVES")]
    pub solves: usize,

    /// Worker threads; solves run in parallel when greater than 1.
    #[arg(short, long, default_value = "1", env = "VECPOOL_THREADS")]
    pub threads: usize,

    /// Allocation strategy: direct, pooled, or both.
    #[arg(long, value_enum, default_value = "both")]
    pub strategy: Strategy,

    /// Vectors to pre-populate the shared pool with.
    #[arg(long, default_value = "0")]
    pub initial_size: usize,

    /// Log allocator totals when each pooled allocator is dropped.
    #[arg(long)]
    pub log_statistics: bool,

    /// Precondition with an inner CG solve (nested solver workload).
    #[arg(long)]
    pub nested: bool,

    /// Iteration limit per solve.
    #[arg(long, default_value = "1000")]
    pub max_steps: usize,

    /// Absolute residual tolerance.
    #[arg(long, default_value = "1e-10", allow_negative_numbers = true)]
    pub tolerance: f64,

    /// Release unused pooled vectors after the run.
    #[arg(long)]
    pub trim: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Also write the report to this file.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Quiet mode (no report on stdout).
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Reject values the workload cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("size", self.size),
            ("solves", self.solves),
            ("threads", self.threads),
            ("max-steps", self.max_steps),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::Tolerance(self.tolerance));
        }
        Ok(())
    }
}
