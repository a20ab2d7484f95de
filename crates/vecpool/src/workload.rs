//! Repeated conjugate-gradient solves against one allocation strategy.

use std::mem::size_of;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use tracing::info;

use vecpool_memory::{
    registry, AllocatorStats, DirectAllocator, PoolOptions, PoolSnapshot, PooledAllocator,
    VectorAllocator,
};
use vecpool_solver::{
    ConjugateGradient, IdentityPreconditioner, InnerSolve, Laplacian1d, SolveReport,
    SolverControl, SolverError,
};

use crate::config::{AllocatorKind, AppConfig};

/// A validated description of the work to run.
#[derive(Debug, Clone, Serialize)]
pub struct Workload {
    /// Unknowns per solve.
    pub size: usize,
    /// Solves per strategy.
    pub solves: usize,
    /// Worker threads.
    pub threads: usize,
    /// Precondition with an inner solve.
    pub nested: bool,
    /// Outer (and inner) iteration control.
    pub control: SolverControl,
    /// Options for every pooled allocator created.
    pub pool_options: PoolOptions,
}

/// Aggregated outcome of one strategy.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    /// Allocator that was run.
    pub strategy: AllocatorKind,
    /// Wall-clock time for all solves.
    #[serde(skip)]
    pub elapsed: Duration,
    /// `elapsed` in milliseconds.
    pub elapsed_ms: f64,
    /// Outer CG iterations summed over all solves.
    pub total_steps: usize,
    /// Largest final residual among the solves.
    pub max_residual: f64,
    /// Vectors handed out, summed over every allocator instance.
    pub allocations: u64,
    /// Largest `memory_consumption` reported by an allocator.
    pub peak_memory: usize,
    /// Shared pool state after the run (pooled strategy only).
    pub pool: Option<PoolSnapshot>,
}

/// Everything the `vecpool` binary reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// The workload that was run.
    pub workload: Workload,
    /// One entry per strategy, in run order.
    pub strategies: Vec<StrategyReport>,
    /// Pooled vectors destroyed by the final trim, if requested.
    pub trimmed: Option<usize>,
}

struct SolveOutcome {
    report: SolveReport,
    stats: AllocatorStats,
    memory: usize,
}

impl Workload {
    /// Build a workload from validated CLI flags.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            size: config.size,
            solves: config.solves,
            threads: config.threads,
            nested: config.nested,
            control: SolverControl::new(config.max_steps, config.tolerance).normalize(),
            pool_options: PoolOptions::default()
                .initial_size(config.initial_size)
                .log_statistics(config.log_statistics),
        })
    }

    /// Run every solve with `strategy`.
    pub fn run(&self, strategy: AllocatorKind) -> Result<StrategyReport> {
        let start = Instant::now();
        let outcomes = if self.threads > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()
                .context("failed to create thread pool")?;
            pool.install(|| {
                use rayon::iter::{IntoParallelIterator, ParallelIterator};
                (0..self.solves)
                    .into_par_iter()
                    .map(|_| self.solve_once(strategy))
                    .collect::<Result<Vec<_>, _>>()
            })?
        } else {
            (0..self.solves)
                .map(|_| self.solve_once(strategy))
                .collect::<Result<Vec<_>, _>>()?
        };
        let elapsed = start.elapsed();

        let pool = match strategy {
            AllocatorKind::Pooled => Some(registry::pool_for::<Vec<f64>>().snapshot()),
            AllocatorKind::Direct => None,
        };
        let report = StrategyReport {
            strategy,
            elapsed,
            elapsed_ms: elapsed.as_secs_f64() * 1e3,
            total_steps: outcomes.iter().map(|o| o.report.steps).sum(),
            max_residual: outcomes
                .iter()
                .map(|o| o.report.residual)
                .fold(0.0, f64::max),
            allocations: outcomes.iter().map(|o| o.stats.total_allocated).sum(),
            peak_memory: outcomes.iter().map(|o| o.memory).max().unwrap_or(0),
            pool,
        };
        info!(
            ?strategy,
            solves = self.solves,
            allocations = report.allocations,
            elapsed_ms = report.elapsed_ms,
            "workload finished"
        );
        Ok(report)
    }

    /// One solve with a freshly created allocator, as a solver called
    /// repeatedly from an outer loop would do.
    fn solve_once(&self, strategy: AllocatorKind) -> Result<SolveOutcome, SolverError> {
        match strategy {
            AllocatorKind::Pooled => {
                let memory = PooledAllocator::<Vec<f64>>::with_options(self.pool_options.clone());
                let report = self.solve_with(&memory)?;
                Ok(SolveOutcome {
                    report,
                    stats: memory.stats(),
                    memory: memory.memory_consumption(),
                })
            }
            AllocatorKind::Direct => {
                let memory = DirectAllocator::<Vec<f64>>::new();
                let report = self.solve_with(&memory)?;
                // Direct keeps nothing between requests; its footprint is the
                // live vectors at peak.
                let live = 4 * (size_of::<Vec<f64>>() + self.size * size_of::<f64>());
                Ok(SolveOutcome {
                    report,
                    stats: memory.stats(),
                    memory: memory.memory_consumption() + live,
                })
            }
        }
    }

    fn solve_with(
        &self,
        memory: &dyn VectorAllocator<Vec<f64>>,
    ) -> Result<SolveReport, SolverError> {
        let operator = Laplacian1d::new(self.size);
        let solver = ConjugateGradient::new(self.control, memory);
        let rhs = vec![1.0; self.size];
        let mut x = vec![0.0; self.size];
        if self.nested {
            let inner = InnerSolve::new(&operator, self.control, memory);
            solver.solve(&operator, &mut x, &rhs, &inner)
        } else {
            solver.solve(&operator, &mut x, &rhs, &IdentityPreconditioner)
        }
    }
}

/// Run every requested strategy, then trim if asked.
pub fn run_all(config: &AppConfig) -> Result<RunReport> {
    let workload = Workload::from_config(config)?;
    let strategies = config
        .strategy
        .expand()
        .iter()
        .map(|&strategy| workload.run(strategy))
        .collect::<Result<Vec<_>>>()?;
    let trimmed = config
        .trim
        .then(PooledAllocator::<Vec<f64>>::release_unused_memory);
    Ok(RunReport {
        workload,
        strategies,
        trimmed,
    })
}
