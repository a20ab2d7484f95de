//! Preconditioned conjugate-gradient method.

use serde::Serialize;
use tracing::debug;

use vecpool_memory::{ScopedVector, VectorAllocator};

use crate::control::SolverControl;
use crate::error::SolverError;
use crate::operator::{LinearOperator, Preconditioner};
use crate::vector_ops::{axpy, dot, norm, reset, xpby};

/// Outcome of a converged solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolveReport {
    /// Iterations performed.
    pub steps: usize,
    /// Final residual norm.
    pub residual: f64,
}

/// Conjugate-gradient solver for symmetric positive definite operators.
///
/// The residual, search direction, preconditioned residual, and operator
/// product are scoped vectors from `memory`, returned on every exit path.
pub struct ConjugateGradient<'a> {
    control: SolverControl,
    memory: &'a dyn VectorAllocator<Vec<f64>>,
}

impl<'a> ConjugateGradient<'a> {
    /// Create a solver drawing its temporaries from `memory`.
    pub fn new(control: SolverControl, memory: &'a dyn VectorAllocator<Vec<f64>>) -> Self {
        Self { control, memory }
    }

    /// Solve `A x = b`, starting from the current contents of `x`.
    pub fn solve<A, P>(
        &self,
        operator: &A,
        x: &mut [f64],
        b: &[f64],
        preconditioner: &P,
    ) -> Result<SolveReport, SolverError>
    where
        A: LinearOperator + ?Sized,
        P: Preconditioner + ?Sized,
    {
        let n = operator.size();
        for len in [x.len(), b.len()] {
            if len != n {
                return Err(SolverError::DimensionMismatch {
                    expected: n,
                    found: len,
                });
            }
        }

        // Pooled vectors come back with stale contents; size and zero them.
        let mut r = ScopedVector::new(self.memory);
        let mut z = ScopedVector::new(self.memory);
        let mut p = ScopedVector::new(self.memory);
        let mut q = ScopedVector::new(self.memory);
        for v in [&mut r, &mut z, &mut p, &mut q] {
            reset(v, n);
        }

        // r = b - A x
        operator.vmult(&mut r, x);
        xpby(&mut r, b, -1.0);

        let mut residual = norm(&r);
        if residual <= self.control.tolerance {
            debug!(n, residual, "CG converged at initial guess");
            return Ok(SolveReport { steps: 0, residual });
        }

        preconditioner.apply(&mut z, &r)?;
        p.copy_from_slice(&z);
        let mut rho = dot(&r, &z);

        for step in 1..=self.control.max_steps {
            operator.vmult(&mut q, &p);
            let curvature = dot(&p, &q);
            if curvature <= 0.0 || !curvature.is_finite() {
                return Err(SolverError::Breakdown { step });
            }
            let alpha = rho / curvature;
            axpy(x, alpha, &p);
            axpy(&mut r, -alpha, &q);

            residual = norm(&r);
            if residual <= self.control.tolerance {
                debug!(n, steps = step, residual, "CG converged");
                return Ok(SolveReport {
                    steps: step,
                    residual,
                });
            }

            preconditioner.apply(&mut z, &r)?;
            let rho_next = dot(&r, &z);
            xpby(&mut p, &z, rho_next / rho);
            rho = rho_next;
        }

        debug!(n, steps = self.control.max_steps, residual, "CG did not converge");
        Err(SolverError::NoConvergence {
            steps: self.control.max_steps,
            residual,
        })
    }
}
