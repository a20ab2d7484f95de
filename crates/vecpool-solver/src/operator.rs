//! Linear operators and preconditioners.

use vecpool_memory::VectorAllocator;

use crate::cg::ConjugateGradient;
use crate::control::SolverControl;
use crate::error::SolverError;

/// A square linear operator applied without storing a matrix.
pub trait LinearOperator: Send + Sync {
    /// Number of rows (and columns).
    fn size(&self) -> usize;

    /// `dst = A * src`. Both slices have length [`size`](Self::size).
    fn vmult(&self, dst: &mut [f64], src: &[f64]);
}

/// Approximate inverse applied to the residual in preconditioned CG.
pub trait Preconditioner: Send + Sync {
    /// `dst = P^-1 * src`.
    fn apply(&self, dst: &mut [f64], src: &[f64]) -> Result<(), SolverError>;
}

/// The tridiagonal `(-1, 2, -1)` operator of a 1D Poisson problem with
/// homogeneous Dirichlet boundaries.
#[derive(Debug, Clone, Copy)]
pub struct Laplacian1d {
    n: usize,
}

impl Laplacian1d {
    /// Operator on `n` interior unknowns.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl LinearOperator for Laplacian1d {
    fn size(&self) -> usize {
        self.n
    }

    fn vmult(&self, dst: &mut [f64], src: &[f64]) {
        let n = self.n;
        for i in 0..n {
            let left = if i > 0 { src[i - 1] } else { 0.0 };
            let right = if i + 1 < n { src[i + 1] } else { 0.0 };
            dst[i] = 2.0 * src[i] - left - right;
        }
    }
}

/// No preconditioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, dst: &mut [f64], src: &[f64]) -> Result<(), SolverError> {
        dst.copy_from_slice(src);
        Ok(())
    }
}

/// Preconditioner that runs an inner CG solve on an operator.
///
/// Every application is a complete solve with its own temporaries, which is
/// where allocating from a pool pays off. An inner solve that stops at its
/// iteration limit still yields a usable approximation and is not an error.
pub struct InnerSolve<'a, A> {
    operator: &'a A,
    control: SolverControl,
    memory: &'a dyn VectorAllocator<Vec<f64>>,
}

impl<'a, A: LinearOperator> InnerSolve<'a, A> {
    /// Approximate `operator^-1` with CG limited by `control`.
    pub fn new(
        operator: &'a A,
        control: SolverControl,
        memory: &'a dyn VectorAllocator<Vec<f64>>,
    ) -> Self {
        Self {
            operator,
            control,
            memory,
        }
    }
}

impl<A: LinearOperator> Preconditioner for InnerSolve<'_, A> {
    fn apply(&self, dst: &mut [f64], src: &[f64]) -> Result<(), SolverError> {
        dst.fill(0.0);
        let solver = ConjugateGradient::new(self.control, self.memory);
        match solver.solve(self.operator, dst, src, &IdentityPreconditioner) {
            Ok(_) | Err(SolverError::NoConvergence { .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use vecpool_memory::PooledAllocator;

    use super::*;

    #[test]
    fn laplacian_of_constant_is_boundary_only() {
        let op = Laplacian1d::new(4);
        let mut dst = vec![0.0; 4];
        op.vmult(&mut dst, &[1.0; 4]);
        assert_eq!(dst, vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn laplacian_single_unknown() {
        let op = Laplacian1d::new(1);
        let mut dst = vec![0.0];
        op.vmult(&mut dst, &[3.0]);
        assert_eq!(dst, vec![6.0]);
    }

    #[test]
    fn identity_copies() {
        let mut dst = vec![0.0; 3];
        IdentityPreconditioner
            .apply(&mut dst, &[1.0, 2.0, 3.0])
            .unwrap();
        assert_eq!(dst, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn inner_solve_inverts_operator() {
        let op = Laplacian1d::new(8);
        let memory = PooledAllocator::<Vec<f64>>::new();
        let precond = InnerSolve::new(&op, SolverControl::new(100, 1e-12), &memory);

        let src = vec![1.0; 8];
        let mut dst = vec![5.0; 8];
        precond.apply(&mut dst, &src).unwrap();

        let mut back = vec![0.0; 8];
        op.vmult(&mut back, &dst);
        for (a, b) in back.iter().zip(&src) {
            assert!((a - b).abs() < 1e-9);
        }
        assert_eq!(memory.stats().current_allocated, 0);
    }

    #[test]
    fn inner_solve_tolerates_iteration_limit() {
        let op = Laplacian1d::new(50);
        let memory = PooledAllocator::<Vec<f64>>::new();
        let precond = InnerSolve::new(&op, SolverControl::new(2, 1e-14), &memory);
        let mut dst = vec![0.0; 50];
        assert!(precond.apply(&mut dst, &[1.0; 50]).is_ok());
        assert!(dst.iter().any(|x| *x != 0.0));
    }
}
