//! # vecpool-solver
//!
//! Preconditioned conjugate-gradient solver whose auxiliary vectors come
//! from a [`VectorAllocator`](vecpool_memory::VectorAllocator).
//!
//! The operators here are deliberately small: a matrix-free 1D Laplacian and
//! an inner-solve preconditioner, enough to drive the allocator the way
//! nested iterative solvers do.

pub mod cg;
pub mod control;
pub mod error;
pub mod operator;
pub(crate) mod vector_ops;

pub use cg::{ConjugateGradient, SolveReport};
pub use control::SolverControl;
pub use error::SolverError;
pub use operator::{IdentityPreconditioner, InnerSolve, Laplacian1d, LinearOperator, Preconditioner};
