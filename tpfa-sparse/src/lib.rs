//! Sparse iterative solvers for the linear systems produced by `tpfa`.
//!
//! The Krylov methods in [`cg`] and [`bicgstab`] work with anything implementing
//! [`LinearOperator`], which includes [`CsrMatrix`] and the [`Ilu0`](ilu::Ilu0) preconditioner.
//! For configuration by name and string-keyed parameters, see [`solver::Solver`].
use core::fmt;
use nalgebra::{DVectorView, RealField, Scalar};
use num::Zero;
use std::error::Error;

pub mod bicgstab;
pub mod cg;
pub mod ilu;
pub mod operator;
pub mod solver;

mod setup;

pub use nalgebra_sparse::{CooMatrix, CsrMatrix};
pub use operator::{IdentityOperator, LinearOperator};

/// Snapshot of an iterative solve handed to a [`StoppingCriterion`].
#[derive(Debug)]
pub struct IterationState<'a, T: Scalar> {
    /// Number of updates made to the solution so far.
    pub iteration: usize,
    pub rhs_norm: T,
    /// The residual as tracked by the Krylov recurrence.
    pub residual: DVectorView<'a, T>,
    pub solution: DVectorView<'a, T>,
}

pub trait StoppingCriterion<T: Scalar> {
    fn is_satisfied(&self, state: &IterationState<T>) -> Result<bool, Box<dyn Error>>;
}

/// Accepts the iterate once `||r|| <= absolute` or `||r|| <= relative * ||b||`.
///
/// `r` is the recursively updated residual, which may drift from `b - Ax` on
/// ill-conditioned systems.
#[derive(Debug, Clone)]
pub struct ResidualCriterion<T: Scalar> {
    absolute: T,
    relative: T,
}

impl<T: Scalar + Zero> ResidualCriterion<T> {
    pub fn new(absolute: T, relative: T) -> Self {
        Self { absolute, relative }
    }

    pub fn relative(tol: T) -> Self {
        Self::new(T::zero(), tol)
    }
}

impl Default for ResidualCriterion<f64> {
    fn default() -> Self {
        Self::new(1e-14, 1e-10)
    }
}

impl<T: RealField> StoppingCriterion<T> for ResidualCriterion<T> {
    fn is_satisfied(&self, state: &IterationState<T>) -> Result<bool, Box<dyn Error>> {
        let residual_norm = state.residual.norm();
        let relative_bound = self.relative.clone() * state.rhs_norm.clone();
        Ok(residual_norm <= self.absolute || residual_norm <= relative_bound)
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SolveErrorKind {
    OperatorError(Box<dyn Error>),
    PreconditionerError(Box<dyn Error>),
    StoppingCriterionError(Box<dyn Error>),
    /// `p^T A p <= 0` for a search direction `p`.
    IndefiniteOperator,
    IndefinitePreconditioner,
    /// A recurrence coefficient of BiCGStab became zero.
    Breakdown(&'static str),
    MaxIterationsReached { max_iter: usize },
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorError(err) => write!(f, "applying the operator failed: {}", err),
            Self::PreconditionerError(err) => write!(f, "applying the preconditioner failed: {}", err),
            Self::StoppingCriterionError(err) => write!(f, "stopping criterion failed: {}", err),
            Self::IndefiniteOperator => write!(f, "operator is not positive definite"),
            Self::IndefinitePreconditioner => write!(f, "preconditioner is not positive definite"),
            Self::Breakdown(coefficient) => write!(f, "breakdown, {} is zero", coefficient),
            Self::MaxIterationsReached { max_iter } => {
                write!(f, "Max iterations ({}) reached without convergence", max_iter)
            }
        }
    }
}

/// A failed solve together with the progress made before the failure.
#[non_exhaustive]
#[derive(Debug)]
pub struct SolveError<T> {
    pub output: SolverOutput<T>,
    pub kind: SolveErrorKind,
}

impl<T> SolveError<T> {
    pub(crate) fn new(output: SolverOutput<T>, kind: SolveErrorKind) -> Self {
        Self { output, kind }
    }
}

impl<T> fmt::Display for SolveError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} after {} iterations", self.kind, self.output.num_iterations)
    }
}

impl<T: fmt::Debug> Error for SolveError<T> {}

#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct SolverOutput<T> {
    /// Number of updates made to the solution vector.
    pub num_iterations: usize,
    /// Norm of the recursively updated residual after the last update.
    pub residual_norm: T,
}

impl<T: Zero> SolverOutput<T> {
    pub(crate) fn new() -> Self {
        Self {
            num_iterations: 0,
            residual_norm: T::zero(),
        }
    }
}
