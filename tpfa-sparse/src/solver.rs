//! A solver selected by name and configured through string-keyed parameters.
//!
//! ```
//! use tpfa_sparse::solver::Solver;
//! # use tpfa_sparse::CsrMatrix;
//! # use nalgebra::{DMatrix, DVector};
//! let a = CsrMatrix::from(&DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]));
//! let b = DVector::from_column_slice(&[1.0, 2.0]);
//! let mut x = DVector::zeros(2);
//!
//! let mut solver = Solver::new("bicgstab_ilu0").unwrap();
//! solver.set_parameter("relative_tolerance", "1e-12").unwrap();
//! let report = solver.solve(&a, &b, &mut x);
//! assert!(report.converged);
//! ```
use crate::bicgstab::BiCGStab;
use crate::cg::ConjugateGradient;
use crate::ilu::Ilu0;
use crate::{IdentityOperator, LinearOperator, ResidualCriterion, SolveError, SolverOutput};
use core::fmt;
use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use std::error::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KrylovMethod {
    ConjugateGradient,
    BiCGStab,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PreconditionerKind {
    Identity,
    Ilu0,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverConfigError {
    UnknownSolver(String),
    UnknownParameter(String),
    InvalidValue { key: String, value: String },
}

impl fmt::Display for SolverConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSolver(name) => write!(
                f,
                "unknown solver \"{}\" (available: {})",
                name,
                Solver::AVAILABLE.join(", ")
            ),
            Self::UnknownParameter(key) => write!(f, "unknown solver parameter \"{}\"", key),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value \"{}\" for solver parameter \"{}\"", value, key)
            }
        }
    }
}

impl Error for SolverConfigError {}

/// Outcome of [`Solver::solve`].
///
/// Iteration count and residual are always reported, also when the solve fails.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub converged: bool,
    pub iterations: usize,
    /// Euclidean norm of the true residual `b - Ax` for the returned `x`.
    pub residual: f64,
    /// Human-readable reason for failure. `None` if the solve converged.
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solver {
    name: String,
    method: KrylovMethod,
    preconditioner: PreconditionerKind,
    drop_tolerance: f64,
    absolute_tolerance: f64,
    relative_tolerance: f64,
    maximum_iterations: usize,
}

impl Solver {
    pub const AVAILABLE: [&'static str; 4] = ["cg", "cg_ilu0", "bicgstab", "bicgstab_ilu0"];

    pub fn new(name: &str) -> Result<Self, SolverConfigError> {
        let (method, preconditioner) = match name {
            "cg" => (KrylovMethod::ConjugateGradient, PreconditionerKind::Identity),
            "cg_ilu0" => (KrylovMethod::ConjugateGradient, PreconditionerKind::Ilu0),
            "bicgstab" => (KrylovMethod::BiCGStab, PreconditionerKind::Identity),
            "bicgstab_ilu0" => (KrylovMethod::BiCGStab, PreconditionerKind::Ilu0),
            _ => return Err(SolverConfigError::UnknownSolver(name.to_string())),
        };
        Ok(Self {
            name: name.to_string(),
            method,
            preconditioner,
            drop_tolerance: 0.0,
            absolute_tolerance: 1e-14,
            relative_tolerance: 1e-10,
            maximum_iterations: 10_000,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> KrylovMethod {
        self.method
    }

    pub fn preconditioner(&self) -> PreconditionerKind {
        self.preconditioner
    }

    /// Sets one of `drop_tolerance`, `absolute_tolerance`, `relative_tolerance`
    /// or `maximum_iterations`.
    pub fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), SolverConfigError> {
        let invalid = || SolverConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let parse_tolerance = || -> Result<f64, SolverConfigError> {
            let tol: f64 = value.trim().parse().map_err(|_| invalid())?;
            if tol.is_finite() && tol >= 0.0 {
                Ok(tol)
            } else {
                Err(invalid())
            }
        };
        match key {
            "drop_tolerance" => self.drop_tolerance = parse_tolerance()?,
            "absolute_tolerance" => self.absolute_tolerance = parse_tolerance()?,
            "relative_tolerance" => self.relative_tolerance = parse_tolerance()?,
            "maximum_iterations" => self.maximum_iterations = value.trim().parse().map_err(|_| invalid())?,
            _ => return Err(SolverConfigError::UnknownParameter(key.to_string())),
        }
        Ok(())
    }

    /// Solves `a x = b`, using the contents of `x` as initial guess.
    pub fn solve(&self, a: &CsrMatrix<f64>, b: &DVector<f64>, x: &mut DVector<f64>) -> SolveReport {
        assert_eq!(a.nrows(), b.len(), "matrix and right-hand side dimensions must agree");
        assert_eq!(a.ncols(), x.len(), "matrix and solution dimensions must agree");
        debug!(
            "Solving {}x{} system ({} nnz) with {} (drop tol {:e}, abs tol {:e}, rel tol {:e}, max iter {})",
            a.nrows(),
            a.ncols(),
            a.nnz(),
            self.name,
            self.drop_tolerance,
            self.absolute_tolerance,
            self.relative_tolerance,
            self.maximum_iterations
        );

        let result = match self.preconditioner {
            PreconditionerKind::Identity => self.solve_preconditioned(a, &IdentityOperator, b, x),
            PreconditionerKind::Ilu0 => match Ilu0::factor_with_drop_tolerance(a, self.drop_tolerance) {
                Ok(ilu) => self.solve_preconditioned(a, &ilu, b, x),
                Err(err) => {
                    return SolveReport {
                        converged: false,
                        iterations: 0,
                        residual: true_residual_norm(a, b, x),
                        reason: Some(format!("ILU(0) factorization failed: {}", err)),
                    }
                }
            },
        };

        let residual = true_residual_norm(a, b, x);
        match result {
            Ok(output) => {
                debug!("{} converged in {} iterations", self.name, output.num_iterations);
                SolveReport {
                    converged: true,
                    iterations: output.num_iterations,
                    residual,
                    reason: None,
                }
            }
            Err(err) => SolveReport {
                converged: false,
                iterations: err.output.num_iterations,
                residual,
                reason: Some(err.kind.to_string()),
            },
        }
    }

    fn solve_preconditioned(
        &self,
        a: &CsrMatrix<f64>,
        preconditioner: &dyn LinearOperator<f64>,
        b: &DVector<f64>,
        x: &mut DVector<f64>,
    ) -> Result<SolverOutput<f64>, SolveError<f64>> {
        let criterion = ResidualCriterion::new(self.absolute_tolerance, self.relative_tolerance);
        match self.method {
            KrylovMethod::ConjugateGradient => ConjugateGradient::new()
                .with_operator(a)
                .with_preconditioner(preconditioner)
                .with_stopping_criterion(criterion)
                .with_max_iter(self.maximum_iterations)
                .solve_with_guess(b, x),
            KrylovMethod::BiCGStab => BiCGStab::new()
                .with_operator(a)
                .with_preconditioner(preconditioner)
                .with_stopping_criterion(criterion)
                .with_max_iter(self.maximum_iterations)
                .solve_with_guess(b, x),
        }
    }
}

fn true_residual_norm(a: &CsrMatrix<f64>, b: &DVector<f64>, x: &DVector<f64>) -> f64 {
    let mut ax = DVector::zeros(b.len());
    match a.apply((&mut ax).into(), x.into()) {
        Ok(()) => (b - ax).norm(),
        Err(_) => f64::NAN,
    }
}
