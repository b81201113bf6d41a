//! Right-preconditioned BiCGStab for general (non-symmetric or indefinite) operators.
use crate::setup::Setup;
use crate::{IdentityOperator, IterationState, LinearOperator, SolveError, SolveErrorKind, SolverOutput, StoppingCriterion};
use nalgebra::{DVector, DVectorView, DVectorViewMut, RealField, Scalar};
use num::Zero;

#[derive(Debug, Clone)]
pub struct BiCGStabWorkspace<T: Scalar> {
    r: DVector<T>,
    r_hat: DVector<T>,
    p: DVector<T>,
    v: DVector<T>,
    s: DVector<T>,
    t: DVector<T>,
    y: DVector<T>,
    z: DVector<T>,
}

impl<T: Scalar + Zero> Default for BiCGStabWorkspace<T> {
    fn default() -> Self {
        let empty = DVector::zeros(0);
        Self {
            r: empty.clone(),
            r_hat: empty.clone(),
            p: empty.clone(),
            v: empty.clone(),
            s: empty.clone(),
            t: empty.clone(),
            y: empty.clone(),
            z: empty,
        }
    }
}

impl<T: Scalar + Zero> BiCGStabWorkspace<T> {
    /// Resizes all vectors to `dim` and zeroes them, since `p` and `v` enter the first
    /// direction update.
    fn reset(&mut self, dim: usize) {
        for buffer in [
            &mut self.r,
            &mut self.r_hat,
            &mut self.p,
            &mut self.v,
            &mut self.s,
            &mut self.t,
            &mut self.y,
            &mut self.z,
        ] {
            buffer.resize_vertically_mut(dim, T::zero());
            buffer.fill(T::zero());
        }
    }
}

/// Builder and solver for BiCGStab, configured like
/// [`ConjugateGradient`](crate::cg::ConjugateGradient).
#[derive(Debug)]
pub struct BiCGStab<T, A, P, Criterion>
where
    T: Scalar,
{
    workspace: BiCGStabWorkspace<T>,
    setup: Setup<A, P, Criterion>,
}

impl<T: Scalar + Zero> BiCGStab<T, (), IdentityOperator, ()> {
    pub fn new() -> Self {
        Self {
            workspace: BiCGStabWorkspace::default(),
            setup: Setup::new(),
        }
    }
}

impl<T: Scalar, P, Criterion> BiCGStab<T, (), P, Criterion> {
    pub fn with_operator<A>(self, operator: A) -> BiCGStab<T, A, P, Criterion> {
        BiCGStab {
            workspace: self.workspace,
            setup: self.setup.replace_operator(operator),
        }
    }
}

impl<T: Scalar, A, P> BiCGStab<T, A, P, ()> {
    pub fn with_stopping_criterion<Criterion>(self, criterion: Criterion) -> BiCGStab<T, A, P, Criterion> {
        BiCGStab {
            workspace: self.workspace,
            setup: self.setup.replace_criterion(criterion),
        }
    }
}

impl<T: Scalar, A, P, Criterion> BiCGStab<T, A, P, Criterion> {
    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> BiCGStab<T, A, P2, Criterion> {
        BiCGStab {
            workspace: self.workspace,
            setup: self.setup.replace_preconditioner(preconditioner),
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.setup.max_iter = Some(max_iter);
        self
    }
}

impl<T, A, P, Criterion> BiCGStab<T, A, P, Criterion>
where
    T: RealField,
    A: LinearOperator<T>,
    P: LinearOperator<T>,
    Criterion: StoppingCriterion<T>,
{
    /// Solves `A x = b`, starting from the current contents of `x`.
    pub fn solve_with_guess<'b>(
        &mut self,
        b: impl Into<DVectorView<'b, T>>,
        x: impl Into<DVectorViewMut<'b, T>>,
    ) -> Result<SolverOutput<T>, SolveError<T>> {
        let (b, mut x) = (b.into(), x.into());
        assert_eq!(b.len(), x.len(), "right-hand side and solution must have equal length");

        let mut output = SolverOutput::new();
        match self.iterate(b, &mut x, &mut output) {
            Ok(()) => Ok(output),
            Err(kind) => Err(SolveError::new(output, kind)),
        }
    }

    fn iterate(
        &mut self,
        b: DVectorView<T>,
        x: &mut DVectorViewMut<T>,
        output: &mut SolverOutput<T>,
    ) -> Result<(), SolveErrorKind> {
        use SolveErrorKind::Breakdown;

        let setup = &self.setup;
        self.workspace.reset(x.len());
        let BiCGStabWorkspace {
            r,
            r_hat,
            p,
            v,
            s,
            t,
            y,
            z,
        } = &mut self.workspace;

        let b_norm = b.norm();
        if b_norm == T::zero() {
            x.fill(T::zero());
            return Ok(());
        }

        // r = b - A x, with the shadow residual fixed to the initial residual
        setup.apply_operator(&mut *r, &*x)?;
        r.zip_apply(&b, |ax_i, b_i| *ax_i = b_i - ax_i.clone());
        r_hat.copy_from(&*r);
        output.residual_norm = r.norm();

        let mut rho = T::one();
        let mut alpha = T::one();
        let mut omega = T::one();

        loop {
            let state = IterationState {
                iteration: output.num_iterations,
                rhs_norm: b_norm.clone(),
                residual: (&*r).into(),
                solution: (&*x).into(),
            };
            if setup.has_converged(&state)? {
                return Ok(());
            }

            let rho_next = r_hat.dot(&*r);
            if rho_next == T::zero() {
                return Err(Breakdown("rho"));
            }
            let beta = (rho_next.clone() / rho) * (alpha.clone() / omega.clone());
            rho = rho_next;

            // p = r + beta (p - omega v)
            p.axpy(-omega.clone(), &*v, T::one());
            p.axpy(T::one(), &*r, beta);

            setup.apply_preconditioner(&mut *y, &*p)?;
            setup.apply_operator(&mut *v, &*y)?;

            let r_hat_dot_v = r_hat.dot(&*v);
            if r_hat_dot_v == T::zero() {
                return Err(Breakdown("r_hat^T v"));
            }
            alpha = rho.clone() / r_hat_dot_v;

            // Half step: s = r - alpha v, x = x + alpha y
            s.copy_from(&*r);
            s.axpy(-alpha.clone(), &*v, T::one());
            x.axpy(alpha.clone(), &*y, T::one());
            output.num_iterations += 1;

            let half_step = IterationState {
                iteration: output.num_iterations,
                rhs_norm: b_norm.clone(),
                residual: (&*s).into(),
                solution: (&*x).into(),
            };
            if setup.criterion_satisfied(&half_step)? {
                r.copy_from(&*s);
                output.residual_norm = r.norm();
                return Ok(());
            }

            setup.apply_preconditioner(&mut *z, &*s)?;
            setup.apply_operator(&mut *t, &*z)?;

            let t_dot_t = t.dot(&*t);
            if t_dot_t == T::zero() {
                return Err(Breakdown("omega"));
            }
            omega = t.dot(&*s) / t_dot_t;
            if omega == T::zero() {
                return Err(Breakdown("omega"));
            }

            // x = x + omega z, r = s - omega t
            x.axpy(omega.clone(), &*z, T::one());
            r.copy_from(&*s);
            r.axpy(-omega.clone(), &*t, T::one());
            output.residual_norm = r.norm();
        }
    }
}
