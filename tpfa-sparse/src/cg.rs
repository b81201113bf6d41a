//! Preconditioned Conjugate Gradient for symmetric positive definite operators.
use crate::setup::Setup;
use crate::{IdentityOperator, IterationState, LinearOperator, SolveError, SolveErrorKind, SolverOutput, StoppingCriterion};
use nalgebra::{DVector, DVectorView, DVectorViewMut, RealField, Scalar};
use num::Zero;

/// Vectors reused across solves.
#[derive(Debug, Clone)]
pub struct CgWorkspace<T: Scalar> {
    residual: DVector<T>,
    preconditioned_residual: DVector<T>,
    direction: DVector<T>,
    operator_direction: DVector<T>,
}

impl<T: Scalar + Zero> Default for CgWorkspace<T> {
    fn default() -> Self {
        let empty = DVector::zeros(0);
        Self {
            residual: empty.clone(),
            preconditioned_residual: empty.clone(),
            direction: empty.clone(),
            operator_direction: empty,
        }
    }
}

impl<T: Scalar + Zero> CgWorkspace<T> {
    fn resize(&mut self, dim: usize) {
        for buffer in [
            &mut self.residual,
            &mut self.preconditioned_residual,
            &mut self.direction,
            &mut self.operator_direction,
        ] {
            buffer.resize_vertically_mut(dim, T::zero());
        }
    }
}

#[derive(Debug)]
enum WorkspaceSlot<'a, T: Scalar> {
    Owned(CgWorkspace<T>),
    Borrowed(&'a mut CgWorkspace<T>),
}

impl<'a, T: Scalar> WorkspaceSlot<'a, T> {
    fn get_mut(&mut self) -> &mut CgWorkspace<T> {
        match self {
            Self::Owned(workspace) => workspace,
            Self::Borrowed(workspace) => &mut **workspace,
        }
    }
}

/// Builder and solver for the preconditioned CG method.
///
/// An operator and a stopping criterion must be supplied before solving. The preconditioner
/// defaults to the identity.
#[derive(Debug)]
pub struct ConjugateGradient<'a, T, A, P, Criterion>
where
    T: Scalar,
{
    workspace: WorkspaceSlot<'a, T>,
    setup: Setup<A, P, Criterion>,
}

impl<'a, T: Scalar + Zero> ConjugateGradient<'a, T, (), IdentityOperator, ()> {
    pub fn new() -> Self {
        Self {
            workspace: WorkspaceSlot::Owned(CgWorkspace::default()),
            setup: Setup::new(),
        }
    }

    /// Uses an external workspace, so that repeated solves avoid reallocation.
    pub fn with_workspace(workspace: &'a mut CgWorkspace<T>) -> Self {
        Self {
            workspace: WorkspaceSlot::Borrowed(workspace),
            setup: Setup::new(),
        }
    }
}

impl<'a, T: Scalar, P, Criterion> ConjugateGradient<'a, T, (), P, Criterion> {
    pub fn with_operator<A>(self, operator: A) -> ConjugateGradient<'a, T, A, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            setup: self.setup.replace_operator(operator),
        }
    }
}

impl<'a, T: Scalar, A, P> ConjugateGradient<'a, T, A, P, ()> {
    pub fn with_stopping_criterion<Criterion>(self, criterion: Criterion) -> ConjugateGradient<'a, T, A, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            setup: self.setup.replace_criterion(criterion),
        }
    }
}

impl<'a, T: Scalar, A, P, Criterion> ConjugateGradient<'a, T, A, P, Criterion> {
    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> ConjugateGradient<'a, T, A, P2, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            setup: self.setup.replace_preconditioner(preconditioner),
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.setup.max_iter = Some(max_iter);
        self
    }
}

impl<'a, T, A, P, Criterion> ConjugateGradient<'a, T, A, P, Criterion>
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
        let setup = &self.setup;
        let workspace = self.workspace.get_mut();
        workspace.resize(x.len());
        let CgWorkspace {
            residual: r,
            preconditioned_residual: z,
            direction: p,
            operator_direction: ap,
        } = workspace;

        let b_norm = b.norm();
        if b_norm == T::zero() {
            x.fill(T::zero());
            return Ok(());
        }

        // r = b - A x
        setup.apply_operator(&mut *r, &*x)?;
        r.zip_apply(&b, |ax_i, b_i| *ax_i = b_i - ax_i.clone());
        output.residual_norm = r.norm();

        setup.apply_preconditioner(&mut *z, &*r)?;
        p.copy_from(&*z);
        let mut z_dot_r = z.dot(&*r);

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

            setup.apply_operator(&mut *ap, &*p)?;
            let p_dot_ap = p.dot(&*ap);
            if p_dot_ap <= T::zero() {
                return Err(SolveErrorKind::IndefiniteOperator);
            }
            if z_dot_r <= T::zero() {
                return Err(SolveErrorKind::IndefinitePreconditioner);
            }

            let alpha = z_dot_r.clone() / p_dot_ap;
            x.axpy(alpha.clone(), &*p, T::one());
            r.axpy(-alpha, &*ap, T::one());
            output.num_iterations += 1;
            output.residual_norm = r.norm();

            setup.apply_preconditioner(&mut *z, &*r)?;
            let z_dot_r_next = z.dot(&*r);
            let beta = z_dot_r_next.clone() / z_dot_r;
            z_dot_r = z_dot_r_next;

            // p = z + beta p
            p.axpy(T::one(), &*z, beta);
        }
    }
}
