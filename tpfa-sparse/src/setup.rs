use crate::{IdentityOperator, IterationState, LinearOperator, SolveErrorKind, StoppingCriterion};
use nalgebra::{DVectorView, DVectorViewMut, Scalar};

/// Operator, preconditioner and termination settings of a Krylov method.
///
/// `()` marks an operator or stopping criterion that has not been provided yet.
#[derive(Debug)]
pub(crate) struct Setup<A, P, Criterion> {
    pub(crate) operator: A,
    pub(crate) preconditioner: P,
    pub(crate) criterion: Criterion,
    pub(crate) max_iter: Option<usize>,
}

impl Setup<(), IdentityOperator, ()> {
    pub(crate) fn new() -> Self {
        Self {
            operator: (),
            preconditioner: IdentityOperator,
            criterion: (),
            max_iter: None,
        }
    }
}

impl<A, P, Criterion> Setup<A, P, Criterion> {
    pub(crate) fn replace_operator<A2>(self, operator: A2) -> Setup<A2, P, Criterion> {
        let Setup {
            preconditioner,
            criterion,
            max_iter,
            ..
        } = self;
        Setup {
            operator,
            preconditioner,
            criterion,
            max_iter,
        }
    }

    pub(crate) fn replace_preconditioner<P2>(self, preconditioner: P2) -> Setup<A, P2, Criterion> {
        let Setup {
            operator,
            criterion,
            max_iter,
            ..
        } = self;
        Setup {
            operator,
            preconditioner,
            criterion,
            max_iter,
        }
    }

    pub(crate) fn replace_criterion<C2>(self, criterion: C2) -> Setup<A, P, C2> {
        let Setup {
            operator,
            preconditioner,
            max_iter,
            ..
        } = self;
        Setup {
            operator,
            preconditioner,
            criterion,
            max_iter,
        }
    }

    /// `y = A x`
    pub(crate) fn apply_operator<'b, T>(
        &self,
        y: impl Into<DVectorViewMut<'b, T>>,
        x: impl Into<DVectorView<'b, T>>,
    ) -> Result<(), SolveErrorKind>
    where
        T: Scalar,
        A: LinearOperator<T>,
    {
        self.operator
            .apply(y.into(), x.into())
            .map_err(SolveErrorKind::OperatorError)
    }

    /// `y = P x`
    pub(crate) fn apply_preconditioner<'b, T>(
        &self,
        y: impl Into<DVectorViewMut<'b, T>>,
        x: impl Into<DVectorView<'b, T>>,
    ) -> Result<(), SolveErrorKind>
    where
        T: Scalar,
        P: LinearOperator<T>,
    {
        self.preconditioner
            .apply(y.into(), x.into())
            .map_err(SolveErrorKind::PreconditionerError)
    }

    pub(crate) fn criterion_satisfied<T>(&self, state: &IterationState<T>) -> Result<bool, SolveErrorKind>
    where
        T: Scalar,
        Criterion: StoppingCriterion<T>,
    {
        self.criterion
            .is_satisfied(state)
            .map_err(SolveErrorKind::StoppingCriterionError)
    }

    /// Like [`Self::criterion_satisfied`], but an unconverged state at the iteration limit
    /// is an error.
    pub(crate) fn has_converged<T>(&self, state: &IterationState<T>) -> Result<bool, SolveErrorKind>
    where
        T: Scalar,
        Criterion: StoppingCriterion<T>,
    {
        if self.criterion_satisfied(state)? {
            return Ok(true);
        }
        match self.max_iter {
            Some(max_iter) if state.iteration >= max_iter => Err(SolveErrorKind::MaxIterationsReached { max_iter }),
            _ => Ok(false),
        }
    }
}
