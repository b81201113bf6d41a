use nalgebra::{ClosedAdd, ClosedMul, DMatrix, DVectorView, DVectorViewMut, Scalar};
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::CsrMatrix;
use num::{One, Zero};
use std::error::Error;

/// A square linear map, applied as `y = A x`.
pub trait LinearOperator<T: Scalar> {
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>>;
}

impl<T: Scalar, A: ?Sized + LinearOperator<T>> LinearOperator<T> for &A {
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        (**self).apply(y, x)
    }
}

impl<T> LinearOperator<T> for CsrMatrix<T>
where
    T: Scalar + Zero + One + ClosedMul + ClosedAdd,
{
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        let (nrows, ncols) = (self.nrows(), self.ncols());
        if (nrows, ncols) != (y.len(), x.len()) {
            let message = format!(
                "cannot apply {}x{} matrix to vector of length {} with output of length {}",
                nrows,
                ncols,
                x.len(),
                y.len()
            );
            return Err(message.into());
        }
        spmm_csr_dense(T::zero(), &mut y, T::one(), Op::NoOp(self), Op::NoOp(&x));
        Ok(())
    }
}

impl<T> LinearOperator<T> for DMatrix<T>
where
    T: Scalar + Zero + One + ClosedMul + ClosedAdd,
{
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        if self.shape() != (y.len(), x.len()) {
            return Err(format!("cannot apply {:?} matrix to vector of length {}", self.shape(), x.len()).into());
        }
        y.gemv(T::one(), self, &x, T::zero());
        Ok(())
    }
}

/// The unpreconditioned case.
#[derive(Debug, Copy, Clone, Default)]
pub struct IdentityOperator;

impl<T: Scalar> LinearOperator<T> for IdentityOperator {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        y.copy_from(&x);
        Ok(())
    }
}
