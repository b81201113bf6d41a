//! Incomplete LU factorization with zero fill-in.
use crate::LinearOperator;
use core::fmt;
use nalgebra::{DVectorView, DVectorViewMut, RealField, Scalar};
use nalgebra_sparse::CsrMatrix;
use std::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IluError {
    NotSquare { nrows: usize, ncols: usize },
    MissingDiagonal { row: usize },
    ZeroPivot { row: usize },
}

impl fmt::Display for IluError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSquare { nrows, ncols } => {
                write!(f, "cannot factor non-square {}x{} matrix", nrows, ncols)
            }
            Self::MissingDiagonal { row } => {
                write!(f, "diagonal entry of row {} is not in the sparsity pattern", row)
            }
            Self::ZeroPivot { row } => write!(f, "zero pivot encountered in row {}", row),
        }
    }
}

impl Error for IluError {}

/// ILU(0) factors `L U ≈ A` stored in the sparsity pattern of `A`.
///
/// `L` is unit lower triangular (its diagonal is implicit), `U` is upper triangular.
/// Used as a [`LinearOperator`], it applies the preconditioner `(LU)^{-1}`.
#[derive(Debug, Clone)]
pub struct Ilu0<T> {
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<T>,
    diagonal: Vec<usize>,
}

impl<T: RealField> Ilu0<T> {
    pub fn factor(matrix: &CsrMatrix<T>) -> Result<Self, IluError> {
        Self::factor_with_drop_tolerance(matrix, T::zero())
    }

    /// Factor `matrix`, discarding off-diagonal factor entries whose magnitude is below
    /// `drop_tolerance` times the norm of the corresponding row of `matrix`.
    ///
    /// A drop tolerance of zero gives plain ILU(0).
    pub fn factor_with_drop_tolerance(matrix: &CsrMatrix<T>, drop_tolerance: T) -> Result<Self, IluError> {
        let (nrows, ncols) = (matrix.nrows(), matrix.ncols());
        if nrows != ncols {
            return Err(IluError::NotSquare { nrows, ncols });
        }

        let row_offsets = matrix.row_offsets().to_vec();
        let col_indices = matrix.col_indices().to_vec();
        let mut values = matrix.values().to_vec();

        let mut diagonal = Vec::with_capacity(nrows);
        for i in 0..nrows {
            let row_cols = &col_indices[row_offsets[i]..row_offsets[i + 1]];
            let local = row_cols
                .binary_search(&i)
                .map_err(|_| IluError::MissingDiagonal { row: i })?;
            diagonal.push(row_offsets[i] + local);
        }

        for i in 0..nrows {
            let (row_begin, row_end) = (row_offsets[i], row_offsets[i + 1]);
            let row_norm = values[row_begin..row_end]
                .iter()
                .fold(T::zero(), |acc, v| acc + v.clone() * v.clone())
                .sqrt();

            for ik in row_begin..diagonal[i] {
                let k = col_indices[ik];
                let pivot = values[diagonal[k]].clone();
                if pivot == T::zero() {
                    return Err(IluError::ZeroPivot { row: k });
                }
                let l_ik = values[ik].clone() / pivot;
                values[ik] = l_ik.clone();

                // a_ij <- a_ij - l_ik * u_kj for every j > k present in both rows
                for kj in diagonal[k] + 1..row_offsets[k + 1] {
                    let j = col_indices[kj];
                    if let Ok(local) = col_indices[row_begin..row_end].binary_search(&j) {
                        let update = l_ik.clone() * values[kj].clone();
                        values[row_begin + local] -= update;
                    }
                }
            }

            if drop_tolerance > T::zero() {
                let threshold = drop_tolerance.clone() * row_norm;
                for ij in row_begin..row_end {
                    if ij != diagonal[i] && values[ij].clone().abs() < threshold {
                        values[ij] = T::zero();
                    }
                }
            }

            if values[diagonal[i]] == T::zero() {
                return Err(IluError::ZeroPivot { row: i });
            }
        }

        Ok(Self {
            row_offsets,
            col_indices,
            values,
            diagonal,
        })
    }

    pub fn dim(&self) -> usize {
        self.diagonal.len()
    }

    /// Overwrites `x` with `(LU)^{-1} x`.
    pub fn solve_in_place(&self, x: &mut DVectorViewMut<T>) {
        assert_eq!(x.len(), self.dim(), "vector length must match factor dimension");
        let n = self.dim();

        // Forward substitution with unit lower triangular L
        for i in 0..n {
            let mut sum = x[i].clone();
            for ij in self.row_offsets[i]..self.diagonal[i] {
                sum -= self.values[ij].clone() * x[self.col_indices[ij]].clone();
            }
            x[i] = sum;
        }

        // Backward substitution with U
        for i in (0..n).rev() {
            let mut sum = x[i].clone();
            for ij in self.diagonal[i] + 1..self.row_offsets[i + 1] {
                sum -= self.values[ij].clone() * x[self.col_indices[ij]].clone();
            }
            x[i] = sum / self.values[self.diagonal[i]].clone();
        }
    }
}

impl<T> LinearOperator<T> for Ilu0<T>
where
    T: Scalar + RealField,
{
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        if x.len() != self.dim() || y.len() != self.dim() {
            return Err(format!(
                "dimension mismatch: ILU factors of dimension {} applied to vector of length {}",
                self.dim(),
                x.len()
            )
            .into());
        }
        y.copy_from(&x);
        self.solve_in_place(&mut y);
        Ok(())
    }
}
