//! Diffusion tensors and two-point transmissibilities.
use nalgebra::{Matrix2, RealField, Scalar, Vector2};
use serde::{Deserialize, Serialize};

/// A symmetric $2 \times 2$ diffusion tensor stored in compact form $(D_{xx}, D_{yy}, D_{xy})$.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffusionTensor<T> {
    pub xx: T,
    pub yy: T,
    pub xy: T,
}

impl<T: Scalar> DiffusionTensor<T> {
    pub fn new(xx: T, yy: T, xy: T) -> Self {
        Self { xx, yy, xy }
    }

    pub fn to_matrix(&self) -> Matrix2<T> {
        Matrix2::new(
            self.xx.clone(),
            self.xy.clone(),
            self.xy.clone(),
            self.yy.clone(),
        )
    }

    /// Compact form `[xx, yy, xy]`, the layout used for the `Diffusion_tensor` field.
    pub fn to_array(&self) -> [T; 3] {
        [self.xx.clone(), self.yy.clone(), self.xy.clone()]
    }
}

impl<T: RealField> DiffusionTensor<T> {
    pub fn isotropic(value: T) -> Self {
        Self::new(value.clone(), value, T::zero())
    }

    /// Builds a tensor from the symmetric part of the given matrix.
    pub fn from_matrix(matrix: &Matrix2<T>) -> Self {
        let two = T::one() + T::one();
        let xy = (matrix[(0, 1)].clone() + matrix[(1, 0)].clone()) / two;
        Self::new(matrix[(0, 0)].clone(), matrix[(1, 1)].clone(), xy)
    }
}

impl<T: Scalar> From<DiffusionTensor<T>> for Matrix2<T> {
    fn from(tensor: DiffusionTensor<T>) -> Self {
        tensor.to_matrix()
    }
}

/// Directional conductance from a cell center to a face.
///
/// Computes $\frac{(D d) \cdot n}{d \cdot d}$, where `d` is the displacement from the cell
/// center to the face barycenter and `n` is the unit normal of the face. The sign follows the
/// orientation of `n` relative to `d`.
///
/// The displacement must not have zero length.
pub fn one_sided_transmissibility<T: RealField>(d: &Matrix2<T>, n: &Vector2<T>, dist: &Vector2<T>) -> T {
    let dist_squared = dist.norm_squared();
    debug_assert!(
        dist_squared > T::zero(),
        "Cell center must not coincide with face barycenter"
    );
    (d * dist).dot(n) / dist_squared
}

/// Combines the one-sided transmissibilities of the back and front cells of a face.
///
/// Evaluates $\frac{t_A t_B}{t_A - t_B}$. With a shared face normal, the displacement from the
/// front cell points against the normal, so `tf_b` has the opposite sign of `tf_a` and the result
/// is the negated harmonic mean $-\frac{|t_A| |t_B|}{|t_A| + |t_B|}$. The assembled system uses
/// the same sign convention for boundary faces.
pub fn interface_conductivity<T: RealField>(tf_a: T, tf_b: T) -> T {
    tf_a.clone() * tf_b.clone() / (tf_a - tf_b)
}
