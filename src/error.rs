//! Functionality for error estimation.
//!
//! Errors compare the computed cell values $C_{h,i}$ with the analytical solution $C_i$ evaluated
//! at the cell barycenters.
use crate::field::{DenseField, SparseField};
use crate::mesh::PolyMesh2d;
use itertools::izip;
use nalgebra::RealField;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorNorms<T> {
    /// $\max_i |C_{h,i} - C_i|$.
    pub c_norm: T,
    /// $\sum_i |C_{h,i} - C_i| \, |K_i|$.
    pub l2_norm: T,
}

/// Maximum absolute cell error $\max_i |C_{h,i} - C_i|$.
///
/// Returns `None` if some cell has no computed value.
#[allow(non_snake_case)]
pub fn estimate_C_error<T>(computed: &SparseField<T>, analytical: &DenseField<T>) -> Option<T>
where
    T: RealField,
{
    let mut result = T::zero();
    for (i, c) in analytical.iter().enumerate() {
        let diff = (computed.get(i)?.clone() - c.clone()).abs();
        result = result.max(diff);
    }
    Some(result)
}

/// Volume-weighted absolute cell error $\sum_i |C_{h,i} - C_i| \, |K_i|$.
///
/// This is the error measure reported as the L2-norm error.
///
/// Returns `None` if some cell has no computed value.
#[allow(non_snake_case)]
pub fn estimate_L2_error<T>(
    mesh: &PolyMesh2d<T>,
    computed: &SparseField<T>,
    analytical: &DenseField<T>,
) -> Option<T>
where
    T: RealField,
{
    assert_eq!(
        analytical.len(),
        mesh.num_cells(),
        "Analytical field must have one value per cell"
    );
    let mut result = T::zero();
    for (i, c) in analytical.iter().enumerate() {
        let diff = (computed.get(i)?.clone() - c.clone()).abs();
        result += diff * mesh.cell_volume(i);
    }
    Some(result)
}

/// Computes both error norms, or `None` if some cell has no computed value.
pub fn estimate_error_norms<T>(
    mesh: &PolyMesh2d<T>,
    computed: &SparseField<T>,
    analytical: &DenseField<T>,
) -> Option<ErrorNorms<T>>
where
    T: RealField,
{
    Some(ErrorNorms {
        c_norm: estimate_C_error(computed, analytical)?,
        l2_norm: estimate_L2_error(mesh, computed, analytical)?,
    })
}

/// Estimates the order of convergence from errors on successively refined meshes with
/// characteristic sizes `h`.
///
/// Returns one rate per consecutive pair, $\log(e_k / e_{k+1}) / \log(h_k / h_{k+1})$.
pub fn estimate_convergence_rates(h: &[f64], errors: &[f64]) -> Vec<f64> {
    assert_eq!(h.len(), errors.len(), "Number of sizes and errors must match");
    izip!(h.windows(2), errors.windows(2))
        .map(|(h, e)| (e[0] / e[1]).ln() / (h[0] / h[1]).ln())
        .collect()
}
