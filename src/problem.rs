//! Data of the steady diffusion equation $-\nabla \cdot (D \nabla C) = f$.
use crate::field::FieldValue;
use crate::tensor::DiffusionTensor;
use nalgebra::{Point2, RealField};
use serde::{Deserialize, Serialize};

/// Boundary condition stored on a boundary face.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BoundaryCondition<T> {
    /// Prescribed value of the solution.
    Dirichlet(T),
    /// Prescribed flux. Neumann faces do not contribute to the assembled system.
    Neumann,
}

impl<T> BoundaryCondition<T> {
    /// Integer code of the condition kind as stored in the `BC_type` field.
    pub fn type_code(&self) -> i32 {
        match self {
            BoundaryCondition::Dirichlet(_) => 1,
            BoundaryCondition::Neumann => 2,
        }
    }

    pub fn dirichlet_value(&self) -> Option<&T> {
        match self {
            BoundaryCondition::Dirichlet(value) => Some(value),
            BoundaryCondition::Neumann => None,
        }
    }
}

impl<T> FieldValue for BoundaryCondition<T> {
    fn num_components() -> usize {
        1
    }

    fn write_components(&self, components: &mut Vec<f64>) {
        components.push(f64::from(self.type_code()));
    }
}

/// A diffusion problem with known analytical solution.
pub trait DiffusionProblem<T: RealField> {
    fn diffusion_tensor(&self, x: &Point2<T>) -> DiffusionTensor<T>;

    fn analytical_solution(&self, x: &Point2<T>) -> T;

    /// The forcing term $f$.
    fn source(&self, x: &Point2<T>) -> T;

    /// Condition imposed on a boundary face with barycenter `x`.
    ///
    /// Defaults to the analytical solution as Dirichlet value.
    fn boundary_condition(&self, x: &Point2<T>) -> BoundaryCondition<T> {
        BoundaryCondition::Dirichlet(self.analytical_solution(x))
    }
}

/// Manufactured solution $C(x, y) = \sin(a x) \sin(a y)$ with a constant diffusion tensor.
///
/// The source term is
/// $f = -a^2 \left(2 D_{xy} \cos(a x) \cos(a y) - (D_{xx} + D_{yy}) \sin(a x) \sin(a y)\right)$.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SineProblem {
    pub dxx: f64,
    pub dyy: f64,
    pub dxy: f64,
    /// Wave number $a$.
    pub a: f64,
}

impl Default for SineProblem {
    fn default() -> Self {
        Self {
            dxx: 1.0,
            dyy: 1.0,
            dxy: 0.0,
            a: 10.0,
        }
    }
}

impl SineProblem {
    fn coordinates<T: RealField>(x: &Point2<T>) -> (f64, f64) {
        let to_f64 = |v: &T| v.to_subset().unwrap_or(f64::NAN);
        (to_f64(&x.x), to_f64(&x.y))
    }

    fn from_f64<T: RealField>(value: f64) -> T {
        T::from_f64(value).expect("f64 must fit in T")
    }
}

impl<T: RealField> DiffusionProblem<T> for SineProblem {
    fn diffusion_tensor(&self, _x: &Point2<T>) -> DiffusionTensor<T> {
        DiffusionTensor::new(
            Self::from_f64(self.dxx),
            Self::from_f64(self.dyy),
            Self::from_f64(self.dxy),
        )
    }

    fn analytical_solution(&self, x: &Point2<T>) -> T {
        let (x, y) = Self::coordinates(x);
        Self::from_f64((self.a * x).sin() * (self.a * y).sin())
    }

    fn source(&self, x: &Point2<T>) -> T {
        let (x, y) = Self::coordinates(x);
        let a = self.a;
        let (sx, cx) = (a * x).sin_cos();
        let (sy, cy) = (a * y).sin_cos();
        Self::from_f64(-a * a * (2.0 * self.dxy * cx * cy - (self.dxx + self.dyy) * sx * sy))
    }
}
