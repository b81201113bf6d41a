//! Assembly of the global two-point flux approximation system.
use crate::initialize::{cell_face_transmissibility, ProblemFields};
use crate::mesh::{FaceKind, PolyMesh2d, TopologyError};
use crate::problem::BoundaryCondition;
use log::debug;
use nalgebra::{DVector, RealField};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    Topology(TopologyError),
    /// A boundary face without a stored boundary condition.
    MissingBoundaryCondition { face: usize },
    /// An internal face without a stored interface conductivity.
    MissingConductivity { face: usize },
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topology(err) => write!(f, "invalid mesh topology: {}", err),
            Self::MissingBoundaryCondition { face } => {
                write!(f, "boundary face {} has no boundary condition", face)
            }
            Self::MissingConductivity { face } => {
                write!(f, "internal face {} has no interface conductivity", face)
            }
        }
    }
}

impl Error for AssemblyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Topology(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TopologyError> for AssemblyError {
    fn from(err: TopologyError) -> Self {
        Self::Topology(err)
    }
}

/// Assembles the global matrix and right-hand side from initialized fields.
///
/// Faces are visited first:
///
/// - a Dirichlet face with one-sided transmissibility $t$, area $A$ and value $g$ subtracts
///   $t A$ from the diagonal entry of its cell and $t g A$ from the right-hand side,
/// - a Neumann face contributes nothing,
/// - an internal face with conductivity $t$ and area $A$ adds $t A$ to the two diagonal
///   entries of its neighbors and subtracts $t A$ from the two coupling entries.
///
/// Afterwards, $f_i |K_i|$ is subtracted from the right-hand side of every cell $K_i$.
///
/// Every diagonal entry is part of the sparsity pattern, also if it is zero.
pub fn assemble_global_system<T>(
    mesh: &PolyMesh2d<T>,
    fields: &ProblemFields<T>,
) -> Result<(CsrMatrix<T>, DVector<T>), AssemblyError>
where
    T: RealField,
{
    let n = fields.num_unknowns;
    let mut coo = CooMatrix::new(n, n);
    let mut rhs = DVector::zeros(n);
    let id = |cell: usize| fields.global_index[cell];

    for i in 0..n {
        coo.push(i, i, T::zero());
    }

    let mut num_skipped = 0;
    for face in 0..mesh.num_faces() {
        let area = mesh.face_area(face);
        match mesh.classify_face(face)? {
            FaceKind::Boundary { cell } => {
                let condition = fields
                    .boundary_conditions
                    .get(face)
                    .ok_or(AssemblyError::MissingBoundaryCondition { face })?;
                match condition {
                    BoundaryCondition::Dirichlet(value) => {
                        let normal = mesh.face_unit_normal(face)?;
                        let t = cell_face_transmissibility(
                            mesh,
                            &fields.diffusion_tensor[cell],
                            cell,
                            face,
                            &normal,
                        );
                        let i = id(cell);
                        let t_area = t * area;
                        coo.push(i, i, -t_area.clone());
                        rhs[i] -= t_area * value.clone();
                    }
                    BoundaryCondition::Neumann => num_skipped += 1,
                }
            }
            FaceKind::Internal { back, front } => {
                let t = fields
                    .conductivity
                    .get(face)
                    .cloned()
                    .ok_or(AssemblyError::MissingConductivity { face })?;
                let (a, b) = (id(back), id(front));
                let t_area = t * area;
                coo.push(a, a, t_area.clone());
                coo.push(b, b, t_area.clone());
                coo.push(a, b, -t_area.clone());
                coo.push(b, a, -t_area);
            }
        }
    }

    for cell in 0..mesh.num_cells() {
        let i = id(cell);
        rhs[i] -= fields.source[cell].clone() * mesh.cell_volume(cell);
    }

    if num_skipped > 0 {
        debug!("Skipped {} Neumann faces during assembly", num_skipped);
    }

    Ok((CsrMatrix::from(&coo), rhs))
}
