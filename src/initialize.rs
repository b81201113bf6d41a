//! Initialization of the per-cell and per-face fields of a diffusion problem.
use crate::field::{DenseField, SparseField};
use crate::mesh::{FaceKind, PolyMesh2d, TopologyError};
use crate::problem::{BoundaryCondition, DiffusionProblem};
use crate::tensor::{interface_conductivity, one_sided_transmissibility, DiffusionTensor};
use log::debug;
use nalgebra::{RealField, Scalar, Vector2};

pub const CONCENTRATION: &str = "Concentration";
pub const DIFFUSION_TENSOR: &str = "Diffusion_tensor";
pub const BC_TYPE: &str = "BC_type";
pub const BC_VALUE: &str = "BC_value";
pub const SOURCE: &str = "Source";
pub const CONCENTRATION_ANALYTICAL: &str = "Concentration_analytical";
pub const GLOBAL_INDEX: &str = "Global_Index";
pub const BC_CONDUCTIVITY: &str = "BC_conductivity";

/// Fields of a diffusion problem on a mesh.
///
/// Cell fields have one entry per cell, face fields are sparse and only hold values on
/// boundary faces (`boundary_conditions`) or internal faces (`conductivity`).
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemFields<T: Scalar> {
    /// Size of the global system, equal to the number of cells.
    pub num_unknowns: usize,
    /// Computed solution. Empty until a solve succeeds.
    pub concentration: SparseField<T>,
    pub diffusion_tensor: DenseField<DiffusionTensor<T>>,
    pub source: DenseField<T>,
    pub analytical: DenseField<T>,
    pub global_index: DenseField<usize>,
    pub boundary_conditions: SparseField<BoundaryCondition<T>>,
    pub conductivity: SparseField<T>,
}

impl<T: Scalar> ProblemFields<T> {
    /// The Dirichlet values of the boundary faces, as a face field named `BC_value`.
    pub fn boundary_values(&self) -> SparseField<T> {
        let mut values = SparseField::new(BC_VALUE, self.boundary_conditions.len());
        for (face, condition) in self.boundary_conditions.iter() {
            if let Some(value) = condition.dirichlet_value() {
                values.insert(face, value.clone());
            }
        }
        values
    }
}

/// One-sided transmissibility from the center of `cell` to `face`.
pub fn cell_face_transmissibility<T: RealField>(
    mesh: &PolyMesh2d<T>,
    tensor: &DiffusionTensor<T>,
    cell: usize,
    face: usize,
    normal: &Vector2<T>,
) -> T {
    let dist = mesh.face_barycenter(face) - mesh.cell_barycenter(cell);
    one_sided_transmissibility(&tensor.to_matrix(), normal, &dist)
}

/// Evaluates the problem data on every cell and face of the mesh.
///
/// Global indices are assigned to cells in traversal order. Boundary faces receive the
/// boundary condition of the problem, internal faces the interface conductivity of their two
/// neighbors.
///
/// Returns an error if any face is neither a boundary face nor shared by two distinct cells.
pub fn initialize_fields<T, P>(mesh: &PolyMesh2d<T>, problem: &P) -> Result<ProblemFields<T>, TopologyError>
where
    T: RealField,
    P: ?Sized + DiffusionProblem<T>,
{
    let num_cells = mesh.num_cells();
    let num_faces = mesh.num_faces();

    let mut diffusion_tensor = Vec::with_capacity(num_cells);
    let mut analytical = Vec::with_capacity(num_cells);
    let mut source = Vec::with_capacity(num_cells);
    let mut global_index = Vec::with_capacity(num_cells);

    let mut next_index = 0;
    for cell in 0..num_cells {
        let x = mesh.cell_barycenter(cell);
        diffusion_tensor.push(problem.diffusion_tensor(&x));
        analytical.push(problem.analytical_solution(&x));
        source.push(problem.source(&x));
        global_index.push(next_index);
        next_index += 1;
    }

    let mut boundary_conditions = SparseField::new(BC_TYPE, num_faces);
    let mut conductivity = SparseField::new(BC_CONDUCTIVITY, num_faces);
    for face in 0..num_faces {
        match mesh.classify_face(face)? {
            FaceKind::Boundary { .. } => {
                let x = mesh.face_barycenter(face);
                boundary_conditions.insert(face, problem.boundary_condition(&x));
            }
            FaceKind::Internal { back, front } => {
                let normal = mesh.face_unit_normal(face)?;
                let tf_back =
                    cell_face_transmissibility(mesh, &diffusion_tensor[back], back, face, &normal);
                let tf_front =
                    cell_face_transmissibility(mesh, &diffusion_tensor[front], front, face, &normal);
                conductivity.insert(face, interface_conductivity(tf_back, tf_front));
            }
        }
    }

    debug!(
        "Initialized {} cells, {} boundary faces and {} internal faces",
        next_index,
        boundary_conditions.num_entries(),
        conductivity.num_entries()
    );

    Ok(ProblemFields {
        num_unknowns: next_index,
        concentration: SparseField::new(CONCENTRATION, num_cells),
        diffusion_tensor: DenseField::from_values(DIFFUSION_TENSOR, diffusion_tensor),
        source: DenseField::from_values(SOURCE, source),
        analytical: DenseField::from_values(CONCENTRATION_ANALYTICAL, analytical),
        global_index: DenseField::from_values(GLOBAL_INDEX, global_index),
        boundary_conditions,
        conductivity,
    })
}
