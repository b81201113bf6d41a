use crate::{mesh_with_overshared_face, two_cell_mesh, AffineProblem};
use matrixcompare::assert_scalar_eq;
use nalgebra::Point2;
use proptest::prelude::*;
use tpfa::field::FieldAttribute;
use tpfa::initialize::{initialize_fields, BC_CONDUCTIVITY, BC_TYPE, BC_VALUE, CONCENTRATION, GLOBAL_INDEX};
use tpfa::mesh::procedural::{create_unit_square_uniform_quad_mesh_2d, create_unit_square_uniform_tri_mesh_2d};
use tpfa::mesh::PolyMesh2d;
use tpfa::problem::{BoundaryCondition, DiffusionProblem, SineProblem};

#[test]
fn two_cell_interface_conductivity() {
    let mesh = two_cell_mesh();
    let fields = initialize_fields(&mesh, &AffineProblem::linear_x()).unwrap();

    assert_eq!(fields.num_unknowns, 2);
    assert_eq!(fields.conductivity.num_entries(), 1);
    let (face, conductivity) = fields.conductivity.iter().next().unwrap();
    assert_scalar_eq!(mesh.face_area(face), 1.0, comp = abs, tol = 1e-14);
    // One-sided transmissibilities are 2 and -2, their harmonic mean is 1
    assert_scalar_eq!(*conductivity, -1.0, comp = abs, tol = 1e-14);
}

#[test]
fn boundary_faces_get_dirichlet_analytical_values() {
    let mesh: PolyMesh2d<f64> = create_unit_square_uniform_tri_mesh_2d(3);
    let problem = SineProblem {
        a: 2.0,
        ..SineProblem::default()
    };
    let fields = initialize_fields(&mesh, &problem).unwrap();

    let boundary_faces = mesh.find_boundary_faces();
    assert_eq!(fields.boundary_conditions.num_entries(), boundary_faces.len());
    for face in boundary_faces {
        let x = mesh.face_barycenter(face);
        let condition = fields.boundary_conditions.get(face).unwrap();
        assert_eq!(condition.type_code(), 1);
        assert_eq!(
            condition,
            &BoundaryCondition::Dirichlet(DiffusionProblem::<f64>::analytical_solution(&problem, &x))
        );
        assert!(!fields.conductivity.contains(face));
    }
    assert_eq!(
        fields.conductivity.num_entries() + fields.boundary_conditions.num_entries(),
        mesh.num_faces()
    );

    let values = fields.boundary_values();
    assert_eq!(values.name(), BC_VALUE);
    assert_eq!(values.num_entries(), fields.boundary_conditions.num_entries());
}

#[test]
fn cell_fields_are_evaluated_at_barycenters() {
    let mesh: PolyMesh2d<f64> = create_unit_square_uniform_quad_mesh_2d(4);
    let problem = SineProblem {
        dxx: 2.0,
        dyy: 0.5,
        dxy: 0.25,
        a: 3.0,
    };
    let fields = initialize_fields(&mesh, &problem).unwrap();

    for cell in 0..mesh.num_cells() {
        let x = mesh.cell_barycenter(cell);
        assert_eq!(fields.analytical[cell], (3.0 * x.x).sin() * (3.0 * x.y).sin());
        assert_eq!(fields.source[cell], DiffusionProblem::<f64>::source(&problem, &x));
        assert_eq!(fields.diffusion_tensor[cell].to_array(), [2.0, 0.5, 0.25]);
    }

    // Nothing is computed before a solve
    assert_eq!(fields.concentration.num_entries(), 0);
    assert_eq!(fields.concentration.len(), mesh.num_cells());
}

#[test]
fn neumann_faces_are_stored() {
    let mesh = two_cell_mesh();
    let fields = initialize_fields(&mesh, &AffineProblem::constant(1.0).with_neumann_boundary()).unwrap();
    assert!(fields
        .boundary_conditions
        .iter()
        .all(|(_, condition)| condition == &BoundaryCondition::Neumann));
    assert_eq!(fields.boundary_values().num_entries(), 0);
}

#[test]
fn field_names() {
    let mesh = two_cell_mesh();
    let fields = initialize_fields(&mesh, &SineProblem::default()).unwrap();
    assert_eq!(fields.concentration.name(), CONCENTRATION);
    assert_eq!(fields.global_index.name(), GLOBAL_INDEX);
    assert_eq!(fields.boundary_conditions.name(), BC_TYPE);
    assert_eq!(fields.conductivity.name(), BC_CONDUCTIVITY);
    assert_eq!(fields.diffusion_tensor.num_components(), 3);
}

#[test]
fn overshared_face_fails_initialization() {
    let mesh = mesh_with_overshared_face();
    let err = initialize_fields(&mesh, &SineProblem::default()).unwrap_err();
    assert_eq!(err.face, 0);
    assert_eq!(err.cells, vec![0, 1, 2]);
}

proptest! {
    #[test]
    fn global_indices_are_contiguous(cells_per_dim in 1usize..8, triangles: bool) {
        let mesh: PolyMesh2d<f64> = if triangles {
            create_unit_square_uniform_tri_mesh_2d(cells_per_dim)
        } else {
            create_unit_square_uniform_quad_mesh_2d(cells_per_dim)
        };
        let fields = initialize_fields(&mesh, &SineProblem::default()).unwrap();

        let n = mesh.num_cells();
        prop_assert_eq!(fields.num_unknowns, n);
        let mut indices = fields.global_index.values().to_vec();
        indices.sort_unstable();
        prop_assert_eq!(indices, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn internal_conductivities_are_negative_for_isotropic_tensor(cells_per_dim in 1usize..6) {
        let mesh: PolyMesh2d<f64> = create_unit_square_uniform_tri_mesh_2d(cells_per_dim);
        let fields = initialize_fields(&mesh, &AffineProblem::constant(0.0)).unwrap();
        for (_, conductivity) in fields.conductivity.iter() {
            prop_assert!(*conductivity < 0.0);
        }
    }
}

#[test]
fn problem_default_boundary_condition_is_dirichlet() {
    let problem = SineProblem::default();
    let x = Point2::new(0.1, 0.3);
    let condition: BoundaryCondition<f64> = problem.boundary_condition(&x);
    assert_eq!(condition.dirichlet_value().copied(), Some(problem.analytical_solution(&x)));
}
