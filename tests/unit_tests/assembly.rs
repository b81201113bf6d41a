use crate::{two_cell_mesh, AffineProblem};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector};
use tpfa::assembly::{assemble_global_system, AssemblyError};
use tpfa::initialize::{cell_face_transmissibility, initialize_fields, ProblemFields};
use tpfa::mesh::procedural::{create_unit_square_uniform_quad_mesh_2d, create_unit_square_uniform_tri_mesh_2d};
use tpfa::mesh::{FaceKind, PolyMesh2d};
use tpfa::problem::{BoundaryCondition, SineProblem};

/// Sum of the Dirichlet contributions $-t A$ to the diagonal entry of each cell.
fn boundary_diagonal_contributions(mesh: &PolyMesh2d<f64>, fields: &ProblemFields<f64>) -> DVector<f64> {
    let mut contributions = DVector::zeros(fields.num_unknowns);
    for (face, condition) in fields.boundary_conditions.iter() {
        if let BoundaryCondition::Dirichlet(_) = condition {
            let cell = mesh.classify_face(face).unwrap().back_cell();
            let normal = mesh.face_unit_normal(face).unwrap();
            let t = cell_face_transmissibility(mesh, &fields.diffusion_tensor[cell], cell, face, &normal);
            contributions[fields.global_index[cell]] -= t * mesh.face_area(face);
        }
    }
    contributions
}

#[test]
fn two_cell_system() {
    let mesh = two_cell_mesh();
    let fields = initialize_fields(&mesh, &AffineProblem::linear_x()).unwrap();
    let (matrix, rhs) = assemble_global_system(&mesh, &fields).unwrap();

    // Each cell has three Dirichlet faces with t A = 2 and one internal face with t A = -1
    #[rustfmt::skip]
    let expected_matrix = DMatrix::from_row_slice(2, 2, &[
        -7.0, 1.0,
        1.0, -7.0,
    ]);
    assert_matrix_eq!(DMatrix::from(&matrix), expected_matrix, comp = abs, tol = 1e-12);

    // Boundary values: 0.5 on top/bottom and 0 on the left face of cell 0,
    // 1.5 on top/bottom and 2 on the right face of cell 1
    let expected_rhs = DVector::from_column_slice(&[-2.0, -2.0 * (1.5 + 1.5 + 2.0)]);
    assert_matrix_eq!(rhs, expected_rhs, comp = abs, tol = 1e-12);
}

#[test]
fn matrix_is_symmetric_with_internal_face_couplings() {
    let mesh: PolyMesh2d<f64> = create_unit_square_uniform_tri_mesh_2d(4);
    let problem = SineProblem {
        dxx: 1.5,
        dyy: 0.75,
        dxy: 0.2,
        a: 4.0,
    };
    let fields = initialize_fields(&mesh, &problem).unwrap();
    let (matrix, _) = assemble_global_system(&mesh, &fields).unwrap();
    let dense = DMatrix::from(&matrix);

    assert_matrix_eq!(dense, dense.transpose(), comp = abs, tol = 1e-12);
    for face in 0..mesh.num_faces() {
        if let FaceKind::Internal { back, front } = mesh.classify_face(face).unwrap() {
            let (i, j) = (fields.global_index[back], fields.global_index[front]);
            let conductivity = fields.conductivity.get(face).unwrap();
            let expected = -conductivity * mesh.face_area(face);
            assert_scalar_eq!(dense[(i, j)], expected, comp = abs, tol = 1e-12);
            assert_scalar_eq!(dense[(j, i)], expected, comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn row_sums_equal_boundary_contributions() {
    for mesh in [
        create_unit_square_uniform_quad_mesh_2d::<f64>(5),
        create_unit_square_uniform_tri_mesh_2d(5),
    ] {
        let fields = initialize_fields(&mesh, &SineProblem::default()).unwrap();
        let (matrix, _) = assemble_global_system(&mesh, &fields).unwrap();

        let row_sums = DMatrix::from(&matrix) * DVector::repeat(fields.num_unknowns, 1.0);
        let expected = boundary_diagonal_contributions(&mesh, &fields);
        assert_matrix_eq!(row_sums, expected, comp = abs, tol = 1e-10);
    }
}

#[test]
fn diagonal_is_fully_stored() {
    let mesh: PolyMesh2d<f64> = create_unit_square_uniform_quad_mesh_2d(3);
    let fields = initialize_fields(&mesh, &AffineProblem::constant(0.0).with_neumann_boundary()).unwrap();
    let (matrix, _) = assemble_global_system(&mesh, &fields).unwrap();
    for i in 0..fields.num_unknowns {
        assert!(matrix.get_entry(i, i).is_some());
    }
}

#[test]
fn neumann_faces_contribute_nothing() {
    let mesh: PolyMesh2d<f64> = create_unit_square_uniform_quad_mesh_2d(4);
    let fields = initialize_fields(&mesh, &AffineProblem::constant(3.0).with_neumann_boundary()).unwrap();
    let (matrix, rhs) = assemble_global_system(&mesh, &fields).unwrap();

    // Only internal faces remain, so every row sums to zero and there is no forcing
    let row_sums = DMatrix::from(&matrix) * DVector::repeat(fields.num_unknowns, 1.0);
    assert_matrix_eq!(row_sums, DVector::zeros(fields.num_unknowns), comp = abs, tol = 1e-12);
    assert_matrix_eq!(rhs, DVector::zeros(fields.num_unknowns), comp = abs, tol = 1e-12);

    // Compared with the Dirichlet problem, only the boundary rows change
    let dirichlet_fields = initialize_fields(&mesh, &AffineProblem::constant(3.0)).unwrap();
    let (dirichlet_matrix, _) = assemble_global_system(&mesh, &dirichlet_fields).unwrap();
    let difference = DMatrix::from(&dirichlet_matrix) - DMatrix::from(&matrix);
    let expected_difference = DMatrix::from_diagonal(&boundary_diagonal_contributions(&mesh, &dirichlet_fields));
    assert_matrix_eq!(difference, expected_difference, comp = abs, tol = 1e-12);
}

#[test]
fn source_is_subtracted_with_cell_volume() {
    let mesh: PolyMesh2d<f64> = create_unit_square_uniform_quad_mesh_2d(3);
    let problem = SineProblem::default();
    let fields = initialize_fields(&mesh, &problem).unwrap();
    let (_, rhs) = assemble_global_system(&mesh, &fields).unwrap();

    // Turning all faces into Neumann faces leaves only the source
    let mut neumann_fields = fields.clone();
    for face in mesh.find_boundary_faces() {
        neumann_fields
            .boundary_conditions
            .insert(face, BoundaryCondition::Neumann);
    }
    let (_, source_rhs) = assemble_global_system(&mesh, &neumann_fields).unwrap();
    for cell in 0..mesh.num_cells() {
        let i = fields.global_index[cell];
        assert_scalar_eq!(
            source_rhs[i],
            -fields.source[cell] * mesh.cell_volume(cell),
            comp = abs,
            tol = 1e-12
        );
    }
    assert!((rhs - source_rhs).norm() > 0.0);
}

#[test]
fn missing_boundary_condition_is_reported() {
    let mesh = two_cell_mesh();
    let mut fields = initialize_fields(&mesh, &SineProblem::default()).unwrap();
    fields.boundary_conditions.clear();
    let err = assemble_global_system(&mesh, &fields).unwrap_err();
    assert!(matches!(err, AssemblyError::MissingBoundaryCondition { .. }));
}

#[test]
fn missing_conductivity_is_reported() {
    let mesh = two_cell_mesh();
    let mut fields = initialize_fields(&mesh, &SineProblem::default()).unwrap();
    let face = fields.conductivity.iter().next().unwrap().0;
    fields.conductivity.clear();
    assert_eq!(
        assemble_global_system(&mesh, &fields).unwrap_err(),
        AssemblyError::MissingConductivity { face }
    );
}
