use crate::{mesh_with_overshared_face, two_cell_mesh};
use itertools::Itertools;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{Point2, Vector2};
use proptest::prelude::*;
use tpfa::mesh::procedural::{
    create_rectangular_uniform_quad_mesh_2d, create_rectangular_uniform_tri_mesh_2d,
    create_unit_square_uniform_quad_mesh_2d, create_unit_square_uniform_tri_mesh_2d,
};
use tpfa::mesh::{FaceKind, PolyMesh2d, TopologyError};

#[test]
fn two_cell_mesh_geometry() {
    let mesh = two_cell_mesh();
    assert_eq!(mesh.num_vertices(), 6);
    assert_eq!(mesh.num_cells(), 2);
    assert_eq!(mesh.num_faces(), 7);
    assert_eq!(mesh.find_boundary_faces().len(), 6);

    assert_scalar_eq!(mesh.cell_volume(0), 1.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(mesh.cell_volume(1), 1.0, comp = abs, tol = 1e-14);
    assert_matrix_eq!(mesh.cell_barycenter(0).coords, Vector2::new(0.5, 0.5), comp = abs, tol = 1e-14);
    assert_matrix_eq!(mesh.cell_barycenter(1).coords, Vector2::new(1.5, 0.5), comp = abs, tol = 1e-14);

    let internal_faces = (0..mesh.num_faces())
        .filter(|&face| !mesh.classify_face(face).unwrap().is_boundary())
        .collect_vec();
    assert_eq!(internal_faces.len(), 1);
    let face = internal_faces[0];

    assert_eq!(mesh.classify_face(face).unwrap(), FaceKind::Internal { back: 0, front: 1 });
    assert_eq!(mesh.face_cells(face), &[0, 1]);
    assert_scalar_eq!(mesh.face_area(face), 1.0, comp = abs, tol = 1e-14);
    assert_matrix_eq!(mesh.face_barycenter(face).coords, Vector2::new(1.0, 0.5), comp = abs, tol = 1e-14);
    // Oriented from the back cell to the front cell
    assert_matrix_eq!(mesh.face_unit_normal(face).unwrap(), Vector2::new(1.0, 0.0), comp = abs, tol = 1e-14);
}

#[test]
fn boundary_normals_point_outwards() {
    let mesh: PolyMesh2d<f64> = create_unit_square_uniform_tri_mesh_2d(3);
    let center = Point2::new(0.5, 0.5);
    for face in mesh.find_boundary_faces() {
        let normal = mesh.face_unit_normal(face).unwrap();
        let outward = mesh.face_barycenter(face) - center;
        assert!(normal.dot(&outward) > 0.0);
        assert_scalar_eq!(normal.norm(), 1.0, comp = abs, tol = 1e-14);
    }
}

#[test]
fn polygon_with_clockwise_loop() {
    // Non-convex L-shaped hexagon, given clockwise
    let vertices = vec![
        Point2::new(0.0, 0.0),
        Point2::new(0.0, 2.0),
        Point2::new(1.0, 2.0),
        Point2::new(1.0, 1.0),
        Point2::new(2.0, 1.0),
        Point2::new(2.0, 0.0),
    ];
    let mesh = PolyMesh2d::from_polygons(vertices, vec![(0..6).collect()]);

    assert_eq!(mesh.num_faces(), 6);
    assert_scalar_eq!(mesh.cell_signed_area(0), -3.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(mesh.cell_volume(0), 3.0, comp = abs, tol = 1e-14);
    // Union of [0, 2] x [0, 1] and [0, 1] x [1, 2]
    let expected_barycenter = (Vector2::new(1.0, 0.5) * 2.0 + Vector2::new(0.5, 1.5)) / 3.0;
    assert_matrix_eq!(mesh.cell_barycenter(0).coords, expected_barycenter, comp = abs, tol = 1e-14);
}

#[test]
fn normals_of_non_star_shaped_cell_point_outwards() {
    // U-shaped octagon whose barycenter lies in the notch, outside the cell
    let vertices = vec![
        Point2::new(0.0, 0.0),
        Point2::new(3.0, 0.0),
        Point2::new(3.0, 3.0),
        Point2::new(2.0, 3.0),
        Point2::new(2.0, 1.0),
        Point2::new(1.0, 1.0),
        Point2::new(1.0, 3.0),
        Point2::new(0.0, 3.0),
    ];
    // Outward normal of the edge from vertex i to vertex i + 1
    let expected = [
        Vector2::new(0.0, -1.0),
        Vector2::new(1.0, 0.0),
        Vector2::new(0.0, 1.0),
        Vector2::new(-1.0, 0.0),
        Vector2::new(0.0, 1.0),
        Vector2::new(1.0, 0.0),
        Vector2::new(0.0, 1.0),
        Vector2::new(-1.0, 0.0),
    ];

    let counter_clockwise = (0..8).collect_vec();
    let clockwise = (0..8).rev().collect_vec();
    for vertex_loop in [counter_clockwise, clockwise] {
        let mesh = PolyMesh2d::from_polygons(vertices.clone(), vec![vertex_loop]);
        assert_eq!(mesh.num_faces(), 8);
        for face in 0..mesh.num_faces() {
            let [a, b] = mesh.faces()[face];
            let edge = if (a + 1) % 8 == b { a } else { b };
            let normal = mesh.face_unit_normal(face).unwrap();
            assert_matrix_eq!(normal, expected[edge], comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn overshared_face_is_a_topology_error() {
    let mesh = mesh_with_overshared_face();
    assert_eq!(
        mesh.classify_face(0),
        Err(TopologyError {
            face: 0,
            cells: vec![0, 1, 2]
        })
    );
    assert!(mesh.face_unit_normal(0).is_err());
    // The remaining faces are boundary faces
    assert_eq!(mesh.find_boundary_faces(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn face_referenced_twice_by_one_cell_is_a_topology_error() {
    let vertices = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
    let faces = vec![[0, 1], [1, 2], [2, 0]];
    let mesh = PolyMesh2d::from_poly_data(vertices, faces, vec![vec![0, 1, 2]], vec![vec![0, 1, 2, 0]]);
    let err = mesh.classify_face(0).unwrap_err();
    assert_eq!(err.cells, vec![0, 0]);
}

#[test]
fn dangling_face_is_a_topology_error() {
    let vertices = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
    let faces = vec![[0, 1], [1, 2], [2, 0], [1, 2]];
    let mesh = PolyMesh2d::from_poly_data(vertices, faces, vec![vec![0, 1, 2]], vec![vec![0, 1, 2]]);
    assert!(mesh.classify_face(3).is_err());
}

#[test]
#[should_panic]
fn from_poly_data_rejects_out_of_bounds_face() {
    let vertices = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
    let faces = vec![[0, 1], [1, 2], [2, 0]];
    PolyMesh2d::from_poly_data(vertices, faces, vec![vec![0, 1, 2]], vec![vec![0, 1, 3]]);
}

#[test]
fn rectangular_uniform_meshes_empty() {
    let quads = create_rectangular_uniform_quad_mesh_2d(1.0, 0, 3, 2, &Vector2::new(0.0, 1.0));
    assert_eq!(quads.num_cells(), 0);
    assert_eq!(quads.num_vertices(), 0);
    let tris: PolyMesh2d<f64> = create_unit_square_uniform_tri_mesh_2d(0);
    assert_eq!(tris.num_cells(), 0);
}

proptest! {
    #[test]
    fn rectangular_uniform_quad_mesh_basics(
        unit_length in 0.1f64..10.0,
        units_x in 1usize..4,
        units_y in 1usize..4,
        cells_per_unit in 1usize..4,
    ) {
        let top_left = Vector2::new(-1.0, 2.0);
        let mesh = create_rectangular_uniform_quad_mesh_2d(unit_length, units_x, units_y, cells_per_unit, &top_left);

        let (nx, ny) = (units_x * cells_per_unit, units_y * cells_per_unit);
        prop_assert_eq!(mesh.num_cells(), nx * ny);
        prop_assert_eq!(mesh.num_vertices(), (nx + 1) * (ny + 1));
        prop_assert_eq!(mesh.num_faces(), nx * (ny + 1) + ny * (nx + 1));
        prop_assert_eq!(mesh.find_boundary_faces().len(), 2 * (nx + ny));

        let total_area: f64 = (0..mesh.num_cells()).map(|cell| mesh.cell_volume(cell)).sum();
        let expected_area = unit_length * unit_length * (units_x * units_y) as f64;
        prop_assert!((total_area - expected_area).abs() <= 1e-10 * expected_area);

        // Counter-clockwise loops
        for cell in 0..mesh.num_cells() {
            prop_assert!(mesh.cell_signed_area(cell) > 0.0);
        }
    }

    #[test]
    fn uniform_tri_mesh_normals_are_consistent(cells_per_dim in 1usize..5) {
        let mesh: PolyMesh2d<f64> = create_unit_square_uniform_tri_mesh_2d(cells_per_dim);
        prop_assert_eq!(mesh.num_cells(), 2 * cells_per_dim * cells_per_dim);
        for face in 0..mesh.num_faces() {
            let normal = mesh.face_unit_normal(face).unwrap();
            let kind = mesh.classify_face(face).unwrap();
            let back_to_face = mesh.face_barycenter(face) - mesh.cell_barycenter(kind.back_cell());
            prop_assert!(normal.dot(&back_to_face) > 0.0);
            if let Some(front) = kind.front_cell() {
                let front_to_face = mesh.face_barycenter(face) - mesh.cell_barycenter(front);
                prop_assert!(normal.dot(&front_to_face) < 0.0);
            }
        }
    }

    #[test]
    fn unit_square_quad_mesh_cells_have_four_faces(cells_per_dim in 1usize..5) {
        let mesh: PolyMesh2d<f64> = create_unit_square_uniform_quad_mesh_2d(cells_per_dim);
        for cell in 0..mesh.num_cells() {
            prop_assert_eq!(mesh.cell_faces(cell).len(), 4);
            prop_assert_eq!(mesh.cell_vertices(cell).len(), 4);
        }
    }
}
