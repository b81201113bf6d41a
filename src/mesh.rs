//! Two-dimensional polygonal meshes with explicit face (edge) topology.
use itertools::Itertools;
use nalgebra::{Point2, RealField, Scalar, Vector2};
use numeric_literals::replace_float_literals;
use std::cmp::{max, min};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

pub mod procedural;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct UndirectedEdge {
    // Indices are always sorted, so that a <= b, for [a, b]
    indices: [usize; 2],
}

impl UndirectedEdge {
    fn new(a: usize, b: usize) -> Self {
        Self {
            indices: [min(a, b), max(a, b)],
        }
    }
}

/// A face that is not adjacent to exactly one cell (boundary) or two distinct cells (internal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyError {
    pub face: usize,
    /// The cells referencing the face, in increasing order and with repetitions.
    pub cells: Vec<usize>,
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "face {} is referenced by {} cell(s) {:?}, expected one boundary cell or two distinct neighbors",
            self.face,
            self.cells.len(),
            self.cells
        )
    }
}

impl Error for TopologyError {}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FaceKind {
    Boundary { cell: usize },
    /// `back` is always the cell with the smaller index.
    Internal { back: usize, front: usize },
}

impl FaceKind {
    /// The cell the face normal points away from.
    pub fn back_cell(&self) -> usize {
        match *self {
            FaceKind::Boundary { cell } => cell,
            FaceKind::Internal { back, .. } => back,
        }
    }

    pub fn front_cell(&self) -> Option<usize> {
        match *self {
            FaceKind::Boundary { .. } => None,
            FaceKind::Internal { front, .. } => Some(front),
        }
    }

    pub fn is_boundary(&self) -> bool {
        matches!(self, FaceKind::Boundary { .. })
    }
}

/// A mesh of simple polygonal cells in the plane.
///
/// Each cell is described by its vertex loop (in either orientation) and by the indices of the
/// faces bounding it. Faces are straight segments between two vertices. Cell and face indices are
/// dense and stable for the lifetime of the mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct PolyMesh2d<T: Scalar> {
    vertices: Vec<Point2<T>>,
    faces: Vec<[usize; 2]>,
    cell_vertices: Vec<Vec<usize>>,
    cell_faces: Vec<Vec<usize>>,
    face_cells: Vec<Vec<usize>>,
}

impl<T: Scalar> PolyMesh2d<T> {
    /// Creates a mesh from polygonal cells given as closed vertex loops.
    ///
    /// Faces are created for every distinct edge of the loops, in order of first appearance.
    ///
    /// # Panics
    ///
    /// Panics if a vertex index is out of bounds or a cell has fewer than three vertices.
    pub fn from_polygons(vertices: Vec<Point2<T>>, cells: Vec<Vec<usize>>) -> Self {
        let num_vertices = vertices.len();
        let mut faces = Vec::new();
        let mut edge_to_face = HashMap::new();
        let mut cell_faces = Vec::with_capacity(cells.len());

        for cell in &cells {
            assert!(cell.len() >= 3, "Polygonal cell must have at least three vertices.");
            if cell.iter().any(|idx| *idx >= num_vertices) {
                panic!("Vertex index out of bounds in cell description.")
            }

            let faces_of_cell = cell
                .iter()
                .circular_tuple_windows()
                .map(|(a, b)| {
                    *edge_to_face
                        .entry(UndirectedEdge::new(*a, *b))
                        .or_insert_with(|| {
                            faces.push([*a, *b]);
                            faces.len() - 1
                        })
                })
                .collect();
            cell_faces.push(faces_of_cell);
        }

        Self::from_poly_data(vertices, faces, cells, cell_faces)
    }

    /// Creates a mesh from explicit face and cell descriptions without any processing.
    ///
    /// The face-to-cell incidence is derived from `cell_faces`. No consistency between the
    /// vertex loops and the faces of a cell is required, which allows constructing malformed
    /// topologies.
    ///
    /// # Panics
    ///
    /// Panics if any vertex or face index is out of bounds, or if the number of vertex loops
    /// and face lists differ.
    pub fn from_poly_data(
        vertices: Vec<Point2<T>>,
        faces: Vec<[usize; 2]>,
        cell_vertices: Vec<Vec<usize>>,
        cell_faces: Vec<Vec<usize>>,
    ) -> Self {
        let num_vertices = vertices.len();
        let num_faces = faces.len();
        assert_eq!(
            cell_vertices.len(),
            cell_faces.len(),
            "Number of cell vertex loops and cell face lists must be equal."
        );

        if faces.iter().flatten().any(|idx| *idx >= num_vertices) {
            panic!("Vertex index out of bounds in faces description.")
        }
        if cell_vertices.iter().flatten().any(|idx| *idx >= num_vertices) {
            panic!("Vertex index out of bounds in cells description.")
        }
        if cell_faces.iter().flatten().any(|idx| *idx >= num_faces) {
            panic!("Face index out of bounds in cells description.")
        }

        let mut face_cells = vec![Vec::new(); num_faces];
        for (cell_idx, cell) in cell_faces.iter().enumerate() {
            for face_idx in cell {
                face_cells[*face_idx].push(cell_idx);
            }
        }

        Self {
            vertices,
            faces,
            cell_vertices,
            cell_faces,
            face_cells,
        }
    }

    pub fn vertices(&self) -> &[Point2<T>] {
        &self.vertices
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cell_vertices.len()
    }

    pub fn faces(&self) -> &[[usize; 2]] {
        &self.faces
    }

    pub fn cell_vertices(&self, cell: usize) -> &[usize] {
        &self.cell_vertices[cell]
    }

    pub fn cell_faces(&self, cell: usize) -> &[usize] {
        &self.cell_faces[cell]
    }

    pub fn cell_vertex_iter(&self) -> impl '_ + Iterator<Item = &[usize]> {
        self.cell_vertices.iter().map(Vec::as_slice)
    }

    /// The cells referencing the given face, in increasing order.
    pub fn face_cells(&self, face: usize) -> &[usize] {
        &self.face_cells[face]
    }

    /// Determines whether a face lies on the boundary or between two cells.
    pub fn classify_face(&self, face: usize) -> Result<FaceKind, TopologyError> {
        match self.face_cells[face].as_slice() {
            &[cell] => Ok(FaceKind::Boundary { cell }),
            &[back, front] if back != front => Ok(FaceKind::Internal { back, front }),
            cells => Err(TopologyError {
                face,
                cells: cells.to_vec(),
            }),
        }
    }

    /// Returns the indices of the faces referenced by exactly one cell.
    pub fn find_boundary_faces(&self) -> Vec<usize> {
        self.face_cells
            .iter()
            .enumerate()
            .filter_map(|(face_idx, cells)| if cells.len() == 1 { Some(face_idx) } else { None })
            .collect()
    }
}

impl<T: RealField> PolyMesh2d<T> {
    /// Signed area of the cell, positive if its vertex loop is counter-clockwise.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn cell_signed_area(&self, cell: usize) -> T {
        // Shoelace formula over the edges of the vertex loop
        let mut area = T::zero();
        for (a, b) in self.cell_vertices[cell].iter().circular_tuple_windows() {
            let a = &self.vertices[*a];
            let b = &self.vertices[*b];
            area += (b.y.clone() - a.y.clone()) * (b.x.clone() + a.x.clone());
        }
        area * 0.5
    }

    /// The area of the cell.
    pub fn cell_volume(&self, cell: usize) -> T {
        self.cell_signed_area(cell).abs()
    }

    /// The area centroid of the cell.
    ///
    /// Falls back to the mean of the vertices for degenerate cells with zero area.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn cell_barycenter(&self, cell: usize) -> Point2<T> {
        let vertex_loop = &self.cell_vertices[cell];
        let signed_area = self.cell_signed_area(cell);
        if signed_area == T::zero() {
            let n = T::from_usize(vertex_loop.len()).expect("Must be able to fit usize in T");
            let sum = vertex_loop
                .iter()
                .fold(Vector2::zeros(), |acc, idx| acc + &self.vertices[*idx].coords);
            return Point2::from(sum / n);
        }

        let mut centroid = Vector2::zeros();
        for (a, b) in vertex_loop.iter().circular_tuple_windows() {
            let a = &self.vertices[*a].coords;
            let b = &self.vertices[*b].coords;
            let cross = a.x.clone() * b.y.clone() - b.x.clone() * a.y.clone();
            centroid += (a + b) * cross;
        }
        Point2::from(centroid / (6.0 * signed_area))
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn face_barycenter(&self, face: usize) -> Point2<T> {
        let [a, b] = self.faces[face];
        Point2::from((&self.vertices[a].coords + &self.vertices[b].coords) * 0.5)
    }

    /// The length of the face.
    pub fn face_area(&self, face: usize) -> T {
        let [a, b] = self.faces[face];
        (&self.vertices[b] - &self.vertices[a]).norm()
    }

    /// Unit normal of the face, oriented from its back cell towards its front cell.
    ///
    /// For boundary faces the normal points out of the domain. The orientation is taken from
    /// the direction in which the vertex loop of the back cell traverses the face, so it is
    /// correct for non-convex cells as well.
    pub fn face_unit_normal(&self, face: usize) -> Result<Vector2<T>, TopologyError> {
        let back = self.classify_face(face)?.back_cell();
        let [a, b] = self.faces[face];
        let tangent = &self.vertices[b] - &self.vertices[a];
        let normal = Vector2::new(tangent.y.clone(), -tangent.x.clone()).normalize();

        // `normal` points to the right of a -> b, which is outward for a counter-clockwise loop
        let points_outward = match self.loop_traversal(back, a, b) {
            Some(forward) => forward == (self.cell_signed_area(back) > T::zero()),
            // Face not on the vertex loop, only possible for raw topologies
            None => normal.dot(&(self.face_barycenter(face) - self.cell_barycenter(back))) >= T::zero(),
        };
        if points_outward {
            Ok(normal)
        } else {
            Ok(-normal)
        }
    }

    /// Whether the vertex loop of `cell` traverses the edge as `a -> b` (`Some(true)`) or as
    /// `b -> a` (`Some(false)`).
    fn loop_traversal(&self, cell: usize, a: usize, b: usize) -> Option<bool> {
        self.cell_vertices[cell]
            .iter()
            .circular_tuple_windows()
            .find_map(|(&u, &v)| {
                if (u, v) == (a, b) {
                    Some(true)
                } else if (u, v) == (b, a) {
                    Some(false)
                } else {
                    None
                }
            })
    }
}
