//! Uniform meshes of rectangles, mostly for tests and convergence studies.
use crate::mesh::PolyMesh2d;
use nalgebra::{convert, Point2, RealField, Vector2};

/// Vertex lattice of an axis-aligned rectangle, numbered row by row from the top left corner.
struct Lattice<T: RealField> {
    origin: Vector2<T>,
    spacing: T,
    cells_x: usize,
    cells_y: usize,
}

impl<T: RealField> Lattice<T> {
    fn new(unit_length: T, units_x: usize, units_y: usize, cells_per_unit: usize, top_left: &Vector2<T>) -> Self {
        let spacing = unit_length / convert::<f64, T>(cells_per_unit.max(1) as f64);
        Self {
            origin: top_left.clone(),
            spacing,
            cells_x: units_x * cells_per_unit,
            cells_y: units_y * cells_per_unit,
        }
    }

    fn is_empty(&self) -> bool {
        self.cells_x == 0 || self.cells_y == 0
    }

    fn vertex_index(&self, column: usize, row: usize) -> usize {
        row * (self.cells_x + 1) + column
    }

    fn vertices(&self) -> Vec<Point2<T>> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut vertices = Vec::with_capacity((self.cells_x + 1) * (self.cells_y + 1));
        for row in 0..=self.cells_y {
            let y = self.origin.y.clone() - convert::<f64, T>(row as f64) * self.spacing.clone();
            for column in 0..=self.cells_x {
                let x = self.origin.x.clone() + convert::<f64, T>(column as f64) * self.spacing.clone();
                vertices.push(Point2::new(x, y.clone()));
            }
        }
        vertices
    }

    /// Counter-clockwise corner loops of the lattice cells, starting at the bottom left corner.
    fn cell_corners(&self) -> impl Iterator<Item = [usize; 4]> + '_ {
        let rows = if self.is_empty() { 0 } else { self.cells_y };
        (0..rows).flat_map(move |row| {
            (0..self.cells_x).map(move |column| {
                [
                    self.vertex_index(column, row + 1),
                    self.vertex_index(column + 1, row + 1),
                    self.vertex_index(column + 1, row),
                    self.vertex_index(column, row),
                ]
            })
        })
    }
}

pub fn create_unit_square_uniform_quad_mesh_2d<T: RealField>(cells_per_dim: usize) -> PolyMesh2d<T> {
    let top_left = Vector2::new(T::zero(), T::one());
    create_rectangular_uniform_quad_mesh_2d(T::one(), 1, 1, cells_per_dim, &top_left)
}

pub fn create_unit_square_uniform_tri_mesh_2d<T: RealField>(cells_per_dim: usize) -> PolyMesh2d<T> {
    let top_left = Vector2::new(T::zero(), T::one());
    create_rectangular_uniform_tri_mesh_2d(T::one(), 1, 1, cells_per_dim, &top_left)
}

/// Quadrilateral mesh of the rectangle with corner `top_left` and side lengths
/// `units_x * unit_length` and `units_y * unit_length`, with `cells_per_unit` cells
/// along each unit length.
///
/// Cells are numbered row by row from the top.
pub fn create_rectangular_uniform_quad_mesh_2d<T: RealField>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    top_left: &Vector2<T>,
) -> PolyMesh2d<T> {
    let lattice = Lattice::new(unit_length, units_x, units_y, cells_per_unit, top_left);
    let cells = lattice.cell_corners().map(Vec::from).collect();
    PolyMesh2d::from_polygons(lattice.vertices(), cells)
}

/// Like [`create_rectangular_uniform_quad_mesh_2d`], with each quadrilateral cut along
/// the diagonal from its bottom left to its top right corner.
pub fn create_rectangular_uniform_tri_mesh_2d<T: RealField>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    top_left: &Vector2<T>,
) -> PolyMesh2d<T> {
    let lattice = Lattice::new(unit_length, units_x, units_y, cells_per_unit, top_left);
    let cells = lattice
        .cell_corners()
        .flat_map(|[bottom_left, bottom_right, top_right, top_left]| {
            [
                vec![bottom_left, bottom_right, top_right],
                vec![bottom_left, top_right, top_left],
            ]
        })
        .collect();
    PolyMesh2d::from_polygons(lattice.vertices(), cells)
}
