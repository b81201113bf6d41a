//! Export and import of polygonal meshes as legacy VTK unstructured grids.
use crate::field::FieldAttribute;
use crate::mesh::PolyMesh2d;
use eyre::{eyre, Context};
use log::debug;
use nalgebra::{Point2, RealField, Scalar};
use std::convert::TryFrom;
use std::path::Path;
use vtkio::model::{
    Attribute, Attributes, ByteOrder, CellType, Cells, DataArray, DataSet, ElementType, IOBuffer, Piece,
    UnstructuredGridPiece, Version, VertexNumbers, Vtk,
};

/// Builds a VTK data set from a [`PolyMesh2d`] together with cell and face attributes.
///
/// Cells are written as triangles, quads or general polygons. If any face attribute is
/// present, the faces are appended after the cells as line entries, and every attribute is
/// padded with NaN over the entries of the other kind.
pub struct PolyMeshDataSetBuilder<'a, T: Scalar> {
    mesh: &'a PolyMesh2d<T>,
    // Only used for exporting directly to file
    title: Option<String>,
    cell_attributes: Vec<&'a dyn FieldAttribute>,
    face_attributes: Vec<&'a dyn FieldAttribute>,
}

impl<'a, T: Scalar> PolyMeshDataSetBuilder<'a, T> {
    pub fn from_mesh(mesh: &'a PolyMesh2d<T>) -> Self {
        Self {
            mesh,
            title: None,
            cell_attributes: Vec::new(),
            face_attributes: Vec::new(),
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }

    pub fn with_cell_attribute(mut self, attribute: &'a dyn FieldAttribute) -> Self {
        self.cell_attributes.push(attribute);
        self
    }

    pub fn with_face_attribute(mut self, attribute: &'a dyn FieldAttribute) -> Self {
        self.face_attributes.push(attribute);
        self
    }
}

impl<'a, T: RealField> PolyMeshDataSetBuilder<'a, T> {
    pub fn try_build(&self) -> eyre::Result<DataSet> {
        let mesh = self.mesh;
        let num_cells = mesh.num_cells();
        let num_faces = mesh.num_faces();

        for attribute in &self.cell_attributes {
            check_num_entities(*attribute, num_cells, "cell")?;
        }
        for attribute in &self.face_attributes {
            check_num_entities(*attribute, num_faces, "face")?;
        }
        let include_faces = !self.face_attributes.is_empty();

        let mut points = Vec::with_capacity(3 * mesh.num_vertices());
        for v in mesh.vertices() {
            for coord in v.coords.iter() {
                let coord: f64 = coord
                    .to_subset()
                    .ok_or_else(|| eyre!("vertex coordinate cannot be represented as f64"))?;
                points.push(coord);
            }
            points.push(0.0);
        }

        // Vertices are laid out as follows: N, i_1, i_2, ... i_N
        let mut vertices = Vec::new();
        let mut cell_types = Vec::new();
        for cell_vertices in mesh.cell_vertex_iter() {
            vertices.push(to_vtk_index(cell_vertices.len())?);
            for &idx in cell_vertices {
                vertices.push(to_vtk_index(idx)?);
            }
            cell_types.push(match cell_vertices.len() {
                3 => CellType::Triangle,
                4 => CellType::Quad,
                _ => CellType::Polygon,
            });
        }
        if include_faces {
            for &[a, b] in mesh.faces() {
                vertices.extend([2, to_vtk_index(a)?, to_vtk_index(b)?]);
                cell_types.push(CellType::Line);
            }
        }
        let num_entries = cell_types.len();

        let mut cell_data = Vec::new();
        for attribute in &self.cell_attributes {
            cell_data.push(attribute_data_array(*attribute, 0..num_cells, num_entries));
        }
        for attribute in &self.face_attributes {
            let face_entries = num_cells..num_cells + num_faces;
            cell_data.push(attribute_data_array(*attribute, face_entries, num_entries));
        }

        let piece = UnstructuredGridPiece {
            points: points.into(),
            cells: Cells {
                cell_verts: VertexNumbers::Legacy {
                    num_cells: to_vtk_index(num_entries)?,
                    vertices,
                },
                types: cell_types,
            },
            data: Attributes {
                point: Vec::new(),
                cell: cell_data,
            },
        };

        Ok(DataSet::UnstructuredGrid {
            meta: None,
            pieces: vec![Piece::Inline(Box::new(piece))],
        })
    }

    /// Convenience function for directly exporting the dataset to a file.
    ///
    /// Missing parent directories are created.
    pub fn try_export(&self, filename: impl AsRef<Path>) -> eyre::Result<()> {
        let filepath = filename.as_ref();
        let fallback_title = filepath
            .file_stem()
            .map(|os_str| os_str.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string());
        let dataset = self.try_build()?;

        if let Some(parent) = filepath.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("failed to create output directory {}", parent.display()))?;
        }

        Vtk {
            version: Version { major: 4, minor: 1 },
            // If we don't have a title then just make the file stem the title
            title: self.title.clone().unwrap_or(fallback_title),
            byte_order: ByteOrder::BigEndian,
            data: dataset,
            file_path: None,
        }
        .export(filepath)
        .map_err(|e| eyre!("failed to export VTK file {}: {}", filepath.display(), e))?;
        debug!("Wrote {}", filepath.display());
        Ok(())
    }
}

fn check_num_entities(attribute: &dyn FieldAttribute, expected: usize, kind: &str) -> eyre::Result<()> {
    if attribute.num_entities() != expected {
        return Err(eyre!(
            "{} attribute \"{}\" has {} entries, but the mesh has {} {}s",
            kind,
            attribute.name(),
            attribute.num_entities(),
            expected,
            kind
        ));
    }
    Ok(())
}

/// Writes the attribute into the entries in `range` and pads all other entries with NaN.
fn attribute_data_array(
    attribute: &dyn FieldAttribute,
    range: std::ops::Range<usize>,
    num_entries: usize,
) -> Attribute {
    let num_comp = attribute.num_components();
    let mut data = Vec::with_capacity(num_comp * num_entries);
    for entry in 0..num_entries {
        if range.contains(&entry) {
            attribute.write_entity(entry - range.start, &mut data);
        } else {
            data.extend(std::iter::repeat(f64::NAN).take(num_comp));
        }
    }

    Attribute::DataArray(DataArray {
        name: attribute.name().to_string(),
        elem: ElementType::Scalars {
            num_comp: num_comp as u32,
            lookup_table: None,
        },
        data: IOBuffer::F64(data),
    })
}

fn to_vtk_index(idx: usize) -> eyre::Result<u32> {
    u32::try_from(idx).map_err(|_| eyre!("index {} does not fit in a VTK index", idx))
}

/// Loads a [`PolyMesh2d`] from a VTK unstructured grid.
///
/// Triangles, quads, pixels and polygons become cells of the mesh. Vertices and lines, such as
/// exported faces, are ignored. The z-coordinate of the points is discarded.
pub fn load_vtk_from_file<T, P>(file_path: P) -> eyre::Result<PolyMesh2d<T>>
where
    T: RealField,
    P: AsRef<Path>,
{
    let file_path = file_path.as_ref();
    let vtk = Vtk::import(file_path).map_err(|e| eyre!("failed to import VTK file {}: {}", file_path.display(), e))?;

    let pieces = match vtk.data {
        DataSet::UnstructuredGrid { pieces, .. } => pieces,
        _ => return Err(eyre!("VTK file {} is not an unstructured grid", file_path.display())),
    };

    let mut vertices = Vec::new();
    let mut cells = Vec::new();
    for piece in pieces {
        let piece = match piece {
            Piece::Inline(piece) => *piece,
            _ => return Err(eyre!("only inline VTK pieces are supported")),
        };
        let offset = vertices.len();
        vertices.extend(points_from_buffer(&piece.points)?);
        cells.extend(
            polygons_from_cells(piece.cells)?
                .into_iter()
                .map(|polygon| polygon.into_iter().map(|idx| idx + offset).collect::<Vec<_>>()),
        );
    }

    if cells.is_empty() {
        return Err(eyre!("VTK file {} does not contain any polygonal cells", file_path.display()));
    }
    if let Some(idx) = cells.iter().flatten().find(|idx| **idx >= vertices.len()) {
        return Err(eyre!("VTK cell references unknown point {}", idx));
    }

    Ok(PolyMesh2d::from_polygons(vertices, cells))
}

fn points_from_buffer<T: RealField>(buffer: &IOBuffer) -> eyre::Result<Vec<Point2<T>>> {
    let coords: Vec<f64> = match buffer {
        IOBuffer::F64(coords) => coords.clone(),
        IOBuffer::F32(coords) => coords.iter().map(|x| f64::from(*x)).collect(),
        _ => return Err(eyre!("VTK points must be stored as floating-point numbers")),
    };
    if coords.len() % 3 != 0 {
        return Err(eyre!("VTK point buffer length {} is not a multiple of 3", coords.len()));
    }
    coords
        .chunks_exact(3)
        .map(|xyz| {
            let x = T::from_f64(xyz[0]).ok_or_else(|| eyre!("failed to convert point coordinate"))?;
            let y = T::from_f64(xyz[1]).ok_or_else(|| eyre!("failed to convert point coordinate"))?;
            Ok(Point2::new(x, y))
        })
        .collect()
}

fn polygons_from_cells(cells: Cells) -> eyre::Result<Vec<Vec<usize>>> {
    let connectivity: Vec<Vec<usize>> = match cells.cell_verts {
        VertexNumbers::Legacy { vertices, .. } => {
            let mut connectivity = Vec::new();
            let mut remaining = vertices.as_slice();
            while let Some((&n, rest)) = remaining.split_first() {
                let n = n as usize;
                if rest.len() < n {
                    return Err(eyre!("truncated VTK cell connectivity"));
                }
                connectivity.push(rest[..n].iter().map(|idx| *idx as usize).collect());
                remaining = &rest[n..];
            }
            connectivity
        }
        VertexNumbers::XML { connectivity, offsets } => {
            let mut start = 0;
            let mut result = Vec::with_capacity(offsets.len());
            for end in offsets {
                let end = end as usize;
                if end < start || end > connectivity.len() {
                    return Err(eyre!("invalid VTK cell offsets"));
                }
                result.push(connectivity[start..end].iter().map(|idx| *idx as usize).collect());
                start = end;
            }
            result
        }
    };

    if connectivity.len() != cells.types.len() {
        return Err(eyre!(
            "VTK file has {} cells, but {} cell types",
            connectivity.len(),
            cells.types.len()
        ));
    }

    let mut polygons = Vec::new();
    for (cell_idx, (cell_type, vertices)) in cells.types.iter().zip(connectivity).enumerate() {
        let expected_len = match cell_type {
            CellType::Triangle => Some(3),
            CellType::Quad | CellType::Pixel => Some(4),
            CellType::Polygon => None,
            CellType::Vertex | CellType::PolyVertex | CellType::Line | CellType::PolyLine => continue,
            other => return Err(eyre!("unsupported VTK cell type {:?}", other)),
        };
        let is_valid = match expected_len {
            Some(len) => vertices.len() == len,
            None => vertices.len() >= 3,
        };
        if !is_valid {
            return Err(eyre!(
                "VTK cell {} of type {:?} has {} vertices",
                cell_idx,
                cell_type,
                vertices.len()
            ));
        }

        if matches!(cell_type, CellType::Pixel) {
            polygons.push(vec![vertices[0], vertices[1], vertices[3], vertices[2]]);
        } else {
            polygons.push(vertices);
        }
    }
    Ok(polygons)
}
