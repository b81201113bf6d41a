use crate::mesh::PolyMesh2d;
use eyre::{eyre, Context};
use log::{debug, warn};
use nalgebra::{Point2, RealField};
use std::path::Path;

/// Loads a [`PolyMesh2d`] from a Gmsh MSH file at the given path.
pub fn load_msh_from_file<T, P>(file_path: P) -> eyre::Result<PolyMesh2d<T>>
where
    T: RealField,
    P: AsRef<Path>,
{
    let file_path = file_path.as_ref();
    let msh_bytes = std::fs::read(file_path).wrap_err_with(|| format!("failed to read file {}", file_path.display()))?;
    load_msh_from_bytes(&msh_bytes).wrap_err("failed to load mesh from msh file")
}

/// Loads a [`PolyMesh2d`] by parsing the given bytes as a Gmsh MSH file.
///
/// All triangle and quadrilateral elements of dimension two become cells of the mesh. Elements
/// of other types, such as boundary lines or points, are ignored.
pub fn load_msh_from_bytes<T>(bytes: &[u8]) -> eyre::Result<PolyMesh2d<T>>
where
    T: RealField,
{
    let mut msh_file = mshio::parse_msh_bytes(bytes).map_err(|e| eyre!("failed to parse msh file: {}", e))?;

    let msh_nodes = msh_file
        .data
        .nodes
        .take()
        .ok_or(eyre!("MSH file does not contain nodes"))?;
    let msh_elements = msh_file
        .data
        .elements
        .take()
        .ok_or(eyre!("MSH file does not contain elements"))?;

    let mut vertices = Vec::new();
    for node_block in &msh_nodes.node_blocks {
        vertices.extend(vertices_from_node_block(node_block)?);
    }

    let mut cells = Vec::new();
    let mut num_ignored = 0;
    for element_block in &msh_elements.element_blocks {
        match polygons_from_element_block(element_block, vertices.len())? {
            Some(polygons) => cells.extend(polygons),
            None => num_ignored += element_block.elements.len(),
        }
    }

    if cells.is_empty() {
        return Err(eyre!("MSH file does not contain any triangle or quadrilateral elements"));
    }
    if num_ignored > 0 {
        debug!("Ignored {} lower-dimensional or unsupported MSH elements", num_ignored);
    }

    Ok(PolyMesh2d::from_polygons(vertices, cells))
}

/// Tries to convert a `mshio::NodeBlock` to planar vertices.
fn vertices_from_node_block<T, F, I>(node_block: &mshio::NodeBlock<u64, I, F>) -> eyre::Result<Vec<Point2<T>>>
where
    T: RealField,
    F: mshio::MshFloatT,
    I: mshio::MshIntT,
{
    // Ensure that node tags are consecutive
    if node_block.node_tags.is_some() {
        return Err(eyre!("node block tags are not consecutive in msh file"));
    }

    let mut vertices = Vec::with_capacity(node_block.nodes.len());
    let mut nonplanar = false;
    for node in &node_block.nodes {
        let to_t = |coord: F| -> eyre::Result<T> {
            let coord = coord
                .to_f64()
                .ok_or_else(|| eyre!("failed to convert coordinate to f64"))?;
            T::from_f64(coord).ok_or_else(|| eyre!("failed to convert node coordinate from f64 to mesh real type"))
        };
        nonplanar |= node.z.to_f64().map_or(false, |z| z != 0.0);
        vertices.push(Point2::new(to_t(node.x)?, to_t(node.y)?));
    }

    if nonplanar {
        warn!("MSH node block has nonzero z-coordinates, which are ignored");
    }

    Ok(vertices)
}

/// Tries to convert a `mshio::ElementBlock` to polygonal cells.
///
/// Returns `None` for blocks that do not contain two-dimensional triangles or quadrilaterals.
fn polygons_from_element_block<I>(
    element_block: &mshio::ElementBlock<u64, I>,
    num_vertices: usize,
) -> eyre::Result<Option<Vec<Vec<usize>>>>
where
    I: mshio::MshIntT,
{
    let entity_dim = element_block
        .entity_dim
        .to_usize()
        .ok_or_else(|| eyre!("error converting element block dimension to usize"))?;
    let num_nodes = match element_block.element_type {
        mshio::ElementType::Tri3 => 3,
        mshio::ElementType::Qua4 => 4,
        _ => return Ok(None),
    };
    if entity_dim != 2 {
        return Ok(None);
    }

    // Ensure that element tags are consecutive
    if element_block.element_tags.is_some() {
        return Err(eyre!("element block tags are not consecutive in msh file"));
    }

    let mut polygons = Vec::with_capacity(element_block.elements.len());
    for element in &element_block.elements {
        if element.nodes.len() < num_nodes {
            return Err(eyre!("not enough nodes to initialize connectivity"));
        }
        let polygon = element.nodes[..num_nodes]
            .iter()
            .map(|tag| {
                // MSH node tags are one-based
                let idx = usize::try_from(*tag)
                    .ok()
                    .and_then(|tag| tag.checked_sub(1))
                    .filter(|idx| *idx < num_vertices);
                idx.ok_or_else(|| eyre!("element {} references unknown node {}", element.element_tag, tag))
            })
            .collect::<eyre::Result<Vec<_>>>()?;
        polygons.push(polygon);
    }

    Ok(Some(polygons))
}
