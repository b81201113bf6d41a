//! Mesh input and output.
use crate::mesh::PolyMesh2d;
use eyre::eyre;
use nalgebra::RealField;
use std::path::Path;

pub mod msh;
pub mod vtk;

/// Loads a polygonal mesh, choosing the format by file extension.
///
/// Supported are Gmsh MSH files (`.msh`) and legacy VTK unstructured grids (`.vtk`).
pub fn load_mesh<T, P>(file_path: P) -> eyre::Result<PolyMesh2d<T>>
where
    T: RealField,
    P: AsRef<Path>,
{
    let file_path = file_path.as_ref();
    let extension = file_path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "msh" => msh::load_msh_from_file(file_path),
        "vtk" => vtk::load_vtk_from_file(file_path),
        _ => Err(eyre!(
            "unsupported mesh file \"{}\" (expected extension .msh or .vtk)",
            file_path.display()
        )),
    }
}
