use crate::temp_output_dir;
use tpfa::io::load_mesh;

// Unit square split into four triangles around its center, in MSH 4.1 format
const FOUR_TRIANGLES_MSH: &str = "\
$MeshFormat
4.1 0 8
$EndMeshFormat
$Nodes
1 5 1 5
2 1 0 5
1
2
3
4
5
0 0 0
1 0 0
1 1 0
0 1 0
0.5 0.5 0
$EndNodes
$Elements
2 8 1 8
1 1 1 4
1 1 2
2 2 3
3 3 4
4 4 1
2 1 2 4
5 1 2 5
6 2 3 5
7 3 4 5
8 4 1 5
$EndElements
";

#[test]
fn load_msh_file() -> eyre::Result<()> {
    let dir = temp_output_dir("load_msh_file");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("four_triangles.msh");
    std::fs::write(&path, FOUR_TRIANGLES_MSH)?;

    let mesh = load_mesh::<f64, _>(&path)?;
    assert_eq!(mesh.num_vertices(), 5);
    assert_eq!(mesh.num_cells(), 4);
    assert_eq!(mesh.num_faces(), 8);
    assert_eq!(mesh.find_boundary_faces().len(), 4);
    let total_area: f64 = (0..mesh.num_cells()).map(|cell| mesh.cell_volume(cell)).sum();
    assert!((total_area - 1.0).abs() < 1e-14);
    Ok(())
}

#[test]
fn unsupported_extension_is_rejected() {
    let err = load_mesh::<f64, _>("mesh.obj").unwrap_err();
    assert!(err.to_string().contains("unsupported mesh file"));
}

#[test]
fn missing_file_is_an_error() {
    assert!(load_mesh::<f64, _>("does/not/exist.vtk").is_err());
    assert!(load_mesh::<f64, _>("does/not/exist.msh").is_err());
}
