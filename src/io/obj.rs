use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::ArrayView2;

use crate::error::DcapError;
use crate::mesh::{depth_to_mesh, Mesh, DEFAULT_FOV_DEG};

/// Name of the single material block written to .mtl files.
const MATERIAL_NAME: &str = "colored";

/// Writes a mesh as a Wavefront .obj file.
///
/// Vertices and texture coordinates are written 1-based in emission order,
/// so faces reference them positionally as `v/vt` pairs. When `texture` is
/// given, the material library and `usemtl` statement are written before any
/// face; the .mtl file itself is the caller's or [export_obj]'s concern.
pub fn write_obj(mesh: &Mesh, path: &Path, texture: Option<&str>) -> Result<(), DcapError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    if texture.is_some() {
        let mtl_name = path
            .with_extension("mtl")
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        writeln!(writer, "mtllib {}", mtl_name)?;
        writeln!(writer, "usemtl {}", MATERIAL_NAME)?;
    }

    for vertex in &mesh.vertices {
        writeln!(writer, "v {} {} {}", vertex.x, vertex.y, vertex.z)?;
    }

    for [s, t] in &mesh.texcoords {
        writeln!(writer, "vt {} {}", s, t)?;
    }

    for [a, b, c] in &mesh.faces {
        writeln!(
            writer,
            "f {}/{} {}/{} {}/{}",
            a + 1,
            a + 1,
            b + 1,
            b + 1,
            c + 1,
            c + 1
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes a .mtl material file with a single basic shading block referencing
/// `texture` as both ambient and diffuse map.
pub fn write_mtl(texture: &str, path: &Path) -> Result<(), DcapError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "newmtl {}", MATERIAL_NAME)?;
    writeln!(writer, "Ns 10.0000")?;
    writeln!(writer, "d 1.0000")?;
    writeln!(writer, "Tr 0.0000")?;
    writeln!(writer, "illum 2")?;
    writeln!(writer, "Ka 1.000 1.000 1.000")?;
    writeln!(writer, "Kd 1.000 1.000 1.000")?;
    writeln!(writer, "Ks 0.000 0.000 0.000")?;
    writeln!(writer, "map_Ka {}", texture)?;
    writeln!(writer, "map_Kd {}", texture)?;

    writer.flush()?;
    Ok(())
}

/// Exports a depth map as a textured 3D mesh.
///
/// Writes `<outfile>.obj` and, when a texture path is supplied,
/// `<outfile>.mtl` referencing it.
///
/// # Arguments
///
/// * `depth` - Depth map; zero-depth pixels leave holes in the geometry.
/// * `outfile` - Output path without extension.
/// * `texture` - Relative path of the texture image to map onto the mesh.
///
/// # Returns
///
/// The path of the written .obj file.
pub fn export_obj(
    depth: &ArrayView2<f32>,
    outfile: &Path,
    texture: Option<&str>,
) -> Result<PathBuf, DcapError> {
    let mesh = depth_to_mesh(depth, DEFAULT_FOV_DEG);

    let obj_path = outfile.with_extension("obj");
    if let Some(texture) = texture {
        write_mtl(texture, &outfile.with_extension("mtl"))?;
    }
    write_obj(&mesh, &obj_path, texture)?;

    Ok(obj_path)
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use crate::unit_test::block_depth;

    use super::*;

    fn count_records(content: &str, prefix: &str) -> usize {
        content
            .lines()
            .filter(|line| line.split_whitespace().next() == Some(prefix))
            .count()
    }

    #[test]
    fn test_zero_depth_map_writes_vertices_but_no_faces() {
        let dir = tempfile::tempdir().unwrap();
        let depth = Array2::<f32>::zeros((4, 5));

        let path = export_obj(&depth.view(), &dir.path().join("flat"), None).unwrap();
        let content = std::fs::read_to_string(path).unwrap();

        assert_eq!(count_records(&content, "v"), 20);
        assert_eq!(count_records(&content, "vt"), 20);
        assert_eq!(count_records(&content, "f"), 0);
        assert!(!content.contains("usemtl"));
    }

    #[test]
    fn test_isolated_block_writes_two_faces() {
        let dir = tempfile::tempdir().unwrap();
        let depth = block_depth(6, 6, 2, 2, 2, 900.0);

        let path = export_obj(&depth.view(), &dir.path().join("block"), None).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(count_records(&content, "f"), 2);

        // Face indices are 1-based v/vt pairs with matching values.
        for line in content.lines().filter(|line| line.starts_with("f ")) {
            for pair in line.split_whitespace().skip(1) {
                let (v, vt) = pair.split_once('/').unwrap();
                assert_eq!(v, vt);
                assert!(v.parse::<usize>().unwrap() >= 1);
            }
        }
    }

    #[test]
    fn test_texture_writes_material_files() {
        let dir = tempfile::tempdir().unwrap();
        let depth = Array2::<f32>::from_elem((4, 4), 700.0);

        let outfile = dir.path().join("textured");
        export_obj(&depth.view(), &outfile, Some("rgb_0001.tiff")).unwrap();

        let obj = std::fs::read_to_string(outfile.with_extension("obj")).unwrap();
        assert!(obj.starts_with("mtllib textured.mtl\nusemtl colored\n"));
        // Material references must precede the first face record.
        assert!(obj.find("usemtl").unwrap() < obj.find("\nf ").unwrap());

        let mtl = std::fs::read_to_string(outfile.with_extension("mtl")).unwrap();
        assert!(mtl.starts_with("newmtl colored\n"));
        assert_eq!(count_records(&mtl, "map_Ka"), 1);
        assert_eq!(count_records(&mtl, "map_Kd"), 1);
        assert!(mtl.contains("map_Kd rgb_0001.tiff"));
    }
}
