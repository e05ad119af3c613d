use nalgebra::Vector3;
use ndarray::{Array2, ArrayView2};

use crate::camera::CameraIntrinsics;

/// Nominal horizontal field of view used when no full intrinsic matrix is
/// available, in degrees.
pub const DEFAULT_FOV_DEG: f32 = 70.6;

/// A textured triangle mesh generated from a depth map.
///
/// One vertex and one UV coordinate are emitted per depth pixel, in the same
/// order, so faces reference position and texture coordinate by the same
/// index. Zero-depth pixels still hold a placeholder vertex to keep the
/// indexing dense; they are never referenced by a face.
pub struct Mesh {
    /// Camera-space vertices, one per pixel in emission order.
    pub vertices: Vec<Vector3<f32>>,
    /// UV texture coordinates in [0, 1] x [0, 1], parallel to `vertices`.
    pub texcoords: Vec<[f32; 2]>,
    /// Triangles as 0-based indices into `vertices`/`texcoords`.
    pub faces: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }
}

/// Projects a depth map into a textured quad mesh under a pinhole-camera
/// assumption with the given horizontal field of view.
///
/// Every pixel is back-projected along the ray through it so that the
/// resulting point's z equals `-depth`. Each 2x2 pixel block whose four
/// vertices are all valid becomes two triangles; blocks touching a
/// zero-depth pixel are skipped, leaving natural holes instead of degenerate
/// geometry. Fewer faces than `(w-1)*(h-1)*2` is therefore expected, not an
/// error.
///
/// # Arguments
///
/// * `depth` - Depth map of shape (height, width). Zero means no reading.
/// * `fov_deg` - Horizontal field of view in degrees, e.g. [DEFAULT_FOV_DEG].
pub fn depth_to_mesh(depth: &ArrayView2<f32>, fov_deg: f32) -> Mesh {
    let (height, width) = depth.dim();
    let focal = (height as f32 / 2.0) / (fov_deg.to_radians() / 2.0).tan();

    let mut vertices = Vec::with_capacity(height * width);
    let mut texcoords = Vec::with_capacity(height * width);
    // Vertex ids per pixel, 1-based; 0 is the "omit from faces" sentinel.
    let mut ids = Array2::<usize>::zeros((width, height));

    let mut vid = 1usize;
    for u in 0..width {
        for v in (0..height).rev() {
            let d = depth[(v, u)];
            ids[(u, v)] = if d == 0.0 { 0 } else { vid };
            vid += 1;

            let x = u as f32 - width as f32 / 2.0;
            let y = v as f32 - height as f32 / 2.0;
            let z = -focal;

            let inv_len = 1.0 / (x * x + y * y + z * z).sqrt();
            let t = d / (z * inv_len);

            vertices.push(Vector3::new(
                -t * x * inv_len,
                t * y * inv_len,
                -t * z * inv_len,
            ));

            // OBJ UVs have a bottom-left origin while image rows grow
            // downward, so the vertical coordinate is flipped.
            texcoords.push([
                u as f32 / width as f32,
                (height - 1 - v) as f32 / height as f32,
            ]);
        }
    }

    let mut faces = Vec::new();
    for u in 0..width.saturating_sub(1) {
        for v in 0..height.saturating_sub(1) {
            let v1 = ids[(u, v)];
            let v2 = ids[(u + 1, v)];
            let v3 = ids[(u, v + 1)];
            let v4 = ids[(u + 1, v + 1)];

            if v1 == 0 || v2 == 0 || v3 == 0 || v4 == 0 {
                continue;
            }

            faces.push([v1 - 1, v2 - 1, v3 - 1]);
            faces.push([v3 - 1, v2 - 1, v4 - 1]);
        }
    }

    Mesh {
        vertices,
        texcoords,
        faces,
    }
}

/// Back-projects every non-zero depth pixel into a camera-space point cloud
/// using a full intrinsic matrix.
pub fn depth_to_pointcloud(
    depth: &ArrayView2<f32>,
    intrinsics: &CameraIntrinsics,
) -> Vec<Vector3<f32>> {
    let mut points = Vec::new();
    for ((y, x), d) in depth.indexed_iter() {
        if *d != 0.0 {
            points.push(intrinsics.backproject(x as f32, y as f32, *d));
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::Array2;

    use crate::camera::{CameraIntrinsics, KINECT_V2_DEPTH};
    use crate::unit_test::block_depth;

    use super::*;

    #[test]
    fn test_all_zero_depth_yields_no_faces() {
        let depth = Array2::<f32>::zeros((4, 6));
        let mesh = depth_to_mesh(&depth.view(), DEFAULT_FOV_DEG);
        assert_eq!(mesh.num_faces(), 0);
        assert_eq!(mesh.num_vertices(), 24);
        assert_eq!(mesh.texcoords.len(), 24);
    }

    #[test]
    fn test_isolated_block_yields_two_faces() {
        let depth = block_depth(8, 8, 3, 3, 2, 1000.0);
        let mesh = depth_to_mesh(&depth.view(), DEFAULT_FOV_DEG);
        assert_eq!(mesh.num_faces(), 2);

        // Both faces reference only the block's four vertices.
        let mut referenced: Vec<usize> = mesh.faces.iter().flatten().copied().collect();
        referenced.sort_unstable();
        referenced.dedup();
        assert_eq!(referenced.len(), 4);
        for index in referenced {
            assert!(mesh.vertices[index].z != 0.0);
        }
    }

    #[test]
    fn test_vertex_z_matches_negated_depth() {
        let depth = Array2::<f32>::from_elem((6, 6), 800.0);
        let mesh = depth_to_mesh(&depth.view(), DEFAULT_FOV_DEG);
        for vertex in &mesh.vertices {
            assert_relative_eq!(vertex.z, -800.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_full_depth_map_triangulates_every_quad() {
        let depth = Array2::<f32>::from_elem((5, 7), 600.0);
        let mesh = depth_to_mesh(&depth.view(), DEFAULT_FOV_DEG);
        assert_eq!(mesh.num_faces(), 4 * 6 * 2);
    }

    #[test]
    fn test_texcoords_are_normalized() {
        let depth = Array2::<f32>::from_elem((4, 4), 600.0);
        let mesh = depth_to_mesh(&depth.view(), DEFAULT_FOV_DEG);
        for [s, t] in &mesh.texcoords {
            assert!(*s >= 0.0 && *s < 1.0);
            assert!(*t >= 0.0 && *t < 1.0);
        }
    }

    #[test]
    fn test_pointcloud_with_calibrated_intrinsics() {
        let depth = Array2::<f32>::from_elem((5, 5), 1000.0);
        let intrinsics = CameraIntrinsics::from_simple_intrinsic(365.0, 365.0, 2.0, 2.0);

        let points = depth_to_pointcloud(&depth.view(), &intrinsics);
        assert_eq!(points.len(), 25);
        // The principal-point pixel back-projects onto the optical axis.
        let center = points[2 * 5 + 2];
        assert_relative_eq!(center.x, 0.0);
        assert_relative_eq!(center.y, 0.0);
        assert_relative_eq!(center.z, 1000.0);
    }

    #[test]
    fn test_pointcloud_skips_empty_pixels() {
        let depth = block_depth(8, 8, 2, 2, 3, 1200.0);
        let intrinsics = CameraIntrinsics::from_fov(&KINECT_V2_DEPTH.fov, 8, 8);
        let points = depth_to_pointcloud(&depth.view(), &intrinsics);
        assert_eq!(points.len(), 9);
        for point in points {
            assert_relative_eq!(point.z, 1200.0);
        }
    }
}
