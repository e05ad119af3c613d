use ndarray::{Array2, Array3, ArrayView2, Axis, Zip};
use num::clamp;

/// 5x5 Sobel derivative taps: a smoothing kernel applied across the gradient
/// and a derivative kernel applied along it.
const SOBEL_SMOOTH: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
const SOBEL_DERIVATIVE: [f32; 5] = [-1.0, -2.0, 0.0, 2.0, 1.0];

fn separable_filter(
    image: &ArrayView2<f32>,
    row_kernel: &[f32; 5],
    col_kernel: &[f32; 5],
) -> Array2<f32> {
    let (height, width) = image.dim();

    // Horizontal pass with replicated borders.
    let mut horizontal = Array2::<f32>::zeros((height, width));
    for y in 0..height {
        for x in 0..width as i32 {
            let mut sum = 0.0;
            for (tap, weight) in row_kernel.iter().enumerate() {
                let sx = clamp(x + tap as i32 - 2, 0, width as i32 - 1);
                sum += image[(y, sx as usize)] * weight;
            }
            horizontal[(y, x as usize)] = sum;
        }
    }

    let mut output = Array2::<f32>::zeros((height, width));
    for y in 0..height as i32 {
        for x in 0..width {
            let mut sum = 0.0;
            for (tap, weight) in col_kernel.iter().enumerate() {
                let sy = clamp(y + tap as i32 - 2, 0, height as i32 - 1);
                sum += horizontal[(sy as usize, x)] * weight;
            }
            output[(y as usize, x)] = sum;
        }
    }

    output
}

/// Horizontal depth gradient (5x5 Sobel).
pub fn sobel_dx(depth: &ArrayView2<f32>) -> Array2<f32> {
    separable_filter(depth, &SOBEL_DERIVATIVE, &SOBEL_SMOOTH)
}

/// Vertical depth gradient (5x5 Sobel).
pub fn sobel_dy(depth: &ArrayView2<f32>) -> Array2<f32> {
    separable_filter(depth, &SOBEL_SMOOTH, &SOBEL_DERIVATIVE)
}

/// Computes a surface normal map from a depth map.
///
/// The unnormalized normal at each pixel is `(-dz/dx, -dz/dy, 1)`, rescaled
/// to unit length and remapped from [-1, 1] into [0, 1] for storage. A pixel
/// whose gradient vector degenerates to zero length gets the unit +Z normal
/// instead of dividing by zero.
///
/// # Arguments
///
/// * `depth` - A depth map of shape (height, width).
///
/// # Returns
///
/// The normal map, shape (height, width, 3).
pub fn depth_to_normals(depth: &ArrayView2<f32>) -> Array3<f32> {
    let (height, width) = depth.dim();
    let zx = sobel_dx(depth);
    let zy = sobel_dy(depth);

    let mut normals = Array3::<f32>::zeros((height, width, 3));
    Zip::from(normals.axis_iter_mut(Axis(0)))
        .and(zx.axis_iter(Axis(0)))
        .and(zy.axis_iter(Axis(0)))
        .par_for_each(|mut normal_row, zx_row, zy_row| {
            for (col, (dx, dy)) in zx_row.iter().zip(zy_row.iter()).enumerate() {
                let (nx, ny, nz) = (-dx, -dy, 1.0f32);
                let norm = (nx * nx + ny * ny + nz * nz).sqrt();

                let (nx, ny, nz) = if norm > f32::EPSILON {
                    (nx / norm, ny / norm, nz / norm)
                } else {
                    (0.0, 0.0, 1.0)
                };

                normal_row[(col, 0)] = (nx + 1.0) / 2.0;
                normal_row[(col, 1)] = (ny + 1.0) / 2.0;
                normal_row[(col, 2)] = (nz + 1.0) / 2.0;
            }
        });

    normals
}
