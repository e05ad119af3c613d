use ndarray::Array2;
use num::clamp;

/// Builds an elliptical structuring element of odd `size` x `size` pixels,
/// matching OpenCV's `MORPH_ELLIPSE` rasterization.
pub fn ellipse_kernel(size: usize) -> Array2<bool> {
    assert!(size % 2 == 1, "structuring element size must be odd");

    let radius = (size / 2) as i32;
    let inv_r2 = if radius > 0 {
        1.0 / (radius * radius) as f64
    } else {
        0.0
    };

    let mut kernel = Array2::from_elem((size, size), false);
    for row in 0..size {
        let dy = row as i32 - radius;
        let dx = if dy.abs() <= radius {
            (radius as f64 * ((radius * radius - dy * dy) as f64 * inv_r2).sqrt()) as i32
        } else {
            0
        };

        for col in (radius - dx).max(0)..=(radius + dx).min(size as i32 - 1) {
            kernel[(row, col as usize)] = true;
        }
    }

    kernel
}

fn morph_pass(
    image: &Array2<u8>,
    kernel: &Array2<bool>,
    fold: impl Fn(u8, u8) -> u8,
    init: u8,
) -> Array2<u8> {
    let (height, width) = image.dim();
    let (k_height, k_width) = kernel.dim();
    let anchor_y = (k_height / 2) as i32;
    let anchor_x = (k_width / 2) as i32;

    let mut output = Array2::from_elem((height, width), init);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let mut value = init;
            for ky in 0..k_height as i32 {
                for kx in 0..k_width as i32 {
                    if !kernel[(ky as usize, kx as usize)] {
                        continue;
                    }
                    let sy = y + ky - anchor_y;
                    let sx = x + kx - anchor_x;
                    if sy < 0 || sy >= height as i32 || sx < 0 || sx >= width as i32 {
                        continue;
                    }
                    value = fold(value, image[(sy as usize, sx as usize)]);
                }
            }
            output[(y as usize, x as usize)] = value;
        }
    }

    output
}

/// Morphological erosion of a 0/255 mask image. Out-of-bounds neighbors are
/// ignored rather than treated as background.
pub fn erode(image: &Array2<u8>, kernel: &Array2<bool>, iterations: usize) -> Array2<u8> {
    let mut output = image.clone();
    for _ in 0..iterations {
        output = morph_pass(&output, kernel, |acc, v| acc.min(v), u8::MAX);
    }
    output
}

/// Morphological dilation of a 0/255 mask image.
pub fn dilate(image: &Array2<u8>, kernel: &Array2<bool>, iterations: usize) -> Array2<u8> {
    let mut output = image.clone();
    for _ in 0..iterations {
        output = morph_pass(&output, kernel, |acc, v| acc.max(v), u8::MIN);
    }
    output
}

/// 5x5 separable Gaussian smoothing with replicated borders. The weights are
/// the binomial approximation OpenCV uses for small kernels.
pub fn gaussian_blur_5x5(image: &Array2<u8>) -> Array2<u8> {
    const WEIGHTS: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];
    let (height, width) = image.dim();

    let mut horizontal = Array2::<f32>::zeros((height, width));
    for y in 0..height {
        for x in 0..width as i32 {
            let mut sum = 0.0;
            for (tap, weight) in WEIGHTS.iter().enumerate() {
                let sx = clamp(x + tap as i32 - 2, 0, width as i32 - 1);
                sum += image[(y, sx as usize)] as f32 * weight;
            }
            horizontal[(y, x as usize)] = sum;
        }
    }

    let mut output = Array2::<u8>::zeros((height, width));
    for y in 0..height as i32 {
        for x in 0..width {
            let mut sum = 0.0;
            for (tap, weight) in WEIGHTS.iter().enumerate() {
                let sy = clamp(y + tap as i32 - 2, 0, height as i32 - 1);
                sum += horizontal[(sy as usize, x)] * weight;
            }
            output[(y as usize, x)] = sum.round().min(255.0) as u8;
        }
    }

    output
}
