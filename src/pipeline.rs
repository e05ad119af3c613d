use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};
use rayon::prelude::*;
use serde_derive::{Deserialize, Serialize};

use crate::error::DcapError;
use crate::image::Frame;
use crate::normal_estimation::depth_to_normals;
use crate::segmentation::{segment, SegmentParams};

/// Minimum depth the sensor can resolve, in millimeters.
pub const NEAR_LIMIT: f32 = 500.0;
/// Maximum depth the sensor can resolve, in millimeters.
pub const FAR_LIMIT: f32 = 4500.0;

/// Capture viewport: pixel crops on each side plus the kept depth window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Pixels cropped on the left side.
    pub left: usize,
    /// Pixels cropped on the right side.
    pub right: usize,
    /// Pixels cropped on the top side.
    pub top: usize,
    /// Pixels cropped on the bottom side.
    pub bottom: usize,
    /// Minimum kept depth in millimeters.
    pub near: f32,
    /// Maximum kept depth in millimeters.
    pub far: f32,
}

impl Viewport {
    /// Builds a viewport, snapping out-of-bounds depth limits back to the
    /// sensor range: `near` must satisfy `NEAR_LIMIT <= near < far` and
    /// `far` must satisfy `near < far <= FAR_LIMIT`.
    pub fn new(left: usize, right: usize, top: usize, bottom: usize, near: f32, far: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
            near: if (NEAR_LIMIT..far).contains(&near) {
                near
            } else {
                NEAR_LIMIT
            },
            far: if near < far && far <= FAR_LIMIT {
                far
            } else {
                FAR_LIMIT
            },
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            left: 0,
            right: 0,
            top: 0,
            bottom: 0,
            near: NEAR_LIMIT,
            far: FAR_LIMIT,
        }
    }
}

/// Filters applied on the data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Remove skin-colored pixels, keeping clothes only.
    pub skin: bool,
    /// Remove small artefacts left over by the other filters.
    pub noise: bool,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            skin: true,
            noise: true,
        }
    }
}

/// Crops an aligned color/depth pair along the x and y axes of the viewport.
pub fn crop_viewport(
    color: &ArrayView3<u8>,
    depth: &ArrayView2<f32>,
    viewport: &Viewport,
) -> Result<(Array3<u8>, Array2<f32>), DcapError> {
    let (height, width) = depth.dim();
    if color.dim() != (height, width, 3) {
        return Err(DcapError::dimension_mismatch(format!(
            "color is {:?}, depth is {:?}",
            color.dim(),
            depth.dim()
        )));
    }
    if viewport.left + viewport.right >= width || viewport.top + viewport.bottom >= height {
        return Err(DcapError::invalid_parameter(format!(
            "viewport crop ({}, {}, {}, {}) leaves no pixels of a {}x{} frame",
            viewport.left, viewport.right, viewport.top, viewport.bottom, width, height
        )));
    }

    let color = color
        .slice(s![
            viewport.top..height - viewport.bottom,
            viewport.left..width - viewport.right,
            ..
        ])
        .to_owned();
    let depth = depth
        .slice(s![
            viewport.top..height - viewport.bottom,
            viewport.left..width - viewport.right
        ])
        .to_owned();

    Ok((color, depth))
}

/// Runs the full per-frame pipeline on one aligned color/depth pair:
/// viewport crop, foreground segmentation, depth normalization and surface
/// normal estimation.
///
/// Pure and stateless; every invocation is independent, so frames may be
/// processed concurrently by the caller.
pub fn process_frame(
    color: &ArrayView3<u8>,
    depth: &ArrayView2<f32>,
    viewport: &Viewport,
    filters: &Filters,
) -> Result<Frame, DcapError> {
    let (color, depth) = crop_viewport(color, depth, viewport)?;

    let params = SegmentParams {
        min_depth: viewport.near,
        max_depth: viewport.far,
        remove_skin: filters.skin,
        remove_artefacts: filters.noise,
        ..SegmentParams::default()
    };
    let segmented = segment(&color.view(), &depth.view(), &params)?;

    let mut normals = depth_to_normals(&segmented.depth.view());
    Zip::from(normals.axis_iter_mut(Axis(2)))
        .for_each(|mut channel| {
            Zip::from(&mut channel).and(&segmented.mask).for_each(|n, excluded| {
                if *excluded {
                    *n = 0.0;
                }
            });
        });

    Frame::new(segmented.color, segmented.depth, normals, segmented.mask)
}

/// Processes a batch of frame pairs in parallel. Every pipeline invocation
/// is independent, so results match processing the pairs one by one.
pub fn process_batch(
    pairs: &[(Array3<u8>, Array2<f32>)],
    viewport: &Viewport,
    filters: &Filters,
) -> Result<Vec<Frame>, DcapError> {
    pairs
        .par_iter()
        .map(|(color, depth)| process_frame(&color.view(), &depth.view(), viewport, filters))
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::Array2;

    use crate::unit_test::neutral_color;

    use super::*;

    #[test]
    fn test_viewport_clamps_depth_window() {
        let viewport = Viewport::new(0, 0, 0, 0, 100.0, 9000.0);
        assert_relative_eq!(viewport.near, NEAR_LIMIT);
        assert_relative_eq!(viewport.far, FAR_LIMIT);

        let viewport = Viewport::new(0, 0, 0, 0, 600.0, 1200.0);
        assert_relative_eq!(viewport.near, 600.0);
        assert_relative_eq!(viewport.far, 1200.0);
    }

    #[test]
    fn test_crop_viewport_dimensions() {
        let color = neutral_color(10, 12);
        let depth = Array2::<f32>::zeros((10, 12));
        let viewport = Viewport::new(2, 1, 3, 1, 500.0, 1500.0);

        let (color, depth) = crop_viewport(&color.view(), &depth.view(), &viewport).unwrap();
        assert_eq!(color.dim(), (6, 9, 3));
        assert_eq!(depth.dim(), (6, 9));
    }

    #[test]
    fn test_process_frame_flat_scene() {
        let color = neutral_color(12, 12);
        let depth = Array2::<f32>::from_elem((12, 12), 1000.0);
        let viewport = Viewport::new(0, 0, 0, 0, 500.0, 1500.0);
        let filters = Filters {
            skin: false,
            noise: false,
        };

        let frame = process_frame(&color.view(), &depth.view(), &viewport, &filters).unwrap();
        assert_eq!(frame.width(), 12);
        assert_eq!(frame.height(), 12);
        assert!(frame.mask.iter().all(|excluded| !*excluded));
        for value in frame.depth.iter() {
            assert_relative_eq!(*value, 0.5);
        }
        // Flat surface: every normal points at the camera.
        assert_relative_eq!(frame.normals[(6, 6, 2)], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_process_frame_zeroes_normals_under_mask() {
        let color = neutral_color(8, 8);
        let mut depth = Array2::<f32>::from_elem((8, 8), 1000.0);
        depth[(0, 0)] = 2000.0;
        let viewport = Viewport::new(0, 0, 0, 0, 500.0, 1500.0);
        let filters = Filters {
            skin: false,
            noise: false,
        };

        let frame = process_frame(&color.view(), &depth.view(), &viewport, &filters).unwrap();
        assert!(frame.mask[(0, 0)]);
        for channel in 0..3 {
            assert_relative_eq!(frame.normals[(0, 0, channel)], 0.0);
        }
    }

    #[test]
    fn test_batch_matches_sequential_processing() {
        let viewport = Viewport::new(0, 0, 0, 0, 500.0, 1500.0);
        let filters = Filters {
            skin: false,
            noise: false,
        };
        let pairs: Vec<_> = (0..4)
            .map(|i| {
                (
                    neutral_color(8, 8),
                    Array2::<f32>::from_elem((8, 8), 800.0 + i as f32 * 100.0),
                )
            })
            .collect();

        let frames = process_batch(&pairs, &viewport, &filters).unwrap();
        assert_eq!(frames.len(), 4);
        for (frame, (_, depth)) in frames.iter().zip(pairs.iter()) {
            let sequential =
                process_frame(&pairs[0].0.view(), &depth.view(), &viewport, &filters).unwrap();
            assert_eq!(frame.depth, sequential.depth);
            assert_eq!(frame.mask, sequential.mask);
        }
    }

    #[test]
    fn test_process_frame_rejects_mismatched_pair() {
        let color = neutral_color(8, 9);
        let depth = Array2::<f32>::zeros((8, 8));
        let result = process_frame(
            &color.view(),
            &depth.view(),
            &Viewport::default(),
            &Filters::default(),
        );
        assert!(result.is_err());
    }
}
