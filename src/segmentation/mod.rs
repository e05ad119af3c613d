mod morphology;
pub use morphology::{dilate, ellipse_kernel, erode, gaussian_blur_5x5};

mod skin;
pub use skin::{mask_skin, SkinRange};

mod artefact;
pub use artefact::{artefact_mask, connected_components, largest_component};

mod inpaint;
pub use inpaint::inpaint;

use log::warn;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Zip};
use serde_derive::{Deserialize, Serialize};

use crate::error::DcapError;
use crate::image::{bgr_to_hsv, equalize_channel, hsv_to_bgr};

/// Parameters of one segmentation pass. Immutable value struct, one per call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentParams {
    /// Minimum depth kept, in millimeters.
    pub min_depth: f32,
    /// Maximum depth kept, in millimeters.
    pub max_depth: f32,
    /// Exclude skin-colored pixels.
    pub remove_skin: bool,
    /// Exclude everything outside the largest connected depth blob.
    pub remove_artefacts: bool,
    pub skin_range: SkinRange,
    /// Smoothing radius of the depth hole filling.
    pub inpaint_radius: usize,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            min_depth: 500.0,
            max_depth: 1500.0,
            remove_skin: true,
            remove_artefacts: true,
            skin_range: SkinRange::default(),
            inpaint_radius: 7,
        }
    }
}

/// Output of [segment]: masked color, normalized masked depth and the
/// combined exclusion mask.
pub struct Segmented {
    /// BGR color image with excluded pixels zeroed.
    pub color: Array3<u8>,
    /// Depth normalized into [0, 1]; excluded pixels are exactly 0.
    pub depth: Array2<f32>,
    /// `true` marks excluded pixels. Union of the enabled sub-masks.
    pub mask: Array2<bool>,
}

/// Segments the foreground of an aligned color/depth pair.
///
/// The exclusion mask is the logical OR of up to three sub-masks: the depth
/// range mask (always on), the skin mask and the artefact mask (both
/// optional). Depth is rescaled into [0, 1] over the configured range, holes
/// are inpainted for a smooth surface, and color/depth values under the
/// final mask are zeroed.
///
/// When the artefact mask finds no connected component (everything already
/// excluded) the failure is logged and the mask is left unchanged.
pub fn segment(
    color: &ArrayView3<u8>,
    depth: &ArrayView2<f32>,
    params: &SegmentParams,
) -> Result<Segmented, DcapError> {
    let (height, width) = depth.dim();
    if color.dim() != (height, width, 3) {
        return Err(DcapError::dimension_mismatch(format!(
            "color is {:?}, depth is {:?}",
            color.dim(),
            depth.dim()
        )));
    }
    if params.max_depth <= params.min_depth {
        return Err(DcapError::invalid_parameter(format!(
            "depth range [{}, {}] is empty",
            params.min_depth, params.max_depth
        )));
    }

    // Range mask: keep only surfaces inside the configured depth window.
    let mut mask = depth.map(|d| *d > params.max_depth || *d < params.min_depth);

    if params.remove_skin {
        let skin = mask_skin(color, &params.skin_range);
        Zip::from(&mut mask)
            .and(&skin)
            .for_each(|excluded, skin| *excluded = *excluded || *skin);
    }

    let range = params.max_depth - params.min_depth;
    let mut depth_norm = Array2::<f32>::zeros((height, width));
    Zip::from(&mut depth_norm)
        .and(depth)
        .par_for_each(|out, d| *out = ((d - params.min_depth) / range).max(0.0));

    if params.remove_artefacts {
        match artefact_mask(&depth_norm.view(), &mask) {
            Some(artefacts) => {
                Zip::from(&mut mask)
                    .and(&artefacts)
                    .for_each(|excluded, artefact| *excluded = *excluded || *artefact);
            }
            None => {
                warn!("artefact mask found no connected component, keeping current mask");
            }
        }
    }

    // Fill depth holes; the combined mask marks untrusted regions too. The
    // fill is cosmetic inside excluded regions and gets re-zeroed below.
    let mut holes = mask.clone();
    Zip::from(&mut holes)
        .and(&depth_norm)
        .for_each(|hole, d| *hole = *hole || *d == 0.0);
    let mut depth_out = inpaint(&depth_norm.view(), &holes, params.inpaint_radius);

    Zip::from(&mut depth_out).and(&mask).for_each(|d, excluded| {
        if *excluded {
            *d = 0.0;
        }
    });

    let mut color_out = color.to_owned();
    for row in 0..height {
        for col in 0..width {
            if mask[(row, col)] {
                color_out[(row, col, 0)] = 0;
                color_out[(row, col, 1)] = 0;
                color_out[(row, col, 2)] = 0;
            }
        }
    }

    Ok(Segmented {
        color: color_out,
        depth: depth_out,
        mask,
    })
}

/// Equalizes the brightness of a BGR image by histogram-equalizing the value
/// channel in HSV space.
pub fn normalize_brightness(color: &ArrayView3<u8>) -> Array3<u8> {
    let mut hsv = bgr_to_hsv(color);
    equalize_channel(&mut hsv, 2);
    hsv_to_bgr(&hsv.view())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{array, Array2, Array3};

    use crate::unit_test::neutral_color;

    use super::*;

    fn range_only() -> SegmentParams {
        SegmentParams {
            remove_skin: false,
            remove_artefacts: false,
            ..SegmentParams::default()
        }
    }

    #[test]
    fn test_flat_depth_scenario() {
        let depth = array![[1000.0f32, 1000.0], [1000.0, 1000.0]];
        let color = neutral_color(2, 2);

        let result = segment(&color.view(), &depth.view(), &range_only()).unwrap();
        for value in result.depth.iter() {
            assert_relative_eq!(*value, 0.5);
        }
        assert!(result.mask.iter().all(|excluded| !*excluded));
    }

    #[test]
    fn test_range_only_mask_is_exact() {
        let depth = array![
            [400.0f32, 700.0, 1600.0],
            [500.0, 1500.0, 0.0],
            [499.9, 1500.1, 1000.0]
        ];
        let color = neutral_color(3, 3);

        let result = segment(&color.view(), &depth.view(), &range_only()).unwrap();
        let expected = depth.map(|d| *d > 1500.0 || *d < 500.0);
        assert_eq!(result.mask, expected);
    }

    #[test]
    fn test_combined_mask_is_superset_of_range_mask() {
        let mut depth = Array2::<f32>::from_elem((16, 16), 1000.0);
        depth[(0, 0)] = 100.0;
        depth[(8, 8)] = 2000.0;
        let color = neutral_color(16, 16);

        let range_mask = segment(&color.view(), &depth.view(), &range_only())
            .unwrap()
            .mask;
        let full_mask = segment(&color.view(), &depth.view(), &SegmentParams::default())
            .unwrap()
            .mask;

        for (range, full) in range_mask.iter().zip(full_mask.iter()) {
            assert!(*full || !*range);
        }
    }

    #[test]
    fn test_masked_pixels_are_zeroed() {
        let depth = array![[1000.0f32, 4000.0], [250.0, 800.0]];
        let mut color = neutral_color(2, 2);
        color[(0, 1, 0)] = 200;

        let result = segment(&color.view(), &depth.view(), &range_only()).unwrap();
        assert_eq!(result.color[(0, 1, 0)], 0);
        assert_relative_eq!(result.depth[(0, 1)], 0.0);
        assert_relative_eq!(result.depth[(1, 0)], 0.0);
        // Non-masked pixels stay inside [0, 1].
        assert!(result.depth[(0, 0)] >= 0.0 && result.depth[(0, 0)] <= 1.0);
        assert!(result.depth[(1, 1)] >= 0.0 && result.depth[(1, 1)] <= 1.0);
    }

    #[test]
    fn test_normalize_brightness_spreads_gray_levels() {
        // Two gray levels stretch to the full value range; gray stays gray.
        let mut color = Array3::<u8>::zeros((4, 4, 3));
        for row in 0..4 {
            for col in 0..4 {
                let level = if col < 2 { 100 } else { 180 };
                for channel in 0..3 {
                    color[(row, col, channel)] = level;
                }
            }
        }

        let equalized = normalize_brightness(&color.view());
        for row in 0..4 {
            for col in 0..4 {
                let expected = if col < 2 { 0 } else { 255 };
                for channel in 0..3 {
                    assert_eq!(equalized[(row, col, channel)], expected);
                }
            }
        }
    }

    #[test]
    fn test_dimension_mismatch_is_fatal() {
        let depth = Array2::<f32>::zeros((4, 4));
        let color = Array3::<u8>::zeros((4, 5, 3));
        assert!(segment(&color.view(), &depth.view(), &range_only()).is_err());
    }

    #[test]
    fn test_artefact_failure_keeps_range_mask() {
        // Everything out of range: the artefact pass has nothing to label.
        let depth = Array2::<f32>::from_elem((8, 8), 5000.0);
        let color = neutral_color(8, 8);
        let params = SegmentParams {
            remove_skin: false,
            ..SegmentParams::default()
        };

        let result = segment(&color.view(), &depth.view(), &params).unwrap();
        assert!(result.mask.iter().all(|excluded| *excluded));
    }
}
