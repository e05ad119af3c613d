use ndarray::{Array2, ArrayView3};
use serde_derive::{Deserialize, Serialize};

use crate::image::bgr_to_hsv;

use super::morphology::{dilate, ellipse_kernel, erode, gaussian_blur_5x5};

/// HSV bounds of pixel intensities considered skin, in OpenCV's u8
/// convention (hue 0-179).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkinRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl Default for SkinRange {
    fn default() -> Self {
        Self {
            lower: [0, 0, 0],
            upper: [50, 255, 255],
        }
    }
}

impl SkinRange {
    fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        h >= self.lower[0]
            && h <= self.upper[0]
            && s >= self.lower[1]
            && s <= self.upper[1]
            && v >= self.lower[2]
            && v <= self.upper[2]
    }
}

/// Detects skin-colored pixels of a BGR image.
///
/// The image is converted to HSV and thresholded against `range`; an erosion
/// and dilation pass (7x7 elliptical element, 2 iterations each) removes
/// speckle and closes small gaps, and a Gaussian blur softens the boundary
/// before the final threshold.
pub fn mask_skin(color: &ArrayView3<u8>, range: &SkinRange) -> Array2<bool> {
    let hsv = bgr_to_hsv(color);
    let (height, width, _) = hsv.dim();

    let mut skin = Array2::<u8>::zeros((height, width));
    for row in 0..height {
        for col in 0..width {
            if range.contains(hsv[(row, col, 0)], hsv[(row, col, 1)], hsv[(row, col, 2)]) {
                skin[(row, col)] = 255;
            }
        }
    }

    let kernel = ellipse_kernel(7);
    let skin = erode(&skin, &kernel, 2);
    let skin = dilate(&skin, &kernel, 2);
    let skin = gaussian_blur_5x5(&skin);

    skin.map(|value| *value != 0)
}
