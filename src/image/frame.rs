use ndarray::{Array2, Array3};

use crate::error::DcapError;

/// One fully processed RGB-D datapoint: a BGR color image, a normalized depth
/// map, a surface normal map and the foreground mask. All four arrays share
/// pixel-for-pixel spatial correspondence.
pub struct Frame {
    /// BGR color image, shape (height, width, 3), masked pixels zeroed.
    pub color: Array3<u8>,
    /// Depth map normalized to [0, 1], shape (height, width), masked pixels zeroed.
    pub depth: Array2<f32>,
    /// Surface normals rescaled into [0, 1], shape (height, width, 3).
    pub normals: Array3<f32>,
    /// `true` marks background/excluded pixels.
    pub mask: Array2<bool>,
}

impl Frame {
    pub fn new(
        color: Array3<u8>,
        depth: Array2<f32>,
        normals: Array3<f32>,
        mask: Array2<bool>,
    ) -> Result<Self, DcapError> {
        let dim = depth.dim();
        if color.dim() != (dim.0, dim.1, 3) {
            return Err(DcapError::dimension_mismatch(format!(
                "color is {:?}, expected ({}, {}, 3)",
                color.dim(),
                dim.0,
                dim.1
            )));
        }
        if normals.dim() != (dim.0, dim.1, 3) {
            return Err(DcapError::dimension_mismatch(format!(
                "normals is {:?}, expected ({}, {}, 3)",
                normals.dim(),
                dim.0,
                dim.1
            )));
        }
        if mask.dim() != dim {
            return Err(DcapError::dimension_mismatch(format!(
                "mask is {:?}, expected {:?}",
                mask.dim(),
                dim
            )));
        }

        Ok(Self {
            color,
            depth,
            normals,
            mask,
        })
    }

    pub fn width(&self) -> usize {
        self.depth.dim().1
    }

    pub fn height(&self) -> usize {
        self.depth.dim().0
    }
}
