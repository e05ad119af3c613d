use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3};
use serde_derive::{Deserialize, Serialize};

use crate::camera::SensorSpec;
use crate::error::DcapError;

/// Crop margins and output resolution used to align the color and depth
/// streams of one sensor pairing.
///
/// The margins derived from the nominal fields of view are only a baseline;
/// real sensors deviate from their spec sheet, so the final values are
/// calibration data loaded per sensor model (see [AlignmentParams::kinect_v2]
/// for empirically corrected Kinect v2 margins).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentParams {
    /// Pixels cropped from the left side of the color image.
    pub color_crop_left: usize,
    /// Pixels cropped from the right side of the color image.
    pub color_crop_right: usize,
    /// Pixels cropped from the top of the depth map.
    pub depth_crop_top: usize,
    /// Pixels cropped from the bottom of the depth map.
    pub depth_crop_bottom: usize,
    /// Width of both output arrays.
    pub out_width: usize,
    /// Height of both output arrays.
    pub out_height: usize,
}

impl AlignmentParams {
    /// Empirically corrected margins for the Kinect v2 color/depth pairing.
    /// The crop total (482px) differs from the 437px the pure geometry gives;
    /// the split was tuned by trial and error on real captures.
    pub fn kinect_v2() -> Self {
        Self {
            color_crop_left: 295,
            color_crop_right: 187,
            depth_crop_top: 19,
            depth_crop_bottom: 32,
            out_width: 512,
            out_height: 373,
        }
    }

    /// Derives baseline crop margins from the nominal sensor geometry.
    ///
    /// The color sensor's baseline (lens to image plane distance in pixels)
    /// is computed from its vertical field of view. The depth sensor's image
    /// plane is then expressed in color-sensor pixels: the color image is
    /// cropped horizontally down to that plane width, and the depth map is
    /// cropped vertically down to the color plane's height. Odd crop totals
    /// put the extra pixel on the right/bottom side.
    pub fn derive(color: &SensorSpec, depth: &SensorSpec) -> Self {
        let baseline = color.fov.vertical_baseline(color.height);

        let depth_plane_width = depth.fov.plane_width(baseline).round() as usize;
        let color_crop_total = color.width.saturating_sub(depth_plane_width);
        let color_crop_left = color_crop_total / 2;
        let color_crop_right = color_crop_total - color_crop_left;

        let depth_plane_height = depth.fov.plane_height(baseline);
        let out_height =
            (color.height as f64 / depth_plane_height * depth.height as f64).round() as usize;
        let depth_crop_total = depth.height.saturating_sub(out_height);
        let depth_crop_top = depth_crop_total / 2;
        let depth_crop_bottom = depth_crop_total - depth_crop_top;

        Self {
            color_crop_left,
            color_crop_right,
            depth_crop_top,
            depth_crop_bottom,
            out_width: depth.width,
            out_height,
        }
    }

    /// Loads calibrated margins from a JSON file.
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, DcapError> {
        let file = std::fs::File::open(path)?;
        let buffer = std::io::BufReader::new(file);
        serde_json::from_reader(buffer).map_err(DcapError::invalid_parameter)
    }
}

/// Crops and resizes a raw color/depth pair so both arrays have the same
/// dimensions and pixel (x, y) in each refers to the same physical direction.
///
/// The color image is cropped on its horizontal axis and resampled down to
/// the depth resolution; the depth map is cropped on its vertical axis. This
/// matches sensors whose color stream has the wider horizontal field of view
/// and whose depth stream has the wider vertical one.
///
/// # Arguments
///
/// * `color` - Raw BGR color image, shape (height, width, 3).
/// * `depth` - Raw depth map in millimeters, shape (height, width).
/// * `params` - Crop margins calibrated for the sensor pairing.
///
/// # Returns
///
/// The aligned (color, depth) pair, both `params.out_height` x `params.out_width`.
pub fn align_frames(
    color: &ArrayView3<u8>,
    depth: &ArrayView2<f32>,
    params: &AlignmentParams,
) -> Result<(Array3<u8>, Array2<f32>), DcapError> {
    let (_, color_width, channels) = color.dim();
    if channels != 3 {
        return Err(DcapError::dimension_mismatch(format!(
            "color image has {} channels, expected 3",
            channels
        )));
    }

    let (depth_height, depth_width) = depth.dim();
    if params.color_crop_left + params.color_crop_right >= color_width {
        return Err(DcapError::invalid_parameter(format!(
            "horizontal crop {}+{} exceeds color width {}",
            params.color_crop_left, params.color_crop_right, color_width
        )));
    }
    if params.depth_crop_top + params.depth_crop_bottom >= depth_height {
        return Err(DcapError::invalid_parameter(format!(
            "vertical crop {}+{} exceeds depth height {}",
            params.depth_crop_top, params.depth_crop_bottom, depth_height
        )));
    }
    if depth_width != params.out_width {
        return Err(DcapError::dimension_mismatch(format!(
            "depth map is {} pixels wide, expected {}",
            depth_width, params.out_width
        )));
    }
    if depth_height - params.depth_crop_top - params.depth_crop_bottom != params.out_height {
        return Err(DcapError::dimension_mismatch(format!(
            "cropped depth height {} does not match output height {}",
            depth_height - params.depth_crop_top - params.depth_crop_bottom,
            params.out_height
        )));
    }

    let color_cropped = color.slice(s![
        ..,
        params.color_crop_left..color_width - params.color_crop_right,
        ..
    ]);
    let color_aligned = resize_color(&color_cropped, params.out_height, params.out_width);

    let depth_aligned = depth
        .slice(s![
            params.depth_crop_top..depth_height - params.depth_crop_bottom,
            ..
        ])
        .to_owned();

    Ok((color_aligned, depth_aligned))
}

fn integer_fractional(x: f32) -> (usize, f32) {
    let x_int = x as usize;
    let x_frac = x.fract();

    (x_int, x_frac)
}

/// Resizes a 3-channel color image using bilinear interpolation.
pub fn resize_color(color: &ArrayView3<u8>, dst_height: usize, dst_width: usize) -> Array3<u8> {
    let (src_height, src_width, _) = color.dim();
    let mut dst_image = Array3::<u8>::zeros((dst_height, dst_width, 3));

    let height_ratio = src_height as f32 / dst_height as f32;
    let width_ratio = src_width as f32 / dst_width as f32;

    for i_dst in 0..dst_height {
        let (i_src, i_frac) = integer_fractional(i_dst as f32 * height_ratio);
        let i_next = (i_src + 1).min(src_height - 1);

        for j_dst in 0..dst_width {
            let (j_src, j_frac) = integer_fractional(j_dst as f32 * width_ratio);
            let j_next = (j_src + 1).min(src_width - 1);

            for channel in 0..3 {
                let v00 = color[(i_src, j_src, channel)] as f32;
                let v01 = color[(i_src, j_next, channel)] as f32;
                let v10 = color[(i_next, j_src, channel)] as f32;
                let v11 = color[(i_next, j_next, channel)] as f32;

                let u0_frac = v00 * (1.0 - j_frac) + v01 * j_frac;
                let u1_frac = v10 * (1.0 - j_frac) + v11 * j_frac;
                let value = u0_frac * (1.0 - i_frac) + u1_frac * i_frac;

                dst_image[(i_dst, j_dst, channel)] = value.round() as u8;
            }
        }
    }

    dst_image
}
