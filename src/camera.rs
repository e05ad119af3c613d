use nalgebra::Vector3;

/// Camera intrinsic parameters.
#[derive(Clone, Debug)]
pub struct CameraIntrinsics {
    /// Focal length and pixel scale in the X-axis.
    pub fx: f64,
    /// Focal length and pixel scale in the Y-axis.
    pub fy: f64,
    /// Camera X-center.
    pub cx: f64,
    /// Camera Y-center.
    pub cy: f64,
    pub width: Option<usize>,
    pub height: Option<usize>,
}

impl CameraIntrinsics {
    /// Build intrinsics from an externally calibrated parameter set, e.g. the
    /// factory calibration a sensor SDK exposes. Prefer this over
    /// [CameraIntrinsics::from_fov] whenever a real calibration is available.
    pub fn from_simple_intrinsic(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            width: None,
            height: None,
        }
    }

    /// Build intrinsics for a pinhole camera with the given field of view,
    /// centered on the image midpoint.
    pub fn from_fov(fov: &SensorFov, width: usize, height: usize) -> Self {
        Self {
            fx: fov.horizontal_baseline(width),
            fy: fov.vertical_baseline(height),
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
            width: Some(width),
            height: Some(height),
        }
    }

    /// Project a 3D point into image space.
    ///
    /// # Arguments
    ///
    /// * point: The 3D point.
    ///
    /// # Returns
    ///
    /// * (x and y) coordinates.
    pub fn project(&self, point: &Vector3<f32>) -> (f32, f32) {
        (
            point[0] * self.fx as f32 / point[2] + self.cx as f32,
            point[1] * self.fy as f32 / point[2] + self.cy as f32,
        )
    }

    /// Back-project a pixel plus its depth value into a camera-space 3D point.
    pub fn backproject(&self, x: f32, y: f32, z: f32) -> Vector3<f32> {
        Vector3::new(
            (x - self.cx as f32) * z / self.fx as f32,
            (y - self.cy as f32) * z / self.fy as f32,
            z,
        )
    }

}

/// Angular extents of a sensor, in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorFov {
    pub horizontal_deg: f64,
    pub vertical_deg: f64,
}

impl SensorFov {
    pub fn new(horizontal_deg: f64, vertical_deg: f64) -> Self {
        Self {
            horizontal_deg,
            vertical_deg,
        }
    }

    /// Distance between the lens and the image plane, in pixels, derived from
    /// the horizontal extent: `baseline = width/2 ÷ tan(FoV/2)`.
    pub fn horizontal_baseline(&self, width: usize) -> f64 {
        width as f64 / 2.0 / (self.horizontal_deg.to_radians() / 2.0).tan()
    }

    /// Same as [SensorFov::horizontal_baseline], derived from the vertical extent.
    pub fn vertical_baseline(&self, height: usize) -> f64 {
        height as f64 / 2.0 / (self.vertical_deg.to_radians() / 2.0).tan()
    }

    /// Width of this sensor's image plane, in pixels, as seen from a camera
    /// with the given baseline: `width = 2 x baseline x tan(FoV/2)`.
    pub fn plane_width(&self, baseline: f64) -> f64 {
        2.0 * baseline * (self.horizontal_deg.to_radians() / 2.0).tan()
    }

    /// Same as [SensorFov::plane_width] for the vertical extent.
    pub fn plane_height(&self, baseline: f64) -> f64 {
        2.0 * baseline * (self.vertical_deg.to_radians() / 2.0).tan()
    }
}

/// Resolution and field of view of one sensing modality.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorSpec {
    pub width: usize,
    pub height: usize,
    pub fov: SensorFov,
}

/// Kinect v2 color stream: 1920x1080, 84.1° x 53.8°.
pub const KINECT_V2_COLOR: SensorSpec = SensorSpec {
    width: 1920,
    height: 1080,
    fov: SensorFov {
        horizontal_deg: 84.1,
        vertical_deg: 53.8,
    },
};

/// Kinect v2 depth stream: 512x424, 70.6° x 60°.
pub const KINECT_V2_DEPTH: SensorSpec = SensorSpec {
    width: 512,
    height: 424,
    fov: SensorFov {
        horizontal_deg: 70.6,
        vertical_deg: 60.0,
    },
};
