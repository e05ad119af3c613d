use image::{GrayImage, RgbImage};
use ndarray::{Array2, Array3};

/// Trait to convert an ndarray grid to an image::RgbImage.
pub trait IntoImageRgb8 {
    fn to_rgb_image(&self) -> RgbImage;
}

impl IntoImageRgb8 for Array3<u8> {
    /// Convert a (height, width, 3) BGR array into an RgbImage.
    fn to_rgb_image(&self) -> RgbImage {
        let (height, width, channels) = self.dim();
        assert_eq!(channels, 3);

        let mut data = Vec::with_capacity(height * width * 3);
        for row in 0..height {
            for col in 0..width {
                data.push(self[(row, col, 2)]);
                data.push(self[(row, col, 1)]);
                data.push(self[(row, col, 0)]);
            }
        }

        RgbImage::from_vec(width as u32, height as u32, data).unwrap()
    }
}

impl IntoImageRgb8 for Array3<f32> {
    /// Convert a (height, width, 3) array of [0, 1] values (e.g. a normal map)
    /// into an RgbImage.
    fn to_rgb_image(&self) -> RgbImage {
        let (height, width, channels) = self.dim();
        assert_eq!(channels, 3);

        let mut data = Vec::with_capacity(height * width * 3);
        for row in 0..height {
            for col in 0..width {
                for channel in 0..3 {
                    data.push((self[(row, col, channel)].clamp(0.0, 1.0) * 255.0) as u8);
                }
            }
        }

        RgbImage::from_vec(width as u32, height as u32, data).unwrap()
    }
}

/// Trait to convert an ndarray grid to an image::GrayImage.
pub trait IntoLumaImage {
    fn to_luma_image(&self) -> GrayImage;
}

impl IntoLumaImage for Array2<f32> {
    /// Convert a normalized [0, 1] depth map into an 8-bit GrayImage.
    fn to_luma_image(&self) -> GrayImage {
        let (height, width) = self.dim();

        let u8_image = self.map(|x| (x.clamp(0.0, 1.0) * 255.0) as u8);

        GrayImage::from_vec(width as u32, height as u32, u8_image.into_raw_vec()).unwrap()
    }
}

impl IntoLumaImage for Array2<bool> {
    /// Convert a foreground mask into a GrayImage. The mask convention is
    /// inverted for storage: white marks kept foreground pixels.
    fn to_luma_image(&self) -> GrayImage {
        let (height, width) = self.dim();

        let u8_image = self.map(|excluded| if *excluded { 0u8 } else { 255u8 });

        GrayImage::from_vec(width as u32, height as u32, u8_image.into_raw_vec()).unwrap()
    }
}
