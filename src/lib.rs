pub mod align;
pub mod camera;
pub mod capture;
pub mod error;
pub mod io;
pub mod mesh;
pub mod normal_estimation;
pub mod pipeline;
pub mod segmentation;

mod image;
pub use crate::image::{Frame, IntoImageRgb8, IntoLumaImage};
