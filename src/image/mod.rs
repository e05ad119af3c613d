mod hsv;
pub use hsv::{bgr_pixel_to_hsv, bgr_to_hsv, equalize_channel, hsv_pixel_to_bgr, hsv_to_bgr};

mod convert;
pub use convert::{IntoImageRgb8, IntoLumaImage};

mod frame;
pub use frame::Frame;
