use ndarray::{Array3, ArrayView3, Axis};

/// Converts one 8-bit BGR pixel into HSV with hue mapped to 0-179, which keeps
/// every channel inside u8 range.
pub fn bgr_pixel_to_hsv(b: u8, g: u8, r: u8) -> (u8, u8, u8) {
    let max = b.max(g).max(r);
    let min = b.min(g).min(r);
    let delta = (max - min) as f32;

    let value = max;
    let saturation = if max == 0 {
        0
    } else {
        (255.0 * delta / max as f32).round() as u8
    };

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g as f32 - b as f32) / delta
    } else if max == g {
        120.0 + 60.0 * (b as f32 - r as f32) / delta
    } else {
        240.0 + 60.0 * (r as f32 - g as f32) / delta
    };
    let hue = if hue < 0.0 { hue + 360.0 } else { hue };

    ((hue / 2.0).round().min(179.0) as u8, saturation, value)
}

/// Converts one HSV pixel (hue 0-179) back into 8-bit BGR.
pub fn hsv_pixel_to_bgr(h: u8, s: u8, v: u8) -> (u8, u8, u8) {
    let value = v as f32 / 255.0;
    let saturation = s as f32 / 255.0;
    let hue = h as f32 * 2.0 / 60.0;

    let sector = hue.floor() as i32 % 6;
    let frac = hue - hue.floor();

    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * frac);
    let t = value * (1.0 - saturation * (1.0 - frac));

    let (r, g, b) = match sector {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };

    (
        (b * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (r * 255.0).round() as u8,
    )
}

/// Converts a (height, width, 3) BGR image into HSV, channel for channel.
pub fn bgr_to_hsv(color: &ArrayView3<u8>) -> Array3<u8> {
    let (height, width, channels) = color.dim();
    assert_eq!(channels, 3);

    let mut hsv = Array3::<u8>::zeros((height, width, 3));
    for row in 0..height {
        for col in 0..width {
            let (h, s, v) = bgr_pixel_to_hsv(
                color[(row, col, 0)],
                color[(row, col, 1)],
                color[(row, col, 2)],
            );
            hsv[(row, col, 0)] = h;
            hsv[(row, col, 1)] = s;
            hsv[(row, col, 2)] = v;
        }
    }

    hsv
}

/// Converts a (height, width, 3) HSV image back into BGR.
pub fn hsv_to_bgr(hsv: &ArrayView3<u8>) -> Array3<u8> {
    let (height, width, channels) = hsv.dim();
    assert_eq!(channels, 3);

    let mut color = Array3::<u8>::zeros((height, width, 3));
    for row in 0..height {
        for col in 0..width {
            let (b, g, r) = hsv_pixel_to_bgr(
                hsv[(row, col, 0)],
                hsv[(row, col, 1)],
                hsv[(row, col, 2)],
            );
            color[(row, col, 0)] = b;
            color[(row, col, 1)] = g;
            color[(row, col, 2)] = r;
        }
    }

    color
}

/// Histogram equalization of a single channel, as used for brightness
/// normalization of the HSV value plane.
pub fn equalize_channel(hsv: &mut Array3<u8>, channel: usize) {
    let mut histogram = [0usize; 256];
    let plane = hsv.index_axis(Axis(2), channel);
    for value in plane.iter() {
        histogram[*value as usize] += 1;
    }

    let total = plane.len();
    let cdf_min = histogram
        .iter()
        .scan(0usize, |acc, count| {
            *acc += count;
            Some(*acc)
        })
        .find(|cdf| *cdf > 0)
        .unwrap_or(0);

    if total == cdf_min {
        return;
    }

    let mut lut = [0u8; 256];
    let mut cdf = 0usize;
    for (value, count) in histogram.iter().enumerate() {
        cdf += count;
        if cdf > 0 {
            lut[value] =
                ((cdf - cdf_min) as f32 / (total - cdf_min) as f32 * 255.0).round() as u8;
        }
    }

    hsv.index_axis_mut(Axis(2), channel)
        .mapv_inplace(|value| lut[value as usize]);
}
