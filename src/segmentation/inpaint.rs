use std::collections::VecDeque;

use ndarray::{Array2, ArrayView2};

/// Fills hole pixels of a depth map by diffusing the surrounding valid
/// values inward.
///
/// Holes are filled in breadth-first order from the valid boundary, each
/// pixel taking the average of its already-valued 8-neighbors; `radius`
/// relaxation sweeps then smooth the filled regions. The filled values are
/// cosmetic, callers re-zero any region they do not trust.
///
/// # Arguments
///
/// * `depth` - The depth map, holes included.
/// * `holes` - `true` marks pixels to fill.
/// * `radius` - Smoothing strength, in sweeps. The default used by the
///   segmentation pipeline is 7.
///
/// # Returns
///
/// A new depth map with hole pixels replaced. A map with no valid pixels at
/// all is returned unchanged.
pub fn inpaint(depth: &ArrayView2<f32>, holes: &Array2<bool>, radius: usize) -> Array2<f32> {
    let (height, width) = depth.dim();
    let mut result = depth.to_owned();
    let mut valid = holes.map(|hole| !hole);

    let neighbors8 = |y: usize, x: usize| {
        let mut out = [(0usize, 0usize); 8];
        let mut count = 0;
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if dy == 0 && dx == 0 {
                    continue;
                }
                let ny = y as i32 + dy;
                let nx = x as i32 + dx;
                if ny >= 0 && ny < height as i32 && nx >= 0 && nx < width as i32 {
                    out[count] = (ny as usize, nx as usize);
                    count += 1;
                }
            }
        }
        (out, count)
    };

    // March inward from the valid boundary.
    let mut queue = VecDeque::new();
    let mut queued = Array2::from_elem((height, width), false);
    for y in 0..height {
        for x in 0..width {
            if valid[(y, x)] {
                continue;
            }
            let (neighbors, count) = neighbors8(y, x);
            if neighbors[..count].iter().any(|pos| valid[*pos]) {
                queue.push_back((y, x));
                queued[(y, x)] = true;
            }
        }
    }

    while let Some((y, x)) = queue.pop_front() {
        let (neighbors, count) = neighbors8(y, x);
        let (sum, valued) = neighbors[..count]
            .iter()
            .filter(|pos| valid[**pos])
            .fold((0.0f32, 0usize), |(sum, valued), pos| {
                (sum + result[*pos], valued + 1)
            });

        if valued > 0 {
            result[(y, x)] = sum / valued as f32;
            valid[(y, x)] = true;
        }

        for pos in &neighbors[..count] {
            if !valid[*pos] && !queued[*pos] {
                queue.push_back(*pos);
                queued[*pos] = true;
            }
        }
    }

    // Relaxation sweeps to smooth out the fill direction bias.
    for _ in 0..radius {
        for y in 0..height {
            for x in 0..width {
                if !holes[(y, x)] || !valid[(y, x)] {
                    continue;
                }
                let (neighbors, count) = neighbors8(y, x);
                let (sum, valued) = neighbors[..count]
                    .iter()
                    .filter(|pos| valid[**pos])
                    .fold((0.0f32, 0usize), |(sum, valued), pos| {
                        (sum + result[*pos], valued + 1)
                    });
                if valued > 0 {
                    result[(y, x)] = sum / valued as f32;
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::Array2;

    use super::inpaint;

    #[test]
    fn test_fills_hole_with_constant_surroundings() {
        let mut depth = Array2::<f32>::from_elem((8, 8), 0.75);
        let mut holes = Array2::from_elem((8, 8), false);
        for y in 3..6 {
            for x in 3..6 {
                depth[(y, x)] = 0.0;
                holes[(y, x)] = true;
            }
        }

        let filled = inpaint(&depth.view(), &holes, 7);
        for value in filled.iter() {
            assert_relative_eq!(*value, 0.75, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_keeps_valid_pixels_untouched() {
        let depth = Array2::<f32>::from_shape_fn((6, 6), |(y, x)| (y * 6 + x) as f32 / 36.0);
        let mut holes = Array2::from_elem((6, 6), false);
        holes[(2, 2)] = true;

        let filled = inpaint(&depth.view(), &holes, 3);
        for ((y, x), value) in depth.indexed_iter() {
            if !holes[(y, x)] {
                assert_relative_eq!(filled[(y, x)], *value);
            }
        }
        assert!(filled[(2, 2)] > 0.0);
    }

    #[test]
    fn test_all_holes_returns_input() {
        let depth = Array2::<f32>::zeros((5, 5));
        let holes = Array2::from_elem((5, 5), true);
        let filled = inpaint(&depth.view(), &holes, 7);
        assert_eq!(filled, depth);
    }
}
