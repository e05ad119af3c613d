use std::collections::VecDeque;

use itertools::Itertools;
use ndarray::{Array2, ArrayView2};

/// Labels the connected components of a binary image under 4-connectivity.
/// Zero pixels are background (label 0); foreground components get labels
/// starting at 1.
///
/// # Returns
///
/// The label map and the pixel area of every label, indexed by label
/// (index 0 holds the background pixel count).
pub fn connected_components(image: &Array2<u8>) -> (Array2<u32>, Vec<usize>) {
    let (height, width) = image.dim();
    let mut labels = Array2::<u32>::zeros((height, width));
    let mut areas = vec![0usize];

    let mut queue = VecDeque::new();
    for y in 0..height {
        for x in 0..width {
            if image[(y, x)] == 0 {
                areas[0] += 1;
                continue;
            }
            if labels[(y, x)] != 0 {
                continue;
            }

            let label = areas.len() as u32;
            areas.push(0);
            labels[(y, x)] = label;
            queue.push_back((y, x));

            while let Some((cy, cx)) = queue.pop_front() {
                areas[label as usize] += 1;

                let mut visit = |ny: usize, nx: usize, labels: &mut Array2<u32>| {
                    if image[(ny, nx)] != 0 && labels[(ny, nx)] == 0 {
                        labels[(ny, nx)] = label;
                        queue.push_back((ny, nx));
                    }
                };

                if cy > 0 {
                    visit(cy - 1, cx, &mut labels);
                }
                if cy + 1 < height {
                    visit(cy + 1, cx, &mut labels);
                }
                if cx > 0 {
                    visit(cy, cx - 1, &mut labels);
                }
                if cx + 1 < width {
                    visit(cy, cx + 1, &mut labels);
                }
            }
        }
    }

    (labels, areas)
}

/// Label of the largest non-background component, if any exists. Area ties
/// go to the highest label, i.e. the component discovered last.
pub fn largest_component(areas: &[usize]) -> Option<u32> {
    areas
        .iter()
        .skip(1)
        .position_max()
        .map(|index| index as u32 + 1)
}

/// Computes the artefact exclusion mask: every pixel that does not belong to
/// the single largest connected depth blob is excluded. This assumes the
/// subject of interest is the one dominant blob in the normalized depth map;
/// scenes with several similarly sized objects are not supported.
///
/// Already-excluded pixels are treated as background before labeling. Returns
/// `None` when masking leaves no foreground component at all.
pub fn artefact_mask(depth: &ArrayView2<f32>, mask: &Array2<bool>) -> Option<Array2<bool>> {
    let mut image = depth.map(|d| (d * 255.0).clamp(0.0, 255.0) as u8);
    ndarray::Zip::from(&mut image).and(mask).for_each(|pixel, excluded| {
        if *excluded {
            *pixel = 0;
        }
    });

    let (labels, areas) = connected_components(&image);
    let keep = largest_component(&areas)?;

    Some(labels.map(|label| *label != keep))
}
