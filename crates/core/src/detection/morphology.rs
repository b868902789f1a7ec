//! Binary morphology on occupancy masks
//!
//! Dilation merges nearby fragments of a storm core into one region before contour
//! tracing. Pixels outside the grid are treated as unset, so growth never wraps or
//! leaks in from the border.

use crate::config::Connectivity;
use crate::grid::Mask;

/// Dilate `mask` by `iterations` rounds
///
/// Each round sets every pixel that has at least one set neighbor under `connectivity`.
/// Zero iterations return an unchanged copy.
#[must_use]
pub fn dilate(mask: &Mask, iterations: usize, connectivity: Connectivity) -> Mask {
    let (width, height) = mask.shape();
    let offsets = connectivity.offsets();
    let mut current = mask.as_slice().to_vec();

    for _ in 0..iterations {
        let mut next = current.clone();
        let mut changed = false;

        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                if current[idx] {
                    continue;
                }
                let hit = offsets.iter().any(|&(dx, dy)| {
                    match (x.checked_add_signed(dx), y.checked_add_signed(dy)) {
                        (Some(nx), Some(ny)) if nx < width && ny < height => current[ny * width + nx],
                        _ => false,
                    }
                });
                if hit {
                    next[idx] = true;
                    changed = true;
                }
            }
        }

        current = next;
        // Further rounds cannot change a saturated (or empty) mask
        if !changed {
            break;
        }
    }

    Mask::from_raw(width, height, current)
}
