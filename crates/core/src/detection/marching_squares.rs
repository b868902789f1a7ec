//! Marching squares contour tracing for binary storm masks
//!
//! Extracts the 0.5 iso-contours of a dilated occupancy mask. The mask is padded with
//! one ring of unset pixels, so every contour closes on itself even when a storm
//! touches the grid border.
//!
//! For a binary field the 0.5 crossing always sits halfway along a cell edge, so
//! vertices land on half-pixel positions. Ambiguous saddle cells keep diagonally
//! touching set pixels apart (the unset value is treated as fully connected).

use rustc_hash::{FxHashMap, FxHashSet};

use super::polygon::{Polygon, Vertex};
use crate::grid::Mask;

/// Cell edge crossed by a contour, in padded-grid coordinates.
///
/// `Horizontal { row, col }` joins corners `(row, col)` and `(row, col + 1)`;
/// `Vertical { row, col }` joins `(row, col)` and `(row + 1, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeId {
    Horizontal { row: usize, col: usize },
    Vertical { row: usize, col: usize },
}

impl EdgeId {
    /// Edge midpoint in unpadded `(x, y)` coordinates
    fn midpoint(self) -> Vertex {
        let (row, col) = match self {
            Self::Horizontal { row, col } => (row as f64, col as f64 + 0.5),
            Self::Vertical { row, col } => (row as f64 + 0.5, col as f64),
        };
        Vertex::new(col - 1.0, row - 1.0)
    }
}

/// Both neighbors of an edge node in the contour graph
#[derive(Debug, Clone, Copy, Default)]
struct Links {
    first: Option<EdgeId>,
    second: Option<EdgeId>,
}

impl Links {
    fn push(&mut self, edge: EdgeId) {
        if self.first.is_none() {
            self.first = Some(edge);
        } else {
            self.second = Some(edge);
        }
    }

    fn other_than(&self, edge: EdgeId) -> Option<EdgeId> {
        match (self.first, self.second) {
            (Some(a), Some(b)) if a == edge => Some(b),
            (Some(a), _) => Some(a),
            _ => None,
        }
    }
}

/// Trace all closed 0.5 iso-contours of `mask`
///
/// Contours are returned in the raster order of the first cell each one crosses. Every
/// polygon repeats its first vertex at the end.
#[must_use]
pub fn find_contours(mask: &Mask) -> Vec<Polygon> {
    let (width, height) = mask.shape();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    // Corner lookup on the padded grid: padded (row, col) maps to mask (col - 1, row - 1)
    let corner = |row: usize, col: usize| -> bool {
        row >= 1 && col >= 1 && row <= height && col <= width && mask.get(col - 1, row - 1)
    };

    let mut segments: Vec<(EdgeId, EdgeId)> = Vec::new();
    for row in 0..=height {
        for col in 0..=width {
            let case = u8::from(corner(row, col))
                | (u8::from(corner(row, col + 1)) << 1)
                | (u8::from(corner(row + 1, col + 1)) << 2)
                | (u8::from(corner(row + 1, col)) << 3);
            add_cell_segments(&mut segments, case, row, col);
        }
    }

    if segments.is_empty() {
        return Vec::new();
    }

    let mut graph: FxHashMap<EdgeId, Links> = FxHashMap::default();
    for &(a, b) in &segments {
        graph.entry(a).or_default().push(b);
        graph.entry(b).or_default().push(a);
    }

    let mut visited: FxHashSet<EdgeId> = FxHashSet::default();
    let mut contours = Vec::new();

    for &(start, _) in &segments {
        if visited.contains(&start) {
            continue;
        }

        let mut vertices = vec![start.midpoint()];
        visited.insert(start);

        let mut prev = start;
        let mut current = graph.get(&start).and_then(|links| links.first);
        while let Some(edge) = current {
            if edge == start || !visited.insert(edge) {
                break;
            }
            vertices.push(edge.midpoint());

            let next = graph.get(&edge).and_then(|links| links.other_than(prev));
            prev = edge;
            current = next;
        }

        vertices.push(vertices[0]);
        contours.push(Polygon::new(vertices));
    }

    contours
}

/// Append the contour segments of one cell
///
/// `case` bits: 1 = top-left, 2 = top-right, 4 = bottom-right, 8 = bottom-left corner set.
fn add_cell_segments(segments: &mut Vec<(EdgeId, EdgeId)>, case: u8, row: usize, col: usize) {
    let top = EdgeId::Horizontal { row, col };
    let bottom = EdgeId::Horizontal { row: row + 1, col };
    let left = EdgeId::Vertical { row, col };
    let right = EdgeId::Vertical { row, col: col + 1 };

    match case {
        // Top-left corner isolated
        1 | 14 => segments.push((top, left)),
        // Top-right corner isolated
        2 | 13 => segments.push((top, right)),
        // Horizontal split
        3 | 12 => segments.push((left, right)),
        // Bottom-right corner isolated
        4 | 11 => segments.push((right, bottom)),
        // Saddle: top-left and bottom-right set, kept apart
        5 => {
            segments.push((top, left));
            segments.push((right, bottom));
        }
        // Vertical split
        6 | 9 => segments.push((top, bottom)),
        // Bottom-left corner isolated
        7 | 8 => segments.push((left, bottom)),
        // Saddle: top-right and bottom-left set, kept apart
        10 => {
            segments.push((top, right));
            segments.push((left, bottom));
        }
        // Empty and full cells
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(width: usize, height: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> Mask {
        let mut mask = Mask::new(width, height);
        for y in y0..=y1 {
            for x in x0..=x1 {
                mask.set(x, y, true);
            }
        }
        mask
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        assert!(find_contours(&Mask::new(6, 6)).is_empty());
        assert!(find_contours(&Mask::new(0, 0)).is_empty());
    }

    #[test]
    fn test_single_pixel_diamond() {
        let mask = block(5, 5, 2, 2, 2, 2);
        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 1);

        let poly = &contours[0];
        // Four edge midpoints plus the closing vertex
        assert_eq!(poly.len(), 5);
        assert_eq!(poly.vertices()[0], poly.vertices()[4]);
        for v in &poly.vertices()[..4] {
            let d = (v.x - 2.0).abs() + (v.y - 2.0).abs();
            assert!((d - 0.5).abs() < 1e-12, "vertex {v:?} off the diamond");
        }
        assert_eq!(poly.rasterize(5, 5), mask);
    }

    #[test]
    fn test_block_contour_encloses_block() {
        let mask = block(10, 8, 2, 3, 6, 5);
        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].rasterize(10, 8), mask);
    }

    #[test]
    fn test_border_touching_region_is_closed() {
        let mask = block(6, 6, 0, 0, 2, 5);
        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 1);

        let poly = &contours[0];
        assert_eq!(poly.vertices().first(), poly.vertices().last());
        let (min, max) = poly.bounding_box().unwrap();
        assert_eq!(min.x, -0.5);
        assert_eq!(min.y, -0.5);
        assert_eq!(max.y, 5.5);
        assert_eq!(poly.rasterize(6, 6), mask);
    }

    #[test]
    fn test_separate_regions_give_separate_contours() {
        let mut mask = block(12, 6, 1, 1, 3, 3);
        for y in 1..=3 {
            for x in 7..=9 {
                mask.set(x, y, true);
            }
        }
        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 2);
        // Raster order of discovery: left block first
        assert!(contours[0].bounding_box().unwrap().0.x < contours[1].bounding_box().unwrap().0.x);
    }

    #[test]
    fn test_diagonal_pixels_stay_apart() {
        let mut mask = Mask::new(4, 4);
        mask.set(1, 1, true);
        mask.set(2, 2, true);
        assert_eq!(find_contours(&mask).len(), 2);
    }

    #[test]
    fn test_ring_yields_outer_and_hole_contours() {
        let mut mask = block(7, 7, 1, 1, 5, 5);
        mask.set(3, 3, false);
        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 2);

        let hole = contours
            .iter()
            .find(|c| c.rasterize(7, 7).count() == 1)
            .expect("hole contour");
        assert!(hole.contains(3.0, 3.0));
    }
}
