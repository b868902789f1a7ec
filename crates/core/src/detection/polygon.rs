//! Boundary polygons and point-in-polygon rasterization
//!
//! Vertices are `(x, y)` = (column, row) in pixel-center coordinates, the same
//! indexing the reflectivity grid uses, so a renderer can overlay them without any
//! transform.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::grid::Mask;

/// Polygon vertex: `x` is the column, `y` the row.
pub type Vertex = Point2<f64>;

/// Ordered polygon vertices
///
/// The polygon is implicitly closed between the last and first vertex. Contours from
/// the region extractor also repeat their first vertex at the end, which is harmless
/// for containment (a zero-length edge never crosses a scanline).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    vertices: Vec<Vertex>,
}

impl Polygon {
    #[must_use]
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Axis-aligned bounds as `(min, max)` corners, `None` for an empty polygon
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vertex, Vertex)> {
        let first = self.vertices.first()?;
        let (mut min, mut max) = (*first, *first);
        for v in &self.vertices[1..] {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }
        Some((min, max))
    }

    /// Even-odd containment test
    ///
    /// Casts a ray toward +x and counts edge crossings. Edges use a half-open rule on
    /// `y` so a ray through a shared vertex is counted exactly once. Fewer than three
    /// vertices enclose nothing.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = &self.vertices[i];
            let vj = &self.vertices[j];
            if (vi.y > y) != (vj.y > y) {
                let x_cross = (vj.x - vi.x) * (y - vi.y) / (vj.y - vi.y) + vi.x;
                if x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Mask of every grid point `(x, y)` of a `width × height` grid inside the polygon
    ///
    /// Only points within the bounding box are tested; everything outside it is
    /// outside the polygon by construction.
    #[must_use]
    pub fn rasterize(&self, width: usize, height: usize) -> Mask {
        let mut mask = Mask::new(width, height);
        let Some((min, max)) = self.bounding_box() else {
            return mask;
        };
        if width == 0 || height == 0 || max.x < 0.0 || max.y < 0.0 {
            return mask;
        }

        let x0 = min.x.ceil().max(0.0) as usize;
        let y0 = min.y.ceil().max(0.0) as usize;
        let x1 = (max.x.floor() as usize).min(width - 1);
        let y1 = (max.y.floor() as usize).min(height - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.contains(x as f64, y as f64) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }
}

impl From<Vec<(f64, f64)>> for Polygon {
    fn from(points: Vec<(f64, f64)>) -> Self {
        Self::new(points.into_iter().map(|(x, y)| Vertex::new(x, y)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lo: f64, hi: f64) -> Polygon {
        Polygon::from(vec![(lo, lo), (lo, hi), (hi, hi), (hi, lo)])
    }

    #[test]
    fn test_contains_interior_and_exterior() {
        let poly = square(1.5, 4.5);
        assert!(poly.contains(2.0, 2.0));
        assert!(poly.contains(4.0, 3.0));
        assert!(!poly.contains(1.0, 3.0));
        assert!(!poly.contains(5.0, 3.0));
        assert!(!poly.contains(3.0, 5.0));
    }

    #[test]
    fn test_degenerate_polygons_are_empty() {
        let line = Polygon::from(vec![(0.0, 0.0), (5.0, 5.0)]);
        assert!(!line.contains(1.0, 1.0));
        assert!(line.rasterize(6, 6).is_empty());
        assert!(Polygon::default().rasterize(6, 6).is_empty());
    }

    #[test]
    fn test_rasterize_half_pixel_square() {
        // Boundary between pixel centers encloses a 3x3 block
        let poly = square(1.5, 4.5);
        let mask = poly.rasterize(8, 8);
        assert_eq!(mask.count(), 9);
        assert!(mask.get(2, 2));
        assert!(mask.get(4, 4));
        assert!(!mask.get(5, 5));
    }

    #[test]
    fn test_rasterize_clips_to_grid() {
        let poly = square(-3.5, 1.5);
        let mask = poly.rasterize(4, 4);
        // Points (0..=1, 0..=1)
        assert_eq!(mask.count(), 4);
    }

    #[test]
    fn test_rasterize_matches_brute_force() {
        let poly = Polygon::from(vec![
            (2.5, 0.5),
            (7.2, 3.1),
            (5.0, 8.4),
            (4.1, 4.0),
            (0.3, 6.6),
        ]);
        let mask = poly.rasterize(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(mask.get(x, y), poly.contains(x as f64, y as f64));
            }
        }
    }

    #[test]
    fn test_closing_vertex_does_not_change_containment() {
        let open = square(0.5, 3.5);
        let mut vertices = open.vertices().to_vec();
        vertices.push(vertices[0]);
        let closed = Polygon::new(vertices);
        assert_eq!(open.rasterize(5, 5), closed.rasterize(5, 5));
    }

    #[test]
    fn test_serializes_as_xy_pairs() {
        let poly = Polygon::from(vec![(1.0, 2.0), (3.5, 4.0)]);
        let json = serde_json::to_string(&poly).unwrap();
        assert_eq!(json, "[[1.0,2.0],[3.5,4.0]]");
    }
}
