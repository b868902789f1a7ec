//! Boolean occupancy masks over the reflectivity grid

use serde::Serialize;

/// Boolean grid with the same row-major layout as [`Field`](super::Field)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Mask {
    data: Vec<bool>,
    width: usize,
    height: usize,
}

impl Mask {
    /// Create an empty (all `false`) mask
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![false; width * height],
            width,
            height,
        }
    }

    /// Wrap a row-major buffer; the caller guarantees `data.len() == width * height`.
    pub(crate) fn from_raw(width: usize, height: usize, data: Vec<bool>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    /// Grid width in pixels
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in pixels
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)` pair
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Row-major view of the mask
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    /// Is the pixel at column `x`, row `y` set
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> bool {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x]
    }

    /// Set or clear the pixel at column `x`, row `y`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x] = value;
    }

    /// Number of set pixels
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// `true` if no pixel is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Number of pixels set in both masks
    ///
    /// Both masks must share a shape; callers validate this at the sequence level.
    #[must_use]
    pub fn intersection_count(&self, other: &Mask) -> usize {
        debug_assert_eq!(self.shape(), other.shape());
        self.data
            .iter()
            .zip(&other.data)
            .filter(|(&a, &b)| a && b)
            .count()
    }

    /// Pixel-wise conjunction
    #[must_use]
    pub fn and(&self, other: &Mask) -> Mask {
        debug_assert_eq!(self.shape(), other.shape());
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| a && b)
            .collect();
        Mask::from_raw(self.width, self.height, data)
    }

    /// Fraction of this mask covered by `other`: `|self ∩ other| / |self|`
    ///
    /// An empty mask overlaps nothing and yields `0.0`.
    #[must_use]
    pub fn overlap_ratio(&self, other: &Mask) -> f64 {
        let area = self.count();
        if area == 0 {
            return 0.0;
        }
        self.intersection_count(other) as f64 / area as f64
    }

    /// `(x, y)` coordinates of every set pixel in row-major order
    pub fn iter_set(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .filter(|(_, &v)| v)
            .map(move |(idx, _)| (idx % width, idx / width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(width: usize, height: usize, set: &[(usize, usize)]) -> Mask {
        let mut mask = Mask::new(width, height);
        for &(x, y) in set {
            mask.set(x, y, true);
        }
        mask
    }

    #[test]
    fn test_count_and_intersection() {
        let a = mask_from(4, 4, &[(0, 0), (1, 0), (2, 0)]);
        let b = mask_from(4, 4, &[(1, 0), (2, 0), (3, 3)]);
        assert_eq!(a.count(), 3);
        assert_eq!(a.intersection_count(&b), 2);
        assert_eq!(a.and(&b).count(), 2);
    }

    #[test]
    fn test_overlap_ratio_is_asymmetric() {
        let small = mask_from(4, 4, &[(0, 0), (1, 0)]);
        let large = mask_from(4, 4, &[(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(small.overlap_ratio(&large), 1.0);
        assert_eq!(large.overlap_ratio(&small), 0.5);
    }

    #[test]
    fn test_overlap_ratio_empty_mask() {
        let empty = Mask::new(3, 3);
        let full = mask_from(3, 3, &[(1, 1)]);
        assert!(empty.is_empty());
        assert_eq!(empty.overlap_ratio(&full), 0.0);
    }

    #[test]
    fn test_iter_set_coordinates() {
        let mask = mask_from(3, 2, &[(2, 0), (0, 1)]);
        let set: Vec<_> = mask.iter_set().collect();
        assert_eq!(set, vec![(2, 0), (0, 1)]);
    }
}
