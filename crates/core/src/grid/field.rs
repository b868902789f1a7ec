//! Reflectivity field for a single time step
//!
//! Stores a 2D grid of reflectivity values (dBZ) as a flat `Vec<f32>` in row-major order,
//! the layout radar composites and model outputs share.

use serde::Serialize;

use super::Mask;
use crate::error::{Result, StormError};

/// Reflectivity field container
///
/// Values are indexed as `data[y * width + x]`, where `x` is the column and `y` the row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Field values in row-major order (y * width + x)
    data: Vec<f32>,
    /// Grid width in pixels (columns)
    width: usize,
    /// Grid height in pixels (rows)
    height: usize,
}

impl Field {
    /// Create a new field with given dimensions, initialized to zero
    ///
    /// # Arguments
    ///
    /// * `width` - Grid width in pixels
    /// * `height` - Grid height in pixels
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_value(width, height, 0.0)
    }

    /// Create a new field with given dimensions, initialized to a value
    #[must_use]
    pub fn with_value(width: usize, height: usize, value: f32) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Wrap an existing row-major buffer
    ///
    /// # Errors
    ///
    /// Returns [`StormError::DataLength`] if `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        let expected = width * height;
        if data.len() != expected {
            return Err(StormError::DataLength {
                len: data.len(),
                width,
                height,
                expected,
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
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

    /// Get reference to field data
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Get value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x]
    }

    /// Set value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x] = value;
    }

    /// Mask of pixels strictly above `threshold`
    ///
    /// NaN values never exceed any threshold.
    #[must_use]
    pub fn exceeding(&self, threshold: f32) -> Mask {
        let data = self.data.iter().map(|&v| v > threshold).collect();
        Mask::from_raw(self.width, self.height, data)
    }

    /// Pixel-wise maximum over several vertical levels of the same scan
    ///
    /// Builds the column-maximum composite used as the detection input when the
    /// radar provides several constant-altitude levels per time step. NaN on one
    /// level yields the value of the others.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::ShapeMismatch`] if the levels differ in shape, or
    /// [`StormError::InvalidParameter`] if `levels` is empty.
    pub fn max_composite(levels: &[Field]) -> Result<Self> {
        let Some(first) = levels.first() else {
            return Err(StormError::invalid_parameter(
                "levels",
                "at least one level is required",
            ));
        };

        let mut composite = first.clone();
        for (index, level) in levels.iter().enumerate().skip(1) {
            if level.shape() != composite.shape() {
                return Err(StormError::ShapeMismatch {
                    index,
                    expected: composite.shape(),
                    found: level.shape(),
                });
            }
            for (out, &v) in composite.data.iter_mut().zip(&level.data) {
                // f32::max ignores NaN in favor of the other operand
                *out = out.max(v);
            }
        }
        Ok(composite)
    }
}
