//! Pixel-wise forecast error binned by reflectivity
//!
//! Complements event-wise scoring: errors are computed per pixel and grouped by the
//! *target* intensity, so heavy-rain errors are not drowned out by the clear-air
//! majority of the grid.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StormError};
use crate::grid::FieldSequence;

/// Half-open reflectivity interval `[min, max)` in dBZ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityRange {
    pub min: f32,
    pub max: f32,
}

impl IntensityRange {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value < self.max
    }

    /// Label used in summaries, e.g. `mse_35_45`
    #[must_use]
    pub fn label(&self) -> String {
        format!("mse_{}_{}", self.min, self.max)
    }
}

/// Light rain, moderate rain, heavy rain and convective cores
pub const DEFAULT_INTENSITY_RANGES: [IntensityRange; 4] = [
    IntensityRange::new(0.0, 20.0),
    IntensityRange::new(20.0, 35.0),
    IntensityRange::new(35.0, 45.0),
    IntensityRange::new(45.0, 100.0),
];

/// Reflectivity above which [`weighted_mse`] applies the high weight by default
pub const DEFAULT_WEIGHT_THRESHOLD: f32 = 40.0;

/// Default multiplier for pixels above [`DEFAULT_WEIGHT_THRESHOLD`]
pub const DEFAULT_HIGH_WEIGHT: f64 = 10.0;

/// Error statistics for one intensity range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeError {
    pub range: IntensityRange,
    /// Number of target pixels in the range
    pub pixel_count: usize,
    /// Mean squared error, `None` when the range holds no pixels
    pub mse: Option<f64>,
    /// Mean absolute error, `None` when the range holds no pixels
    pub mae: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: usize,
    squared: f64,
    absolute: f64,
}

impl Accumulator {
    fn merge(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            squared: self.squared + other.squared,
            absolute: self.absolute + other.absolute,
        }
    }
}

/// Mean squared and absolute error per target-intensity range
///
/// # Errors
///
/// Returns [`StormError::InvalidParameter`] if the sequences differ in length and
/// [`StormError::ShapeMismatch`] if their frame shapes differ.
pub fn mse_by_ranges(
    pred: &FieldSequence,
    target: &FieldSequence,
    ranges: &[IntensityRange],
) -> Result<Vec<RangeError>> {
    check_same_shape(pred, target)?;

    let totals = pred
        .frames()
        .par_iter()
        .zip(target.frames().par_iter())
        .map(|(p, t)| {
            let mut acc = vec![Accumulator::default(); ranges.len()];
            for (&pv, &tv) in p.as_slice().iter().zip(t.as_slice()) {
                let diff = f64::from(pv) - f64::from(tv);
                for (slot, range) in acc.iter_mut().zip(ranges) {
                    if range.contains(tv) {
                        slot.count += 1;
                        slot.squared += diff * diff;
                        slot.absolute += diff.abs();
                    }
                }
            }
            acc
        })
        .reduce(
            || vec![Accumulator::default(); ranges.len()],
            |a, b| a.into_iter().zip(b).map(|(x, y)| x.merge(y)).collect(),
        );

    Ok(ranges
        .iter()
        .zip(totals)
        .map(|(&range, acc)| {
            let n = acc.count as f64;
            RangeError {
                range,
                pixel_count: acc.count,
                mse: (acc.count > 0).then(|| acc.squared / n),
                mae: (acc.count > 0).then(|| acc.absolute / n),
            }
        })
        .collect())
}

/// Mean squared error with pixels whose target exceeds `threshold` weighted by
/// `weight_high`
///
/// The mean is taken over all pixels (weights are not normalized). Empty sequences
/// yield `0.0`.
///
/// # Errors
///
/// Returns [`StormError::InvalidParameter`] if the sequences differ in length and
/// [`StormError::ShapeMismatch`] if their frame shapes differ.
pub fn weighted_mse(
    pred: &FieldSequence,
    target: &FieldSequence,
    threshold: f32,
    weight_high: f64,
) -> Result<f64> {
    check_same_shape(pred, target)?;

    let (sum, count) = pred
        .frames()
        .par_iter()
        .zip(target.frames().par_iter())
        .map(|(p, t)| {
            p.as_slice()
                .iter()
                .zip(t.as_slice())
                .fold((0.0_f64, 0_usize), |(sum, count), (&pv, &tv)| {
                    let diff = f64::from(pv) - f64::from(tv);
                    let weight = if tv > threshold { weight_high } else { 1.0 };
                    (sum + weight * diff * diff, count + 1)
                })
        })
        .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    if count == 0 {
        return Ok(0.0);
    }
    Ok(sum / count as f64)
}

fn check_same_shape(pred: &FieldSequence, target: &FieldSequence) -> Result<()> {
    if pred.len() != target.len() {
        return Err(StormError::invalid_parameter(
            "pred",
            format!(
                "sequence has {} frames, target has {}",
                pred.len(),
                target.len()
            ),
        ));
    }
    if let (Some(expected), Some(found)) = (target.shape(), pred.shape()) {
        if expected != found {
            return Err(StormError::ShapeMismatch {
                index: 0,
                expected,
                found,
            });
        }
    }
    Ok(())
}
