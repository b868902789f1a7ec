//! Tunable parameters for detection, formation tracking and verification
//!
//! Defaults reproduce the thresholds the radar evaluation was calibrated with:
//! 45 dBZ cores of at least 15 pixels, merged by 5 rounds of dilation, a 10% overlap
//! limit for calling a storm "new" and a 20% overlap requirement for a forecast match.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StormError};

/// Neighborhood used by morphological dilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Edge neighbors only (cross structuring element)
    #[default]
    Four,
    /// Edge and corner neighbors (3×3 square structuring element)
    Eight,
}

impl Connectivity {
    /// Neighbor offsets `(dx, dy)` for this connectivity
    #[must_use]
    pub const fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Four => &[(0, -1), (-1, 0), (1, 0), (0, 1)],
            Self::Eight => &[
                (-1, -1),
                (0, -1),
                (1, -1),
                (-1, 0),
                (1, 0),
                (-1, 1),
                (0, 1),
                (1, 1),
            ],
        }
    }
}

/// Parameters of the region extractor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Reflectivity (dBZ) a pixel must strictly exceed to belong to a storm
    pub reflectivity_threshold: f32,
    /// Minimum storm area in pixels (inclusive)
    pub area_threshold: usize,
    /// Rounds of binary dilation applied before contour tracing
    pub dilation_iterations: usize,
    /// Neighborhood used by each dilation round
    pub connectivity: Connectivity,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            reflectivity_threshold: 45.0,
            area_threshold: 15,
            dilation_iterations: 5,
            connectivity: Connectivity::Four,
        }
    }
}

impl DetectionConfig {
    /// Create a detection config with 4-connected dilation
    ///
    /// # Arguments
    ///
    /// * `reflectivity_threshold` - dBZ a pixel must exceed
    /// * `area_threshold` - Minimum storm area in pixels
    /// * `dilation_iterations` - Dilation rounds before contour tracing
    #[must_use]
    pub fn new(reflectivity_threshold: f32, area_threshold: usize, dilation_iterations: usize) -> Self {
        Self {
            reflectivity_threshold,
            area_threshold,
            dilation_iterations,
            connectivity: Connectivity::Four,
        }
    }

    /// Replace the dilation neighborhood
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`StormError::InvalidParameter`] for a non-finite reflectivity threshold or
    /// a zero area threshold.
    pub fn validate(&self) -> Result<()> {
        if !self.reflectivity_threshold.is_finite() {
            return Err(StormError::non_finite(
                "reflectivity_threshold",
                f64::from(self.reflectivity_threshold),
            ));
        }
        if self.area_threshold == 0 {
            return Err(StormError::invalid_parameter(
                "area_threshold",
                "must be at least one pixel",
            ));
        }
        Ok(())
    }
}

/// Parameters of the storm-formation tracker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    /// Largest fraction of a storm that may overlap a previous-frame storm while the
    /// storm still counts as newly formed
    pub overlap_threshold: f64,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.1,
        }
    }
}

impl FormationConfig {
    #[must_use]
    pub fn new(overlap_threshold: f64) -> Self {
        Self { overlap_threshold }
    }

    /// # Errors
    ///
    /// Returns [`StormError::InvalidParameter`] if the threshold is not in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        validate_ratio("overlap_threshold", self.overlap_threshold)
    }
}

/// Parameters of the forecast verification scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Minimum overlap ratio for a predicted storm to match a true storm
    pub overlap_threshold: f64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.2,
        }
    }
}

impl VerificationConfig {
    #[must_use]
    pub fn new(overlap_threshold: f64) -> Self {
        Self { overlap_threshold }
    }

    /// # Errors
    ///
    /// Returns [`StormError::InvalidParameter`] if the threshold is not in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        validate_ratio("overlap_threshold", self.overlap_threshold)
    }
}

/// Full pipeline configuration, loadable from a single JSON document
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NowcastConfig {
    pub detection: DetectionConfig,
    pub formation: FormationConfig,
    pub verification: VerificationConfig,
}

impl NowcastConfig {
    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first [`StormError::InvalidParameter`] found.
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        self.formation.validate()?;
        self.verification.validate()
    }
}

fn validate_ratio(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(StormError::non_finite(name, value));
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(StormError::ratio_out_of_range(name, value));
    }
    Ok(())
}
