//! Frame storm detector
//!
//! Applies region extraction to every frame of a [`FieldSequence`]. Frames carry no
//! cross-frame dependency at this stage, so extraction runs on the rayon pool and the
//! results are collected back in time order.

use rayon::prelude::*;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::{debug, info};

use super::polygon::Polygon;
use super::region::{extract_regions, Region};
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::grid::{Field, FieldSequence, Mask};

/// Storms detected in one frame
///
/// Serializes as `{time_step, storm_count, storm_coordinates}`; masks stay in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct StormList {
    /// Index of the frame in its sequence
    pub time_step: usize,
    /// Regions in discovery order
    pub regions: Vec<Region>,
}

impl StormList {
    /// Number of storms in this frame
    #[must_use]
    pub fn storm_count(&self) -> usize {
        self.regions.len()
    }

    /// Storm boundaries, index-aligned with [`storm_masks`](Self::storm_masks)
    pub fn storm_coordinates(&self) -> impl Iterator<Item = &Polygon> + '_ {
        self.regions.iter().map(|r| &r.boundary)
    }

    /// Storm masks, index-aligned with [`storm_coordinates`](Self::storm_coordinates)
    pub fn storm_masks(&self) -> impl Iterator<Item = &Mask> + '_ {
        self.regions.iter().map(|r| &r.mask)
    }
}

impl Serialize for StormList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let coordinates: Vec<&Polygon> = self.storm_coordinates().collect();
        let mut state = serializer.serialize_struct("StormList", 3)?;
        state.serialize_field("time_step", &self.time_step)?;
        state.serialize_field("storm_count", &self.storm_count())?;
        state.serialize_field("storm_coordinates", &coordinates)?;
        state.end()
    }
}

/// Detector for storm cells in reflectivity sequences
#[derive(Debug, Clone, Copy, Default)]
pub struct StormDetector {
    config: DetectionConfig,
}

impl StormDetector {
    /// Create a detector with validated parameters
    ///
    /// # Errors
    ///
    /// Returns [`StormError::InvalidParameter`](crate::StormError::InvalidParameter) if
    /// the config fails validation.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Extract the storm regions of a single field
    #[must_use]
    pub fn extract_regions(&self, field: &Field) -> Vec<Region> {
        extract_regions(field, &self.config)
    }

    /// Detect storms in every frame of `sequence`
    ///
    /// Returns one [`StormList`] per frame in time order; an empty sequence yields an
    /// empty list.
    #[must_use]
    pub fn detect(&self, sequence: &FieldSequence) -> Vec<StormList> {
        let frames: Vec<StormList> = sequence
            .frames()
            .par_iter()
            .enumerate()
            .map(|(time_step, field)| {
                let regions = self.extract_regions(field);
                debug!(time_step, storms = regions.len(), "Detected storms in frame");
                StormList { time_step, regions }
            })
            .collect();

        info!(
            frames = frames.len(),
            storms = frames.iter().map(StormList::storm_count).sum::<usize>(),
            threshold_dbz = self.config.reflectivity_threshold,
            "Storm detection complete"
        );
        frames
    }
}
