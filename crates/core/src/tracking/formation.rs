//! Storm-formation tracking
//!
//! Classifies each detected storm as newly formed or continuing by comparing it with
//! the storms of the immediately preceding frame only. A storm is new when no
//! previous-frame storm covers more than `overlap_threshold` of its own area. There
//! are no persistent storm identities: a storm that vanishes for one frame and
//! reappears is new again.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{DetectionConfig, FormationConfig};
use crate::detection::{Polygon, StormDetector, StormList};
use crate::error::{Result, StormError};
use crate::grid::{FieldSequence, Mask};

/// Newly formed storms at one time step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormationEvent {
    pub time_step: usize,
    pub new_storm_count: usize,
    /// Boundaries of the new storms, in detection order
    pub new_storm_coordinates: Vec<Polygon>,
}

impl FormationEvent {
    /// Event carrying `polygons` as the new storms at `time_step`
    #[must_use]
    pub fn new(time_step: usize, polygons: Vec<Polygon>) -> Self {
        Self {
            time_step,
            new_storm_count: polygons.len(),
            new_storm_coordinates: polygons,
        }
    }
}

/// One-step-lookback formation tracker
#[derive(Debug, Clone, Copy, Default)]
pub struct FormationTracker {
    config: FormationConfig,
}

impl FormationTracker {
    /// # Errors
    ///
    /// Returns [`StormError::InvalidParameter`] if the overlap threshold is out of range.
    pub fn new(config: FormationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &FormationConfig {
        &self.config
    }

    /// A storm is new unless some previous mask covers more than the threshold of it
    ///
    /// Overlap exactly at the threshold does not disqualify.
    #[must_use]
    pub fn is_new(&self, current: &Mask, previous: &[&Mask]) -> bool {
        previous
            .iter()
            .all(|prev| current.overlap_ratio(prev) <= self.config.overlap_threshold)
    }

    /// Classify storms frame by frame
    ///
    /// Frame 0 has no predecessor, so all of its storms are new.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::ShapeMismatch`] if storm masks do not all share one shape,
    /// which happens only when the lists were assembled from different grids.
    pub fn track(&self, frames: &[StormList]) -> Result<Vec<FormationEvent>> {
        check_mask_shapes(frames)?;

        let mut events = Vec::with_capacity(frames.len());
        let mut previous_masks: Vec<&Mask> = Vec::new();

        for frame in frames {
            let new_storms: Vec<Polygon> = frame
                .regions
                .iter()
                .filter(|region| self.is_new(&region.mask, &previous_masks))
                .map(|region| region.boundary.clone())
                .collect();

            debug!(
                time_step = frame.time_step,
                storms = frame.storm_count(),
                new_storms = new_storms.len(),
                "Classified storm formations"
            );
            events.push(FormationEvent::new(frame.time_step, new_storms));

            previous_masks = frame.storm_masks().collect();
        }

        info!(
            frames = events.len(),
            new_storms = events.iter().map(|e| e.new_storm_count).sum::<usize>(),
            "Formation tracking complete"
        );
        Ok(events)
    }
}

fn check_mask_shapes(frames: &[StormList]) -> Result<()> {
    let mut masks = frames.iter().flat_map(StormList::storm_masks);
    let Some(first) = masks.next() else {
        return Ok(());
    };
    let expected = first.shape();

    for frame in frames {
        if let Some(mask) = frame.storm_masks().find(|m| m.shape() != expected) {
            return Err(StormError::ShapeMismatch {
                index: frame.time_step,
                expected,
                found: mask.shape(),
            });
        }
    }
    Ok(())
}

/// Detect storms and classify their formation in one pass
///
/// # Errors
///
/// Returns [`StormError::InvalidParameter`] if either config fails validation.
pub fn detect_new_storm_formations(
    sequence: &FieldSequence,
    detection: &DetectionConfig,
    formation: &FormationConfig,
) -> Result<Vec<FormationEvent>> {
    let detector = StormDetector::new(*detection)?;
    let tracker = FormationTracker::new(*formation)?;
    tracker.track(&detector.detect(sequence))
}
