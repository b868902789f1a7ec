//! Event-wise verification of predicted storm formations
//!
//! Matches predicted new storms to true new storms with a ±1 time step tolerance.
//!
//! # Algorithm
//!
//! 1. Infer a common raster from the largest boundary vertex in either sequence and
//!    rasterize every stored polygon onto it.
//! 2. For each true storm, in time then index order, look for an unused predicted
//!    storm at `t`, then `t - 1`, then `t + 1`. The first one covering at least
//!    `overlap_threshold` of the true storm's area is the match; both are marked used
//!    and the match is scored correct, early or late.
//! 3. Each predicted storm left unused is a false positive unless an *unused* true
//!    storm at `t - 1`, `t` or `t + 1` covers at least `overlap_threshold` of the
//!    predicted storm's area.
//!
//! "Used" marking guarantees no storm appears in more than one match.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use super::report::VerificationReport;
use crate::config::VerificationConfig;
use crate::error::{Result, StormError};
use crate::grid::Mask;
use crate::tracking::FormationEvent;

/// Largest raster side the scorer will allocate; vertices beyond it are rejected.
pub const MAX_RASTER_EXTENT: usize = 1 << 15;

/// Search order for matching a true storm: exact, then early, then late.
const MATCH_OFFSETS: [isize; 3] = [0, -1, 1];

/// Search order for rescuing an unmatched prediction from false-positive status
const RESCUE_OFFSETS: [isize; 3] = [-1, 0, 1];

/// Timing class of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Predicted at the true time step
    Correct,
    /// Predicted one step before the true storm formed
    Early,
    /// Predicted one step after the true storm formed
    Late,
}

impl MatchKind {
    /// Classify the prediction offset `pred_t - true_t`
    #[must_use]
    pub fn from_offset(dt: isize) -> Option<Self> {
        match dt {
            0 => Some(Self::Correct),
            -1 => Some(Self::Early),
            1 => Some(Self::Late),
            _ => None,
        }
    }
}

/// Address of one storm: its time step and index within that step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StormRef {
    pub time_step: usize,
    pub index: usize,
}

/// A true storm paired with the predicted storm that matched it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MatchRecord {
    pub truth: StormRef,
    pub pred: StormRef,
    pub kind: MatchKind,
}

/// Full outcome of a matching run
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MatchSet {
    /// Matches in the order they were made
    pub records: Vec<MatchRecord>,
    /// Unmatched predictions with no acceptable true storm nearby
    pub false_positives: Vec<StormRef>,
    pub total_true: usize,
    pub total_pred: usize,
    /// Common raster `(width, height)`; `None` when no boundary vertex exists at all
    pub raster_shape: Option<(usize, usize)>,
}

impl MatchSet {
    fn count(&self, kind: MatchKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }

    /// Summarize into the reporting record
    #[must_use]
    pub fn report(&self) -> VerificationReport {
        if self.raster_shape.is_none() {
            return VerificationReport::without_coordinates(self.total_pred);
        }
        VerificationReport::from_counts(
            self.count(MatchKind::Correct),
            self.count(MatchKind::Early),
            self.count(MatchKind::Late),
            self.false_positives.len(),
            self.total_true,
            self.total_pred,
        )
    }
}

/// A stored polygon rasterized onto the common grid
#[derive(Debug, Clone)]
struct RasterStorm {
    mask: Mask,
    area: usize,
    used: bool,
}

/// Rasterized storms grouped by time step
type StormLookup = BTreeMap<usize, Vec<RasterStorm>>;

/// Scorer for predicted versus true storm formations
#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationScorer {
    config: VerificationConfig,
}

impl VerificationScorer {
    /// # Errors
    ///
    /// Returns [`StormError::InvalidParameter`](crate::StormError::InvalidParameter) if
    /// the overlap threshold is out of range.
    pub fn new(config: VerificationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Score `pred` against `truth`
    ///
    /// # Errors
    ///
    /// Returns [`StormError::InvalidParameter`] if a boundary vertex is non-finite or lies
    /// beyond [`MAX_RASTER_EXTENT`].
    pub fn evaluate(
        &self,
        pred: &[FormationEvent],
        truth: &[FormationEvent],
    ) -> Result<VerificationReport> {
        let report = self.match_storms(pred, truth)?.report();
        info!(
            correct = report.correct,
            early = report.early,
            late = report.late,
            false_positives = report.false_positives,
            total_true = report.total_true,
            total_pred = report.total_pred,
            "Storm formation verification complete"
        );
        Ok(report)
    }

    /// Run the matching and keep every individual decision
    ///
    /// # Errors
    ///
    /// Returns [`StormError::InvalidParameter`] if a boundary vertex is non-finite or lies
    /// beyond [`MAX_RASTER_EXTENT`].
    pub fn match_storms(
        &self,
        pred: &[FormationEvent],
        truth: &[FormationEvent],
    ) -> Result<MatchSet> {
        let Some((width, height)) = infer_raster_shape(pred, truth)? else {
            debug!("No boundary coordinates in either sequence, skipping rasterization");
            return Ok(MatchSet {
                false_positives: Vec::new(),
                total_pred: pred.iter().map(|e| e.new_storm_count).sum(),
                ..MatchSet::default()
            });
        };
        debug!(width, height, "Rasterizing storm boundaries");

        let mut pred_lookup = build_lookup(pred, width, height);
        let mut true_lookup = build_lookup(truth, width, height);
        let threshold = self.config.overlap_threshold;

        let total_true = true_lookup.values().map(Vec::len).sum();
        let total_pred = pred_lookup.values().map(Vec::len).sum();

        let mut records = Vec::new();
        let true_times: Vec<usize> = true_lookup.keys().copied().collect();
        for t in true_times {
            let count = true_lookup.get(&t).map_or(0, Vec::len);
            for i in 0..count {
                let true_storm = &true_lookup[&t][i];
                let Some((tt, j, kind)) =
                    find_prediction(true_storm, t, &pred_lookup, threshold)
                else {
                    continue;
                };

                if let Some(storm) = pred_lookup.get_mut(&tt).and_then(|s| s.get_mut(j)) {
                    storm.used = true;
                }
                if let Some(storm) = true_lookup.get_mut(&t).and_then(|s| s.get_mut(i)) {
                    storm.used = true;
                }
                records.push(MatchRecord {
                    truth: StormRef {
                        time_step: t,
                        index: i,
                    },
                    pred: StormRef {
                        time_step: tt,
                        index: j,
                    },
                    kind,
                });
            }
        }

        let mut false_positives = Vec::new();
        for (&t, storms) in &pred_lookup {
            for (j, pred_storm) in storms.iter().enumerate() {
                if pred_storm.used {
                    continue;
                }
                if !has_unused_truth_nearby(pred_storm, t, &true_lookup, threshold) {
                    false_positives.push(StormRef {
                        time_step: t,
                        index: j,
                    });
                }
            }
        }

        debug!(
            matches = records.len(),
            false_positives = false_positives.len(),
            "Storm matching finished"
        );

        Ok(MatchSet {
            records,
            false_positives,
            total_true,
            total_pred,
            raster_shape: Some((width, height)),
        })
    }
}

/// First unused prediction covering enough of `true_storm`, searched in
/// [`MATCH_OFFSETS`] order
fn find_prediction(
    true_storm: &RasterStorm,
    t: usize,
    pred_lookup: &StormLookup,
    threshold: f64,
) -> Option<(usize, usize, MatchKind)> {
    if true_storm.area == 0 {
        return None;
    }
    for dt in MATCH_OFFSETS {
        let Some(tt) = t.checked_add_signed(dt) else {
            continue;
        };
        let Some(candidates) = pred_lookup.get(&tt) else {
            continue;
        };
        let hit = candidates.iter().position(|pred_storm| {
            !pred_storm.used
                && overlap(&true_storm.mask, &pred_storm.mask, true_storm.area) >= threshold
        });
        if let (Some(j), Some(kind)) = (hit, MatchKind::from_offset(dt)) {
            return Some((tt, j, kind));
        }
    }
    None
}

/// Does an unused true storm within ±1 step cover enough of `pred_storm`
fn has_unused_truth_nearby(
    pred_storm: &RasterStorm,
    t: usize,
    true_lookup: &StormLookup,
    threshold: f64,
) -> bool {
    if pred_storm.area == 0 {
        return false;
    }
    RESCUE_OFFSETS.iter().any(|&dt| {
        t.checked_add_signed(dt)
            .and_then(|tt| true_lookup.get(&tt))
            .is_some_and(|candidates| {
                candidates.iter().any(|true_storm| {
                    !true_storm.used
                        && overlap(&true_storm.mask, &pred_storm.mask, pred_storm.area) >= threshold
                })
            })
    })
}

fn overlap(a: &Mask, b: &Mask, reference_area: usize) -> f64 {
    a.intersection_count(b) as f64 / reference_area as f64
}

/// `(width, height)` covering every boundary vertex, or `None` if there is none
///
/// Coordinates are truncated toward zero; negative coordinates never shrink the raster
/// below one pixel.
fn infer_raster_shape(
    pred: &[FormationEvent],
    truth: &[FormationEvent],
) -> Result<Option<(usize, usize)>> {
    let limit = MAX_RASTER_EXTENT as f64;
    let mut max_x = 0.0_f64;
    let mut max_y = 0.0_f64;
    let mut found = false;

    let polygons = truth
        .iter()
        .chain(pred)
        .flat_map(|e| &e.new_storm_coordinates)
        .filter(|p| !p.is_empty());
    for polygon in polygons {
        found = true;
        for v in polygon.vertices() {
            if !(v.x.is_finite() && v.y.is_finite()) || v.x >= limit || v.y >= limit {
                return Err(StormError::invalid_parameter(
                    "new_storm_coordinates",
                    format!(
                        "vertex ({}, {}) outside the {MAX_RASTER_EXTENT}-pixel raster limit",
                        v.x, v.y
                    ),
                ));
            }
            max_x = max_x.max(v.x.trunc());
            max_y = max_y.max(v.y.trunc());
        }
    }

    Ok(found.then(|| (max_x as usize + 1, max_y as usize + 1)))
}

/// Rasterize every event's polygons; a repeated time step replaces the earlier entry
fn build_lookup(events: &[FormationEvent], width: usize, height: usize) -> StormLookup {
    let mut lookup = StormLookup::new();
    for event in events {
        let storms = event
            .new_storm_coordinates
            .iter()
            .map(|polygon| {
                let mask = polygon.rasterize(width, height);
                let area = mask.count();
                RasterStorm {
                    mask,
                    area,
                    used: false,
                }
            })
            .collect();
        lookup.insert(event.time_step, storms);
    }
    lookup
}

/// Score predicted against true formations in one call
///
/// # Errors
///
/// Returns [`StormError::InvalidParameter`] if the config fails validation or a
/// boundary vertex is out of range.
pub fn evaluate_new_storm_predictions(
    pred: &[FormationEvent],
    truth: &[FormationEvent],
    config: &VerificationConfig,
) -> Result<VerificationReport> {
    VerificationScorer::new(*config)?.evaluate(pred, truth)
}
