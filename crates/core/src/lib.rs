//! Storm Nowcasting Core Library
//!
//! Event-level analysis of radar reflectivity nowcasts: find convective storm cells in
//! each frame, decide which of them are newly formed, and score predicted formations
//! against observed ones.
//!
//! ## Pipeline
//!
//! - [`detection`]: threshold, dilate, trace boundaries and rasterize storm regions
//! - [`tracking`]: one-step-lookback classification of new storm formations
//! - [`verification`]: event-wise matching within ±1 time step, plus pixel-wise error
//!   summaries binned by intensity
//!
//! ```no_run
//! use stormcast_core::{
//!     detect_new_storm_formations, evaluate_new_storm_predictions, FieldSequence, NowcastConfig,
//! };
//!
//! # fn run(truth: &FieldSequence, pred: &FieldSequence) -> stormcast_core::Result<()> {
//! let config = NowcastConfig::default();
//! let true_events = detect_new_storm_formations(truth, &config.detection, &config.formation)?;
//! let pred_events = detect_new_storm_formations(pred, &config.detection, &config.formation)?;
//! let report = evaluate_new_storm_predictions(&pred_events, &true_events, &config.verification)?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod detection;
pub mod error;
pub mod grid;
pub mod tracking;
pub mod verification;

// Re-export core types
pub use config::{Connectivity, DetectionConfig, FormationConfig, NowcastConfig, VerificationConfig};
pub use error::{Result, StormError};
pub use grid::{Field, FieldSequence, Mask};

// Re-export pipeline types
pub use detection::{Polygon, Region, StormDetector, StormList, Vertex};
pub use tracking::{detect_new_storm_formations, FormationEvent, FormationTracker};
pub use verification::{
    evaluate_new_storm_predictions, mse_by_ranges, weighted_mse, MatchSet, VerificationReport,
    VerificationScorer,
};

/// Detect storms in every frame of `sequence`
///
/// # Errors
///
/// Returns [`StormError::InvalidParameter`] if `config` fails validation.
pub fn detect_storms(sequence: &FieldSequence, config: &DetectionConfig) -> Result<Vec<StormList>> {
    Ok(StormDetector::new(*config)?.detect(sequence))
}
