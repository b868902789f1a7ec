//! Forecast verification
//!
//! Event-wise scoring of predicted storm formations against observed ones
//! ([`scorer`]), plus pixel-wise error summaries ([`pixel_metrics`]).

pub mod pixel_metrics;
mod report;
pub mod scorer;

pub use pixel_metrics::{
    mse_by_ranges, weighted_mse, IntensityRange, RangeError, DEFAULT_HIGH_WEIGHT,
    DEFAULT_INTENSITY_RANGES, DEFAULT_WEIGHT_THRESHOLD,
};
pub use report::VerificationReport;
pub use scorer::{
    evaluate_new_storm_predictions, MatchKind, MatchRecord, MatchSet, StormRef, VerificationScorer,
};
