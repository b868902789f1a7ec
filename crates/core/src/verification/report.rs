//! Verification summary record
//!
//! Field names are the reporting contract consumed by downstream printing and JSON
//! summaries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Event-wise forecast verification scores
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VerificationReport {
    /// True storms matched by a prediction at the same time step
    pub correct: usize,
    /// True storms matched by a prediction one step earlier
    pub early: usize,
    /// True storms matched by a prediction one step later
    pub late: usize,
    /// Predicted storms with no acceptable true storm within ±1 step
    pub false_positives: usize,
    pub total_true: usize,
    pub total_pred: usize,
    /// `correct / total_true`
    pub correct_over_true: f64,
    /// `correct / total_pred`
    pub correct_over_pred: f64,
    /// `(correct + early + late) / total_true`
    pub anytime_ratio: f64,
    /// `false_positives / total_pred`
    pub false_positive_ratio: f64,
}

impl VerificationReport {
    /// Build a report from raw counts; ratios with a zero denominator are `0.0`
    #[must_use]
    pub fn from_counts(
        correct: usize,
        early: usize,
        late: usize,
        false_positives: usize,
        total_true: usize,
        total_pred: usize,
    ) -> Self {
        Self {
            correct,
            early,
            late,
            false_positives,
            total_true,
            total_pred,
            correct_over_true: ratio(correct, total_true),
            correct_over_pred: ratio(correct, total_pred),
            anytime_ratio: ratio(correct + early + late, total_true),
            false_positive_ratio: ratio(false_positives, total_pred),
        }
    }

    /// Report for inputs without a single boundary vertex
    ///
    /// Every predicted storm counts as a false positive, but all ratios stay `0.0`
    /// since no raster could be built to compare against.
    #[must_use]
    pub fn without_coordinates(total_pred: usize) -> Self {
        Self {
            false_positives: total_pred,
            total_pred,
            ..Self::default()
        }
    }

    /// Matched true storms regardless of timing
    #[must_use]
    pub fn matched(&self) -> usize {
        self.correct + self.early + self.late
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "New storm verification")?;
        writeln!(f, "  true storms:          {}", self.total_true)?;
        writeln!(f, "  predicted storms:     {}", self.total_pred)?;
        writeln!(f, "  correct (t):          {}", self.correct)?;
        writeln!(f, "  early (t-1):          {}", self.early)?;
        writeln!(f, "  late (t+1):           {}", self.late)?;
        writeln!(f, "  false positives:      {}", self.false_positives)?;
        writeln!(f, "  correct / true:       {:.3}", self.correct_over_true)?;
        writeln!(f, "  correct / predicted:  {:.3}", self.correct_over_pred)?;
        writeln!(f, "  anytime ratio:        {:.3}", self.anytime_ratio)?;
        write!(f, "  false positive ratio: {:.3}", self.false_positive_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ratios() {
        let report = VerificationReport::from_counts(2, 1, 1, 3, 8, 10);
        assert_relative_eq!(report.correct_over_true, 0.25);
        assert_relative_eq!(report.correct_over_pred, 0.2);
        assert_relative_eq!(report.anytime_ratio, 0.5);
        assert_relative_eq!(report.false_positive_ratio, 0.3);
        assert_eq!(report.matched(), 4);
    }

    #[test]
    fn test_zero_denominators() {
        let report = VerificationReport::from_counts(0, 0, 0, 0, 0, 0);
        assert_eq!(report, VerificationReport::default());
        assert!(!report.anytime_ratio.is_nan());
    }

    #[test]
    fn test_without_coordinates() {
        let report = VerificationReport::without_coordinates(4);
        assert_eq!(report.false_positives, 4);
        assert_eq!(report.total_pred, 4);
        assert_eq!(report.total_true, 0);
        assert_eq!(report.false_positive_ratio, 0.0);
    }

    #[test]
    fn test_json_field_names() {
        let report = VerificationReport::from_counts(1, 0, 0, 0, 1, 1);
        let value = serde_json::to_value(report).unwrap();
        for key in [
            "correct",
            "early",
            "late",
            "false_positives",
            "total_true",
            "total_pred",
            "correct_over_true",
            "correct_over_pred",
            "anytime_ratio",
            "false_positive_ratio",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_display_mentions_counts() {
        let text = VerificationReport::from_counts(3, 0, 1, 2, 5, 6).to_string();
        assert!(text.contains("correct (t):          3"));
        assert!(text.contains("false positives:      2"));
    }
}
