//! Randomized invariant checks over synthetic reflectivity sequences
//!
//! Each test draws its fields from a fixed seed, so failures reproduce exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use stormcast_core::tracking::FormationTracker;
use stormcast_core::verification::StormRef;
use stormcast_core::{
    DetectionConfig, Field, FieldSequence, FormationEvent, StormDetector, VerificationScorer,
};

const WIDTH: usize = 64;
const HEIGHT: usize = 48;

/// Noisy background with a handful of random convective blocks per frame
fn random_sequence(rng: &mut StdRng, frames: usize) -> FieldSequence {
    let fields = (0..frames)
        .map(|_| {
            let mut field = Field::new(WIDTH, HEIGHT);
            for y in 0..HEIGHT {
                for x in 0..WIDTH {
                    field.set(x, y, rng.random_range(0.0..30.0));
                }
            }
            for _ in 0..rng.random_range(0..5) {
                let w = rng.random_range(2..10);
                let h = rng.random_range(2..10);
                let x0 = rng.random_range(0..WIDTH - w);
                let y0 = rng.random_range(0..HEIGHT - h);
                for y in y0..y0 + h {
                    for x in x0..x0 + w {
                        field.set(x, y, rng.random_range(40.0..60.0));
                    }
                }
            }
            field
        })
        .collect();
    FieldSequence::new(fields).unwrap()
}

fn events_for(sequence: &FieldSequence) -> Vec<FormationEvent> {
    let storms = StormDetector::default().detect(sequence);
    FormationTracker::default().track(&storms).unwrap()
}

#[test]
fn test_region_area_and_mask_invariants() {
    let mut rng = StdRng::seed_from_u64(11);
    let config = DetectionConfig::default();
    let detector = StormDetector::new(config).unwrap();

    for _ in 0..5 {
        let sequence = random_sequence(&mut rng, 4);
        for (frame, storms) in sequence.iter().zip(detector.detect(&sequence)) {
            for region in &storms.regions {
                assert_eq!(region.area, region.mask.count());
                assert!(region.area >= config.area_threshold);
                for (x, y) in region.mask.iter_set() {
                    assert!(frame.get(x, y) > config.reflectivity_threshold);
                }

                let raw = frame.exceeding(config.reflectivity_threshold);
                assert_eq!(region.boundary.rasterize(WIDTH, HEIGHT).and(&raw), region.mask);

                let vertices = region.boundary.vertices();
                assert!(vertices.len() >= 4);
                assert_eq!(vertices.first(), vertices.last());
            }
        }
    }
}

#[test]
fn test_detection_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(23);
    let sequence = random_sequence(&mut rng, 6);
    let detector = StormDetector::default();
    assert_eq!(detector.detect(&sequence), detector.detect(&sequence));
}

#[test]
fn test_formation_counts_bounded_by_detections() {
    let mut rng = StdRng::seed_from_u64(37);
    for _ in 0..5 {
        let sequence = random_sequence(&mut rng, 6);
        let storms = StormDetector::default().detect(&sequence);
        let events = FormationTracker::default().track(&storms).unwrap();

        assert_eq!(events.len(), sequence.len());
        assert_eq!(events[0].new_storm_count, storms[0].storm_count());
        for (event, frame) in events.iter().zip(&storms) {
            assert_eq!(event.time_step, frame.time_step);
            assert_eq!(event.new_storm_count, event.new_storm_coordinates.len());
            assert!(event.new_storm_count <= frame.storm_count());
        }
    }
}

#[test]
fn test_matching_uses_each_storm_once() {
    let mut rng = StdRng::seed_from_u64(53);
    let scorer = VerificationScorer::default();

    for _ in 0..5 {
        let truth = events_for(&random_sequence(&mut rng, 6));
        let pred = events_for(&random_sequence(&mut rng, 6));
        let matches = scorer.match_storms(&pred, &truth).unwrap();
        let report = matches.report();

        assert!(report.matched() <= report.total_true.min(report.total_pred));
        assert!(report.false_positives <= report.total_pred);
        for ratio in [
            report.correct_over_true,
            report.correct_over_pred,
            report.anytime_ratio,
            report.false_positive_ratio,
        ] {
            assert!((0.0..=1.0).contains(&ratio));
        }

        let mut truth_refs: FxHashSet<StormRef> = FxHashSet::default();
        let mut pred_refs: FxHashSet<StormRef> = FxHashSet::default();
        for record in &matches.records {
            assert!(truth_refs.insert(record.truth));
            assert!(pred_refs.insert(record.pred));
            assert!(record.truth.time_step.abs_diff(record.pred.time_step) <= 1);
        }
        for fp in &matches.false_positives {
            assert!(!pred_refs.contains(fp));
        }
    }
}

#[test]
fn test_perfect_forecast_scores_all_correct() {
    // Cells on a coarse lattice never merge, so every storm matches itself
    let mut rng = StdRng::seed_from_u64(71);
    let frames = (0..5)
        .map(|_| {
            let mut field = Field::new(WIDTH, HEIGHT);
            for cell_y in 0..2 {
                for cell_x in 0..3 {
                    if rng.random_bool(0.5) {
                        for y in 0..6 {
                            for x in 0..6 {
                                field.set(cell_x * 22 + 4 + x, cell_y * 24 + 4 + y, 55.0);
                            }
                        }
                    }
                }
            }
            field
        })
        .collect();
    let sequence = FieldSequence::new(frames).unwrap();
    let events = events_for(&sequence);

    let report = VerificationScorer::default().evaluate(&events, &events).unwrap();
    assert_eq!(report.correct, report.total_true);
    assert_eq!(report.total_true, report.total_pred);
    assert_eq!(report.false_positives, 0);
}
