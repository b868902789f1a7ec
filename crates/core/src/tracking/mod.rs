//! Storm formation tracking across consecutive frames

mod formation;

pub use formation::{detect_new_storm_formations, FormationEvent, FormationTracker};
