//! Storm detection on reflectivity frames
//!
//! The pipeline for one frame is threshold → dilate → trace contours → rasterize →
//! area filter ([`region`]); [`detector`] runs it over a whole sequence.

mod detector;
pub mod marching_squares;
pub mod morphology;
mod polygon;
mod region;

pub use detector::{StormDetector, StormList};
pub use marching_squares::find_contours;
pub use morphology::dilate;
pub use polygon::{Polygon, Vertex};
pub use region::{extract_regions, Region};
