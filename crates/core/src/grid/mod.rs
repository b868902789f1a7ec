//! Gridded reflectivity data
//!
//! - [`Field`]: one 2D reflectivity frame (dBZ)
//! - [`FieldSequence`]: frames ordered by time step, all of one shape
//! - [`Mask`]: boolean occupancy grid sharing the field layout

mod field;
mod mask;
mod sequence;

pub use field::Field;
pub use mask::Mask;
pub use sequence::FieldSequence;
