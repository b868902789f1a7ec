//! Temporal sequences of reflectivity fields
//!
//! A [`FieldSequence`] is the input boundary of the storm pipeline. It guarantees every
//! frame shares one shape, so downstream mask arithmetic never compares grids of
//! different sizes.

use super::Field;
use crate::error::{Result, StormError};

/// Ordered list of fields indexed by time step `t = 0..T-1`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSequence {
    frames: Vec<Field>,
}

impl FieldSequence {
    /// Build a sequence, checking that all frames share the shape of frame 0
    ///
    /// # Errors
    ///
    /// Returns [`StormError::ShapeMismatch`] naming the first offending frame.
    pub fn new(frames: Vec<Field>) -> Result<Self> {
        if let Some(first) = frames.first() {
            let expected = first.shape();
            if let Some((index, frame)) = frames
                .iter()
                .enumerate()
                .find(|(_, f)| f.shape() != expected)
            {
                return Err(StormError::ShapeMismatch {
                    index,
                    expected,
                    found: frame.shape(),
                });
            }
        }
        Ok(Self { frames })
    }

    /// Build from a flat `(T, H, W)` buffer
    ///
    /// # Errors
    ///
    /// Returns [`StormError::DataLength`] if `data.len() != frames * height * width`.
    pub fn from_flat(frames: usize, height: usize, width: usize, data: &[f32]) -> Result<Self> {
        let frame_len = height * width;
        if data.len() != frames * frame_len {
            return Err(StormError::DataLength {
                len: data.len(),
                width,
                height,
                expected: frames * frame_len,
            });
        }
        if frame_len == 0 {
            return Ok(Self {
                frames: (0..frames).map(|_| Field::new(width, height)).collect(),
            });
        }

        let fields = data
            .chunks_exact(frame_len)
            .map(|chunk| Field::from_vec(width, height, chunk.to_vec()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { frames: fields })
    }

    /// Build from a flat `(T, C, H, W)` volume, collapsing the `C` vertical levels
    /// into their column maximum
    ///
    /// Missing values (NaN) are dropped: a pixel that is NaN on one level takes the
    /// maximum of the remaining levels, and stays NaN only when every level is NaN.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::DataLength`] on a buffer of the wrong size, or
    /// [`StormError::InvalidParameter`] if `levels == 0`.
    pub fn from_volume_max(
        frames: usize,
        levels: usize,
        height: usize,
        width: usize,
        data: &[f32],
    ) -> Result<Self> {
        if levels == 0 {
            return Err(StormError::invalid_parameter(
                "levels",
                "at least one level is required",
            ));
        }
        let frame_len = height * width;
        let expected = frames * levels * frame_len;
        if data.len() != expected {
            return Err(StormError::DataLength {
                len: data.len(),
                width,
                height,
                expected,
            });
        }

        let mut fields = Vec::with_capacity(frames);
        for t in 0..frames {
            let start = t * levels * frame_len;
            let level_fields = (0..levels)
                .map(|c| {
                    let offset = start + c * frame_len;
                    Field::from_vec(width, height, data[offset..offset + frame_len].to_vec())
                })
                .collect::<Result<Vec<_>>>()?;
            fields.push(Field::max_composite(&level_fields)?);
        }
        Ok(Self { frames: fields })
    }

    /// Join sequences end to end
    ///
    /// Empty parts are skipped; every non-empty part must share the same frame shape.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::ShapeMismatch`] with the index of the offending frame in the
    /// joined sequence.
    pub fn concat(parts: impl IntoIterator<Item = FieldSequence>) -> Result<Self> {
        let frames: Vec<Field> = parts.into_iter().flat_map(|p| p.frames).collect();
        Self::new(frames)
    }

    /// Number of frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` for a sequence without frames
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame shape `(width, height)`, or `None` for an empty sequence
    #[must_use]
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.frames.first().map(Field::shape)
    }

    /// Frame at time step `t`
    #[must_use]
    pub fn get(&self, t: usize) -> Option<&Field> {
        self.frames.get(t)
    }

    /// All frames in time order
    #[must_use]
    pub fn frames(&self) -> &[Field] {
        &self.frames
    }

    /// Iterate frames in time order
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.frames.iter()
    }
}

impl<'a> IntoIterator for &'a FieldSequence {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sequence_is_valid() {
        let seq = FieldSequence::new(Vec::new()).unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq.shape(), None);
    }

    #[test]
    fn test_shape_mismatch_fails_fast() {
        let frames = vec![Field::new(8, 8), Field::new(8, 8), Field::new(8, 7)];
        let err = FieldSequence::new(frames).unwrap_err();
        assert_eq!(
            err,
            StormError::ShapeMismatch {
                index: 2,
                expected: (8, 8),
                found: (8, 7)
            }
        );
    }

    #[test]
    fn test_from_flat_layout() {
        // 2 frames of 2 rows x 3 columns
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let seq = FieldSequence::from_flat(2, 2, 3, &data).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.shape(), Some((3, 2)));
        assert_eq!(seq.get(1).unwrap().get(2, 1), 11.0);
        assert_eq!(seq.get(0).unwrap().get(0, 1), 3.0);
    }

    #[test]
    fn test_from_flat_wrong_length() {
        assert!(matches!(
            FieldSequence::from_flat(2, 2, 3, &[0.0; 11]),
            Err(StormError::DataLength { expected: 12, .. })
        ));
    }

    #[test]
    fn test_from_volume_max_collapses_levels() {
        // 1 frame, 2 levels, 1x2 grid
        let data = [10.0, 60.0, 50.0, 20.0];
        let seq = FieldSequence::from_volume_max(1, 2, 1, 2, &data).unwrap();
        assert_eq!(seq.get(0).unwrap().as_slice(), &[50.0, 60.0]);
    }

    #[test]
    fn test_from_volume_max_drops_missing_levels() {
        // 1 frame, 2 levels, 1x3 grid
        let data = [f32::NAN, 30.0, f32::NAN, 45.0, f32::NAN, f32::NAN];
        let seq = FieldSequence::from_volume_max(1, 2, 1, 3, &data).unwrap();
        let column = seq.get(0).unwrap().as_slice();
        assert_eq!(&column[..2], &[45.0, 30.0]);
        assert!(column[2].is_nan());
    }

    #[test]
    fn test_concat_checks_shapes() {
        let a = FieldSequence::new(vec![Field::new(4, 4)]).unwrap();
        let b = FieldSequence::new(vec![Field::new(4, 4), Field::new(4, 4)]).unwrap();
        let joined = FieldSequence::concat([a.clone(), b]).unwrap();
        assert_eq!(joined.len(), 3);

        let c = FieldSequence::new(vec![Field::new(5, 4)]).unwrap();
        assert!(matches!(
            FieldSequence::concat([a, c]),
            Err(StormError::ShapeMismatch { index: 1, .. })
        ));
    }
}
