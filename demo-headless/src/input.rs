//! JSON loading for reflectivity sequences and pipeline config

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use stormcast_core::{Field, FieldSequence, NowcastConfig};

/// On-disk sequence: row-major frames of `width * height` dBZ values
#[derive(Debug, Deserialize)]
struct SequenceFile {
    width: usize,
    height: usize,
    frames: Vec<Vec<f32>>,
}

pub fn load_sequence(path: &Path) -> Result<FieldSequence> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: SequenceFile =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

    let frames = file
        .frames
        .into_iter()
        .enumerate()
        .map(|(t, data)| {
            Field::from_vec(file.width, file.height, data)
                .with_context(|| format!("frame {t} of {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(FieldSequence::new(frames)?)
}

pub fn load_config(path: &Path) -> Result<NowcastConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}
