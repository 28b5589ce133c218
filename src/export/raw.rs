//! RAW format export for game engine compatibility.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::biomes::BiomeId;

/// Errors that can occur during RAW export.
#[derive(Error, Debug)]
pub enum RawExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid height range: min ({0}) >= max ({1})")]
    InvalidHeightRange(f32, f32),
}

/// RAW export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RawFormat {
    /// 16-bit unsigned integer, little-endian (Unity default).
    #[default]
    R16LittleEndian,
    /// 16-bit unsigned integer, big-endian.
    R16BigEndian,
    /// 32-bit float, little-endian (high precision).
    R32Float,
}

impl RawFormat {
    pub fn bytes_per_sample(self) -> u64 {
        match self {
            RawFormat::R16LittleEndian | RawFormat::R16BigEndian => 2,
            RawFormat::R32Float => 4,
        }
    }
}

/// Writes `heights` row-major.
///
/// R16 formats map `[min_height, max_height]` onto `[0, 65535]`, clamping values
/// outside it; R32 writes the raw values and ignores the range.
pub fn export_heights_raw(
    heights: &[f32],
    path: &Path,
    format: RawFormat,
    min_height: f32,
    max_height: f32,
) -> Result<(), RawExportError> {
    if format != RawFormat::R32Float && (min_height.is_nan() || max_height.is_nan() || min_height >= max_height) {
        return Err(RawExportError::InvalidHeightRange(min_height, max_height));
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let range = max_height - min_height;
    let quantize = |height: f32| (((height - min_height) / range).clamp(0.0, 1.0) * 65535.0).round() as u16;

    match format {
        RawFormat::R16LittleEndian => {
            for &height in heights {
                writer.write_all(&quantize(height).to_le_bytes())?;
            }
        }
        RawFormat::R16BigEndian => {
            for &height in heights {
                writer.write_all(&quantize(height).to_be_bytes())?;
            }
        }
        RawFormat::R32Float => {
            for &height in heights {
                writer.write_all(&height.to_le_bytes())?;
            }
        }
    }

    writer.flush()?;
    debug!("wrote {} heights ({:?}) to {}", heights.len(), format, path.display());
    Ok(())
}

/// Writes biome ids as little-endian u16, row-major.
pub fn export_biome_ids_raw(ids: &[BiomeId], path: &Path) -> Result<(), RawExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for id in ids {
        writer.write_all(&id.as_u16().to_le_bytes())?;
    }
    writer.flush()?;
    debug!("wrote {} biome ids to {}", ids.len(), path.display());
    Ok(())
}

/// Writes an erosion trace as little-endian f32 triples.
pub fn export_trace_raw(trace: &[f32], path: &Path) -> Result<(), RawExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for value in trace {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Returns the expected file size for a RAW height export.
pub fn expected_file_size(width: usize, height: usize, format: RawFormat) -> u64 {
    (width as u64) * (height as u64) * format.bytes_per_sample()
}
