//! I/O layer: reading assets into RGBA buffers, the timestamped `backup`
//! manager, and `writers` for lossless PNG output.
use std::path::Path;

use image::RgbaImage;

use crate::error::Result;

pub mod backup;
pub use backup::{BackupManager, RestoreReport, SnapshotHandle};

pub mod writers;

/// Decode an in-memory asset into RGBA8, synthesizing opaque alpha when the
/// source has none.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Read and decode `path`, returning the raw bytes alongside the image so the
/// caller can back up exactly what was on disk.
pub fn load_rgba(path: &Path) -> Result<(Vec<u8>, RgbaImage)> {
    let bytes = std::fs::read(path)?;
    let image = decode_rgba(&bytes)?;
    Ok((bytes, image))
}
