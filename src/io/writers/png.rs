use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};

/// Destination for finished images.
pub trait ImageSink {
    fn save(&self, image: &RgbaImage, path: &Path) -> Result<()>;
}

/// Lossless RGBA PNG writer.
///
/// Output goes to a sibling temp file that is renamed over `path` only after
/// encoding succeeded, so a failed save leaves the previous file untouched.
#[derive(Debug, Clone, Copy)]
pub struct PngSink {
    /// Best compression with adaptive filtering; slower, smaller, still lossless.
    pub optimize: bool,
}

impl Default for PngSink {
    fn default() -> Self {
        Self { optimize: true }
    }
}

pub fn write_rgba_png<W: Write>(writer: W, image: &RgbaImage, optimize: bool) -> Result<()> {
    let encoder = if optimize {
        PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive)
    } else {
        PngEncoder::new(writer)
    };
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(())
}

impl ImageSink for PngSink {
    fn save(&self, image: &RgbaImage, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            write_rgba_png(&mut writer, image, self.optimize)?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        debug!(
            "Saved {}x{} PNG to {}",
            image.width(),
            image.height(),
            path.display()
        );
        Ok(())
    }
}

/// Plain, non-atomic PNG write for throwaway previews.
pub fn write_preview_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_rgba_png(&mut writer, image, false)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn saved_png_decodes_losslessly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.png");
        let mut img = RgbaImage::new(5, 4);
        img.put_pixel(1, 2, Rgba([12, 34, 56, 78]));
        img.put_pixel(4, 3, Rgba([255, 255, 255, 1]));

        for optimize in [false, true] {
            PngSink { optimize }.save(&img, &path).unwrap();
            let back = image::open(&path).unwrap().to_rgba8();
            assert_eq!(back, img);
        }
    }

    #[test]
    fn failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.png");
        std::fs::write(&path, b"previous").unwrap();
        // A zero-sized image cannot be encoded as PNG.
        let empty = RgbaImage::new(0, 0);
        assert!(PngSink::default().save(&empty, &path).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"previous");
    }
}
