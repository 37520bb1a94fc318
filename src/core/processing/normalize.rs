//! Content normalization: crop to the alpha bounding box, fit into a padded
//! square canvas, and the fixed-canvas recentering variant.
use image::{RgbaImage, imageops};
use serde::Serialize;
use tracing::{info, warn};

use crate::core::processing::bbox::detect;
use crate::core::processing::padding::{paste_centered, transparent_canvas};
use crate::core::processing::resize::{resize_rgba, scaled_dimensions};
use crate::error::{Error, Result};
use crate::types::{BoundingBox, CanvasSpec};

/// Output of [`normalize`].
#[derive(Debug, Clone)]
pub struct Normalized {
    pub image: RgbaImage,
    /// Content box in the source; `None` means the input was fully transparent
    /// and `image` is a blank canvas.
    pub source_bbox: Option<BoundingBox>,
    pub scale: f64,
    pub placed: Option<BoundingBox>,
}

impl Normalized {
    pub fn is_blank(&self) -> bool {
        self.source_bbox.is_none()
    }
}

/// Pixel shift applied by [`center_in_place`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Offset {
    pub dx: i64,
    pub dy: i64,
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X={:+}px, Y={:+}px", self.dx, self.dy)
    }
}

/// Output of [`center_in_place`].
#[derive(Debug, Clone)]
pub struct Recentered {
    pub image: RgbaImage,
    pub source_bbox: Option<BoundingBox>,
    /// `None` when the input was fully transparent and nothing moved.
    pub offset: Option<Offset>,
}

fn crop_to(image: &RgbaImage, bbox: &BoundingBox) -> Result<RgbaImage> {
    if !bbox.fits_within(image.width(), image.height()) {
        return Err(Error::Processing(format!(
            "bounding box {} exceeds image {}x{}",
            bbox,
            image.width(),
            image.height()
        )));
    }
    Ok(imageops::crop_imm(image, bbox.left, bbox.top, bbox.width(), bbox.height()).to_image())
}

/// Crop `image` to its content, scale it to fit the canvas' usable area and
/// center it on a transparent `output_size` square.
///
/// A fully transparent input yields a blank canvas and a warning, never an error.
pub fn normalize(image: &RgbaImage, canvas: &CanvasSpec) -> Result<Normalized> {
    canvas.validate()?;
    let size = canvas.output_size;

    let Some(bbox) = detect(image) else {
        warn!(
            "Image {}x{} is fully transparent; emitting blank {}x{} canvas",
            image.width(),
            image.height(),
            size,
            size
        );
        return Ok(Normalized {
            image: transparent_canvas(size, size),
            source_bbox: None,
            scale: 0.0,
            placed: None,
        });
    };

    let content = crop_to(image, &bbox)?;
    let available = canvas.available();
    let (new_width, new_height, scale) =
        scaled_dimensions(content.width(), content.height(), available)?;

    info!(
        "Content {} scaled x{:.4} -> {}x{} (available {})",
        bbox, scale, new_width, new_height, available
    );

    let resized = resize_rgba(&content, new_width, new_height)?;
    let (result, (paste_x, paste_y)) = paste_centered(size, size, &resized);
    let placed = BoundingBox::new(
        paste_x as u32,
        paste_y as u32,
        paste_x as u32 + new_width,
        paste_y as u32 + new_height,
    );

    Ok(Normalized {
        image: result,
        source_bbox: Some(bbox),
        scale,
        placed,
    })
}

/// Move the content to the center of the image without resizing; the canvas
/// keeps its original dimensions. Returns the shift that was applied.
pub fn center_in_place(image: &RgbaImage) -> Result<Recentered> {
    let Some(bbox) = detect(image) else {
        warn!(
            "Image {}x{} is fully transparent; leaving it unchanged",
            image.width(),
            image.height()
        );
        return Ok(Recentered {
            image: image.clone(),
            source_bbox: None,
            offset: None,
        });
    };

    let content = crop_to(image, &bbox)?;
    let (result, (paste_x, paste_y)) = paste_centered(image.width(), image.height(), &content);
    let offset = Offset {
        dx: paste_x - bbox.left as i64,
        dy: paste_y - bbox.top as i64,
    };
    info!("Content {} moved {}", bbox, offset);

    Ok(Recentered {
        image: result,
        source_bbox: Some(bbox),
        offset: Some(offset),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn filled(width: u32, height: u32, bbox: (u32, u32, u32, u32)) -> RgbaImage {
        let mut img = RgbaImage::new(width, height);
        for y in bbox.1..bbox.3 {
            for x in bbox.0..bbox.2 {
                img.put_pixel(x, y, Rgba([180, 120, 60, 255]));
            }
        }
        img
    }

    fn assert_centered(image: &RgbaImage) {
        let bbox = detect(image).expect("content survives normalization");
        let (cx, cy) = bbox.center();
        let mid_x = image.width() as f64 / 2.0;
        let mid_y = image.height() as f64 / 2.0;
        assert!((cx - mid_x).abs() <= 1.0, "x center {cx} vs {mid_x}");
        assert!((cy - mid_y).abs() <= 1.0, "y center {cy} vs {mid_y}");
    }

    #[test]
    fn landscape_content_fills_available_width() {
        let src = filled(800, 600, (100, 50, 700, 550));
        let out = normalize(&src, &CanvasSpec::default()).unwrap();
        assert_eq!(out.image.dimensions(), (512, 512));
        assert_eq!(out.source_bbox, BoundingBox::new(100, 50, 700, 550));
        let placed = detect(&out.image).unwrap();
        assert_eq!(placed.width(), 471);
        assert!((392..=393).contains(&placed.height()));
        assert_centered(&out.image);
    }

    #[test]
    fn extreme_aspect_ratios_keep_size_and_center() {
        for (w, h) in [(10, 1000), (1000, 10)] {
            let src = filled(w, h, (0, 0, w, h));
            let out = normalize(&src, &CanvasSpec::default()).unwrap();
            assert_eq!(out.image.dimensions(), (512, 512));
            assert_centered(&out.image);
            let placed = detect(&out.image).unwrap();
            assert_eq!(placed.width().max(placed.height()), 471);
        }
    }

    #[test]
    fn tiny_content_is_scaled_up() {
        let src = filled(64, 64, (30, 30, 34, 36));
        let canvas = CanvasSpec {
            output_size: 128,
            padding_ratio: 0.0,
        };
        let out = normalize(&src, &canvas).unwrap();
        assert!(out.scale > 1.0);
        assert_eq!(out.placed.map(|b| b.height()), Some(128));
        assert_centered(&out.image);
    }

    #[test]
    fn blank_input_gives_blank_canvas() {
        let src = RgbaImage::new(300, 200);
        let out = normalize(&src, &CanvasSpec::default()).unwrap();
        assert!(out.is_blank());
        assert_eq!(out.image.dimensions(), (512, 512));
        assert!(out.image.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn invalid_canvas_is_rejected() {
        let src = filled(10, 10, (0, 0, 10, 10));
        let canvas = CanvasSpec {
            output_size: 0,
            padding_ratio: 0.04,
        };
        assert!(normalize(&src, &canvas).is_err());
    }

    #[test]
    fn center_in_place_reports_shift() {
        let src = filled(100, 80, (0, 0, 20, 10));
        let out = center_in_place(&src).unwrap();
        assert_eq!(out.image.dimensions(), (100, 80));
        assert_eq!(out.offset, Some(Offset { dx: 40, dy: 35 }));
        assert_eq!(detect(&out.image), BoundingBox::new(40, 35, 60, 45));
        assert_eq!(format!("{}", out.offset.unwrap()), "X=+40px, Y=+35px");
    }

    #[test]
    fn center_in_place_is_idempotent() {
        let src = filled(50, 50, (5, 30, 15, 48));
        let once = center_in_place(&src).unwrap();
        let twice = center_in_place(&once.image).unwrap();
        assert_eq!(twice.offset, Some(Offset { dx: 0, dy: 0 }));
        assert_eq!(once.image, twice.image);
    }

    #[test]
    fn center_in_place_leaves_blank_untouched() {
        let src = RgbaImage::new(12, 12);
        let out = center_in_place(&src).unwrap();
        assert_eq!(out.offset, None);
        assert_eq!(out.image, src);
    }
}
