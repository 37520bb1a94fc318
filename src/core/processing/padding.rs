use image::{RgbaImage, imageops};
use tracing::debug;

/// Fully transparent `width x height` canvas.
pub fn transparent_canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::new(width, height)
}

/// Top-left offset that centers `content` on a `width x height` canvas,
/// rounding toward the top-left when the slack is odd.
pub fn centered_offset(width: u32, height: u32, content: &RgbaImage) -> (i64, i64) {
    let paste_x = (width as i64 - content.width() as i64).div_euclid(2);
    let paste_y = (height as i64 - content.height() as i64).div_euclid(2);
    (paste_x, paste_y)
}

/// Composite `content` through its own alpha onto a fresh transparent canvas,
/// centered. Returns the canvas and the paste origin.
pub fn paste_centered(width: u32, height: u32, content: &RgbaImage) -> (RgbaImage, (i64, i64)) {
    let (paste_x, paste_y) = centered_offset(width, height, content);

    debug!(
        "Pasting {}x{} onto {}x{} at ({}, {})",
        content.width(),
        content.height(),
        width,
        height,
        paste_x,
        paste_y
    );

    let mut canvas = transparent_canvas(width, height);
    imageops::overlay(&mut canvas, content, paste_x, paste_y);
    (canvas, (paste_x, paste_y))
}
