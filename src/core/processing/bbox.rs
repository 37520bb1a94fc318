use image::{DynamicImage, RgbaImage};

use crate::types::BoundingBox;

/// Smallest rectangle enclosing every pixel with alpha > 0, or `None` when the
/// image is fully transparent.
pub fn detect(image: &RgbaImage) -> Option<BoundingBox> {
    let (width, height) = image.dimensions();
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] > 0 {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !found {
        return None;
    }
    BoundingBox::new(min_x, min_y, max_x + 1, max_y + 1)
}

/// Same as [`detect`] for any decoded image; images without an alpha channel are
/// treated as fully opaque.
pub fn detect_dynamic(image: &DynamicImage) -> Option<BoundingBox> {
    detect(&image.to_rgba8())
}
