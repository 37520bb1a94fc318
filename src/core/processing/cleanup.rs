//! Explicit post-slice cleanup steps and clipping checks.
use image::{Rgba, RgbaImage, imageops};
use tracing::debug;

use crate::core::processing::bbox::detect;
use crate::types::EdgeContacts;

/// Borders of `image` that have at least one opaque pixel on them. Content that
/// touches a border was probably clipped by the crop that produced the image.
pub fn edge_contacts(image: &RgbaImage) -> EdgeContacts {
    let (width, height) = image.dimensions();
    let mut contacts = EdgeContacts::default();
    if width == 0 || height == 0 {
        return contacts;
    }
    let opaque = |x: u32, y: u32| image.get_pixel(x, y)[3] > 0;

    for x in 0..width {
        contacts.top |= opaque(x, 0);
        contacts.bottom |= opaque(x, height - 1);
    }
    for y in 0..height {
        contacts.left |= opaque(0, y);
        contacts.right |= opaque(width - 1, y);
    }
    contacts
}

/// Crop to the content box grown by `padding` pixels on every side, clamped to
/// the image. Fully transparent images come back unchanged.
pub fn trim_to_content(image: &RgbaImage, padding: u32) -> RgbaImage {
    let Some(bbox) = detect(image) else {
        return image.clone();
    };
    let left = bbox.left.saturating_sub(padding);
    let top = bbox.top.saturating_sub(padding);
    let right = bbox.right.saturating_add(padding).min(image.width());
    let bottom = bbox.bottom.saturating_add(padding).min(image.height());
    debug!(
        "Trim to ({}, {}) - ({}, {}) with {}px padding",
        left, top, right, bottom, padding
    );
    imageops::crop_imm(image, left, top, right - left, bottom - top).to_image()
}

/// Make every pixel whose red, green and blue are all below `threshold` fully
/// transparent. Returns the number of pixels keyed out.
pub fn key_dark_background(image: &mut RgbaImage, threshold: u8) -> usize {
    let mut keyed = 0;
    for pixel in image.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        if a > 0 && r < threshold && g < threshold && b < threshold {
            *pixel = Rgba([0, 0, 0, 0]);
            keyed += 1;
        }
    }
    keyed
}
