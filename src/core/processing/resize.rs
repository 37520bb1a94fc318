use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbaImage;
use tracing::debug;

use crate::error::{Error, Result};

/// Aspect-preserving target size for content fitted into an `available` square.
///
/// Returns `(new_width, new_height, scale)`; the limiting side determines the
/// scale, which may exceed 1 for small content.
pub fn scaled_dimensions(
    content_width: u32,
    content_height: u32,
    available: u32,
) -> Result<(u32, u32, f64)> {
    if content_width == 0 || content_height == 0 {
        return Err(Error::DegenerateContent {
            width: content_width,
            height: content_height,
        });
    }

    let scale = (available as f64 / content_width as f64)
        .min(available as f64 / content_height as f64);
    let new_width = ((content_width as f64 * scale).round() as u32).clamp(1, available.max(1));
    let new_height = ((content_height as f64 * scale).round() as u32).clamp(1, available.max(1));

    Ok((new_width, new_height, scale))
}

/// Lanczos3 resize of an RGBA buffer. Alpha is premultiplied during
/// convolution so translucent edges do not pick up dark fringes.
pub fn resize_rgba(image: &RgbaImage, target_width: u32, target_height: u32) -> Result<RgbaImage> {
    if image.dimensions() == (target_width, target_height) {
        debug!("Resize skipped, already {}x{}", target_width, target_height);
        return Ok(image.clone());
    }

    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        PixelType::U8x4,
    )?;
    let mut dst_image = Image::new(target_width, target_height, PixelType::U8x4);
    resizer.resize(&src_image, &mut dst_image, &resize_options)?;

    RgbaImage::from_raw(target_width, target_height, dst_image.into_vec()).ok_or_else(|| {
        Error::Processing(format!(
            "resized buffer does not match {}x{}",
            target_width, target_height
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn limiting_side_sets_scale() {
        let (w, h, scale) = scaled_dimensions(600, 500, 471).unwrap();
        assert_eq!(w, 471);
        assert!((scale - 0.785).abs() < 1e-9);
        assert!((392..=393).contains(&h));
    }

    #[test]
    fn small_content_is_upscaled() {
        let (w, h, scale) = scaled_dimensions(10, 20, 100).unwrap();
        assert_eq!((w, h), (50, 100));
        assert!((scale - 5.0).abs() < 1e-9);
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        let (w, h, _) = scaled_dimensions(1, 5000, 100).unwrap();
        assert_eq!((w, h), (1, 100));
    }

    #[test]
    fn degenerate_content_is_rejected() {
        assert!(matches!(
            scaled_dimensions(0, 10, 100),
            Err(Error::DegenerateContent { .. })
        ));
    }

    #[test]
    fn resize_keeps_uniform_opaque_fill() {
        let src = RgbaImage::from_pixel(40, 20, Rgba([200, 100, 50, 255]));
        let out = resize_rgba(&src, 17, 9).unwrap();
        assert_eq!(out.dimensions(), (17, 9));
        assert!(out.pixels().all(|p| p[3] >= 254));
    }
}
