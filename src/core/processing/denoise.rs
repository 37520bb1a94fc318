//! Isolated-pixel filter for stray opaque specks left along the bottom edge by
//! upstream background removal.
use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::error::Result;
use crate::types::DenoiseParams;

/// Summed-area table over the opaque mask, `(width + 1) x (height + 1)`.
struct OpaqueCounts {
    stride: usize,
    sums: Vec<u64>,
}

impl OpaqueCounts {
    fn new(image: &RgbaImage) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let stride = width + 1;
        let mut sums = vec![0u64; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0u64;
            for x in 0..width {
                row_sum += u64::from(image.get_pixel(x as u32, y as u32)[3] > 0);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, sums }
    }

    /// Opaque pixels in the inclusive rectangle `[x0, x1] x [y0, y1]`.
    fn count(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> u64 {
        let s = |x: usize, y: usize| self.sums[y * self.stride + x];
        s(x1 + 1, y1 + 1) + s(x0, y0) - s(x0, y1 + 1) - s(x1 + 1, y0)
    }
}

/// Clear opaque pixels in the bottom band whose neighborhood is too sparse.
///
/// Neighbor counts are taken from the unmodified input, so the result does not
/// depend on visiting order. Returns the cleaned copy and the number of pixels
/// cleared.
pub fn clean(image: &RgbaImage, params: &DenoiseParams) -> Result<(RgbaImage, usize)> {
    params.validate()?;
    let (width, height) = image.dimensions();
    let band_start = (height as f64 * (1.0 - params.band_fraction)).floor() as u32;
    let band_start = band_start.min(height);

    let counts = OpaqueCounts::new(image);
    let mut output = image.clone();
    let radius = params.neighbor_window as usize;
    let (max_x, max_y) = (width as usize, height as usize);
    let mut removed = 0usize;

    for y in band_start..height {
        for x in 0..width {
            if image.get_pixel(x, y)[3] == 0 {
                continue;
            }
            let (xu, yu) = (x as usize, y as usize);
            let neighbors = counts.count(
                xu.saturating_sub(radius),
                yu.saturating_sub(radius),
                (xu + radius).min(max_x - 1),
                (yu + radius).min(max_y - 1),
            );
            if neighbors < u64::from(params.neighbor_threshold) {
                output.put_pixel(x, y, Rgba([0, 0, 0, 0]));
                removed += 1;
            }
        }
    }

    debug!(
        "Denoise band rows {}..{}: cleared {} pixel(s)",
        band_start, height, removed
    );
    Ok((output, removed))
}
