//! Output writers: lossless RGBA PNG through the `ImageSink` seam.
pub mod png;

pub use png::{ImageSink, PngSink};
