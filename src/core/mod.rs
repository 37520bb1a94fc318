//! Core processing building blocks: bounding-box detection, resize/padding,
//! normalization, grid slicing, denoise and cleanup, plus the step pipeline
//! that chains them. These are internal primitives consumed by the high-level
//! `api` module.
pub mod params;
pub mod processing;
