//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, image codec, resize and config errors, and provides
//! semantic variants for run-level aborts (missing root, missing sheet, missing
//! snapshot) and per-cell geometry failures.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Resize buffer error: {0}")]
    ResizeBuffer(#[from] fast_image_resize::ImageBufferError),

    #[error("Resize error: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Asset root does not exist: {path}")]
    MissingRoot { path: PathBuf },

    #[error("Image not found: {path}")]
    MissingAsset { path: PathBuf },

    #[error("Source sheet does not exist: {path}")]
    MissingSheet { path: PathBuf },

    #[error("Backup snapshot {run_id} not found at {path}")]
    MissingSnapshot { run_id: String, path: PathBuf },

    #[error(
        "Cell ({row}, {col}) collapses to an empty region: ({left}, {top}) - ({right}, {bottom})"
    )]
    InvalidGridGeometry {
        row: u32,
        col: u32,
        left: i64,
        top: i64,
        right: i64,
        bottom: i64,
    },

    #[error("Content region is degenerate: {width}x{height}")]
    DegenerateContent { width: u32, height: u32 },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Refusing path outside the asset root: {path}")]
    UnsafePath { path: PathBuf },

    #[error("Processing error: {0}")]
    Processing(String),
}

impl Error {
    pub fn invalid<V: std::fmt::Display>(arg: &'static str, value: V) -> Self {
        Error::InvalidArgument {
            arg,
            value: value.to_string(),
        }
    }
}
