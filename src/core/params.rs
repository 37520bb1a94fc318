use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{AdjustmentTable, CanvasSpec, DenoiseParams, GridSpec};

pub const DEFAULT_BACKUP_DIR: &str = "_backup_originals";
pub const DEFAULT_VARIANTS: [&str; 4] = ["neutral", "happy", "sad", "excited"];

fn default_backup_dir() -> String {
    DEFAULT_BACKUP_DIR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_filenames() -> Vec<String> {
    DEFAULT_VARIANTS.iter().map(|v| format!("{v}.png")).collect()
}

fn default_column_labels() -> Vec<String> {
    DEFAULT_VARIANTS.iter().map(|v| v.to_string()).collect()
}

fn default_key_threshold() -> u8 {
    30
}

fn default_steps() -> Vec<PipelineStep> {
    vec![PipelineStep::Normalize(CanvasSpec::default())]
}

/// One folder of a normalize run and the files it must contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Folder relative to the asset root.
    pub target_folder: PathBuf,
    #[serde(default = "default_filenames")]
    pub expected_filenames: Vec<String>,
}

impl ManifestEntry {
    pub fn new(target_folder: impl Into<PathBuf>, expected: &[&str]) -> Self {
        Self {
            target_folder: target_folder.into(),
            expected_filenames: expected.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Folder holding the default `neutral/happy/sad/excited` variants.
    pub fn with_default_variants(target_folder: impl Into<PathBuf>) -> Self {
        Self {
            target_folder: target_folder.into(),
            expected_filenames: default_filenames(),
        }
    }
}

/// A single in-memory image transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PipelineStep {
    /// Clear isolated opaque specks near the bottom edge.
    Denoise(DenoiseParams),
    /// Crop, scale and center onto a padded square canvas.
    Normalize(CanvasSpec),
    /// Center content inside the current canvas without resizing.
    Recenter,
    /// Key out near-black background pixels.
    KeyBackground {
        #[serde(default = "default_key_threshold")]
        threshold: u8,
    },
    /// Crop to content plus a margin.
    TrimToContent {
        #[serde(default)]
        padding: u32,
    },
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStep::Denoise(_) => write!(f, "denoise"),
            PipelineStep::Normalize(c) => {
                write!(f, "normalize({}px, pad {})", c.output_size, c.padding_ratio)
            }
            PipelineStep::Recenter => write!(f, "recenter"),
            PipelineStep::KeyBackground { threshold } => write!(f, "key_background({threshold})"),
            PipelineStep::TrimToContent { padding } => write!(f, "trim_to_content({padding})"),
        }
    }
}

impl PipelineStep {
    pub fn validate(&self) -> Result<()> {
        match self {
            PipelineStep::Denoise(p) => p.validate(),
            PipelineStep::Normalize(c) => c.validate(),
            _ => Ok(()),
        }
    }
}

/// `name` with a `.png` extension unless it already carries one.
pub fn png_filename(name: &str) -> String {
    if Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{name}.png")
    }
}

/// One grid sheet of a slice run.
///
/// Cells are written to `<row>/<column label>.png` by default. A sheet of
/// distinct items (icons, outfits) lists `cells` instead: one name per cell in
/// row-major order, each written flat as `<name>.png`. Cells past the end of
/// the list are not written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetJob {
    /// Sheet filename inside the slice job's `source_dir`.
    pub file: String,
    /// Identity of each grid row, top to bottom. Names the output folder and
    /// keys adjustments. May be left empty when `cells` is given.
    #[serde(default)]
    pub rows: Vec<String>,
    /// Row-major per-cell output names.
    #[serde(default)]
    pub cells: Vec<String>,
    #[serde(default)]
    pub adjustments: AdjustmentTable,
}

impl SheetJob {
    /// Grid rows: one per listed row, or enough to hold every named cell.
    pub fn row_count(&self, cols: u32) -> u32 {
        if !self.rows.is_empty() || cols == 0 {
            self.rows.len() as u32
        } else {
            (self.cells.len() as u32).div_ceil(cols)
        }
    }

    pub fn grid(&self, cols: u32, inset_px: u32) -> GridSpec {
        GridSpec {
            rows: self.row_count(cols),
            cols,
            inset_px,
            row_identities: self.rows.clone(),
            adjustments: self.adjustments.clone(),
        }
    }

    pub fn validate(&self, cols: u32) -> Result<()> {
        if self.rows.is_empty() && self.cells.is_empty() {
            return Err(Error::invalid("rows", format!("{} has no rows", self.file)));
        }
        let capacity = self.row_count(cols) as usize * cols as usize;
        if self.cells.len() > capacity {
            return Err(Error::invalid(
                "cells",
                format!("{} names {} cells, grid holds {}", self.file, self.cells.len(), capacity),
            ));
        }
        for name in &self.cells {
            let path = Path::new(name);
            if name.is_empty() || !path.components().all(|c| matches!(c, Component::Normal(_))) {
                return Err(Error::UnsafePath {
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }

    /// Output path of cell `(row, col)` relative to the job's output folder, or
    /// `None` when a named sheet has no name for it.
    pub fn cell_output(&self, row: u32, col: u32, column_labels: &[String]) -> Option<PathBuf> {
        if self.cells.is_empty() {
            let label = column_labels.get(col as usize)?;
            let identity = self
                .rows
                .get(row as usize)
                .cloned()
                .unwrap_or_else(|| row.to_string());
            Some(PathBuf::from(identity).join(png_filename(label)))
        } else {
            let index = row as usize * column_labels.len() + col as usize;
            self.cells.get(index).map(|name| PathBuf::from(png_filename(name)))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    /// Rewrite manifest files in place through `steps`.
    Normalize {
        manifest: Vec<ManifestEntry>,
        #[serde(default = "default_steps")]
        steps: Vec<PipelineStep>,
    },
    /// Cut grid sheets into `<output_dir>/<row>/<column label>.png`.
    Slice {
        #[serde(default)]
        source_dir: PathBuf,
        #[serde(default)]
        output_dir: PathBuf,
        #[serde(default = "default_column_labels")]
        column_labels: Vec<String>,
        #[serde(default)]
        inset_px: u32,
        sheets: Vec<SheetJob>,
        /// Applied to every cell after slicing, in order.
        #[serde(default)]
        cleanup: Vec<PipelineStep>,
    },
}

/// Job file: where the assets live and what to do with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Asset root. Relative paths are resolved against the job file's folder.
    pub root: PathBuf,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
    /// Best-compression PNG output (still lossless).
    #[serde(default = "default_true")]
    pub optimize_png: bool,
    pub job: Job,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            backup_dir: default_backup_dir(),
            optimize_png: true,
            job: Job::Normalize {
                manifest: Vec::new(),
                steps: default_steps(),
            },
        }
    }
}

impl JobConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config: JobConfig = serde_json::from_str(&text)?;
        if config.root.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.root = base.join(&config.root);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backup_dir.is_empty() {
            return Err(Error::invalid("backup_dir", "<empty>"));
        }
        match &self.job {
            Job::Normalize { steps, .. } => steps.iter().try_for_each(PipelineStep::validate),
            Job::Slice {
                column_labels,
                sheets,
                cleanup,
                ..
            } => {
                if column_labels.is_empty() {
                    return Err(Error::invalid("column_labels", "<empty>"));
                }
                let cols = column_labels.len() as u32;
                sheets.iter().try_for_each(|s| s.validate(cols))?;
                cleanup.iter().try_for_each(PipelineStep::validate)
            }
        }
    }
}
