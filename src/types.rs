//! Shared types used across sprite-prep.
//! Includes `BoundingBox`, `CanvasSpec`, grid geometry (`GridSpec`,
//! `CellAdjustment`, `AdjustmentTable`), `DenoiseParams` and edge-contact flags.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Half-open pixel rectangle `[left, right) x [top, bottom)`.
///
/// Constructed only through [`BoundingBox::new`], which rejects empty boxes, so
/// every value in circulation has a positive width and height.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Option<Self> {
        if right > left && bottom > top {
            Some(Self {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Geometric center in continuous pixel coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.left as f64 + self.right as f64) / 2.0,
            (self.top as f64 + self.bottom as f64) / 2.0,
        )
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right <= width && self.bottom <= height
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}) - ({}, {}) [{}x{}]",
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.width(),
            self.height()
        )
    }
}

/// Square output canvas with a margin reserved on every side.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSpec {
    pub output_size: u32,
    /// Fraction of `output_size` left empty on each side.
    pub padding_ratio: f64,
}

impl Default for CanvasSpec {
    fn default() -> Self {
        Self {
            output_size: 512,
            padding_ratio: 0.04,
        }
    }
}

impl CanvasSpec {
    pub fn validate(&self) -> Result<()> {
        if self.output_size == 0 {
            return Err(Error::invalid("output_size", self.output_size));
        }
        if !(0.0..0.5).contains(&self.padding_ratio) {
            return Err(Error::invalid("padding_ratio", self.padding_ratio));
        }
        Ok(())
    }

    /// Side length of the usable square: `floor(output_size * (1 - 2 * padding_ratio))`.
    pub fn available(&self) -> u32 {
        let available = (self.output_size as f64 * (1.0 - 2.0 * self.padding_ratio)).floor();
        (available as u32).clamp(1, self.output_size)
    }
}

/// Per-cell manual correction applied after the uniform inset.
///
/// Positive values shrink the cell inward on that side, negative values expand it.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CellAdjustment {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CellAdjustment {
    pub fn uniform(px: i32) -> Self {
        Self {
            left: px,
            top: px,
            right: px,
            bottom: px,
        }
    }
}

/// Serialized form of one adjustment table row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdjustmentEntry {
    pub identity: String,
    pub column: u32,
    #[serde(flatten)]
    pub delta: CellAdjustment,
}

/// Lookup of `(cell identity, column)` to its manual adjustment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<AdjustmentEntry>", into = "Vec<AdjustmentEntry>")]
pub struct AdjustmentTable {
    entries: HashMap<(String, u32), CellAdjustment>,
}

impl AdjustmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identity: impl Into<String>, column: u32, delta: CellAdjustment) {
        self.entries.insert((identity.into(), column), delta);
    }

    pub fn with(mut self, identity: impl Into<String>, column: u32, delta: CellAdjustment) -> Self {
        self.insert(identity, column, delta);
        self
    }

    pub fn get(&self, identity: &str, column: u32) -> Option<&CellAdjustment> {
        self.entries.get(&(identity.to_string(), column))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<AdjustmentEntry>> for AdjustmentTable {
    fn from(rows: Vec<AdjustmentEntry>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.insert(row.identity, row.column, row.delta);
        }
        table
    }
}

impl From<AdjustmentTable> for Vec<AdjustmentEntry> {
    fn from(table: AdjustmentTable) -> Self {
        let mut rows: Vec<AdjustmentEntry> = table
            .entries
            .into_iter()
            .map(|((identity, column), delta)| AdjustmentEntry {
                identity,
                column,
                delta,
            })
            .collect();
        rows.sort_by(|a, b| (&a.identity, a.column).cmp(&(&b.identity, b.column)));
        rows
    }
}

/// Rows x cols grid with a uniform inset and optional per-cell corrections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
    #[serde(default)]
    pub inset_px: u32,
    /// Caller-defined identity per row, used to key adjustments. Rows beyond the
    /// list are identified by their index.
    #[serde(default)]
    pub row_identities: Vec<String>,
    #[serde(default)]
    pub adjustments: AdjustmentTable,
}

impl GridSpec {
    pub fn new(rows: u32, cols: u32, inset_px: u32) -> Self {
        Self {
            rows,
            cols,
            inset_px,
            row_identities: Vec::new(),
            adjustments: AdjustmentTable::new(),
        }
    }

    pub fn row_identity(&self, row: u32) -> String {
        self.row_identities
            .get(row as usize)
            .cloned()
            .unwrap_or_else(|| row.to_string())
    }
}

/// Tunables for the isolated-pixel filter.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseParams {
    /// Fraction of the image height, measured from the bottom edge, that is inspected.
    pub band_fraction: f64,
    /// Radius of the square neighbor window.
    pub neighbor_window: u32,
    /// Minimum opaque pixels (the pixel itself included) required to survive.
    pub neighbor_threshold: u32,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            band_fraction: 0.15,
            neighbor_window: 8,
            neighbor_threshold: 80,
        }
    }
}

impl DenoiseParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.band_fraction) {
            return Err(Error::invalid("band_fraction", self.band_fraction));
        }
        Ok(())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Top => write!(f, "top"),
            Edge::Bottom => write!(f, "bottom"),
            Edge::Left => write!(f, "left"),
            Edge::Right => write!(f, "right"),
        }
    }
}

/// Image borders touched by at least one opaque pixel.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct EdgeContacts {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl EdgeContacts {
    pub fn any(&self) -> bool {
        self.top || self.bottom || self.left || self.right
    }

    pub fn edges(&self) -> Vec<Edge> {
        [
            (self.bottom, Edge::Bottom),
            (self.left, Edge::Left),
            (self.right, Edge::Right),
            (self.top, Edge::Top),
        ]
        .into_iter()
        .filter_map(|(hit, edge)| hit.then_some(edge))
        .collect()
    }
}
