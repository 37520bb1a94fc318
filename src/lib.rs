#![doc = r#"
sprite-prep: content-aware normalization and reversible batch editing for sprite assets.

This crate turns loosely framed character art (transparent PNGs of uneven size and
placement) into consistent, centered, fixed-size assets. It detects the visible content
of every image through its alpha channel, scales and centers it on a padded square
canvas, cuts multi-character grid sheets into per-cell images, clears stray specks near
the bottom edge, and snapshots every file before it is overwritten so a whole run can be
rolled back. It powers the `sprite-prep` CLI and can be embedded in your own tools.

Quick start: normalize a manifest in place
------------------------------------------
```rust,no_run
use std::path::Path;
use sprite_prep::{BackupManager, BatchProcessor, ManifestEntry, PipelineStep, PngSink};
use sprite_prep::types::CanvasSpec;

fn main() -> sprite_prep::Result<()> {
    let manifest = vec![
        ManifestEntry::with_default_variants("dog_01_shiba"),
        ManifestEntry::new("dog_02_pug", &["neutral.png", "happy.png"]),
    ];
    let steps = vec![PipelineStep::Normalize(CanvasSpec::default())];

    let processor = BatchProcessor::new(
        Path::new("/assets/characters"),
        BackupManager::default(),
        PngSink::default(),
    );
    let report = processor.run(&manifest, &steps)?;

    println!(
        "processed={} skipped={} errors={} warnings={}",
        report.processed, report.skipped, report.errors, report.warnings
    );
    Ok(())
}
```

Work on a single image in memory
--------------------------------
```rust
use image::{Rgba, RgbaImage};
use sprite_prep::core::processing::{bbox, normalize};
use sprite_prep::types::CanvasSpec;

fn main() -> sprite_prep::Result<()> {
    let mut img = RgbaImage::new(300, 200);
    for y in 20..120 {
        for x in 40..90 {
            img.put_pixel(x, y, Rgba([200, 120, 40, 255]));
        }
    }

    assert_eq!(bbox::detect(&img).map(|b| (b.width(), b.height())), Some((50, 100)));

    let out = normalize::normalize(&img, &CanvasSpec::default())?;
    assert_eq!(out.image.dimensions(), (512, 512));
    Ok(())
}
```

Undo a run
----------
```rust,no_run
use std::path::Path;
use sprite_prep::BackupManager;

fn main() -> sprite_prep::Result<()> {
    let root = Path::new("/assets/characters");
    let backups = BackupManager::default();
    if let Some(latest) = backups.list_snapshots(root)?.first() {
        let report = backups.restore(root, latest)?;
        println!("restored {} file(s)", report.restored.len());
    }
    Ok(())
}
```

Error handling
--------------
All public functions return `sprite_prep::Result<T>`. Run-level problems (missing asset
root, missing sheet, missing snapshot) abort before anything is written; per-file
problems are collected in the [`BatchReport`] and never stop a batch.

Useful modules
--------------
- [`api`]: batch runs, sheet slicing, previews and the edge check.
- [`core`]: job configuration and the in-memory processing steps.
- [`io`]: decoding, PNG writers and the backup manager.
- [`types`]: geometry and parameter types (`BoundingBox`, `CanvasSpec`, `GridSpec`, ...).
- [`error`]: crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
pub use core::params::{Job, JobConfig, ManifestEntry, PipelineStep, SheetJob};
pub use error::{Error, Result};
pub use types::{
    AdjustmentTable, BoundingBox, CanvasSpec, CellAdjustment, DenoiseParams, Edge,
    EdgeContacts, GridSpec,
};

pub use io::backup::{BackupManager, RestoreReport, SnapshotHandle};
pub use io::writers::png::{ImageSink, PngSink};

pub use api::{
    BatchProcessor, BatchReport, FileOutcome, FileReport, Preview, SliceRequest, check_edges,
    preview_normalize, preview_slice,
};
