//! High-level, ergonomic library API: run a manifest through a pipeline with
//! backups, slice grid sheets into per-row folders, write non-destructive
//! previews, and check finished assets for clipped edges. Prefer these entry
//! points over the low-level processing modules when integrating sprite-prep.
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::params::{ManifestEntry, PipelineStep, SheetJob, png_filename};
use crate::core::processing::bbox::detect;
use crate::core::processing::cleanup::edge_contacts;
use crate::core::processing::grid::slice;
use crate::core::processing::pipeline::{StepNote, apply_steps};
use crate::error::{Error, Result};
use crate::io::backup::{BackupManager, SnapshotHandle, run_id_now};
use crate::io::writers::png::{ImageSink, write_preview_png};
use crate::io::{decode_rgba, load_rgba};
use crate::types::{BoundingBox, EdgeContacts};

/// Drop `.` components so `"./dog"` and `"dog"` back up to the same place.
fn clean_relative(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn ensure_root(root: &Path) -> Result<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(Error::MissingRoot {
            path: root.to_path_buf(),
        })
    }
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Processed { notes: Vec<StepNote> },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    /// Path relative to the asset root.
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Totals and per-file outcomes of a run. Failed files never abort the run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub run_id: String,
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Processed files that came out blank or otherwise deserve a look.
    pub warnings: usize,
    /// Snapshot directory, if anything was backed up.
    pub backup_dir: Option<PathBuf>,
    /// Files covered by the snapshot.
    pub backed_up: usize,
    pub outcomes: Vec<FileReport>,
}

impl BatchReport {
    fn new(snapshot: &SnapshotHandle) -> Self {
        Self {
            run_id: snapshot.run_id().to_string(),
            ..Self::default()
        }
    }

    fn push(&mut self, path: PathBuf, outcome: FileOutcome) {
        match &outcome {
            FileOutcome::Processed { notes } => {
                self.processed += 1;
                if notes.iter().any(StepNote::is_warning) {
                    self.warnings += 1;
                }
            }
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.errors += 1,
        }
        self.outcomes.push(FileReport { path, outcome });
    }

    fn close(&mut self, snapshot: &SnapshotHandle) {
        self.backed_up = snapshot.recorded_count();
        if snapshot.exists() {
            self.backup_dir = Some(snapshot.dir().to_path_buf());
        }
    }
}

/// Borrowed description of a sheet-slicing run.
#[derive(Debug, Clone, Copy)]
pub struct SliceRequest<'a> {
    /// Folder holding the sheets; relative paths are taken from the asset root.
    pub source_dir: &'a Path,
    /// Output folder relative to the asset root.
    pub output_dir: &'a Path,
    pub column_labels: &'a [String],
    pub inset_px: u32,
    pub sheets: &'a [SheetJob],
    pub cleanup: &'a [PipelineStep],
}

impl SliceRequest<'_> {
    /// Where each sliced cell lands, expressed as a manifest of the output tree.
    pub fn output_manifest(&self) -> Vec<ManifestEntry> {
        let mut manifest = Vec::new();
        for sheet in self.sheets {
            if sheet.cells.is_empty() {
                manifest.extend(sheet.rows.iter().map(|row| ManifestEntry {
                    target_folder: self.output_dir.join(row),
                    expected_filenames: self.column_labels.iter().map(|l| png_filename(l)).collect(),
                }));
            } else {
                manifest.push(ManifestEntry {
                    target_folder: self.output_dir.to_path_buf(),
                    expected_filenames: sheet.cells.iter().map(|c| png_filename(c)).collect(),
                });
            }
        }
        manifest
    }
}

/// Sequential runner that backs up every file before it is overwritten.
pub struct BatchProcessor<S: ImageSink> {
    root: PathBuf,
    backups: BackupManager,
    sink: S,
    /// Pinned snapshot id; otherwise each run takes the time it starts.
    run_id: Option<String>,
}

impl<S: ImageSink> BatchProcessor<S> {
    /// Processor for `root`. Each run is snapshotted under the time it starts.
    pub fn new(root: impl Into<PathBuf>, backups: BackupManager, sink: S) -> Self {
        Self {
            root: root.into(),
            backups,
            sink,
            run_id: None,
        }
    }

    /// Snapshot every run under `run_id` instead of its start time.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    fn begin_snapshot(&self) -> Result<SnapshotHandle> {
        let run_id = self.run_id.clone().unwrap_or_else(run_id_now);
        self.backups.snapshot(&self.root, &run_id)
    }

    /// Rewrite every manifest file in place through `steps`.
    ///
    /// Missing files are skipped, per-file failures are reported and the run
    /// moves on. Only a missing root or an invalid step aborts, and both are
    /// detected before any file is touched.
    pub fn run(&self, manifest: &[ManifestEntry], steps: &[PipelineStep]) -> Result<BatchReport> {
        ensure_root(&self.root)?;
        steps.iter().try_for_each(PipelineStep::validate)?;

        let mut snapshot = self.begin_snapshot()?;
        let mut report = BatchReport::new(&snapshot);
        info!(
            "Batch run {} over {} folder(s) in {}",
            snapshot.run_id(),
            manifest.len(),
            self.root.display()
        );

        for entry in manifest {
            let folder = self.root.join(&entry.target_folder);
            if !folder.is_dir() {
                warn!("Folder not found: {}", entry.target_folder.display());
            }
            for filename in &entry.expected_filenames {
                let relative = clean_relative(&entry.target_folder.join(filename));
                let path = self.root.join(&relative);
                if !path.is_file() {
                    warn!("  {} not found, skipping", relative.display());
                    report.push(
                        relative,
                        FileOutcome::Skipped {
                            reason: "missing".to_string(),
                        },
                    );
                    continue;
                }

                match self.process_file(&mut snapshot, &relative, &path, steps) {
                    Ok(notes) => {
                        info!("  ✓ {}", relative.display());
                        report.push(relative, FileOutcome::Processed { notes });
                    }
                    Err(e) => {
                        warn!("  ✗ {}: {}", relative.display(), e);
                        report.push(
                            relative,
                            FileOutcome::Failed {
                                error: e.to_string(),
                            },
                        );
                    }
                }
            }
        }

        report.close(&snapshot);
        Ok(report)
    }

    fn process_file(
        &self,
        snapshot: &mut SnapshotHandle,
        relative: &Path,
        path: &Path,
        steps: &[PipelineStep],
    ) -> Result<Vec<StepNote>> {
        let bytes = std::fs::read(path)?;
        snapshot.record(relative, &bytes)?;
        let image = decode_rgba(&bytes)?;
        let source_size = image.dimensions();

        let output = apply_steps(image, steps)?;
        for note in &output.notes {
            match note {
                StepNote::FullyTransparent { step } => {
                    warn!("  {} is fully transparent ({})", relative.display(), step)
                }
                StepNote::Recentered { offset } => info!("  moved {}", offset),
                StepNote::Denoised { removed } => info!("  cleared {} stray pixel(s)", removed),
                StepNote::Keyed { pixels } => debug!("  keyed {} background pixel(s)", pixels),
            }
        }

        self.sink.save(&output.image, path)?;
        debug!(
            "  {}x{} -> {}x{}",
            source_size.0,
            source_size.1,
            output.image.width(),
            output.image.height()
        );
        Ok(output.notes)
    }

    /// Cut every sheet into `<output_dir>/<row identity>/<column label>.png`.
    ///
    /// All sheets are checked up front: a missing sheet aborts before anything
    /// is written. Cells whose geometry collapses are reported individually.
    /// Existing outputs are backed up before they are replaced.
    pub fn slice(&self, request: &SliceRequest<'_>) -> Result<BatchReport> {
        ensure_root(&self.root)?;
        request
            .cleanup
            .iter()
            .try_for_each(PipelineStep::validate)?;
        let output_dir = clean_relative(request.output_dir);
        if output_dir.is_absolute()
            || output_dir
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(Error::UnsafePath { path: output_dir });
        }
        if request.column_labels.is_empty() {
            return Err(Error::invalid("column_labels", "<empty>"));
        }
        let cols = request.column_labels.len() as u32;

        let source_dir = self.root.join(request.source_dir);
        for sheet in request.sheets {
            sheet.validate(cols)?;
            let path = source_dir.join(&sheet.file);
            if !path.is_file() {
                return Err(Error::MissingSheet { path });
            }
        }

        let mut snapshot = self.begin_snapshot()?;
        let mut report = BatchReport::new(&snapshot);

        for sheet in request.sheets {
            let sheet_path = source_dir.join(&sheet.file);
            info!("[Sheet] {}", sheet.file);

            let grid = sheet.grid(cols, request.inset_px);
            let cells = load_rgba(&sheet_path).and_then(|(_, img)| {
                info!(
                    "  Image size: {}x{}, Grid: {}x{}, Inset: {}px",
                    img.width(),
                    img.height(),
                    grid.rows,
                    grid.cols,
                    grid.inset_px
                );
                slice(&img, &grid)
            });
            let cells = match cells {
                Ok(cells) => cells,
                Err(e) => {
                    warn!("  ✗ {}: {}", sheet.file, e);
                    report.push(
                        PathBuf::from(&sheet.file),
                        FileOutcome::Failed {
                            error: e.to_string(),
                        },
                    );
                    continue;
                }
            };

            for (index, cell) in cells.into_iter().enumerate() {
                let row = index as u32 / cols;
                let col = index as u32 % cols;
                let Some(name) = sheet.cell_output(row, col, request.column_labels) else {
                    debug!("  cell ({}, {}) has no name, not written", row, col);
                    continue;
                };
                let relative = output_dir.join(name);

                let result = cell.and_then(|cell| {
                    let output = apply_steps(cell.image, request.cleanup)?;
                    let path = self.root.join(&relative);
                    if path.is_file() {
                        let existing = std::fs::read(&path)?;
                        snapshot.record(&relative, &existing)?;
                    }
                    self.sink.save(&output.image, &path)?;
                    info!(
                        "      {}: {}x{}",
                        relative.display(),
                        output.image.width(),
                        output.image.height()
                    );
                    Ok(output.notes)
                });

                match result {
                    Ok(notes) => report.push(relative, FileOutcome::Processed { notes }),
                    Err(e) => {
                        warn!("  ✗ {}: {}", relative.display(), e);
                        report.push(
                            relative,
                            FileOutcome::Failed {
                                error: e.to_string(),
                            },
                        );
                    }
                }
            }
        }

        report.close(&snapshot);
        Ok(report)
    }
}

/// Result of a non-destructive preview.
#[derive(Debug, Clone)]
pub struct Preview {
    pub source: PathBuf,
    pub output: PathBuf,
    pub source_size: (u32, u32),
    pub source_bbox: Option<BoundingBox>,
    pub output_bbox: Option<BoundingBox>,
    pub notes: Vec<StepNote>,
}

/// Run `steps` on `<root>/<item>/<variant>` and write the result to
/// `<root>/_preview_<item>_<variant>.png`. The source file is never modified.
pub fn preview_normalize(
    root: &Path,
    item: &str,
    variant: &str,
    steps: &[PipelineStep],
) -> Result<Preview> {
    ensure_root(root)?;
    let filename = png_filename(variant);
    let source = root.join(item).join(&filename);
    if !source.is_file() {
        return Err(Error::MissingAsset { path: source });
    }

    let (_, image) = load_rgba(&source)?;
    let source_size = image.dimensions();
    let source_bbox = detect(&image);
    let output = apply_steps(image, steps)?;

    let stem = Path::new(&filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.clone());
    let target = root.join(format!("_preview_{}_{}.png", item.replace('/', "_"), stem));
    write_preview_png(&output.image, &target)?;
    info!("Preview saved: {}", target.display());

    Ok(Preview {
        source,
        output: target,
        source_size,
        source_bbox,
        output_bbox: detect(&output.image),
        notes: output.notes,
    })
}

/// Slice one sheet into `<root>/_preview_<sheet stem>/<row>_<label>.png`
/// without touching the real output tree. Returns the written paths.
pub fn preview_slice(
    root: &Path,
    request: &SliceRequest<'_>,
    sheet_file: &str,
) -> Result<Vec<PathBuf>> {
    ensure_root(root)?;
    let sheet = request
        .sheets
        .iter()
        .find(|s| s.file == sheet_file)
        .ok_or_else(|| Error::invalid("sheet", sheet_file))?;
    let sheet_path = root.join(request.source_dir).join(&sheet.file);
    if !sheet_path.is_file() {
        return Err(Error::MissingSheet { path: sheet_path });
    }

    let cols = request.column_labels.len() as u32;
    sheet.validate(cols)?;
    let grid = sheet.grid(cols, request.inset_px);
    let (_, image) = load_rgba(&sheet_path)?;
    let stem = Path::new(&sheet.file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| sheet.file.clone());
    let preview_dir = root.join(format!("_preview_{stem}"));
    std::fs::create_dir_all(&preview_dir)?;

    let mut written = Vec::new();
    for cell in slice(&image, &grid)? {
        match cell {
            Ok(cell) => {
                let Some(name) = sheet.cell_output(cell.plan.row, cell.plan.col, request.column_labels)
                else {
                    continue;
                };
                // flatten `<row>/<label>.png` into `<row>_<label>.png`
                let flat = name
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("_");
                let output = apply_steps(cell.image, request.cleanup)?;
                let target = preview_dir.join(flat);
                write_preview_png(&output.image, &target)?;
                info!("  {}: bounds {}", name.display(), cell.plan.bounds);
                written.push(target);
            }
            Err(e) => warn!("  {}", e),
        }
    }
    Ok(written)
}

/// Files whose content touches an image border, a sign of clipping. Read-only.
pub fn check_edges(root: &Path, manifest: &[ManifestEntry]) -> Result<Vec<(PathBuf, EdgeContacts)>> {
    ensure_root(root)?;
    let mut suspects = Vec::new();
    for entry in manifest {
        for filename in &entry.expected_filenames {
            let relative = clean_relative(&entry.target_folder.join(filename));
            let path = root.join(&relative);
            if !path.is_file() {
                continue;
            }
            match load_rgba(&path) {
                Ok((_, image)) => {
                    let contacts = edge_contacts(&image);
                    if contacts.any() {
                        suspects.push((relative, contacts));
                    }
                }
                Err(e) => warn!("Cannot check {}: {}", relative.display(), e),
            }
        }
    }
    Ok(suspects)
}
