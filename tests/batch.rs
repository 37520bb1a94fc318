mod common;

use std::path::Path;

use image::RgbaImage;
use sprite_prep::core::processing::bbox::detect;
use sprite_prep::{
    BackupManager, BatchProcessor, CanvasSpec, Error, FileOutcome, ImageSink, ManifestEntry,
    PipelineStep, PngSink,
};

use common::{open, read, sprite, write_png};

/// Writes like `PngSink` but refuses one filename.
struct FailingSink {
    fail_on: &'static str,
    inner: PngSink,
}

impl ImageSink for FailingSink {
    fn save(&self, image: &RgbaImage, path: &Path) -> sprite_prep::Result<()> {
        if path.file_name().is_some_and(|n| n == self.fail_on) {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        self.inner.save(image, path)
    }
}

fn small_canvas() -> Vec<PipelineStep> {
    vec![PipelineStep::Normalize(CanvasSpec {
        output_size: 64,
        padding_ratio: 0.04,
    })]
}

#[test]
fn one_missing_and_one_failing_file_do_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_png(root, "dog/neutral.png", &sprite(80, 60, 10, 5, 70, 55));
    write_png(root, "dog/sad.png", &sprite(40, 90, 0, 0, 20, 90));
    write_png(root, "dog/excited.png", &sprite(100, 100, 30, 30, 60, 60));
    let sad_before = read(root, "dog/sad.png");

    let manifest = vec![ManifestEntry::with_default_variants("dog")];
    let processor = BatchProcessor::new(
        root,
        BackupManager::default(),
        FailingSink {
            fail_on: "sad.png",
            inner: PngSink::default(),
        },
    )
    .with_run_id("20260101_090000");
    let report = processor.run(&manifest, &small_canvas()).unwrap();

    assert_eq!(
        (report.processed, report.skipped, report.errors),
        (2, 1, 1)
    );
    assert!(matches!(
        report.outcomes[1].outcome,
        FileOutcome::Skipped { .. }
    ));
    assert!(matches!(report.outcomes[2].outcome, FileOutcome::Failed { .. }));

    assert_eq!(open(root, "dog/neutral.png").dimensions(), (64, 64));
    assert_eq!(open(root, "dog/excited.png").dimensions(), (64, 64));
    assert_eq!(read(root, "dog/sad.png"), sad_before);

    let snapshot = root.join("_backup_originals/20260101_090000/dog");
    assert_eq!(std::fs::read(snapshot.join("sad.png")).unwrap(), sad_before);
    assert!(snapshot.join("neutral.png").is_file());
    assert!(!snapshot.join("happy.png").exists());
    assert_eq!(
        report.backup_dir.as_deref(),
        Some(root.join("_backup_originals/20260101_090000").as_path())
    );
}

#[test]
fn normalized_files_are_centered() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_png(root, "cat/happy.png", &sprite(200, 120, 150, 0, 200, 40));

    let manifest = vec![ManifestEntry::new("./cat", &["happy.png"])];
    let processor = BatchProcessor::new(root, BackupManager::default(), PngSink::default());
    let report = processor.run(&manifest, &small_canvas()).unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.outcomes[0].path, Path::new("cat/happy.png"));

    let out = open(root, "cat/happy.png");
    let (cx, cy) = detect(&out).unwrap().center();
    assert!((cx - 32.0).abs() <= 1.0, "cx={cx}");
    assert!((cy - 32.0).abs() <= 1.0, "cy={cy}");
}

#[test]
fn transparent_file_is_processed_with_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_png(root, "ghost/neutral.png", &RgbaImage::new(30, 30));

    let manifest = vec![ManifestEntry::new("ghost", &["neutral.png"])];
    let processor = BatchProcessor::new(root, BackupManager::default(), PngSink::default());
    let report = processor.run(&manifest, &small_canvas()).unwrap();

    assert_eq!((report.processed, report.warnings, report.errors), (1, 1, 0));
    let out = open(root, "ghost/neutral.png");
    assert_eq!(out.dimensions(), (64, 64));
    assert!(out.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn corrupt_file_is_reported_and_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("dog")).unwrap();
    std::fs::write(root.join("dog/neutral.png"), b"not a png").unwrap();
    write_png(root, "dog/happy.png", &sprite(10, 10, 2, 2, 8, 8));

    let manifest = vec![ManifestEntry::new("dog", &["neutral.png", "happy.png"])];
    let processor = BatchProcessor::new(root, BackupManager::default(), PngSink::default());
    let report = processor.run(&manifest, &small_canvas()).unwrap();

    assert_eq!((report.processed, report.errors), (1, 1));
    assert_eq!(read(root, "dog/neutral.png"), b"not a png");
}

#[test]
fn missing_root_aborts_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nope");
    let processor = BatchProcessor::new(&root, BackupManager::default(), PngSink::default());
    let err = processor
        .run(&[ManifestEntry::with_default_variants("dog")], &small_canvas())
        .unwrap_err();
    assert!(matches!(err, Error::MissingRoot { .. }));
    assert!(!root.exists());
}

#[test]
fn invalid_step_aborts_before_any_backup() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_png(root, "dog/neutral.png", &sprite(10, 10, 2, 2, 8, 8));
    let before = read(root, "dog/neutral.png");

    let steps = vec![PipelineStep::Normalize(CanvasSpec {
        output_size: 0,
        padding_ratio: 0.04,
    })];
    let processor = BatchProcessor::new(root, BackupManager::default(), PngSink::default());
    let err = processor
        .run(&[ManifestEntry::new("dog", &["neutral.png"])], &steps)
        .unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert_eq!(read(root, "dog/neutral.png"), before);
    assert!(!root.join("_backup_originals").exists());
}

#[test]
fn snapshot_id_is_taken_when_the_run_starts() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_png(root, "dog/neutral.png", &sprite(10, 10, 2, 2, 8, 8));

    let processor = BatchProcessor::new(root, BackupManager::default(), PngSink::default());
    assert!(processor.run_id().is_none());
    let built_at = sprite_prep::io::backup::run_id_now();
    std::thread::sleep(std::time::Duration::from_millis(1100));

    let report = processor
        .run(&[ManifestEntry::new("dog", &["neutral.png"])], &small_canvas())
        .unwrap();
    assert!(report.run_id > built_at, "{} <= {}", report.run_id, built_at);
    assert_eq!(report.backed_up, 1);
    assert_eq!(
        report.backup_dir,
        Some(root.join("_backup_originals").join(&report.run_id))
    );
}
