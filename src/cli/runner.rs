use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sprite_prep::api::{
    BatchProcessor, BatchReport, FileOutcome, SliceRequest, check_edges, preview_normalize,
    preview_slice,
};
use sprite_prep::core::params::{DEFAULT_VARIANTS, Job, JobConfig, ManifestEntry};
use sprite_prep::{BackupManager, PngSink};

use super::args::CliArgs;
use super::errors::AppError;

enum Mode {
    Preview(Vec<String>),
    Run { confirmed: bool },
    Restore(String),
    ListBackups,
    CheckEdges,
}

fn select_mode(args: &CliArgs) -> Result<Mode, AppError> {
    let chosen = [
        args.preview.is_some(),
        args.run,
        args.restore.is_some(),
        args.list_backups,
        args.check_edges,
    ]
    .iter()
    .filter(|flag| **flag)
    .count();
    if chosen > 1 {
        return Err(AppError::ConflictingModes);
    }

    Ok(if let Some(item) = &args.preview {
        Mode::Preview(item.clone())
    } else if let Some(run_id) = &args.restore {
        Mode::Restore(run_id.clone())
    } else if args.list_backups {
        Mode::ListBackups
    } else if args.check_edges {
        Mode::CheckEdges
    } else {
        Mode::Run {
            confirmed: args.run,
        }
    })
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "sprite_prep=debug"
    } else {
        "sprite_prep=info"
    };
    let filter = if verbose {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn job_kind(job: &Job) -> &'static str {
    match job {
        Job::Normalize { .. } => "normalize",
        Job::Slice { .. } => "slice",
    }
}

fn confirm(prompt: &str) -> Result<bool, AppError> {
    print!("{prompt} (y/N) ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn print_summary(report: &BatchReport) {
    for outcome in &report.outcomes {
        match &outcome.outcome {
            FileOutcome::Processed { notes } if !notes.is_empty() => {
                let notes: Vec<String> = notes
                    .iter()
                    .map(|n| serde_json::to_string(n).unwrap_or_else(|_| format!("{n:?}")))
                    .collect();
                println!("  ✓ {}  {}", outcome.path.display(), notes.join(" "));
            }
            FileOutcome::Processed { .. } => println!("  ✓ {}", outcome.path.display()),
            FileOutcome::Skipped { reason } => {
                println!("  - {} ({})", outcome.path.display(), reason)
            }
            FileOutcome::Failed { error } => println!("  ✗ {}: {}", outcome.path.display(), error),
        }
    }
    println!();
    println!("Run {} complete", report.run_id);
    println!("  Processed: {}", report.processed);
    println!("  Skipped:   {}", report.skipped);
    println!("  Errors:    {}", report.errors);
    println!("  Warnings:  {}", report.warnings);
    if let Some(dir) = &report.backup_dir {
        println!(
            "Originals backed up to: {} ({} file(s))",
            dir.display(),
            report.backed_up
        );
        println!(
            "Undo with: sprite-prep --restore {}",
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| report.run_id.clone())
        );
    }
}

fn default_variant(manifest: &[ManifestEntry], item: &str) -> String {
    manifest
        .iter()
        .find(|e| e.target_folder == Path::new(item))
        .and_then(|e| e.expected_filenames.first().cloned())
        .unwrap_or_else(|| DEFAULT_VARIANTS[0].to_string())
}

fn preview(config: &JobConfig, item: &[String]) -> Result<(), AppError> {
    let root = &config.root;
    match &config.job {
        Job::Normalize { manifest, steps } => {
            let name = &item[0];
            let variant = item
                .get(1)
                .cloned()
                .unwrap_or_else(|| default_variant(manifest, name));
            let preview = preview_normalize(root, name, &variant, steps)?;

            println!("Source: {}", preview.source.display());
            println!(
                "  Size: {}x{}",
                preview.source_size.0, preview.source_size.1
            );
            match preview.source_bbox {
                Some(bbox) => println!("  Content: {bbox}"),
                None => println!("  Content: none (fully transparent)"),
            }
            if let Some(bbox) = preview.output_bbox {
                println!("  Placed:  {bbox}");
            }
            println!("Preview saved: {}", preview.output.display());
        }
        Job::Slice {
            source_dir,
            output_dir,
            column_labels,
            inset_px,
            sheets,
            cleanup,
        } => {
            let request = SliceRequest {
                source_dir,
                output_dir,
                column_labels,
                inset_px: *inset_px,
                sheets,
                cleanup,
            };
            let written = preview_slice(root, &request, &item[0])?;
            println!("Wrote {} preview cell(s)", written.len());
            if let Some(dir) = written.first().and_then(|p| p.parent()) {
                println!("Preview folder: {}", dir.display());
            }
        }
    }
    Ok(())
}

fn run_job(config: &JobConfig, confirmed: bool) -> Result<(), AppError> {
    let backups = BackupManager::new(config.backup_dir.clone());
    let processor = BatchProcessor::new(
        config.root.clone(),
        backups,
        PngSink {
            optimize: config.optimize_png,
        },
    );

    let (what, count) = match &config.job {
        Job::Normalize { manifest, .. } => (
            "file(s)",
            manifest
                .iter()
                .map(|e| e.expected_filenames.len())
                .sum::<usize>(),
        ),
        Job::Slice { sheets, .. } => ("sheet(s)", sheets.len()),
    };
    println!(
        "{} job: {} {} under {}",
        job_kind(&config.job),
        count,
        what,
        config.root.display()
    );
    println!(
        "Originals will be backed up under {}",
        config.root.join(&config.backup_dir).display()
    );

    if !confirmed && !confirm("Continue?")? {
        println!("Aborted.");
        return Ok(());
    }

    let report = match &config.job {
        Job::Normalize { manifest, steps } => processor.run(manifest, steps)?,
        Job::Slice {
            source_dir,
            output_dir,
            column_labels,
            inset_px,
            sheets,
            cleanup,
        } => processor.slice(&SliceRequest {
            source_dir,
            output_dir,
            column_labels,
            inset_px: *inset_px,
            sheets,
            cleanup,
        })?,
    };
    if report.errors > 0 {
        warn!("{} file(s) failed, see above", report.errors);
    }
    print_summary(&report);
    Ok(())
}

fn edge_manifest(job: &Job) -> Vec<ManifestEntry> {
    match job {
        Job::Normalize { manifest, .. } => manifest.clone(),
        Job::Slice {
            source_dir,
            output_dir,
            column_labels,
            inset_px,
            sheets,
            cleanup,
        } => SliceRequest {
            source_dir,
            output_dir,
            column_labels,
            inset_px: *inset_px,
            sheets,
            cleanup,
        }
        .output_manifest(),
    }
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);

    let mode = select_mode(&args)?;
    let config = JobConfig::from_path(&args.config).map_err(AppError::from)?;
    info!(
        "Loaded {} job from {}",
        job_kind(&config.job),
        args.config.display()
    );

    match mode {
        Mode::Preview(item) => preview(&config, &item)?,
        Mode::Run { confirmed } => run_job(&config, confirmed)?,
        Mode::Restore(run_id) => {
            let backups = BackupManager::new(config.backup_dir.clone());
            let report = backups.restore(&config.root, &run_id).map_err(AppError::from)?;
            println!(
                "Restored {} file(s) from {}",
                report.restored.len(),
                report.run_id
            );
        }
        Mode::ListBackups => {
            let backups = BackupManager::new(config.backup_dir.clone());
            let ids = backups
                .list_snapshots(&config.root)
                .map_err(AppError::from)?;
            if ids.is_empty() {
                println!("No backups under {}", backups.backups_root(&config.root).display());
            }
            for id in ids {
                println!("{id}");
            }
        }
        Mode::CheckEdges => {
            let suspects: Vec<(PathBuf, _)> =
                check_edges(&config.root, &edge_manifest(&config.job)).map_err(AppError::from)?;
            if suspects.is_empty() {
                println!("No content touches an image border.");
            }
            for (path, contacts) in &suspects {
                let edges: Vec<String> = contacts.edges().iter().map(|e| e.to_string()).collect();
                println!("{}: {}", path.display(), edges.join(", "));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn preview_takes_item_and_optional_variant() {
        let args = CliArgs::parse_from(["sprite-prep", "--preview", "dog_01_shiba", "happy"]);
        match select_mode(&args).unwrap() {
            Mode::Preview(item) => assert_eq!(item, vec!["dog_01_shiba", "happy"]),
            _ => panic!("expected preview mode"),
        }
    }

    #[test]
    fn no_flags_means_interactive_run() {
        let args = CliArgs::parse_from(["sprite-prep"]);
        assert!(matches!(
            select_mode(&args).unwrap(),
            Mode::Run { confirmed: false }
        ));
        assert_eq!(args.config, PathBuf::from("sprite-prep.json"));
    }

    #[test]
    fn preview_without_item_is_rejected_by_the_parser() {
        assert!(CliArgs::try_parse_from(["sprite-prep", "--preview"]).is_err());
        assert!(CliArgs::try_parse_from(["sprite-prep", "--preview", "a", "b", "c"]).is_err());
    }

    #[test]
    fn modes_are_exclusive() {
        let args = CliArgs::parse_from(["sprite-prep", "--run", "--list-backups"]);
        assert!(matches!(
            select_mode(&args),
            Err(AppError::ConflictingModes)
        ));
    }

    #[test]
    fn default_variant_prefers_manifest_order() {
        let manifest = vec![ManifestEntry::new("paws", &["left.png", "right.png"])];
        assert_eq!(default_variant(&manifest, "paws"), "left.png");
        assert_eq!(default_variant(&manifest, "other"), "neutral");
    }
}
