use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sprite-prep",
    version,
    about = "Normalize, slice and clean sprite assets with timestamped backups"
)]
pub struct CliArgs {
    /// JSON job file describing the asset root and the work to do
    #[arg(short, long, default_value = "sprite-prep.json")]
    pub config: PathBuf,

    /// Preview one item without modifying anything: a manifest folder and
    /// optional variant (normalize jobs) or a sheet filename (slice jobs)
    #[arg(long, num_args = 1..=2, value_names = ["ITEM", "VARIANT"])]
    pub preview: Option<Vec<String>>,

    /// Process every file of the job without asking for confirmation
    #[arg(long, default_value_t = false)]
    pub run: bool,

    /// Restore the snapshot with this id (YYYYMMDD_HHMMSS)
    #[arg(long, value_name = "TIMESTAMP")]
    pub restore: Option<String>,

    /// List available snapshots, newest first
    #[arg(long, default_value_t = false)]
    pub list_backups: bool,

    /// Report assets whose content touches an image border
    #[arg(long, default_value_t = false)]
    pub check_edges: bool,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
