use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Only one of --preview, --run, --restore, --list-backups, --check-edges may be given")]
    ConflictingModes,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Library(#[from] sprite_prep::Error),
}
