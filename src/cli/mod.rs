//! Command Line Interface (CLI) layer for sprite-prep.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for preview, run, restore and
//! inspection modes. It wires the job file and flags to the library
//! functionality exposed via `sprite_prep::api`.
//!
//! If you are embedding sprite-prep into another application, prefer using
//! the high-level `sprite_prep::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
