//! sprite-prep CLI entrypoint.
//!
//! Provides a thin wrapper over the `cli` module: parse args, load the job
//! file, dispatch to preview, run, restore or inspection modes, and exit with
//! appropriate status. For programmatic use, prefer the library API
//! (`sprite_prep::api`).

use clap::Parser;

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();
    cli::run(args)
}
