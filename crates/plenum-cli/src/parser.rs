//! Top-level CLI parser.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for administering a shared plenum database.
#[derive(Parser)]
#[command(name = "plenum")]
#[command(about = "Inspect and administer plenum floor locks")]
#[command(version)]
pub struct Cli {
    /// Path to the shared database (created if missing)
    #[arg(long = "db", env = "PLENUM_DB", default_value = "plenum.db", global = true)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}
