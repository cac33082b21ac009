//! CLI entry point - the composition root.
//!
//! Wires the store to the floor manager and dispatches to command
//! handlers. Nothing outside this binary opens the database directly.

use clap::Parser;

use plenum_cli::{Cli, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    run(cli).await
}
