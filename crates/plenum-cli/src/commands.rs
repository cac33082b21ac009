//! Subcommand definitions and handlers.

use std::sync::Arc;

use clap::Subcommand;

use plenum_core::floor::FloorManager;
use plenum_core::ports::{LockStore, SegmentRepository};
use plenum_core::{FloorError, FloorStatus};
use plenum_store::{SqliteLockStore, SqliteSegmentRepository};

use crate::parser::Cli;

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and administer floor locks
    Floor {
        #[command(subcommand)]
        command: FloorCommand,
    },

    /// Show recent transcript segments for a room
    History {
        /// Room to list
        #[arg(long)]
        room: String,

        /// Maximum number of segments, newest first
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

/// Floor lock operations, mirroring the client protocol.
#[derive(Subcommand)]
pub enum FloorCommand {
    /// Report whether a room's floor is held, and by whom
    Status {
        /// Room to inspect
        #[arg(long)]
        room: String,
    },

    /// Claim the floor on behalf of a client
    Claim {
        /// Room to claim in
        #[arg(long)]
        room: String,

        /// Client identity to claim as
        #[arg(long)]
        client: String,
    },

    /// Renew a client's lease
    Heartbeat {
        /// Room the lease is in
        #[arg(long)]
        room: String,

        /// Client identity holding the lease
        #[arg(long)]
        client: String,
    },

    /// Release the floor held by a client
    Release {
        /// Room to release in
        #[arg(long)]
        room: String,

        /// Client identity releasing
        #[arg(long)]
        client: String,
    },

    /// Clear every lock row in the database
    Reset,
}

/// Open the database and dispatch the parsed command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let pool = plenum_store::setup_database(&cli.db).await?;

    match cli.command {
        Commands::Floor { command } => {
            let store = Arc::new(SqliteLockStore::new(pool)) as Arc<dyn LockStore>;
            let floor = FloorManager::new(store);
            run_floor(&floor, command).await
        }
        Commands::History { room, limit } => {
            let repo = SqliteSegmentRepository::new(pool);
            for segment in repo.list_for_room(&room, limit).await? {
                println!(
                    "{}  {:<16}  {}",
                    segment.created_at.format("%Y-%m-%d %H:%M:%S"),
                    segment.speaker_id,
                    segment.text
                );
            }
            Ok(())
        }
    }
}

async fn run_floor(floor: &FloorManager, command: FloorCommand) -> anyhow::Result<()> {
    match command {
        FloorCommand::Status { room } => {
            print_status(&room, &floor.status(&room).await?);
        }
        FloorCommand::Claim { room, client } => match floor.claim(&room, &client).await {
            Ok(()) => println!("Floor in '{room}' claimed by '{client}'"),
            Err(FloorError::FloorBusy { holder_id }) => {
                println!("Floor in '{room}' is busy, held by '{holder_id}'");
            }
            Err(e) => return Err(e.into()),
        },
        FloorCommand::Heartbeat { room, client } => {
            if floor.heartbeat(&room, &client).await? {
                println!("Lease renewed for '{client}' in '{room}'");
            } else {
                println!("'{client}' does not hold the floor in '{room}'");
            }
        }
        FloorCommand::Release { room, client } => {
            floor.release(&room, &client).await?;
            println!("Floor in '{room}' released by '{client}'");
        }
        FloorCommand::Reset => {
            let cleared = floor.reset_all().await?;
            println!("Cleared {cleared} lock(s)");
        }
    }
    Ok(())
}

fn print_status(room: &str, status: &FloorStatus) {
    match &status.holder_id {
        Some(holder) if status.locked => println!("Floor in '{room}' is held by '{holder}'"),
        _ => println!("Floor in '{room}' is unlocked"),
    }
}
