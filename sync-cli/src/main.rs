//! # offsync
//!
//! CLI tool for operating a file-backed offsync outbox and snapshot.
//!
//! ## Commands
//!
//! - `status`: Show connectivity, queue and snapshot state
//! - `enqueue`: Record an action in the outbox
//! - `list` / `discard` / `clear`: Inspect and edit the outbox
//! - `drain`: Submit queued actions to a remote endpoint
//! - `snapshot`: Refresh, show or clear the offline snapshot
//! - `gate`: Check whether a feature is available
//!
//! ## Example
//!
//! ```bash
//! # Record actions while offline
//! offsync --offline enqueue buy_pixel '{"pixel": 42}'
//! offsync list
//!
//! # Drain them once back online
//! offsync drain --endpoint https://api.example.com/actions
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use offsync_types::{ActionId, ConnectivityState};
use std::path::PathBuf;

mod commands;
mod config;
mod remote;

use commands::{drain, gate, queue, snapshot, status};

/// CLI tool for operating an offsync outbox.
#[derive(Parser, Debug)]
#[command(name = "offsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory holding the outbox, snapshot and offsync.toml
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Treat the device as offline
    #[arg(long, global = true)]
    offline: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show connectivity, queue and snapshot state
    Status,

    /// Record an action in the outbox
    Enqueue {
        /// Action type tag
        action_type: String,

        /// JSON payload (defaults to null)
        payload: Option<String>,
    },

    /// List queued actions in FIFO order
    List,

    /// Drop one queued action
    Discard {
        /// Action id as shown by `list`
        id: ActionId,
    },

    /// Drop every queued action
    Clear {
        /// Confirm the irreversible deletion
        #[arg(long)]
        yes: bool,
    },

    /// Submit queued actions to the remote
    Drain(DrainArgs),

    /// Manage the offline snapshot
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },

    /// Check whether a feature is available
    Gate {
        /// Feature name
        feature: String,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct DrainArgs {
    /// URL actions are POSTed to
    #[arg(long)]
    endpoint: Option<String>,

    /// Use an in-memory remote that accepts everything (for testing/demo)
    #[arg(long)]
    mock: bool,
}

#[derive(Subcommand, Debug)]
enum SnapshotCommands {
    /// Replace the snapshot with the state in a JSON file
    Refresh {
        /// File holding `{items, userProfile, achievements}`
        #[arg(long)]
        from: PathBuf,
    },

    /// Print the stored snapshot
    Show,

    /// Delete the stored snapshot
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let connectivity = if cli.offline {
        ConnectivityState::Offline
    } else {
        ConnectivityState::Online
    };

    match cli.command {
        Commands::Status => status::run(&data_dir, connectivity).await?,
        Commands::Enqueue {
            action_type,
            payload,
        } => queue::enqueue(&data_dir, &action_type, payload.as_deref()).await?,
        Commands::List => queue::list(&data_dir).await?,
        Commands::Discard { id } => queue::discard(&data_dir, id).await?,
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to clear the outbox without --yes");
            }
            queue::clear(&data_dir).await?;
        }
        Commands::Drain(args) => {
            let target = match (args.endpoint, args.mock) {
                (Some(url), _) => drain::Target::Http(url),
                (None, true) => drain::Target::Mock,
                (None, false) => anyhow::bail!("Must specify either --endpoint or --mock"),
            };
            drain::run(&data_dir, target, connectivity).await?;
        }
        Commands::Snapshot { command } => match command {
            SnapshotCommands::Refresh { from } => snapshot::refresh(&data_dir, &from).await?,
            SnapshotCommands::Show => snapshot::show(&data_dir).await?,
            SnapshotCommands::Clear => snapshot::clear(&data_dir).await?,
        },
        Commands::Gate { feature } => gate::run(&data_dir, &feature, connectivity)?,
    }

    Ok(())
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the verbosity.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "offsync=info",
        1 => "offsync=debug",
        _ => "offsync=trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

/// Get the default data directory for offsync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "offsync", "offsync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
