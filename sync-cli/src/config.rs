//! Configuration and layer setup for the offsync CLI.

use anyhow::{Context, Result};
use offsync_client::{FileStore, OfflineConfig, OfflineSync, SnapshotSource};
use offsync_types::ConnectivityState;
use std::path::Path;
use std::sync::Arc;

use crate::remote::CliRemote;

/// Name of the optional configuration file inside the data directory.
pub const CONFIG_FILE: &str = "offsync.toml";

/// Load `offsync.toml` from the data directory, or defaults if absent.
///
/// The CLI never drains implicitly; `drain` is an explicit command.
pub fn load(data_dir: &Path) -> Result<OfflineConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let mut config = if path.exists() {
        OfflineConfig::from_file(&path).context("Invalid offsync.toml")?
    } else {
        OfflineConfig::default()
    };
    config.sync.drain_on_enqueue = false;
    Ok(config)
}

/// Open the file-backed offline layer rooted at the data directory.
pub async fn open<F>(
    data_dir: &Path,
    remote: CliRemote,
    source: F,
    connectivity: ConnectivityState,
) -> Result<OfflineSync<FileStore, CliRemote>>
where
    F: SnapshotSource + 'static,
{
    let config = load(data_dir)?;
    let store = FileStore::open(data_dir)
        .await
        .context("Failed to open data directory")?;
    OfflineSync::open(
        config,
        Arc::new(store),
        Arc::new(remote),
        source,
        connectivity,
    )
    .await
    .context("Failed to load outbox")
}

/// Open the layer without a remote, for commands that never drain.
pub async fn open_local(
    data_dir: &Path,
    connectivity: ConnectivityState,
) -> Result<OfflineSync<FileStore, CliRemote>> {
    open(
        data_dir,
        CliRemote::Detached,
        offsync_types::StateSnapshot::default,
        connectivity,
    )
    .await
}

/// Format a unix-millisecond timestamp relative to now.
pub fn format_age(ts_ms: u64) -> String {
    let now = offsync_types::unix_millis();
    let diff = now.saturating_sub(ts_ms) / 1000;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}
