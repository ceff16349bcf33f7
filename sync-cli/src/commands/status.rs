//! Show outbox, snapshot and connectivity status.

use anyhow::Result;
use offsync_types::ConnectivityState;
use std::path::Path;

use crate::config::{self, format_age};

/// Run the status command.
pub async fn run(data_dir: &Path, connectivity: ConnectivityState) -> Result<()> {
    let sync = config::open_local(data_dir, connectivity).await?;
    let indicators = sync.indicators().await;

    println!("=== offsync status ===");
    println!();
    println!("Data dir:     {}", data_dir.display());
    println!("Connectivity: {}", indicators.connectivity);
    println!();

    let pending = sync.list_pending().await;
    println!("Outbox:");
    println!("  Pending: {} action(s)", indicators.pending_actions);
    if let Some(oldest) = pending.first() {
        println!("  Oldest:  {} ({})", oldest.id, format_age(oldest.created_at));
    }
    println!();

    match sync.load_snapshot().await {
        Some(snapshot) => {
            println!("Snapshot:");
            println!("  Items:        {}", snapshot.items.len());
            println!("  Achievements: {}", snapshot.achievements.len());
            println!("  Size:         {} bytes", snapshot.size_bytes);
            println!("  Taken:        {}", format_age(snapshot.last_synced_at));
        }
        None => {
            println!("Snapshot: NONE");
            println!();
            println!("Run 'offsync snapshot refresh --from <file>' to store one.");
        }
    }

    Ok(())
}
