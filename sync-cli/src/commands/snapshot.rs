//! Refresh, show or clear the offline snapshot.

use anyhow::{Context, Result};
use offsync_types::{ConnectivityState, StateSnapshot};
use std::path::Path;

use crate::config::{self, format_age};
use crate::remote::CliRemote;

/// Read a state file of the form `{items, userProfile, achievements}`.
async fn read_state(from: &Path) -> Result<StateSnapshot> {
    let raw = tokio::fs::read_to_string(from)
        .await
        .with_context(|| format!("Failed to read {}", from.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid state file", from.display()))
}

/// Replace the stored snapshot with the state in `from`.
pub async fn refresh(data_dir: &Path, from: &Path) -> Result<()> {
    let state = read_state(from).await?;
    let sync = config::open(
        data_dir,
        CliRemote::Detached,
        move || state.clone(),
        ConnectivityState::Online,
    )
    .await?;

    let snapshot = sync
        .refresh_snapshot()
        .await
        .context("Failed to store snapshot")?;

    println!(
        "Snapshot stored: {} item(s), {} bytes",
        snapshot.items.len(),
        snapshot.size_bytes
    );
    Ok(())
}

/// Print the stored snapshot as JSON.
pub async fn show(data_dir: &Path) -> Result<()> {
    let sync = config::open_local(data_dir, ConnectivityState::Offline).await?;

    match sync.load_snapshot().await {
        Some(snapshot) => {
            println!("# taken {}", format_age(snapshot.last_synced_at));
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => println!("No snapshot stored."),
    }

    Ok(())
}

/// Delete the stored snapshot.
pub async fn clear(data_dir: &Path) -> Result<()> {
    let sync = config::open_local(data_dir, ConnectivityState::Offline).await?;
    sync.clear_snapshot()
        .await
        .context("Failed to clear snapshot")?;
    println!("Snapshot cleared.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    async fn stored(dir: &Path) -> Option<offsync_types::OfflineSnapshot> {
        config::open_local(dir, ConnectivityState::Offline)
            .await
            .unwrap()
            .load_snapshot()
            .await
    }

    fn write_state(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("state.json");
        std::fs::write(
            &path,
            json!({
                "items": [{ "id": "px-1" }, { "id": "px-2" }],
                "userProfile": { "name": "sam" },
                "achievements": ["first_purchase"]
            })
            .to_string(),
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn refresh_then_show() {
        let dir = tempdir().unwrap();
        let state = write_state(dir.path());

        refresh(dir.path(), &state).await.unwrap();
        show(dir.path()).await.unwrap();

        let snapshot = stored(dir.path()).await.unwrap();
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.user_profile, json!({ "name": "sam" }));
    }

    #[tokio::test]
    async fn refresh_from_invalid_file_keeps_previous() {
        let dir = tempdir().unwrap();
        let state = write_state(dir.path());
        refresh(dir.path(), &state).await.unwrap();

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2").unwrap();

        assert!(refresh(dir.path(), &bad).await.is_err());
        assert_eq!(stored(dir.path()).await.unwrap().items.len(), 2);
    }

    #[tokio::test]
    async fn clear_removes_snapshot() {
        let dir = tempdir().unwrap();
        let state = write_state(dir.path());
        refresh(dir.path(), &state).await.unwrap();

        clear(dir.path()).await.unwrap();

        assert!(stored(dir.path()).await.is_none());
    }
}
