//! Inspect and edit the outbox.

use anyhow::{Context, Result};
use offsync_types::{ActionId, ConnectivityState};
use serde_json::Value;
use std::path::Path;

use crate::config::{self, format_age};

/// Parse a command-line payload; no payload means `null`.
fn parse_payload(payload: Option<&str>) -> Result<Value> {
    match payload {
        Some(raw) => serde_json::from_str(raw).context("Payload is not valid JSON"),
        None => Ok(Value::Null),
    }
}

/// Record an action in the outbox.
pub async fn enqueue(data_dir: &Path, action_type: &str, payload: Option<&str>) -> Result<()> {
    let payload = parse_payload(payload)?;
    let sync = config::open_local(data_dir, ConnectivityState::Offline).await?;

    let action = sync
        .enqueue(action_type, payload)
        .await
        .context("Failed to record action")?;

    println!("Queued {} ({})", action.action_type, action.id);
    println!("  Pending: {} action(s)", sync.list_pending().await.len());

    Ok(())
}

/// List queued actions in FIFO order.
pub async fn list(data_dir: &Path) -> Result<()> {
    let sync = config::open_local(data_dir, ConnectivityState::Offline).await?;
    let pending = sync.list_pending().await;

    if pending.is_empty() {
        println!("Outbox is empty.");
        return Ok(());
    }

    println!("{} pending action(s):", pending.len());
    for action in &pending {
        println!(
            "  {}  {:<20} {}  {}",
            action.id,
            action.action_type,
            format_age(action.created_at),
            action.payload
        );
    }

    Ok(())
}

/// Drop one queued action.
pub async fn discard(data_dir: &Path, id: ActionId) -> Result<()> {
    let sync = config::open_local(data_dir, ConnectivityState::Offline).await?;

    if sync.discard(id).await.context("Failed to update outbox")? {
        println!("Discarded {}", id);
    } else {
        println!("No queued action with id {}", id);
    }

    Ok(())
}

/// Drop every queued action.
pub async fn clear(data_dir: &Path) -> Result<()> {
    let sync = config::open_local(data_dir, ConnectivityState::Offline).await?;
    let count = sync.list_pending().await.len();

    sync.clear_queue().await.context("Failed to clear outbox")?;

    println!("Cleared {} action(s)", count);
    Ok(())
}
