//! Submit queued actions to a remote endpoint.

use anyhow::Result;
use offsync_client::{MockRemote, StateSnapshot, SyncSession, SyncStatus};
use offsync_types::ConnectivityState;
use std::path::Path;

use crate::config;
use crate::remote::{CliRemote, HttpRemote};

/// Where a drain submits to.
#[derive(Debug, Clone)]
pub enum Target {
    /// POST each action to this URL.
    Http(String),
    /// Accept every action in memory.
    Mock,
}

impl Target {
    fn remote(self) -> CliRemote {
        match self {
            Self::Http(url) => CliRemote::Http(HttpRemote::new(url)),
            Self::Mock => CliRemote::Mock(MockRemote::new()),
        }
    }
}

/// Run the drain command.
pub async fn run(data_dir: &Path, target: Target, connectivity: ConnectivityState) -> Result<()> {
    let outcome = drain(data_dir, target, connectivity).await?;
    let Some(session) = outcome else {
        println!("Offline: nothing submitted.");
        return Ok(());
    };

    match session.status {
        SyncStatus::Failed => {
            let reason = session.failure.map(|r| r.to_string()).unwrap_or_default();
            println!(
                "Drain failed after {}/{} action(s): {}",
                session.completed_actions, session.total_actions, reason
            );
            anyhow::bail!(
                "{} action(s) still queued",
                session.total_actions - session.completed_actions
            );
        }
        _ if session.total_actions == 0 => println!("Outbox is empty."),
        _ => println!("Drain complete: {} action(s) applied", session.completed_actions),
    }

    Ok(())
}

/// Drain the outbox in `data_dir` into `target`.
///
/// `None` when offline.
async fn drain(
    data_dir: &Path,
    target: Target,
    connectivity: ConnectivityState,
) -> Result<Option<SyncSession>> {
    let sync = config::open(
        data_dir,
        target.remote(),
        StateSnapshot::default,
        connectivity,
    )
    .await?;
    tracing::info!("Draining {} pending action(s)", sync.list_pending().await.len());
    Ok(sync.drain().await)
}
