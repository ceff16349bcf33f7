//! Remote endpoints available to the CLI.

use async_trait::async_trait;
use offsync_client::{MockRemote, RemoteEndpoint, RemoteError};
use offsync_types::{ActionId, PendingAction};
use serde::Serialize;
use serde_json::Value;

/// Header carrying the action id so the endpoint can de-duplicate.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Body POSTed for each action.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    id: ActionId,
    action_type: &'a str,
    payload: &'a Value,
}

/// Remote that POSTs each action as JSON; any 2xx response means applied.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpRemote {
    /// Create a remote posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }
}

fn map_http_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Unreachable(e.to_string())
    }
}

#[async_trait]
impl RemoteEndpoint for HttpRemote {
    async fn apply(&self, action: &PendingAction) -> Result<(), RemoteError> {
        let body = SubmitBody {
            id: action.id,
            action_type: &action.action_type,
            payload: &action.payload,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header(IDEMPOTENCY_HEADER, action.id.to_string())
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("{} accepted {} ({})", self.endpoint, action.id, status);
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(RemoteError::Rejected(format!("{}: {}", status, text.trim())))
    }
}

/// The remote a CLI invocation drains into.
#[derive(Debug, Clone)]
pub enum CliRemote {
    /// POST to an HTTP endpoint.
    Http(HttpRemote),
    /// Accept everything in memory.
    Mock(MockRemote),
    /// No remote; every submission fails.
    Detached,
}

#[async_trait]
impl RemoteEndpoint for CliRemote {
    async fn apply(&self, action: &PendingAction) -> Result<(), RemoteError> {
        match self {
            Self::Http(remote) => remote.apply(action).await,
            Self::Mock(remote) => remote.apply(action).await,
            Self::Detached => Err(RemoteError::Unreachable("no endpoint configured".into())),
        }
    }
}
