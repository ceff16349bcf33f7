//! Error types for sync-client.

use offsync_types::CodecError;
use std::path::PathBuf;

/// Key-value store errors.
///
/// Always surfaced to the caller of a mutating operation; reads of missing
/// or corrupt values are reported as "absent" instead.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem error.
    #[error("I/O error on key {key}: {source}")]
    Io {
        /// The key being accessed.
        key: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The write would exceed the storage budget.
    #[error("storage quota exceeded for key {key}: {size} bytes (limit: {limit} bytes)")]
    QuotaExceeded {
        /// The key being written.
        key: String,
        /// Size of the rejected value.
        size: usize,
        /// Storage limit in bytes.
        limit: usize,
    },

    /// The value could not be encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Remote endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The remote refused to apply the action.
    #[error("rejected by remote: {0}")]
    Rejected(String),

    /// The remote could not be reached.
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    /// The submission did not complete in time.
    #[error("remote submission timed out")]
    Timeout,
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

/// Client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Remote error.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_error_display() {
        let err = StorageError::QuotaExceeded {
            key: "offsync.outbox".into(),
            size: 2048,
            limit: 1024,
        };
        assert_eq!(
            err.to_string(),
            "storage quota exceeded for key offsync.outbox: 2048 bytes (limit: 1024 bytes)"
        );
    }

    #[test]
    fn storage_error_converts_to_client_error() {
        let err: ClientError = StorageError::Backend("disk full".into()).into();
        assert!(matches!(err, ClientError::Storage(_)));
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
        assert_send_sync::<RemoteError>();
        assert_send_sync::<ClientError>();
    }
}
