//! Error types for layout stores

use crate::record::WorkspaceId;

/// Failure reported by a durable backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("backend error: {0}")]
pub struct BackendError(pub String);

impl BackendError {
    /// Create backend error
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors during store operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Durable store only accepts server-assigned ids
    #[error("workspace {0} has no durable id")]
    NotDurable(WorkspaceId),

    /// Remote read failed
    #[error("remote read for {workspace} failed: {source}")]
    RemoteRead {
        workspace: WorkspaceId,
        #[source]
        source: BackendError,
    },

    /// Remote write failed after retries
    #[error("remote write for {workspace} failed after {attempts} attempts: {source}")]
    RemoteWrite {
        workspace: WorkspaceId,
        attempts: u32,
        #[source]
        source: BackendError,
    },

    /// Local snapshot file could not be read or written
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Record could not be converted for storage
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Check if error came from the remote side
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteRead { .. } | Self::RemoteWrite { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Snapshot(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = StoreError::NotDurable(WorkspaceId::Provisional("abc".to_string()));
        assert_eq!(err.to_string(), "workspace tmp:abc has no durable id");

        let err = StoreError::RemoteWrite {
            workspace: WorkspaceId::durable(9),
            attempts: 3,
            source: BackendError::new("timeout"),
        };
        assert!(err.to_string().contains("after 3 attempts"));
        assert!(err.is_remote());
    }
}
