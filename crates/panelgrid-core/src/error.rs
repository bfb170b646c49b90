//! Error types for the layout engine
//!
//! Controller paths absorb these into outcomes and logs; only construction,
//! configuration and the event-loop handle return them.

use panelgrid_codec::CodecError;
use panelgrid_store::{StoreError, WorkspaceId};
use panelgrid_topology::TopologyError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Registry lookup or construction failed
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    /// Encode or decode failed
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Container has not been laid out yet
    #[error("layout for {workspace} is not ready to sample")]
    SampleNotReady {
        /// Workspace being sampled
        workspace: WorkspaceId,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Event loop is no longer running
    #[error("engine has shut down")]
    Shutdown,
}

impl EngineError {
    /// Create config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
