//! Error types for the percentage codec

use panelgrid_topology::TopologyError;

/// Errors during encode, decode and wire conversion
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// Topology id not in the registry
    #[error("unknown topology: '{0}'")]
    UnknownTopology(String),

    /// Vector or raw record violates length or numeric invariants
    #[error("malformed vector for '{topology}': {reason}")]
    MalformedVector { topology: String, reason: String },

    /// More boxes than the topology has cells
    #[error("'{topology}' has {expected} cells, got {actual} boxes")]
    BoxCount {
        topology: String,
        expected: usize,
        actual: usize,
    },
}

impl CodecError {
    /// Create malformed vector error
    pub fn malformed(topology: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedVector {
            topology: topology.into(),
            reason: reason.into(),
        }
    }

    /// Whether callers should fall back to topology defaults
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedVector { .. })
    }
}

impl From<TopologyError> for CodecError {
    fn from(err: TopologyError) -> Self {
        match err {
            TopologyError::NotFound(id) => Self::UnknownTopology(id),
            TopologyError::DuplicateId(id) | TopologyError::InvalidShape { id, .. } => {
                Self::UnknownTopology(id)
            }
        }
    }
}

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
