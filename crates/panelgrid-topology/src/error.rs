//! Error types for the topology registry

/// Errors raised by topology lookup and catalog construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// No topology registered under this identifier
    #[error("unknown topology: '{0}'")]
    NotFound(String),

    /// Two catalog entries share an identifier
    #[error("duplicate topology id: '{0}'")]
    DuplicateId(String),

    /// Shape parameters cannot describe a grid
    #[error("invalid shape for topology '{id}': {reason}")]
    InvalidShape { id: String, reason: String },
}

impl TopologyError {
    /// Create invalid shape error
    pub fn invalid_shape(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error comes from a failed lookup
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;
