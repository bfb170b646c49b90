//! Engine configuration

use crate::error::{EngineError, EngineResult};
use panelgrid_codec::CodecConfig;
use panelgrid_store::{RetryPolicy, DEFAULT_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Layout engine configuration
///
/// Every field has a default, so a TOML file only needs the values it changes:
///
/// ```
/// use panelgrid_core::EngineConfig;
///
/// let config = EngineConfig::from_toml_str("debounce_ms = 350\n[retry]\nmax_attempts = 5\n").unwrap();
/// assert_eq!(config.debounce_ms, 350);
/// assert_eq!(config.retry.max_attempts, 5);
/// assert_eq!(config.frame_interval_ms, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period after a resize gesture before saving
    pub debounce_ms: u64,
    /// Wait before re-sampling an unlaid-out container
    pub frame_interval_ms: u64,
    /// Re-sample attempts before a save gives up
    pub max_sample_retries: u32,
    /// Scan-order band tolerance, container percent
    pub row_tolerance: f64,
    /// Allowed distance from 100 for a stored group
    pub sum_tolerance: f64,
    /// Workspaces kept in the local cache
    pub local_cache_capacity: u64,
    /// Mirror the local cache to this file
    pub local_snapshot_path: Option<PathBuf>,
    /// Durable write retry schedule
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let codec = CodecConfig::default();
        Self {
            debounce_ms: 200,
            frame_interval_ms: 16,
            max_sample_retries: 30,
            row_tolerance: codec.row_tolerance,
            sum_tolerance: codec.sum_tolerance,
            local_cache_capacity: DEFAULT_CAPACITY,
            local_snapshot_path: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML
    ///
    /// # Errors
    /// Returns `EngineError::Config` for malformed TOML or invalid values
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// Returns `EngineError::Config` if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| EngineError::config(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// With debounce window
    #[inline]
    #[must_use]
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// With frame interval
    #[inline]
    #[must_use]
    pub fn with_frame_interval_ms(mut self, frame_interval_ms: u64) -> Self {
        self.frame_interval_ms = frame_interval_ms;
        self
    }

    /// With sample retry limit
    #[inline]
    #[must_use]
    pub fn with_max_sample_retries(mut self, retries: u32) -> Self {
        self.max_sample_retries = retries;
        self
    }

    /// With local cache capacity
    #[inline]
    #[must_use]
    pub fn with_local_cache_capacity(mut self, capacity: u64) -> Self {
        self.local_cache_capacity = capacity;
        self
    }

    /// With snapshot file
    #[inline]
    #[must_use]
    pub fn with_local_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_snapshot_path = Some(path.into());
        self
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Debounce window
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Frame interval
    #[inline]
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Codec tolerances
    #[must_use]
    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            row_tolerance: self.row_tolerance,
            sum_tolerance: self.sum_tolerance,
        }
    }

    /// Check every field is usable
    ///
    /// # Errors
    /// Returns `EngineError::Config` naming the first invalid field
    pub fn validate(&self) -> EngineResult<()> {
        if self.frame_interval_ms == 0 {
            return Err(EngineError::config("frame_interval_ms must be positive"));
        }
        if !self.row_tolerance.is_finite() || self.row_tolerance < 0.0 {
            return Err(EngineError::config("row_tolerance must be a non-negative number"));
        }
        if !self.sum_tolerance.is_finite() || self.sum_tolerance < 0.0 {
            return Err(EngineError::config("sum_tolerance must be a non-negative number"));
        }
        if self.local_cache_capacity == 0 {
            return Err(EngineError::config("local_cache_capacity must be positive"));
        }
        self.retry.validate().map_err(EngineError::Config)
    }
}
