//! Canonical percentage vector
//!
//! One value per structural split (see [`panelgrid_topology::SplitGroup`]),
//! not one per cell.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Ordered split percentages for one workspace's geometry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PercentageVector(Vec<f64>);

impl PercentageVector {
    /// Wrap raw values
    #[inline]
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Borrow values
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Take values
    #[inline]
    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.0
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if vector is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every entry is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Comma-separated, two decimal places
    #[must_use]
    pub fn to_csv(&self) -> String {
        self.0
            .iter()
            .map(|v| format!("{v:.2}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Stable dedup key for this vector under a topology
    ///
    /// Values are compared at two-decimal precision.
    #[must_use]
    pub fn content_key(&self, topology_id: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(topology_id.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.to_csv().as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Largest absolute difference to another vector of equal length
    #[must_use]
    pub fn max_delta(&self, other: &Self) -> Option<f64> {
        (self.len() == other.len()).then(|| {
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max)
        })
    }
}

impl From<Vec<f64>> for PercentageVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl Display for PercentageVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.to_csv())
    }
}

/// Error parsing a comma-separated vector
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid percentage '{0}'")]
pub struct ParseVectorError(pub String);

impl FromStr for PercentageVector {
    type Err = ParseVectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');
        if trimmed.trim().is_empty() {
            return Ok(Self::default());
        }
        trimmed
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| ParseVectorError(part.trim().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
