//! Workspace identity and the persisted layout record

use chrono::{DateTime, Utc};
use panelgrid_codec::PercentageVector;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

const PROVISIONAL_PREFIX: &str = "tmp:";

/// Stable numeric id assigned once a workspace is saved server-side
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurableId(pub u64);

impl Display for DurableId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Workspace identifier, provisional until the first save
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WorkspaceId {
    /// Assigned before the workspace exists server-side
    Provisional(String),
    /// Server-assigned
    Durable(DurableId),
}

impl WorkspaceId {
    /// Fresh provisional id
    #[must_use]
    pub fn provisional() -> Self {
        Self::Provisional(ulid::Ulid::new().to_string().to_lowercase())
    }

    /// Durable id from its number
    #[inline]
    #[must_use]
    pub const fn durable(id: u64) -> Self {
        Self::Durable(DurableId(id))
    }

    /// The durable id, if any
    #[inline]
    #[must_use]
    pub fn as_durable(&self) -> Option<DurableId> {
        match self {
            Self::Durable(id) => Some(*id),
            Self::Provisional(_) => None,
        }
    }

    /// Check if workspace has been saved server-side
    #[inline]
    #[must_use]
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Durable(_))
    }
}

impl Display for WorkspaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisional(token) => write!(f, "{PROVISIONAL_PREFIX}{token}"),
            Self::Durable(id) => write!(f, "{id}"),
        }
    }
}

/// Error parsing a workspace id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid workspace id '{0}'")]
pub struct ParseWorkspaceIdError(pub String);

impl FromStr for WorkspaceId {
    type Err = ParseWorkspaceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(token) = s.strip_prefix(PROVISIONAL_PREFIX) {
            if token.is_empty() {
                return Err(ParseWorkspaceIdError(s.to_string()));
            }
            return Ok(Self::Provisional(token.to_string()));
        }
        s.parse::<u64>()
            .map(Self::durable)
            .map_err(|_| ParseWorkspaceIdError(s.to_string()))
    }
}

impl TryFrom<String> for WorkspaceId {
    type Error = ParseWorkspaceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WorkspaceId> for String {
    fn from(value: WorkspaceId) -> Self {
        value.to_string()
    }
}

impl From<DurableId> for WorkspaceId {
    fn from(value: DurableId) -> Self {
        Self::Durable(value)
    }
}

/// One stored split value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    /// Percentage
    pub value: f64,
}

/// Stored layout for one workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateGridSizes {
    /// Owning workspace
    pub workspace_id: WorkspaceId,
    /// Topology the vector was encoded for
    pub topology_id: String,
    /// Percentage vector entries
    pub cell_sizes: Vec<CellSize>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl TemplateGridSizes {
    /// Record a vector now
    #[must_use]
    pub fn new(workspace_id: WorkspaceId, topology_id: impl Into<String>, vector: &PercentageVector) -> Self {
        Self::at(workspace_id, topology_id, vector, Utc::now())
    }

    /// Record a vector at a given time
    #[must_use]
    pub fn at(
        workspace_id: WorkspaceId,
        topology_id: impl Into<String>,
        vector: &PercentageVector,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            workspace_id,
            topology_id: topology_id.into(),
            cell_sizes: vector.values().iter().map(|&value| CellSize { value }).collect(),
            updated_at,
        }
    }

    /// Stored entries as a percentage vector
    #[must_use]
    pub fn percentage_vector(&self) -> PercentageVector {
        PercentageVector::new(self.cell_sizes.iter().map(|c| c.value).collect())
    }

    /// Same record under another workspace id
    #[must_use]
    pub fn rekeyed(&self, workspace_id: WorkspaceId) -> Self {
        Self {
            workspace_id,
            ..self.clone()
        }
    }

    /// Whether the record belongs to a topology
    #[inline]
    #[must_use]
    pub fn is_for(&self, topology_id: &str) -> bool {
        self.topology_id == topology_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn workspace_id_round_trips_through_strings() {
        let durable: WorkspaceId = "42".parse().unwrap();
        assert_eq!(durable, WorkspaceId::durable(42));
        assert_eq!(durable.to_string(), "42");

        let provisional = WorkspaceId::provisional();
        let text = provisional.to_string();
        assert!(text.starts_with("tmp:"));
        assert_eq!(text.parse::<WorkspaceId>().unwrap(), provisional);
        assert!(!provisional.is_durable());
    }

    #[test]
    fn rejects_bad_ids() {
        assert!("tmp:".parse::<WorkspaceId>().is_err());
        assert!("-3".parse::<WorkspaceId>().is_err());
        assert!("workspace".parse::<WorkspaceId>().is_err());
    }

    #[test]
    fn provisional_ids_are_unique() {
        assert_ne!(WorkspaceId::provisional(), WorkspaceId::provisional());
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = TemplateGridSizes::new(
            WorkspaceId::durable(7),
            "two-column",
            &PercentageVector::new(vec![70.0, 30.0]),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["workspaceId"], "7");
        assert_eq!(json["topologyId"], "two-column");
        assert_eq!(json["cellSizes"][0]["value"], 70.0);

        let back: TemplateGridSizes = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn rekey_keeps_payload() {
        let record = TemplateGridSizes::new(
            WorkspaceId::provisional(),
            "two-row",
            &PercentageVector::new(vec![40.0, 60.0]),
        );
        let moved = record.rekeyed(WorkspaceId::durable(1));
        assert_eq!(moved.workspace_id, WorkspaceId::durable(1));
        assert_eq!(moved.percentage_vector(), record.percentage_vector());
        assert_eq!(moved.updated_at, record.updated_at);
    }
}
