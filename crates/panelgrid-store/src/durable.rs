//! Durable Store Gateway
//!
//! The only store operation that crosses a process boundary. Records travel
//! as [`RawPositionRecord`]s keyed by [`DurableId`]; the gateway converts them
//! to and from [`TemplateGridSizes`] through the codec.
//!
//! Reads never fail: backend errors, unknown topologies and malformed wire
//! data all come back as `None`. Writes are retried per [`RetryPolicy`].

use crate::error::{BackendError, StoreError, StoreResult};
use crate::record::{DurableId, TemplateGridSizes, WorkspaceId};
use crate::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use panelgrid_codec::{Codec, RawPositionRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Layout as the remote side stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLayoutRecord {
    /// Topology the positions describe
    pub topology_id: String,
    /// Per-cell position arrays
    pub positions: RawPositionRecord,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

/// Remote storage of layout records
#[async_trait::async_trait]
pub trait LayoutBackend: Send + Sync {
    /// Fetch the record for a workspace
    async fn read(&self, id: DurableId) -> Result<Option<RemoteLayoutRecord>, BackendError>;

    /// Replace the record for a workspace
    async fn write(&self, id: DurableId, record: RemoteLayoutRecord) -> Result<(), BackendError>;
}

/// Codec-aware, retrying front for a [`LayoutBackend`]
#[derive(Clone)]
pub struct DurableStoreGateway {
    backend: Arc<dyn LayoutBackend>,
    codec: Arc<Codec>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for DurableStoreGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStoreGateway")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl DurableStoreGateway {
    /// Create gateway with the default retry policy
    #[must_use]
    pub fn new(backend: Arc<dyn LayoutBackend>, codec: Arc<Codec>) -> Self {
        Self {
            backend,
            codec,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Retry policy in use
    #[inline]
    #[must_use]
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch a workspace's layout, `None` on any failure
    pub async fn get(&self, workspace: &WorkspaceId) -> Option<TemplateGridSizes> {
        let id = workspace.as_durable()?;
        match self.try_get(id).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(workspace = %workspace, error = %err, "remote read failed, treating as absent");
                None
            }
        }
    }

    /// Fetch a workspace's layout, surfacing backend failures
    ///
    /// Unknown topologies and malformed wire data are still reported as absent.
    ///
    /// # Errors
    /// Returns `StoreError::RemoteRead` if the backend fails
    pub async fn try_get(&self, id: DurableId) -> StoreResult<Option<TemplateGridSizes>> {
        let workspace = WorkspaceId::Durable(id);
        let Some(remote) = self.backend.read(id).await.map_err(|source| StoreError::RemoteRead {
            workspace: workspace.clone(),
            source,
        })?
        else {
            return Ok(None);
        };

        match self.codec.from_raw(&remote.topology_id, &remote.positions) {
            Ok(vector) => Ok(Some(TemplateGridSizes::at(
                workspace,
                remote.topology_id,
                &vector,
                remote.updated_at,
            ))),
            Err(err) => {
                tracing::warn!(workspace = %workspace, topology = %remote.topology_id, error = %err, "discarding unreadable remote layout");
                Ok(None)
            }
        }
    }

    /// Write a workspace's layout, retrying with backoff
    ///
    /// # Errors
    /// - `StoreError::NotDurable` for provisional ids
    /// - `StoreError::Serialization` if the record cannot be encoded for the wire
    /// - `StoreError::RemoteWrite` once every attempt has failed
    pub async fn put(&self, workspace: &WorkspaceId, record: &TemplateGridSizes) -> StoreResult<()> {
        let id = workspace
            .as_durable()
            .ok_or_else(|| StoreError::NotDurable(workspace.clone()))?;

        let positions = self
            .codec
            .to_raw(&record.topology_id, &record.percentage_vector())
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        let remote = RemoteLayoutRecord {
            topology_id: record.topology_id.clone(),
            positions,
            updated_at: record.updated_at,
        };

        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.backend.write(id, remote.clone()).await {
                Ok(()) => {
                    tracing::debug!(workspace = %workspace, attempt, "remote layout written");
                    return Ok(());
                }
                Err(source) if attempt >= attempts => {
                    tracing::warn!(workspace = %workspace, attempt, error = %source, "remote write failed");
                    return Err(StoreError::RemoteWrite {
                        workspace: workspace.clone(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(source) => {
                    let delay = self.retry.backoff(attempt);
                    tracing::debug!(workspace = %workspace, attempt, error = %source, ?delay, "retrying remote write");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
