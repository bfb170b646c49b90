//! Resize Persistence Controller
//!
//! A per-workspace save scheduler with three named policies:
//!
//! 1. **Debounce**: each resize-stop aborts and replaces the workspace's
//!    pending timer; only the last gesture in a burst is sampled.
//! 2. **Mutual exclusion**: a timer that fires while the workspace's gate is
//!    held re-arms instead of running.
//! 3. **Dedup**: a vector whose content key equals the last written key is
//!    not written again.
//!
//! The local write and optimistic publish happen before the durable write.
//! A failed durable write leaves the last key untouched so the next resize
//! retries.

use crate::context::EngineContext;
use futures::future::join_all;
use panelgrid_store::{TemplateGridSizes, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const REPORT_CAPACITY: usize = 64;

/// How a debounced save ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// Written locally and to the durable store
    Written,
    /// Written locally; the workspace has no durable id yet
    LocalOnly,
    /// Same content as the last write; skipped
    Deduplicated,
    /// Written locally; durable write failed and will be retried on the next resize
    RemoteFailed,
    /// Gate was held; re-armed
    Deferred,
    /// Container not laid out; re-armed or given up
    NotReady,
    /// Unknown topology or unencodable sample
    Failed,
    /// Workspace id was migrated to another id; nothing written
    Retired,
}

/// One finished save attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// Workspace saved
    pub workspace: WorkspaceId,
    /// Topology sampled
    pub topology_id: String,
    /// Result
    pub outcome: SaveOutcome,
}

/// Debounced, deduplicated, mutually exclusive saver
#[derive(Clone)]
pub struct SaveScheduler {
    ctx: Arc<EngineContext>,
    reports: broadcast::Sender<SaveReport>,
}

impl SaveScheduler {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        let (reports, _) = broadcast::channel(REPORT_CAPACITY);
        Self { ctx, reports }
    }

    /// Stream of finished save attempts
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SaveReport> {
        self.reports.subscribe()
    }

    /// A resize gesture finished; (re)start the debounce timer
    pub fn on_resize_stop(&self, workspace: WorkspaceId, topology_id: impl Into<String>) {
        self.arm(workspace, topology_id.into(), self.ctx.config.debounce(), 0);
    }

    /// Run a workspace's pending save now
    ///
    /// Returns `None` when nothing was pending.
    pub async fn flush(&self, workspace: &WorkspaceId) -> Option<SaveOutcome> {
        let topology_id = self.ctx.slots.get(workspace)?.cancel_pending()?;
        Some(self.run(workspace.clone(), topology_id, 0).await)
    }

    /// Run every pending save now
    pub async fn flush_all(&self) -> Vec<(WorkspaceId, SaveOutcome)> {
        let runs = self.ctx.slots.pending().into_iter().map(|workspace| async move {
            let outcome = self.flush(&workspace).await?;
            Some((workspace, outcome))
        });
        join_all(runs).await.into_iter().flatten().collect()
    }

    /// Move a pending save from one workspace id to another
    pub(crate) fn transfer_pending(&self, from: &WorkspaceId, to: &WorkspaceId) -> bool {
        let Some(topology_id) = self.ctx.slots.get(from).and_then(|slot| slot.cancel_pending()) else {
            return false;
        };
        tracing::debug!(from = %from, to = %to, "moving pending save to new workspace id");
        self.arm(to.clone(), topology_id, self.ctx.config.debounce(), 0);
        true
    }

    fn arm(&self, workspace: WorkspaceId, topology_id: String, delay: Duration, retries: u32) {
        if self.ctx.slots.is_retired(&workspace) {
            tracing::debug!(workspace = %workspace, "workspace id was migrated, not scheduling save");
            return;
        }
        let slot = self.ctx.slots.slot(&workspace);
        let this = self.clone();
        let task_topology = topology_id.clone();
        slot.replace_pending(topology_id, move |generation| {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let claimed = this.ctx.slots.get(&workspace).is_some_and(|slot| slot.claim(generation));
                if claimed {
                    this.run(workspace, task_topology, retries).await;
                }
            })
        });
    }

    async fn run(&self, workspace: WorkspaceId, topology_id: String, retries: u32) -> SaveOutcome {
        let outcome = self.save(&workspace, &topology_id, retries).await;
        // no receivers is fine
        let _ = self.reports.send(SaveReport {
            workspace,
            topology_id,
            outcome,
        });
        outcome
    }

    async fn save(&self, workspace: &WorkspaceId, topology_id: &str, retries: u32) -> SaveOutcome {
        let ctx = &self.ctx;
        if ctx.slots.is_retired(workspace) {
            return SaveOutcome::Retired;
        }
        let slot = ctx.slots.slot(workspace);
        let Ok(_gate) = slot.gate.try_lock() else {
            tracing::debug!(workspace = %workspace, "save in flight, deferring");
            self.arm(workspace.clone(), topology_id.to_string(), ctx.config.debounce(), retries);
            return SaveOutcome::Deferred;
        };
        // migration retires the id before releasing the gate
        if ctx.slots.is_retired(workspace) {
            tracing::debug!(workspace = %workspace, "workspace id was migrated, dropping save");
            return SaveOutcome::Retired;
        }

        let topology = match ctx.codec.topology(topology_id) {
            Ok(topology) => topology,
            Err(err) => {
                tracing::warn!(workspace = %workspace, topology = topology_id, error = %err, "cannot save layout");
                return SaveOutcome::Failed;
            }
        };

        let boxes = match ctx.sampler.try_sample(workspace, topology) {
            Ok(boxes) => boxes,
            Err(err) if retries < ctx.config.max_sample_retries => {
                tracing::debug!(workspace = %workspace, attempt = retries + 1, error = %err, "re-sampling next frame");
                self.arm(workspace.clone(), topology_id.to_string(), ctx.config.frame_interval(), retries + 1);
                return SaveOutcome::NotReady;
            }
            Err(err) => {
                tracing::warn!(workspace = %workspace, attempts = retries + 1, error = %err, "giving up on save");
                return SaveOutcome::NotReady;
            }
        };

        let vector = match ctx.codec.encode(topology_id, &boxes) {
            Ok(vector) => vector,
            Err(err) => {
                tracing::warn!(workspace = %workspace, topology = topology_id, error = %err, "cannot encode sampled layout");
                return SaveOutcome::Failed;
            }
        };

        let key = vector.content_key(topology_id);
        if slot.last_key().as_deref() == Some(key.as_str()) {
            tracing::debug!(workspace = %workspace, key = %key, "layout unchanged, skipping write");
            return SaveOutcome::Deduplicated;
        }

        let record = TemplateGridSizes::new(workspace.clone(), topology_id, &vector);
        ctx.local.put(record.clone());
        match ctx.codec.try_decode(topology_id, &vector) {
            Ok(layout) => ctx.publish(workspace, &layout),
            Err(err) => tracing::warn!(workspace = %workspace, error = %err, "skipping optimistic publish"),
        }

        if !workspace.is_durable() {
            slot.set_last_key(key);
            return SaveOutcome::LocalOnly;
        }

        match ctx.durable.put(workspace, &record).await {
            Ok(()) => {
                tracing::debug!(workspace = %workspace, key = %key, "layout saved");
                slot.set_last_key(key);
                SaveOutcome::Written
            }
            Err(err) => {
                tracing::warn!(workspace = %workspace, error = %err, "durable write failed, kept locally");
                SaveOutcome::RemoteFailed
            }
        }
    }
}
