//! Reconciliation Controller
//!
//! Runs when a workspace becomes active and decides which stored layout to
//! publish:
//!
//! ```text
//! CheckLocal ─hit──────────────────────────────► publish local
//!     ├─other topology─────────────────────────► publish defaults
//!     └─miss─► FetchRemote ─hit─► re-check local ─hit─► publish local
//!                  │                   └─miss─► warm local, publish remote
//!                  └─miss─► re-check local ─miss─► publish defaults
//! ```
//!
//! The local cache always wins over the durable store for the same
//! workspace and topology. A stored layout that fails validation counts as
//! absent. A local entry recorded for a different topology means the
//! workspace's topology changed: both stores are ignored and defaults are
//! published.

use crate::context::EngineContext;
use panelgrid_codec::PixelFractionMap;
use panelgrid_store::WorkspaceId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Which source a reconciliation published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Local cache entry
    Local,
    /// Durable store entry, now also cached locally
    Remote,
    /// Topology defaults
    Defaults,
    /// Topology not in the registry; nothing published
    UnknownTopology,
}

impl Display for ReconcileOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Defaults => "defaults",
            Self::UnknownTopology => "unknown_topology",
        };
        f.write_str(name)
    }
}

/// Chooses and publishes a layout on activation
#[derive(Clone)]
pub struct Reconciler {
    ctx: Arc<EngineContext>,
}

impl Reconciler {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Reconcile and publish a workspace's layout
    pub async fn reconcile(&self, workspace: &WorkspaceId, topology_id: &str) -> ReconcileOutcome {
        let ctx = &self.ctx;
        let defaults = match ctx.codec.defaults(topology_id) {
            Ok(defaults) => defaults,
            Err(err) => {
                tracing::warn!(workspace = %workspace, topology = topology_id, error = %err, "cannot reconcile layout");
                return ReconcileOutcome::UnknownTopology;
            }
        };

        match self.check_local(workspace, topology_id) {
            LocalEntry::Usable(layout) => return self.publish_local(workspace, topology_id, &layout),
            LocalEntry::OtherTopology => return self.publish_defaults(workspace, topology_id, &defaults),
            LocalEntry::Missing => {}
        }

        let slot = ctx.slots.slot(workspace);
        let _gate = slot.gate.lock().await;
        let remote = ctx.durable.get(workspace).await;

        // a resize may have landed locally while the read was in flight
        match self.check_local(workspace, topology_id) {
            LocalEntry::Usable(layout) => return self.publish_local(workspace, topology_id, &layout),
            LocalEntry::OtherTopology => return self.publish_defaults(workspace, topology_id, &defaults),
            LocalEntry::Missing => {}
        }

        if let Some(record) = remote {
            if let Some(layout) = ctx.decode_record(&record, topology_id, "remote") {
                let vector = record.percentage_vector();
                ctx.local.put(record.rekeyed(workspace.clone()));
                slot.set_last_key(vector.content_key(topology_id));
                ctx.publish(workspace, &layout);
                tracing::info!(workspace = %workspace, topology = topology_id, outcome = %ReconcileOutcome::Remote, "layout reconciled");
                return ReconcileOutcome::Remote;
            }
        }

        self.publish_defaults(workspace, topology_id, &defaults)
    }

    /// A local entry for another topology means the workspace's topology
    /// changed, which voids the durable entry as well.
    fn check_local(&self, workspace: &WorkspaceId, topology_id: &str) -> LocalEntry {
        let Some(record) = self.ctx.local.get(workspace) else {
            return LocalEntry::Missing;
        };
        if !record.is_for(topology_id) {
            tracing::debug!(workspace = %workspace, stored = %record.topology_id, topology = topology_id, "topology changed, ignoring stored layouts");
            return LocalEntry::OtherTopology;
        }
        match self.ctx.decode_record(&record, topology_id, "local") {
            Some(layout) => LocalEntry::Usable(layout),
            None => LocalEntry::Missing,
        }
    }

    fn publish_local(&self, workspace: &WorkspaceId, topology_id: &str, layout: &PixelFractionMap) -> ReconcileOutcome {
        self.ctx.publish(workspace, layout);
        tracing::info!(workspace = %workspace, topology = topology_id, outcome = %ReconcileOutcome::Local, "layout reconciled");
        ReconcileOutcome::Local
    }

    fn publish_defaults(&self, workspace: &WorkspaceId, topology_id: &str, defaults: &PixelFractionMap) -> ReconcileOutcome {
        self.ctx.publish(workspace, defaults);
        tracing::info!(workspace = %workspace, topology = topology_id, outcome = %ReconcileOutcome::Defaults, "layout reconciled");
        ReconcileOutcome::Defaults
    }
}

enum LocalEntry {
    Usable(PixelFractionMap),
    OtherTopology,
    Missing,
}
