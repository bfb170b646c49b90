//! Identity Migration Controller
//!
//! Moves a workspace's layout from its provisional id to its durable id:
//! re-key the local entry, push it to the durable store, drop the old entry,
//! and carry over any pending save. Repeated calls find nothing under the old
//! id and return [`MigrationOutcome::NothingToMigrate`].

use crate::context::EngineContext;
use crate::persistence::SaveScheduler;
use panelgrid_store::WorkspaceId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of a migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// No local entry under the old id
    NothingToMigrate,
    /// Entry moved to the new id
    Migrated {
        /// A newer entry already under the new id was kept instead
        kept_existing: bool,
        /// Durable store accepted the record
        remote_written: bool,
    },
}

impl MigrationOutcome {
    /// Check if anything moved
    #[inline]
    #[must_use]
    pub fn is_migrated(&self) -> bool {
        matches!(self, Self::Migrated { .. })
    }
}

/// Re-keys stored layouts when a workspace gets its durable id
#[derive(Clone)]
pub struct Migrator {
    ctx: Arc<EngineContext>,
    saver: SaveScheduler,
}

impl Migrator {
    pub(crate) fn new(ctx: Arc<EngineContext>, saver: SaveScheduler) -> Self {
        Self { ctx, saver }
    }

    /// Migrate `old`'s layout to `new`
    pub async fn migrate(&self, old: &WorkspaceId, new: &WorkspaceId) -> MigrationOutcome {
        let ctx = &self.ctx;
        if old == new {
            return MigrationOutcome::NothingToMigrate;
        }

        // lock order is always old then new
        let old_slot = ctx.slots.slot(old);
        let old_gate = old_slot.gate.lock().await;

        let Some(entry) = ctx.local.get(old) else {
            tracing::debug!(from = %old, to = %new, "nothing to migrate");
            return MigrationOutcome::NothingToMigrate;
        };

        let new_slot = ctx.slots.slot(new);
        let _new_gate = new_slot.gate.lock().await;

        let (record, kept_existing) = match ctx.local.get(new) {
            Some(existing) if existing.updated_at >= entry.updated_at => (existing, true),
            _ => {
                let moved = entry.rekeyed(new.clone());
                ctx.local.put(moved.clone());
                (moved, false)
            }
        };

        let remote_written = if new.is_durable() {
            match ctx.durable.put(new, &record).await {
                Ok(()) => {
                    new_slot.set_last_key(record.percentage_vector().content_key(&record.topology_id));
                    true
                }
                Err(err) => {
                    tracing::warn!(from = %old, to = %new, error = %err, "durable write during migration failed");
                    false
                }
            }
        } else {
            false
        };

        ctx.local.delete(old);
        self.saver.transfer_pending(old, new);
        ctx.slots.retire(old);
        drop(old_gate);
        ctx.slots.remove(old);

        tracing::info!(from = %old, to = %new, kept_existing, remote_written, "workspace layout migrated");
        MigrationOutcome::Migrated {
            kept_existing,
            remote_written,
        }
    }
}
