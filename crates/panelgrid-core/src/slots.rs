//! Per-workspace coordination state
//!
//! Gates, dedup keys and pending debounce tasks are scoped to one workspace
//! id, so activity on two workspaces never contends.

use dashmap::{DashMap, DashSet};
use panelgrid_store::WorkspaceId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A debounced save waiting for its timer
#[derive(Debug)]
pub(crate) struct PendingSave {
    pub(crate) generation: u64,
    pub(crate) topology_id: String,
    pub(crate) handle: JoinHandle<()>,
}

/// Coordination state for one workspace
#[derive(Debug, Default)]
pub struct WorkspaceSlot {
    /// Held while touching the durable store
    pub(crate) gate: tokio::sync::Mutex<()>,
    last_key: Mutex<Option<String>>,
    pending: Mutex<Option<PendingSave>>,
    generation: AtomicU64,
}

impl WorkspaceSlot {
    /// Content key of the last successful write
    #[must_use]
    pub fn last_key(&self) -> Option<String> {
        self.last_key.lock().clone()
    }

    pub(crate) fn set_last_key(&self, key: String) {
        *self.last_key.lock() = Some(key);
    }

    /// Check if a debounced save is waiting
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Check if the durable-store gate is held
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    /// Install a pending save, aborting the one it replaces
    ///
    /// `spawn` receives the new generation number.
    pub(crate) fn replace_pending(
        &self,
        topology_id: String,
        spawn: impl FnOnce(u64) -> JoinHandle<()>,
    ) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.handle.abort();
        }
        *pending = Some(PendingSave {
            generation,
            topology_id,
            handle: spawn(generation),
        });
    }

    /// Detach the pending save if it is still `generation`
    ///
    /// Called by the timer task itself once it fires, so later replacements
    /// do not abort a save already under way.
    pub(crate) fn claim(&self, generation: u64) -> bool {
        let mut pending = self.pending.lock();
        match pending.as_ref() {
            Some(p) if p.generation == generation => {
                pending.take();
                true
            }
            _ => false,
        }
    }

    /// Remove and abort the pending save, returning its topology
    pub(crate) fn cancel_pending(&self) -> Option<String> {
        self.pending.lock().take().map(|p| {
            p.handle.abort();
            p.topology_id
        })
    }
}

/// All workspace slots
#[derive(Debug, Default, Clone)]
pub struct WorkspaceSlots {
    slots: Arc<DashMap<WorkspaceId, Arc<WorkspaceSlot>>>,
    // ids whose layout migrated to another id
    retired: Arc<DashSet<WorkspaceId>>,
}

impl WorkspaceSlots {
    /// Create empty slot table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for a workspace, created on first use
    #[must_use]
    pub fn slot(&self, workspace: &WorkspaceId) -> Arc<WorkspaceSlot> {
        self.slots.entry(workspace.clone()).or_default().clone()
    }

    /// Slot if it exists
    #[must_use]
    pub fn get(&self, workspace: &WorkspaceId) -> Option<Arc<WorkspaceSlot>> {
        self.slots.get(workspace).map(|s| Arc::clone(s.value()))
    }

    /// Drop a workspace's slot
    pub fn remove(&self, workspace: &WorkspaceId) -> Option<Arc<WorkspaceSlot>> {
        self.slots.remove(workspace).map(|(_, slot)| slot)
    }

    /// Mark a workspace id as migrated away; later saves under it are dropped
    pub(crate) fn retire(&self, workspace: &WorkspaceId) {
        self.retired.insert(workspace.clone());
    }

    /// Check if a workspace id was migrated away
    #[must_use]
    pub fn is_retired(&self, workspace: &WorkspaceId) -> bool {
        self.retired.contains(workspace)
    }

    /// Workspaces with a pending save
    #[must_use]
    pub fn pending(&self) -> Vec<WorkspaceId> {
        self.slots
            .iter()
            .filter(|entry| entry.value().has_pending())
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn replacing_aborts_previous() {
        let slot = WorkspaceSlot::default();
        let fired = Arc::new(AtomicU64::new(0));
        for _ in 0..2 {
            let fired = Arc::clone(&fired);
            slot.replace_pending("two-column".to_string(), move |_| {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    fired.fetch_add(1, Ordering::Relaxed);
                })
            });
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::Relaxed), 1);
        assert!(slot.has_pending());
    }

    #[tokio::test]
    async fn claim_only_matches_current_generation() {
        let slot = WorkspaceSlot::default();
        slot.replace_pending("two-row".to_string(), |_| tokio::spawn(async {}));
        assert!(!slot.claim(99));
        assert!(slot.claim(1));
        assert!(!slot.has_pending());
        assert!(!slot.claim(1));
    }

    #[test]
    fn slots_are_shared_per_workspace() {
        let slots = WorkspaceSlots::new();
        let id = WorkspaceId::durable(1);
        let a = slots.slot(&id);
        a.set_last_key("k".to_string());
        assert_eq!(slots.slot(&id).last_key().as_deref(), Some("k"));
        assert!(slots.slot(&WorkspaceId::durable(2)).last_key().is_none());
        assert!(slots.remove(&id).is_some());
        assert!(slots.get(&id).is_none());
    }

    #[test]
    fn retired_ids_are_remembered_after_removal() {
        let slots = WorkspaceSlots::new();
        let draft = WorkspaceId::provisional();
        let _ = slots.slot(&draft);
        assert!(!slots.is_retired(&draft));

        slots.retire(&draft);
        slots.remove(&draft);
        assert!(slots.is_retired(&draft));
        assert!(slots.get(&draft).is_none());
        assert!(!slots.is_retired(&WorkspaceId::durable(3)));
    }
}
