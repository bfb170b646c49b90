//! Session-local layout cache
//!
//! Synchronous and non-suspending. Backed by a bounded moka cache, optionally
//! mirrored to a JSON snapshot file so entries survive a process restart.

use crate::error::StoreResult;
use crate::record::{TemplateGridSizes, WorkspaceId};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default number of workspaces kept in memory
pub const DEFAULT_CAPACITY: u64 = 1024;

/// Most recent layout per workspace
#[derive(Clone)]
pub struct LocalCache {
    inner: Cache<WorkspaceId, TemplateGridSizes>,
    snapshot: Option<Arc<Snapshot>>,
}

struct Snapshot {
    path: PathBuf,
    // serializes whole-file rewrites
    lock: Mutex<()>,
}

impl Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("entries", &self.inner.entry_count())
            .field("snapshot", &self.snapshot.as_ref().map(|s| &s.path))
            .finish()
    }
}

// LRU admits every write; the default TinyLFU policy may drop a fresh insert
// when the cache is full.
fn bounded(capacity: u64) -> Cache<WorkspaceId, TemplateGridSizes> {
    Cache::builder()
        .max_capacity(capacity)
        .eviction_policy(EvictionPolicy::lru())
        .build()
}

impl LocalCache {
    /// In-memory cache
    #[inline]
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: bounded(capacity),
            snapshot: None,
        }
    }

    /// Cache mirrored to a snapshot file
    ///
    /// Existing snapshot entries are loaded; an unreadable snapshot is logged
    /// and ignored.
    #[must_use]
    pub fn persistent(capacity: u64, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = Self {
            inner: bounded(capacity),
            snapshot: Some(Arc::new(Snapshot {
                path,
                lock: Mutex::new(()),
            })),
        };
        if let Some(snapshot) = &cache.snapshot {
            match load(&snapshot.path) {
                Ok(records) => {
                    tracing::debug!(path = %snapshot.path.display(), entries = records.len(), "loaded layout snapshot");
                    for record in records {
                        cache.inner.insert(record.workspace_id.clone(), record);
                    }
                }
                Err(err) => {
                    tracing::warn!(path = %snapshot.path.display(), error = %err, "ignoring unreadable layout snapshot");
                }
            }
        }
        cache
    }

    /// Look up a workspace
    #[inline]
    #[must_use]
    pub fn get(&self, workspace: &WorkspaceId) -> Option<TemplateGridSizes> {
        self.inner.get(workspace)
    }

    /// Store a record under its own workspace id
    pub fn put(&self, record: TemplateGridSizes) {
        self.inner.insert(record.workspace_id.clone(), record);
        self.persist();
    }

    /// Remove a workspace's entry
    pub fn delete(&self, workspace: &WorkspaceId) -> Option<TemplateGridSizes> {
        let removed = self.inner.remove(workspace);
        if removed.is_some() {
            self.persist();
        }
        removed
    }

    /// Check if workspace has an entry
    #[inline]
    #[must_use]
    pub fn contains(&self, workspace: &WorkspaceId) -> bool {
        self.inner.contains_key(workspace)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    /// Check if cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, ordered by workspace id text
    #[must_use]
    pub fn entries(&self) -> Vec<TemplateGridSizes> {
        let mut records: Vec<TemplateGridSizes> = self.inner.iter().map(|(_, v)| v).collect();
        records.sort_by_key(|r| r.workspace_id.to_string());
        records
    }

    /// Snapshot file, if mirrored
    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_ref().map(|s| s.path.as_path())
    }

    /// Write the snapshot file now
    ///
    /// # Errors
    /// Returns `StoreError::Snapshot` or `StoreError::Serialization` if the
    /// file cannot be written
    pub fn save_snapshot(&self) -> StoreResult<()> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(());
        };
        let _guard = snapshot.lock.lock();
        let json = serde_json::to_vec_pretty(&self.entries())?;
        let tmp = snapshot.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &snapshot.path)?;
        Ok(())
    }

    fn persist(&self) {
        if let Err(err) = self.save_snapshot() {
            tracing::warn!(error = %err, "layout snapshot write failed");
        }
    }
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn load(path: &Path) -> StoreResult<Vec<TemplateGridSizes>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    }
}
