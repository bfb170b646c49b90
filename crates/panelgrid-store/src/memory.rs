//! In-process backend

use crate::durable::{LayoutBackend, RemoteLayoutRecord};
use crate::error::BackendError;
use crate::record::DurableId;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// DashMap-backed [`LayoutBackend`] with access counters
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    records: DashMap<DurableId, RemoteLayoutRecord>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl InMemoryBackend {
    /// Create empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without counting a write
    pub fn insert(&self, id: DurableId, record: RemoteLayoutRecord) {
        self.records.insert(id, record);
    }

    /// Stored record
    #[must_use]
    pub fn record(&self, id: DurableId) -> Option<RemoteLayoutRecord> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if backend is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reads served
    #[must_use]
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Writes accepted
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl LayoutBackend for InMemoryBackend {
    async fn read(&self, id: DurableId) -> Result<Option<RemoteLayoutRecord>, BackendError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.record(id))
    }

    async fn write(&self, id: DurableId, record: RemoteLayoutRecord) -> Result<(), BackendError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.records.insert(id, record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use panelgrid_codec::RawPositionRecord;

    #[tokio::test]
    async fn counts_reads_and_writes() {
        let backend = InMemoryBackend::new();
        let record = RemoteLayoutRecord {
            topology_id: "two-column".to_string(),
            positions: RawPositionRecord::default(),
            updated_at: Utc::now(),
        };

        assert!(backend.read(DurableId(1)).await.unwrap().is_none());
        backend.write(DurableId(1), record.clone()).await.unwrap();
        assert_eq!(backend.read(DurableId(1)).await.unwrap(), Some(record));
        assert_eq!((backend.read_count(), backend.write_count()), (2, 1));
        assert_eq!(backend.len(), 1);
    }
}
