//! Testing utilities for panelgrid workspace
//!
//! Scripted render surface, recording publisher and a backend with failure
//! injection.

#![allow(missing_docs)]

use async_trait::async_trait;
use panelgrid_codec::{Codec, ContainerSize, PercentageVector, PixelFractionMap};
use panelgrid_core::{CellElement, EngineConfig, LayoutEngine, LayoutPublisher, RenderSurface};
use panelgrid_store::{
    BackendError, DurableId, InMemoryBackend, LayoutBackend, RemoteLayoutRecord, WorkspaceId,
};
use panelgrid_topology::Topology;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Render surface whose geometry tests set directly
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    container: Mutex<ContainerSize>,
    elements: Mutex<Vec<CellElement>>,
}

impl ScriptedSurface {
    pub fn new(container: ContainerSize) -> Arc<Self> {
        Arc::new(Self {
            container: Mutex::new(container),
            elements: Mutex::new(Vec::new()),
        })
    }

    pub fn set_container(&self, container: ContainerSize) {
        *self.container.lock() = container;
    }

    pub fn set_elements(&self, elements: Vec<CellElement>) {
        *self.elements.lock() = elements;
    }

    /// Render the cells of `topology_id` as `values` would lay them out
    pub fn show(&self, codec: &Codec, topology_id: &str, values: &[f64]) {
        let container = *self.container.lock();
        let layout = codec
            .try_decode(topology_id, &PercentageVector::new(values.to_vec()))
            .unwrap();
        let elements = layout
            .to_pixels(container)
            .into_iter()
            .rev()
            .map(|(cell_id, rect)| CellElement::new(cell_id, rect))
            .collect();
        self.set_elements(elements);
    }
}

impl RenderSurface for ScriptedSurface {
    fn container_size(&self) -> ContainerSize {
        *self.container.lock()
    }

    fn cell_elements(&self, _topology: &Topology) -> Vec<CellElement> {
        self.elements.lock().clone()
    }
}

/// Publisher that keeps every layout it receives
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(WorkspaceId, PixelFractionMap)>>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn published(&self) -> Vec<(WorkspaceId, PixelFractionMap)> {
        self.published.lock().clone()
    }

    pub fn last(&self) -> Option<(WorkspaceId, PixelFractionMap)> {
        self.published.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.published.lock().len()
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }
}

impl LayoutPublisher for RecordingPublisher {
    fn publish_layout(&self, workspace: &WorkspaceId, layout: &PixelFractionMap) {
        self.published.lock().push((workspace.clone(), layout.clone()));
    }
}

/// In-memory backend with failure injection and latency
#[derive(Debug, Default)]
pub struct ScriptableBackend {
    inner: InMemoryBackend,
    failing_writes: AtomicU32,
    fail_reads: AtomicBool,
    read_delay: Mutex<Duration>,
}

impl ScriptableBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inner(&self) -> &InMemoryBackend {
        &self.inner
    }

    /// Fail the next `count` writes
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Delay every read by `delay` (virtual time under a paused clock)
    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock() = delay;
    }

    pub fn insert(&self, id: DurableId, record: RemoteLayoutRecord) {
        self.inner.insert(id, record);
    }

    pub fn record(&self, id: DurableId) -> Option<RemoteLayoutRecord> {
        self.inner.record(id)
    }

    pub fn write_count(&self) -> u64 {
        self.inner.write_count()
    }

    pub fn read_count(&self) -> u64 {
        self.inner.read_count()
    }
}

#[async_trait]
impl LayoutBackend for ScriptableBackend {
    async fn read(&self, id: DurableId) -> Result<Option<RemoteLayoutRecord>, BackendError> {
        let delay = *self.read_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::new("injected read failure"));
        }
        self.inner.read(id).await
    }

    async fn write(&self, id: DurableId, record: RemoteLayoutRecord) -> Result<(), BackendError> {
        let failing = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(BackendError::new("injected write failure"));
        }
        self.inner.write(id, record).await
    }
}

/// Engine wired to scripted collaborators
pub struct Harness {
    pub engine: LayoutEngine,
    pub surface: Arc<ScriptedSurface>,
    pub publisher: Arc<RecordingPublisher>,
    pub backend: Arc<ScriptableBackend>,
}

impl Harness {
    /// 1000×500 container, default config
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let surface = ScriptedSurface::new(ContainerSize::new(1000.0, 500.0));
        let publisher = RecordingPublisher::new();
        let backend = ScriptableBackend::new();
        let engine = LayoutEngine::new(
            config,
            surface.clone(),
            publisher.clone(),
            backend.clone(),
        )
        .unwrap();
        Self {
            engine,
            surface,
            publisher,
            backend,
        }
    }

    /// Render a layout on the scripted surface
    pub fn show(&self, topology_id: &str, values: &[f64]) {
        self.surface.show(self.engine.codec(), topology_id, values);
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
