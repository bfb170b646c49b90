//! Layout engine facade and event loop
//!
//! [`LayoutEngine`] wires the registry, codec, stores and the three
//! controllers together and exposes the external events as async methods.
//! [`LayoutEngine::spawn`] moves it onto a task fed by an mpsc channel, so
//! hosts can fire events without awaiting them.

use crate::config::EngineConfig;
use crate::context::EngineContext;
use crate::error::{EngineError, EngineResult};
use crate::migration::{MigrationOutcome, Migrator};
use crate::persistence::{SaveOutcome, SaveReport, SaveScheduler};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::sampler::CoordinateSampler;
use crate::slots::{WorkspaceSlot, WorkspaceSlots};
use crate::surface::{LayoutPublisher, RenderSurface};
use panelgrid_codec::Codec;
use panelgrid_store::{DurableStoreGateway, LayoutBackend, LocalCache, WorkspaceId};
use panelgrid_topology::TopologyRegistry;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

const EVENT_CAPACITY: usize = 256;

/// Events raised by the host
#[derive(Debug)]
pub enum EngineEvent {
    /// A workspace became active
    Activated {
        /// Workspace shown
        workspace: WorkspaceId,
        /// Its topology
        topology_id: String,
        /// Receives the outcome
        reply: Option<oneshot::Sender<ReconcileOutcome>>,
    },
    /// A resize gesture finished
    ResizeStopped {
        /// Workspace resized
        workspace: WorkspaceId,
        /// Its topology
        topology_id: String,
    },
    /// A workspace received its durable id
    Saved {
        /// Provisional id
        old: WorkspaceId,
        /// Durable id
        new: WorkspaceId,
        /// Receives the outcome
        reply: Option<oneshot::Sender<MigrationOutcome>>,
    },
    /// Flush pending saves and stop
    Shutdown,
}

/// Layout persistence and reconstruction engine
#[derive(Clone)]
pub struct LayoutEngine {
    ctx: Arc<EngineContext>,
    reconciler: Reconciler,
    saver: SaveScheduler,
    migrator: Migrator,
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("config", &self.ctx.config)
            .field("local", &self.ctx.local)
            .finish_non_exhaustive()
    }
}

impl LayoutEngine {
    /// Engine over the built-in topology catalog
    ///
    /// # Errors
    /// Returns `EngineError::Config` if the configuration is invalid
    pub fn new(
        config: EngineConfig,
        surface: Arc<dyn RenderSurface>,
        publisher: Arc<dyn LayoutPublisher>,
        backend: Arc<dyn LayoutBackend>,
    ) -> EngineResult<Self> {
        Self::with_registry(
            config,
            Arc::new(TopologyRegistry::builtin().clone()),
            surface,
            publisher,
            backend,
        )
    }

    /// Engine over a custom topology registry
    ///
    /// # Errors
    /// Returns `EngineError::Config` if the configuration is invalid
    pub fn with_registry(
        config: EngineConfig,
        registry: Arc<TopologyRegistry>,
        surface: Arc<dyn RenderSurface>,
        publisher: Arc<dyn LayoutPublisher>,
        backend: Arc<dyn LayoutBackend>,
    ) -> EngineResult<Self> {
        config.validate()?;
        if registry.is_empty() {
            return Err(EngineError::config("topology registry is empty"));
        }

        let codec = Arc::new(Codec::new(registry, config.codec_config()));
        let local = match &config.local_snapshot_path {
            Some(path) => LocalCache::persistent(config.local_cache_capacity, path),
            None => LocalCache::new(config.local_cache_capacity),
        };
        let durable = DurableStoreGateway::new(backend, Arc::clone(&codec)).with_retry(config.retry.clone());

        let ctx = Arc::new(EngineContext {
            config,
            codec,
            local,
            durable,
            sampler: CoordinateSampler::new(surface),
            publisher,
            slots: WorkspaceSlots::new(),
        });
        let saver = SaveScheduler::new(Arc::clone(&ctx));
        Ok(Self {
            reconciler: Reconciler::new(Arc::clone(&ctx)),
            migrator: Migrator::new(Arc::clone(&ctx), saver.clone()),
            saver,
            ctx,
        })
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }

    /// Codec in use
    #[must_use]
    pub fn codec(&self) -> &Codec {
        &self.ctx.codec
    }

    /// Local cache
    #[must_use]
    pub fn local(&self) -> &LocalCache {
        &self.ctx.local
    }

    /// Durable store gateway
    #[must_use]
    pub fn durable(&self) -> &DurableStoreGateway {
        &self.ctx.durable
    }

    /// Coordination state for a workspace, if any
    #[must_use]
    pub fn slot(&self, workspace: &WorkspaceId) -> Option<Arc<WorkspaceSlot>> {
        self.ctx.slots.get(workspace)
    }

    /// Stream of finished save attempts
    #[must_use]
    pub fn subscribe_saves(&self) -> broadcast::Receiver<SaveReport> {
        self.saver.subscribe()
    }

    /// A workspace became active
    pub async fn on_workspace_activated(&self, workspace: &WorkspaceId, topology_id: &str) -> ReconcileOutcome {
        self.reconciler.reconcile(workspace, topology_id).await
    }

    /// A resize gesture finished
    pub fn on_resize_stop(&self, workspace: WorkspaceId, topology_id: impl Into<String>) {
        self.saver.on_resize_stop(workspace, topology_id);
    }

    /// A workspace received its durable id
    pub async fn on_workspace_saved(&self, old: &WorkspaceId, new: &WorkspaceId) -> MigrationOutcome {
        self.migrator.migrate(old, new).await
    }

    /// Run a workspace's pending save now
    pub async fn flush(&self, workspace: &WorkspaceId) -> Option<SaveOutcome> {
        self.saver.flush(workspace).await
    }

    /// Run every pending save now
    pub async fn flush_all(&self) -> Vec<(WorkspaceId, SaveOutcome)> {
        self.saver.flush_all().await
    }

    /// Move the engine onto its own task
    #[must_use]
    pub fn spawn(self) -> EngineHandle {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        let task = tokio::spawn(self.run(rx));
        EngineHandle { tx, task }
    }

    async fn run(self, mut rx: mpsc::Receiver<EngineEvent>) {
        tracing::debug!("layout engine started");
        while let Some(event) = rx.recv().await {
            match event {
                EngineEvent::Activated {
                    workspace,
                    topology_id,
                    reply,
                } => {
                    let outcome = self.on_workspace_activated(&workspace, &topology_id).await;
                    if let Some(reply) = reply {
                        let _ = reply.send(outcome);
                    }
                }
                EngineEvent::ResizeStopped {
                    workspace,
                    topology_id,
                } => self.on_resize_stop(workspace, topology_id),
                EngineEvent::Saved { old, new, reply } => {
                    let outcome = self.on_workspace_saved(&old, &new).await;
                    if let Some(reply) = reply {
                        let _ = reply.send(outcome);
                    }
                }
                EngineEvent::Shutdown => break,
            }
        }
        let flushed = self.flush_all().await;
        tracing::debug!(flushed = flushed.len(), "layout engine stopped");
    }
}

/// Sender side of a spawned engine
#[derive(Debug)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineEvent>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Raw event sender
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<EngineEvent> {
        self.tx.clone()
    }

    /// Activate a workspace and wait for the outcome
    ///
    /// # Errors
    /// Returns `EngineError::Shutdown` if the engine has stopped
    pub async fn activate(&self, workspace: WorkspaceId, topology_id: impl Into<String>) -> EngineResult<ReconcileOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineEvent::Activated {
            workspace,
            topology_id: topology_id.into(),
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Report a finished resize gesture
    ///
    /// # Errors
    /// Returns `EngineError::Shutdown` if the engine has stopped
    pub async fn resize_stopped(&self, workspace: WorkspaceId, topology_id: impl Into<String>) -> EngineResult<()> {
        self.send(EngineEvent::ResizeStopped {
            workspace,
            topology_id: topology_id.into(),
        })
        .await
    }

    /// Report a first save and wait for the migration outcome
    ///
    /// # Errors
    /// Returns `EngineError::Shutdown` if the engine has stopped
    pub async fn saved(&self, old: WorkspaceId, new: WorkspaceId) -> EngineResult<MigrationOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineEvent::Saved {
            old,
            new,
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Flush pending saves and wait for the loop to exit
    ///
    /// # Errors
    /// Returns `EngineError::Shutdown` if the loop had already stopped
    pub async fn shutdown(self) -> EngineResult<()> {
        self.send(EngineEvent::Shutdown).await?;
        self.task.await.map_err(|_| EngineError::Shutdown)
    }

    async fn send(&self, event: EngineEvent) -> EngineResult<()> {
        self.tx.send(event).await.map_err(|_| EngineError::Shutdown)
    }
}
