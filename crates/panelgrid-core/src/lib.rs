//! panelgrid Layout Engine
//!
//! Captures the geometry of a resized workspace, persists it through a
//! session-local cache and a durable store, and rebuilds it when the
//! workspace is reopened or receives its durable id.
//!
//! # Architecture
//!
//! ```text
//! resize stop ──► SaveScheduler ──► CoordinateSampler ──► Codec::encode
//!                      │                                      │
//!                      └──────────► LocalCache + DurableStoreGateway
//!
//! activation ──► Reconciler ──► LocalCache / DurableStoreGateway ──► Codec::decode ──► publish
//!
//! first save ──► Migrator ──► LocalCache + DurableStoreGateway
//! ```
//!
//! All failures are absorbed into outcomes and logs; the worst case is a
//! layout that falls back to topology defaults.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
mod context;
pub mod engine;
pub mod error;
pub mod migration;
pub mod persistence;
pub mod reconcile;
pub mod sampler;
pub mod slots;
pub mod surface;

// Re-exports for convenience
pub use config::EngineConfig;
pub use engine::{EngineEvent, EngineHandle, LayoutEngine};
pub use error::{EngineError, EngineResult};
pub use migration::{MigrationOutcome, Migrator};
pub use persistence::{SaveOutcome, SaveReport, SaveScheduler};
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use sampler::CoordinateSampler;
pub use slots::{WorkspaceSlot, WorkspaceSlots};
pub use surface::{CellElement, LayoutPublisher, RenderSurface};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
