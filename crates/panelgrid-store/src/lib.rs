//! panelgrid Layout Stores
//!
//! Two stores hold a workspace's [`TemplateGridSizes`]:
//!
//! - [`LocalCache`]: fast, synchronous, session-scoped (optionally mirrored to
//!   a snapshot file)
//! - [`DurableStoreGateway`]: remote, async, keyed by [`DurableId`] only, with
//!   retry on write
//!
//! Reconciling the two is the engine's job; this crate only moves records.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod durable;
pub mod error;
pub mod local;
pub mod memory;
pub mod record;
pub mod retry;

// Re-exports for convenience
pub use durable::{DurableStoreGateway, LayoutBackend, RemoteLayoutRecord};
pub use error::{BackendError, StoreError, StoreResult};
pub use local::{LocalCache, DEFAULT_CAPACITY};
pub use memory::InMemoryBackend;
pub use record::{CellSize, DurableId, ParseWorkspaceIdError, TemplateGridSizes, WorkspaceId};
pub use retry::RetryPolicy;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
