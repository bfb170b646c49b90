//! panelgrid Topology Registry
//!
//! Static catalog of dashboard grid shapes. Each [`Topology`] lists its cells
//! in structural order, classifies its split structure through the closed
//! [`TopologyKind`] sum type, and carries default split ratios.
//!
//! # Example
//!
//! ```
//! use panelgrid_topology::{AxisKind, TopologyRegistry};
//!
//! let registry = TopologyRegistry::builtin();
//! let topology = registry.lookup("left-large").unwrap();
//!
//! assert_eq!(topology.cell_count(), 3);
//! assert_eq!(topology.axis_kind(), AxisKind::Composite);
//! // one primary split plus two stacked heights
//! assert_eq!(topology.expected_len(), 3);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod catalog;
pub mod error;
pub mod geometry;
pub mod registry;
pub mod topology;

// Re-exports for convenience
pub use error::{TopologyError, TopologyResult};
pub use geometry::{scan_sort, Rect, ScanOrder, DEFAULT_ROW_TOLERANCE};
pub use registry::TopologyRegistry;
pub use topology::{
    Axis, AxisKind, CellId, Composite, DefaultSplit, Major, SplitGroup, Topology, TopologyKind,
    MAX_CELLS,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
