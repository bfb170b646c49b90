//! Seams to the rendering layer

use panelgrid_codec::{ContainerSize, PixelFractionMap, PixelRect};
use panelgrid_store::WorkspaceId;
use panelgrid_topology::{CellId, Topology};

/// One rendered cell, placeholder cells included
#[derive(Debug, Clone, PartialEq)]
pub struct CellElement {
    /// Cell the element renders
    pub cell_id: CellId,
    /// Bounding box in pixels, relative to the workspace container
    pub bounding_box: PixelRect,
}

impl CellElement {
    /// Create cell element
    #[inline]
    #[must_use]
    pub fn new(cell_id: CellId, bounding_box: PixelRect) -> Self {
        Self { cell_id, bounding_box }
    }
}

/// Live geometry of the rendered workspace
pub trait RenderSurface: Send + Sync {
    /// Current container size; zero until laid out
    fn container_size(&self) -> ContainerSize;

    /// Every cell element currently rendered for a topology
    fn cell_elements(&self, topology: &Topology) -> Vec<CellElement>;
}

/// Receiver of decoded layouts
pub trait LayoutPublisher: Send + Sync {
    /// Apply a layout to a workspace
    fn publish_layout(&self, workspace: &WorkspaceId, layout: &PixelFractionMap);
}
