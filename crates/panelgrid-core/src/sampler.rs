//! Coordinate Sampler
//!
//! Reads every rendered cell's box and converts it to container percent.
//! Ordering is left to the codec.

use crate::error::{EngineError, EngineResult};
use crate::surface::RenderSurface;
use panelgrid_codec::CellBox;
use panelgrid_store::WorkspaceId;
use panelgrid_topology::Topology;
use std::sync::Arc;

/// Wraps a [`RenderSurface`] for one engine
#[derive(Clone)]
pub struct CoordinateSampler {
    surface: Arc<dyn RenderSurface>,
}

impl std::fmt::Debug for CoordinateSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateSampler").finish_non_exhaustive()
    }
}

impl CoordinateSampler {
    /// Create sampler
    #[inline]
    #[must_use]
    pub fn new(surface: Arc<dyn RenderSurface>) -> Self {
        Self { surface }
    }

    /// Boxes for every rendered cell of the topology
    ///
    /// Empty while the container has no size. Elements for cells outside the
    /// topology are skipped.
    #[must_use]
    pub fn sample(&self, topology: &Topology) -> Vec<CellBox> {
        let container = self.surface.container_size();
        if !container.is_laid_out() {
            return Vec::new();
        }

        let elements = self.surface.cell_elements(topology);
        let total = elements.len();
        let boxes: Vec<CellBox> = elements
            .into_iter()
            .filter(|e| topology.contains_cell(&e.cell_id))
            .filter_map(|e| CellBox::from_pixels(e.bounding_box, container))
            .collect();
        if boxes.len() < total {
            tracing::debug!(
                topology = topology.id(),
                skipped = total - boxes.len(),
                "skipped elements outside topology"
            );
        }
        boxes
    }

    /// Like [`sample`](Self::sample), but an empty sample is an error
    ///
    /// # Errors
    /// Returns `EngineError::SampleNotReady` while the container has no size
    /// or no cells are rendered
    pub fn try_sample(&self, workspace: &WorkspaceId, topology: &Topology) -> EngineResult<Vec<CellBox>> {
        let boxes = self.sample(topology);
        if boxes.is_empty() {
            return Err(EngineError::SampleNotReady {
                workspace: workspace.clone(),
            });
        }
        Ok(boxes)
    }
}
