//! Decoded per-cell geometry handed to the rendering layer

use crate::cell_box::{ContainerSize, PixelRect};
use indexmap::IndexMap;
use panelgrid_topology::{CellId, Rect};
use serde::{Deserialize, Serialize};

/// CSS-style percentage strings for one cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssBox {
    /// e.g. `"37.50%"`
    pub top: String,
    /// e.g. `"0.00%"`
    pub left: String,
    /// e.g. `"62.00%"`
    pub width: String,
    /// e.g. `"100.00%"`
    pub height: String,
}

fn percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// Cell id → container-percent rectangle, in structural order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelFractionMap {
    topology_id: String,
    cells: IndexMap<CellId, Rect>,
}

impl PixelFractionMap {
    /// Pair cell ids with rectangles
    #[must_use]
    pub fn new(topology_id: impl Into<String>, cells: impl IntoIterator<Item = (CellId, Rect)>) -> Self {
        Self {
            topology_id: topology_id.into(),
            cells: cells.into_iter().collect(),
        }
    }

    /// Topology this map describes
    #[inline]
    #[must_use]
    pub fn topology_id(&self) -> &str {
        &self.topology_id
    }

    /// Fractions for one cell
    #[inline]
    #[must_use]
    pub fn get(&self, cell: &CellId) -> Option<&Rect> {
        self.cells.get(cell)
    }

    /// Iterate in structural order
    pub fn iter(&self) -> impl Iterator<Item = (&CellId, &Rect)> {
        self.cells.iter()
    }

    /// Rectangles in structural order
    #[must_use]
    pub fn rects(&self) -> Vec<Rect> {
        self.cells.values().copied().collect()
    }

    /// Number of cells
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if map is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Percentage strings for one cell
    #[must_use]
    pub fn css(&self, cell: &CellId) -> Option<CssBox> {
        self.cells.get(cell).map(|r| CssBox {
            top: percent(r.top),
            left: percent(r.left),
            width: percent(r.width),
            height: percent(r.height),
        })
    }

    /// Resolve to pixels for a container
    #[must_use]
    pub fn to_pixels(&self, container: ContainerSize) -> Vec<(CellId, PixelRect)> {
        self.cells
            .iter()
            .map(|(id, r)| {
                (
                    id.clone(),
                    PixelRect::new(
                        r.top / 100.0 * container.height,
                        r.left / 100.0 * container.width,
                        r.width / 100.0 * container.width,
                        r.height / 100.0 * container.height,
                    ),
                )
            })
            .collect()
    }

    /// Largest per-edge difference to another map over the same cells
    #[must_use]
    pub fn max_delta(&self, other: &Self) -> Option<f64> {
        if self.cells.len() != other.cells.len() {
            return None;
        }
        self.cells.iter().try_fold(0.0_f64, |acc, (id, rect)| {
            other.cells.get(id).map(|o| acc.max(rect.max_edge_delta(o)))
        })
    }
}
