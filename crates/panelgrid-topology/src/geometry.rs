//! Container-relative rectangles and canonical scan ordering
//!
//! All coordinates are percentages of the workspace container (0–100), with
//! the origin at the container's top-left corner.

use serde::{Deserialize, Serialize};

/// Default tolerance (in container percent) for treating two edges as aligned
pub const DEFAULT_ROW_TOLERANCE: f64 = 0.5;

/// Axis-aligned rectangle in container percent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Distance from the container's top edge
    pub top: f64,
    /// Distance from the container's left edge
    pub left: f64,
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl Rect {
    /// Create a rectangle
    #[inline]
    #[must_use]
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Right edge
    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Largest per-edge distance to another rectangle
    #[must_use]
    pub fn max_edge_delta(&self, other: &Rect) -> f64 {
        [
            (self.top - other.top).abs(),
            (self.left - other.left).abs(),
            (self.width - other.width).abs(),
            (self.height - other.height).abs(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

/// Traversal order used to line up sampled boxes with structural cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOrder {
    /// Cluster by top edge, then left ascending within a row
    #[default]
    RowFirst,
    /// Cluster by left edge, then top ascending within a column
    ColumnFirst,
}

/// Sort rectangle indices into scan order
///
/// Edges whose distance to the first edge of the current band is within
/// `tolerance` belong to the same band.
#[must_use]
pub fn scan_sort(rects: &[Rect], order: ScanOrder, tolerance: f64) -> Vec<usize> {
    let (band, within): (fn(&Rect) -> f64, fn(&Rect) -> f64) = match order {
        ScanOrder::RowFirst => (|r| r.top, |r| r.left),
        ScanOrder::ColumnFirst => (|r| r.left, |r| r.top),
    };

    let mut indices: Vec<usize> = (0..rects.len()).collect();
    indices.sort_by(|&a, &b| {
        band(&rects[a])
            .total_cmp(&band(&rects[b]))
            .then(within(&rects[a]).total_cmp(&within(&rects[b])))
    });

    let mut ordered = Vec::with_capacity(indices.len());
    let mut current: Vec<usize> = Vec::new();
    let mut band_start = 0.0;

    for idx in indices {
        let edge = band(&rects[idx]);
        if !current.is_empty() && (edge - band_start).abs() > tolerance {
            current.sort_by(|&a, &b| within(&rects[a]).total_cmp(&within(&rects[b])));
            ordered.append(&mut current);
        }
        if current.is_empty() {
            band_start = edge;
        }
        current.push(idx);
    }
    current.sort_by(|&a, &b| within(&rects[a]).total_cmp(&within(&rects[b])));
    ordered.append(&mut current);

    ordered
}

/// Running offsets for a sequence of extents
pub(crate) fn offsets(sizes: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    sizes
        .iter()
        .map(|size| {
            let start = acc;
            acc += size;
            start
        })
        .collect()
}
