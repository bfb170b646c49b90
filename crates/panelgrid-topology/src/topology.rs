//! Topology shapes and their structural split groups
//!
//! A [`Topology`] is an immutable catalog entry: an ordered list of cell ids,
//! a [`TopologyKind`] describing how the cells tile the container, and the
//! default split ratios used when nothing has been persisted.
//!
//! # Split groups
//!
//! Every kind decomposes into [`SplitGroup`]s: runs of siblings that divide
//! one axis of the container. A percentage vector is the concatenation of each
//! group's *stored* members. Outer groups of composite kinds store all but their
//! last member; the last one is the complement to 100.
//!
//! | kind | groups |
//! |------|--------|
//! | `Column { n }` | widths ×n |
//! | `Row { n }` | heights ×n |
//! | `Regions { primary, [k₀, k₁, …] }` | primary extents ×(r−1), then cross sizes ×kᵢ for every kᵢ > 1 |
//! | `Grid { rows, cols, RowMajor }` | row heights ×(rows−1), column widths ×cols |
//! | `Grid { rows, cols, ColumnMajor }` | column widths ×(cols−1), row heights ×rows |

use crate::error::{TopologyError, TopologyResult};
use crate::geometry::{offsets, Rect, ScanOrder};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Largest cell count any topology may declare
pub const MAX_CELLS: usize = 32;

/// Tolerance for default ratios summing to 100
const DEFAULT_SUM_EPSILON: f64 = 1e-6;

/// Identifier of one cell within a topology
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    /// Create cell id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier of the cell at a structural index
    #[inline]
    #[must_use]
    pub fn indexed(index: usize) -> Self {
        Self(format!("cell-{index}"))
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CellId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Container dimension divided by a split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Siblings sit side by side and share the width
    Horizontal,
    /// Siblings are stacked and share the height
    Vertical,
}

impl Axis {
    /// The perpendicular axis
    #[inline]
    #[must_use]
    pub const fn cross(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Coarse classification exposed to collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    /// Pure column split
    Column,
    /// Pure row split
    Row,
    /// Nested or grid-of-grids shape
    Composite,
}

/// Traversal order of a grid's percentage vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Major {
    /// Row heights first, then column widths
    RowMajor,
    /// Column widths first, then row heights
    ColumnMajor,
}

/// Composite shapes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Composite {
    /// Container split along `primary` into regions, each a stack of cells
    /// along the cross axis
    Regions {
        /// Axis of the outer split
        primary: Axis,
        /// Cell count of each region, in order along `primary`
        regions: Vec<usize>,
    },
    /// Grid with shared row heights and shared column widths
    Grid {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
        /// Vector traversal order
        major: Major,
    },
}

/// Closed set of topology shapes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyKind {
    /// Cells side by side
    Column {
        /// Cell count
        cells: usize,
    },
    /// Cells stacked top to bottom
    Row {
        /// Cell count
        cells: usize,
    },
    /// Nested or grid-of-grids shape
    Composite(Composite),
}

impl TopologyKind {
    /// Number of cells this shape tiles
    #[must_use]
    pub fn cell_count(&self) -> usize {
        match self {
            Self::Column { cells } | Self::Row { cells } => *cells,
            Self::Composite(Composite::Regions { regions, .. }) => regions.iter().sum(),
            Self::Composite(Composite::Grid { rows, cols, .. }) => rows * cols,
        }
    }

    /// Coarse classification
    #[inline]
    #[must_use]
    pub fn axis_kind(&self) -> AxisKind {
        match self {
            Self::Column { .. } => AxisKind::Column,
            Self::Row { .. } => AxisKind::Row,
            Self::Composite(_) => AxisKind::Composite,
        }
    }

    /// Order in which sampled boxes line up with structural cells
    #[inline]
    #[must_use]
    pub fn scan_order(&self) -> ScanOrder {
        match self {
            Self::Composite(Composite::Regions {
                primary: Axis::Horizontal,
                ..
            }) => ScanOrder::ColumnFirst,
            _ => ScanOrder::RowFirst,
        }
    }

    /// Structural split groups in vector order
    #[must_use]
    pub fn groups(&self) -> Vec<SplitGroup> {
        match self {
            Self::Column { cells } => vec![SplitGroup::full(Axis::Horizontal, *cells)],
            Self::Row { cells } => vec![SplitGroup::full(Axis::Vertical, *cells)],
            Self::Composite(Composite::Regions { primary, regions }) => {
                let mut groups = vec![SplitGroup::outer(*primary, regions.len())];
                groups.extend(
                    regions
                        .iter()
                        .filter(|&&k| k > 1)
                        .map(|&k| SplitGroup::full(primary.cross(), k)),
                );
                groups
            }
            Self::Composite(Composite::Grid { rows, cols, major }) => match major {
                Major::RowMajor => vec![
                    SplitGroup::outer(Axis::Vertical, *rows),
                    SplitGroup::full(Axis::Horizontal, *cols),
                ],
                Major::ColumnMajor => vec![
                    SplitGroup::outer(Axis::Horizontal, *cols),
                    SplitGroup::full(Axis::Vertical, *rows),
                ],
            },
        }
    }

    /// For each group member, the structural cells whose extent along the
    /// group's axis equals that member
    fn member_sources(&self) -> Vec<Vec<Vec<usize>>> {
        match self {
            Self::Column { cells } | Self::Row { cells } => {
                vec![(0..*cells).map(|i| vec![i]).collect()]
            }
            Self::Composite(Composite::Regions { regions, .. }) => {
                let starts = region_starts(regions);
                let mut sources = vec![regions
                    .iter()
                    .zip(&starts)
                    .map(|(&k, &start)| (start..start + k).collect())
                    .collect()];
                for (&k, &start) in regions.iter().zip(&starts) {
                    if k > 1 {
                        sources.push((start..start + k).map(|i| vec![i]).collect());
                    }
                }
                sources
            }
            Self::Composite(Composite::Grid { rows, cols, major }) => {
                let (rows, cols) = (*rows, *cols);
                let by_row: Vec<Vec<usize>> = (0..rows)
                    .map(|r| (0..cols).map(|c| r * cols + c).collect())
                    .collect();
                let by_col: Vec<Vec<usize>> = (0..cols)
                    .map(|c| (0..rows).map(|r| r * cols + c).collect())
                    .collect();
                match major {
                    Major::RowMajor => vec![by_row, by_col],
                    Major::ColumnMajor => vec![by_col, by_row],
                }
            }
        }
    }

    /// Lay out structural cells from fully resolved group ratios
    ///
    /// `full[g]` holds every member of group `g`, implicit tails included.
    /// Returns one rectangle per structural cell.
    #[must_use]
    pub fn layout(&self, full: &[Vec<f64>]) -> Vec<Rect> {
        match self {
            Self::Column { .. } => {
                let widths = &full[0];
                offsets(widths)
                    .into_iter()
                    .zip(widths)
                    .map(|(left, &width)| Rect::new(0.0, left, width, 100.0))
                    .collect()
            }
            Self::Row { .. } => {
                let heights = &full[0];
                offsets(heights)
                    .into_iter()
                    .zip(heights)
                    .map(|(top, &height)| Rect::new(top, 0.0, 100.0, height))
                    .collect()
            }
            Self::Composite(Composite::Regions { primary, regions }) => {
                let extents = &full[0];
                let mut rects = Vec::with_capacity(self.cell_count());
                let mut stacked = full[1..].iter();

                for ((&k, &pos), &extent) in regions.iter().zip(&offsets(extents)).zip(extents) {
                    let sizes = if k > 1 {
                        stacked.next().cloned().unwrap_or_default()
                    } else {
                        vec![100.0]
                    };
                    for (cross_pos, &size) in offsets(&sizes).into_iter().zip(&sizes) {
                        rects.push(match primary {
                            Axis::Horizontal => Rect::new(cross_pos, pos, extent, size),
                            Axis::Vertical => Rect::new(pos, cross_pos, size, extent),
                        });
                    }
                }
                rects
            }
            Self::Composite(Composite::Grid { major, .. }) => {
                let (heights, widths) = match major {
                    Major::RowMajor => (&full[0], &full[1]),
                    Major::ColumnMajor => (&full[1], &full[0]),
                };
                let tops = offsets(heights);
                let lefts = offsets(widths);
                let mut rects = Vec::with_capacity(heights.len() * widths.len());
                for (&top, &height) in tops.iter().zip(heights) {
                    for (&left, &width) in lefts.iter().zip(widths) {
                        rects.push(Rect::new(top, left, width, height));
                    }
                }
                rects
            }
        }
    }

    fn validate(&self, id: &str) -> TopologyResult<()> {
        let invalid = |reason: String| Err(TopologyError::invalid_shape(id, reason));
        match self {
            Self::Column { cells } | Self::Row { cells } if *cells < 2 => {
                return invalid(format!("needs at least 2 cells, got {cells}"));
            }
            Self::Composite(Composite::Regions { regions, .. }) => {
                if regions.len() < 2 {
                    return invalid(format!("needs at least 2 regions, got {}", regions.len()));
                }
                if regions.iter().any(|&k| k == 0) {
                    return invalid("every region needs at least one cell".to_string());
                }
            }
            Self::Composite(Composite::Grid { rows, cols, .. }) if *rows < 2 || *cols < 2 => {
                return invalid(format!("grid needs at least 2x2, got {rows}x{cols}"));
            }
            _ => {}
        }
        let count = self.cell_count();
        if count > MAX_CELLS {
            return invalid(format!("{count} cells exceeds maximum of {MAX_CELLS}"));
        }
        Ok(())
    }
}

fn region_starts(regions: &[usize]) -> Vec<usize> {
    let mut acc = 0;
    regions
        .iter()
        .map(|k| {
            let start = acc;
            acc += k;
            start
        })
        .collect()
}

/// A run of sibling extents along one axis that together cover 100%
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitGroup {
    /// Axis the siblings divide
    pub axis: Axis,
    /// Sibling count
    pub members: usize,
    /// Whether the last member is left out of the vector
    pub implicit_tail: bool,
}

impl SplitGroup {
    /// Group storing every member
    #[inline]
    #[must_use]
    pub const fn full(axis: Axis, members: usize) -> Self {
        Self {
            axis,
            members,
            implicit_tail: false,
        }
    }

    /// Outer group whose last member is the complement
    #[inline]
    #[must_use]
    pub const fn outer(axis: Axis, members: usize) -> Self {
        Self {
            axis,
            members,
            implicit_tail: true,
        }
    }

    /// Number of members written to the vector
    #[inline]
    #[must_use]
    pub const fn stored(&self) -> usize {
        if self.implicit_tail {
            self.members - 1
        } else {
            self.members
        }
    }
}

/// Ratios applied to one split group when nothing is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultSplit {
    /// Axis the ratios divide
    pub direction: Axis,
    /// Every member's share, summing to 100
    pub ratios: Vec<f64>,
}

impl DefaultSplit {
    fn equal(group: &SplitGroup) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let share = 100.0 / group.members as f64;
        Self {
            direction: group.axis,
            ratios: vec![share; group.members],
        }
    }
}

/// Immutable catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    id: String,
    cell_ids: Vec<CellId>,
    axis_kind: AxisKind,
    kind: TopologyKind,
    default_splits: Vec<DefaultSplit>,
    #[serde(skip)]
    groups: Vec<SplitGroup>,
    #[serde(skip)]
    sources: Vec<Vec<Vec<usize>>>,
}

impl Topology {
    /// Create topology with equal default ratios
    ///
    /// # Errors
    /// Returns `TopologyError::InvalidShape` if the kind cannot tile a container
    pub fn new(id: impl Into<String>, kind: TopologyKind) -> TopologyResult<Self> {
        let id = id.into();
        kind.validate(&id)?;

        let groups = kind.groups();
        let default_splits = groups.iter().map(DefaultSplit::equal).collect();
        let cell_ids = (0..kind.cell_count()).map(CellId::indexed).collect();

        Ok(Self {
            id,
            cell_ids,
            axis_kind: kind.axis_kind(),
            sources: kind.member_sources(),
            kind,
            default_splits,
            groups,
        })
    }

    /// Override the default ratios of one group
    ///
    /// # Errors
    /// Returns `TopologyError::InvalidShape` if the group does not exist, the
    /// ratio count differs from the member count, or the ratios are not
    /// positive and summing to 100
    pub fn with_default_ratios(mut self, group: usize, ratios: Vec<f64>) -> TopologyResult<Self> {
        let Some(split) = self.groups.get(group) else {
            return Err(TopologyError::invalid_shape(
                &self.id,
                format!("no split group {group}"),
            ));
        };
        if ratios.len() != split.members {
            return Err(TopologyError::invalid_shape(
                &self.id,
                format!(
                    "group {group} has {} members, got {} ratios",
                    split.members,
                    ratios.len()
                ),
            ));
        }
        let sum: f64 = ratios.iter().sum();
        if ratios.iter().any(|r| !r.is_finite() || *r <= 0.0)
            || (sum - 100.0).abs() > DEFAULT_SUM_EPSILON
        {
            return Err(TopologyError::invalid_shape(
                &self.id,
                format!("default ratios for group {group} must be positive and sum to 100"),
            ));
        }
        self.default_splits[group].ratios = ratios;
        Ok(self)
    }

    /// Catalog identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cell ids in structural order
    #[inline]
    #[must_use]
    pub fn cell_ids(&self) -> &[CellId] {
        &self.cell_ids
    }

    /// Number of cells
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cell_ids.len()
    }

    /// Structural index of a cell
    #[must_use]
    pub fn cell_index(&self, cell: &CellId) -> Option<usize> {
        self.cell_ids.iter().position(|c| c == cell)
    }

    /// Whether the cell belongs to this topology
    #[inline]
    #[must_use]
    pub fn contains_cell(&self, cell: &CellId) -> bool {
        self.cell_index(cell).is_some()
    }

    /// Shape
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &TopologyKind {
        &self.kind
    }

    /// Coarse classification
    #[inline]
    #[must_use]
    pub fn axis_kind(&self) -> AxisKind {
        self.axis_kind
    }

    /// Scan order used by the codec
    #[inline]
    #[must_use]
    pub fn scan_order(&self) -> ScanOrder {
        self.kind.scan_order()
    }

    /// Split groups in vector order
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[SplitGroup] {
        &self.groups
    }

    /// Structural cells measuring member `member` of group `group`
    #[must_use]
    pub fn member_sources(&self, group: usize, member: usize) -> &[usize] {
        self.sources
            .get(group)
            .and_then(|g| g.get(member))
            .map_or(&[], Vec::as_slice)
    }

    /// Default ratios per group
    #[inline]
    #[must_use]
    pub fn default_splits(&self) -> &[DefaultSplit] {
        &self.default_splits
    }

    /// Length of a well-formed percentage vector
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.groups.iter().map(SplitGroup::stored).sum()
    }

    /// Default ratios with implicit tails included
    #[must_use]
    pub fn default_full(&self) -> Vec<Vec<f64>> {
        self.default_splits.iter().map(|s| s.ratios.clone()).collect()
    }

    /// Default percentage vector (stored members only)
    #[must_use]
    pub fn default_vector(&self) -> Vec<f64> {
        self.groups
            .iter()
            .zip(&self.default_splits)
            .flat_map(|(group, split)| split.ratios[..group.stored()].iter().copied())
            .collect()
    }

    /// Cell rectangles for the default ratios
    #[must_use]
    pub fn default_layout(&self) -> Vec<Rect> {
        self.kind.layout(&self.default_full())
    }
}
