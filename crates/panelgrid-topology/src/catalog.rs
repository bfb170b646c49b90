//! Built-in topology catalog
//!
//! 43 shapes from 2 to 32 cells. Identifiers are stable: they are persisted
//! alongside every stored layout.

use crate::error::TopologyResult;
use crate::topology::{Axis, Composite, Major, Topology, TopologyKind};

/// Default share of a large cell beside a stack
const LARGE_SHARE: f64 = 60.0;

fn column(cells: usize) -> TopologyKind {
    TopologyKind::Column { cells }
}

fn row(cells: usize) -> TopologyKind {
    TopologyKind::Row { cells }
}

fn regions(primary: Axis, regions: &[usize]) -> TopologyKind {
    TopologyKind::Composite(Composite::Regions {
        primary,
        regions: regions.to_vec(),
    })
}

fn grid(rows: usize, cols: usize, major: Major) -> TopologyKind {
    TopologyKind::Composite(Composite::Grid { rows, cols, major })
}

/// Large cell first along `primary`, then a stack of `stack` cells
fn large_first(id: &str, primary: Axis, stack: usize) -> TopologyResult<Topology> {
    Topology::new(id, regions(primary, &[1, stack]))?
        .with_default_ratios(0, vec![LARGE_SHARE, 100.0 - LARGE_SHARE])
}

/// Stack of `stack` cells first along `primary`, then the large cell
fn large_last(id: &str, primary: Axis, stack: usize) -> TopologyResult<Topology> {
    Topology::new(id, regions(primary, &[stack, 1]))?
        .with_default_ratios(0, vec![100.0 - LARGE_SHARE, LARGE_SHARE])
}

/// Build every built-in topology
///
/// # Errors
/// Returns the first shape that fails validation
pub fn builtin() -> TopologyResult<Vec<Topology>> {
    let mut topologies = vec![
        Topology::new("two-column", column(2))?,
        Topology::new("three-column", column(3))?,
        Topology::new("four-column", column(4))?,
        Topology::new("five-column", column(5))?,
        Topology::new("six-column", column(6))?,
        Topology::new("two-row", row(2))?,
        Topology::new("three-row", row(3))?,
        Topology::new("four-row", row(4))?,
        Topology::new("five-row", row(5))?,
        Topology::new("six-row", row(6))?,
    ];

    for (suffix, stack) in [("", 2), ("-4", 3), ("-5", 4)] {
        topologies.push(large_first(&format!("left-large{suffix}"), Axis::Horizontal, stack)?);
        topologies.push(large_last(&format!("right-large{suffix}"), Axis::Horizontal, stack)?);
        topologies.push(large_first(&format!("top-large{suffix}"), Axis::Vertical, stack)?);
        topologies.push(large_last(&format!("bottom-large{suffix}"), Axis::Vertical, stack)?);
    }

    topologies.extend([
        Topology::new("left-two-right-three", regions(Axis::Horizontal, &[2, 3]))?,
        Topology::new("left-three-right-two", regions(Axis::Horizontal, &[3, 2]))?,
        Topology::new("top-two-bottom-three", regions(Axis::Vertical, &[2, 3]))?,
        Topology::new("columns-2-2-2", regions(Axis::Horizontal, &[2, 2, 2]))?,
        Topology::new("rows-3-3", regions(Axis::Vertical, &[3, 3]))?,
        Topology::new("columns-3-3-3", regions(Axis::Horizontal, &[3, 3, 3]))?,
        Topology::new("sidebar-center-sidebar", regions(Axis::Horizontal, &[2, 1, 2]))?
            .with_default_ratios(0, vec![25.0, 50.0, 25.0])?,
    ]);

    for (rows, cols, major) in [
        (2, 2, Major::RowMajor),
        (2, 3, Major::RowMajor),
        (3, 2, Major::ColumnMajor),
        (2, 4, Major::RowMajor),
        (4, 2, Major::ColumnMajor),
        (3, 3, Major::RowMajor),
        (3, 4, Major::RowMajor),
        (4, 3, Major::ColumnMajor),
        (4, 4, Major::RowMajor),
        (4, 5, Major::RowMajor),
        (4, 6, Major::RowMajor),
        (5, 5, Major::RowMajor),
        (4, 8, Major::RowMajor),
        (8, 4, Major::ColumnMajor),
    ] {
        topologies.push(Topology::new(format!("grid-{rows}x{cols}"), grid(rows, cols, major))?);
    }

    Ok(topologies)
}
