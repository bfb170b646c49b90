//! Per-group measurement, padding and normalization
//!
//! Encode, wire decode and vector decode all reduce to the same step: for
//! each split group, collect the members that are known, pad the unknown ones
//! with equal shares of what is left of 100, and adjust the last member of a
//! fully observed group by the residual.

use panelgrid_topology::{Axis, Topology};

/// Width and height known for one structural cell
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CellExtent {
    pub(crate) width: Option<f64>,
    pub(crate) height: Option<f64>,
}

impl CellExtent {
    fn along(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

/// How a fully observed group is treated when it does not sum to 100
#[derive(Debug, Clone, Copy)]
pub(crate) enum SumPolicy {
    /// Absorb any residual into the last member
    Absorb,
    /// Reject sums further than this from 100
    Within(f64),
}

/// Observed members per group, read from cell extents
///
/// Implicit tails are never measured.
pub(crate) fn measure(topology: &Topology, cells: &[CellExtent]) -> Vec<Vec<Option<f64>>> {
    topology
        .groups()
        .iter()
        .enumerate()
        .map(|(g, group)| {
            (0..group.members)
                .map(|m| {
                    if group.implicit_tail && m + 1 == group.members {
                        return None;
                    }
                    topology
                        .member_sources(g, m)
                        .iter()
                        .find_map(|&i| cells.get(i).and_then(|c| c.along(group.axis)))
                })
                .collect()
        })
        .collect()
}

/// Split a flat vector into observed members per group
///
/// Entries past the end of `values` are unknown.
pub(crate) fn split(topology: &Topology, values: &[f64]) -> Vec<Vec<Option<f64>>> {
    let mut rest = values.iter().copied();
    topology
        .groups()
        .iter()
        .map(|group| {
            (0..group.members)
                .map(|m| {
                    if m < group.stored() {
                        rest.next()
                    } else {
                        None
                    }
                })
                .collect()
        })
        .collect()
}

/// Pad unknown members and normalize one group
pub(crate) fn complete_group(observed: &[Option<f64>], policy: SumPolicy) -> Result<Vec<f64>, String> {
    let sum: f64 = observed.iter().flatten().sum();
    let missing = observed.iter().filter(|v| v.is_none()).count();

    let mut full: Vec<f64> = if missing > 0 {
        #[allow(clippy::cast_precision_loss)]
        let fill = (100.0 - sum) / missing as f64;
        observed.iter().map(|v| v.unwrap_or(fill)).collect()
    } else {
        if let SumPolicy::Within(tolerance) = policy {
            if (sum - 100.0).abs() > tolerance {
                return Err(format!("group sums to {sum:.3}, expected 100"));
            }
        }
        let mut full: Vec<f64> = observed.iter().flatten().copied().collect();
        if let Some(last) = full.last_mut() {
            *last += 100.0 - sum;
        }
        full
    };

    if let Some(bad) = full.iter().find(|v| !v.is_finite() || **v <= 0.0) {
        return Err(format!("member resolves to {bad:.3}"));
    }
    // keep the sum exact after padding as well
    let residual = 100.0 - full.iter().sum::<f64>();
    if let Some(last) = full.last_mut() {
        *last += residual;
    }
    Ok(full)
}

/// Complete every group
pub(crate) fn complete(
    observed: &[Vec<Option<f64>>],
    policy: SumPolicy,
) -> Result<Vec<Vec<f64>>, String> {
    observed
        .iter()
        .enumerate()
        .map(|(g, members)| complete_group(members, policy).map_err(|e| format!("group {g}: {e}")))
        .collect()
}

/// Flatten fully resolved groups into stored vector entries
pub(crate) fn flatten(topology: &Topology, full: &[Vec<f64>]) -> Vec<f64> {
    topology
        .groups()
        .iter()
        .zip(full)
        .flat_map(|(group, members)| members[..group.stored()].iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelgrid_topology::TopologyRegistry;

    fn topology(id: &str) -> &'static Topology {
        TopologyRegistry::builtin().lookup(id).unwrap()
    }

    #[test]
    fn pads_missing_members_equally() {
        let full = complete_group(&[Some(30.0), Some(20.0), None, None], SumPolicy::Absorb).unwrap();
        assert_eq!(full, vec![30.0, 20.0, 25.0, 25.0]);
    }

    #[test]
    fn absorbs_residual_into_last() {
        let full = complete_group(&[Some(49.5), Some(49.5)], SumPolicy::Absorb).unwrap();
        assert_eq!(full, vec![49.5, 50.5]);
    }

    #[test]
    fn strict_policy_rejects_off_sums() {
        assert!(complete_group(&[Some(40.0), Some(40.0)], SumPolicy::Within(0.5)).is_err());
        let ok = complete_group(&[Some(33.33), Some(33.33), Some(33.33)], SumPolicy::Within(0.5));
        assert!((ok.unwrap()[2] - 33.34).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_positive_padding() {
        assert!(complete_group(&[Some(80.0), Some(30.0), None], SumPolicy::Absorb).is_err());
        assert!(complete_group(&[Some(100.0), None], SumPolicy::Absorb).is_err());
    }

    #[test]
    fn split_leaves_implicit_tail_unknown() {
        let observed = split(topology("left-large"), &[50.0, 60.0, 40.0]);
        assert_eq!(
            observed,
            vec![vec![Some(50.0), None], vec![Some(60.0), Some(40.0)]]
        );
    }

    #[test]
    fn split_short_vector() {
        let observed = split(topology("grid-2x3"), &[37.5, 20.0]);
        assert_eq!(observed[0], vec![Some(37.5), None]);
        assert_eq!(observed[1], vec![Some(20.0), None, None]);
    }

    #[test]
    fn flatten_drops_tails() {
        let t = topology("left-large");
        let flat = flatten(t, &[vec![50.0, 50.0], vec![60.0, 40.0]]);
        assert_eq!(flat, vec![50.0, 60.0, 40.0]);
    }

    #[test]
    fn measure_reads_group_axis() {
        let t = topology("left-large");
        let cells = [
            CellExtent { width: Some(50.0), height: Some(100.0) },
            CellExtent { width: Some(50.0), height: Some(60.0) },
            CellExtent { width: Some(50.0), height: Some(40.0) },
        ];
        assert_eq!(
            measure(t, &cells),
            vec![vec![Some(50.0), None], vec![Some(60.0), Some(40.0)]]
        );
    }
}
