//! Topology-aware encode/decode
//!
//! # Encode
//! 1. Drop boxes that fail the [`CellBox`] invariant
//! 2. Sort into the topology's scan order; position *i* is structural cell *i*
//! 3. Read each split group's members off the axis it divides
//! 4. Pad unobserved members with equal shares, absorb the residual
//!
//! # Decode
//! 1. Split the vector into groups, padding a short vector the same way
//! 2. Validate (finite, positive, sums within tolerance)
//! 3. Lay out cells from the resolved groups

use crate::cell_box::CellBox;
use crate::error::{CodecError, CodecResult};
use crate::fraction::PixelFractionMap;
use crate::groups::{self, CellExtent, SumPolicy};
use crate::raw::RawPositionRecord;
use crate::vector::PercentageVector;
use panelgrid_topology::{scan_sort, Rect, Topology, TopologyRegistry, DEFAULT_ROW_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Codec tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Edges closer than this (container percent) share a scan band
    pub row_tolerance: f64,
    /// Allowed distance from 100 for a stored group's sum
    pub sum_tolerance: f64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            sum_tolerance: 0.5,
        }
    }
}

/// Percentage codec bound to a topology registry
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<TopologyRegistry>,
    config: CodecConfig,
}

impl Codec {
    /// Create codec over a registry
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<TopologyRegistry>, config: CodecConfig) -> Self {
        Self { registry, config }
    }

    /// Codec over the built-in catalog with default tolerances
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(Arc::new(TopologyRegistry::builtin().clone()), CodecConfig::default())
    }

    /// Replace tolerances
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Registry in use
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &TopologyRegistry {
        &self.registry
    }

    /// Tolerances in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Look up a topology
    ///
    /// # Errors
    /// Returns `CodecError::UnknownTopology` for ids outside the registry
    pub fn topology(&self, topology_id: &str) -> CodecResult<&Topology> {
        Ok(self.registry.lookup(topology_id)?)
    }

    /// Encode sampled boxes into a percentage vector
    ///
    /// Boxes arrive in any order; absent trailing cells are padded.
    ///
    /// # Errors
    /// - `CodecError::UnknownTopology` for ids outside the registry
    /// - `CodecError::BoxCount` if there are more boxes than cells
    /// - `CodecError::MalformedVector` if observed extents leave no room for
    ///   the padded ones
    pub fn encode(&self, topology_id: &str, boxes: &[CellBox]) -> CodecResult<PercentageVector> {
        let topology = self.topology(topology_id)?;

        let accepted: Vec<Rect> = boxes
            .iter()
            .filter(|b| b.is_valid())
            .map(CellBox::as_rect)
            .collect();
        if accepted.len() < boxes.len() {
            tracing::debug!(
                topology = topology_id,
                dropped = boxes.len() - accepted.len(),
                "dropped degenerate cell boxes"
            );
        }
        if accepted.len() > topology.cell_count() {
            return Err(CodecError::BoxCount {
                topology: topology_id.to_string(),
                expected: topology.cell_count(),
                actual: accepted.len(),
            });
        }

        let cells: Vec<CellExtent> =
            scan_sort(&accepted, topology.scan_order(), self.config.row_tolerance)
                .into_iter()
                .map(|i| CellExtent {
                    width: Some(accepted[i].width),
                    height: Some(accepted[i].height),
                })
                .collect();

        let observed = groups::measure(topology, &cells);
        let full = groups::complete(&observed, SumPolicy::Absorb)
            .map_err(|reason| CodecError::malformed(topology_id, reason))?;
        Ok(PercentageVector::new(groups::flatten(topology, &full)))
    }

    /// Pad a short vector and normalize every group
    ///
    /// # Errors
    /// - `CodecError::UnknownTopology` for ids outside the registry
    /// - `CodecError::MalformedVector` if any invariant fails
    pub fn normalize(&self, topology_id: &str, vector: &PercentageVector) -> CodecResult<PercentageVector> {
        let topology = self.topology(topology_id)?;
        let full = self.resolve(topology, vector)?;
        Ok(PercentageVector::new(groups::flatten(topology, &full)))
    }

    /// Decode a vector into per-cell fractions, failing on malformed input
    ///
    /// # Errors
    /// - `CodecError::UnknownTopology` for ids outside the registry
    /// - `CodecError::MalformedVector` if any invariant fails
    pub fn try_decode(&self, topology_id: &str, vector: &PercentageVector) -> CodecResult<PixelFractionMap> {
        let topology = self.topology(topology_id)?;
        let full = self.resolve(topology, vector)?;
        Ok(fraction_map(topology, &full))
    }

    /// Decode a vector, falling back to topology defaults when malformed
    ///
    /// # Errors
    /// Returns `CodecError::UnknownTopology` for ids outside the registry
    pub fn decode(&self, topology_id: &str, vector: &PercentageVector) -> CodecResult<PixelFractionMap> {
        match self.try_decode(topology_id, vector) {
            Err(err @ CodecError::MalformedVector { .. }) => {
                tracing::warn!(topology = topology_id, error = %err, "falling back to default layout");
                self.defaults(topology_id)
            }
            other => other,
        }
    }

    /// Default per-cell fractions for a topology
    ///
    /// # Errors
    /// Returns `CodecError::UnknownTopology` for ids outside the registry
    pub fn defaults(&self, topology_id: &str) -> CodecResult<PixelFractionMap> {
        let topology = self.topology(topology_id)?;
        Ok(fraction_map(topology, &topology.default_full()))
    }

    /// Default percentage vector for a topology
    ///
    /// # Errors
    /// Returns `CodecError::UnknownTopology` for ids outside the registry
    pub fn default_vector(&self, topology_id: &str) -> CodecResult<PercentageVector> {
        Ok(PercentageVector::new(self.topology(topology_id)?.default_vector()))
    }

    /// Derive a percentage vector from a wire record's `Width`/`Height`
    ///
    /// # Errors
    /// - `CodecError::UnknownTopology` for ids outside the registry
    /// - `CodecError::MalformedVector` for unparsable entries, more entries than
    ///   cells, or sums outside tolerance
    pub fn from_raw(&self, topology_id: &str, raw: &RawPositionRecord) -> CodecResult<PercentageVector> {
        let topology = self.topology(topology_id)?;
        let malformed = |reason: String| CodecError::malformed(topology_id, reason);

        let widths = raw.widths().map_err(&malformed)?;
        let heights = raw.heights().map_err(&malformed)?;
        let count = topology.cell_count();
        if widths.len() > count || heights.len() > count {
            return Err(malformed(format!(
                "{} widths and {} heights for {count} cells",
                widths.len(),
                heights.len()
            )));
        }

        let cells: Vec<CellExtent> = (0..count)
            .map(|i| CellExtent {
                width: widths.get(i).copied(),
                height: heights.get(i).copied(),
            })
            .collect();
        let observed = groups::measure(topology, &cells);
        let full = groups::complete(&observed, SumPolicy::Within(self.config.sum_tolerance))
            .map_err(malformed)?;
        Ok(PercentageVector::new(groups::flatten(topology, &full)))
    }

    /// Serialize a vector into the wire record
    ///
    /// # Errors
    /// - `CodecError::UnknownTopology` for ids outside the registry
    /// - `CodecError::MalformedVector` if the vector cannot be decoded
    pub fn to_raw(&self, topology_id: &str, vector: &PercentageVector) -> CodecResult<RawPositionRecord> {
        let topology = self.topology(topology_id)?;
        let full = self.resolve(topology, vector)?;
        Ok(RawPositionRecord::from_rects(&topology.kind().layout(&full)))
    }

    fn resolve(&self, topology: &Topology, vector: &PercentageVector) -> CodecResult<Vec<Vec<f64>>> {
        let malformed = |reason: String| CodecError::malformed(topology.id(), reason);

        if let Some(pos) = vector.values().iter().position(|v| !v.is_finite()) {
            return Err(malformed(format!("entry {pos} is not finite")));
        }
        let expected = topology.expected_len();
        if vector.len() > expected {
            return Err(malformed(format!(
                "{} entries, expected {expected}",
                vector.len()
            )));
        }

        let observed = groups::split(topology, vector.values());
        groups::complete(&observed, SumPolicy::Within(self.config.sum_tolerance)).map_err(malformed)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::builtin()
    }
}

fn fraction_map(topology: &Topology, full: &[Vec<f64>]) -> PixelFractionMap {
    PixelFractionMap::new(
        topology.id(),
        topology
            .cell_ids()
            .iter()
            .cloned()
            .zip(topology.kind().layout(full)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_box::{ContainerSize, PixelRect};
    use panelgrid_topology::CellId;
    use pretty_assertions::assert_eq;

    fn approx(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{actual:?} vs {expected:?}");
        }
    }

    fn px(container: ContainerSize, top: f64, left: f64, width: f64, height: f64) -> CellBox {
        CellBox::from_pixels(PixelRect::new(top, left, width, height), container).unwrap()
    }

    #[test]
    fn two_column_scenario() {
        let codec = Codec::builtin();
        let container = ContainerSize::new(1000.0, 600.0);
        let boxes = [
            px(container, 0.0, 700.0, 300.0, 600.0),
            px(container, 0.0, 0.0, 700.0, 600.0),
        ];
        let vector = codec.encode("two-column", &boxes).unwrap();
        approx(vector.values(), &[70.0, 30.0]);

        let map = codec.decode("two-column", &vector).unwrap();
        let left = map.css(&CellId::indexed(0)).unwrap();
        let right = map.css(&CellId::indexed(1)).unwrap();
        assert_eq!((left.width.as_str(), right.width.as_str()), ("70.00%", "30.00%"));
    }

    #[test]
    fn left_large_scenario() {
        let codec = Codec::builtin();
        let container = ContainerSize::new(1000.0, 500.0);
        let boxes = [
            px(container, 300.0, 500.0, 500.0, 200.0),
            px(container, 0.0, 0.0, 500.0, 500.0),
            px(container, 0.0, 500.0, 500.0, 300.0),
        ];
        let vector = codec.encode("left-large", &boxes).unwrap();
        approx(vector.values(), &[50.0, 60.0, 40.0]);
    }

    #[test]
    fn grid_2x3_uneven_rows() {
        let codec = Codec::builtin();
        let container = ContainerSize::new(900.0, 800.0);
        let mut boxes = Vec::new();
        for (top, height) in [(0.0, 300.0), (300.0, 500.0)] {
            for left in [0.0, 300.0, 600.0] {
                boxes.push(px(container, top, left, 300.0, height));
            }
        }
        let vector = codec.encode("grid-2x3", &boxes).unwrap();
        assert_eq!(vector.len(), 4);
        assert!((vector.values()[0] - 37.5).abs() < 1e-9);

        let map = codec.decode("grid-2x3", &vector).unwrap();
        let bottom = map.get(&CellId::indexed(4)).unwrap();
        assert!((bottom.height - 62.5).abs() < 1e-9);
        assert!((bottom.top - 37.5).abs() < 1e-9);
    }

    #[test]
    fn right_large_primary_is_stack_width() {
        let codec = Codec::builtin();
        let boxes = [
            CellBox::new(0.0, 0.0, 35.0, 70.0),
            CellBox::new(70.0, 0.0, 35.0, 30.0),
            CellBox::new(0.0, 35.0, 65.0, 100.0),
        ];
        let vector = codec.encode("right-large", &boxes).unwrap();
        approx(vector.values(), &[35.0, 70.0, 30.0]);
    }

    #[test]
    fn short_box_list_is_padded() {
        let codec = Codec::builtin();
        let boxes = [
            CellBox::new(0.0, 0.0, 40.0, 100.0),
            CellBox::new(0.0, 40.0, 20.0, 100.0),
        ];
        let vector = codec.encode("four-column", &boxes).unwrap();
        approx(vector.values(), &[40.0, 20.0, 20.0, 20.0]);
    }

    #[test]
    fn degenerate_boxes_are_dropped_not_zero_filled() {
        let codec = Codec::builtin();
        let boxes = [
            CellBox::new(0.0, 0.0, 60.0, 100.0),
            CellBox::new(0.0, 60.0, 0.0, 100.0),
        ];
        let vector = codec.encode("two-column", &boxes).unwrap();
        approx(vector.values(), &[60.0, 40.0]);
    }

    #[test]
    fn too_many_boxes() {
        let codec = Codec::builtin();
        let boxes = [CellBox::new(0.0, 0.0, 33.0, 100.0); 3];
        assert!(matches!(
            codec.encode("two-column", &boxes),
            Err(CodecError::BoxCount { expected: 2, actual: 3, .. })
        ));
    }

    #[test]
    fn unknown_topology() {
        let codec = Codec::builtin();
        let v = PercentageVector::new(vec![50.0, 50.0]);
        assert_eq!(
            codec.decode("hexagon", &v),
            Err(CodecError::UnknownTopology("hexagon".to_string()))
        );
        assert!(codec.encode("hexagon", &[]).is_err());
    }

    #[test]
    fn short_vector_decodes_with_padding() {
        let codec = Codec::builtin();
        let short = PercentageVector::new(vec![30.0, 20.0]);
        let normalized = codec.normalize("four-column", &short).unwrap();
        approx(normalized.values(), &[30.0, 20.0, 25.0, 25.0]);
        let map = codec.try_decode("four-column", &short).unwrap();
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn malformed_vectors_fall_back_to_defaults() {
        let codec = Codec::builtin();
        let defaults = codec.defaults("two-column").unwrap();
        for bad in [
            vec![f64::NAN, 50.0],
            vec![50.0, 50.0, 10.0],
            vec![80.0, 80.0],
            vec![120.0],
        ] {
            let v = PercentageVector::new(bad);
            assert!(codec.try_decode("two-column", &v).unwrap_err().is_malformed());
            assert_eq!(codec.decode("two-column", &v).unwrap(), defaults);
        }
    }

    #[test]
    fn implicit_group_cannot_reach_100() {
        let codec = Codec::builtin();
        let v = PercentageVector::new(vec![100.0, 50.0, 50.0]);
        assert!(codec.try_decode("left-large", &v).unwrap_err().is_malformed());
    }

    #[test]
    fn raw_round_trip_uses_sizes_only() {
        let codec = Codec::builtin();
        let vector = PercentageVector::new(vec![50.0, 60.0, 40.0]);
        let mut raw = codec.to_raw("left-large", &vector).unwrap();
        assert_eq!(raw.width, "50.00,50.00,50.00");
        assert_eq!(raw.height, "100.00,60.00,40.00");

        raw.top = String::new();
        raw.left = "garbage".to_string();
        let back = codec.from_raw("left-large", &raw).unwrap();
        approx(back.values(), &[50.0, 60.0, 40.0]);
    }

    #[test]
    fn legacy_raw_with_thirds() {
        let codec = Codec::builtin();
        let raw = RawPositionRecord {
            width: "33.33,33.33,33.33".to_string(),
            height: "100,100,100".to_string(),
            ..Default::default()
        };
        let vector = codec.from_raw("three-column", &raw).unwrap();
        let sum: f64 = vector.values().iter().sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn raw_with_too_many_entries_is_malformed() {
        let codec = Codec::builtin();
        let raw = RawPositionRecord {
            width: "25,25,25,25".to_string(),
            ..Default::default()
        };
        assert!(codec.from_raw("two-column", &raw).unwrap_err().is_malformed());
    }

    #[test]
    fn raw_with_blank_height_pads_rows() {
        let codec = Codec::builtin();
        let raw = RawPositionRecord {
            width: "40,40,40,40,40,40".to_string(),
            ..Default::default()
        };
        // grid-2x3: widths read from the first row, heights unknown
        let err = codec.from_raw("grid-2x3", &raw).unwrap_err();
        assert!(err.is_malformed());

        let raw = RawPositionRecord {
            width: "30,30,40,30,30,40".to_string(),
            ..Default::default()
        };
        let vector = codec.from_raw("grid-2x3", &raw).unwrap();
        approx(vector.values(), &[50.0, 30.0, 30.0, 40.0]);
    }
}
