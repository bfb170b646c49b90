use panelgrid_codec::{CellBox, Codec, ContainerSize, PercentageVector, PixelRect};
use panelgrid_topology::{Axis, Composite, Rect, Topology, TopologyKind, TopologyRegistry};
use proptest::prelude::*;

fn topology_ids() -> Vec<String> {
    TopologyRegistry::builtin()
        .ids()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn composite_ids() -> Vec<String> {
    TopologyRegistry::builtin()
        .iter()
        .filter(|t| matches!(t.kind(), TopologyKind::Composite(Composite::Regions { .. } | Composite::Grid { .. })))
        .map(|t| t.id().to_string())
        .collect()
}

/// Resolve raw weights into per-group ratios summing to 100
fn ratios_for(topology: &Topology, weights: &[u32]) -> Vec<Vec<f64>> {
    let mut pool = weights.iter().copied().cycle();
    topology
        .groups()
        .iter()
        .map(|group| {
            let raw: Vec<f64> = (0..group.members)
                .map(|_| f64::from(pool.next().unwrap_or(1)))
                .collect();
            let total: f64 = raw.iter().sum();
            raw.iter().map(|w| w / total * 100.0).collect()
        })
        .collect()
}

fn shuffled(boxes: Vec<CellBox>, seed: u64) -> Vec<CellBox> {
    let mut boxes = boxes;
    let len = boxes.len();
    boxes.rotate_left(usize::try_from(seed).unwrap_or(0) % len);
    if seed % 2 == 0 {
        boxes.reverse();
    }
    boxes
}

/// Expected share of each unknown member per group when only the first
/// `kept` cells are present, or `None` for fully observed groups
fn expected_fill(topology: &Topology, rects: &[Rect], kept: usize) -> Vec<Option<f64>> {
    topology
        .groups()
        .iter()
        .enumerate()
        .map(|(g, group)| {
            let mut sum = 0.0;
            let mut missing = 0usize;
            for m in 0..group.members {
                let source = topology.member_sources(g, m).iter().find(|&&i| i < kept);
                match source {
                    Some(&i) if !(group.implicit_tail && m + 1 == group.members) => {
                        sum += match group.axis {
                            Axis::Horizontal => rects[i].width,
                            Axis::Vertical => rects[i].height,
                        };
                    }
                    _ => missing += 1,
                }
            }
            #[allow(clippy::cast_precision_loss)]
            let share = (100.0 - sum) / missing as f64;
            (missing > 0).then_some(share)
        })
        .collect()
}

fn group_sums(topology: &Topology, values: &[f64]) -> Vec<(bool, f64)> {
    let mut rest = values.iter();
    topology
        .groups()
        .iter()
        .map(|g| {
            let sum: f64 = rest.by_ref().take(g.stored()).sum();
            (g.implicit_tail, sum)
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_round_trip_within_half_percent(
        id in prop::sample::select(topology_ids()),
        weights in prop::collection::vec(5u32..50, 64),
        seed in any::<u64>(),
    ) {
        let codec = Codec::builtin();
        let topology = codec.topology(&id).unwrap();
        let rects = topology.kind().layout(&ratios_for(topology, &weights));
        let boxes: Vec<CellBox> = rects.iter().copied().map(CellBox::from).collect();

        let vector = codec.encode(&id, &shuffled(boxes, seed)).unwrap();
        prop_assert_eq!(vector.len(), topology.expected_len());

        let decoded = codec.decode(&id, &vector).unwrap();
        for (original, restored) in rects.iter().zip(decoded.rects()) {
            prop_assert!(original.max_edge_delta(&restored) <= 0.5,
                "{id}: {original:?} vs {restored:?}");
        }
    }

    #[test]
    fn prop_groups_sum_to_100_after_encode(
        id in prop::sample::select(topology_ids()),
        weights in prop::collection::vec(5u32..50, 64),
    ) {
        let codec = Codec::builtin();
        let topology = codec.topology(&id).unwrap();
        let rects = topology.kind().layout(&ratios_for(topology, &weights));
        let boxes: Vec<CellBox> = rects.iter().copied().map(CellBox::from).collect();

        let vector = codec.encode(&id, &boxes).unwrap();
        for (implicit, sum) in group_sums(topology, vector.values()) {
            if implicit {
                prop_assert!(sum < 100.0);
            } else {
                prop_assert!((sum - 100.0).abs() <= 0.1, "{id}: group sums to {sum}");
            }
        }
    }

    #[test]
    fn prop_missing_columns_are_padded_equally(
        cells in 3usize..=6,
        observed in 1usize..3,
        width in 5.0f64..30.0,
    ) {
        let codec = Codec::builtin();
        let id = ["three", "four", "five", "six"][cells - 3].to_string() + "-column";
        let boxes: Vec<CellBox> = (0..observed)
            .map(|i| CellBox::new(0.0, width * i as f64, width, 100.0))
            .collect();

        let vector = codec.encode(&id, &boxes).unwrap();
        let values = vector.values();
        prop_assert_eq!(values.len(), cells);
        let padded = &values[observed..];
        for v in padded {
            prop_assert!((v - padded[0]).abs() < 1e-9);
        }
        prop_assert!((values.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn prop_missing_composite_cells_are_padded_equally(
        id in prop::sample::select(composite_ids()),
        weights in prop::collection::vec(5u32..50, 64),
        dropped in 1usize..8,
    ) {
        let codec = Codec::builtin();
        let topology = codec.topology(&id).unwrap();
        let rects = topology.kind().layout(&ratios_for(topology, &weights));
        let kept = rects.len().saturating_sub(dropped).max(1);
        let boxes: Vec<CellBox> = rects[..kept].iter().copied().map(CellBox::from).collect();

        let vector = codec.encode(&id, &boxes).unwrap();
        prop_assert_eq!(vector.len(), topology.expected_len());

        let mut rest = vector.values().iter();
        let fills = expected_fill(topology, &rects, kept);
        for (g, (group, fill)) in topology.groups().iter().zip(fills).enumerate() {
            let stored: Vec<f64> = rest.by_ref().take(group.stored()).copied().collect();
            let Some(fill) = fill else { continue };
            for (m, value) in stored.iter().enumerate() {
                let known = topology.member_sources(g, m).iter().any(|&i| i < kept);
                if !known {
                    prop_assert!((value - fill).abs() < 1e-6,
                        "{id}: group {g} member {m} is {value}, expected {fill}");
                }
            }
        }
    }

    #[test]
    fn prop_decode_never_fails_on_garbage(
        id in prop::sample::select(topology_ids()),
        values in prop::collection::vec(-50.0f64..150.0, 0..12),
    ) {
        let codec = Codec::builtin();
        let map = codec.decode(&id, &PercentageVector::new(values)).unwrap();
        let area: f64 = map.rects().iter().map(|r| r.width * r.height).sum();
        prop_assert!((area - 10_000.0).abs() < 1e-6);
    }
}

#[test]
fn scenario_two_column_drag() {
    let codec = Codec::builtin();
    let container = ContainerSize::new(1000.0, 400.0);
    let boxes: Vec<CellBox> = [(0.0, 700.0), (700.0, 300.0)]
        .into_iter()
        .filter_map(|(left, width)| {
            CellBox::from_pixels(PixelRect::new(0.0, left, width, 400.0), container)
        })
        .collect();

    let vector = codec.encode("two-column", &boxes).unwrap();
    assert_eq!(vector.values(), &[70.0, 30.0]);

    let restored = codec.decode("two-column", &vector).unwrap().to_pixels(container);
    assert!((restored[0].1.width - 700.0).abs() < 1e-9);
    assert!((restored[1].1.left - 700.0).abs() < 1e-9);
}

#[test]
fn scenario_left_large() {
    let codec = Codec::builtin();
    let boxes = [
        CellBox::new(0.0, 0.0, 50.0, 100.0),
        CellBox::new(0.0, 50.0, 50.0, 60.0),
        CellBox::new(60.0, 50.0, 50.0, 40.0),
    ];
    let vector = codec.encode("left-large", &boxes).unwrap();
    assert_eq!(vector.to_csv(), "50.00,60.00,40.00");
}

#[test]
fn scenario_grid_top_height_only() {
    let codec = Codec::builtin();
    let container = ContainerSize::new(1200.0, 800.0);
    let mut boxes = Vec::new();
    for (top, height) in [(0.0, 300.0), (300.0, 500.0)] {
        for left in [0.0, 400.0, 800.0] {
            boxes.extend(CellBox::from_pixels(
                PixelRect::new(top, left, 400.0, height),
                container,
            ));
        }
    }
    let vector = codec.encode("grid-2x3", &boxes).unwrap();
    assert_eq!(vector.len(), 4);
    assert!((vector.values()[0] - 37.5).abs() < 1e-9);
    assert!(!vector.values().iter().any(|v| (v - 62.5).abs() < 1e-9));

    let bottom = codec.decode("grid-2x3", &vector).unwrap().rects()[3];
    assert!((bottom.height - (100.0 - 37.5)).abs() < 1e-9);
}

#[test]
fn scenario_short_remote_vector() {
    let codec = Codec::builtin();
    let short = PercentageVector::new(vec![40.0, 30.0]);
    let padded = codec.normalize("grid-2x3", &short).unwrap();
    let values = padded.values();

    assert_eq!(values.len(), 4);
    assert!((values[2] - values[3]).abs() < 1e-9);
    assert!((values[1] + values[2] + values[3] - 100.0).abs() < 1e-9);
    assert_eq!(codec.decode("grid-2x3", &short).unwrap().len(), 6);
}
