//! Property-based invariant tests for the presentation pipeline.
//!
//! Graphs are generated as raw backend payloads, including the defects the
//! backend is known to produce (dangling edges, self-parents, parent
//! cycles, self-loops, parallel edges), and then normalized:
//!
//! 1. Normalization always yields a graph strict construction accepts.
//! 2. Every layout places each node exactly once.
//! 3. Absolute position = parent absolute + relative position.
//! 4. Layered children stay inside their group frame and never overlap
//!    their siblings.
//! 5. Filtering is idempotent.
//! 6. Impact stays inside the filtered set; active edges join impacted nodes.
//! 7. Every isolated node is connected to the focus by a directed path.

use lineage_graph::index::DependencyIndex;
use lineage_graph::{
    FilterState, LayoutConfig, LayoutMode, LineageGraph, NodeId, NodeType, RawEdge, RawGraph,
    RawNode, apply_filters, compute_layout, isolate_lineage, propagate_impact,
};
use petgraph::algo::has_path_connecting;
use proptest::prelude::*;
use std::collections::HashSet;

const EPS: f64 = 1e-6;
const TYPES: [&str; 5] = ["TABLE", "component_transform", "PACKAGE", "file", "CONTAINER"];

// ── Helpers ─────────────────────────────────────────────────────────────

fn raw_graph_strategy() -> impl Strategy<Value = RawGraph> {
    (1usize..14).prop_flat_map(|n| {
        (
            prop::collection::vec((0..TYPES.len(), prop::option::weighted(0.4, 0..n + 1)), n),
            prop::collection::vec((0..n + 1, 0..n + 1), 0..n * 2),
        )
            .prop_map(|(nodes, edges)| RawGraph {
                nodes: nodes
                    .into_iter()
                    .enumerate()
                    .map(|(i, (t, parent))| {
                        let node = RawNode::new(format!("n{i}"), TYPES[t]);
                        match parent {
                            Some(p) => node.with_parent(format!("n{p}")),
                            None => node,
                        }
                    })
                    .collect(),
                edges: edges
                    .into_iter()
                    .enumerate()
                    .map(|(i, (s, t))| RawEdge::new(format!("e{i}"), format!("n{s}"), format!("n{t}")))
                    .collect(),
            })
    })
}

fn graph_strategy() -> impl Strategy<Value = LineageGraph> {
    raw_graph_strategy().prop_map(|raw| LineageGraph::normalize(raw).graph)
}

fn state_strategy(max_nodes: usize) -> impl Strategy<Value = FilterState> {
    (
        prop::collection::vec(any::<bool>(), TYPES.len()),
        prop::option::of(0..max_nodes + 1),
        any::<bool>(),
    )
        .prop_map(|(visible, focus, impact)| {
            let mut state = FilterState::default();
            for (raw, shown) in TYPES.iter().zip(visible) {
                state.set_type_visible(NodeType::from(*raw), shown);
            }
            state.focus_node_id = focus.map(|f| NodeId::new(format!("n{f}")));
            state.set_impact_mode(impact);
            state
        })
}

fn overlaps(a: (f64, f64, f64, f64), b: (f64, f64, f64, f64)) -> bool {
    a.0 + EPS < b.0 + b.2 && b.0 + EPS < a.0 + a.2 && a.1 + EPS < b.1 + b.3 && b.1 + EPS < a.1 + a.3
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Normalization output is structurally sound
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn normalized_graph_passes_strict_construction(raw in raw_graph_strategy()) {
        let graph = LineageGraph::normalize(raw).graph;
        let rebuilt = LineageGraph::from_parts(graph.nodes().to_vec(), graph.edges().to_vec());
        prop_assert!(rebuilt.is_ok(), "strict rebuild failed: {:?}", rebuilt.err());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2-3. One placement per node, absolute = parent + relative
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn layout_places_every_node_once(graph in graph_strategy()) {
        for mode in [LayoutMode::LayeredLr, LayoutMode::LayeredTb, LayoutMode::Circular] {
            let result = compute_layout(&graph, mode, &LayoutConfig::default());
            prop_assert_eq!(result.len(), graph.node_count());

            let placed: HashSet<&NodeId> = result.placements().iter().map(|p| &p.id).collect();
            prop_assert_eq!(placed.len(), graph.node_count());
            for node in graph.nodes() {
                prop_assert!(placed.contains(&node.id), "{} not placed in {}", node.id, mode);
            }
        }
    }

    #[test]
    fn absolute_is_parent_plus_relative(graph in graph_strategy()) {
        for mode in [LayoutMode::LayeredLr, LayoutMode::LayeredTb] {
            let result = compute_layout(&graph, mode, &LayoutConfig::default());
            for placement in result.placements() {
                let absolute = result.absolute_position(&placement.id).unwrap();
                let expected = match &placement.parent_id {
                    Some(parent) => result.absolute_position(parent).unwrap() + placement.position,
                    None => placement.position,
                };
                prop_assert!((absolute.x - expected.x).abs() < EPS);
                prop_assert!((absolute.y - expected.y).abs() < EPS);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Children stay inside their frame and apart from siblings
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn siblings_fit_frame_without_overlap(graph in graph_strategy()) {
        let config = LayoutConfig::default();
        for mode in [LayoutMode::LayeredLr, LayoutMode::LayeredTb] {
            let result = compute_layout(&graph, mode, &config);
            let boxes: Vec<_> = result
                .placements()
                .iter()
                .map(|p| {
                    let at = result.absolute_position(&p.id).unwrap();
                    (p, (at.x, at.y, p.extent.width, p.extent.height))
                })
                .collect();

            for (p, bx) in &boxes {
                if let Some(parent) = &p.parent_id {
                    let frame = result.placement(parent).unwrap();
                    prop_assert!(p.position.x >= config.group_padding - EPS);
                    prop_assert!(p.position.y >= config.group_header + config.group_padding - EPS);
                    prop_assert!(p.position.x + bx.2 <= frame.extent.width + EPS);
                    prop_assert!(p.position.y + bx.3 <= frame.extent.height + EPS);
                }
            }

            for (i, (a, a_box)) in boxes.iter().enumerate() {
                for (b, b_box) in &boxes[i + 1..] {
                    if a.parent_id == b.parent_id {
                        prop_assert!(!overlaps(*a_box, *b_box), "{} overlaps {} in {}", a.id, b.id, mode);
                    }
                }
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Filtering is idempotent
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn filtering_twice_changes_nothing(graph in graph_strategy(), state in state_strategy(14)) {
        let once = apply_filters(&graph, &state);
        prop_assert_eq!(apply_filters(&once, &state), once);
    }

    #[test]
    fn filtered_edges_join_visible_nodes(graph in graph_strategy(), state in state_strategy(14)) {
        let visible = apply_filters(&graph, &state);
        for edge in visible.edges() {
            prop_assert!(visible.contains(&edge.source) && visible.contains(&edge.target));
        }
        for node in visible.nodes() {
            if let Some(parent) = &node.parent_id {
                prop_assert!(visible.contains(parent));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Impact stays inside the filtered set
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn impact_never_leaves_filtered_set(
        graph in graph_strategy(),
        state in state_strategy(14),
        source in 0usize..15,
    ) {
        let visible = apply_filters(&graph, &state);
        let impact = propagate_impact(&visible, &NodeId::new(format!("n{source}")));

        for id in &impact.nodes {
            prop_assert!(visible.contains(id));
        }
        for edge_id in &impact.active_edges {
            let edge = visible.edge(edge_id).unwrap();
            prop_assert!(impact.contains(&edge.source) && impact.contains(&edge.target));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Isolation is path-connected to the focus
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn isolated_nodes_have_a_path_to_or_from_focus(graph in graph_strategy(), focus in 0usize..14) {
        let focus = NodeId::new(format!("n{focus}"));
        let lineage = isolate_lineage(&graph, &focus);
        let nodes = lineage.node_set();

        if !graph.contains(&focus) {
            prop_assert!(nodes.is_empty());
            return Ok(());
        }
        prop_assert!(nodes.contains(&focus));

        let index = DependencyIndex::build(&graph);
        let f = index.index_of(&focus).unwrap();
        for id in &nodes {
            let x = index.index_of(id).unwrap();
            prop_assert!(
                has_path_connecting(index.graph(), x, f, None)
                    || has_path_connecting(index.graph(), f, x, None),
                "{} is not connected to {}", id, focus
            );
        }
    }
}
