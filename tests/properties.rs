//! Property-based tests for the layout engine.
//!
//! Random lane partitions and random split/remove sequences check that the
//! early-exit bounds scan matches a brute-force scan, that ties pick the
//! lower-ranked level, and that every live node has exactly one bound.

use export_graph::{
    Bound, EngineConfig, Error, Layout, LayoutEngine, Level, LevelSequences, MemoryGraph,
    MultiplicationGraph, NodeId, Relation, widest_level,
};
use proptest::prelude::*;

/// Build a graph with `lanes` lanes; `cuts[level][i]` starts a new node at
/// lane `i + 1` on that level.
fn build(lanes: usize, cuts: &[Vec<bool>; 4]) -> MemoryGraph {
    let mut builder = MemoryGraph::builder();
    for (level, level_cuts) in Level::ALL.into_iter().zip(cuts.iter()) {
        let mut width = 1;
        let mut n = 0;
        for &cut in level_cuts.iter().take(lanes - 1) {
            if cut {
                builder = builder.node(level, format!("{level}{n}"), width);
                n += 1;
                width = 1;
            } else {
                width += 1;
            }
        }
        builder = builder.node(level, format!("{level}{n}"), width);
    }
    builder.build().unwrap()
}

fn graph_strategy() -> impl Strategy<Value = MemoryGraph> {
    (1usize..10).prop_flat_map(|lanes| {
        let cuts = prop::collection::vec(any::<bool>(), lanes - 1);
        (cuts.clone(), cuts.clone(), cuts.clone(), cuts)
            .prop_map(move |(a, b, c, d)| build(lanes, &[a, b, c, d]))
    })
}

/// Every widest-level index related to `node`, by scanning the whole sequence.
fn related_columns(graph: &MemoryGraph, layout: &Layout, node: NodeId, level: Level) -> Vec<usize> {
    let widest = layout.widest_level();
    let relation = Relation::between(level, widest).unwrap();
    layout
        .sequences()
        .get(widest)
        .iter()
        .enumerate()
        .filter(|(_, w)| relation.holds(graph, **w, node).unwrap())
        .map(|(i, _)| i)
        .collect()
}

fn assert_layout_consistent(graph: &MemoryGraph, layout: &Layout) -> Result<(), TestCaseError> {
    let seqs = graph.sequences().unwrap();
    prop_assert_eq!(layout.sequences(), &seqs);
    prop_assert_eq!(layout.len(), seqs.total());

    for (level, nodes) in seqs.iter() {
        for &node in nodes {
            let bound = layout.bound(node);
            prop_assert!(bound.is_some(), "node {} has no bound", node);
            let bound = bound.unwrap();

            let columns = related_columns(graph, layout, node, level);
            match (columns.first(), columns.last()) {
                (Some(&first), Some(&last)) => {
                    prop_assert_eq!(columns.len(), last - first + 1, "run of {} not contiguous", node);
                    prop_assert_eq!(bound, Bound::new(first, last + 1));
                }
                _ => prop_assert!(bound.is_empty()),
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
enum Edit {
    Split { level: usize, pick: usize, position: f32 },
    Remove { level: usize, pick: usize },
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => (0usize..4, any::<usize>(), 0.0f32..1.0f32)
            .prop_map(|(level, pick, position)| Edit::Split { level, pick, position }),
        1 => (0usize..4, any::<usize>())
            .prop_map(|(level, pick)| Edit::Remove { level, pick }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any lane partition, each bound equals the brute-force maximal run.
    #[test]
    fn bounds_match_brute_force(graph in graph_strategy()) {
        let config = EngineConfig::default().with_contiguity_check(true);
        let engine = LayoutEngine::attach(graph.clone(), config).unwrap();
        assert_layout_consistent(&graph, engine.layout())?;
    }

    /// Ties always go to the lowest-ranked level among the maxima.
    #[test]
    fn widest_level_tie_break(widths in prop::array::uniform4(0usize..6)) {
        let mut seqs = LevelSequences::new();
        let mut next = 0u64;
        for (level, w) in Level::ALL.into_iter().zip(widths) {
            seqs.set(level, (0..w).map(|_| { next += 1; NodeId(next) }).collect());
        }

        let (level, width) = widest_level(&seqs);
        let max = widths.iter().copied().max().unwrap();
        prop_assert_eq!(width, max);
        if max == 0 {
            prop_assert_eq!(level, Level::NoLevel);
        } else {
            let first = widths.iter().position(|&w| w == max).unwrap();
            prop_assert_eq!(level, Level::ALL[first]);
        }
    }

    /// After any edit sequence, every live node has exactly one correct bound
    /// and nothing else does.
    #[test]
    fn edits_keep_layout_consistent(
        graph in graph_strategy(),
        edits in prop::collection::vec(edit_strategy(), 1..12),
    ) {
        let mut engine = LayoutEngine::attach(graph.clone(), EngineConfig::default()).unwrap();
        let mut gone = Vec::new();

        for edit in edits {
            match edit {
                Edit::Split { level, pick, position } => {
                    let nodes = graph.nodes_at(Level::ALL[level]);
                    engine.request_split(nodes[pick % nodes.len()], position).unwrap();
                }
                Edit::Remove { level, pick } => {
                    let nodes = graph.nodes_at(Level::ALL[level]);
                    let target = nodes[pick % nodes.len()];
                    match engine.request_remove(target) {
                        Ok(()) => gone.push(target),
                        Err(Error::LastNode { .. }) => prop_assert_eq!(nodes.len(), 1),
                        Err(e) => return Err(TestCaseError::fail(e.to_string())),
                    }
                }
            }
            assert_layout_consistent(&graph, engine.layout())?;
            for &node in &gone {
                prop_assert!(engine.bound(node).is_none());
            }
        }
    }

    /// Recomputing without a change yields the same layout.
    #[test]
    fn recompute_is_deterministic(graph in graph_strategy()) {
        let mut engine = LayoutEngine::attach(graph, EngineConfig::default()).unwrap();
        let first = engine.layout().clone();
        engine.recompute().unwrap();
        prop_assert_eq!(engine.layout(), &first);
    }
}
