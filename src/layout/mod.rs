//! Table layout: column bounds for every node of the export graph.
//!
//! The widest level's sequence is the column index space. Every node spans
//! the contiguous run of widest-level nodes it is related to:
//!
//! ```text
//! widest = Filenames
//! Formats:    [ WAV          ][ FLAC ]     WAV  = [0, 2)   FLAC = [2, 3)
//! Filenames:  [ a    ][ b    ][ c    ]     a    = [0, 1)   ...
//! ```

pub mod engine;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::graph::MultiplicationGraph;
use crate::model::*;
use crate::{Error, Result};

pub use engine::{LayoutEngine, LayoutListener};

// ============================================================================
// Configuration
// ============================================================================

/// Layout engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Keep scanning past the end of a node's run and fail the pass if the
    /// node is related to another widest-level node further right.
    /// Off: the scan stops at the end of the first run.
    pub verify_contiguity: bool,
}

impl EngineConfig {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_contiguity_check(mut self, on: bool) -> Self {
        self.verify_contiguity = on;
        self
    }
}

// ============================================================================
// Relation dispatch
// ============================================================================

/// Which predicate a bounds scan applies to `(widest[i], node)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// The widest level ranks above the node: `widest[i].is_ancestor_of(node)`.
    Ancestor,
    /// The widest level ranks below the node: `widest[i].is_descendant_of(node)`.
    Descendant,
    /// Same level: `widest[i].equals(node)`.
    Equal,
}

impl Relation {
    /// Select the relation for a node at `current` against `widest`.
    /// `None` if either is `NoLevel`.
    pub fn between(current: Level, widest: Level) -> Option<Relation> {
        if current.is_none() || widest.is_none() {
            return None;
        }
        Some(match widest.cmp(&current) {
            std::cmp::Ordering::Less => Relation::Ancestor,
            std::cmp::Ordering::Greater => Relation::Descendant,
            std::cmp::Ordering::Equal => Relation::Equal,
        })
    }

    /// Evaluate the relation for one widest-level node against `node`.
    pub fn holds<G>(self, graph: &G, widest_node: NodeId, node: NodeId) -> Result<bool>
    where
        G: MultiplicationGraph + ?Sized,
    {
        match self {
            Relation::Ancestor => graph.is_ancestor_of(widest_node, node),
            Relation::Descendant => graph.is_descendant_of(widest_node, node),
            Relation::Equal => graph.equals(widest_node, node),
        }
    }
}

// ============================================================================
// Widest level
// ============================================================================

/// The level with the most nodes, and its width.
///
/// Levels are probed in ascending rank and only a strictly larger width
/// replaces the current maximum, so ties go to the lower-ranked level.
/// All levels empty gives `(NoLevel, 0)`.
pub fn widest_level(sequences: &LevelSequences) -> (Level, usize) {
    let mut max_level = Level::NoLevel;
    let mut max_width = 0;
    for (level, nodes) in sequences.iter() {
        if nodes.len() > max_width {
            max_level = level;
            max_width = nodes.len();
        }
    }
    (max_level, max_width)
}

// ============================================================================
// Bounds
// ============================================================================

/// Column bounds of `node` (at `current_level`) over `widest`, the sequence
/// of `widest_level`.
///
/// Single left-to-right scan: skip the unrelated prefix, extend over the
/// related run, stop at the first unrelated node after it. The graph must
/// keep each node's related run contiguous; with `verify_contiguity` the
/// rest of the sequence is checked and a second run is an error, otherwise
/// it is silently ignored. No related node gives `[len, len)`.
pub fn compute_bound<G>(
    graph: &G,
    node: NodeId,
    current_level: Level,
    widest_level: Level,
    widest: &[NodeId],
    verify_contiguity: bool,
) -> Result<Bound>
where
    G: MultiplicationGraph + ?Sized,
{
    let relation = Relation::between(current_level, widest_level).ok_or_else(|| {
        Error::InvalidLevel(format!(
            "bounds of node {node} need real levels, got {current_level} against {widest_level}"
        ))
    })?;
    if widest.is_empty() {
        return Err(Error::InvalidLevel(format!(
            "widest level {widest_level} has no nodes"
        )));
    }

    let mut left = 0;
    let mut right = 0;
    let mut left_bound_found = false;

    for (i, &w) in widest.iter().enumerate() {
        if relation.holds(graph, w, node)? {
            left_bound_found = true;
            right = i + 1;
        } else if !left_bound_found {
            left = i + 1;
            right = i + 1;
        } else {
            if verify_contiguity {
                check_rest(graph, relation, node, current_level, widest_level, widest, i + 1)?;
            }
            break;
        }
    }

    Ok(Bound::new(left, right))
}

fn check_rest<G>(
    graph: &G,
    relation: Relation,
    node: NodeId,
    level: Level,
    widest_level: Level,
    widest: &[NodeId],
    from: usize,
) -> Result<()>
where
    G: MultiplicationGraph + ?Sized,
{
    for (column, &w) in widest.iter().enumerate().skip(from) {
        if relation.holds(graph, w, node)? {
            warn!("layout: node {node} ({level}) related again at column {column} of {widest_level}");
            return Err(Error::NonContiguous { node, level, widest: widest_level, column });
        }
    }
    Ok(())
}

// ============================================================================
// Layout
// ============================================================================

/// A complete, consistent set of bounds for one graph snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    widest: Level,
    width: usize,
    sequences: LevelSequences,
    bounds: HashMap<NodeId, Bound>,
}

impl Layout {
    /// The layout of an empty graph.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute bounds for every node of `sequences`.
    ///
    /// Fails on the first relation fault; nothing partial is returned.
    pub fn compute<G>(graph: &G, sequences: LevelSequences, config: &EngineConfig) -> Result<Self>
    where
        G: MultiplicationGraph + ?Sized,
    {
        let (widest, width) = widest_level(&sequences);
        if widest.is_none() {
            return Ok(Self { sequences, ..Self::empty() });
        }

        let widest_seq = sequences.get(widest);
        let mut bounds = HashMap::with_capacity(sequences.total());
        for (level, nodes) in sequences.iter() {
            for &node in nodes {
                let bound = compute_bound(
                    graph,
                    node,
                    level,
                    widest,
                    widest_seq,
                    config.verify_contiguity,
                )?;
                bounds.insert(node, bound);
            }
        }

        Ok(Self { widest, width, sequences, bounds })
    }

    pub fn widest_level(&self) -> Level {
        self.widest
    }

    /// Number of columns (the widest level's width).
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn bound(&self, node: NodeId) -> Option<Bound> {
        self.bounds.get(&node).copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.bounds.contains_key(&node)
    }

    /// Number of nodes with a bound.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// The snapshot this layout was computed from.
    pub fn sequences(&self) -> &LevelSequences {
        &self.sequences
    }

    /// Table cells, level by level, left to right.
    pub fn cells(&self) -> Vec<Cell> {
        self.sequences
            .iter()
            .flat_map(|(level, nodes)| {
                nodes.iter().filter_map(move |&node| {
                    self.bound(node).map(|bound| Cell { node, level, bound })
                })
            })
            .collect()
    }
}
