//! # Multiplication Graph Trait
//!
//! This is THE contract between the layout engine and the owner of the
//! export graph. The engine only ever reads through it, except for the two
//! edit entry points it forwards user intent to.
//!
//! ## Implementations
//!
//! | Graph | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryGraph` | `memory` | Lane-based in-memory graph, shareable handle |
//!
//! ## Contract
//!
//! - Sequences are in visual order and stay in insertion order.
//! - Relation predicates are side-effect free and evaluated per call.
//! - For every node, the nodes of any other level it is related to form one
//!   contiguous run of that level's sequence.
//! - Every successful mutation fires each subscribed listener exactly once.
//!   Failed mutations fire nothing.
//! - The graph must not be mutated while a layout pass is reading it.

pub mod memory;

use crate::model::*;
use crate::{Error, Result};

pub use memory::{MemoryGraph, GraphBuilder};

// ============================================================================
// Change notification
// ============================================================================

/// Callback fired after every successful graph mutation. Carries no payload:
/// it only says "something changed, recompute".
pub type ChangeListener = Box<dyn Fn() + Send + Sync>;

/// Handle returned by [`MultiplicationGraph::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

// ============================================================================
// MultiplicationGraph Trait
// ============================================================================

/// Read contract plus the two edit entry points of an export graph.
pub trait MultiplicationGraph: Send + Sync {
    // ========================================================================
    // Sequences and nodes
    // ========================================================================

    /// Ordered node sequence of `level`. `NoLevel` yields an empty sequence.
    fn nodes(&self, level: Level) -> Result<Vec<NodeId>>;

    /// Get a node by ID. Returns None if not found.
    fn node(&self, id: NodeId) -> Result<Option<Node>>;

    /// Level of a node. Fails for unknown nodes.
    fn level_of(&self, id: NodeId) -> Result<Level> {
        self.node(id)?
            .map(|n| n.level)
            .ok_or(Error::NodeNotFound(id))
    }

    /// All four sequences, read as one snapshot.
    fn sequences(&self) -> Result<LevelSequences> {
        let mut seqs = LevelSequences::new();
        for level in Level::ALL {
            seqs.set(level, self.nodes(level)?);
        }
        Ok(seqs)
    }

    // ========================================================================
    // Relations
    // ========================================================================

    /// True if `other` is reachable from `node` by following fan-out edges
    /// downward.
    fn is_ancestor_of(&self, node: NodeId, other: NodeId) -> Result<bool>;

    /// True if `node` is reachable from `other` by following fan-out edges
    /// downward.
    fn is_descendant_of(&self, node: NodeId, other: NodeId) -> Result<bool> {
        self.is_ancestor_of(other, node)
    }

    /// Identity.
    fn equals(&self, node: NodeId, other: NodeId) -> Result<bool> {
        Ok(node == other)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Divide `node`'s fan-out into two nodes at `position` (in `[0, 1)`) of
    /// its extent.
    fn split_node(&self, node: NodeId, position: f32) -> Result<()>;

    /// Delete `node` together with its fan-out.
    fn remove_node(&self, node: NodeId) -> Result<()>;

    // ========================================================================
    // Notification
    // ========================================================================

    /// Register a change listener.
    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId;

    /// Drop a change listener. Returns true if it was registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    // ========================================================================
    // Export
    // ========================================================================

    /// Every concrete export configuration the graph multiplies out to,
    /// in left-to-right order.
    fn configurations(&self) -> Result<Vec<ExportConfig>>;
}
