//! # export-graph — Export Configuration Graph and Table Layout
//!
//! The model behind a table-based export profile editor. An export profile
//! multiplies out over four levels:
//!
//! ```text
//! Timespans → ChannelConfigs → Formats → Filenames
//! ```
//!
//! A node at one level fans out into one or more nodes at the next. The
//! editor draws this as a table with one row per level; every node's cell
//! spans the columns of the *widest* level that it is related to.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `MultiplicationGraph` is the contract between the
//!    layout engine and whoever owns the graph
//! 2. **Engine owns nothing**: the engine only reads the graph and keeps the
//!    last good `Layout`
//! 3. **Full recompute**: every change notification rebuilds all bounds;
//!    a failed pass leaves the previous layout in place
//!
//! ## Quick Start
//!
//! ```rust
//! use export_graph::{Bound, EngineConfig, LayoutEngine, Level, MemoryGraph};
//!
//! # fn example() -> export_graph::Result<()> {
//! let graph = MemoryGraph::builder()
//!     .node(Level::Timespans, "Verse", 1)
//!     .node(Level::Timespans, "Chorus", 1)
//!     .node(Level::ChannelConfigs, "Stereo", 2)
//!     .node(Level::Formats, "FLAC", 2)
//!     .node(Level::Filenames, "mixdown", 2)
//!     .build()?;
//!
//! let mut engine = LayoutEngine::attach(graph.clone(), EngineConfig::default())?;
//! assert_eq!(engine.widest_level(), Level::Timespans);
//!
//! let stereo = graph.nodes_at(Level::ChannelConfigs)[0];
//! assert_eq!(engine.bound(stereo), Some(Bound::new(0, 2)));
//!
//! let verse = graph.nodes_at(Level::Timespans)[0];
//! engine.request_split(verse, 0.5)?;
//! assert_eq!(engine.layout().width(), 3);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod graph;
pub mod layout;
pub mod export;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Level, Node, NodeId, Bound, Cell, LevelSequences, ExportConfig,
};

// ============================================================================
// Re-exports: Graph
// ============================================================================

pub use graph::{
    MultiplicationGraph, MemoryGraph, GraphBuilder, ChangeListener, SubscriptionId,
};

// ============================================================================
// Re-exports: Layout
// ============================================================================

pub use layout::{
    Layout, LayoutEngine, LayoutListener, EngineConfig, Relation,
    widest_level, compute_bound,
};

// ============================================================================
// Re-exports: Export plan
// ============================================================================

pub use export::ExportWarnings;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid split position {0}: must be in [0, 1)")]
    InvalidPosition(f32),

    #[error("Cannot remove node {node}: it is the last node at level {level}")]
    LastNode { node: NodeId, level: Level },

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    #[error("Non-contiguous relation run for node {node} at level {level} against widest level {widest}: related again at column {column}")]
    NonContiguous { node: NodeId, level: Level, widest: Level, column: usize },

    #[error("Graph fault: {0}")]
    GraphFault(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
