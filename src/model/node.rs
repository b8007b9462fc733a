//! Node in the multiplication graph.

use serde::{Deserialize, Serialize};
use super::Level;

/// Opaque node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node of the export hierarchy: one timespan, channel configuration,
/// format, or filename pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub level: Level,
    /// Display name of the configuration this node stands for
    /// (e.g. `"Session"`, `"Stereo"`, `"FLAC 24 bit"`, `"mixdown"`).
    pub label: String,
}

impl Node {
    pub fn new(id: NodeId, level: Level, label: impl Into<String>) -> Self {
        Self {
            id,
            level,
            label: label.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}
