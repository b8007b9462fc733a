//! Column bounds of a node in the export table.

use serde::{Deserialize, Serialize};
use super::{Level, NodeId};

/// Half-open interval `[left, right)` over the widest level's sequence.
///
/// `left == right` is a valid empty span: the node has no related node at
/// the widest level and gets no column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bound {
    pub left: usize,
    pub right: usize,
}

impl Bound {
    pub fn new(left: usize, right: usize) -> Self {
        Self { left, right }
    }

    /// Empty span positioned at `at`.
    pub fn empty_at(at: usize) -> Self {
        Self { left: at, right: at }
    }

    /// Number of columns spanned.
    pub fn len(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    pub fn is_empty(&self) -> bool {
        self.right <= self.left
    }

    pub fn contains(&self, column: usize) -> bool {
        self.left <= column && column < self.right
    }

    pub fn as_range(&self) -> std::ops::Range<usize> {
        self.left..self.right
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.left, self.right)
    }
}

impl From<std::ops::Range<usize>> for Bound {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// One table cell: a node, its level (the table row), and its column span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub node: NodeId,
    pub level: Level,
    pub bound: Bound,
}
