//! The four ordered node sequences of one graph snapshot.

use serde::{Deserialize, Serialize};
use super::{Level, NodeId};

/// Per-level node sequences in visual (left-to-right) order.
///
/// The order is the only ordering the layout uses; nothing here sorts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSequences {
    levels: [Vec<NodeId>; 4],
}

impl LevelSequences {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sequence for `level`. `NoLevel` has an empty sequence.
    pub fn get(&self, level: Level) -> &[NodeId] {
        match level.index() {
            Some(i) => &self.levels[i],
            None => &[],
        }
    }

    /// Replace the sequence for `level`. Ignored for `NoLevel`.
    pub fn set(&mut self, level: Level, nodes: Vec<NodeId>) {
        if let Some(i) = level.index() {
            self.levels[i] = nodes;
        }
    }

    pub fn with(mut self, level: Level, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.set(level, nodes.into_iter().collect());
        self
    }

    pub fn width(&self, level: Level) -> usize {
        self.get(level).len()
    }

    /// Total number of nodes over all levels.
    pub fn total(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Vec::is_empty)
    }

    /// Levels with their sequences, in ascending rank order.
    pub fn iter(&self) -> impl Iterator<Item = (Level, &[NodeId])> + '_ {
        Level::ALL.into_iter().zip(self.levels.iter().map(Vec::as_slice))
    }

    /// Level of `id`, if it appears in any sequence.
    pub fn level_of(&self, id: NodeId) -> Option<Level> {
        self.iter()
            .find(|(_, nodes)| nodes.contains(&id))
            .map(|(level, _)| level)
    }
}
