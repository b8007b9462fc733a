//! # Export Graph Model
//!
//! Plain data shared by the graph, the layout engine and the presentation
//! layer. No locks, no I/O, no callbacks.

pub mod level;
pub mod node;
pub mod bound;
pub mod sequences;

pub use level::Level;
pub use node::{Node, NodeId};
pub use bound::{Bound, Cell};
pub use sequences::LevelSequences;

/// One concrete export: the node chosen at each level for a single output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ExportConfig {
    pub timespan: NodeId,
    pub channel_config: NodeId,
    pub format: NodeId,
    pub filename: NodeId,
}

impl ExportConfig {
    /// The node chosen at `level`, `None` for `NoLevel`.
    pub fn at(&self, level: Level) -> Option<NodeId> {
        match level {
            Level::NoLevel => None,
            Level::Timespans => Some(self.timespan),
            Level::ChannelConfigs => Some(self.channel_config),
            Level::Formats => Some(self.format),
            Level::Filenames => Some(self.filename),
        }
    }
}
