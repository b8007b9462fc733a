//! Levels of the export hierarchy.

use serde::{Deserialize, Serialize};

/// Rank of a node in the export hierarchy.
///
/// The derived ordering is the hierarchy order: `NoLevel` sorts below
/// everything, then `Timespans < ChannelConfigs < Formats < Filenames`.
/// A level that compares *less* than another sits *above* it (closer to the
/// root of the fan-out).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Sentinel: no level (e.g. the widest level of an empty graph).
    #[default]
    NoLevel,
    Timespans,
    ChannelConfigs,
    Formats,
    Filenames,
}

impl Level {
    /// The four real levels in ascending rank order.
    pub const ALL: [Level; 4] = [
        Level::Timespans,
        Level::ChannelConfigs,
        Level::Formats,
        Level::Filenames,
    ];

    /// Position of the level in [`Level::ALL`], `None` for `NoLevel`.
    pub fn index(self) -> Option<usize> {
        match self {
            Level::NoLevel => None,
            Level::Timespans => Some(0),
            Level::ChannelConfigs => Some(1),
            Level::Formats => Some(2),
            Level::Filenames => Some(3),
        }
    }

    /// The level directly above this one, if any.
    pub fn parent(self) -> Option<Level> {
        match self.index()? {
            0 => None,
            i => Some(Level::ALL[i - 1]),
        }
    }

    /// The level directly below this one, if any.
    pub fn child(self) -> Option<Level> {
        Level::ALL.get(self.index()? + 1).copied()
    }

    pub fn is_none(self) -> bool {
        self == Level::NoLevel
    }

    /// Lower-case singular name, used in warnings and plan listings.
    pub fn name(self) -> &'static str {
        match self {
            Level::NoLevel => "none",
            Level::Timespans => "timespan",
            Level::ChannelConfigs => "channel configuration",
            Level::Formats => "format",
            Level::Filenames => "filename",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Level::NoLevel => "NoLevel",
            Level::Timespans => "Timespans",
            Level::ChannelConfigs => "ChannelConfigs",
            Level::Formats => "Formats",
            Level::Filenames => "Filenames",
        };
        f.write_str(s)
    }
}
