//! Engine configuration

use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::index::{ArtistMatching, DEFAULT_REBUILD_RATIO};
use serde::{Deserialize, Serialize};

/// How caller-facing playlist positions are numbered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionBase {
    /// First song is position 0
    #[default]
    Zero,

    /// First song is position 1
    One,
}

/// What `move_song` does when the target is the song's current position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamePositionMove {
    /// Succeed without changing anything or recording history
    #[default]
    NoOp,

    /// Fail with `InvalidInput`
    Reject,
}

/// Configuration for a [`PlaylistEngine`](super::PlaylistEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of undo records kept
    pub history_depth: usize,

    /// Numbering of positions passed to and returned from the engine
    pub position_base: PositionBase,

    /// Same-position move policy
    pub same_position_move: SamePositionMove,

    /// Artist name comparison for the blocklist
    pub artist_matching: ArtistMatching,

    /// Whether blocking an artist also removes their existing songs
    pub purge_on_block: bool,

    /// Tombstone share of a duration heap above which it is rebuilt
    pub rebuild_ratio: f64,
}

impl EngineConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            position_base: PositionBase::Zero,
            same_position_move: SamePositionMove::NoOp,
            artist_matching: ArtistMatching::Exact,
            purge_on_block: false,
            rebuild_ratio: DEFAULT_REBUILD_RATIO,
        }
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    pub fn with_position_base(mut self, base: PositionBase) -> Self {
        self.position_base = base;
        self
    }

    pub fn with_same_position_move(mut self, policy: SamePositionMove) -> Self {
        self.same_position_move = policy;
        self
    }

    pub fn with_artist_matching(mut self, matching: ArtistMatching) -> Self {
        self.artist_matching = matching;
        self
    }

    pub fn with_purge_on_block(mut self, purge: bool) -> Self {
        self.purge_on_block = purge;
        self
    }

    /// Set the rebuild threshold; values outside (0, 1] disable or force
    /// rebuilds accordingly, NaN falls back to the default
    pub fn with_rebuild_ratio(mut self, ratio: f64) -> Self {
        self.rebuild_ratio = if ratio.is_nan() {
            DEFAULT_REBUILD_RATIO
        } else {
            ratio
        };
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
