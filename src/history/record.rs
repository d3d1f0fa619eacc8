use crate::model::{Rating, Song, SongId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which engine operation produced a history record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Add,
    Remove,
    Move,
    Rate,
    Play,
    Edit,
    Reverse,
    Sort,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Remove => "remove",
            OperationKind::Move => "move",
            OperationKind::Rate => "rate",
            OperationKind::Play => "play",
            OperationKind::Edit => "edit",
            OperationKind::Reverse => "reverse",
            OperationKind::Sort => "sort",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why the whole sequence was reordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderReason {
    Reverse,
    Sort,
}

/// Editable descriptive fields of a song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongFields {
    pub title: String,
    pub artist: String,
    pub duration_seconds: u32,
}

impl From<&Song> for SongFields {
    fn from(song: &Song) -> Self {
        Self {
            title: song.title.clone(),
            artist: song.artist.clone(),
            duration_seconds: song.duration_seconds,
        }
    }
}

/// Reversal descriptor for one mutation
///
/// Records carry ids and value snapshots only, never sequence handles, so
/// they stay meaningful however the indexes change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryRecord {
    /// Inverse: remove the song by id
    Added { id: SongId },

    /// Inverse: re-insert the snapshot at its old 0-based position, its old
    /// slot among equal ratings and its old duration tie-break ticket
    Removed {
        song: Song,
        position: usize,
        rating_slot: usize,
        duration_ticket: u64,
    },

    /// Inverse: move the song back to its old 0-based position
    Moved { id: SongId, from: usize },

    /// Inverse: restore the previous rating
    Rated { id: SongId, previous: Rating },

    /// Inverse: decrement the play count. `song` is the state right after the play.
    Played { song: Song },

    /// Inverse: restore the previous descriptive fields
    Edited { id: SongId, previous: SongFields },

    /// Inverse: relink the sequence in the previous order
    Reordered {
        previous_order: Vec<SongId>,
        reason: ReorderReason,
    },
}

impl HistoryRecord {
    pub fn kind(&self) -> OperationKind {
        match self {
            HistoryRecord::Added { .. } => OperationKind::Add,
            HistoryRecord::Removed { .. } => OperationKind::Remove,
            HistoryRecord::Moved { .. } => OperationKind::Move,
            HistoryRecord::Rated { .. } => OperationKind::Rate,
            HistoryRecord::Played { .. } => OperationKind::Play,
            HistoryRecord::Edited { .. } => OperationKind::Edit,
            HistoryRecord::Reordered {
                reason: ReorderReason::Reverse,
                ..
            } => OperationKind::Reverse,
            HistoryRecord::Reordered {
                reason: ReorderReason::Sort,
                ..
            } => OperationKind::Sort,
        }
    }

    /// The single song this record concerns, if any
    pub fn song_id(&self) -> Option<SongId> {
        match self {
            HistoryRecord::Added { id }
            | HistoryRecord::Moved { id, .. }
            | HistoryRecord::Rated { id, .. }
            | HistoryRecord::Edited { id, .. } => Some(*id),
            HistoryRecord::Removed { song, .. } | HistoryRecord::Played { song } => Some(song.id),
            HistoryRecord::Reordered { .. } => None,
        }
    }
}
