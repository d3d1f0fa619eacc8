//! Script command definitions
//!
//! One JSON object per line, tagged by `op`. Songs are referred to either by
//! a label given when they were added or by their id.

use crate::engine::{SongEdit, SortAlgorithm, SortCriterion};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Add {
        title: String,
        artist: String,
        duration: u32,
        rating: u8,
        /// Name later commands can use instead of the generated id
        #[serde(default)]
        label: Option<String>,
    },
    Remove {
        song: String,
    },
    RemoveAt {
        position: usize,
    },
    Move {
        song: String,
        position: usize,
    },
    Reverse,
    Sort {
        by: SortCriterion,
        #[serde(default)]
        algorithm: SortAlgorithm,
    },
    Rate {
        song: String,
        rating: u8,
    },
    Edit {
        song: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        artist: Option<String>,
        #[serde(default)]
        duration: Option<u32>,
    },
    Play {
        song: String,
    },
    Undo,
    Block {
        artist: String,
    },
    Unblock {
        artist: String,
    },
    QueryRating {
        rating: u8,
    },
    QueryRange {
        min: u8,
        max: u8,
    },
    SearchTitle {
        title: String,
    },
    Shortest,
    Longest,
    Snapshot,
}

impl Command {
    /// Parse one script line; `None` for blank lines and `#` comments
    pub fn parse_line(line: &str) -> Option<serde_json::Result<Self>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        Some(serde_json::from_str(trimmed))
    }

    /// The `op` tag of this command
    pub fn op(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::Remove { .. } => "remove",
            Command::RemoveAt { .. } => "remove_at",
            Command::Move { .. } => "move",
            Command::Reverse => "reverse",
            Command::Sort { .. } => "sort",
            Command::Rate { .. } => "rate",
            Command::Edit { .. } => "edit",
            Command::Play { .. } => "play",
            Command::Undo => "undo",
            Command::Block { .. } => "block",
            Command::Unblock { .. } => "unblock",
            Command::QueryRating { .. } => "query_rating",
            Command::QueryRange { .. } => "query_range",
            Command::SearchTitle { .. } => "search_title",
            Command::Shortest => "shortest",
            Command::Longest => "longest",
            Command::Snapshot => "snapshot",
        }
    }

    /// Song edit carried by an `edit` command
    pub fn song_edit(&self) -> Option<SongEdit> {
        match self {
            Command::Edit {
                title,
                artist,
                duration,
                ..
            } => Some(SongEdit {
                title: title.clone(),
                artist: artist.clone(),
                duration_seconds: *duration,
            }),
            _ => None,
        }
    }
}
