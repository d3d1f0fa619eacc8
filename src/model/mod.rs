//! Data model shared by the indexes, the engine and its consumers
//!
//! Everything handed to callers is an owned copy of these types; nothing
//! here borrows from the engine's internal structures.

mod snapshot;
mod song;

pub use snapshot::{DurationStats, MetricSummary, PlaylistSnapshot};
pub use song::{Rating, Song, SongId};
