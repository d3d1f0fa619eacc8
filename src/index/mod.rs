//! Index structures over the shared song collection
//!
//! The [`Sequence`] owns every song. The other indexes hold only song ids
//! (or handles into the sequence) and are kept in step by the engine.

mod blocklist;
mod duration_heap;
mod identity;
mod rating_tree;
mod sequence;

pub use blocklist::{ArtistMatching, Blocklist};
pub use duration_heap::{
    DurationHeap, DurationIndex, HeapEntry, HeapOrder, Longest, Shortest, DEFAULT_REBUILD_RATIO,
};
pub use identity::{IdentityIndex, TitleIndex};
pub use rating_tree::RatingTree;
pub use sequence::{Handle, Iter, Sequence};

use crate::model::{Rating, SongId};
use thiserror::Error;

/// Failure inside a single index structure
///
/// The engine validates before mutating, so one of these reaching it means
/// the indexes disagree with each other.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("stale or invalid sequence handle")]
    StaleHandle,

    #[error("id {0} is already indexed")]
    DuplicateId(SongId),

    #[error("id {0} is not indexed")]
    MissingId(SongId),

    #[error("no entry for rating {} and id {id}", rating.value())]
    MissingEntry { rating: Rating, id: SongId },

    #[error("invalid ordering: {0}")]
    InvalidOrder(String),

    #[error("index structure corrupted: {0}")]
    Corrupted(String),
}
