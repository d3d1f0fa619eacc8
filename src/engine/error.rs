//! Engine error types

use crate::index::IndexError;
use crate::model::SongId;
use thiserror::Error;

/// Errors returned by the playlist engine
///
/// Every kind except `Internal` is detected before any index is touched.
/// Host layers map these to user-facing messages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("song not found: {0}")]
    NotFound(SongId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid rating {0}: must be between 1 and 5")]
    InvalidRating(u8),

    #[error("artist '{0}' is blocked")]
    BlockedArtist(String),

    #[error("position {position} is out of range for a playlist of {len} songs")]
    OutOfRange { position: usize, len: usize },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("playlist is empty")]
    Empty,

    /// Indexes were found to disagree; they are left in a best-effort state
    #[error("internal index inconsistency: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn is_internal(&self) -> bool {
        matches!(self, EngineError::Internal(_))
    }
}

/// Log an index failure and turn it into an `Internal` error
pub(crate) fn internal(context: &str, err: IndexError) -> EngineError {
    log::error!(
        "Index inconsistency during {}: {}; indexes left in best-effort state",
        context,
        err
    );
    EngineError::Internal(format!("{}: {}", context, err))
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
