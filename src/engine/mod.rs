//! Playlist engine and its supporting types

mod config;
mod playlist;
mod error;
mod metrics;
mod sort;

pub use self::config::{EngineConfig, PositionBase, SamePositionMove};
pub use self::playlist::{PlaylistEngine, SongEdit};
pub use self::error::{EngineError, Result};
pub use self::metrics::{EngineMetrics, OperationStats, OperationTiming};
pub use self::sort::{sort_with, SortAlgorithm, SortCriterion};
