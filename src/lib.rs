//! PlayWise - playlist engine with consistent secondary indexes
//!
//! This library keeps a mutable playlist together with the indexes that
//! answer queries about it: id lookup, title search, rating ranges,
//! shortest/longest song, an artist blocklist and a bounded undo history.

pub mod engine;
pub mod export;
pub mod history;
pub mod index;
pub mod model;
pub mod script;
pub mod validation;

pub use engine::{EngineConfig, EngineError, PlaylistEngine};
pub use export::{ExportConfig, SnapshotExporter};
