//! Snapshot export to disk

pub mod config;
pub mod writer;

pub use config::ExportConfig;
pub use writer::SnapshotExporter;
