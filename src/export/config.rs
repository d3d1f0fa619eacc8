//! Export configuration

use std::path::PathBuf;

/// Configuration for writing a playlist snapshot to disk
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Destination file; parent directories are created as needed
    pub output_path: PathBuf,

    /// Pretty-print the JSON document
    pub pretty: bool,

    /// Keep per-operation timing in the written snapshot
    pub include_metrics: bool,
}

impl ExportConfig {
    /// Create a new export configuration
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            pretty: true,
            include_metrics: true,
        }
    }

    /// Write compact single-line JSON
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Leave timing data out of the file, for reproducible output
    pub fn without_metrics(mut self) -> Self {
        self.include_metrics = false;
        self
    }
}
