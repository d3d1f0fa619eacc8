//! Snapshot serialization

use super::config::ExportConfig;
use crate::model::PlaylistSnapshot;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Writes playlist snapshots as JSON documents
pub struct SnapshotExporter {
    config: ExportConfig,
}

impl SnapshotExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Render a snapshot to a JSON string using this exporter's settings
    pub fn render(&self, snapshot: &PlaylistSnapshot) -> Result<String> {
        let stripped;
        let snapshot = if self.config.include_metrics {
            snapshot
        } else {
            stripped = snapshot.clone().without_metrics();
            &stripped
        };

        let json = if self.config.pretty {
            serde_json::to_string_pretty(snapshot)
        } else {
            serde_json::to_string(snapshot)
        };
        json.context("Failed to serialize playlist snapshot")
    }

    /// Write a snapshot to the configured path, returning that path
    pub fn export(&self, snapshot: &PlaylistSnapshot) -> Result<PathBuf> {
        let path = &self.config.output_path;
        log::info!(
            "Exporting snapshot of {} songs to {:?}",
            snapshot.total_songs,
            path
        );

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let mut json = self.render(snapshot)?;
        json.push('\n');
        fs::write(path, json).with_context(|| format!("Failed to write snapshot: {:?}", path))?;

        log::info!("Snapshot written to {:?}", path);
        Ok(path.clone())
    }

    /// Read a previously exported snapshot back
    pub fn load(&self) -> Result<PlaylistSnapshot> {
        let path = &self.config.output_path;
        let data =
            fs::read_to_string(path).with_context(|| format!("Failed to read snapshot: {:?}", path))?;
        serde_json::from_str(&data).with_context(|| format!("Failed to parse snapshot: {:?}", path))
    }
}
