use super::Song;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Duration statistics over the live songs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    /// Sum of all song durations in seconds
    pub total_duration: u64,

    /// Shortest song, if any
    pub shortest_song: Option<Song>,

    /// Longest song, if any
    pub longest_song: Option<Song>,

    /// Mean duration in seconds, rounded to two decimals (0 when empty)
    pub average_duration: f64,
}

/// Timing summary for one engine operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Mean wall-clock time per call, in microseconds
    pub average_micros: f64,

    /// Wall-clock time of the most recent call, in microseconds
    pub last_micros: f64,

    /// Number of calls recorded
    pub total_calls: u64,

    /// Complexity annotation, e.g. "O(log n)"
    pub complexity: String,
}

/// Full dump of the playlist plus aggregate statistics
///
/// This is the shape consumed by dashboards and exports, so its field names
/// must stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSnapshot {
    pub total_songs: usize,

    pub total_duration: u64,

    /// Song count per rating, keyed 1..=5 (zero counts included)
    pub rating_distribution: BTreeMap<u8, usize>,

    /// All songs in playlist order
    pub songs: Vec<Song>,

    pub duration_stats: DurationStats,

    /// Up to five longest songs, longest first
    pub longest_songs: Vec<Song>,

    /// Up to five most recent plays, newest first
    pub recent_history: Vec<Song>,

    /// Blocked artist names, sorted
    pub blocked_artists: Vec<String>,

    /// Per-operation timing, keyed by operation name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub performance_metrics: BTreeMap<String, MetricSummary>,
}

impl PlaylistSnapshot {
    /// Copy of this snapshot without timing data
    pub fn without_metrics(mut self) -> Self {
        self.performance_metrics.clear();
        self
    }
}
