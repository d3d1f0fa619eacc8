//! Cross-index consistency checking
//!
//! Walks the sequence and confirms every secondary index agrees with it.

use crate::engine::PlaylistEngine;
use anyhow::{bail, ensure, Context, Result};
use std::collections::HashSet;

/// Summary of a successful consistency check
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    /// Songs in playlist order
    pub songs: usize,

    /// Sum of song durations
    pub total_duration: u64,

    /// Distinct ratings present in the rating tree
    pub rating_nodes: usize,

    /// Physical heap sizes (shortest, longest), tombstones included
    pub heap_sizes: (usize, usize),

    /// Tombstones waiting in each heap (shortest, longest)
    pub tombstones: (usize, usize),
}

/// Verify that every index describes the same set of songs
///
/// # Returns
/// A report on success, or an error naming the first disagreement found
pub fn check_consistency(engine: &PlaylistEngine) -> Result<ConsistencyReport> {
    let sequence = engine.sequence();
    let identity = engine.identity();
    let titles = engine.titles();
    let ratings = engine.ratings();
    let durations = engine.durations();

    let len = sequence.len();
    ensure!(
        sequence.iter().count() == len,
        "sequence walk visits {} songs but length is {}",
        sequence.iter().count(),
        len
    );
    ensure!(identity.len() == len, "identity index holds {} ids for {} songs", identity.len(), len);
    ensure!(titles.len() == len, "title index holds {} ids for {} songs", titles.len(), len);
    ensure!(ratings.len() == len, "rating tree holds {} ids for {} songs", ratings.len(), len);
    ensure!(
        durations.len() == len,
        "duration index holds {} ids for {} songs",
        durations.len(),
        len
    );

    let mut seen = HashSet::with_capacity(len);
    let mut total_duration = 0u64;

    for (position, (handle, song)) in sequence.entries().enumerate() {
        let id = song.id;
        if !seen.insert(id) {
            bail!("song {} appears twice in the sequence", id);
        }

        let indexed = identity
            .get(&id)
            .with_context(|| format!("song {} at position {} missing from identity index", id, position))?;
        ensure!(indexed == handle, "identity index points song {} at the wrong node", id);

        ensure!(
            titles.lookup(&song.title).contains(&id),
            "title index has no entry for song {} under '{}'",
            id,
            song.title
        );
        ensure!(
            ratings.contains(song.rating, &id),
            "rating tree has no entry for song {} at rating {}",
            id,
            song.rating.value()
        );
        ensure!(
            durations.duration_of(&id) == Some(song.duration_seconds),
            "duration index has {:?} for song {}, expected {}",
            durations.duration_of(&id),
            id,
            song.duration_seconds
        );

        total_duration += u64::from(song.duration_seconds);
    }

    ensure!(
        total_duration == engine.total_duration(),
        "cached total duration {} differs from computed {}",
        engine.total_duration(),
        total_duration
    );

    let entries = ratings.entries();
    ensure!(
        entries.windows(2).all(|pair| pair[0].0 <= pair[1].0),
        "rating tree in-order walk is not sorted"
    );
    ensure!(
        ratings.node_count() <= 5,
        "rating tree has {} nodes for at most 5 ratings",
        ratings.node_count()
    );

    let (shortest_ids, longest_ids) = durations.live_heap_ids();
    for (name, ids) in [("shortest", &shortest_ids), ("longest", &longest_ids)] {
        ensure!(
            ids.len() == len,
            "{} heap has {} live entries for {} songs",
            name,
            ids.len(),
            len
        );
        let unique: HashSet<_> = ids.iter().collect();
        ensure!(unique.len() == ids.len(), "{} heap holds duplicate live entries", name);
        ensure!(
            ids.iter().all(|id| seen.contains(id)),
            "{} heap holds an entry for a song not in the playlist",
            name
        );
    }

    let heap_sizes = durations.physical_lens();
    let tombstones = durations.tombstone_counts();
    let threshold = engine.config().rebuild_ratio;
    if threshold >= 0.0 {
        for (name, dead, physical) in [
            ("shortest", tombstones.0, heap_sizes.0),
            ("longest", tombstones.1, heap_sizes.1),
        ] {
            if physical > 0 {
                let ratio = dead as f64 / physical as f64;
                ensure!(
                    ratio <= threshold,
                    "{} heap tombstone ratio {:.2} exceeds rebuild threshold {:.2}",
                    name,
                    ratio,
                    threshold
                );
            }
        }
    }

    log::debug!(
        "Consistency check passed: {} songs, {} rating nodes, heaps {:?}",
        len,
        ratings.node_count(),
        heap_sizes
    );

    Ok(ConsistencyReport {
        songs: len,
        total_duration,
        rating_nodes: ratings.node_count(),
        heap_sizes,
        tombstones,
    })
}
