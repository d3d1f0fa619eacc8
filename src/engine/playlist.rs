//! Playlist engine: owns every index and keeps them in step
//!
//! Each public mutation runs Validate -> Mutate-All-Indexes ->
//! Record-History -> Emit-Metrics. Validation failures leave every index
//! untouched. Index mutations always run in the same order: sequence,
//! identity, title, rating, duration.

use super::config::{EngineConfig, PositionBase, SamePositionMove};
use super::error::{internal, EngineError, Result};
use super::metrics::EngineMetrics;
use super::sort::{sort_with, SortAlgorithm, SortCriterion};
use crate::history::{HistoryRecord, HistoryStack, ReorderReason, SongFields};
use crate::index::{
    Blocklist, DurationIndex, Handle, IdentityIndex, IndexError, RatingTree, Sequence,
    TitleIndex,
};
use crate::model::{DurationStats, PlaylistSnapshot, Rating, Song, SongId};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Number of entries in the snapshot's top lists
const SNAPSHOT_TOP_N: usize = 5;

/// A song taken out of every index, with what is needed to put it back
struct Detached {
    song: Song,
    position: usize,
    rating_slot: usize,
    duration_ticket: u64,
}

/// Where a re-inserted song goes among equal ratings and durations
#[derive(Debug, Clone, Copy)]
struct TieSlot {
    rating_slot: usize,
    duration_ticket: u64,
}

/// Partial update of a song's descriptive fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongEdit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

impl SongEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.artist.is_none() && self.duration_seconds.is_none()
    }
}

/// The playlist engine
///
/// Single-writer: callers on several threads must serialize access to the
/// whole engine (one mutex around it), never to individual indexes.
#[derive(Debug, Clone)]
pub struct PlaylistEngine {
    config: EngineConfig,
    sequence: Sequence<Song>,
    identity: IdentityIndex,
    titles: TitleIndex,
    blocklist: Blocklist,
    ratings: RatingTree,
    durations: DurationIndex,
    history: HistoryStack,
    total_duration: u64,
    metrics: EngineMetrics,
}

impl PlaylistEngine {
    /// Create an empty engine
    pub fn new(config: EngineConfig) -> Self {
        log::debug!("Creating playlist engine with {:?}", config);
        Self {
            sequence: Sequence::new(),
            identity: IdentityIndex::new(),
            titles: TitleIndex::new(),
            blocklist: Blocklist::new(config.artist_matching),
            ratings: RatingTree::new(),
            durations: DurationIndex::new(config.rebuild_ratio),
            history: HistoryStack::new(config.history_depth),
            total_duration: 0,
            metrics: EngineMetrics::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn total_duration(&self) -> u64 {
        self.total_duration
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Newest history record, if any
    pub fn peek_history(&self) -> Option<&HistoryRecord> {
        self.history.peek()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Append a new song and return its id
    pub fn add_song(
        &mut self,
        title: &str,
        artist: &str,
        duration_seconds: u32,
        rating: u8,
    ) -> Result<SongId> {
        self.timed("add_song", "O(log n)", |engine| {
            engine.add_song_inner(title, artist, duration_seconds, rating)
        })
    }

    /// Remove a song by id, returning its final state
    pub fn remove_song(&mut self, id: SongId) -> Result<Song> {
        self.timed("remove_song", "O(n)", |engine| engine.remove_song_inner(id))
    }

    /// Remove the song at a playlist position
    pub fn remove_at(&mut self, position: usize) -> Result<Song> {
        self.timed("remove_at", "O(n)", |engine| {
            let index = engine.to_index(position)?;
            let id = engine.id_at_index(index)?;
            engine.remove_song_inner(id)
        })
    }

    /// Move a song so it ends up at `new_position`
    pub fn move_song(&mut self, id: SongId, new_position: usize) -> Result<()> {
        self.timed("move_song", "O(n)", |engine| {
            engine.move_song_inner(id, new_position)
        })
    }

    /// Reverse the playlist order
    pub fn reverse(&mut self) {
        self.timed("reverse", "O(n)", |engine| {
            if engine.sequence.len() < 2 {
                return;
            }
            let previous_order = engine.current_order();
            engine.sequence.reverse();
            engine.record(HistoryRecord::Reordered {
                previous_order,
                reason: ReorderReason::Reverse,
            });
            log::debug!("Reversed playlist of {} songs", engine.sequence.len());
        })
    }

    /// Reorder the playlist by a song field
    pub fn sort_playlist(
        &mut self,
        criterion: SortCriterion,
        algorithm: SortAlgorithm,
    ) -> Result<()> {
        self.timed("sort_playlist", "O(n log n)", |engine| {
            engine.sort_playlist_inner(criterion, algorithm)
        })
    }

    /// Change a song's rating
    pub fn rate_song(&mut self, id: SongId, rating: u8) -> Result<()> {
        self.timed("rate_song", "O(log n)", |engine| {
            let rating = Rating::new(rating).ok_or(EngineError::InvalidRating(rating))?;
            engine.handle_of(id)?;

            let previous = engine.apply_rating(id, rating)?;
            if previous != rating {
                engine.record(HistoryRecord::Rated { id, previous });
                log::debug!("Rated {} {} -> {}", id, previous.value(), rating.value());
            }
            Ok(())
        })
    }

    /// Edit title, artist and/or duration
    pub fn edit_song(&mut self, id: SongId, edit: SongEdit) -> Result<()> {
        self.timed("edit_song", "O(log n)", |engine| engine.edit_song_inner(id, edit))
    }

    /// Register a play; returns the new play count
    pub fn play_song(&mut self, id: SongId) -> Result<u32> {
        self.timed("play_song", "O(1)", |engine| {
            let handle = engine.handle_of(id)?;
            let song = engine
                .sequence
                .get_mut(handle)
                .ok_or_else(|| internal("play_song", IndexError::StaleHandle))?;
            song.play_count = song.play_count.saturating_add(1);
            let snapshot = song.clone();
            let count = snapshot.play_count;

            log::debug!("Playing {} (play #{})", snapshot, count);
            engine.record(HistoryRecord::Played { song: snapshot });
            Ok(count)
        })
    }

    /// Reverse the most recent recorded mutation and return its record
    pub fn undo_last(&mut self) -> Result<HistoryRecord> {
        self.timed("undo_last", "O(n)", |engine| {
            let record = engine.history.pop().ok_or(EngineError::NothingToUndo)?;
            match engine.apply_inverse(&record) {
                Ok(()) => {
                    log::debug!("Undid {} record", record.kind());
                    Ok(record)
                }
                Err(err) => {
                    let err = if err.is_internal() {
                        err
                    } else {
                        EngineError::Internal(format!("undo of {} failed: {}", record.kind(), err))
                    };
                    log::error!("Undo failed, record dropped: {}", err);
                    Err(err)
                }
            }
        })
    }

    /// Block an artist; returns how many existing songs were purged
    pub fn block_artist(&mut self, artist: &str) -> Result<usize> {
        self.timed("block_artist", "O(1)", |engine| {
            let artist = artist.trim();
            if artist.is_empty() {
                return Err(EngineError::InvalidInput("artist must not be empty".into()));
            }
            engine.blocklist.block(artist);
            log::info!("Blocked artist '{}'", artist);

            if !engine.config.purge_on_block {
                return Ok(0);
            }

            let doomed: Vec<SongId> = engine
                .sequence
                .iter()
                .filter(|song| engine.blocklist.is_blocked(&song.artist))
                .map(|song| song.id)
                .collect();
            for id in &doomed {
                engine.remove_song_inner(*id)?;
            }
            if !doomed.is_empty() {
                log::info!("Purged {} songs by '{}'", doomed.len(), artist);
            }
            Ok(doomed.len())
        })
    }

    /// Unblock an artist; returns false if they were not blocked
    pub fn unblock_artist(&mut self, artist: &str) -> bool {
        self.timed("unblock_artist", "O(1)", |engine| {
            let removed = engine.blocklist.unblock(artist.trim());
            if removed {
                log::info!("Unblocked artist '{}'", artist.trim());
            }
            removed
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn is_blocked(&self, artist: &str) -> bool {
        self.blocklist.is_blocked(artist.trim())
    }

    pub fn blocked_artists(&self) -> Vec<String> {
        self.blocklist.to_sorted_vec()
    }

    pub fn get_song(&self, id: SongId) -> Result<Song> {
        self.timed_ref("get_song", "O(1)", |engine| engine.song_ref(id).cloned())
    }

    /// Song at a playlist position
    pub fn song_at(&self, position: usize) -> Result<Song> {
        self.timed_ref("song_at", "O(n)", |engine| {
            let index = engine.to_index(position)?;
            let id = engine.id_at_index(index)?;
            engine.song_ref(id).cloned()
        })
    }

    /// Current position of a song, in the configured numbering
    pub fn position_of(&self, id: SongId) -> Result<usize> {
        let handle = self.handle_of(id)?;
        let index = self
            .sequence
            .position_of(handle)
            .map_err(|e| internal("position_of", e))?;
        Ok(self.to_position(index))
    }

    /// Immutable view of the songs in playlist order
    pub fn iter(&self) -> impl Iterator<Item = &Song> + '_ {
        self.sequence.iter()
    }

    /// Copies of all songs in playlist order
    pub fn songs(&self) -> Vec<Song> {
        self.sequence.iter().cloned().collect()
    }

    /// Songs whose title matches, ignoring case
    ///
    /// Search results never include songs by blocked artists, whether or
    /// not those songs were purged from the playlist.
    pub fn search_by_title(&self, title: &str) -> Vec<Song> {
        self.timed_ref("search_by_title", "O(1)", |engine| {
            engine.resolve_unblocked(engine.titles.lookup(title).iter())
        })
    }

    /// Songs with exactly this rating, in insertion order
    pub fn query_by_rating(&self, rating: u8) -> Result<Vec<Song>> {
        self.timed_ref("query_by_rating", "O(log n + k)", |engine| {
            let rating = Rating::new(rating).ok_or(EngineError::InvalidRating(rating))?;
            Ok(engine.resolve_unblocked(engine.ratings.songs_with_rating(rating)))
        })
    }

    /// Songs rated within `min..=max`, rating ascending
    pub fn query_by_rating_range(&self, min: u8, max: u8) -> Result<Vec<Song>> {
        self.timed_ref("query_by_rating_range", "O(log n + k)", |engine| {
            let low = Rating::new(min).ok_or(EngineError::InvalidRating(min))?;
            let high = Rating::new(max).ok_or(EngineError::InvalidRating(max))?;
            if low > high {
                return Err(EngineError::InvalidInput(format!(
                    "rating range {}..={} is empty",
                    min, max
                )));
            }
            Ok(engine.resolve_unblocked(engine.ratings.songs_in_range(low, high).iter()))
        })
    }

    /// The `k` highest-rated songs
    pub fn top_rated(&self, k: usize) -> Vec<Song> {
        self.timed_ref("top_rated", "O(n)", |engine| {
            if engine.blocklist.is_empty() {
                return engine.resolve_all(engine.ratings.top_k_by_rating(k).iter());
            }
            let mut songs = engine
                .resolve_unblocked(engine.ratings.top_k_by_rating(engine.ratings.len()).iter());
            songs.truncate(k);
            songs
        })
    }

    /// Shortest song
    pub fn shortest(&mut self) -> Result<Song> {
        self.timed("shortest", "O(log n) amortized", |engine| {
            let (id, _) = engine.durations.peek_shortest().ok_or(EngineError::Empty)?;
            engine.resolve_indexed("shortest", id)
        })
    }

    /// Longest song
    pub fn longest(&mut self) -> Result<Song> {
        self.timed("longest", "O(log n) amortized", |engine| {
            let (id, _) = engine.durations.peek_longest().ok_or(EngineError::Empty)?;
            engine.resolve_indexed("longest", id)
        })
    }

    /// The `k` longest songs, longest first
    pub fn longest_k(&self, k: usize) -> Vec<Song> {
        self.timed_ref("longest_k", "O(n + k log n)", |engine| {
            let ids: Vec<SongId> = engine
                .durations
                .longest_k(k)
                .into_iter()
                .map(|(id, _)| id)
                .collect();
            engine.resolve_all(ids.iter())
        })
    }

    pub fn duration_stats(&mut self) -> DurationStats {
        self.timed("duration_stats", "O(log n) amortized", |engine| {
            engine.duration_stats_inner()
        })
    }

    /// Most recent plays still in history, newest first
    pub fn recent_plays(&self, k: usize) -> Vec<Song> {
        self.history
            .iter()
            .filter_map(|record| match record {
                HistoryRecord::Played { song } => Some(song.clone()),
                _ => None,
            })
            .take(k)
            .collect()
    }

    /// Full dump of the playlist plus aggregate statistics
    pub fn full_snapshot(&mut self) -> PlaylistSnapshot {
        self.timed("full_snapshot", "O(n)", |engine| {
            let duration_stats = engine.duration_stats_inner();
            PlaylistSnapshot {
                total_songs: engine.sequence.len(),
                total_duration: engine.total_duration,
                rating_distribution: engine.ratings.rating_counts(),
                songs: engine.songs(),
                duration_stats,
                longest_songs: engine.longest_k(SNAPSHOT_TOP_N),
                recent_history: engine.recent_plays(SNAPSHOT_TOP_N),
                blocked_artists: engine.blocklist.to_sorted_vec(),
                performance_metrics: engine.metrics.summary(),
            }
        })
    }

    // ------------------------------------------------------------------
    // Index views for consistency checking
    // ------------------------------------------------------------------

    pub(crate) fn sequence(&self) -> &Sequence<Song> {
        &self.sequence
    }

    pub(crate) fn identity(&self) -> &IdentityIndex {
        &self.identity
    }

    pub(crate) fn titles(&self) -> &TitleIndex {
        &self.titles
    }

    pub(crate) fn ratings(&self) -> &RatingTree {
        &self.ratings
    }

    pub(crate) fn durations(&self) -> &DurationIndex {
        &self.durations
    }

    // ------------------------------------------------------------------
    // Operation bodies
    // ------------------------------------------------------------------

    fn add_song_inner(
        &mut self,
        title: &str,
        artist: &str,
        duration_seconds: u32,
        rating: u8,
    ) -> Result<SongId> {
        let title = non_empty("title", title)?;
        let artist = non_empty("artist", artist)?;
        if duration_seconds == 0 {
            return Err(EngineError::InvalidInput(
                "duration must be greater than zero".into(),
            ));
        }
        let rating = Rating::new(rating).ok_or_else(|| {
            EngineError::InvalidInput(format!("rating {} must be between 1 and 5", rating))
        })?;
        if self.blocklist.is_blocked(&artist) {
            return Err(EngineError::BlockedArtist(artist));
        }

        let song = Song::new(title, artist, duration_seconds, rating);
        let id = song.id;
        log::debug!("Adding {}", song);

        let end = self.sequence.len();
        self.index_song(song, end, None)?;
        self.record(HistoryRecord::Added { id });
        Ok(id)
    }

    fn remove_song_inner(&mut self, id: SongId) -> Result<Song> {
        self.handle_of(id)?;
        let detached = self.unindex_song(id)?;
        log::debug!(
            "Removed {} from position {}",
            detached.song,
            detached.position
        );
        self.record(HistoryRecord::Removed {
            song: detached.song.clone(),
            position: detached.position,
            rating_slot: detached.rating_slot,
            duration_ticket: detached.duration_ticket,
        });
        Ok(detached.song)
    }

    fn move_song_inner(&mut self, id: SongId, new_position: usize) -> Result<()> {
        let handle = self.handle_of(id)?;
        let target = self.to_index(new_position)?;
        let from = self
            .sequence
            .position_of(handle)
            .map_err(|e| internal("move_song", e))?;

        if from == target {
            return match self.config.same_position_move {
                SamePositionMove::NoOp => Ok(()),
                SamePositionMove::Reject => Err(EngineError::InvalidInput(format!(
                    "song is already at position {}",
                    new_position
                ))),
            };
        }

        self.sequence
            .move_to(handle, target)
            .map_err(|e| internal("move_song", e))?;
        self.record(HistoryRecord::Moved { id, from });
        log::debug!("Moved {} from {} to {}", id, from, target);
        Ok(())
    }

    fn sort_playlist_inner(
        &mut self,
        criterion: SortCriterion,
        algorithm: SortAlgorithm,
    ) -> Result<()> {
        if self.sequence.is_empty() {
            return Err(EngineError::Empty);
        }

        let previous_order = self.current_order();
        let entries: Vec<(Handle, &Song)> = self.sequence.entries().collect();
        let sorted: Vec<Handle> = sort_with(entries, algorithm, |a, b| criterion.compare(a.1, b.1))
            .into_iter()
            .map(|(handle, _)| handle)
            .collect();

        self.sequence
            .relink(&sorted)
            .map_err(|e| internal("sort_playlist", e))?;
        self.record(HistoryRecord::Reordered {
            previous_order,
            reason: ReorderReason::Sort,
        });
        log::debug!("Sorted playlist by {:?} using {:?}", criterion, algorithm);
        Ok(())
    }

    fn edit_song_inner(&mut self, id: SongId, edit: SongEdit) -> Result<()> {
        let current = SongFields::from(self.song_ref(id)?);
        if edit.is_empty() {
            return Ok(());
        }

        let title = match edit.title {
            Some(ref title) => non_empty("title", title)?,
            None => current.title.clone(),
        };
        let artist = match edit.artist {
            Some(ref artist) => non_empty("artist", artist)?,
            None => current.artist.clone(),
        };
        let duration_seconds = edit.duration_seconds.unwrap_or(current.duration_seconds);
        if duration_seconds == 0 {
            return Err(EngineError::InvalidInput(
                "duration must be greater than zero".into(),
            ));
        }
        if artist != current.artist && self.blocklist.is_blocked(&artist) {
            return Err(EngineError::BlockedArtist(artist));
        }

        let updated = SongFields {
            title,
            artist,
            duration_seconds,
        };
        if updated == current {
            return Ok(());
        }

        let previous = self.apply_fields(id, updated)?;
        self.record(HistoryRecord::Edited { id, previous });
        log::debug!("Edited {}", id);
        Ok(())
    }

    fn duration_stats_inner(&mut self) -> DurationStats {
        let shortest_song = self
            .durations
            .peek_shortest()
            .and_then(|(id, _)| self.song_ref(id).ok().cloned());
        let longest_song = self
            .durations
            .peek_longest()
            .and_then(|(id, _)| self.song_ref(id).ok().cloned());

        let count = self.sequence.len();
        let average_duration = if count == 0 {
            0.0
        } else {
            (self.total_duration as f64 / count as f64 * 100.0).round() / 100.0
        };

        DurationStats {
            total_duration: self.total_duration,
            shortest_song,
            longest_song,
            average_duration,
        }
    }

    fn apply_inverse(&mut self, record: &HistoryRecord) -> Result<()> {
        match record {
            HistoryRecord::Added { id } => {
                self.handle_of(*id)?;
                self.unindex_song(*id)?;
            }
            HistoryRecord::Removed {
                song,
                position,
                rating_slot,
                duration_ticket,
            } => {
                if self.identity.contains(&song.id) {
                    return Err(internal("undo remove", IndexError::DuplicateId(song.id)));
                }
                let tie = TieSlot {
                    rating_slot: *rating_slot,
                    duration_ticket: *duration_ticket,
                };
                self.index_song(song.clone(), *position, Some(tie))?;
            }
            HistoryRecord::Moved { id, from } => {
                let handle = self.handle_of(*id)?;
                self.sequence
                    .move_to(handle, *from)
                    .map_err(|e| internal("undo move", e))?;
            }
            HistoryRecord::Rated { id, previous } => {
                self.handle_of(*id)?;
                self.apply_rating(*id, *previous)?;
            }
            HistoryRecord::Played { song } => {
                let handle = self.handle_of(song.id)?;
                let current = self
                    .sequence
                    .get_mut(handle)
                    .ok_or_else(|| internal("undo play", IndexError::StaleHandle))?;
                current.play_count = current.play_count.saturating_sub(1);
            }
            HistoryRecord::Edited { id, previous } => {
                self.apply_fields(*id, previous.clone())?;
            }
            HistoryRecord::Reordered { previous_order, .. } => {
                let handles = previous_order
                    .iter()
                    .map(|id| self.handle_of(*id))
                    .collect::<Result<Vec<Handle>>>()?;
                self.sequence
                    .relink(&handles)
                    .map_err(|e| internal("undo reorder", e))?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cross-index primitives
    // ------------------------------------------------------------------

    /// Insert a fully formed song into every index
    ///
    /// Without a `tie` the song goes after every equal rating and duration.
    fn index_song(&mut self, song: Song, position: usize, tie: Option<TieSlot>) -> Result<()> {
        let id = song.id;
        let rating = song.rating;
        let duration = song.duration_seconds;
        let title = song.title.clone();

        let handle = self.sequence.insert_at(position, song);
        self.identity
            .put(id, handle)
            .map_err(|e| internal("index identity", e))?;
        self.titles.insert(&title, id);
        match tie {
            None => {
                self.ratings
                    .insert(rating, id)
                    .map_err(|e| internal("index rating", e))?;
                self.durations
                    .insert(id, duration)
                    .map_err(|e| internal("index duration", e))?;
            }
            Some(tie) => {
                self.ratings
                    .insert_at(rating, id, tie.rating_slot)
                    .map_err(|e| internal("index rating", e))?;
                self.durations
                    .restore(id, duration, tie.duration_ticket)
                    .map_err(|e| internal("index duration", e))?;
            }
        }
        self.total_duration += u64::from(duration);
        Ok(())
    }

    /// Detach a song from every index, returning it and its old placement
    fn unindex_song(&mut self, id: SongId) -> Result<Detached> {
        let handle = self.handle_of(id)?;
        let position = self
            .sequence
            .position_of(handle)
            .map_err(|e| internal("unindex sequence", e))?;
        let rating = self.song_ref(id)?.rating;
        let rating_slot = self
            .ratings
            .chain_position(rating, &id)
            .ok_or_else(|| internal("unindex rating", IndexError::MissingEntry { rating, id }))?;
        let duration_ticket = self
            .durations
            .ticket_of(&id)
            .ok_or_else(|| internal("unindex duration", IndexError::MissingId(id)))?;

        let song = self
            .sequence
            .remove(handle)
            .map_err(|e| internal("unindex sequence", e))?;
        self.identity
            .remove(&id)
            .map_err(|e| internal("unindex identity", e))?;
        self.titles
            .remove(&song.title, &id)
            .map_err(|e| internal("unindex title", e))?;
        self.ratings
            .delete(song.rating, id)
            .map_err(|e| internal("unindex rating", e))?;
        self.durations
            .rebuild_after_removal(&id)
            .map_err(|e| internal("unindex duration", e))?;
        self.total_duration -= u64::from(song.duration_seconds);
        Ok(Detached {
            song,
            position,
            rating_slot,
            duration_ticket,
        })
    }

    /// Re-key a song under a new rating; returns the old one
    fn apply_rating(&mut self, id: SongId, rating: Rating) -> Result<Rating> {
        let handle = self.handle_of(id)?;
        let previous = self.song_ref(id)?.rating;
        if previous == rating {
            return Ok(previous);
        }

        self.ratings
            .delete(previous, id)
            .map_err(|e| internal("re-rate", e))?;
        self.ratings
            .insert(rating, id)
            .map_err(|e| internal("re-rate", e))?;
        if let Some(song) = self.sequence.get_mut(handle) {
            song.rating = rating;
        }
        Ok(previous)
    }

    /// Overwrite descriptive fields, re-keying title and duration indexes
    fn apply_fields(&mut self, id: SongId, fields: SongFields) -> Result<SongFields> {
        let handle = self.handle_of(id)?;
        let previous = SongFields::from(self.song_ref(id)?);

        if previous.title != fields.title {
            self.titles
                .remove(&previous.title, &id)
                .map_err(|e| internal("edit title", e))?;
            self.titles.insert(&fields.title, id);
        }
        if previous.duration_seconds != fields.duration_seconds {
            self.durations
                .update(id, fields.duration_seconds)
                .map_err(|e| internal("edit duration", e))?;
            self.total_duration = self.total_duration - u64::from(previous.duration_seconds)
                + u64::from(fields.duration_seconds);
        }

        if let Some(song) = self.sequence.get_mut(handle) {
            song.title = fields.title;
            song.artist = fields.artist;
            song.duration_seconds = fields.duration_seconds;
        }
        Ok(previous)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn timed<T>(
        &mut self,
        operation: &'static str,
        complexity: &'static str,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let started = Instant::now();
        let out = f(self);
        self.metrics.record(operation, complexity, started.elapsed());
        out
    }

    fn timed_ref<T>(
        &self,
        operation: &'static str,
        complexity: &'static str,
        f: impl FnOnce(&Self) -> T,
    ) -> T {
        let started = Instant::now();
        let out = f(self);
        self.metrics.record(operation, complexity, started.elapsed());
        out
    }

    fn record(&mut self, record: HistoryRecord) {
        self.history.push(record);
    }

    fn handle_of(&self, id: SongId) -> Result<Handle> {
        self.identity.get(&id).ok_or(EngineError::NotFound(id))
    }

    fn song_ref(&self, id: SongId) -> Result<&Song> {
        let handle = self.handle_of(id)?;
        self.sequence
            .get(handle)
            .ok_or_else(|| internal("lookup", IndexError::StaleHandle))
    }

    /// Resolve an id taken from a secondary index; a miss is an inconsistency
    fn resolve_indexed(&self, context: &str, id: SongId) -> Result<Song> {
        self.song_ref(id)
            .cloned()
            .map_err(|_| internal(context, IndexError::MissingId(id)))
    }

    /// Like `resolve_all`, but leaves out songs by blocked artists
    fn resolve_unblocked<'a>(&self, ids: impl Iterator<Item = &'a SongId>) -> Vec<Song> {
        self.resolve_all(ids)
            .into_iter()
            .filter(|song| !self.blocklist.is_blocked(&song.artist))
            .collect()
    }

    /// Resolve ids to song copies, logging and skipping any that dangle
    fn resolve_all<'a>(&self, ids: impl Iterator<Item = &'a SongId>) -> Vec<Song> {
        ids.filter_map(|id| match self.song_ref(*id) {
            Ok(song) => Some(song.clone()),
            Err(_) => {
                log::error!("Secondary index refers to unknown song {}", id);
                None
            }
        })
        .collect()
    }

    fn id_at_index(&self, index: usize) -> Result<SongId> {
        self.sequence
            .handle_at(index)
            .and_then(|handle| self.sequence.get(handle))
            .map(|song| song.id)
            .ok_or(EngineError::OutOfRange {
                position: self.to_position(index),
                len: self.sequence.len(),
            })
    }

    fn current_order(&self) -> Vec<SongId> {
        self.sequence.iter().map(|song| song.id).collect()
    }

    /// Caller-facing position -> 0-based index, bounds-checked
    fn to_index(&self, position: usize) -> Result<usize> {
        let len = self.sequence.len();
        let index = match self.config.position_base {
            PositionBase::Zero => Some(position),
            PositionBase::One => position.checked_sub(1),
        };
        match index {
            Some(index) if index < len => Ok(index),
            _ => Err(EngineError::OutOfRange { position, len }),
        }
    }

    fn to_position(&self, index: usize) -> usize {
        match self.config.position_base {
            PositionBase::Zero => index,
            PositionBase::One => index + 1,
        }
    }
}

impl Default for PlaylistEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn non_empty(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(EngineError::InvalidInput(format!("{} must not be empty", field)))
    } else {
        Ok(trimmed.to_string())
    }
}
