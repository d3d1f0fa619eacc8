use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a song
///
/// Generated once when the song is added and never reused for another song
/// within the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(Uuid);

impl SongId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        SongId(Uuid::new_v4())
    }

    /// Build an identifier from an existing UUID
    pub fn from_uuid(u: Uuid) -> Self {
        SongId(u)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SongId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Star rating on a 1-5 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Create a rating, returning `None` outside `1..=5`
    pub fn new(value: u8) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// All valid ratings, lowest first
    pub fn all() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).map(Rating)
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("rating {} outside 1..=5", value))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            write!(f, "★")?;
        }
        for _ in self.0..Self::MAX {
            write!(f, "☆")?;
        }
        Ok(())
    }
}

/// A single song in the playlist
///
/// `id` is fixed at creation. Everything else may be mutated by the engine,
/// which re-indexes the derived keys (rating, duration) on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Unique identifier for this song
    pub id: SongId,

    /// Song title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Duration in seconds (always > 0 for songs held by the engine)
    pub duration_seconds: u32,

    /// Star rating
    pub rating: Rating,

    /// When the song was added
    pub added_at: DateTime<Utc>,

    /// Number of times the song has been played
    pub play_count: u32,
}

impl Song {
    /// Create a song with a fresh id, timestamped now
    pub fn new(title: String, artist: String, duration_seconds: u32, rating: Rating) -> Self {
        Self {
            id: SongId::new(),
            title,
            artist,
            duration_seconds,
            rating,
            added_at: Utc::now(),
            play_count: 0,
        }
    }

    /// Duration formatted as MM:SS
    pub fn duration_formatted(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.duration_seconds / 60,
            self.duration_seconds % 60
        )
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} ({}s)",
            self.title, self.artist, self.duration_seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_none());
        assert!(Rating::new(6).is_none());
        assert_eq!(Rating::new(3).map(|r| r.value()), Some(3));
        assert_eq!(Rating::all().count(), 5);
    }

    #[test]
    fn test_rating_display() {
        let rating = Rating::new(2).unwrap();
        assert_eq!(rating.to_string(), "★★☆☆☆");
    }

    #[test]
    fn test_duration_formatted() {
        let song = Song::new(
            "Test Song".to_string(),
            "Test Artist".to_string(),
            245,
            Rating::new(4).unwrap(),
        );
        assert_eq!(song.duration_formatted(), "04:05");
        assert_eq!(song.play_count, 0);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(SongId::new(), SongId::new());
    }

    #[test]
    fn test_rating_rejects_invalid_json() {
        assert!(serde_json::from_str::<Rating>("7").is_err());
        assert_eq!(serde_json::from_str::<Rating>("5").unwrap().value(), 5);
    }
}
