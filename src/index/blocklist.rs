//! Blocked artist names

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How artist names are compared against the blocklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtistMatching {
    /// Names match only if byte-for-byte equal
    #[default]
    Exact,

    /// Names are lowercased before storing and probing
    CaseInsensitive,
}

/// Set of blocked artists with O(1) membership tests
#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    artists: HashSet<String>,
    matching: ArtistMatching,
}

impl Blocklist {
    pub fn new(matching: ArtistMatching) -> Self {
        Self {
            artists: HashSet::new(),
            matching,
        }
    }

    fn key(&self, artist: &str) -> String {
        match self.matching {
            ArtistMatching::Exact => artist.to_string(),
            ArtistMatching::CaseInsensitive => artist.to_lowercase(),
        }
    }

    /// Returns false if the artist was already blocked
    pub fn block(&mut self, artist: &str) -> bool {
        let key = self.key(artist);
        self.artists.insert(key)
    }

    /// Returns false if the artist was not blocked
    pub fn unblock(&mut self, artist: &str) -> bool {
        let key = self.key(artist);
        self.artists.remove(&key)
    }

    pub fn is_blocked(&self, artist: &str) -> bool {
        self.artists.contains(&self.key(artist))
    }

    pub fn matching(&self) -> ArtistMatching {
        self.matching
    }

    pub fn len(&self) -> usize {
        self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    /// Stored names, sorted
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut names: Vec<String> = self.artists.iter().cloned().collect();
        names.sort();
        names
    }
}
