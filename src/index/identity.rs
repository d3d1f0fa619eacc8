//! Lookup tables from song id and title into the ordered sequence

use super::{Handle, IndexError};
use crate::model::SongId;
use std::collections::HashMap;

/// Song id -> sequence handle
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    handles: HashMap<SongId, Handle>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new id; an id that is already present is rejected
    pub fn put(&mut self, id: SongId, handle: Handle) -> Result<(), IndexError> {
        if self.handles.contains_key(&id) {
            return Err(IndexError::DuplicateId(id));
        }
        self.handles.insert(id, handle);
        Ok(())
    }

    pub fn get(&self, id: &SongId) -> Option<Handle> {
        self.handles.get(id).copied()
    }

    pub fn remove(&mut self, id: &SongId) -> Result<Handle, IndexError> {
        self.handles.remove(id).ok_or(IndexError::MissingId(*id))
    }

    pub fn contains(&self, id: &SongId) -> bool {
        self.handles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &SongId> {
        self.handles.keys()
    }
}

/// Normalized title -> ids, in insertion order
#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
    titles: HashMap<String, Vec<SongId>>,
}

impl TitleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(title: &str) -> String {
        title.trim().to_lowercase()
    }

    pub fn insert(&mut self, title: &str, id: SongId) {
        self.titles.entry(Self::normalize(title)).or_default().push(id);
    }

    pub fn remove(&mut self, title: &str, id: &SongId) -> Result<(), IndexError> {
        let key = Self::normalize(title);
        let ids = self
            .titles
            .get_mut(&key)
            .ok_or(IndexError::MissingId(*id))?;
        let pos = ids
            .iter()
            .position(|candidate| candidate == id)
            .ok_or(IndexError::MissingId(*id))?;
        ids.remove(pos);
        if ids.is_empty() {
            self.titles.remove(&key);
        }
        Ok(())
    }

    /// Ids whose title matches, ignoring case and surrounding whitespace
    pub fn lookup(&self, title: &str) -> &[SongId] {
        self.titles
            .get(&Self::normalize(title))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of (title, id) entries
    pub fn len(&self) -> usize {
        self.titles.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}
