//! Min/max heaps over song durations with lazy invalidation
//!
//! Heap entries cannot be patched in place, so removing a song or changing
//! its duration only marks the old entry's ticket as a tombstone. Peeks and
//! pops discard tombstoned entries as they surface. When tombstones make up
//! more than the configured share of a heap, that heap is rebuilt from its
//! live entries.

use super::IndexError;
use crate::model::SongId;
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

/// Default tombstone share that triggers a rebuild
pub const DEFAULT_REBUILD_RATIO: f64 = 0.5;

/// One (duration, id) pair as stored in a heap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapEntry {
    pub duration: u32,
    pub id: SongId,
    /// Unique per insertion; also breaks duration ties (older first)
    ticket: u64,
}

/// Ordering policy for a [`DurationHeap`]
pub trait HeapOrder {
    /// True if `a` belongs closer to the top than `b`
    fn precedes(a: &HeapEntry, b: &HeapEntry) -> bool;
}

/// Shortest duration on top
#[derive(Debug, Clone, Copy)]
pub struct Shortest;

/// Longest duration on top
#[derive(Debug, Clone, Copy)]
pub struct Longest;

impl HeapOrder for Shortest {
    fn precedes(a: &HeapEntry, b: &HeapEntry) -> bool {
        (a.duration, a.ticket) < (b.duration, b.ticket)
    }
}

impl HeapOrder for Longest {
    fn precedes(a: &HeapEntry, b: &HeapEntry) -> bool {
        a.duration > b.duration || (a.duration == b.duration && a.ticket < b.ticket)
    }
}

/// Binary heap with a tombstone set
#[derive(Debug, Clone)]
pub struct DurationHeap<O> {
    entries: Vec<HeapEntry>,
    tombstones: HashSet<u64>,
    _order: PhantomData<O>,
}

impl<O: HeapOrder> DurationHeap<O> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            tombstones: HashSet::new(),
            _order: PhantomData,
        }
    }

    /// Physical size, tombstoned entries included
    pub fn physical_len(&self) -> usize {
        self.entries.len()
    }

    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    pub fn live_len(&self) -> usize {
        self.entries.len() - self.tombstones.len()
    }

    pub fn tombstone_ratio(&self) -> f64 {
        if self.entries.is_empty() {
            0.0
        } else {
            self.tombstones.len() as f64 / self.entries.len() as f64
        }
    }

    pub fn push(&mut self, entry: HeapEntry) {
        self.entries.push(entry);
        self.sift_up(self.entries.len() - 1);
    }

    /// Mark an entry dead; it stays in the array until it surfaces
    fn invalidate(&mut self, ticket: u64) {
        self.tombstones.insert(ticket);
    }

    /// Bring a dead entry back under its original ticket
    ///
    /// A tombstoned ticket still has its entry in the array, so lifting the
    /// tombstone is enough. Otherwise the entry was already discarded and is
    /// pushed again.
    fn revive(&mut self, entry: HeapEntry) {
        if !self.tombstones.remove(&entry.ticket) {
            self.push(entry);
        }
    }

    /// Top live entry, discarding tombstones on the way
    pub fn peek(&mut self) -> Option<HeapEntry> {
        self.discard_dead_top();
        self.entries.first().copied()
    }

    /// Remove and return the top live entry
    pub fn pop(&mut self) -> Option<HeapEntry> {
        self.discard_dead_top();
        self.pop_raw()
    }

    /// Drop tombstoned entries and re-heapify, O(n)
    pub fn rebuild(&mut self) {
        let tombstones = std::mem::take(&mut self.tombstones);
        self.entries.retain(|e| !tombstones.contains(&e.ticket));
        for i in (0..self.entries.len() / 2).rev() {
            self.sift_down(i);
        }
    }

    /// Live entries in heap-array order
    pub fn live_entries(&self) -> impl Iterator<Item = &HeapEntry> + '_ {
        self.entries
            .iter()
            .filter(|e| !self.tombstones.contains(&e.ticket))
    }

    fn discard_dead_top(&mut self) {
        while let Some(ticket) = self.entries.first().map(|e| e.ticket) {
            if !self.tombstones.remove(&ticket) {
                break;
            }
            self.pop_raw();
        }
    }

    fn pop_raw(&mut self) -> Option<HeapEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let top = self.entries.pop();
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        top
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !O::precedes(&self.entries[i], &self.entries[parent]) {
                break;
            }
            self.entries.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            let mut best = i;

            if left < len && O::precedes(&self.entries[left], &self.entries[best]) {
                best = left;
            }
            if right < len && O::precedes(&self.entries[right], &self.entries[best]) {
                best = right;
            }
            if best == i {
                break;
            }
            self.entries.swap(i, best);
            i = best;
        }
    }
}

impl<O: HeapOrder> Default for DurationHeap<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// Paired shortest/longest heaps sharing one set of live tickets
#[derive(Debug, Clone)]
pub struct DurationIndex {
    shortest: DurationHeap<Shortest>,
    longest: DurationHeap<Longest>,
    /// id -> (live ticket, duration)
    current: HashMap<SongId, (u64, u32)>,
    next_ticket: u64,
    rebuild_ratio: f64,
}

impl DurationIndex {
    pub fn new(rebuild_ratio: f64) -> Self {
        Self {
            shortest: DurationHeap::new(),
            longest: DurationHeap::new(),
            current: HashMap::new(),
            next_ticket: 0,
            rebuild_ratio,
        }
    }

    /// Number of live songs indexed
    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn contains(&self, id: &SongId) -> bool {
        self.current.contains_key(id)
    }

    /// Indexed duration for a live id
    pub fn duration_of(&self, id: &SongId) -> Option<u32> {
        self.current.get(id).map(|(_, duration)| *duration)
    }

    pub fn ids(&self) -> impl Iterator<Item = &SongId> {
        self.current.keys()
    }

    /// (shortest, longest) heap sizes including tombstones
    pub fn physical_lens(&self) -> (usize, usize) {
        (self.shortest.physical_len(), self.longest.physical_len())
    }

    /// (shortest, longest) tombstone counts
    pub fn tombstone_counts(&self) -> (usize, usize) {
        (self.shortest.tombstone_count(), self.longest.tombstone_count())
    }

    /// (shortest, longest) live entry counts as seen by each heap
    pub fn live_lens(&self) -> (usize, usize) {
        (self.shortest.live_len(), self.longest.live_len())
    }

    /// Ids holding a live entry in each heap, (shortest, longest)
    pub fn live_heap_ids(&self) -> (Vec<SongId>, Vec<SongId>) {
        (
            self.shortest.live_entries().map(|e| e.id).collect(),
            self.longest.live_entries().map(|e| e.id).collect(),
        )
    }

    pub fn insert(&mut self, id: SongId, duration: u32) -> Result<(), IndexError> {
        if self.current.contains_key(&id) {
            return Err(IndexError::DuplicateId(id));
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let entry = HeapEntry {
            duration,
            id,
            ticket,
        };
        self.shortest.push(entry);
        self.longest.push(entry);
        self.current.insert(id, (ticket, duration));
        Ok(())
    }

    /// Live ticket for `id`; older tickets win duration ties
    pub fn ticket_of(&self, id: &SongId) -> Option<u64> {
        self.current.get(id).map(|(ticket, _)| *ticket)
    }

    /// Re-insert a removed id under the ticket it held before removal
    ///
    /// Keeps its place among songs of equal duration. `ticket` must be one
    /// this index issued to `id`.
    pub fn restore(&mut self, id: SongId, duration: u32, ticket: u64) -> Result<(), IndexError> {
        if self.current.contains_key(&id) {
            return Err(IndexError::DuplicateId(id));
        }
        if ticket >= self.next_ticket {
            return Err(IndexError::Corrupted(format!(
                "ticket {} was never issued",
                ticket
            )));
        }

        let entry = HeapEntry {
            duration,
            id,
            ticket,
        };
        self.shortest.revive(entry);
        self.longest.revive(entry);
        self.current.insert(id, (ticket, duration));
        Ok(())
    }

    /// Tombstone the live entries for `id` in both heaps
    pub fn rebuild_after_removal(&mut self, id: &SongId) -> Result<(), IndexError> {
        let (ticket, _) = self.current.remove(id).ok_or(IndexError::MissingId(*id))?;
        self.shortest.invalidate(ticket);
        self.longest.invalidate(ticket);
        self.maybe_rebuild();
        Ok(())
    }

    /// Re-key an id under a new duration
    pub fn update(&mut self, id: SongId, duration: u32) -> Result<(), IndexError> {
        self.rebuild_after_removal(&id)?;
        self.insert(id, duration)
    }

    pub fn peek_shortest(&mut self) -> Option<(SongId, u32)> {
        self.shortest.peek().map(|e| (e.id, e.duration))
    }

    pub fn peek_longest(&mut self) -> Option<(SongId, u32)> {
        self.longest.peek().map(|e| (e.id, e.duration))
    }

    /// Take the shortest song out of the duration index entirely
    pub fn pop_shortest(&mut self) -> Option<(SongId, u32)> {
        let entry = self.shortest.pop()?;
        self.current.remove(&entry.id);
        self.longest.invalidate(entry.ticket);
        self.maybe_rebuild();
        Some((entry.id, entry.duration))
    }

    /// Take the longest song out of the duration index entirely
    pub fn pop_longest(&mut self) -> Option<(SongId, u32)> {
        let entry = self.longest.pop()?;
        self.current.remove(&entry.id);
        self.shortest.invalidate(entry.ticket);
        self.maybe_rebuild();
        Some((entry.id, entry.duration))
    }

    /// The `k` longest live songs, longest first, without disturbing the index
    pub fn longest_k(&self, k: usize) -> Vec<(SongId, u32)> {
        let mut scratch = self.longest.clone();
        let mut result = Vec::with_capacity(k.min(self.current.len()));
        while result.len() < k {
            let Some(entry) = scratch.pop() else { break };
            result.push((entry.id, entry.duration));
        }
        result
    }

    /// Force a full rebuild of both heaps
    pub fn rebuild(&mut self) {
        self.shortest.rebuild();
        self.longest.rebuild();
    }

    fn maybe_rebuild(&mut self) {
        if self.shortest.tombstone_ratio() > self.rebuild_ratio {
            log::debug!(
                "Rebuilding shortest-duration heap ({} tombstones of {})",
                self.shortest.tombstone_count(),
                self.shortest.physical_len()
            );
            self.shortest.rebuild();
        }
        if self.longest.tombstone_ratio() > self.rebuild_ratio {
            log::debug!(
                "Rebuilding longest-duration heap ({} tombstones of {})",
                self.longest.tombstone_count(),
                self.longest.physical_len()
            );
            self.longest.rebuild();
        }
    }
}

impl Default for DurationIndex {
    fn default() -> Self {
        Self::new(DEFAULT_REBUILD_RATIO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_both_ends() {
        let mut index = DurationIndex::default();
        let a = SongId::new();
        let b = SongId::new();
        let c = SongId::new();
        index.insert(a, 180).unwrap();
        index.insert(b, 90).unwrap();
        index.insert(c, 240).unwrap();

        assert_eq!(index.peek_shortest(), Some((b, 90)));
        assert_eq!(index.peek_longest(), Some((c, 240)));
        assert_eq!(index.insert(a, 10), Err(IndexError::DuplicateId(a)));
    }

    #[test]
    fn test_removed_entries_are_skipped() {
        // ratio above 1.0 disables automatic rebuilds
        let mut index = DurationIndex::new(2.0);
        let a = SongId::new();
        let b = SongId::new();
        let c = SongId::new();
        index.insert(a, 100).unwrap();
        index.insert(b, 200).unwrap();
        index.insert(c, 300).unwrap();

        index.rebuild_after_removal(&a).unwrap();
        index.rebuild_after_removal(&c).unwrap();
        assert_eq!(index.physical_lens(), (3, 3));
        assert_eq!(index.tombstone_counts(), (2, 2));

        assert_eq!(index.peek_shortest(), Some((b, 200)));
        assert_eq!(index.peek_longest(), Some((b, 200)));
        // only the tombstones that surfaced were discarded
        assert_eq!(index.tombstone_counts(), (1, 1));
        assert!(index.rebuild_after_removal(&a).is_err());
    }

    #[test]
    fn test_restore_keeps_tie_order() {
        // ratio above 1.0 disables automatic rebuilds
        let mut index = DurationIndex::new(2.0);
        let a = SongId::new();
        let b = SongId::new();
        index.insert(a, 120).unwrap();
        index.insert(b, 120).unwrap();

        // tombstone still in the array
        let ticket = index.ticket_of(&a).unwrap();
        index.rebuild_after_removal(&a).unwrap();
        index.restore(a, 120, ticket).unwrap();
        assert_eq!(index.peek_shortest(), Some((a, 120)));
        assert_eq!(index.peek_longest(), Some((a, 120)));
        assert_eq!(index.physical_lens(), (2, 2));
        assert_eq!(index.tombstone_counts(), (0, 0));

        // entry already discarded from the array
        index.rebuild_after_removal(&a).unwrap();
        index.rebuild();
        assert_eq!(index.physical_lens(), (1, 1));
        index.restore(a, 120, ticket).unwrap();
        assert_eq!(index.peek_shortest(), Some((a, 120)));
        assert_eq!(index.peek_longest(), Some((a, 120)));
        assert_eq!(index.live_lens(), (2, 2));

        assert_eq!(index.restore(a, 120, ticket), Err(IndexError::DuplicateId(a)));
        assert!(index.restore(SongId::new(), 5, 1_000).is_err());
    }

    #[test]
    fn test_update_duration() {
        let mut index = DurationIndex::new(2.0);
        let a = SongId::new();
        let b = SongId::new();
        index.insert(a, 100).unwrap();
        index.insert(b, 200).unwrap();

        index.update(a, 500).unwrap();
        assert_eq!(index.peek_longest(), Some((a, 500)));
        assert_eq!(index.peek_shortest(), Some((b, 200)));
        assert_eq!(index.duration_of(&a), Some(500));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_rebuild_when_mostly_tombstones() {
        let mut index = DurationIndex::default();
        let ids: Vec<SongId> = (0..4).map(|_| SongId::new()).collect();
        for (i, id) in ids.iter().enumerate() {
            index.insert(*id, 100 + i as u32).unwrap();
        }

        index.rebuild_after_removal(&ids[0]).unwrap();
        index.rebuild_after_removal(&ids[1]).unwrap();
        // exactly half: no rebuild yet
        assert_eq!(index.physical_lens(), (4, 4));

        index.rebuild_after_removal(&ids[2]).unwrap();
        assert_eq!(index.physical_lens(), (1, 1));
        assert_eq!(index.tombstone_counts(), (0, 0));
        assert_eq!(index.peek_shortest(), Some((ids[3], 103)));
    }

    #[test]
    fn test_pop_removes_from_both_heaps() {
        let mut index = DurationIndex::new(2.0);
        let a = SongId::new();
        let b = SongId::new();
        index.insert(a, 50).unwrap();
        index.insert(b, 60).unwrap();

        assert_eq!(index.pop_shortest(), Some((a, 50)));
        assert!(!index.contains(&a));
        assert_eq!(index.peek_longest(), Some((b, 60)));
        assert_eq!(index.pop_longest(), Some((b, 60)));
        assert_eq!(index.peek_shortest(), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_longest_k_leaves_index_untouched() {
        let mut index = DurationIndex::default();
        let ids: Vec<SongId> = (0..6).map(|_| SongId::new()).collect();
        for (i, id) in ids.iter().enumerate() {
            index.insert(*id, (i as u32 + 1) * 30).unwrap();
        }

        let top: Vec<u32> = index.longest_k(3).into_iter().map(|(_, d)| d).collect();
        assert_eq!(top, vec![180, 150, 120]);
        assert_eq!(index.len(), 6);
        assert_eq!(index.peek_longest(), Some((ids[5], 180)));
    }

    #[test]
    fn test_equal_durations_prefer_oldest() {
        let mut index = DurationIndex::default();
        let a = SongId::new();
        let b = SongId::new();
        index.insert(a, 120).unwrap();
        index.insert(b, 120).unwrap();

        assert_eq!(index.peek_shortest(), Some((a, 120)));
        assert_eq!(index.peek_longest(), Some((a, 120)));
    }
}
