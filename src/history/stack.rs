use super::HistoryRecord;
use std::collections::VecDeque;

/// Default number of records kept
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Bounded LIFO of reversal records
///
/// Pushing past capacity evicts the oldest record from the bottom. A
/// capacity of zero keeps nothing.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    records: VecDeque<HistoryRecord>,
    capacity: usize,
}

impl HistoryStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Push a record, returning whatever was evicted to make room
    pub fn push(&mut self, record: HistoryRecord) -> Option<HistoryRecord> {
        if self.capacity == 0 {
            return Some(record);
        }

        let evicted = if self.records.len() >= self.capacity {
            self.records.pop_front()
        } else {
            None
        };
        if let Some(ref old) = evicted {
            log::debug!("History full ({}), evicting oldest {} record", self.capacity, old.kind());
        }

        self.records.push_back(record);
        evicted
    }

    pub fn pop(&mut self) -> Option<HistoryRecord> {
        self.records.pop_back()
    }

    pub fn peek(&self) -> Option<&HistoryRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Records newest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter().rev()
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::OperationKind;
    use crate::model::SongId;

    fn added() -> HistoryRecord {
        HistoryRecord::Added { id: SongId::new() }
    }

    #[test]
    fn test_push_pop_lifo() {
        let mut stack = HistoryStack::new(10);
        let first = added();
        let second = added();
        stack.push(first.clone());
        stack.push(second.clone());

        assert_eq!(stack.peek(), Some(&second));
        assert_eq!(stack.pop(), Some(second));
        assert_eq!(stack.pop(), Some(first));
        assert_eq!(stack.pop(), None);
        assert!(stack.peek().is_none());
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut stack = HistoryStack::new(2);
        let a = added();
        let b = added();
        let c = added();

        assert!(stack.push(a.clone()).is_none());
        assert!(stack.push(b.clone()).is_none());
        assert_eq!(stack.push(c.clone()), Some(a));

        assert_eq!(stack.len(), 2);
        let newest_first: Vec<_> = stack.iter().cloned().collect();
        assert_eq!(newest_first, vec![c, b]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut stack = HistoryStack::new(0);
        let record = added();
        assert_eq!(stack.push(record.clone()), Some(record));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_record_kind() {
        let record = added();
        assert_eq!(record.kind(), OperationKind::Add);
        assert!(record.song_id().is_some());
    }
}
