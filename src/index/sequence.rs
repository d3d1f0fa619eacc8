//! Ordered sequence: a doubly linked list stored in an arena
//!
//! Nodes live in a `Vec` of slots and link to each other by slot index.
//! Freed slots go on a free list and are reused; every reuse bumps the
//! slot's generation so handles to the old occupant stop resolving.

use super::IndexError;

/// Stable reference to one element of a [`Sequence`]
///
/// Valid until that element is removed. Moving, reversing and relinking
/// never invalidate a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

/// Doubly linked list with O(1) insert/remove/move given a handle
#[derive(Debug, Clone)]
pub struct Sequence<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Sequence<T> {
    /// Create an empty sequence
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append to the end
    pub fn push_back(&mut self, value: T) -> Handle {
        self.insert_at(self.len, value)
    }

    /// Insert so the new element ends up at `position` (0-based)
    ///
    /// Positions past the end clamp to an append. O(position).
    pub fn insert_at(&mut self, position: usize, value: T) -> Handle {
        let before = self.slot_at(position);
        let idx = self.allocate(value);
        self.link_before(idx, before);
        self.handle_for(idx)
    }

    /// Detach and return the element behind `handle`
    pub fn remove(&mut self, handle: Handle) -> Result<T, IndexError> {
        let idx = self.resolve(handle)?;
        self.unlink(idx);

        let slot = &mut self.slots[idx];
        let node = slot.node.take().ok_or(IndexError::StaleHandle)?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(idx);

        Ok(node.value)
    }

    /// Move an element so it ends up at `new_position` among the others
    ///
    /// Positions past the end clamp to the tail. O(new_position).
    pub fn move_to(&mut self, handle: Handle, new_position: usize) -> Result<(), IndexError> {
        let idx = self.resolve(handle)?;
        self.unlink(idx);
        let before = self.slot_at(new_position);
        self.link_before(idx, before);
        Ok(())
    }

    /// Reverse traversal order in place, O(n)
    pub fn reverse(&mut self) {
        let mut current = self.head;
        while let Some(idx) = current {
            let next = match self.slots[idx].node.as_mut() {
                Some(node) => {
                    std::mem::swap(&mut node.prev, &mut node.next);
                    node.prev
                }
                None => None,
            };
            current = next;
        }
        std::mem::swap(&mut self.head, &mut self.tail);
    }

    /// Re-link every element in the order given
    ///
    /// `order` must name each live element exactly once. Handles stay valid.
    pub fn relink(&mut self, order: &[Handle]) -> Result<(), IndexError> {
        if order.len() != self.len {
            return Err(IndexError::InvalidOrder(format!(
                "expected {} handles, got {}",
                self.len,
                order.len()
            )));
        }

        let mut seen = vec![false; self.slots.len()];
        let mut indices = Vec::with_capacity(order.len());
        for handle in order {
            let idx = self.resolve(*handle)?;
            if seen[idx] {
                return Err(IndexError::InvalidOrder(format!(
                    "handle {:?} listed twice",
                    handle
                )));
            }
            seen[idx] = true;
            indices.push(idx);
        }

        self.head = None;
        self.tail = None;
        self.len = 0;
        for idx in indices {
            self.link_before(idx, None);
        }
        Ok(())
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let idx = self.resolve(handle).ok()?;
        self.slots[idx].node.as_ref().map(|n| &n.value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let idx = self.resolve(handle).ok()?;
        self.slots[idx].node.as_mut().map(|n| &mut n.value)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Handle of the element at `position`, walking from the nearer end
    pub fn handle_at(&self, position: usize) -> Option<Handle> {
        self.slot_at(position).map(|idx| self.handle_for(idx))
    }

    /// Current 0-based position of an element, O(n)
    pub fn position_of(&self, handle: Handle) -> Result<usize, IndexError> {
        let target = self.resolve(handle)?;
        self.entries()
            .position(|(h, _)| h.index as usize == target)
            .ok_or(IndexError::StaleHandle)
    }

    /// Forward iterator over values; each call starts from the head
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            sequence: self,
            current: self.head,
            remaining: self.len,
        }
    }

    /// Forward iterator over `(handle, value)` pairs
    pub fn entries(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        let mut current = self.head;
        std::iter::from_fn(move || {
            let idx = current?;
            let node = self.slots[idx].node.as_ref()?;
            current = node.next;
            Some((self.handle_for(idx), &node.value))
        })
    }

    fn resolve(&self, handle: Handle) -> Result<usize, IndexError> {
        let idx = handle.index as usize;
        match self.slots.get(idx) {
            Some(slot) if slot.generation == handle.generation && slot.node.is_some() => Ok(idx),
            _ => Err(IndexError::StaleHandle),
        }
    }

    fn handle_for(&self, idx: usize) -> Handle {
        Handle {
            index: idx as u32,
            generation: self.slots[idx].generation,
        }
    }

    fn allocate(&mut self, value: T) -> usize {
        let node = Node {
            value,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx].node = Some(node);
                idx
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                self.slots.len() - 1
            }
        }
    }

    fn prev_of(&self, idx: usize) -> Option<usize> {
        self.slots[idx].node.as_ref().and_then(|n| n.prev)
    }

    fn next_of(&self, idx: usize) -> Option<usize> {
        self.slots[idx].node.as_ref().and_then(|n| n.next)
    }

    fn set_prev(&mut self, idx: usize, prev: Option<usize>) {
        if let Some(node) = self.slots[idx].node.as_mut() {
            node.prev = prev;
        }
    }

    fn set_next(&mut self, idx: usize, next: Option<usize>) {
        if let Some(node) = self.slots[idx].node.as_mut() {
            node.next = next;
        }
    }

    /// Slot index of the node at `position`, or None past the end
    fn slot_at(&self, position: usize) -> Option<usize> {
        if position >= self.len {
            return None;
        }

        if position < self.len / 2 {
            let mut current = self.head;
            for _ in 0..position {
                current = current.and_then(|idx| self.next_of(idx));
            }
            current
        } else {
            let mut current = self.tail;
            for _ in 0..(self.len - 1 - position) {
                current = current.and_then(|idx| self.prev_of(idx));
            }
            current
        }
    }

    /// Link a detached node in front of `before` (None = at the tail)
    fn link_before(&mut self, idx: usize, before: Option<usize>) {
        let prev = match before {
            Some(b) => self.prev_of(b),
            None => self.tail,
        };

        self.set_prev(idx, prev);
        self.set_next(idx, before);

        match prev {
            Some(p) => self.set_next(p, Some(idx)),
            None => self.head = Some(idx),
        }
        match before {
            Some(b) => self.set_prev(b, Some(idx)),
            None => self.tail = Some(idx),
        }

        self.len += 1;
    }

    /// Detach a linked node from its neighbours without freeing it
    fn unlink(&mut self, idx: usize) {
        let prev = self.prev_of(idx);
        let next = self.next_of(idx);

        match prev {
            Some(p) => self.set_next(p, next),
            None => self.head = next,
        }
        match next {
            Some(n) => self.set_prev(n, prev),
            None => self.tail = prev,
        }

        self.set_prev(idx, None);
        self.set_next(idx, None);
        self.len -= 1;
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward iterator over a [`Sequence`]
pub struct Iter<'a, T> {
    sequence: &'a Sequence<T>,
    current: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let node = self.sequence.slots[idx].node.as_ref()?;
        self.current = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(seq: &Sequence<&'static str>) -> Vec<&'static str> {
        seq.iter().copied().collect()
    }

    #[test]
    fn test_push_and_iterate() {
        let mut seq = Sequence::new();
        seq.push_back("a");
        seq.push_back("b");
        seq.push_back("c");

        assert_eq!(seq.len(), 3);
        assert_eq!(collect(&seq), vec!["a", "b", "c"]);
        // iteration is restartable
        assert_eq!(collect(&seq), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_at_clamps_past_end() {
        let mut seq = Sequence::new();
        seq.push_back("a");
        seq.insert_at(10, "z");
        seq.insert_at(0, "first");
        seq.insert_at(1, "second");

        assert_eq!(collect(&seq), vec!["first", "second", "a", "z"]);
    }

    #[test]
    fn test_remove_invalidates_handle() {
        let mut seq = Sequence::new();
        let a = seq.push_back("a");
        let b = seq.push_back("b");

        assert_eq!(seq.remove(a).unwrap(), "a");
        assert_eq!(seq.remove(a), Err(IndexError::StaleHandle));
        assert!(seq.get(a).is_none());

        // Reused slot must not resurrect the old handle
        let c = seq.push_back("c");
        assert!(seq.get(a).is_none());
        assert_eq!(seq.get(c), Some(&"c"));
        assert_eq!(collect(&seq), vec!["b", "c"]);
        assert_eq!(seq.position_of(b).unwrap(), 0);
    }

    #[test]
    fn test_move_to() {
        let mut seq = Sequence::new();
        let a = seq.push_back("a");
        seq.push_back("b");
        seq.push_back("c");
        let d = seq.push_back("d");

        seq.move_to(a, 2).unwrap();
        assert_eq!(collect(&seq), vec!["b", "c", "a", "d"]);

        seq.move_to(d, 0).unwrap();
        assert_eq!(collect(&seq), vec!["d", "b", "c", "a"]);

        seq.move_to(d, 99).unwrap();
        assert_eq!(collect(&seq), vec!["b", "c", "a", "d"]);
        assert_eq!(seq.position_of(a).unwrap(), 2);
    }

    #[test]
    fn test_reverse_keeps_handles() {
        let mut seq = Sequence::new();
        let a = seq.push_back("a");
        seq.push_back("b");
        let c = seq.push_back("c");

        seq.reverse();
        assert_eq!(collect(&seq), vec!["c", "b", "a"]);
        assert_eq!(seq.position_of(c).unwrap(), 0);

        seq.insert_at(1, "x");
        assert_eq!(collect(&seq), vec!["c", "x", "b", "a"]);
        assert_eq!(seq.remove(a).unwrap(), "a");
        assert_eq!(collect(&seq), vec!["c", "x", "b"]);
    }

    #[test]
    fn test_reverse_empty_and_single() {
        let mut seq: Sequence<&str> = Sequence::new();
        seq.reverse();
        assert!(seq.is_empty());

        seq.push_back("only");
        seq.reverse();
        assert_eq!(collect(&seq), vec!["only"]);
    }

    #[test]
    fn test_relink() {
        let mut seq = Sequence::new();
        let a = seq.push_back("a");
        let b = seq.push_back("b");
        let c = seq.push_back("c");

        seq.relink(&[c, a, b]).unwrap();
        assert_eq!(collect(&seq), vec!["c", "a", "b"]);

        assert!(matches!(
            seq.relink(&[a, a, b]),
            Err(IndexError::InvalidOrder(_))
        ));
        assert!(matches!(seq.relink(&[a]), Err(IndexError::InvalidOrder(_))));
        // failed relink leaves the order untouched
        assert_eq!(collect(&seq), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_handle_at_walks_from_both_ends() {
        let mut seq = Sequence::new();
        for name in ["a", "b", "c", "d", "e"] {
            seq.push_back(name);
        }
        let values: Vec<_> = (0..5)
            .map(|i| *seq.get(seq.handle_at(i).unwrap()).unwrap())
            .collect();
        assert_eq!(values, vec!["a", "b", "c", "d", "e"]);
        assert!(seq.handle_at(5).is_none());
    }
}
