//! Binary search tree keyed by rating
//!
//! Each node owns one rating and the chain of song ids carrying it, in
//! insertion order. Nodes are arena slots linked by index. The tree is not
//! rebalanced; with at most five distinct keys its depth is bounded anyway.

use super::IndexError;
use crate::model::{Rating, SongId};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct RatingNode {
    rating: Rating,
    songs: Vec<SongId>,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Rating-ordered index over song ids
#[derive(Debug, Clone, Default)]
pub struct RatingTree {
    nodes: Vec<Option<RatingNode>>,
    free: Vec<usize>,
    root: Option<usize>,
    len: usize,
}

impl RatingTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (rating, id) pairs held
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct ratings present
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Add `id` at the end of the chain for `rating`
    pub fn insert(&mut self, rating: Rating, id: SongId) -> Result<(), IndexError> {
        self.insert_at(rating, id, usize::MAX)
    }

    /// Add `id` at `slot` within the chain for `rating`
    ///
    /// Slots past the end of the chain append.
    pub fn insert_at(&mut self, rating: Rating, id: SongId, slot: usize) -> Result<(), IndexError> {
        let mut parent: Option<(usize, Side)> = None;
        let mut current = self.root;

        while let Some(idx) = current {
            let node = self.node_mut(idx)?;
            if rating == node.rating {
                if node.songs.contains(&id) {
                    return Err(IndexError::DuplicateId(id));
                }
                let slot = slot.min(node.songs.len());
                node.songs.insert(slot, id);
                self.len += 1;
                return Ok(());
            }
            if rating < node.rating {
                parent = Some((idx, Side::Left));
                current = node.left;
            } else {
                parent = Some((idx, Side::Right));
                current = node.right;
            }
        }

        let idx = self.allocate(RatingNode {
            rating,
            songs: vec![id],
            left: None,
            right: None,
        });
        self.set_child(parent, Some(idx))?;
        self.len += 1;
        Ok(())
    }

    /// Remove the exact `(rating, id)` pair
    pub fn delete(&mut self, rating: Rating, id: SongId) -> Result<(), IndexError> {
        let (idx, parent) = self
            .find(rating)
            .ok_or(IndexError::MissingEntry { rating, id })?;

        let node = self.node_mut(idx)?;
        let pos = node
            .songs
            .iter()
            .position(|candidate| *candidate == id)
            .ok_or(IndexError::MissingEntry { rating, id })?;
        node.songs.remove(pos);
        let now_empty = node.songs.is_empty();
        self.len -= 1;

        if now_empty {
            self.remove_node(idx, parent)?;
        }
        Ok(())
    }

    /// Index of `id` within the chain for `rating`
    pub fn chain_position(&self, rating: Rating, id: &SongId) -> Option<usize> {
        self.find(rating)
            .and_then(|(idx, _)| self.node(idx))
            .and_then(|node| node.songs.iter().position(|candidate| candidate == id))
    }

    pub fn contains(&self, rating: Rating, id: &SongId) -> bool {
        self.find(rating)
            .and_then(|(idx, _)| self.node(idx))
            .is_some_and(|node| node.songs.contains(id))
    }

    /// Ids with exactly this rating, in insertion order
    pub fn songs_with_rating(&self, rating: Rating) -> impl Iterator<Item = &SongId> + '_ {
        self.find(rating)
            .and_then(|(idx, _)| self.node(idx))
            .map(|node| node.songs.iter())
            .into_iter()
            .flatten()
    }

    /// Ids with `min <= rating <= max`, rating ascending, ties by insertion
    pub fn songs_in_range(&self, min: Rating, max: Rating) -> Vec<SongId> {
        let mut result = Vec::new();
        if min > max {
            return result;
        }

        let mut stack = Vec::new();
        let mut current = self.root;
        loop {
            while let Some(idx) = current {
                let Some(node) = self.node(idx) else { break };
                stack.push(idx);
                // Nothing smaller than min is wanted
                current = if node.rating > min { node.left } else { None };
            }
            let Some(idx) = stack.pop() else { break };
            let Some(node) = self.node(idx) else { break };
            if node.rating > max {
                break;
            }
            if node.rating >= min {
                result.extend(node.songs.iter().copied());
            }
            current = node.right;
        }
        result
    }

    /// The `k` highest-rated ids; within a rating, earliest inserted first
    pub fn top_k_by_rating(&self, k: usize) -> Vec<SongId> {
        let mut result = Vec::with_capacity(k.min(self.len));
        let mut stack = Vec::new();
        let mut current = self.root;

        while result.len() < k {
            while let Some(idx) = current {
                stack.push(idx);
                current = self.node(idx).and_then(|n| n.right);
            }
            let Some(idx) = stack.pop() else { break };
            let Some(node) = self.node(idx) else { break };
            let wanted = k - result.len();
            result.extend(node.songs.iter().take(wanted).copied());
            current = node.left;
        }
        result
    }

    /// Every `(rating, id)` pair, rating ascending
    pub fn entries(&self) -> Vec<(Rating, SongId)> {
        let mut result = Vec::with_capacity(self.len);
        for rating in Rating::all() {
            result.extend(self.songs_with_rating(rating).map(|id| (rating, *id)));
        }
        result
    }

    /// Song count per rating, every key 1..=5 present
    pub fn rating_counts(&self) -> BTreeMap<u8, usize> {
        let mut counts: BTreeMap<u8, usize> = Rating::all().map(|r| (r.value(), 0)).collect();
        for node in self.nodes.iter().flatten() {
            counts.insert(node.rating.value(), node.songs.len());
        }
        counts
    }

    fn node(&self, idx: usize) -> Option<&RatingNode> {
        self.nodes.get(idx).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, idx: usize) -> Result<&mut RatingNode, IndexError> {
        self.nodes
            .get_mut(idx)
            .and_then(Option::as_mut)
            .ok_or_else(|| IndexError::Corrupted(format!("rating node {} is vacant", idx)))
    }

    fn allocate(&mut self, node: RatingNode) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) -> Option<RatingNode> {
        let node = self.nodes.get_mut(idx)?.take();
        if node.is_some() {
            self.free.push(idx);
        }
        node
    }

    /// Locate the node for `rating` and the link that points at it
    fn find(&self, rating: Rating) -> Option<(usize, Option<(usize, Side)>)> {
        let mut parent = None;
        let mut current = self.root;
        while let Some(idx) = current {
            let node = self.node(idx)?;
            if rating == node.rating {
                return Some((idx, parent));
            }
            if rating < node.rating {
                parent = Some((idx, Side::Left));
                current = node.left;
            } else {
                parent = Some((idx, Side::Right));
                current = node.right;
            }
        }
        None
    }

    fn set_child(
        &mut self,
        link: Option<(usize, Side)>,
        child: Option<usize>,
    ) -> Result<(), IndexError> {
        match link {
            None => self.root = child,
            Some((parent, Side::Left)) => self.node_mut(parent)?.left = child,
            Some((parent, Side::Right)) => self.node_mut(parent)?.right = child,
        }
        Ok(())
    }

    /// Unlink an emptied node, splicing in its in-order successor if needed
    fn remove_node(
        &mut self,
        idx: usize,
        parent: Option<(usize, Side)>,
    ) -> Result<(), IndexError> {
        let (left, right) = {
            let node = self.node_mut(idx)?;
            (node.left, node.right)
        };

        match (left, right) {
            (None, child) | (child, None) => {
                self.set_child(parent, child)?;
                self.release(idx);
            }
            (Some(_), Some(right)) => {
                let mut succ_link = (idx, Side::Right);
                let mut succ = right;
                while let Some(next) = self.node(succ).and_then(|n| n.left) {
                    succ_link = (succ, Side::Left);
                    succ = next;
                }

                let succ_right = self.node_mut(succ)?.right;
                self.set_child(Some(succ_link), succ_right)?;
                let successor = self.release(succ).ok_or_else(|| {
                    IndexError::Corrupted(format!("successor node {} is vacant", succ))
                })?;

                let node = self.node_mut(idx)?;
                node.rating = successor.rating;
                node.songs = successor.songs;
            }
        }
        Ok(())
    }
}
