//! Playlist sorting

use crate::model::Song;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Field to sort the playlist by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortCriterion {
    /// Case-insensitive title
    Title,
    /// Case-insensitive artist
    Artist,
    Duration,
    Rating,
    AddedAt,
}

impl SortCriterion {
    pub fn compare(&self, a: &Song, b: &Song) -> Ordering {
        match self {
            SortCriterion::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortCriterion::Artist => a.artist.to_lowercase().cmp(&b.artist.to_lowercase()),
            SortCriterion::Duration => a.duration_seconds.cmp(&b.duration_seconds),
            SortCriterion::Rating => a.rating.cmp(&b.rating),
            SortCriterion::AddedAt => a.added_at.cmp(&b.added_at),
        }
    }
}

/// Sorting algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortAlgorithm {
    /// Stable, O(n log n), O(n) extra space
    #[default]
    Merge,
    /// In place, O(n log n) average, not stable
    Quick,
}

/// Sort `items` with the chosen algorithm
pub fn sort_with<T, F>(items: Vec<T>, algorithm: SortAlgorithm, cmp: F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    match algorithm {
        SortAlgorithm::Merge => merge_sort(items, &cmp),
        SortAlgorithm::Quick => {
            let mut items = items;
            quick_sort(&mut items, &cmp);
            items
        }
    }
}

fn merge_sort<T, F>(mut items: Vec<T>, cmp: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, cmp);
    let right = merge_sort(right, cmp);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        // ties take from the left run, which keeps the sort stable
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(l, r) != Ordering::Greater,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        if let Some(item) = next {
            merged.push(item);
        }
    }
    merged
}

fn quick_sort<T, F>(items: &mut [T], cmp: &F)
where
    F: Fn(&T, &T) -> Ordering,
{
    let len = items.len();
    if len <= 1 {
        return;
    }

    // median-of-three pivot, parked at the end
    let mid = len / 2;
    let last = len - 1;
    if cmp(&items[mid], &items[0]) == Ordering::Less {
        items.swap(mid, 0);
    }
    if cmp(&items[last], &items[0]) == Ordering::Less {
        items.swap(last, 0);
    }
    if cmp(&items[mid], &items[last]) == Ordering::Less {
        items.swap(mid, last);
    }

    let mut store = 0;
    for i in 0..last {
        if cmp(&items[i], &items[last]) != Ordering::Greater {
            items.swap(i, store);
            store += 1;
        }
    }
    items.swap(store, last);

    let (left, right) = items.split_at_mut(store);
    quick_sort(left, cmp);
    quick_sort(&mut right[1..], cmp);
}
