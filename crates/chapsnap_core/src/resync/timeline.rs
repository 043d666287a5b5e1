//! The retimed chapter timeline produced by a resync pass.

use std::collections::HashSet;

use serde::Serialize;

use crate::chapters::{render, Chapter};
use crate::timestamp::Timestamp;

/// Insertion-ordered chapters keyed by start time, first insert wins.
///
/// A chapter whose start time is already taken is rejected, never merged
/// and never allowed to replace the earlier entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetimedTimeline {
    entries: Vec<Chapter>,
    #[serde(skip)]
    keys: HashSet<Timestamp>,
}

impl RetimedTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a chapter already starts at `start`.
    pub fn contains(&self, start: Timestamp) -> bool {
        self.keys.contains(&start)
    }

    /// Insert a chapter unless its start time is taken.
    ///
    /// Returns `false` (and leaves the timeline untouched) on collision.
    pub fn try_insert(&mut self, chapter: Chapter) -> bool {
        if !self.keys.insert(chapter.start) {
            return false;
        }
        self.entries.push(chapter);
        true
    }

    /// Get the number of chapters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no chapters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chapters in insertion order.
    pub fn chapters(&self) -> &[Chapter] {
        &self.entries
    }

    /// Get an iterator over chapters.
    pub fn iter(&self) -> impl Iterator<Item = &Chapter> {
        self.entries.iter()
    }

    /// Render as a text chapter file.
    pub fn render(&self) -> String {
        render(&self.entries)
    }
}

impl<'a> IntoIterator for &'a RetimedTimeline {
    type Item = &'a Chapter;
    type IntoIter = std::slice::Iter<'a, Chapter>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
