//! Scene-change index.
//!
//! Answers "nearest scene change after / at-or-before this time" queries
//! for the resync engine.

use super::types::{SceneChange, SearchResult};
use crate::timestamp::Timestamp;

/// Sorted, read-only view over a video's scene changes.
#[derive(Debug, Clone, Default)]
pub struct SceneIndex {
    /// Scene changes sorted by timestamp.
    scenes: Vec<SceneChange>,
    /// All timestamps, sorted.
    all: Vec<Timestamp>,
    /// Timestamps of scene changes on keyframes, sorted.
    keyframes: Vec<Timestamp>,
}

impl SceneIndex {
    /// Build an index. Input is sorted by timestamp if it is not already.
    pub fn new(mut scenes: Vec<SceneChange>) -> Self {
        if !scenes.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
            tracing::debug!("Sorting {} scene changes by timestamp", scenes.len());
            scenes.sort_by_key(|s| s.timestamp);
        }

        let all = scenes.iter().map(|s| s.timestamp).collect();
        let keyframes = scenes
            .iter()
            .filter(|s| s.frame_type.is_keyframe())
            .map(|s| s.timestamp)
            .collect();

        Self {
            scenes,
            all,
            keyframes,
        }
    }

    /// Get the number of scene changes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Check if there are no scene changes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene changes in timestamp order.
    pub fn scenes(&self) -> &[SceneChange] {
        &self.scenes
    }

    /// Whether any scene change (of any frame type) sits exactly at `t`.
    pub fn contains(&self, t: Timestamp) -> bool {
        self.all.binary_search(&t).is_ok()
    }

    /// Smallest scene-change time strictly greater than `t`.
    pub fn nearest_after(&self, t: Timestamp, keyframes_only: bool) -> SearchResult {
        let candidates = self.candidates(keyframes_only);
        let idx = candidates.partition_point(|&ts| ts <= t);
        let result: SearchResult = candidates.get(idx).copied().into();
        tracing::trace!("nearest_after({}) -> {:?}", t, result);
        result
    }

    /// Largest scene-change time less than or equal to `t`.
    pub fn nearest_at_or_before(&self, t: Timestamp, keyframes_only: bool) -> SearchResult {
        let candidates = self.candidates(keyframes_only);
        let idx = candidates.partition_point(|&ts| ts <= t);
        let result: SearchResult = idx
            .checked_sub(1)
            .and_then(|i| candidates.get(i))
            .copied()
            .into();
        tracing::trace!("nearest_at_or_before({}) -> {:?}", t, result);
        result
    }

    fn candidates(&self, keyframes_only: bool) -> &[Timestamp] {
        if keyframes_only {
            &self.keyframes
        } else {
            &self.all
        }
    }
}

impl From<Vec<SceneChange>> for SceneIndex {
    fn from(scenes: Vec<SceneChange>) -> Self {
        Self::new(scenes)
    }
}
