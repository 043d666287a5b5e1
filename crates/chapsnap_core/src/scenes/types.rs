//! Scene-change record types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// Picture type of the frame a scene change was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    /// Intra-coded frame (keyframe).
    I,
    /// Predicted frame.
    P,
    /// Bi-directionally predicted frame.
    B,
    /// Any other picture type code reported by the prober.
    Other(char),
}

impl FrameType {
    /// Parse a single-letter picture type code (`I`, `P`, `B`, ...).
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "I" => FrameType::I,
            "P" => FrameType::P,
            "B" => FrameType::B,
            other => FrameType::Other(other.chars().next().unwrap_or('?')),
        }
    }

    /// Whether a chapter may be snapped here when only keyframes are allowed.
    pub fn is_keyframe(self) -> bool {
        self == FrameType::I
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameType::I => write!(f, "I"),
            FrameType::P => write!(f, "P"),
            FrameType::B => write!(f, "B"),
            FrameType::Other(c) => write!(f, "{}", c),
        }
    }
}

/// A detected scene change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneChange {
    /// Presentation time of the frame.
    pub timestamp: Timestamp,
    /// Picture type of the frame.
    pub frame_type: FrameType,
    /// Scene score from the detector, passed through for reporting.
    pub score: f64,
}

impl SceneChange {
    pub fn new(timestamp: Timestamp, frame_type: FrameType, score: f64) -> Self {
        Self {
            timestamp,
            frame_type,
            score,
        }
    }
}

/// Outcome of a nearest scene-change lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchResult {
    /// A qualifying scene change at this time.
    Found(Timestamp),
    /// No qualifying scene change, or the direction is disabled.
    NotFound,
}

impl SearchResult {
    /// The found timestamp, if any.
    pub fn timestamp(self) -> Option<Timestamp> {
        match self {
            SearchResult::Found(ts) => Some(ts),
            SearchResult::NotFound => None,
        }
    }

    /// Collapse to the legacy `0.0` "none found" sentinel. Reporting only.
    pub fn or_sentinel(self) -> Timestamp {
        self.timestamp().unwrap_or(Timestamp::ZERO)
    }
}

impl From<Option<Timestamp>> for SearchResult {
    fn from(ts: Option<Timestamp>) -> Self {
        ts.map_or(SearchResult::NotFound, SearchResult::Found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_type_from_code() {
        assert_eq!(FrameType::from_code("I"), FrameType::I);
        assert_eq!(FrameType::from_code(" P "), FrameType::P);
        assert_eq!(FrameType::from_code("B"), FrameType::B);
        assert_eq!(FrameType::from_code("S"), FrameType::Other('S'));
        assert_eq!(FrameType::from_code(""), FrameType::Other('?'));
        assert!(FrameType::I.is_keyframe());
        assert!(!FrameType::P.is_keyframe());
    }

    #[test]
    fn search_result_sentinel() {
        let found = SearchResult::Found(Timestamp::from_millis(9500));
        assert_eq!(found.or_sentinel(), Timestamp::from_millis(9500));
        assert_eq!(SearchResult::NotFound.or_sentinel(), Timestamp::ZERO);
        assert_eq!(SearchResult::from(None), SearchResult::NotFound);
    }
}
