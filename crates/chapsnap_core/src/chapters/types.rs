//! Chapter types and error definitions.
//!
//! Provides types for representing a chapter timeline and errors that
//! can occur while loading or transforming it.

use serde::{Deserialize, Serialize};

use crate::timestamp::{Timestamp, TimestampError};

/// A single chapter: where it starts and what it is called.
///
/// Chapters are values. Transforms return new chapters rather than
/// mutating in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter start time.
    pub start: Timestamp,
    /// Display name, if the source had one.
    pub name: Option<String>,
}

impl Chapter {
    /// Create an unnamed chapter at the given time.
    pub fn new(start: Timestamp) -> Self {
        Self { start, name: None }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether the name is just this chapter's own start time rendered as text.
    ///
    /// Such names were generated by a muxer rather than written by a person,
    /// so they follow the chapter when it moves.
    pub fn is_auto_named(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name == self.start.to_string())
    }

    /// Return a copy of this chapter moved to `start`.
    ///
    /// Auto-generated names are re-rendered for the new time; other names
    /// are kept verbatim.
    pub fn moved_to(&self, start: Timestamp) -> Chapter {
        let name = if self.is_auto_named() {
            Some(start.to_string())
        } else {
            self.name.clone()
        };
        Chapter { start, name }
    }

    /// Name for display in reports.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("—")
    }
}

/// An ordered chapter timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterList {
    /// Chapters in source order.
    pub chapters: Vec<Chapter>,
}

impl ChapterList {
    /// Create an empty chapter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chapter at the end.
    pub fn push(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Get the number of chapters.
    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    /// Check if there are no chapters.
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Get an iterator over chapters.
    pub fn iter(&self) -> impl Iterator<Item = &Chapter> {
        self.chapters.iter()
    }

    /// Start times in order.
    pub fn start_times(&self) -> Vec<Timestamp> {
        self.chapters.iter().map(|c| c.start).collect()
    }
}

impl From<Vec<Chapter>> for ChapterList {
    fn from(chapters: Vec<Chapter>) -> Self {
        Self { chapters }
    }
}

impl FromIterator<Chapter> for ChapterList {
    fn from_iter<I: IntoIterator<Item = Chapter>>(iter: I) -> Self {
        Self {
            chapters: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ChapterList {
    type Item = &'a Chapter;
    type IntoIter = std::slice::Iter<'a, Chapter>;

    fn into_iter(self) -> Self::IntoIter {
        self.chapters.iter()
    }
}

/// Error types for chapter operations.
#[derive(Debug, thiserror::Error)]
pub enum ChapterError {
    /// Trim count reaches past the chapter list.
    #[error("Cannot trim {count} chapters from a list of {available}")]
    TrimOutOfRange { count: i64, available: usize },

    /// A chapter file line pair did not match the expected syntax.
    #[error("Unexpected chapter file syntax near:\n{line}")]
    Syntax { line: String },

    /// Timestamp and name lines carry different chapter numbers.
    #[error("The chapter numbers ({first}, {second}) do not match")]
    NumberMismatch { first: String, second: String },

    /// A chapter has no start time.
    #[error("The timecode is missing from chapter {0}")]
    MissingTimecode(String),

    /// Chapter XML is malformed.
    #[error("Malformed chapter XML: {0}")]
    MalformedXml(String),

    /// No chapters found in source.
    #[error("No chapters found in source")]
    NoChapters,

    /// A timestamp could not be decoded.
    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Type alias for chapter operation results.
pub type ChapterResult<T> = Result<T, ChapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_named_chapter_is_detected() {
        let ts = Timestamp::from_millis(9500);
        assert!(Chapter::new(ts).with_name("00:00:09.500").is_auto_named());
        assert!(!Chapter::new(ts).with_name("00:00:10.000").is_auto_named());
        assert!(!Chapter::new(ts).with_name("Intro").is_auto_named());
        assert!(!Chapter::new(ts).is_auto_named());
    }

    #[test]
    fn moved_to_renames_only_auto_names() {
        let ts = Timestamp::from_millis(9500);
        let to = Timestamp::from_millis(10_000);

        let auto = Chapter::new(ts).with_name("00:00:09.500").moved_to(to);
        assert_eq!(auto.start, to);
        assert_eq!(auto.name.as_deref(), Some("00:00:10.000"));

        let named = Chapter::new(ts).with_name("Opening").moved_to(to);
        assert_eq!(named.name.as_deref(), Some("Opening"));

        let unnamed = Chapter::new(ts).moved_to(to);
        assert_eq!(unnamed.name, None);
    }

    #[test]
    fn chapter_list_collects() {
        let list: ChapterList = [0, 30_000]
            .into_iter()
            .map(|ms| Chapter::new(Timestamp::from_millis(ms)))
            .collect();
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.start_times(),
            vec![Timestamp::ZERO, Timestamp::from_millis(30_000)]
        );
    }
}
