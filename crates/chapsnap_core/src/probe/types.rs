//! Raw ffprobe output records and probe error definitions.

use std::collections::HashMap;
use std::io;

use serde::Deserialize;

/// Top level of `ffprobe -show_chapters -of json`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawChapters {
    #[serde(default)]
    pub chapters: Vec<RawChapter>,
}

/// One chapter as ffprobe reports it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawChapter {
    pub start_time: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl RawChapter {
    /// Chapter title; ffprobe keeps the container's tag casing.
    pub fn title(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("title"))
            .map(|(_, v)| v.as_str())
    }
}

/// Top level of `ffprobe -show_frames -of json`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawFrames {
    #[serde(default)]
    pub frames: Vec<RawFrame>,
}

/// One selected frame as ffprobe reports it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawFrame {
    pub best_effort_timestamp_time: Option<String>,
    pub pict_type: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// Error types for probing.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The video file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(std::path::PathBuf),

    /// The external tool could not be started.
    #[error("{tool} not found; is it installed and on PATH?")]
    ToolNotFound { tool: String },

    /// The external tool ran but failed.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// A record in the tool output is missing a field or holds a bad value.
    #[error("Invalid {kind} record #{index}: {message}")]
    InvalidRecord {
        kind: &'static str,
        index: usize,
        message: String,
    },

    /// Tool output is not valid JSON of the expected shape.
    #[error("Failed to parse probe output: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Type alias for probe results.
pub type ProbeResult<T> = Result<T, ProbeError>;
