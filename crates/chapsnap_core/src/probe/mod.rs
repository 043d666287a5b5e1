//! Video probing using ffprobe.
//!
//! Reads a video's chapter list and detects scene changes through the
//! lavfi `select=gt(scene,T)` filter. Tool output is validated once here
//! into [`Chapter`] and [`SceneChange`] records.

mod cache;
mod types;

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::chapters::{Chapter, ChapterList};
use crate::scenes::{FrameType, SceneChange};
use crate::timestamp::Timestamp;

pub use cache::{cache_key, SceneCache};
pub use types::{ProbeError, ProbeResult};
use types::{RawChapters, RawFrames};

/// Tag ffprobe stores the scene score under.
const SCENE_SCORE_TAG: &str = "lavfi.scene_score";

/// Runs ffprobe against video files.
#[derive(Debug, Clone)]
pub struct Prober {
    /// Path to ffprobe executable.
    ffprobe: PathBuf,
}

impl Prober {
    /// Use `ffprobe` from PATH.
    pub fn new() -> Self {
        Self {
            ffprobe: PathBuf::from("ffprobe"),
        }
    }

    /// Set a custom path to the ffprobe executable.
    pub fn with_ffprobe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffprobe = path.into();
        self
    }

    /// The ffprobe command in use.
    pub fn ffprobe(&self) -> &Path {
        &self.ffprobe
    }

    /// Read the chapter list embedded in a video.
    pub fn chapters(&self, video: &Path) -> ProbeResult<ChapterList> {
        ensure_exists(video)?;
        tracing::debug!("Probing chapters: {}", video.display());

        let stdout = self.run([
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-show_chapters"),
            OsStr::new("-of"),
            OsStr::new("json"),
            video.as_os_str(),
        ])?;

        let chapters = parse_chapters_json(&stdout)?;
        tracing::info!("Found {} chapters in {}", chapters.len(), video.display());
        Ok(chapters)
    }

    /// Run scene detection and return ffprobe's raw frame JSON.
    ///
    /// This decodes the whole video and can take a while.
    pub fn scene_changes_json(&self, video: &Path, threshold: f64) -> ProbeResult<String> {
        ensure_exists(video)?;
        let filter = scene_filter(video, threshold);
        tracing::debug!("Detecting scene changes with filter: {}", filter);

        self.run([
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-show_frames"),
            OsStr::new("-of"),
            OsStr::new("json"),
            OsStr::new("-f"),
            OsStr::new("lavfi"),
            OsStr::new(&filter),
        ])
    }

    /// Run scene detection and parse the result.
    pub fn scene_changes(&self, video: &Path, threshold: f64) -> ProbeResult<Vec<SceneChange>> {
        let json = self.scene_changes_json(video, threshold)?;
        let scenes = parse_frames_json(&json)?;
        tracing::info!(
            "Found {} scene changes in {} (threshold {})",
            scenes.len(),
            video.display(),
            threshold
        );
        Ok(scenes)
    }

    fn run<I, S>(&self, args: I) -> ProbeResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let tool = self.ffprobe.display().to_string();
        let output = Command::new(&self.ffprobe)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ProbeError::ToolNotFound { tool: tool.clone() },
                _ => ProbeError::Io(e),
            })?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                tool,
                exit_code: output.status.code().unwrap_or(-1),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for Prober {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_exists(path: &Path) -> ProbeResult<()> {
    if !path.exists() {
        return Err(ProbeError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Build the lavfi source string for scene detection.
///
/// Each filter element has `,` and `'` backslash-escaped before the
/// elements are joined, so paths containing either survive the filtergraph
/// parser.
pub fn scene_filter(video: &Path, threshold: f64) -> String {
    let path = filter_path(video);
    [
        format!("movie='{}'", path),
        format!("select=gt(scene,{})", threshold),
    ]
    .iter()
    .map(|element| element.replace(',', "\\,").replace('\'', "\\'"))
    .collect::<Vec<_>>()
    .join(",")
}

#[cfg(windows)]
fn filter_path(video: &Path) -> String {
    video.to_string_lossy().replace('\\', "/")
}

// backslash is a legal filename character here
#[cfg(not(windows))]
fn filter_path(video: &Path) -> String {
    video.to_string_lossy().into_owned()
}

/// Parse `ffprobe -show_chapters -of json` output.
pub fn parse_chapters_json(json: &str) -> ProbeResult<ChapterList> {
    let raw: RawChapters = serde_json::from_str(json)?;

    raw.chapters
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let start = parse_seconds(raw.start_time.as_deref(), "chapter", "start_time", i)?;
            let mut chapter = Chapter::new(start);
            if let Some(title) = raw.title() {
                chapter = chapter.with_name(title);
            }
            Ok(chapter)
        })
        .collect::<ProbeResult<Vec<_>>>()
        .map(ChapterList::from)
}

/// Parse `ffprobe -show_frames -of json` output from the scene filter.
///
/// The result is sorted by timestamp.
pub fn parse_frames_json(json: &str) -> ProbeResult<Vec<SceneChange>> {
    let raw: RawFrames = serde_json::from_str(json)?;

    let mut scenes = raw
        .frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let timestamp = parse_seconds(
                frame.best_effort_timestamp_time.as_deref(),
                "frame",
                "best_effort_timestamp_time",
                i,
            )?;

            let frame_type = FrameType::from_code(frame.pict_type.as_deref().unwrap_or(""));

            let score = frame
                .tags
                .get(SCENE_SCORE_TAG)
                .ok_or_else(|| invalid("frame", i, format!("missing tag {}", SCENE_SCORE_TAG)))?
                .trim()
                .parse::<f64>()
                .map_err(|e| invalid("frame", i, format!("bad {}: {}", SCENE_SCORE_TAG, e)))?;

            Ok(SceneChange::new(timestamp, frame_type, score))
        })
        .collect::<ProbeResult<Vec<_>>>()?;

    scenes.sort_by_key(|s| s.timestamp);
    Ok(scenes)
}

fn parse_seconds(
    value: Option<&str>,
    kind: &'static str,
    field: &str,
    index: usize,
) -> ProbeResult<Timestamp> {
    let text = value.ok_or_else(|| invalid(kind, index, format!("missing {}", field)))?;
    let secs: f64 = text
        .trim()
        .parse()
        .map_err(|_| invalid(kind, index, format!("non-numeric {} '{}'", field, text)))?;
    Timestamp::from_secs(secs).map_err(|e| invalid(kind, index, e.to_string()))
}

fn invalid(kind: &'static str, index: usize, message: String) -> ProbeError {
    ProbeError::InvalidRecord {
        kind,
        index,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAPTERS_JSON: &str = r#"{
        "chapters": [
            {"id": 1, "time_base": "1/1000000000", "start": 0, "start_time": "0.000000",
             "end": 10000000000, "end_time": "10.000000", "tags": {"title": "Intro"}},
            {"id": 2, "time_base": "1/1000000000", "start": 10000000000, "start_time": "10.000000",
             "end": 20000000000, "end_time": "20.000000"}
        ]
    }"#;

    const FRAMES_JSON: &str = r#"{
        "frames": [
            {"media_type": "video", "best_effort_timestamp_time": "19.000000", "pict_type": "I",
             "tags": {"lavfi.scene_score": "0.812000"}},
            {"media_type": "video", "best_effort_timestamp_time": "9.500000", "pict_type": "P",
             "tags": {"lavfi.scene_score": "0.455000"}}
        ]
    }"#;

    #[test]
    fn parses_chapters() {
        let chapters = parse_chapters_json(CHAPTERS_JSON).unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters.chapters[0].name.as_deref(), Some("Intro"));
        assert_eq!(chapters.chapters[1].start, Timestamp::from_millis(10_000));
        assert_eq!(chapters.chapters[1].name, None);
    }

    #[test]
    fn no_chapters_key_is_empty() {
        assert!(parse_chapters_json("{}").unwrap().is_empty());
    }

    #[test]
    fn parses_frames_sorted() {
        let scenes = parse_frames_json(FRAMES_JSON).unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].timestamp, Timestamp::from_millis(9_500));
        assert_eq!(scenes[0].frame_type, FrameType::P);
        assert!((scenes[0].score - 0.455).abs() < 1e-9);
        assert_eq!(scenes[1].frame_type, FrameType::I);
    }

    #[test]
    fn bad_frame_record_reports_index() {
        let json = r#"{"frames": [{"best_effort_timestamp_time": "abc", "pict_type": "I",
                       "tags": {"lavfi.scene_score": "0.5"}}]}"#;
        match parse_frames_json(json).unwrap_err() {
            ProbeError::InvalidRecord { kind, index, .. } => {
                assert_eq!(kind, "frame");
                assert_eq!(index, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_chapter_time_is_rejected() {
        let json = r#"{"chapters": [{"start_time": "-1.0"}]}"#;
        assert!(matches!(
            parse_chapters_json(json),
            Err(ProbeError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn missing_score_is_rejected() {
        let json = r#"{"frames": [{"best_effort_timestamp_time": "1.0", "pict_type": "I"}]}"#;
        assert!(matches!(
            parse_frames_json(json),
            Err(ProbeError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn scene_filter_escapes_elements() {
        let filter = scene_filter(Path::new("/videos/it's, here.mkv"), 0.4);
        assert_eq!(
            filter,
            r"movie=\'/videos/it\'s\, here.mkv\',select=gt(scene\,0.4)"
        );
    }

    #[cfg(unix)]
    #[test]
    fn scene_filter_keeps_backslashes_in_unix_paths() {
        let filter = scene_filter(Path::new(r"/videos/a\b.mkv"), 0.3);
        assert_eq!(filter, r"movie=\'/videos/a\b.mkv\',select=gt(scene\,0.3)");
    }

    #[test]
    fn missing_video_is_reported() {
        let prober = Prober::new();
        let err = prober.chapters(Path::new("/definitely/not/here.mkv")).unwrap_err();
        assert!(matches!(err, ProbeError::FileNotFound(_)));
    }

    #[test]
    fn missing_tool_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("video.mkv");
        std::fs::write(&video, b"").unwrap();

        let prober = Prober::new().with_ffprobe_path(dir.path().join("no-such-ffprobe"));
        let err = prober.chapters(&video).unwrap_err();
        assert!(matches!(err, ProbeError::ToolNotFound { .. }));
    }
}
