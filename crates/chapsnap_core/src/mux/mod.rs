//! Applying retimed chapters to a video with mkvtoolnix.
//!
//! - [`MuxMode::Remux`] writes a new file with `mkvmerge`, dropping the
//!   source chapters and attaching the retimed ones
//! - [`MuxMode::InPlace`] replaces the chapters of the original with
//!   `mkvpropedit`
//! - [`MuxMode::None`] leaves the video alone
//!
//! Both tools exit with 0 on success, 1 on success with warnings and 2 or
//! higher on failure.

mod progress;

use std::ffi::OsString;
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::str::FromStr;
use std::thread;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use progress::ProgressParser;
use progress::is_line_break;

/// How retimed chapters are applied to the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuxMode {
    /// Write `<stem><suffix>.<ext>` next to the source.
    #[default]
    Remux,
    /// Replace the chapters inside the source file.
    InPlace,
    /// Only write the chapters file.
    None,
}

impl fmt::Display for MuxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MuxMode::Remux => "remux",
            MuxMode::InPlace => "in_place",
            MuxMode::None => "none",
        })
    }
}

impl FromStr for MuxMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remux" => Ok(MuxMode::Remux),
            "in_place" | "in-place" => Ok(MuxMode::InPlace),
            "none" => Ok(MuxMode::None),
            other => Err(format!("unknown mux mode '{}'", other)),
        }
    }
}

/// Errors from running mkvtoolnix.
#[derive(Error, Debug)]
pub enum MuxError {
    /// The tool could not be started.
    #[error("{tool} not found; is mkvtoolnix installed and on PATH?")]
    ToolNotFound { tool: String },

    /// The tool ran and reported an error.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// A required input file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl MuxError {
    /// Create a command failed error.
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for mux operations.
pub type MuxResult<T> = Result<T, MuxError>;

/// What [`Muxer::apply`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxOutcome {
    /// A new file was written.
    Remuxed { output: PathBuf, warnings: bool },
    /// The source file's chapters were replaced.
    UpdatedInPlace { video: PathBuf, warnings: bool },
    /// Nothing was done.
    Skipped,
}

/// Runs mkvmerge or mkvpropedit to attach a chapters file.
#[derive(Debug, Clone)]
pub struct Muxer {
    mkvmerge: PathBuf,
    mkvpropedit: PathBuf,
    output_suffix: String,
}

impl Muxer {
    pub fn new() -> Self {
        Self {
            mkvmerge: PathBuf::from("mkvmerge"),
            mkvpropedit: PathBuf::from("mkvpropedit"),
            output_suffix: " (Resynced)".to_string(),
        }
    }

    /// Set a custom path to the mkvmerge executable.
    pub fn with_mkvmerge_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.mkvmerge = path.into();
        self
    }

    /// Set a custom path to the mkvpropedit executable.
    pub fn with_mkvpropedit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.mkvpropedit = path.into();
        self
    }

    /// Set the suffix inserted before the extension of remuxed files.
    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    /// Remux target for a video: `<stem><suffix>.<ext>` in the same directory.
    pub fn output_path(&self, video: &Path) -> PathBuf {
        let mut name = video.file_stem().unwrap_or_default().to_os_string();
        name.push(&self.output_suffix);
        if let Some(ext) = video.extension() {
            name.push(".");
            name.push(ext);
        }
        video.with_file_name(name)
    }

    /// mkvmerge arguments for writing `output` with `chapters` replacing
    /// the source chapters.
    pub fn remux_args(video: &Path, chapters: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-o".into(),
            output.into(),
            "--no-chapters".into(),
            video.into(),
            "--chapters".into(),
            chapters.into(),
        ]
    }

    /// mkvpropedit arguments that clear then set the chapters of `video`.
    pub fn in_place_args(video: &Path, chapters: &Path) -> Vec<OsString> {
        vec![
            video.into(),
            "--chapters".into(),
            "".into(),
            "--chapters".into(),
            chapters.into(),
        ]
    }

    /// Apply `chapters` to `video` according to `mode`.
    ///
    /// `progress` receives increasing percentages and always 100 on success.
    pub fn apply(
        &self,
        mode: MuxMode,
        video: &Path,
        chapters: &Path,
        progress: &mut dyn FnMut(u32),
    ) -> MuxResult<MuxOutcome> {
        if mode == MuxMode::None {
            tracing::debug!("Mux mode is none; leaving {} untouched", video.display());
            return Ok(MuxOutcome::Skipped);
        }

        for path in [video, chapters] {
            if !path.exists() {
                return Err(MuxError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
        }

        match mode {
            MuxMode::Remux => {
                let output = self.output_path(video);
                tracing::info!("Remuxing to {}", output.display());
                let args = Self::remux_args(video, chapters, &output);
                let exit_code = run_tool(&self.mkvmerge, &args, progress)?;
                Ok(MuxOutcome::Remuxed {
                    output,
                    warnings: exit_code == 1,
                })
            }
            MuxMode::InPlace => {
                tracing::info!("Replacing chapters in {}", video.display());
                let args = Self::in_place_args(video, chapters);
                let exit_code = run_tool(&self.mkvpropedit, &args, progress)?;
                Ok(MuxOutcome::UpdatedInPlace {
                    video: video.to_path_buf(),
                    warnings: exit_code == 1,
                })
            }
            MuxMode::None => Ok(MuxOutcome::Skipped),
        }
    }
}

impl Default for Muxer {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a mkvtoolnix tool, streaming its progress. Returns the exit code.
fn run_tool(tool: &Path, args: &[OsString], progress: &mut dyn FnMut(u32)) -> MuxResult<i32> {
    let tool_name = tool.display().to_string();
    tracing::debug!(
        "$ {} {}",
        tool_name,
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut child = Command::new(tool)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => MuxError::ToolNotFound {
                tool: tool_name.clone(),
            },
            _ => MuxError::io_error(format!("starting {}", tool_name), e),
        })?;

    // Drain stderr on its own thread so a chatty tool can't block on a full pipe.
    let stderr_reader = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        })
    });

    let mut parser = ProgressParser::new();
    let mut output = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        let mut buf = [0u8; 4096];
        loop {
            let n = match stdout.read(&mut buf) {
                Ok(n) => n,
                Err(e) => {
                    abandon(&mut child, stderr_reader);
                    return Err(MuxError::io_error(format!("reading {} output", tool_name), e));
                }
            };
            if n == 0 {
                break;
            }
            let chunk = String::from_utf8_lossy(&buf[..n]);
            output.push_str(&chunk);
            for percent in parser.feed(&chunk) {
                progress(percent);
            }
        }
    }
    if let Some(percent) = parser.finish() {
        progress(percent);
    }

    let status = child
        .wait()
        .map_err(|e| MuxError::io_error(format!("waiting for {}", tool_name), e))?;
    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    let exit_code = status.code().unwrap_or(-1);
    if !(0..=1).contains(&exit_code) {
        // mkvtoolnix reports most errors on stdout
        let message = if stderr.trim().is_empty() {
            last_lines(&output, 5)
        } else {
            stderr.trim().to_string()
        };
        return Err(MuxError::command_failed(tool_name, exit_code, message));
    }

    if exit_code == 1 {
        tracing::warn!("{} completed with warnings", tool_name);
    }
    if parser.last() != Some(100) {
        progress(100);
    }

    Ok(exit_code)
}

/// Kill and reap a tool whose output can no longer be read.
fn abandon(child: &mut Child, stderr_reader: Option<thread::JoinHandle<String>>) {
    let _ = child.kill();
    let _ = child.wait();
    if let Some(handle) = stderr_reader {
        let _ = handle.join();
    }
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text
        .split(is_line_break)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    lines[lines.len().saturating_sub(count)..].join("\n")
}
