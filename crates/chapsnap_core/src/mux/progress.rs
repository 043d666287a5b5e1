//! Progress parsing for mkvtoolnix output.
//!
//! mkvmerge prints `Progress: NN%` either on separate lines or rewritten in
//! place with carriage returns. Output arrives in arbitrary chunks, so a
//! partial line is held until its terminator shows up.

use once_cell::sync::Lazy;
use regex::Regex;

static PROGRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Progress:\s*(?P<percent>\d{1,3})%").expect("valid regex"));

/// Both separators mkvtoolnix uses between progress updates.
pub(crate) fn is_line_break(c: char) -> bool {
    c == '\r' || c == '\n'
}

/// Incremental `Progress: NN%` parser.
#[derive(Debug, Default)]
pub struct ProgressParser {
    pending: String,
    last: Option<u32>,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of output and return newly reached percentages.
    ///
    /// Values are only reported when they exceed the last reported one.
    pub fn feed(&mut self, chunk: &str) -> Vec<u32> {
        self.pending.push_str(chunk);

        let Some(cut) = self.pending.rfind(is_line_break) else {
            return Vec::new();
        };
        let complete: String = self.pending.drain(..=cut).collect();

        complete
            .split(is_line_break)
            .filter_map(|line| self.accept(line))
            .collect()
    }

    /// Flush any unterminated trailing line.
    pub fn finish(&mut self) -> Option<u32> {
        let rest = std::mem::take(&mut self.pending);
        self.accept(&rest)
    }

    /// Highest percentage reported so far.
    pub fn last(&self) -> Option<u32> {
        self.last
    }

    fn accept(&mut self, line: &str) -> Option<u32> {
        let percent: u32 = PROGRESS_RE
            .captures(line)?
            .name("percent")?
            .as_str()
            .parse()
            .ok()?;
        let percent = percent.min(100);

        if self.last.is_some_and(|last| percent <= last) {
            return None;
        }
        self.last = Some(percent);
        Some(percent)
    }
}
