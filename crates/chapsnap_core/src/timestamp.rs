//! Timestamp codec.
//!
//! Chapter and scene-change times are held as whole nanoseconds so that
//! equality checks and ordered keys are exact. The text form used in
//! chapter files and reports is `HH:MM:SS.mmm`, truncated to milliseconds,
//! with an uncapped hour field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MS: u64 = 1_000_000;

/// Error types for timestamp conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimestampError {
    /// Duration is negative or not finite.
    #[error("Invalid duration: {0} seconds")]
    InvalidDuration(f64),

    /// Text does not match `HH:MM:SS.fff`.
    #[error("Malformed timestamp: '{0}'")]
    MalformedTimestamp(String),
}

/// Type alias for timestamp results.
pub type TimestampResult<T> = Result<T, TimestampError>;

/// A non-negative point on the video timeline, in nanoseconds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Start of the video.
    pub const ZERO: Timestamp = Timestamp(0);

    /// Create from a nanosecond count.
    pub const fn from_nanos(ns: u64) -> Self {
        Self(ns)
    }

    /// Create from a millisecond count.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms * NANOS_PER_MS)
    }

    /// Create from seconds, rejecting negative and non-finite input.
    ///
    /// Values past `u64::MAX` nanoseconds (about 584 years) saturate.
    pub fn from_secs(secs: f64) -> TimestampResult<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(TimestampError::InvalidDuration(secs));
        }
        // float-to-int casts saturate
        Ok(Self((secs * NANOS_PER_SEC as f64).round() as u64))
    }

    /// Nanoseconds since the start of the video.
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Whole milliseconds (truncated).
    pub const fn as_millis(self) -> u64 {
        self.0 / NANOS_PER_MS
    }

    /// Seconds as a float.
    pub fn as_secs(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    /// Move by a signed number of seconds, clamping at zero.
    pub fn offset_by(self, offset_secs: f64) -> Self {
        // float-to-int casts saturate, so NaN becomes 0 and infinities clamp
        let offset_ns = (offset_secs * NANOS_PER_SEC as f64).round() as i128;
        let shifted = (self.0 as i128 + offset_ns).clamp(0, u64::MAX as i128);
        Self(shifted as u64)
    }

    /// Subtract another timestamp, clamping at zero.
    pub const fn saturating_sub(self, other: Timestamp) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Absolute distance to another timestamp in nanoseconds.
    pub const fn distance(self, other: Timestamp) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = self.as_millis();
        let ms = total_ms % 1000;
        let total_secs = total_ms / 1000;
        let secs = total_secs % 60;
        let mins = (total_secs / 60) % 60;
        let hours = total_secs / 3600;
        write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_timestamp(s).ok_or_else(|| TimestampError::MalformedTimestamp(s.to_string()))
    }
}

/// Format seconds as `HH:MM:SS.mmm`.
pub fn encode(seconds: f64) -> TimestampResult<String> {
    Ok(Timestamp::from_secs(seconds)?.to_string())
}

/// Parse `HH:MM:SS.fff` into seconds.
pub fn decode(text: &str) -> TimestampResult<f64> {
    text.parse::<Timestamp>().map(Timestamp::as_secs)
}

fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let mut parts = text.split(':');
    let (hours, minutes, rest) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (seconds, fraction) = rest.split_once('.')?;
    if fraction.is_empty() || fraction.len() > 9 {
        return None;
    }

    let hours = parse_digits(hours)?;
    let minutes = parse_digits(minutes)?;
    let seconds = parse_digits(seconds)?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    // Right-pad the fraction to nanoseconds
    let nanos = parse_digits(fraction)? * 10u64.pow(9 - fraction.len() as u32);

    let total_secs = hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)?;
    let total_ns = total_secs.checked_mul(NANOS_PER_SEC)?.checked_add(nanos)?;
    Some(Timestamp(total_ns))
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
