//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::mux::MuxMode;
use crate::resync::{ResyncConfig, DEFAULT_THRESHOLD};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Resync behavior.
    #[serde(default)]
    pub resync: ResyncSettings,

    /// Output files and muxing.
    #[serde(default)]
    pub output: OutputSettings,

    /// Scene detection cache.
    #[serde(default)]
    pub cache: CacheSettings,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Check values serde cannot express as types.
    pub fn validate(&self) -> Result<(), String> {
        let threshold = self.resync.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(format!(
                "resync.threshold must be in (0, 1], got {}",
                threshold
            ));
        }
        if !self.resync.offset.is_finite() {
            return Err(format!("resync.offset must be finite, got {}", self.resync.offset));
        }
        Ok(())
    }
}

/// Resync behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResyncSettings {
    /// Scene detection threshold passed to ffprobe.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Seconds added to every chapter before snapping (0 = none).
    #[serde(default)]
    pub offset: f64,

    /// Trim operations applied in order before the offset.
    #[serde(default)]
    pub trim: Vec<i64>,

    /// Allow moving a chapter to a later scene change.
    #[serde(default = "default_true")]
    pub allow_forward: bool,

    /// Allow moving a chapter to an earlier scene change.
    #[serde(default = "default_true")]
    pub allow_backward: bool,

    /// Only snap to I-frame scene changes.
    #[serde(default)]
    pub keyframes_only: bool,

    /// Keep chapters that already sit on a scene change.
    #[serde(default)]
    pub skip_already_synced: bool,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl Default for ResyncSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            offset: 0.0,
            trim: Vec::new(),
            allow_forward: true,
            allow_backward: true,
            keyframes_only: false,
            skip_already_synced: false,
        }
    }
}

impl ResyncSettings {
    /// Build the engine configuration from these settings.
    pub fn to_config(&self) -> ResyncConfig {
        ResyncConfig {
            threshold: self.threshold,
            offset: (self.offset != 0.0).then_some(self.offset),
            trim: self.trim.clone(),
            allow_forward: self.allow_forward,
            allow_backward: self.allow_backward,
            keyframes_only: self.keyframes_only,
            skip_already_synced: self.skip_already_synced,
        }
    }
}

/// Output files and muxing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// How retimed chapters are applied to the video.
    #[serde(default)]
    pub mux_mode: MuxMode,

    /// Inserted before the extension of remuxed videos.
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Appended to the video file name for the chapters file.
    #[serde(default = "default_chapters_suffix")]
    pub chapters_suffix: String,
}

fn default_output_suffix() -> String {
    " (Resynced)".to_string()
}

fn default_chapters_suffix() -> String {
    ".retimed_chapters.txt".to_string()
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            mux_mode: MuxMode::default(),
            output_suffix: default_output_suffix(),
            chapters_suffix: default_chapters_suffix(),
        }
    }
}

/// Scene detection cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Reuse scene detection results between runs.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Shared cache directory. Empty stores sidecar files next to each video.
    #[serde(default)]
    pub directory: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: String::new(),
        }
    }
}

impl CacheSettings {
    /// The shared cache directory, if one is configured.
    pub fn directory(&self) -> Option<PathBuf> {
        (!self.directory.is_empty()).then(|| PathBuf::from(&self.directory))
    }
}

/// External tool locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    #[serde(default = "default_mkvmerge")]
    pub mkvmerge: String,

    #[serde(default = "default_mkvpropedit")]
    pub mkvpropedit: String,
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_mkvmerge() -> String {
    "mkvmerge".to_string()
}

fn default_mkvpropedit() -> String {
    "mkvpropedit".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffprobe: default_ffprobe(),
            mkvmerge: default_mkvmerge(),
            mkvpropedit: default_mkvpropedit(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Also write logs to this file. Empty disables file logging.
    #[serde(default)]
    pub file: String,
}

/// Config sections for atomic updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Resync,
    Output,
    Cache,
    Tools,
    Logging,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Resync => "resync",
            ConfigSection::Output => "output",
            ConfigSection::Cache => "cache",
            ConfigSection::Tools => "tools",
            ConfigSection::Logging => "logging",
        }
    }

    /// All sections in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Resync,
        ConfigSection::Output,
        ConfigSection::Cache,
        ConfigSection::Tools,
        ConfigSection::Logging,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[resync]"));
        assert!(toml.contains("[output]"));
        assert!(toml.contains("threshold = 0.4"));
        assert!(toml.contains("mux_mode = \"remux\""));
    }

    #[test]
    fn settings_round_trip() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.resync.threshold, settings.resync.threshold);
        assert_eq!(parsed.output.output_suffix, settings.output.output_suffix);
        assert_eq!(parsed.output.mux_mode, settings.output.mux_mode);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[resync]\nthreshold = 0.3";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.resync.threshold, 0.3);
        assert!(parsed.resync.allow_forward);
        assert_eq!(parsed.tools.ffprobe, "ffprobe");
        assert!(parsed.cache.enabled);
    }

    #[test]
    fn validate_rejects_bad_threshold() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.resync.threshold = 0.0;
        assert!(settings.validate().is_err());
        settings.resync.threshold = 1.5;
        assert!(settings.validate().is_err());
        settings.resync.threshold = 1.0;
        assert!(settings.validate().is_ok());

        settings.resync.offset = f64::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn to_config_maps_zero_offset_to_none() {
        let mut settings = ResyncSettings::default();
        assert_eq!(settings.to_config().offset, None);

        settings.offset = -1.5;
        settings.trim = vec![1, -1];
        settings.keyframes_only = true;
        let config = settings.to_config();
        assert_eq!(config.offset, Some(-1.5));
        assert_eq!(config.trim, vec![1, -1]);
        assert!(config.keyframes_only);
    }

    #[test]
    fn empty_cache_directory_means_sidecar() {
        let mut cache = CacheSettings::default();
        assert_eq!(cache.directory(), None);
        cache.directory = "/tmp/chapsnap".to_string();
        assert_eq!(cache.directory(), Some(PathBuf::from("/tmp/chapsnap")));
    }
}
