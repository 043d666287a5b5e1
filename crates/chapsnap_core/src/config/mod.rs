//! Configuration management.
//!
//! TOML settings grouped into sections, loaded with defaults for missing
//! keys and written back atomically one section at a time.
//!
//! # Example
//!
//! ```no_run
//! use chapsnap_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new("chapsnap.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Threshold: {}", config.settings().resync.threshold);
//!
//! config.settings_mut().resync.keyframes_only = true;
//! config.update_section(ConfigSection::Resync).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    CacheSettings, ConfigSection, LoggingSettings, OutputSettings, ResyncSettings, Settings,
    ToolSettings,
};
