//! chapsnap core - chapter resynchronization onto scene changes
//!
//! This crate holds all resync logic plus the thin wrappers around ffprobe
//! and mkvtoolnix. The `chapsnap` binary is a front end over [`job`].

pub mod chapters;
pub mod config;
pub mod job;
pub mod logging;
pub mod mux;
pub mod probe;
pub mod resync;
pub mod scenes;
pub mod timestamp;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
