//! Resync pass configuration.

use serde::{Deserialize, Serialize};

/// Default scene-change probability threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Read-only options for one resync pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResyncConfig {
    /// Scene-change probability threshold handed to the detector, in (0, 1].
    pub threshold: f64,
    /// Seconds added to every chapter before resyncing.
    pub offset: Option<f64>,
    /// Trim counts applied in order before the offset.
    pub trim: Vec<i64>,
    /// Allow moving chapters later in time.
    pub allow_forward: bool,
    /// Allow moving chapters earlier in time.
    pub allow_backward: bool,
    /// Only snap to scene changes on I-frames.
    pub keyframes_only: bool,
    /// Leave chapters that already sit on a scene change untouched.
    pub skip_already_synced: bool,
}

impl Default for ResyncConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            offset: None,
            trim: Vec::new(),
            allow_forward: true,
            allow_backward: true,
            keyframes_only: false,
            skip_already_synced: false,
        }
    }
}
