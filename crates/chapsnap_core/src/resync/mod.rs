//! Chapter resynchronization.
//!
//! Moves chapter boundaries onto nearby detected scene changes and builds
//! the retimed chapter timeline.
//!
//! # Usage
//!
//! ```
//! use chapsnap_core::chapters::{Chapter, ChapterList};
//! use chapsnap_core::resync::{resync, ResyncConfig};
//! use chapsnap_core::scenes::{FrameType, SceneChange, SceneIndex};
//! use chapsnap_core::timestamp::Timestamp;
//!
//! let chapters: ChapterList = vec![Chapter::new(Timestamp::from_millis(5_000))].into();
//! let scenes = SceneIndex::new(vec![SceneChange::new(
//!     Timestamp::from_millis(5_200),
//!     FrameType::I,
//!     0.8,
//! )]);
//!
//! let report = resync(&chapters, &scenes, &ResyncConfig::default());
//! assert_eq!(report.timeline.chapters()[0].start, Timestamp::from_millis(5_200));
//! ```

mod config;
mod engine;
mod report;
mod timeline;

pub use config::{ResyncConfig, DEFAULT_THRESHOLD};
pub use engine::{
    prepare_chapters, resync, ChapterOutcome, ChapterResync, ResyncReport, ResyncStats,
};
pub use report::{ReportRow, DROPPED_PLACEHOLDER};
pub use timeline::RetimedTimeline;
