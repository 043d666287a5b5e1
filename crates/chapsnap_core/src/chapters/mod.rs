//! Chapter timeline module.
//!
//! This module handles loading, transforming, and serializing chapter
//! lists.
//!
//! # Features
//!
//! - **Loading**: Read OGM-style text or Matroska XML chapter files
//! - **Trimming**: Drop chapters from either end of the timeline
//! - **Shifting**: Apply a global offset to chapter start times
//! - **Rendering**: Write chapters back out in the text format
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use chapsnap_core::chapters::{apply_offset, apply_trim, load_chapter_file, render};
//!
//! let chapters = load_chapter_file(Path::new("chapters.xml"))?;
//! let chapters = apply_trim(&chapters, &[1])?;
//! let chapters = apply_offset(&chapters, Some(-0.5));
//! println!("{}", render(&chapters));
//! # Ok::<(), chapsnap_core::chapters::ChapterError>(())
//! ```

mod parser;
mod shifter;
mod trim;
mod types;
mod writer;

pub use parser::{load_chapter_file, parse_chapter_text, parse_chapter_xml};
pub use shifter::apply_offset;
pub use trim::apply_trim;
pub use types::{Chapter, ChapterError, ChapterList, ChapterResult};
pub use writer::{chapters_file_path, render, write_chapter_file};
