//! Chapter time shifting.
//!
//! Applies a global offset to every chapter, typically to compensate for
//! chapters authored against a source with a different lead-in.

use super::types::ChapterList;

/// Shift all chapter start times by `offset` seconds.
///
/// Positive offsets move chapters later, negative ones earlier. Results are
/// clamped to zero. `None` and `Some(0.0)` both leave the list untouched, so
/// a zero offset never causes auto-named chapters to be re-rendered.
///
/// A large negative offset can clamp several chapters to zero; the resync
/// pass later keeps only the first of them.
pub fn apply_offset(chapters: &ChapterList, offset: Option<f64>) -> ChapterList {
    let offset = match offset {
        Some(secs) if secs != 0.0 => secs,
        _ => return chapters.clone(),
    };

    tracing::debug!("Shifting {} chapters by {:+}s", chapters.len(), offset);

    chapters
        .iter()
        .map(|chapter| chapter.moved_to(chapter.start.offset_by(offset)))
        .collect()
}
