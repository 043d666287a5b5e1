//! Chapter trimming.
//!
//! Removes chapters from either end of the timeline, e.g. when the source
//! the chapters were authored against carried an intro or outro that the
//! target video does not.

use super::types::{ChapterError, ChapterList, ChapterResult};

/// Apply a sequence of trims to a chapter list.
///
/// Each entry is applied in turn against the result of the previous one:
/// - `n > 0` removes the first `n` chapters and moves the rest earlier by
///   the gap between the old first chapter and the new one, so the new
///   first chapter lands where the old first chapter was.
/// - `n < 0` removes the last `|n|` chapters. Earlier chapters keep their
///   times.
/// - `n == 0` does nothing.
///
/// Auto-named chapters are re-rendered for their new time.
///
/// # Errors
///
/// `TrimOutOfRange` if `|n|` is not smaller than the number of chapters
/// left at that point.
pub fn apply_trim(chapters: &ChapterList, trim: &[i64]) -> ChapterResult<ChapterList> {
    let mut current = chapters.clone();
    for &count in trim {
        current = trim_once(&current, count)?;
    }
    Ok(current)
}

fn trim_once(chapters: &ChapterList, count: i64) -> ChapterResult<ChapterList> {
    if count == 0 {
        return Ok(chapters.clone());
    }

    let available = chapters.len();
    let n = usize::try_from(count.unsigned_abs()).unwrap_or(usize::MAX);
    if n >= available {
        return Err(ChapterError::TrimOutOfRange { count, available });
    }

    if count > 0 {
        let old_first = chapters.chapters[0].start;
        let new_first = chapters.chapters[n].start;
        let gap = new_first.saturating_sub(old_first);

        tracing::debug!(
            "Trimming first {} chapters, moving the rest back by {}",
            n,
            gap
        );

        Ok(chapters.chapters[n..]
            .iter()
            .map(|c| c.moved_to(c.start.saturating_sub(gap)))
            .collect())
    } else {
        tracing::debug!("Trimming last {} chapters", n);

        Ok(chapters.chapters[..available - n]
            .iter()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::types::Chapter;
    use crate::timestamp::Timestamp;

    fn list(secs: &[u64]) -> ChapterList {
        secs.iter()
            .map(|&s| Chapter::new(Timestamp::from_millis(s * 1000)))
            .collect()
    }

    #[test]
    fn positive_trim_drops_head_and_shifts() {
        let trimmed = apply_trim(&list(&[0, 30, 60]), &[1]).unwrap();
        assert_eq!(trimmed, list(&[0, 30]));
    }

    #[test]
    fn positive_trim_of_several_chapters() {
        let trimmed = apply_trim(&list(&[0, 30, 60, 90]), &[2]).unwrap();
        assert_eq!(trimmed, list(&[0, 30]));
    }

    #[test]
    fn negative_trim_drops_tail_without_shift() {
        let trimmed = apply_trim(&list(&[0, 30, 60]), &[-1]).unwrap();
        assert_eq!(trimmed, list(&[0, 30]));
    }

    #[test]
    fn trims_apply_in_sequence() {
        let trimmed = apply_trim(&list(&[0, 10, 30, 60, 100]), &[1, -1, 1]).unwrap();
        // [0,10,30,60,100] -> [0,20,50,90] -> [0,20,50] -> [0,30]
        assert_eq!(trimmed, list(&[0, 30]));
    }

    #[test]
    fn zero_trim_is_noop() {
        let original = list(&[0, 30]);
        assert_eq!(apply_trim(&original, &[0]).unwrap(), original);
        assert_eq!(apply_trim(&original, &[]).unwrap(), original);
    }

    #[test]
    fn trim_out_of_range_fails() {
        let original = list(&[0, 30, 60]);
        for count in [3, -3, 10, i64::MIN] {
            assert!(matches!(
                apply_trim(&original, &[count]),
                Err(ChapterError::TrimOutOfRange { available: 3, .. })
            ));
        }
    }

    #[test]
    fn trim_renames_auto_named_chapters() {
        let chapters: ChapterList = vec![
            Chapter::new(Timestamp::ZERO).with_name("Intro"),
            Chapter::new(Timestamp::from_millis(30_000)).with_name("00:00:30.000"),
            Chapter::new(Timestamp::from_millis(60_000)).with_name("Finale"),
        ]
        .into();

        let trimmed = apply_trim(&chapters, &[1]).unwrap();
        assert_eq!(trimmed.chapters[0].name.as_deref(), Some("00:00:00.000"));
        assert_eq!(trimmed.chapters[1].name.as_deref(), Some("Finale"));
        assert_eq!(trimmed.chapters[1].start, Timestamp::from_millis(30_000));
    }
}
