//! Chapter file rendering and output.
//!
//! Serializes chapters to the OGM-style text format:
//! ```text
//! CHAPTER01=00:00:00.000
//! CHAPTER01NAME=Intro
//! ```

use std::path::{Path, PathBuf};

use super::types::{Chapter, ChapterResult};

/// Render chapters as `CHAPTERnn=` / `CHAPTERnnNAME=` line pairs.
///
/// Chapters are numbered from 1 in iteration order. Unnamed chapters get
/// `Chapter NN`. Lines are joined with `\n`, without a trailing newline.
pub fn render<'a>(chapters: impl IntoIterator<Item = &'a Chapter>) -> String {
    chapters
        .into_iter()
        .enumerate()
        .flat_map(|(i, chapter)| {
            let number = i + 1;
            let name = chapter
                .name
                .clone()
                .unwrap_or_else(|| format!("Chapter {:02}", number));
            [
                format!("CHAPTER{:02}={}", number, chapter.start),
                format!("CHAPTER{:02}NAME={}", number, name),
            ]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write chapters to a text chapter file.
pub fn write_chapter_file<'a>(
    chapters: impl IntoIterator<Item = &'a Chapter>,
    path: &Path,
) -> ChapterResult<()> {
    let text = render(chapters);
    std::fs::write(path, text)?;
    tracing::debug!("Wrote chapter file: {}", path.display());
    Ok(())
}

/// Derive the chapter file path for a video by appending `suffix` to its
/// full file name, e.g. `movie.mkv` -> `movie.mkv.retimed_chapters.txt`.
pub fn chapters_file_path(video: &Path, suffix: &str) -> PathBuf {
    let mut name = video
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    video.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::parser::parse_chapter_text;
    use crate::timestamp::Timestamp;
    use tempfile::tempdir;

    fn sample() -> Vec<Chapter> {
        vec![
            Chapter::new(Timestamp::ZERO).with_name("Intro"),
            Chapter::new(Timestamp::from_millis(9_500)),
        ]
    }

    #[test]
    fn render_numbers_and_defaults_names() {
        let text = render(&sample());
        assert_eq!(
            text,
            "CHAPTER01=00:00:00.000\nCHAPTER01NAME=Intro\n\
             CHAPTER02=00:00:09.500\nCHAPTER02NAME=Chapter 02"
        );
    }

    #[test]
    fn render_empty_is_empty() {
        assert_eq!(render(&Vec::new()), "");
    }

    #[test]
    fn rendered_text_parses_back() {
        let parsed = parse_chapter_text(&render(&sample())).unwrap();
        assert_eq!(parsed.chapters[0], sample()[0]);
        assert_eq!(parsed.chapters[1].start, Timestamp::from_millis(9_500));
    }

    #[test]
    fn chapters_file_path_appends_suffix() {
        let path = chapters_file_path(Path::new("/videos/movie.mkv"), ".retimed_chapters.txt");
        assert_eq!(path, PathBuf::from("/videos/movie.mkv.retimed_chapters.txt"));
    }

    #[test]
    fn write_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_chapter_file(&sample(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("CHAPTER01=00:00:00.000"));
    }
}
