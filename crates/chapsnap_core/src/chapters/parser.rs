//! Chapter file loading.
//!
//! Handles the two formats chapters are commonly distributed in:
//!
//! The OGM-style text format (as written by this crate and accepted by
//! mkvmerge):
//! ```text
//! CHAPTER01=00:00:00.000
//! CHAPTER01NAME=Intro
//! CHAPTER02=00:01:30.500
//! CHAPTER02NAME=Part 1
//! ```
//!
//! And Matroska chapter XML (as produced by mkvextract):
//! ```xml
//! <?xml version="1.0"?>
//! <Chapters>
//!   <EditionEntry>
//!     <ChapterAtom>
//!       <ChapterTimeStart>00:00:00.000000000</ChapterTimeStart>
//!       <ChapterDisplay>
//!         <ChapterString>Intro</ChapterString>
//!         <ChapterLanguage>eng</ChapterLanguage>
//!       </ChapterDisplay>
//!     </ChapterAtom>
//!   </EditionEntry>
//! </Chapters>
//! ```

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{Chapter, ChapterError, ChapterList, ChapterResult};
use crate::timestamp::Timestamp;

static TIME_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^CHAPTER(?P<number>\d+)=(?P<timestamp>[\d.:]*)$").expect("valid regex")
});

static NAME_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^CHAPTER(?P<number>\d+)NAME=(?P<name>.*)$").expect("valid regex"));

/// Load chapters from a file in either supported format.
///
/// Content that parses as XML is treated as Matroska chapter XML; anything
/// else is parsed as the text format.
pub fn load_chapter_file(path: &Path) -> ChapterResult<ChapterList> {
    tracing::debug!("Loading chapter file: {}", path.display());

    let content = std::fs::read_to_string(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let chapters = match roxmltree::Document::parse(content) {
        Ok(doc) => parse_chapter_document(&doc)?,
        Err(_) => parse_chapter_text(content)?,
    };

    tracing::info!(
        "Loaded {} chapters from {}",
        chapters.len(),
        path.display()
    );
    Ok(chapters)
}

/// Parse the `CHAPTERnn=` / `CHAPTERnnNAME=` text format.
///
/// Blank lines are ignored; the remaining lines must come in
/// timestamp/name pairs with matching chapter numbers.
pub fn parse_chapter_text(text: &str) -> ChapterResult<ChapterList> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut chapters = ChapterList::new();

    for pair in lines.chunks(2) {
        let [time_line, name_line] = pair else {
            return Err(ChapterError::Syntax {
                line: pair[0].to_string(),
            });
        };

        let (Some(time), Some(name)) = (TIME_LINE.captures(time_line), NAME_LINE.captures(name_line))
        else {
            return Err(ChapterError::Syntax {
                line: format!("{}\n{}", time_line, name_line),
            });
        };

        let first = &time["number"];
        let second = &name["number"];
        if first != second {
            return Err(ChapterError::NumberMismatch {
                first: first.to_string(),
                second: second.to_string(),
            });
        }

        let timestamp = &time["timestamp"];
        if timestamp.is_empty() {
            return Err(ChapterError::MissingTimecode(first.to_string()));
        }

        let start: Timestamp = timestamp.parse()?;
        let mut chapter = Chapter::new(start);
        let name = name["name"].trim();
        if !name.is_empty() {
            chapter = chapter.with_name(name);
        }
        chapters.push(chapter);
    }

    Ok(chapters)
}

/// Parse Matroska chapter XML.
///
/// Only the first `EditionEntry` is read; nested chapter atoms are ignored.
pub fn parse_chapter_xml(xml: &str) -> ChapterResult<ChapterList> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| ChapterError::MalformedXml(format!("XML parse error: {}", e)))?;
    parse_chapter_document(&doc)
}

fn parse_chapter_document(doc: &roxmltree::Document) -> ChapterResult<ChapterList> {
    let root = doc.root_element();
    if root.tag_name().name() != "Chapters" {
        return Err(ChapterError::MalformedXml(
            "Root element must be <Chapters>".to_string(),
        ));
    }

    let edition = child_element(&root, "EditionEntry").ok_or(ChapterError::NoChapters)?;

    let mut chapters = ChapterList::new();

    for (i, atom) in edition
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "ChapterAtom")
        .enumerate()
    {
        let number = format!("{:02}", i + 1);

        let start = child_element(&atom, "ChapterTimeStart")
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChapterError::MissingTimecode(number.clone()))?;

        let mut chapter = Chapter::new(start.parse()?);

        // ChapterTimeStart is required, the display name is not
        if let Some(name) = child_element(&atom, "ChapterDisplay")
            .and_then(|display| child_element(&display, "ChapterString"))
            .and_then(|n| n.text())
        {
            chapter = chapter.with_name(name.trim());
        }

        chapters.push(chapter);
    }

    Ok(chapters)
}

fn child_element<'a, 'input>(
    node: &roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}
