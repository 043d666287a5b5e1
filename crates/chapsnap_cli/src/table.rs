//! Plain-text tables for the terminal.

use std::fmt::Write as _;

use chapsnap_core::chapters::ChapterList;
use chapsnap_core::resync::{ReportRow, ResyncStats};
use chapsnap_core::scenes::SceneChange;

/// Left-aligned columns sized to their widest cell.
pub struct Table {
    title: String,
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(title: impl Into<String>, headers: Vec<&'static str>) -> Self {
        Self {
            title: title.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "{}", format_line(self.headers.iter().copied(), &widths));
        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        let _ = writeln!(out, "{}", "-".repeat(total));
        for row in &self.rows {
            let _ = writeln!(out, "{}", format_line(row.iter().map(String::as_str), &widths));
        }
        out
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &w)| format!("{:<w$}", cell, w = w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn chapters_table(title: &str, chapters: &ChapterList) -> Table {
    let mut table = Table::new(title, vec!["#", "Start", "Name"]);
    for (i, chapter) in chapters.iter().enumerate() {
        table.push(vec![
            format!("{:02}", i + 1),
            chapter.start.to_string(),
            chapter.display_name().to_string(),
        ]);
    }
    table
}

pub fn scenes_table(scenes: &[SceneChange]) -> Table {
    let mut table = Table::new(
        format!("Scene changes ({})", scenes.len()),
        vec!["Time", "Type", "Score"],
    );
    for scene in scenes {
        table.push(vec![
            scene.timestamp.to_string(),
            scene.frame_type.to_string(),
            format!("{:.3}", scene.score),
        ]);
    }
    table
}

pub fn resync_table(rows: &[ReportRow]) -> Table {
    let mut table = Table::new(
        "Resync",
        vec!["#", "In", "Name", "Original", "Retimed", "Forward", "Backward", "Status"],
    );
    for row in rows {
        table.push(vec![
            row.number.clone(),
            format!("{:02}", row.index),
            row.name.clone(),
            row.original.clone(),
            row.retimed.clone(),
            row.forward.clone(),
            row.backward.clone(),
            row.status.to_string(),
        ]);
    }
    table
}

pub fn stats_line(stats: &ResyncStats) -> String {
    format!(
        "{} chapters: {} moved, {} unchanged, {} already synced, {} dropped (max shift {} ms, avg {:.1} ms)",
        stats.chapter_count,
        stats.moved,
        stats.unchanged,
        stats.already_synced,
        stats.dropped,
        stats.max_shift_ms,
        stats.avg_shift_ms
    )
}
