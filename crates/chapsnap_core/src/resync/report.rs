//! Tabular view of a resync pass for display.

use serde::Serialize;

use super::engine::{ChapterOutcome, ResyncReport};

/// Shown in place of an output number for dropped chapters.
pub const DROPPED_PLACEHOLDER: &str = "—";

/// One display row per input chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// Output position (`01`, `02`, ...) or [`DROPPED_PLACEHOLDER`].
    pub number: String,
    /// 1-based input index.
    pub index: usize,
    /// Display name of the output chapter (or of the input if dropped).
    pub name: String,
    /// Start time before resync.
    pub original: String,
    /// Start time after resync, or the colliding time if dropped.
    pub retimed: String,
    /// Forward candidate, `00:00:00.000` when none.
    pub forward: String,
    /// Backward candidate, `00:00:00.000` when none.
    pub backward: String,
    /// Short status label.
    pub status: &'static str,
}

impl ResyncReport {
    /// Build display rows numbered by output position.
    pub fn rows(&self) -> Vec<ReportRow> {
        self.chapters
            .iter()
            .map(|record| {
                let number = record
                    .position
                    .map(|p| format!("{:02}", p))
                    .unwrap_or_else(|| DROPPED_PLACEHOLDER.to_string());

                let name = record
                    .retimed
                    .as_ref()
                    .unwrap_or(&record.original)
                    .display_name()
                    .to_string();

                let (retimed, forward, backward, status) = match &record.outcome {
                    ChapterOutcome::AlreadySynced => (
                        record.original.start.to_string(),
                        String::new(),
                        String::new(),
                        "already synced",
                    ),
                    ChapterOutcome::Snapped {
                        to,
                        forward,
                        backward,
                    } => (
                        to.to_string(),
                        forward.or_sentinel().to_string(),
                        backward.or_sentinel().to_string(),
                        if *to == record.original.start {
                            "on scene change"
                        } else {
                            "moved"
                        },
                    ),
                    ChapterOutcome::NoCandidate => (
                        record.original.start.to_string(),
                        String::new(),
                        String::new(),
                        "no scene change",
                    ),
                    ChapterOutcome::Dropped {
                        collided_at,
                        forward,
                        backward,
                    } => (
                        collided_at.to_string(),
                        forward.or_sentinel().to_string(),
                        backward.or_sentinel().to_string(),
                        "dropped",
                    ),
                };

                ReportRow {
                    number,
                    index: record.index,
                    name,
                    original: record.original.start.to_string(),
                    retimed,
                    forward,
                    backward,
                    status,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::{Chapter, ChapterList};
    use crate::resync::{resync, ResyncConfig};
    use crate::scenes::{FrameType, SceneChange, SceneIndex};
    use crate::timestamp::Timestamp;

    #[test]
    fn dropped_rows_use_placeholder() {
        let chapters: ChapterList = vec![
            Chapter::new(Timestamp::from_millis(5_000)).with_name("One"),
            Chapter::new(Timestamp::from_millis(5_400)).with_name("Two"),
        ]
        .into();
        let scenes = SceneIndex::new(vec![SceneChange::new(
            Timestamp::from_millis(5_200),
            FrameType::P,
            0.6,
        )]);

        let rows = resync(&chapters, &scenes, &ResyncConfig::default()).rows();

        assert_eq!(rows[0].number, "01");
        assert_eq!(rows[0].status, "moved");
        assert_eq!(rows[0].retimed, "00:00:05.200");
        assert_eq!(rows[0].backward, "00:00:00.000");

        assert_eq!(rows[1].number, DROPPED_PLACEHOLDER);
        assert_eq!(rows[1].index, 2);
        assert_eq!(rows[1].name, "Two");
        assert_eq!(rows[1].status, "dropped");
    }
}
