//! Chapter-to-scene-change resynchronization.
//!
//! Each chapter is moved to the nearest qualifying scene change, searching
//! forward and/or backward as configured. The first chapter to claim a
//! scene change keeps it; later chapters resolving to the same time are
//! dropped.

use serde::Serialize;

use super::config::ResyncConfig;
use super::timeline::RetimedTimeline;
use crate::chapters::{apply_offset, apply_trim, Chapter, ChapterList, ChapterResult};
use crate::scenes::{SceneIndex, SearchResult};
use crate::timestamp::Timestamp;

/// What happened to one input chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChapterOutcome {
    /// Chapter already sat exactly on a scene change and was left alone.
    AlreadySynced,
    /// Chapter resolved to the nearest scene change (possibly its own time).
    Snapped {
        to: Timestamp,
        forward: SearchResult,
        backward: SearchResult,
    },
    /// No qualifying scene change in any allowed direction; time kept.
    NoCandidate,
    /// Resolved time was already claimed by an earlier chapter.
    Dropped {
        collided_at: Timestamp,
        forward: SearchResult,
        backward: SearchResult,
    },
}

/// Per-chapter record of a resync pass.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterResync {
    /// 1-based index in the input chapter list.
    pub index: usize,
    /// The chapter as it entered the pass (after trim/offset).
    pub original: Chapter,
    /// The chapter as written to the timeline, unless dropped.
    pub retimed: Option<Chapter>,
    /// 1-based position in the output timeline, unless dropped.
    pub position: Option<usize>,
    /// Decision taken.
    pub outcome: ChapterOutcome,
}

impl ChapterResync {
    pub fn is_dropped(&self) -> bool {
        matches!(self.outcome, ChapterOutcome::Dropped { .. })
    }

    /// Signed shift applied, in milliseconds.
    pub fn shift_ms(&self) -> i64 {
        self.retimed.as_ref().map_or(0, |c| {
            (c.start.as_nanos() as i128 - self.original.start.as_nanos() as i128) as i64
                / 1_000_000
        })
    }
}

/// Statistics about a resync pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResyncStats {
    /// Number of chapters processed.
    pub chapter_count: usize,
    /// Chapters left alone by the already-synced check.
    pub already_synced: usize,
    /// Chapters whose start time changed.
    pub moved: usize,
    /// Chapters kept at their own time (nearest scene change or no candidate).
    pub unchanged: usize,
    /// Chapters dropped on collision.
    pub dropped: usize,
    /// Maximum shift applied (in milliseconds).
    pub max_shift_ms: u64,
    /// Average shift over moved chapters (in milliseconds).
    pub avg_shift_ms: f64,
}

/// Full result of a resync pass.
#[derive(Debug, Clone, Serialize)]
pub struct ResyncReport {
    /// The retimed chapters.
    pub timeline: RetimedTimeline,
    /// One record per input chapter, in input order.
    pub chapters: Vec<ChapterResync>,
    /// Summary counters.
    pub stats: ResyncStats,
}

impl ResyncReport {
    /// 1-based input indices of dropped chapters.
    pub fn dropped_indices(&self) -> Vec<usize> {
        self.chapters
            .iter()
            .filter(|c| c.is_dropped())
            .map(|c| c.index)
            .collect()
    }
}

/// Apply the configured trim, then the offset.
pub fn prepare_chapters(chapters: &ChapterList, config: &ResyncConfig) -> ChapterResult<ChapterList> {
    let trimmed = apply_trim(chapters, &config.trim)?;
    Ok(apply_offset(&trimmed, config.offset))
}

/// Resync chapters onto scene changes.
///
/// `chapters` must already be trimmed and offset (see [`prepare_chapters`]).
pub fn resync(chapters: &ChapterList, scenes: &SceneIndex, config: &ResyncConfig) -> ResyncReport {
    if scenes.is_empty() {
        tracing::warn!("No scene changes available; chapters keep their times");
    }

    tracing::debug!(
        "Resyncing {} chapters against {} scene changes (forward: {}, backward: {}, keyframes only: {})",
        chapters.len(),
        scenes.len(),
        config.allow_forward,
        config.allow_backward,
        config.keyframes_only
    );

    let mut timeline = RetimedTimeline::new();
    let mut records = Vec::with_capacity(chapters.len());
    let mut stats = ResyncStats {
        chapter_count: chapters.len(),
        ..Default::default()
    };
    let mut total_shift_ns: u128 = 0;
    let mut max_shift_ns: u64 = 0;

    for (i, chapter) in chapters.iter().enumerate() {
        let index = i + 1;
        let t = chapter.start;

        let (target, outcome) = decide(t, scenes, config);

        let mut record = ChapterResync {
            index,
            original: chapter.clone(),
            retimed: None,
            position: None,
            outcome,
        };

        if timeline.contains(target) {
            tracing::debug!(
                "Chapter {} ({}) -> {} collides with an earlier chapter, dropped",
                index,
                t,
                target
            );
            let (forward, backward) = match record.outcome {
                ChapterOutcome::Snapped {
                    forward, backward, ..
                } => (forward, backward),
                _ => (SearchResult::NotFound, SearchResult::NotFound),
            };
            record.outcome = ChapterOutcome::Dropped {
                collided_at: target,
                forward,
                backward,
            };
            stats.dropped += 1;
            records.push(record);
            continue;
        }

        let retimed = match record.outcome {
            // Already-synced chapters keep their name verbatim
            ChapterOutcome::AlreadySynced => chapter.clone(),
            _ => chapter.moved_to(target),
        };

        match record.outcome {
            ChapterOutcome::AlreadySynced => {
                stats.already_synced += 1;
                tracing::debug!("Chapter {} ({}) is already synced to a scene change", index, t);
            }
            _ if target != t => {
                let shift_ns = target.distance(t);
                stats.moved += 1;
                total_shift_ns += shift_ns as u128;
                max_shift_ns = max_shift_ns.max(shift_ns);
                tracing::debug!("Chapter {}: {} -> {}", index, t, target);
            }
            _ => {
                stats.unchanged += 1;
                tracing::trace!("Chapter {} ({}) unchanged", index, t);
            }
        }

        timeline.try_insert(retimed.clone());
        record.position = Some(timeline.len());
        record.retimed = Some(retimed);
        records.push(record);
    }

    stats.max_shift_ms = max_shift_ns / 1_000_000;
    stats.avg_shift_ms = if stats.moved > 0 {
        (total_shift_ns as f64 / stats.moved as f64) / 1_000_000.0
    } else {
        0.0
    };

    tracing::info!(
        "Resynced {} chapters: {} moved, {} already synced, {} unchanged, {} dropped",
        stats.chapter_count,
        stats.moved,
        stats.already_synced,
        stats.unchanged,
        stats.dropped
    );

    ResyncReport {
        timeline,
        chapters: records,
        stats,
    }
}

/// Pick the target time for a chapter starting at `t`.
fn decide(t: Timestamp, scenes: &SceneIndex, config: &ResyncConfig) -> (Timestamp, ChapterOutcome) {
    if config.skip_already_synced && scenes.contains(t) {
        return (t, ChapterOutcome::AlreadySynced);
    }

    let forward = if config.allow_forward {
        scenes.nearest_after(t, config.keyframes_only)
    } else {
        SearchResult::NotFound
    };

    let backward = if config.allow_backward {
        scenes.nearest_at_or_before(t, config.keyframes_only)
    } else {
        SearchResult::NotFound
    };

    let chosen = match (forward, backward) {
        // Ties go forward
        (SearchResult::Found(f), SearchResult::Found(b)) => {
            if f.distance(t) <= b.distance(t) {
                f
            } else {
                b
            }
        }
        (SearchResult::Found(f), SearchResult::NotFound) => f,
        (SearchResult::NotFound, SearchResult::Found(b)) => b,
        (SearchResult::NotFound, SearchResult::NotFound) => {
            return (t, ChapterOutcome::NoCandidate);
        }
    };

    (
        chosen,
        ChapterOutcome::Snapped {
            to: chosen,
            forward,
            backward,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::{FrameType, SceneChange};

    fn ms(v: u64) -> Timestamp {
        Timestamp::from_millis(v)
    }

    fn chapters(times_ms: &[u64]) -> ChapterList {
        times_ms.iter().map(|&t| Chapter::new(ms(t))).collect()
    }

    fn scenes(times_ms: &[u64]) -> SceneIndex {
        SceneIndex::new(
            times_ms
                .iter()
                .map(|&t| SceneChange::new(ms(t), FrameType::I, 0.5))
                .collect(),
        )
    }

    fn starts(report: &ResyncReport) -> Vec<u64> {
        report.timeline.iter().map(|c| c.start.as_millis()).collect()
    }

    #[test]
    fn snaps_to_nearest_in_either_direction() {
        let config = ResyncConfig::default();
        let report = resync(&chapters(&[2_500, 7_900]), &scenes(&[2_000, 4_000, 8_000]), &config);
        assert_eq!(starts(&report), vec![2_000, 8_000]);
        assert_eq!(report.stats.moved, 2);
    }

    #[test]
    fn tie_prefers_forward() {
        let config = ResyncConfig::default();
        let report = resync(&chapters(&[3_000]), &scenes(&[2_000, 4_000]), &config);
        assert_eq!(starts(&report), vec![4_000]);
    }

    #[test]
    fn disabled_forward_only_moves_back() {
        let config = ResyncConfig {
            allow_forward: false,
            ..Default::default()
        };
        let report = resync(&chapters(&[3_900]), &scenes(&[2_000, 4_000]), &config);
        assert_eq!(starts(&report), vec![2_000]);
    }

    #[test]
    fn disabled_backward_only_moves_forward() {
        let config = ResyncConfig {
            allow_backward: false,
            ..Default::default()
        };
        let report = resync(&chapters(&[2_100]), &scenes(&[2_000, 4_000]), &config);
        assert_eq!(starts(&report), vec![4_000]);
    }

    #[test]
    fn no_candidate_keeps_time() {
        let config = ResyncConfig {
            allow_backward: false,
            ..Default::default()
        };
        let report = resync(&chapters(&[5_000]), &scenes(&[2_000]), &config);
        assert_eq!(starts(&report), vec![5_000]);
        assert_eq!(report.chapters[0].outcome, ChapterOutcome::NoCandidate);
        assert_eq!(report.stats.unchanged, 1);
    }

    #[test]
    fn empty_scene_list_keeps_all_chapters() {
        let report = resync(&chapters(&[0, 1_000]), &SceneIndex::default(), &ResyncConfig::default());
        assert_eq!(starts(&report), vec![0, 1_000]);
    }

    #[test]
    fn collision_drops_later_chapter() {
        let report = resync(&chapters(&[5_000, 5_400]), &scenes(&[5_200]), &ResyncConfig::default());
        assert_eq!(starts(&report), vec![5_200]);
        assert_eq!(report.dropped_indices(), vec![2]);
        assert_eq!(report.chapters[1].position, None);
        assert!(matches!(
            report.chapters[1].outcome,
            ChapterOutcome::Dropped { collided_at, .. } if collided_at == ms(5_200)
        ));
    }

    #[test]
    fn already_synced_keeps_name_verbatim() {
        let list: ChapterList = vec![Chapter::new(ms(10_000)).with_name("Act 2")].into();
        let config = ResyncConfig {
            skip_already_synced: true,
            ..Default::default()
        };
        let report = resync(&list, &scenes(&[9_500, 10_000]), &config);
        assert_eq!(report.chapters[0].outcome, ChapterOutcome::AlreadySynced);
        assert_eq!(report.timeline.chapters()[0], list.chapters[0]);
    }

    #[test]
    fn auto_named_chapter_is_renamed() {
        let list: ChapterList = vec![
            Chapter::new(ms(2_500)).with_name("00:00:02.500"),
            Chapter::new(ms(7_900)).with_name("Finale"),
        ]
        .into();
        let report = resync(&list, &scenes(&[2_000, 8_000]), &ResyncConfig::default());
        let names: Vec<_> = report.timeline.iter().map(|c| c.name.clone()).collect();
        assert_eq!(
            names,
            vec![Some("00:00:02.000".to_string()), Some("Finale".to_string())]
        );
    }

    #[test]
    fn positions_follow_output_order() {
        let report = resync(
            &chapters(&[1_000, 1_100, 3_000]),
            &scenes(&[1_050, 3_000]),
            &ResyncConfig::default(),
        );
        let positions: Vec<_> = report.chapters.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![Some(1), None, Some(2)]);
    }

    #[test]
    fn stats_track_shift() {
        let report = resync(&chapters(&[2_500, 7_900]), &scenes(&[2_000, 8_000]), &ResyncConfig::default());
        assert_eq!(report.stats.max_shift_ms, 500);
        assert!((report.stats.avg_shift_ms - 300.0).abs() < 0.001);
        assert_eq!(report.chapters[0].shift_ms(), -500);
        assert_eq!(report.chapters[1].shift_ms(), 100);
    }

    #[test]
    fn prepare_trims_then_offsets() {
        let config = ResyncConfig {
            trim: vec![1],
            offset: Some(-10.0),
            ..Default::default()
        };
        let prepared = prepare_chapters(&chapters(&[0, 30_000, 60_000]), &config).unwrap();
        assert_eq!(prepared.start_times(), vec![Timestamp::ZERO, ms(20_000)]);
    }
}
