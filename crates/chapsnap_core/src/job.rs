//! One complete resync run for one video.
//!
//! chapters (probed or from a file) → trim → offset → scene changes
//! (cache or probe) → resync → chapter file → mux.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::chapters::{
    chapters_file_path, load_chapter_file, write_chapter_file, ChapterError, ChapterList,
};
use crate::config::Settings;
use crate::mux::{MuxError, MuxMode, MuxOutcome, Muxer};
use crate::probe::{parse_frames_json, ProbeError, Prober, SceneCache};
use crate::resync::{prepare_chapters, resync, ResyncConfig, ResyncReport};
use crate::scenes::{SceneChange, SceneIndex};

/// Error from a resync job, naming the stage that failed.
#[derive(Error, Debug)]
pub enum JobError {
    /// Loading, trimming or writing chapters failed.
    #[error("Chapters: {0}")]
    Chapter(#[from] ChapterError),

    /// ffprobe failed or returned unusable output.
    #[error("Probe: {0}")]
    Probe(#[from] ProbeError),

    /// Applying the chapters to the video failed.
    #[error("Mux: {0}")]
    Mux(#[from] MuxError),
}

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Progress notifications from [`ResyncJob::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    LoadingChapters,
    DetectingScenes,
    ScenesReady { count: usize, cached: bool },
    WritingChapters(PathBuf),
    Muxing(MuxMode),
    MuxProgress(u32),
}

/// The tool-free part of a run.
#[derive(Debug, Clone, Serialize)]
pub struct ResyncPlan {
    /// Chapters after trim and offset.
    pub prepared: ChapterList,
    /// Per-chapter outcomes and the retimed timeline.
    pub report: ResyncReport,
    /// Rendered chapter file text.
    pub text: String,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub video: PathBuf,
    /// Chapters as loaded, before trim and offset.
    pub original: ChapterList,
    /// Scene changes, sorted by time.
    pub scene_changes: Vec<SceneChange>,
    /// Whether the scene changes came from the cache.
    pub scenes_cached: bool,
    #[serde(flatten)]
    pub plan: ResyncPlan,
    /// Where the chapter file was written.
    pub chapters_file: PathBuf,
    #[serde(skip)]
    pub mux: MuxOutcome,
}

impl JobReport {
    /// The remuxed file, if one was written.
    pub fn output_path(&self) -> Option<&Path> {
        match &self.mux {
            MuxOutcome::Remuxed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Resyncs videos with a fixed configuration and set of tools.
///
/// Holds no per-video state, so one job can run a whole batch.
#[derive(Debug, Clone)]
pub struct ResyncJob {
    config: ResyncConfig,
    prober: Prober,
    muxer: Muxer,
    cache: Option<SceneCache>,
    mux_mode: MuxMode,
    chapters_suffix: String,
}

impl ResyncJob {
    /// Job with default tools, sidecar caching and remuxing.
    pub fn new(config: ResyncConfig) -> Self {
        Self::from_settings(&Settings::default()).with_config(config)
    }

    /// Job configured from a settings file.
    pub fn from_settings(settings: &Settings) -> Self {
        let cache = settings.cache.enabled.then(|| match settings.cache.directory() {
            Some(dir) => SceneCache::in_directory(dir),
            None => SceneCache::sidecar(),
        });

        Self {
            config: settings.resync.to_config(),
            prober: Prober::new().with_ffprobe_path(&settings.tools.ffprobe),
            muxer: Muxer::new()
                .with_mkvmerge_path(&settings.tools.mkvmerge)
                .with_mkvpropedit_path(&settings.tools.mkvpropedit)
                .with_output_suffix(&settings.output.output_suffix),
            cache,
            mux_mode: settings.output.mux_mode,
            chapters_suffix: settings.output.chapters_suffix.clone(),
        }
    }

    pub fn with_config(mut self, config: ResyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_mux_mode(mut self, mode: MuxMode) -> Self {
        self.mux_mode = mode;
        self
    }

    pub fn with_cache(mut self, cache: Option<SceneCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Trim, offset, resync and render without touching any tool.
    pub fn plan(&self, chapters: &ChapterList, scene_changes: Vec<SceneChange>) -> JobResult<ResyncPlan> {
        let prepared = prepare_chapters(chapters, &self.config)?;
        let index = SceneIndex::new(scene_changes);
        let report = resync(&prepared, &index, &self.config);
        let text = report.timeline.render();

        Ok(ResyncPlan {
            prepared,
            report,
            text,
        })
    }

    /// Run the full pipeline for one video.
    ///
    /// `chapters_override` replaces the video's embedded chapters with a
    /// chapter file.
    pub fn run(
        &self,
        video: &Path,
        chapters_override: Option<&Path>,
        progress: &mut dyn FnMut(JobEvent),
    ) -> JobResult<JobReport> {
        tracing::info!("Resyncing chapters of {}", video.display());

        progress(JobEvent::LoadingChapters);
        let original = match chapters_override {
            Some(file) => load_chapter_file(file)?,
            None => self.prober.chapters(video)?,
        };
        if original.is_empty() {
            return Err(ChapterError::NoChapters.into());
        }

        // Reject bad trims before the expensive scene detection.
        prepare_chapters(&original, &self.config)?;

        progress(JobEvent::DetectingScenes);
        let (scene_changes, scenes_cached) = self.scene_changes(video)?;
        progress(JobEvent::ScenesReady {
            count: scene_changes.len(),
            cached: scenes_cached,
        });

        let plan = self.plan(&original, scene_changes.clone())?;
        let stats = &plan.report.stats;
        tracing::info!(
            "{} chapters: {} moved, {} unchanged, {} already synced, {} dropped",
            stats.chapter_count,
            stats.moved,
            stats.unchanged,
            stats.already_synced,
            stats.dropped
        );

        let chapters_file = chapters_file_path(video, &self.chapters_suffix);
        progress(JobEvent::WritingChapters(chapters_file.clone()));
        write_chapter_file(plan.report.timeline.chapters(), &chapters_file)?;

        progress(JobEvent::Muxing(self.mux_mode));
        let mux = self.muxer.apply(self.mux_mode, video, &chapters_file, &mut |p| {
            progress(JobEvent::MuxProgress(p))
        })?;

        Ok(JobReport {
            video: video.to_path_buf(),
            original,
            scene_changes,
            scenes_cached,
            plan,
            chapters_file,
            mux,
        })
    }

    /// Scene changes from the cache, falling back to ffprobe.
    fn scene_changes(&self, video: &Path) -> JobResult<(Vec<SceneChange>, bool)> {
        let threshold = self.config.threshold;

        if let Some(cache) = &self.cache {
            if let Some(json) = cache.get(video, threshold) {
                match parse_frames_json(&json) {
                    Ok(scenes) => return Ok((scenes, true)),
                    Err(e) => {
                        tracing::warn!("Discarding corrupt scene cache for {}: {}", video.display(), e);
                        if let Err(e) = cache.remove(video, threshold) {
                            tracing::warn!("Could not remove scene cache entry: {}", e);
                        }
                    }
                }
            }
        }

        let json = self.prober.scene_changes_json(video, threshold)?;
        let scenes = parse_frames_json(&json)?;
        tracing::info!("Detected {} scene changes", scenes.len());

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(video, threshold, &json) {
                tracing::warn!("Could not cache scene changes: {}", e);
            }
        }

        Ok((scenes, false))
    }
}
