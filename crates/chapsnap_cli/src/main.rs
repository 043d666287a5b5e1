//! chapsnap - snap video chapters onto nearby scene changes.

mod table;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use chapsnap_core::chapters::load_chapter_file;
use chapsnap_core::config::{ConfigManager, ConfigSection, ResyncSettings, Settings};
use chapsnap_core::job::{JobEvent, JobReport, ResyncJob};
use chapsnap_core::logging::{init_tracing, LogLevel};
use chapsnap_core::mux::{MuxMode, MuxOutcome};
use chapsnap_core::probe::parse_frames_json;

use table::{chapters_table, resync_table, scenes_table, stats_line};

#[derive(Parser, Debug)]
#[command(
    name = "chapsnap",
    about = "Snap video chapters onto nearby scene changes",
    long_about = "Retime the chapters of a video so each one starts on the nearest detected \
                  scene change.\n\
                  \n\
                  Scene changes are detected with ffprobe; retimed chapters are written next \
                  to the video and muxed back in with mkvmerge or mkvpropedit.",
    version,
    subcommand_negates_reqs = true
)]
struct Cli {
    /// Videos to resync
    #[arg(value_name = "VIDEO", required = true)]
    videos: Vec<PathBuf>,

    /// Use chapters from this file instead of the video's own
    #[arg(long, value_name = "FILE")]
    chapters: Option<PathBuf>,

    /// How to apply the retimed chapters
    #[arg(long, value_enum)]
    mux: Option<MuxArg>,

    /// Settings file (created with defaults if missing)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Write the effective resync settings back to the config file
    #[arg(long, requires = "config")]
    save_config: bool,

    #[command(flatten)]
    resync: ResyncArgs,

    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors and the final summary
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resync a chapter file against saved ffprobe frame output, without
    /// running any tool
    Render {
        /// Chapter file (text or Matroska XML)
        #[arg(long, value_name = "FILE")]
        chapters: PathBuf,

        /// `ffprobe -show_frames -of json` output of the scene filter
        #[arg(long, value_name = "FILE")]
        scenes: PathBuf,

        /// Write the chapter text here instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Flags that override the `[resync]` settings.
#[derive(Args, Debug, Clone, Default)]
struct ResyncArgs {
    /// Scene detection threshold, in (0, 1]
    #[arg(short, long, value_name = "T", global = true)]
    threshold: Option<f64>,

    /// Seconds added to every chapter before snapping
    #[arg(short, long, value_name = "SECONDS", allow_negative_numbers = true, global = true)]
    offset: Option<f64>,

    /// Drop N chapters from the start (N > 0) or end (N < 0); repeatable
    #[arg(long, value_name = "N", allow_negative_numbers = true, global = true)]
    trim: Vec<i64>,

    /// Never move a chapter later
    #[arg(long, global = true)]
    no_forward: bool,

    /// Never move a chapter earlier
    #[arg(long, global = true)]
    no_backward: bool,

    /// Leave chapters that already sit on a scene change alone
    #[arg(long, global = true)]
    no_resync: bool,

    /// Only snap to keyframe (I-frame) scene changes
    #[arg(short, long, global = true)]
    keyframes: bool,
}

impl ResyncArgs {
    fn apply(&self, settings: &mut ResyncSettings) {
        if let Some(threshold) = self.threshold {
            settings.threshold = threshold;
        }
        if let Some(offset) = self.offset {
            settings.offset = offset;
        }
        if !self.trim.is_empty() {
            settings.trim = self.trim.clone();
        }
        if self.no_forward {
            settings.allow_forward = false;
        }
        if self.no_backward {
            settings.allow_backward = false;
        }
        if self.no_resync {
            settings.skip_already_synced = true;
        }
        if self.keyframes {
            settings.keyframes_only = true;
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum MuxArg {
    Remux,
    InPlace,
    None,
}

impl From<MuxArg> for MuxMode {
    fn from(arg: MuxArg) -> Self {
        match arg {
            MuxArg::Remux => MuxMode::Remux,
            MuxArg::InPlace => MuxMode::InPlace,
            MuxArg::None => MuxMode::None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut manager = cli.config.as_ref().map(ConfigManager::new);
    let mut settings = match manager.as_mut() {
        Some(manager) => {
            manager
                .load_or_create()
                .with_context(|| format!("loading config {}", manager.path().display()))?;
            manager.settings().clone()
        }
        None => Settings::default(),
    };

    cli.resync.apply(&mut settings.resync);
    if let Some(mux) = cli.mux {
        settings.output.mux_mode = mux.into();
    }
    if let Err(message) = settings.validate() {
        bail!(message);
    }

    let level = if cli.quiet {
        LogLevel::Warn
    } else {
        (0..cli.verbose).fold(settings.logging.level, |level, _| level.more_verbose())
    };
    let log_file = (!settings.logging.file.is_empty()).then(|| PathBuf::from(&settings.logging.file));
    let _log_guard = init_tracing(level, log_file.as_deref()).context("setting up logging")?;

    if cli.save_config {
        if let Some(manager) = manager.as_mut() {
            *manager.settings_mut() = settings.clone();
            manager
                .update_section(ConfigSection::Resync)
                .context("saving config")?;
            tracing::info!("Saved resync settings to {}", manager.path().display());
        }
    }

    match &cli.command {
        Some(Commands::Render {
            chapters,
            scenes,
            output,
        }) => render(&settings, chapters, scenes, output.as_deref(), cli.quiet),
        None => run_batch(&settings, &cli),
    }
}

/// Offline resync of a chapter file against saved scene detection output.
fn render(
    settings: &Settings,
    chapters: &Path,
    scenes: &Path,
    output: Option<&Path>,
    quiet: bool,
) -> Result<()> {
    let chapter_list = load_chapter_file(chapters)
        .with_context(|| format!("reading chapters from {}", chapters.display()))?;
    let json = fs::read_to_string(scenes)
        .with_context(|| format!("reading scene changes from {}", scenes.display()))?;
    let scene_changes = parse_frames_json(&json)
        .with_context(|| format!("parsing scene changes from {}", scenes.display()))?;

    let job = ResyncJob::from_settings(settings);
    let plan = job.plan(&chapter_list, scene_changes)?;

    if !quiet {
        eprint!("{}", resync_table(&plan.report.rows()).render());
        eprintln!("{}", stats_line(&plan.report.stats));
    }

    match output {
        Some(path) => {
            fs::write(path, &plan.text)
                .with_context(|| format!("writing {}", path.display()))?;
            if !quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
        None => println!("{}", plan.text),
    }
    Ok(())
}

fn run_batch(settings: &Settings, cli: &Cli) -> Result<()> {
    let job = ResyncJob::from_settings(settings);
    let total = cli.videos.len();
    let mut failed = 0;

    for (i, video) in cli.videos.iter().enumerate() {
        if total > 1 && !cli.quiet {
            println!("[{}/{}] {}", i + 1, total, video.display());
        }

        match run_one(&job, video, cli.chapters.as_deref(), cli.quiet) {
            Ok(report) => print_report(&report, cli.quiet),
            Err(e) => {
                failed += 1;
                tracing::error!("{}: {:#}", video.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} videos failed", failed, total);
    }
    Ok(())
}

fn run_one(job: &ResyncJob, video: &Path, chapters: Option<&Path>, quiet: bool) -> Result<JobReport> {
    let mut display = ProgressDisplay::new(quiet);
    let result = job.run(video, chapters, &mut |event| display.handle(event));
    display.finish();
    Ok(result?)
}

fn print_report(report: &JobReport, quiet: bool) {
    if !quiet {
        print!("{}", chapters_table("Chapters", &report.original).render());
        println!();
        print!("{}", scenes_table(&report.scene_changes).render());
        println!();
        print!("{}", resync_table(&report.plan.report.rows()).render());
        println!();
    }

    println!("{}", stats_line(&report.plan.report.stats));
    println!("Chapters written to {}", report.chapters_file.display());
    match &report.mux {
        MuxOutcome::Remuxed { output, .. } => println!("Remuxed to {}", output.display()),
        MuxOutcome::UpdatedInPlace { video, .. } => {
            println!("Updated chapters in {}", video.display())
        }
        MuxOutcome::Skipped => {}
    }
}

/// Spinner while probing, bar while muxing.
struct ProgressDisplay {
    quiet: bool,
    spinner: Option<ProgressBar>,
    bar: Option<ProgressBar>,
}

impl ProgressDisplay {
    fn new(quiet: bool) -> Self {
        Self {
            quiet,
            spinner: None,
            bar: None,
        }
    }

    fn handle(&mut self, event: JobEvent) {
        if self.quiet {
            return;
        }

        match event {
            JobEvent::LoadingChapters => self.spin("Reading chapters..."),
            JobEvent::DetectingScenes => self.spin("Detecting scene changes..."),
            JobEvent::ScenesReady { count, cached } => {
                if let Some(s) = self.spinner.take() {
                    s.finish_and_clear();
                }
                let source = if cached { " (cached)" } else { "" };
                eprintln!("Found {} scene changes{}", count, source);
            }
            JobEvent::WritingChapters(_) => {}
            JobEvent::Muxing(MuxMode::None) => {}
            JobEvent::Muxing(mode) => {
                let bar = ProgressBar::new(100);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("{msg} [{bar:40.cyan/blue}] {pos}% ({elapsed})")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("=> "),
                );
                bar.set_message(match mode {
                    MuxMode::InPlace => "Updating chapters",
                    _ => "Multiplexing",
                });
                self.bar = Some(bar);
            }
            JobEvent::MuxProgress(percent) => {
                if let Some(bar) = &self.bar {
                    bar.set_position(u64::from(percent));
                }
            }
        }
    }

    fn spin(&mut self, message: &'static str) {
        let spinner = self.spinner.get_or_insert_with(|| {
            let s = ProgressBar::new_spinner();
            s.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            s.enable_steady_tick(Duration::from_millis(80));
            s
        });
        spinner.set_message(message);
    }

    fn finish(&mut self) {
        if let Some(s) = self.spinner.take() {
            s.finish_and_clear();
        }
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_trim_and_offset_parse() {
        let cli = Cli::try_parse_from(["chapsnap", "--trim", "-1", "--trim", "2", "-o", "-0.5", "a.mkv"])
            .unwrap();
        assert_eq!(cli.resync.trim, vec![-1, 2]);
        assert_eq!(cli.resync.offset, Some(-0.5));
        assert_eq!(cli.videos, vec![PathBuf::from("a.mkv")]);
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::try_parse_from([
            "chapsnap", "-t", "0.3", "--no-forward", "--no-resync", "-k", "a.mkv",
        ])
        .unwrap();
        let mut settings = ResyncSettings::default();
        cli.resync.apply(&mut settings);

        assert_eq!(settings.threshold, 0.3);
        assert!(!settings.allow_forward);
        assert!(settings.allow_backward);
        assert!(settings.skip_already_synced);
        assert!(settings.keyframes_only);
    }

    #[test]
    fn render_does_not_need_videos() {
        let cli = Cli::try_parse_from([
            "chapsnap", "render", "--chapters", "c.txt", "--scenes", "f.json", "-t", "0.5",
        ])
        .unwrap();
        assert!(cli.videos.is_empty());
        assert!(matches!(cli.command, Some(Commands::Render { .. })));
        assert_eq!(cli.resync.threshold, Some(0.5));
    }

    #[test]
    fn videos_required_without_subcommand() {
        assert!(Cli::try_parse_from(["chapsnap"]).is_err());
    }
}
