// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_config::Config;
use crate::render_job::RenderTarget;
use app_controller::Controller;

mod app_config;
mod app_controller;
mod color;
mod errors;
mod file_utils;
mod presets;
mod render_job;
mod settings_merge;
mod srt;
mod strip_reconciler;
mod style;
mod timeline;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render caption images and reconcile them as timeline strips (default command)
    #[command(alias = "render")]
    Render(RenderArgs),

    /// Parse a caption file and print its cues and overrides
    Inspect {
        /// Caption file to inspect
        #[arg(value_name = "CAPTION_FILE")]
        file: PathBuf,

        /// Frame rate used for timestamp conversion
        #[arg(long)]
        fps: Option<f64>,
    },

    /// Generate shell completions for capstrip
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Caption file to render
    #[arg(value_name = "CAPTION_FILE")]
    input_path: PathBuf,

    /// Output directory for rendered images (overrides the config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Render a single cue by number instead of the whole document
    #[arg(long)]
    cue: Option<u32>,

    /// Frame rate used for timestamp conversion (overrides the config)
    #[arg(long)]
    fps: Option<f64>,

    /// Configuration file path
    #[arg(short, long, default_value = "capstrip.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// capstrip - caption strip renderer
///
/// Renders styled caption images from SRT files through an external
/// renderer and places them as timeline strips.
#[derive(Parser, Debug)]
#[command(name = "capstrip")]
#[command(version = "1.0.0")]
#[command(about = "SRT caption rendering and timeline placement tool")]
#[command(long_about = "capstrip parses SRT caption files (with optional per-cue JSON: overrides
on the time-range line), drives an external batch renderer to produce one
PNG per cue, and reconciles the results as image strips on a timeline.

EXAMPLES:
    capstrip subs.srt                          # Render every cue using default config
    capstrip --cue 3 subs.srt                  # Re-render a single cue
    capstrip -o renders subs.srt               # Write images to ./renders
    capstrip --fps 30 subs.srt                 # Convert timestamps at 30 fps
    capstrip inspect subs.srt                  # Show parsed cues and overrides
    capstrip completions bash > capstrip.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in capstrip.json by default. You can specify a
    different config file with --config-path. If the config file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Caption file to render
    #[arg(value_name = "CAPTION_FILE")]
    input_path: Option<PathBuf>,

    /// Output directory for rendered images (overrides the config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Render a single cue by number instead of the whole document
    #[arg(long)]
    cue: Option<u32>,

    /// Frame rate used for timestamp conversion (overrides the config)
    #[arg(long)]
    fps: Option<f64>,

    /// Configuration file path
    #[arg(short, long, default_value = "capstrip.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "capstrip", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Inspect { file, fps }) => run_inspect(&file, fps),
        Some(Commands::Render(args)) => run_render(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("CAPTION_FILE is required when no subcommand is specified"))?;

            let render_args = RenderArgs {
                input_path,
                output_dir: cli.output_dir,
                cue: cli.cue,
                fps: cli.fps,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_render(render_args).await
        }
    }
}

async fn run_render(options: RenderArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        // Create default configuration if not exists
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );
        let config = Config::default();
        config
            .save(config_path)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    // Override config with CLI options if provided
    if let Some(output_dir) = &options.output_dir {
        config.image_dir = output_dir.clone();
    }
    if let Some(fps) = options.fps {
        config.fps = fps;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let mut controller = Controller::with_config(config);
    controller.load_document(&options.input_path)?;

    let target = match options.cue {
        Some(no) => RenderTarget::Cue(no),
        None => RenderTarget::All,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Rendering captions...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let outcome = controller.render(target).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    info!(
        "Rendered {} caption strip(s), {} skipped",
        outcome.created.len(),
        outcome.skipped.len()
    );
    if !outcome.skipped.is_empty() {
        warn!(
            "Skipped cue(s) with no rendered image: {:?}",
            outcome.skipped
        );
    }

    Ok(())
}

fn run_inspect(file: &Path, fps: Option<f64>) -> Result<()> {
    let fps = fps.unwrap_or(24.0);
    let doc = srt::CueDocument::from_file(file, fps)?;

    println!("{}: {} cue(s) at {} fps", file.display(), doc.cues.len(), fps);
    for cue in &doc.cues {
        println!(
            "  {:>4}  {} --> {}  {:?}",
            cue.no,
            srt::Cue::format_timestamp(cue.start_ms(fps)),
            srt::Cue::format_timestamp(cue.end_ms(fps)),
            cue.text
        );
        if let Some(tree) = cue.override_tree() {
            println!("        overrides: {}", tree);
        }
    }

    Ok(())
}
