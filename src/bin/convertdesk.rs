//! CLI binary for convertdesk.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `ClientConfig` plus tool parameters and prints results.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use convertdesk::{
    find_tool, ClientConfig, ConvertDeskError, FileHandle, PageRangeSpec, ProgressCallback,
    SavedArtifact, SplitOptions, SplitPage, SubmissionProgressCallback, SubmitStatus,
    ToolDescriptor, ToolSession, VideoBitrate, VideoFps, VideoQuality, VideoSettings, TOOLS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while a request is in flight. The upload and the server-side
/// work are one opaque wait, so there is no bar to fill.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        Arc::new(Self { bar })
    }
}

impl SubmissionProgressCallback for CliProgressCallback {
    fn on_submit_start(&self, tool_id: &str, file_count: usize) {
        self.bar.set_prefix("Processing");
        self.bar
            .set_message(format!("{tool_id}: uploading {file_count} file(s)…"));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_response(&self, status: u16, content_type: Option<&str>) {
        self.bar.set_prefix("Saving");
        self.bar.set_message(format!(
            "HTTP {status} {}",
            dim(content_type.unwrap_or("(no content-type)"))
        ));
    }

    fn on_artifact_saved(&self, name: &str, size: u64) {
        self.bar.println(format!(
            "  {} {:<32} {}",
            green("✓"),
            name,
            dim(&format!("{size} bytes"))
        ));
    }

    fn on_submit_error(&self, _message: &str) {
        self.bar.finish_and_clear();
    }

    fn on_submit_complete(&self, _artifact_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # List every tool with its accepted input and size limit
  convertdesk tools

  # Convert a PDF to Word
  convertdesk run pdf-to-docx report.pdf

  # Merge PDFs in the given order into ./out
  convertdesk run pdf-merge a.pdf b.pdf c.pdf --out-dir out

  # Split pages 1-3 and 7 out of a PDF
  convertdesk run pdf-split book.pdf --split-range 1-3,7

  # Split after page 5 (0 = one file per page)
  convertdesk run pdf-split book.pdf --split-page 5

  # Transcode a video at 1080p / 60 fps / 5M
  convertdesk run video-process clip.mov --quality 1080 --fps 60 --bitrate 5M

ENVIRONMENT VARIABLES:
  CONVERTDESK_BASE_URL      Processing service URL (default http://localhost:5000)
  CONVERTDESK_TIMEOUT       Timeout for image/document/text tools, seconds
  CONVERTDESK_LONG_TIMEOUT  Timeout for video tools, seconds
  CONVERTDESK_OUT_DIR       Directory artifacts are saved into
  RUST_LOG                  Override the log filter (e.g. convertdesk=debug)
"#;

/// Run document, image and video tools against a processing service.
#[derive(Parser, Debug)]
#[command(
    name = "convertdesk",
    version,
    about = "Run document, image and video tools against a processing service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Processing service base URL.
    #[arg(long, global = true, env = "CONVERTDESK_BASE_URL", default_value = "http://localhost:5000")]
    base_url: String,

    /// Timeout for image, document and text tools, in seconds.
    #[arg(long, global = true, env = "CONVERTDESK_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Timeout for video tools, in seconds.
    #[arg(long, global = true, env = "CONVERTDESK_LONG_TIMEOUT", default_value_t = 300)]
    long_timeout: u64,

    /// Output structured JSON instead of human-readable text.
    #[arg(long, global = true, env = "CONVERTDESK_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, global = true, env = "CONVERTDESK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CONVERTDESK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CONVERTDESK_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available tools.
    Tools,

    /// Stage files for a tool and submit them once.
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Tool id, as printed by `convertdesk tools`.
    tool: String,

    /// Files to upload. Single-file tools use the first one.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory artifacts are saved into.
    #[arg(short, long, env = "CONVERTDESK_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// pdf-split: split after this page; 0 means one file per page.
    #[arg(long, conflicts_with = "split_range")]
    split_page: Option<String>,

    /// pdf-split: page ranges to extract, e.g. 1-3,5,8-10.
    #[arg(long)]
    split_range: Option<String>,

    /// video-process: output resolution.
    #[arg(long, value_enum, default_value = "720")]
    quality: QualityArg,

    /// video-process: frame rate.
    #[arg(long, value_enum, default_value = "30")]
    fps: FpsArg,

    /// video-process: target bitrate.
    #[arg(long, value_enum, default_value = "1M")]
    bitrate: BitrateArg,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum QualityArg {
    #[value(name = "480")]
    P480,
    #[value(name = "720")]
    P720,
    #[value(name = "1080")]
    P1080,
}

impl From<QualityArg> for VideoQuality {
    fn from(v: QualityArg) -> Self {
        match v {
            QualityArg::P480 => VideoQuality::P480,
            QualityArg::P720 => VideoQuality::P720,
            QualityArg::P1080 => VideoQuality::P1080,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FpsArg {
    #[value(name = "24")]
    F24,
    #[value(name = "30")]
    F30,
    #[value(name = "60")]
    F60,
}

impl From<FpsArg> for VideoFps {
    fn from(v: FpsArg) -> Self {
        match v {
            FpsArg::F24 => VideoFps::F24,
            FpsArg::F30 => VideoFps::F30,
            FpsArg::F60 => VideoFps::F60,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BitrateArg {
    #[value(name = "500k")]
    Low,
    #[value(name = "1M")]
    Medium,
    #[value(name = "2M")]
    High,
    #[value(name = "5M")]
    Ultra,
}

impl From<BitrateArg> for VideoBitrate {
    fn from(v: BitrateArg) -> Self {
        match v {
            BitrateArg::Low => VideoBitrate::Low,
            BitrateArg::Medium => VideoBitrate::Medium,
            BitrateArg::High => VideoBitrate::High,
            BitrateArg::Ultra => VideoBitrate::Ultra,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would interleave with the spinner; keep them quiet
    // unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Tools => print_tools(cli.json),
        Command::Run(args) => run(&cli, args, show_progress).await,
    }
}

fn print_tools(json: bool) -> Result<()> {
    if json {
        let list: Vec<_> = TOOLS
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "title": t.title,
                    "accepts": t.accepts.describe(),
                    "output": t.output_format.tag(),
                    "multiple": t.allow_multiple,
                    "maxFileSizeBytes": t.max_file_size_bytes,
                    "endpoint": t.endpoint,
                    "timeout": t.timeout,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&list).context("Failed to serialise tool list")?
        );
        return Ok(());
    }

    println!(
        "{}",
        bold(&format!(
            "{:<18} {:<22} {:<18} {:>9}  {}",
            "ID", "TITLE", "ACCEPTS", "MAX", "FILES"
        ))
    );
    for t in TOOLS {
        println!(
            "{:<18} {:<22} {:<18} {:>9}  {}",
            t.id,
            t.title,
            t.accepts.describe(),
            human_size(t.max_file_size_bytes),
            if t.allow_multiple { "many" } else { "one" },
        );
    }
    Ok(())
}

async fn run(cli: &Cli, args: &RunArgs, show_progress: bool) -> Result<()> {
    let tool = find_tool(&args.tool)?;
    let params = tool_params(tool, args)?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn SubmissionProgressCallback>)
    } else {
        None
    };

    let mut builder = ClientConfig::builder()
        .base_url(cli.base_url.clone())
        .short_timeout_secs(cli.timeout)
        .long_timeout_secs(cli.long_timeout)
        .download_dir(args.out_dir.clone());
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let session = ToolSession::new(tool.id, config)?;

    let mut handles = Vec::with_capacity(args.files.len());
    for path in &args.files {
        handles.push(FileHandle::from_path(path).await?);
    }
    let report = session.stage(handles);
    for (name, err) in &report.rejected {
        eprintln!("{} {}: {}", red("✗"), name, err);
    }
    if session.selection().is_empty() {
        bail!("No valid files to submit for {}", tool.id);
    }

    match session.submit(params).await {
        Ok(SubmitStatus::Completed(saved)) => print_saved(cli, &saved),
        Ok(SubmitStatus::Busy) => bail!("A request for {} is already in progress", tool.id),
        Err(ConvertDeskError::Server(e)) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&e).context("Failed to serialise error")?
                );
            }
            bail!("{}", e.message)
        }
        Err(e) => Err(e).with_context(|| format!("{} failed", tool.id)),
    }
}

/// Tool-specific scalar parameters from CLI flags.
fn tool_params(tool: &ToolDescriptor, args: &RunArgs) -> Result<Vec<(String, String)>> {
    match tool.id {
        "pdf-split" => {
            let options = match (&args.split_range, &args.split_page) {
                (Some(range), _) => SplitOptions::Range(PageRangeSpec::parse(range)?),
                (None, Some(page)) => SplitOptions::Page(SplitPage::parse(page)?),
                (None, None) => SplitOptions::default(),
            };
            Ok(options.to_params())
        }
        "video-process" => Ok(VideoSettings {
            quality: args.quality.into(),
            fps: args.fps.into(),
            bitrate: args.bitrate.into(),
        }
        .to_params()),
        _ => Ok(Vec::new()),
    }
}

fn print_saved(cli: &Cli, saved: &[SavedArtifact]) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(saved).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        for artifact in saved {
            println!("{}", artifact.path.display());
        }
        eprintln!(
            "{} {} artifact(s) saved",
            green("✔"),
            bold(&saved.len().to_string())
        );
    }
    Ok(())
}

fn human_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{} KiB", bytes / KIB)
    } else {
        format!("{bytes} B")
    }
}
