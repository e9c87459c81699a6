//! CLI binary for webthumb.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig` / `RunRequest` and prints JSON results on stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use webthumb::{
    list, ImagePipeline, PipelineConfig, ProgressCallback, RunOutput, RunProgressCallback,
    RunRequest, WebThumbError,
};

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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar on stderr. Candidates finish out of order when
/// `--concurrency` > 1, so per-candidate timings are keyed by index.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` reports the candidate count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Fetching page…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            skipped: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Processing");
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_candidates: usize) {
        self.activate_bar(total_candidates);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_candidates} images"))
        ));
    }

    fn on_candidate_start(&self, index: usize, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(index, Instant::now());
        }
        self.bar.set_message(format!("image {}", index + 1));
    }

    fn on_candidate_complete(&self, index: usize, total: usize, filename: &str) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total,
            dim(filename),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_candidate_skipped(&self, index: usize, total: usize, reason: &str) {
        let secs = self.elapsed_secs(index);
        self.skipped.fetch_add(1, Ordering::SeqCst);

        // Keep one line per image.
        let msg = if reason.chars().count() > 80 {
            format!("{}\u{2026}", reason.chars().take(79).collect::<String>())
        } else {
            reason.to_string()
        };

        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {}/{} images stored  ({} skipped)",
            if success_count > 0 { green("✔") } else { cyan("⚠") },
            bold(&success_count.to_string()),
            total,
            self.skipped.load(Ordering::SeqCst),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Thumbnail every image of at least 100x100 on a page, with a caption
  webthumb process https://example.com/gallery --min-width 100 --min-height 100 --text SALE

  # Write somewhere else and serve under another prefix
  webthumb --dir /srv/www/thumbs --prefix /thumbs process https://example.com --min-width 50 --min-height 50

  # List what has been stored so far, newest first
  webthumb list

OUTPUT:
  `process` prints {"success": true, "images": [...], "message": "Processed images: N"}.
  On a fatal error it prints {"success": false, "message": "..."} and exits with 1.

ENVIRONMENT VARIABLES:
  WEBTHUMB_DIR           Catalog directory (default public/processed-images)
  WEBTHUMB_PREFIX        Public path prefix (default /processed-images)
  WEBTHUMB_CONCURRENCY   Images processed at once (default 4)
  WEBTHUMB_TIMEOUT       Per-request HTTP timeout in seconds (default 30)
  RUST_LOG               Overrides the log filter
"#;

/// Turn the images of a web page into 200×200 JPEG thumbnails.
#[derive(Parser, Debug)]
#[command(
    name = "webthumb",
    version,
    about = "Turn the images of a web page into 200x200 JPEG thumbnails",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory thumbnails are written to and listed from.
    #[arg(long, global = true, env = "WEBTHUMB_DIR", default_value = "public/processed-images")]
    dir: PathBuf,

    /// Public prefix of the `path` field.
    #[arg(long, global = true, env = "WEBTHUMB_PREFIX", default_value = "/processed-images")]
    prefix: String,

    /// Number of images processed concurrently.
    #[arg(short, long, global = true, env = "WEBTHUMB_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, global = true, env = "WEBTHUMB_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// User-Agent header for page and image requests.
    #[arg(long, global = true, env = "WEBTHUMB_USER_AGENT")]
    user_agent: Option<String>,

    /// JPEG quality of stored thumbnails (1–100).
    #[arg(long, global = true, env = "WEBTHUMB_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Disable progress bar.
    #[arg(long, global = true, env = "WEBTHUMB_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "WEBTHUMB_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the JSON result.
    #[arg(short, long, global = true, env = "WEBTHUMB_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a page and store a thumbnail for each large-enough image.
    Process {
        /// HTTP/HTTPS URL of the page.
        url: String,

        /// Minimum source width in pixels.
        #[arg(long, alias = "min-w")]
        min_width: u32,

        /// Minimum source height in pixels.
        #[arg(long, alias = "min-h")]
        min_height: u32,

        /// Caption stamped on every thumbnail.
        #[arg(long, default_value = "")]
        text: String,
    },

    /// Print every stored thumbnail, newest first.
    List,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose asks for them.
    let show_progress =
        !cli.quiet && !cli.no_progress && matches!(cli.command, Command::Process { .. });
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    match &cli.command {
        Command::Process {
            url,
            min_width,
            min_height,
            text,
        } => match process(&config, url, *min_width, *min_height, text).await {
            Ok(output) => {
                print_json(&success_envelope(&output))?;
                if !cli.quiet && !show_progress {
                    eprintln!(
                        "Stored {}/{} images in {}ms",
                        output.stats.processed,
                        output.stats.candidates,
                        output.stats.total_duration_ms
                    );
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                print_json(&json!({ "success": false, "message": e.to_string() }))?;
                if !cli.quiet {
                    eprintln!("{} {}", red("✘"), e);
                }
                Ok(ExitCode::FAILURE)
            }
        },
        Command::List => {
            let entries = list(&config).await.context("Failed to list thumbnails")?;
            print_json(&entries)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn process(
    config: &PipelineConfig,
    url: &str,
    min_width: u32,
    min_height: u32,
    text: &str,
) -> Result<RunOutput, WebThumbError> {
    // Validate before touching the filesystem.
    let request = RunRequest::new(url, min_width, min_height, text)?;
    let pipeline = ImagePipeline::from_config(config.clone()).await?;
    pipeline.run(&request).await
}

/// The `{success, images, message}` object returned for a completed run.
fn success_envelope(output: &RunOutput) -> serde_json::Value {
    json!({
        "success": true,
        "images": output.records,
        "message": format!("Processed images: {}", output.records.len()),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .processed_dir(cli.dir.clone())
        .public_prefix(cli.prefix.clone())
        .concurrency(cli.concurrency)
        .fetch_timeout_secs(cli.timeout)
        .jpeg_quality(cli.quality);

    if let Some(ref ua) = cli.user_agent {
        builder = builder.user_agent(ua.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
