//! CLI binary for pdf-darkmode.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and writes the converted PDF.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_darkmode::pipeline::render;
use pdf_darkmode::{
    convert, convert_to_file, inspect, write_atomic, ConversionConfig,
    ConversionProgressCallback, DarkModeError, DocumentMetadata, PageSizing, ProgressCallback,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── Terminal styling ─────────────────────────────────────────────────────────

/// Wrap `s` in an SGR escape sequence.
fn paint(sgr: &str, s: &str) -> String {
    format!("\x1b[{sgr}m{s}\x1b[0m")
}

const GREEN: &str = "32";
const RED: &str = "31";
const CYAN: &str = "36";
const DIM: &str = "2";
const BOLD: &str = "1";

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner until the page count is known, then
/// a bar that follows the pipeline's percentage and status line.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the page currently being processed.
    page_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(100);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
        })
    }

    fn activate_bar(&self) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}%  {msg}  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn take_page_elapsed(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar();
        self.bar.println(format!(
            "{} {}",
            paint(CYAN, "◆"),
            paint(BOLD, &format!("Converting {total_pages} pages to dark mode…"))
        ));
    }

    fn on_progress(&self, percent: f32, status: &str) {
        self.bar.set_position(percent.round() as u64);
        self.bar.set_message(status.to_string());
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, jpeg_bytes: usize) {
        let elapsed = self.take_page_elapsed();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {}",
            paint(GREEN, "✓"),
            page_num,
            total_pages,
            paint(DIM, &format!("{:>6} KiB", jpeg_bytes / 1024)),
            paint(DIM, &format!("{elapsed:.1}s")),
        ));
    }

    fn on_conversion_complete(&self, total_pages: usize, output_bytes: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages converted  {}",
            paint(GREEN, "✔"),
            paint(BOLD, &total_pages.to_string()),
            paint(DIM, &format!("({} KiB)", output_bytes / 1024)),
        );
    }

    fn on_conversion_failed(&self, error: &str) {
        self.bar.abandon();
        // The error itself is printed by main; keep this line short.
        let first_line = error.lines().next().unwrap_or(error);
        eprintln!("{} {}", paint(RED, "✘"), paint(RED, first_line));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert, writing dark-mode-document.pdf to the current directory
  pdf-darkmode document.pdf

  # Choose the output path
  pdf-darkmode document.pdf -o night.pdf

  # Convert from URL
  pdf-darkmode https://arxiv.org/pdf/1706.03762 -o attention-dark.pdf

  # Give every page the first page's size
  pdf-darkmode --page-sizing match-first slides.pdf

  # Inspect PDF metadata only
  pdf-darkmode --inspect-only document.pdf

  # JSON summary (pages, sizes, timings) on stdout
  pdf-darkmode --json document.pdf > summary.json

COLOUR MAPPING:
  Near-white pixels (luminance > 240)  →  rgb(26, 26, 26)
  Near-black pixels (luminance < 15)   →  rgb(232, 232, 232)
  Everything else                      →  inverted

LIMITS:
  Only PDFs are accepted (detected from content, not extension).
  Defaults: at most 50 MB and 200 pages; see --max-size-mb / --max-pages.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Override the log filter (e.g. pdf_darkmode=debug)
  PDF_DARKMODE_*          Any flag, e.g. PDF_DARKMODE_QUALITY=90

EXIT STATUS:
  0  success
  1  conversion or I/O failure
  2  input rejected (not a PDF, too large, too many pages, no pages)

SETUP:
  pdfium must be available at runtime. It is looked up via PDFIUM_LIB_PATH,
  then next to the working directory, then on the system library path.
"#;

/// Re-render PDF documents in dark mode.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-darkmode",
    version,
    about = "Re-render PDF documents in dark mode",
    long_about = "Rasterise every page of a PDF (local file or URL), remap its colours to a \
dark palette and write the result as a new image-only PDF. White backgrounds become \
near-black, black text becomes near-white and mid-tones are inverted.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Output PDF path. Default: dark-mode-<input name> in the current directory.
    #[arg(short, long, env = "PDF_DARKMODE_OUTPUT")]
    output: Option<PathBuf>,

    /// Render scale relative to the page's native size (0.25–8).
    #[arg(long, env = "PDF_DARKMODE_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// JPEG quality (1–100).
    #[arg(long, env = "PDF_DARKMODE_QUALITY", default_value_t = 95,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Output page sizing: per-page or match-first.
    #[arg(long, env = "PDF_DARKMODE_PAGE_SIZING", value_enum, default_value = "per-page")]
    page_sizing: PageSizingArg,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_DARKMODE_PASSWORD")]
    password: Option<String>,

    /// Maximum number of pages accepted.
    #[arg(long, env = "PDF_DARKMODE_MAX_PAGES", default_value_t = 200)]
    max_pages: usize,

    /// Maximum input size in megabytes.
    #[arg(long, env = "PDF_DARKMODE_MAX_SIZE_MB", default_value_t = 50)]
    max_size_mb: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF_DARKMODE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print a JSON summary (ConversionOutput without the PDF bytes) to stdout.
    #[arg(long, env = "PDF_DARKMODE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_DARKMODE_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_DARKMODE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_DARKMODE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizingArg {
    PerPage,
    MatchFirst,
}

impl From<PageSizingArg> for PageSizing {
    fn from(v: PageSizingArg) -> Self {
        match v {
            PageSizingArg::PerPage => PageSizing::PerPage,
            PageSizingArg::MatchFirst => PageSizing::MatchFirst,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:?}", paint(RED, "Error:"));
            ExitCode::from(exit_code(&e))
        }
    }
}

/// 2 when validation rejected the input, 1 for any other failure.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<DarkModeError>() {
        Some(e) if e.is_rejection() => 2,
        _ => 1,
    }
}

async fn run(cli: Cli) -> Result<()> {

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are noise while the progress bar is drawing.
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

    // ── Ensure PDFium engine is available ────────────────────────────────
    tokio::task::spawn_blocking(render::check_libraries)
        .await
        .context("pdfium check panicked")?
        .context("PDF engine unavailable")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?;
            println!("{json}");
        } else {
            print_metadata(&cli.input, &meta);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    if let (Some(output_path), false) = (&cli.output, cli.json) {
        let stats = convert_to_file(&cli.input, output_path, &config)
            .await
            .context("Conversion failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} pages  {}ms  →  {}",
                paint(GREEN, "✔"),
                stats.total_pages,
                stats.total_duration_ms,
                paint(BOLD, &output_path.display().to_string()),
            );
        }
        return Ok(());
    }

    let output = convert(&cli.input, &config)
        .await
        .context("Conversion failed")?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&output.file_name));

    save_output(&output_path, &output.pdf).await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            paint(GREEN, "✔"),
            output.stats.total_pages,
            output.stats.total_duration_ms,
            paint(BOLD, &output_path.display().to_string()),
        );
    }

    Ok(())
}

/// Human-readable `--inspect-only` report; absent fields are skipped.
fn print_metadata(input: &str, meta: &DocumentMetadata) {
    let pages = meta.page_count.to_string();
    let rows = [
        ("File", Some(input)),
        ("Title", meta.title.as_deref()),
        ("Author", meta.author.as_deref()),
        ("Subject", meta.subject.as_deref()),
        ("Pages", Some(pages.as_str())),
        ("PDF version", Some(meta.pdf_version.as_str())),
        ("Producer", meta.producer.as_deref()),
        ("Creator", meta.creator.as_deref()),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            println!("{:<13} {}", format!("{label}:"), value);
        }
    }
}

async fn save_output(path: &Path, pdf: &[u8]) -> Result<()> {
    write_atomic(path, pdf)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Flags → `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .render_scale(cli.scale)
        .jpeg_quality(cli.quality)
        .page_sizing(cli.page_sizing.into())
        .max_pages(cli.max_pages)
        .max_file_bytes(cli.max_size_mb.saturating_mul(1024 * 1024))
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
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
    fn defaults_map_onto_library_defaults() {
        let cli = Cli::try_parse_from(["pdf-darkmode", "in.pdf"]).unwrap();
        let config = build_config(&cli, None).unwrap();
        let defaults = ConversionConfig::default();
        assert_eq!(config.render_scale, defaults.render_scale);
        assert_eq!(config.jpeg_quality, defaults.jpeg_quality);
        assert_eq!(config.max_pages, defaults.max_pages);
        assert_eq!(config.max_file_bytes, defaults.max_file_bytes);
        assert_eq!(config.page_sizing, PageSizing::PerPage);
    }

    #[test]
    fn page_sizing_flag() {
        let cli =
            Cli::try_parse_from(["pdf-darkmode", "--page-sizing", "match-first", "in.pdf"]).unwrap();
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.page_sizing, PageSizing::MatchFirst);
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["pdf-darkmode", "--quality", "0", "in.pdf"]).is_err());
        assert!(Cli::try_parse_from(["pdf-darkmode", "--quality", "101", "in.pdf"]).is_err());
    }

    #[test]
    fn rejections_exit_with_two() {
        let rejected = anyhow::Error::new(DarkModeError::TooManyPages {
            pages: 201,
            limit: 200,
        })
        .context("Conversion failed");
        assert_eq!(exit_code(&rejected), 2);

        let failed = anyhow::Error::new(DarkModeError::CorruptPdf {
            path: PathBuf::from("a.pdf"),
            detail: "bad xref".into(),
        })
        .context("Conversion failed");
        assert_eq!(exit_code(&failed), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("PDF engine unavailable")), 1);
    }

    #[tokio::test]
    async fn save_output_replaces_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dark-mode-in.pdf");
        std::fs::write(&path, b"stale").unwrap();

        save_output(&path, b"%PDF-1.5 new").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5 new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
