//! CLI binary for pagesnap.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExportConfig` and prints results.
//!
//! The CLI has no browser to drive, so HTML rasterization is not available
//! here; it supports document inspection, image preprocessing, and the pure
//! SVG-to-SVG export path. Embedders wire a real render surface through
//! [`pagesnap::Backend`].

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::future::BoxFuture;
use indicatif::{ProgressBar, ProgressStyle};
use pagesnap::pipeline::preprocess;
use pagesnap::{
    export_to_file, inspect, Backend, CaptureOptions, ElementRef, ExportConfig, HttpImageFetcher,
    OutputFormat, PageSelection, PageSize, Rasterizer, RenderSurface, Session, Severity,
    SourceDocument, StatusSink, SurfaceFactory, VectorOptions, VectorSnapshot,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI status sink using indicatif ──────────────────────────────────────────

/// Terminal status sink: ongoing messages update a spinner line, final
/// messages are printed above it.
struct CliStatusSink {
    bar: ProgressBar,
}

impl CliStatusSink {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl StatusSink for CliStatusSink {
    fn report(&self, message: &str, severity: Severity, ongoing: bool) {
        if ongoing {
            self.bar.set_message(message.to_string());
            return;
        }
        let line = match severity {
            Severity::Success => format!("{} {}", green("✔"), message),
            Severity::Warning => format!("{} {}", yellow("⚠"), message),
            Severity::Error => format!("✗ {}", message),
            Severity::Info => message.to_string(),
        };
        self.bar.println(line);
    }

    fn set_progress(&self, current: usize, total: usize) {
        if self.bar.length() != Some(total as u64) {
            self.bar.set_length(total as u64);
        }
        self.bar.set_position(current as u64);
    }
}

// ── Backend stub ─────────────────────────────────────────────────────────────
// The CLI carries no rendering engine; every surface operation fails with a
// clear message. The SVG-to-SVG path never reaches these.

const NO_SURFACE: &str =
    "no render surface available in the CLI; use the library with an embedder-provided Backend";

struct NoSurfaceFactory;

impl SurfaceFactory for NoSurfaceFactory {
    fn create(&self) -> Box<dyn RenderSurface> {
        Box::new(NoSurface)
    }
}

struct NoSurface;

impl RenderSurface for NoSurface {
    fn write_content(&mut self, _content: &str) -> Result<(), String> {
        Err(NO_SURFACE.to_string())
    }
    fn inject_style(&mut self, _css: &str) {}
    fn inject_script(&mut self, _script: &str) {}
    fn query(&self, _selector: &str) -> Vec<ElementRef> {
        Vec::new()
    }
    fn body(&self) -> ElementRef {
        ElementRef(0)
    }
    fn outer_html(&self, _element: ElementRef) -> Option<String> {
        None
    }
    fn computed_style(&self, _element: ElementRef, _property: &str) -> Option<String> {
        None
    }
    fn set_style(&mut self, _element: ElementRef, _property: &str, _value: &str) {}
    fn teardown(&mut self) {}
}

struct NoRasterizer;

impl Rasterizer for NoRasterizer {
    fn capture<'a>(
        &'a self,
        _target: ElementRef,
        _options: &'a CaptureOptions,
    ) -> BoxFuture<'a, Result<image::DynamicImage, String>> {
        Box::pin(async { Err(NO_SURFACE.to_string()) })
    }
}

struct NoVectorSnapshot;

impl VectorSnapshot for NoVectorSnapshot {
    fn to_vector<'a>(
        &'a self,
        _target: ElementRef,
        _options: &'a VectorOptions,
    ) -> BoxFuture<'a, Result<String, String>> {
        Box::pin(async { Err(NO_SURFACE.to_string()) })
    }
}

fn cli_backend() -> Backend {
    Backend {
        surfaces: Arc::new(NoSurfaceFactory),
        rasterizer: Arc::new(NoRasterizer),
        vector: Arc::new(NoVectorSnapshot),
        fetcher: Arc::new(HttpImageFetcher::new()),
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Inspect page structure of a document
  pagesnap --inspect-only report.html

  # Resize an SVG onto an A4 page
  pagesnap drawing.svg --format svg --size a4 -o out/

  # Letter-sized SVG with custom dimensions
  pagesnap drawing.svg --format svg --size custom --width 800 --height 600

  # Inline all images into a standalone HTML file
  pagesnap report.html --preprocess-only -o out/

  # Supply an uploaded asset the document references by name
  pagesnap report.html --preprocess-only --asset logo.png -o out/

  # JSON stats
  pagesnap drawing.svg --format svg --json

NOTE:
  HTML-to-PDF/JPG conversion needs a live render surface (a browser or
  headless webview) and is only available through the library API.

ENVIRONMENT VARIABLES:
  PAGESNAP_FORMAT      Output format (pdf, jpg, svg)
  PAGESNAP_SIZE        Page size (a4, letter, custom)
  PAGESNAP_QUALITY     JPEG quality (1-100)
  PAGESNAP_OUTPUT      Output directory
  PAGESNAP_VERBOSE     Enable debug logs
"#;

/// Export HTML and SVG documents as PDF, JPEG, or SVG artifacts.
#[derive(Parser, Debug)]
#[command(
    name = "pagesnap",
    version,
    about = "Export HTML and SVG documents as PDF, JPEG, or SVG artifacts",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input HTML or SVG file.
    input: PathBuf,

    /// Output directory for the generated artifact.
    #[arg(short, long, env = "PAGESNAP_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Output format: pdf, jpg, svg.
    #[arg(long, env = "PAGESNAP_FORMAT", value_enum, default_value = "pdf")]
    format: FormatArg,

    /// Page size: a4, letter, custom.
    #[arg(long, env = "PAGESNAP_SIZE", value_enum, default_value = "a4")]
    size: SizeArg,

    /// Page width in px (custom size only).
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Page height in px (custom size only).
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Export a single 1-indexed page instead of all pages.
    #[arg(long)]
    page: Option<usize>,

    /// JPEG quality (1-100).
    #[arg(long, env = "PAGESNAP_QUALITY", default_value_t = 80,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Per-image fetch timeout in seconds.
    #[arg(long, default_value_t = 3)]
    image_timeout: u64,

    /// Register a local file as an uploaded asset, matched by file name.
    #[arg(long)]
    asset: Vec<PathBuf>,

    /// Print detected page structure, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Inline images and write the preprocessed document, no conversion.
    #[arg(long)]
    preprocess_only: bool,

    /// Output structured JSON instead of human-readable text.
    #[arg(long, env = "PAGESNAP_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PAGESNAP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGESNAP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAGESNAP_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Pdf,
    Jpg,
    Svg,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Pdf => OutputFormat::Pdf,
            FormatArg::Jpg => OutputFormat::Jpg,
            FormatArg::Svg => OutputFormat::Svg,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SizeArg {
    A4,
    Letter,
    Custom,
}

fn data_uri_for(path: &PathBuf) -> Result<String> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read asset {}", path.display()))?;
    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        other => bail!("Unsupported asset type: {:?}", other),
    };
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(&bytes)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Spinner and INFO logs fight over the terminal; keep only one.
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

    let source = SourceDocument::load(&cli.input).context("Failed to load input")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let classification = inspect(&source);
        let eta = pagesnap::estimate::estimate_duration(
            classification.page_count,
            cli.format.into(),
        );
        if cli.json {
            println!(
                "{}",
                serde_json::json!({
                    "file": source.name,
                    "kind": format!("{:?}", source.kind).to_lowercase(),
                    "pages": classification.page_count,
                    "slide_format": classification.is_slide_format,
                    "estimated_secs": eta.as_secs(),
                })
            );
        } else {
            println!("File:          {}", source.name);
            println!("Kind:          {:?}", source.kind);
            println!("Pages:         {}", classification.page_count);
            println!("Slide format:  {}", classification.is_slide_format);
            println!(
                "Estimate:      ~{}s as {}",
                eta.as_secs().max(1),
                OutputFormat::from(cli.format)
            );
        }
        return Ok(());
    }

    let mut session = Session::new();
    for asset in &cli.asset {
        let name = asset
            .file_name()
            .and_then(|n| n.to_str())
            .context("Asset path has no file name")?;
        session.add_asset(name, &data_uri_for(asset)?);
    }

    let mut builder = ExportConfig::builder()
        .format(cli.format.into())
        .size(match cli.size {
            SizeArg::A4 => PageSize::A4,
            SizeArg::Letter => PageSize::Letter,
            SizeArg::Custom => PageSize::Custom {
                width: cli.width,
                height: cli.height,
            },
        })
        .jpeg_quality(cli.quality)
        .image_timeout_secs(cli.image_timeout);
    if let Some(page) = cli.page {
        builder = builder.pages(PageSelection::Single(page));
    }

    let sink = if show_progress {
        let sink = CliStatusSink::new();
        builder = builder.status(sink.clone());
        Some(sink)
    } else {
        None
    };
    let config = builder.build().context("Invalid configuration")?;

    // ── Preprocess-only mode ─────────────────────────────────────────────
    if cli.preprocess_only {
        let fetcher = Arc::new(HttpImageFetcher::new());
        let report = preprocess::preprocess(&source.content, &session, &config, fetcher).await;
        if let Some(sink) = &sink {
            sink.finish();
        }

        let out_path = cli.output.join(format!("{}_inlined.html", source.base_name()));
        std::fs::create_dir_all(&cli.output)
            .and_then(|_| std::fs::write(&out_path, &report.content))
            .with_context(|| format!("Failed to write {}", out_path.display()))?;

        if cli.json {
            println!(
                "{}",
                serde_json::json!({
                    "output": out_path,
                    "images_resolved": report.resolved,
                    "images_failed": report.failed,
                })
            );
        } else if !cli.quiet {
            eprintln!(
                "{} {} ({} images inlined, {} failed)",
                green("✔"),
                bold(&out_path.display().to_string()),
                report.resolved,
                report.failed
            );
        }
        return Ok(());
    }

    // ── Full export ──────────────────────────────────────────────────────
    let backend = cli_backend();
    let result = export_to_file(&source, &mut session, &config, &backend, &cli.output).await;
    if let Some(sink) = &sink {
        sink.finish();
    }
    let (path, stats) = result.context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "output": path,
                "stats": stats,
            })
        );
    } else if !cli.quiet {
        eprintln!(
            "{} {} ({} of {} pages, {} ms)",
            green("✔"),
            bold(&path.display().to_string()),
            stats.captured_pages,
            stats.detected_pages,
            stats.total_duration_ms
        );
    }
    Ok(())
}
