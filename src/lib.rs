//! # pagesnap
//!
//! Export HTML and SVG documents as PDF, JPEG, or SVG artifacts.
//!
//! ## Why this crate?
//!
//! Turning a styled document into a faithful multi-page export is mostly
//! orchestration: images must be inlined before anything renders, page or
//! slide boundaries must be detected from markup that rarely declares them,
//! each page must be rendered in isolation, and the results must be packaged
//! per format. This crate owns that orchestration end to end; the actual
//! rendering engine (a browser, a headless webview) is supplied by the
//! embedder through a small set of traits.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML / SVG
//!  │
//!  ├─ 1. Source      load and identify the input document
//!  ├─ 2. Preprocess  inline image references as data URIs (bounded batches)
//!  ├─ 3. Segment     detect pages / slides via markup heuristics
//!  ├─ 4. Surface     mount the document on a managed render surface
//!  ├─ 5. Capture     rasterize or vectorize each page, strictly in order
//!  └─ 6. Assemble    PDF / JPEG / SVG, multi-file output becomes a ZIP
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagesnap::{export, Backend, ExportConfig, OutputFormat, Session, SourceDocument};
//!
//! # async fn run(backend: Backend) -> Result<(), Box<dyn std::error::Error>> {
//! let source = SourceDocument::load("report.html")?;
//! let mut session = Session::new();
//! let config = ExportConfig::builder()
//!     .format(OutputFormat::Pdf)
//!     .build()?;
//! let output = export(&source, &mut session, &config, &backend).await?;
//! std::fs::write(&output.artifact.file_name, &output.artifact.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pagesnap` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pagesnap = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod estimate;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod session;
pub mod status;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{
    Backend, CaptureOptions, ElementRef, HttpImageFetcher, ImageFetcher, Rasterizer,
    RenderSurface, SurfaceFactory, VectorOptions, VectorSnapshot,
};
pub use config::{
    ExportConfig, ExportConfigBuilder, OutputFormat, PageSelection, PageSize,
};
pub use error::{ImageLoadError, PagesnapError};
pub use export::{export, export_sync, export_to_file, inspect};
pub use output::{Artifact, ExportOutput, ExportStats};
pub use pipeline::segment::Classification;
pub use session::Session;
pub use status::{NoopStatusSink, Severity, StatusSink};

pub use pipeline::source::{SourceDocument, SourceKind};
