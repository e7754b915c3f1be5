//! Top-level export orchestration.
//!
//! Pipeline: preprocess → classify → validate selection → prepare surface →
//! capture → assemble. Exactly one conversion runs per session at a time,
//! enforced by the `&mut Session` receiver.

use crate::backend::Backend;
use crate::config::{ExportConfig, OutputFormat, PageSelection};
use crate::error::PagesnapError;
use crate::estimate;
use crate::output::{ExportOutput, ExportStats};
use crate::pipeline::assemble;
use crate::pipeline::capture::{self, Snapshot};
use crate::pipeline::preprocess;
use crate::pipeline::segment::{self, Classification};
use crate::pipeline::source::{self, SourceDocument, SourceKind};
use crate::pipeline::surface::SurfaceManager;
use crate::session::Session;
use crate::status::{self, Severity};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Convert a source document into a downloadable artifact.
///
/// Takes `&mut Session` so two conversions can never run concurrently
/// against the same session state.
pub async fn export(
    source: &SourceDocument,
    session: &mut Session,
    config: &ExportConfig,
    backend: &Backend,
) -> Result<ExportOutput, PagesnapError> {
    let started = Instant::now();
    status::report(
        &config.status,
        &format!("Starting conversion of {}...", source.name),
        Severity::Info,
        true,
    );

    // SVG in, SVG out: a pure text transformation, no surface involved.
    if source.kind == SourceKind::Svg && config.format == OutputFormat::Svg {
        return export_svg_direct(source, config, started);
    }

    let (content, images_resolved, images_failed) = match source.kind {
        SourceKind::Html => {
            let report = preprocess::preprocess(
                &source.content,
                session,
                config,
                backend.fetcher.clone(),
            )
            .await;
            (report.content, report.resolved, report.failed)
        }
        SourceKind::Svg => {
            // Raster output of an SVG source: fit the graphic to the page
            // box before it reaches the surface.
            let (width, height) = config.size.dimensions();
            (source::resize_svg(&source.content, width, height)?, 0, 0)
        }
    };

    let classification = segment::classify(&content);
    info!(
        "Detected {} page(s), slide format: {}",
        classification.page_count, classification.is_slide_format
    );
    validate_selection(config, classification.page_count)?;

    let eta = estimate::estimate_duration(selected_count(config, classification), config.format);
    status::report(
        &config.status,
        &format!("Estimated time: ~{}s", eta.as_secs().max(1)),
        Severity::Info,
        true,
    );

    let mut manager = SurfaceManager::create(&backend.surfaces);
    manager
        .prepare(&content, config, classification.is_slide_format)
        .await?;

    let pages = manager.locate_pages(classification.is_slide_format);
    let targets: Vec<usize> = match config.pages {
        PageSelection::All => (0..pages.len()).collect(),
        PageSelection::Single(n) => {
            if n > pages.len() {
                return Err(PagesnapError::InvalidPageSelection {
                    requested: n,
                    detected: pages.len(),
                });
            }
            vec![n - 1]
        }
    };

    let capture_started = Instant::now();
    let snapshots =
        capture::capture_segments(&mut manager, &pages, &targets, config, backend).await?;
    let capture_duration_ms = capture_started.elapsed().as_millis() as u64;
    let captured_pages = snapshots.len();

    // Release the surface before the CPU-bound assembly work.
    drop(manager);

    let assemble_started = Instant::now();
    let artifact = assemble::assemble(snapshots, source.base_name(), config)?;
    let assemble_duration_ms = assemble_started.elapsed().as_millis() as u64;

    status::report(
        &config.status,
        &format!("Conversion complete: {}", artifact.file_name),
        Severity::Success,
        false,
    );

    Ok(ExportOutput {
        artifact,
        stats: ExportStats {
            detected_pages: classification.page_count,
            captured_pages,
            images_resolved,
            images_failed,
            total_duration_ms: started.elapsed().as_millis() as u64,
            capture_duration_ms,
            assemble_duration_ms,
        },
    })
}

/// Convert a document and write the artifact into `output_dir` under its
/// generated file name.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn export_to_file(
    source: &SourceDocument,
    session: &mut Session,
    config: &ExportConfig,
    backend: &Backend,
    output_dir: impl AsRef<Path>,
) -> Result<(PathBuf, ExportStats), PagesnapError> {
    let output = export(source, session, config, backend).await?;
    let dir = output_dir.as_ref();
    let path = dir.join(&output.artifact.file_name);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| PagesnapError::OutputWrite {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, &output.artifact.bytes)
        .await
        .map_err(|e| PagesnapError::OutputWrite {
            path: tmp_path.clone(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| PagesnapError::OutputWrite {
            path: path.clone(),
            source: e,
        })?;

    Ok((path, output.stats))
}

/// Synchronous wrapper around [`export`].
///
/// Creates a temporary tokio runtime internally.
pub fn export_sync(
    source: &SourceDocument,
    session: &mut Session,
    config: &ExportConfig,
    backend: &Backend,
) -> Result<ExportOutput, PagesnapError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PagesnapError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(export(source, session, config, backend))
}

/// Classify a document without converting it.
pub fn inspect(source: &SourceDocument) -> Classification {
    segment::classify(&source.content)
}

fn validate_selection(config: &ExportConfig, detected: usize) -> Result<(), PagesnapError> {
    if let PageSelection::Single(n) = config.pages {
        // Pages are 1-indexed; 0 can still arrive via direct field
        // construction even though the builder rejects it.
        if n < 1 || n > detected {
            return Err(PagesnapError::InvalidPageSelection {
                requested: n,
                detected,
            });
        }
    }
    Ok(())
}

fn selected_count(config: &ExportConfig, classification: Classification) -> usize {
    match config.pages {
        PageSelection::All => classification.page_count,
        PageSelection::Single(_) => 1,
    }
}

fn export_svg_direct(
    source: &SourceDocument,
    config: &ExportConfig,
    started: Instant,
) -> Result<ExportOutput, PagesnapError> {
    validate_selection(config, 1)?;
    let (width, height) = config.size.dimensions();
    let resized = source::resize_svg(&source.content, width, height)?;

    let assemble_started = Instant::now();
    let artifact =
        assemble::assemble(vec![Snapshot::Vector(resized)], source.base_name(), config)?;
    let assemble_duration_ms = assemble_started.elapsed().as_millis() as u64;

    status::report(
        &config.status,
        &format!("Conversion complete: {}", artifact.file_name),
        Severity::Success,
        false,
    );

    Ok(ExportOutput {
        artifact,
        stats: ExportStats {
            detected_pages: 1,
            captured_pages: 1,
            images_resolved: 0,
            images_failed: 0,
            total_duration_ms: started.elapsed().as_millis() as u64,
            capture_duration_ms: 0,
            assemble_duration_ms,
        },
    })
}
