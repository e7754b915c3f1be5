//! Sequential segment capture.
//!
//! Segments are captured strictly in order, in batches of
//! [`CAPTURE_BATCH_SIZE`] with a short pause between batches so the surface
//! can release bitmap memory. Only one segment is ever visible at a time;
//! the rasterizer is never invoked concurrently.

use crate::backend::{Backend, CaptureOptions, VectorOptions};
use crate::config::{ExportConfig, OutputFormat};
use crate::error::PagesnapError;
use crate::pipeline::surface::SurfaceManager;
use crate::status::{self, Severity};
use image::DynamicImage;
use std::time::Duration;
use tracing::{debug, warn};

/// Segments captured per batch before pausing.
pub const CAPTURE_BATCH_SIZE: usize = 3;

/// One captured segment, in the representation its output format needs.
pub enum Snapshot {
    /// Rasterized bitmap, used for PDF and JPEG output.
    Bitmap(DynamicImage),
    /// Standalone SVG text, used for SVG output.
    Vector(String),
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Snapshot::Bitmap(img) => f
                .debug_struct("Bitmap")
                .field("width", &img.width())
                .field("height", &img.height())
                .finish(),
            Snapshot::Vector(svg) => {
                f.debug_struct("Vector").field("len", &svg.len()).finish()
            }
        }
    }
}

/// Wrap a segment's serialized HTML in a minimal `<foreignObject>` SVG,
/// used when the surface cannot produce a true vector snapshot.
fn foreign_object_svg(outer_html: &str, width: u32, height: u32) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" "#,
            r#"width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<foreignObject width="100%" height="100%">"#,
            r#"<div xmlns="http://www.w3.org/1999/xhtml">{html}</div>"#,
            r#"</foreignObject></svg>"#
        ),
        w = width,
        h = height,
        html = outer_html,
    )
}

/// Capture the segments at `targets` (indices into `pages`), in order.
/// Progress and errors report 1-indexed page numbers.
pub async fn capture_segments(
    manager: &mut SurfaceManager,
    pages: &[crate::backend::ElementRef],
    targets: &[usize],
    config: &ExportConfig,
    backend: &Backend,
) -> Result<Vec<Snapshot>, PagesnapError> {
    let (width, height) = config.size.dimensions();
    let total = targets.len();
    let mut snapshots = Vec::with_capacity(total);

    for (batch_index, batch) in targets.chunks(CAPTURE_BATCH_SIZE).enumerate() {
        if batch_index > 0 && config.batch_pause_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.batch_pause_ms)).await;
        }

        for &target in batch {
            let ordinal = snapshots.len() + 1;
            status::report(
                &config.status,
                &format!("Capturing page {ordinal} of {total}..."),
                Severity::Info,
                true,
            );

            manager.isolate(pages, target);
            tokio::time::sleep(Duration::from_millis(config.settle_delay_ms)).await;

            let element = pages[target];
            let options = CaptureOptions {
                scale: 2.0,
                width,
                height,
                background: manager.background_of(element),
                include_cross_origin: true,
            };

            let snapshot = match config.format {
                OutputFormat::Pdf | OutputFormat::Jpg => {
                    let image = backend
                        .rasterizer
                        .capture(element, &options)
                        .await
                        .map_err(|detail| PagesnapError::Capture {
                            segment: target + 1,
                            detail,
                        })?;
                    Snapshot::Bitmap(image)
                }
                OutputFormat::Svg => {
                    let vector_options = VectorOptions { width, height };
                    match backend.vector.to_vector(element, &vector_options).await {
                        Ok(svg) => Snapshot::Vector(svg),
                        Err(detail) => {
                            warn!(
                                "Vector snapshot failed on page {}, wrapping markup instead: {}",
                                target + 1,
                                detail
                            );
                            let html = manager.outer_html(element).unwrap_or_default();
                            Snapshot::Vector(foreign_object_svg(&html, width, height))
                        }
                    }
                }
            };

            debug!("Captured segment {} ({:?})", target + 1, snapshot);
            snapshots.push(snapshot);
            status::set_progress(&config.status, snapshots.len(), total);
        }
    }

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_svg_wraps_the_markup() {
        let svg = foreign_object_svg("<p>hi</p>", 595, 842);
        assert!(svg.starts_with("<svg xmlns="));
        assert!(svg.contains(r#"viewBox="0 0 595 842""#));
        assert!(svg.contains(r#"<foreignObject width="100%" height="100%">"#));
        assert!(svg.contains("<p>hi</p>"));
    }

    #[test]
    fn batch_size_is_three() {
        let targets: Vec<usize> = (0..7).collect();
        let batches: Vec<_> = targets.chunks(CAPTURE_BATCH_SIZE).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0], &[0, 1, 2]);
        assert_eq!(batches[2], &[6]);
    }
}
