//! Configuration types for an export job.
//!
//! All export behaviour is controlled through [`ExportConfig`], built via its
//! [`ExportConfigBuilder`]. Keeping every knob in one struct replaces the
//! free-floating "currently selected size/format/quality" session state the
//! UI handlers would otherwise mutate: each pipeline stage receives the
//! config explicitly, so there are no implicit ordering dependencies between
//! selection and conversion.

use crate::error::PagesnapError;
use crate::status::StatusSink;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Target output format. Determines both the capture mode (bitmap vs.
/// vector) and the packaging strategy of the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Single- or multi-page PDF. (default)
    #[default]
    Pdf,
    /// JPEG image(s); multiple pages become a ZIP archive.
    Jpg,
    /// SVG document(s); multiple pages become a ZIP archive.
    Svg,
}

impl OutputFormat {
    /// File extension for a single-file artifact of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Output page size in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// 595 × 842 px. (default)
    #[default]
    A4,
    /// 612 × 792 px.
    Letter,
    /// User-supplied dimensions; both must be > 0 (validated at build time).
    Custom { width: u32, height: u32 },
}

impl PageSize {
    /// `(width, height)` in device-independent pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PageSize::A4 => (595, 842),
            PageSize::Letter => (612, 792),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Which detected pages to export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Export every detected page (default).
    #[default]
    All,
    /// Export one page, 1-indexed. An index beyond the detected count fails
    /// with [`PagesnapError::InvalidPageSelection`] before any capture work.
    Single(usize),
}

/// Configuration for one export job.
///
/// Built via [`ExportConfig::builder()`] or [`ExportConfig::default()`].
///
/// # Example
/// ```rust
/// use pagesnap::{ExportConfig, OutputFormat, PageSize};
///
/// let config = ExportConfig::builder()
///     .format(OutputFormat::Jpg)
///     .size(PageSize::Letter)
///     .jpeg_quality(90)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Output format. Default: [`OutputFormat::Pdf`].
    pub format: OutputFormat,

    /// Output page size. Default: [`PageSize::A4`].
    pub size: PageSize,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// JPEG encoding quality, 1–100. Default: 80.
    ///
    /// Only affects `jpg` output and the bitmaps embedded into PDF pages.
    pub jpeg_quality: u8,

    /// Freeze CSS animations and cancel pending timers in the render surface
    /// before capturing. Default: false.
    ///
    /// Useful for documents with entry animations that would otherwise be
    /// captured mid-flight. The surface manager waits for the surface's
    /// "stopped" acknowledgment, bounded by [`Self::settle_delay_ms`].
    pub freeze_animations: bool,

    /// Delay after making a segment visible before invoking the rasterizer,
    /// in milliseconds. Default: 100.
    ///
    /// The render surface needs one repaint cycle to reflect visibility
    /// changes; capturing immediately yields stale or blank bitmaps.
    pub settle_delay_ms: u64,

    /// Pause between capture batches in milliseconds. Default: 50.
    ///
    /// Gives the surface a chance to release bitmap memory between batches
    /// on long documents.
    pub batch_pause_ms: u64,

    /// Per-image fetch/decode timeout in seconds. Default: 3.
    pub image_timeout_secs: u64,

    /// Concurrent image resolutions per batch. Default: derived from
    /// `std::thread::available_parallelism()` capped at 4, falling back to 2
    /// when parallelism is unknown.
    pub image_concurrency: Option<usize>,

    /// Status/progress sink the pipeline reports into. Default: none.
    pub status: Option<Arc<dyn StatusSink>>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            size: PageSize::default(),
            pages: PageSelection::default(),
            jpeg_quality: 80,
            freeze_animations: false,
            settle_delay_ms: 100,
            batch_pause_ms: 50,
            image_timeout_secs: 3,
            image_concurrency: None,
            status: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("format", &self.format)
            .field("size", &self.size)
            .field("pages", &self.pages)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("freeze_animations", &self.freeze_animations)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("batch_pause_ms", &self.batch_pause_ms)
            .field("image_timeout_secs", &self.image_timeout_secs)
            .field("image_concurrency", &self.image_concurrency)
            .field("status", &self.status.as_ref().map(|_| "<dyn StatusSink>"))
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Effective image-resolution batch size.
    ///
    /// `min(available_parallelism, 4)`, default 2 when parallelism is
    /// unknown, unless overridden via [`Self::image_concurrency`].
    pub fn effective_image_concurrency(&self) -> usize {
        if let Some(n) = self.image_concurrency {
            return n.max(1);
        }
        std::thread::available_parallelism()
            .map(|n| n.get().min(4))
            .unwrap_or(2)
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn size(mut self, size: PageSize) -> Self {
        self.config.size = size;
        self
    }

    pub fn pages(mut self, pages: PageSelection) -> Self {
        self.config.pages = pages;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn freeze_animations(mut self, v: bool) -> Self {
        self.config.freeze_animations = v;
        self
    }

    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.settle_delay_ms = ms;
        self
    }

    pub fn batch_pause_ms(mut self, ms: u64) -> Self {
        self.config.batch_pause_ms = ms;
        self
    }

    pub fn image_timeout_secs(mut self, secs: u64) -> Self {
        self.config.image_timeout_secs = secs.max(1);
        self
    }

    pub fn image_concurrency(mut self, n: usize) -> Self {
        self.config.image_concurrency = Some(n.max(1));
        self
    }

    pub fn status(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.config.status = Some(sink);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExportConfig, PagesnapError> {
        let c = &self.config;
        let (w, h) = c.size.dimensions();
        if w == 0 || h == 0 {
            return Err(PagesnapError::InvalidConfig(format!(
                "Page dimensions must be > 0, got {w}×{h}"
            )));
        }
        if let PageSelection::Single(0) = c.pages {
            return Err(PagesnapError::InvalidConfig(
                "Page selection is 1-indexed; 0 is not a valid page".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_presets() {
        assert_eq!(PageSize::A4.dimensions(), (595, 842));
        assert_eq!(PageSize::Letter.dimensions(), (612, 792));
        assert_eq!(
            PageSize::Custom {
                width: 800,
                height: 600
            }
            .dimensions(),
            (800, 600)
        );
    }

    #[test]
    fn builder_rejects_zero_dimension() {
        let err = ExportConfig::builder()
            .size(PageSize::Custom {
                width: 0,
                height: 600,
            })
            .build();
        assert!(matches!(err, Err(PagesnapError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_page_zero() {
        let err = ExportConfig::builder()
            .pages(PageSelection::Single(0))
            .build();
        assert!(matches!(err, Err(PagesnapError::InvalidConfig(_))));
    }

    #[test]
    fn quality_is_clamped() {
        let config = ExportConfig::builder().jpeg_quality(0).build().unwrap();
        assert_eq!(config.jpeg_quality, 1);
        let config = ExportConfig::builder().jpeg_quality(255).build().unwrap();
        assert_eq!(config.jpeg_quality, 100);
    }

    #[test]
    fn effective_concurrency_override() {
        let config = ExportConfig::builder().image_concurrency(3).build().unwrap();
        assert_eq!(config.effective_image_concurrency(), 3);
    }

    #[test]
    fn format_extensions() {
        assert_eq!(OutputFormat::Pdf.extension(), "pdf");
        assert_eq!(OutputFormat::Jpg.extension(), "jpg");
        assert_eq!(OutputFormat::Svg.extension(), "svg");
    }
}
