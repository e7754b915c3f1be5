//! Error types for the pagesnap library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PagesnapError`] — **Fatal**: the current preview or export cannot
//!   proceed (unsupported file, render surface construction failed, a segment
//!   failed to rasterize, artifact assembly failed). Returned as
//!   `Err(PagesnapError)` from the top-level entry points. No partial
//!   artifact is ever produced alongside one of these.
//!
//! * [`ImageLoadError`] — **Non-fatal**: a single image reference failed to
//!   resolve during preprocessing. Counted in the
//!   [`crate::pipeline::preprocess::PreprocessReport`] summary so callers can
//!   inspect partial success; preprocessing itself still succeeds.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pagesnap library.
///
/// Per-image failures use [`ImageLoadError`] and are aggregated into the
/// preprocess summary rather than propagated here.
#[derive(Debug, Error)]
pub enum PagesnapError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input file has an extension other than `.html`, `.htm`, or `.svg`.
    #[error("Unsupported file type '.{extension}'\nSelect an HTML or SVG file.")]
    UnsupportedFileType { extension: String },

    /// The input file could not be read.
    #[error("Failed to read '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// The render surface could not be constructed or refused the content.
    /// Fatal to the current preview.
    #[error("Render surface failed: {detail}")]
    Render { detail: String },

    /// A specific segment failed to rasterize. Fatal to the current
    /// conversion; the whole job is aborted so no incomplete artifact is
    /// produced. `segment` is 1-indexed.
    #[error("Capture failed on page {segment}: {detail}")]
    Capture { segment: usize, detail: String },

    /// Archive or document assembly failed.
    #[error("Export assembly failed: {detail}")]
    Export { detail: String },

    /// The assembled artifact could not be written to disk.
    #[error("Failed to write '{}': {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The user selected a page index beyond the detected page count.
    /// Rejected before any capture work begins.
    #[error("Page {requested} is out of range (document has {detected} pages)")]
    InvalidPageSelection { requested: usize, detected: usize },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image reference.
///
/// Produced by the Image Resolver; counted as a failure in the preprocess
/// summary but never aborts preprocessing.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageLoadError {
    /// The fetch/decode attempt did not complete within the bounded window.
    #[error("Image '{reference}' timed out after {secs}s")]
    Timeout { reference: String, secs: u64 },

    /// The resource could not be fetched.
    #[error("Failed to load image '{reference}': {detail}")]
    Fetch { reference: String, detail: String },

    /// The fetched bytes could not be decoded as an image.
    #[error("Failed to decode image '{reference}': {detail}")]
    Decode { reference: String, detail: String },
}
