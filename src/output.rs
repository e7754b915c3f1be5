//! Output types: the produced artifact and per-job statistics.

use serde::{Deserialize, Serialize};

/// The single downloadable file an export produces.
///
/// The library never touches the file system; the host decides what
/// "download" means (the CLI writes it to disk).
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Derived name: `<base>_<compact UTC timestamp>.<ext>`.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Statistics for one export job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportStats {
    /// Pages detected by the segmenter.
    pub detected_pages: usize,
    /// Segments actually captured (1 for single-page selection).
    pub captured_pages: usize,
    /// Images successfully inlined during preprocessing.
    pub images_resolved: usize,
    /// Images that failed to resolve (non-fatal).
    pub images_failed: usize,
    /// Wall-clock duration of the whole export.
    pub total_duration_ms: u64,
    /// Time spent driving the rasterizer.
    pub capture_duration_ms: u64,
    /// Time spent assembling the artifact.
    pub assemble_duration_ms: u64,
}

/// Result of a successful export: the artifact plus job statistics.
#[derive(Debug)]
pub struct ExportOutput {
    pub artifact: Artifact,
    pub stats: ExportStats,
}
