//! Status/progress sink for pipeline events.
//!
//! Inject an `Arc<dyn StatusSink>` via
//! [`crate::config::ExportConfigBuilder::status`] to receive human-readable
//! status messages and progress counts as the pipeline works.
//!
//! The sink approach keeps the library free of any presentation concern:
//! callers can forward events to a terminal progress bar, a web socket, or a
//! status line — pagesnap only calls `report` and `set_progress` and never
//! owns how they are shown. The trait is `Send + Sync` because image
//! resolution batches run concurrently.

use std::sync::Arc;

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Receives status messages and progress updates from the pipeline.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait StatusSink: Send + Sync {
    /// A human-readable status line.
    ///
    /// `ongoing` is true while work continues (a caller might show a
    /// spinner), false for terminal messages.
    fn report(&self, message: &str, severity: Severity, ongoing: bool) {
        let _ = (message, severity, ongoing);
    }

    /// Progress counter update, `current` out of `total` units.
    fn set_progress(&self, current: usize, total: usize) {
        let _ = (current, total);
    }
}

/// A no-op sink for callers that don't need status events.
pub struct NoopStatusSink;

impl StatusSink for NoopStatusSink {}

/// Report into an optional sink without the caller unwrapping it everywhere.
pub(crate) fn report(
    sink: &Option<Arc<dyn StatusSink>>,
    message: &str,
    severity: Severity,
    ongoing: bool,
) {
    if let Some(s) = sink {
        s.report(message, severity, ongoing);
    }
}

pub(crate) fn set_progress(sink: &Option<Arc<dyn StatusSink>>, current: usize, total: usize) {
    if let Some(s) = sink {
        s.set_progress(current, total);
    }
}
