//! Per-session shared state: the uploaded-asset table and the image cache.
//!
//! Holding both in one owned `Session` keeps the data flow explicit.
//! `export()` takes `&mut Session`, so the borrow checker enforces the "one
//! conversion at a time per session" invariant for free.

use std::collections::HashMap;
use std::sync::Mutex;

/// Session-scoped state shared across preprocess runs.
///
/// The image cache is never evicted within a session: sessions are
/// short-lived and single-document, so unbounded growth is an accepted
/// trade-off. A long-lived host should recreate the session per document.
#[derive(Debug, Default)]
pub struct Session {
    /// Externally populated mapping from uploaded filename to embeddable
    /// data (a data URI). The pipeline consults it but never populates it.
    assets: HashMap<String, String>,

    /// Resolved image data keyed by the original (unnormalized) reference.
    /// Mutex rather than `&mut` because resolution batches share the session
    /// concurrently; the lock is only held for map access, never across an
    /// await point.
    cache: Mutex<HashMap<String, String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an uploaded asset (filename → data URI).
    pub fn add_asset(&mut self, filename: impl Into<String>, data_uri: impl Into<String>) {
        self.assets.insert(filename.into(), data_uri.into());
    }

    /// Look up an uploaded asset by filename.
    pub fn asset(&self, filename: &str) -> Option<&String> {
        self.assets.get(filename)
    }

    /// Iterate all uploaded assets.
    pub fn assets(&self) -> impl Iterator<Item = (&String, &String)> {
        self.assets.iter()
    }

    pub fn cached(&self, reference: &str) -> Option<String> {
        self.cache.lock().unwrap().get(reference).cloned()
    }

    pub fn cache_insert(&self, reference: impl Into<String>, data_uri: impl Into<String>) {
        self.cache
            .lock()
            .unwrap()
            .insert(reference.into(), data_uri.into());
    }

    /// Number of cached resolutions (diagnostics only).
    pub fn cache_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_is_read_after_write_consistent() {
        let session = Session::new();
        assert!(session.cached("a.png").is_none());
        session.cache_insert("a.png", "data:image/png;base64,AA==");
        assert_eq!(
            session.cached("a.png").as_deref(),
            Some("data:image/png;base64,AA==")
        );
        assert_eq!(session.cache_len(), 1);
    }

    #[test]
    fn assets_are_looked_up_by_filename() {
        let mut session = Session::new();
        session.add_asset("logo.png", "data:image/png;base64,BB==");
        assert!(session.asset("logo.png").is_some());
        assert!(session.asset("missing.png").is_none());
    }
}
