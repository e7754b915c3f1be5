//! Document preprocessing: inline every image reference as embeddable data
//! before anything is rendered.
//!
//! Two passes: uploaded-asset references are rewritten first (pure string
//! work, no I/O), then the remaining external references are resolved
//! through the [`ImageResolver`] in bounded batches. Per-image failures are
//! counted and reported, never fatal — a document whose images all fail
//! still renders, just without those images.

use crate::backend::ImageFetcher;
use crate::config::ExportConfig;
use crate::pipeline::resolve::ImageResolver;
use crate::session::Session;
use crate::status::{self, Severity};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a preprocess run.
#[derive(Debug, Clone)]
pub struct PreprocessReport {
    /// Document text with resolved references rewritten to data URIs.
    pub content: String,
    /// Images successfully inlined.
    pub resolved: usize,
    /// Images that failed to resolve (left untouched in the output).
    pub failed: usize,
}

static RE_IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).unwrap());

/// Collect unique `<img>` source references, skipping `data:` and `blob:`
/// schemes which are already embeddable.
fn collect_image_refs(content: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in RE_IMG_SRC.captures_iter(content) {
        let reference = &caps[1];
        if reference.starts_with("data:") || reference.starts_with("blob:") {
            continue;
        }
        if !seen.iter().any(|s| s == reference) {
            seen.push(reference.to_string());
        }
    }
    seen
}

/// Rewrite `src` attributes pointing at uploaded assets (by basename or by
/// any path ending in the basename) to the asset's data URI.
fn replace_uploaded_asset_references(content: &str, session: &Session) -> String {
    let mut out = content.to_string();
    for (filename, data_uri) in session.assets() {
        let escaped = regex::escape(filename);
        for pattern in [
            format!(r#"(?i)src=["'][^"']*/{escaped}["']"#),
            format!(r#"(?i)src=["']{escaped}["']"#),
        ] {
            // Patterns are built from escaped literals, so compilation
            // cannot fail.
            if let Ok(re) = Regex::new(&pattern) {
                out = re
                    .replace_all(&out, format!(r#"src="{data_uri}""#).as_str())
                    .into_owned();
            }
        }
    }
    out
}

/// Inline every image reference in `content` as embeddable data.
///
/// External references are resolved in batches of
/// `min(available_parallelism, 4)` (2 when unknown); progress is emitted to
/// the status sink after every batch.
pub async fn preprocess(
    content: &str,
    session: &Session,
    config: &ExportConfig,
    fetcher: Arc<dyn ImageFetcher>,
) -> PreprocessReport {
    let content = replace_uploaded_asset_references(content, session);

    let refs = collect_image_refs(&content);
    let total = refs.len();
    if total == 0 {
        return PreprocessReport {
            content,
            resolved: 0,
            failed: 0,
        };
    }

    status::report(
        &config.status,
        &format!("Loading images... (0/{total})"),
        Severity::Info,
        true,
    );

    let resolver = ImageResolver::new(session, fetcher, config.image_timeout_secs);
    let batch_size = config.effective_image_concurrency();
    debug!("Resolving {} images in batches of {}", total, batch_size);

    let mut resolutions: HashMap<String, String> = HashMap::new();
    let mut resolved = 0usize;
    let mut failed = 0usize;

    for batch in refs.chunks(batch_size) {
        let results =
            futures::future::join_all(batch.iter().map(|r| resolver.resolve(r))).await;

        for (reference, result) in batch.iter().zip(results) {
            match result {
                Ok(data_uri) => {
                    resolutions.insert(reference.clone(), data_uri);
                    resolved += 1;
                }
                Err(e) => {
                    warn!("Image resolution failed: {}", e);
                    failed += 1;
                }
            }
        }

        status::report(
            &config.status,
            &format!("Loading images... ({resolved}/{total})"),
            Severity::Info,
            true,
        );
        status::set_progress(&config.status, resolved + failed, total);
    }

    // Rewrite resolved references in the document text.
    let mut rewritten = content;
    for (reference, data_uri) in &resolutions {
        let escaped = regex::escape(reference);
        if let Ok(re) = Regex::new(&format!(r#"src=["']{escaped}["']"#)) {
            rewritten = re
                .replace_all(&rewritten, format!(r#"src="{data_uri}""#).as_str())
                .into_owned();
        }
    }

    if failed > 0 {
        status::report(
            &config.status,
            &format!("Image processing complete. ({resolved} loaded, {failed} failed)"),
            Severity::Warning,
            false,
        );
    } else {
        status::report(
            &config.status,
            &format!("Image processing complete. All {resolved} images loaded."),
            Severity::Success,
            false,
        );
    }

    PreprocessReport {
        content: rewritten,
        resolved,
        failed,
    }
}
