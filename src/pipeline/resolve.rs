//! Image resolution: turn an `<img>` source reference into a data URI.
//!
//! Resolution order: session cache, then the uploaded-asset table (matched
//! by basename), then a cross-origin fetch that is decoded and re-encoded as
//! PNG. PNG is deliberate — re-encoding losslessly means a reference
//! resolves to identical bytes no matter how often it appears.
//!
//! Every successful resolution is memoized in the session cache keyed by the
//! original (unnormalized) reference, so repeated references fetch at most
//! once.

use crate::backend::ImageFetcher;
use crate::error::ImageLoadError;
use crate::session::Session;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Resolves image references against a session, with a bounded fetch window.
pub struct ImageResolver<'a> {
    session: &'a Session,
    fetcher: Arc<dyn ImageFetcher>,
    timeout_secs: u64,
}

impl<'a> ImageResolver<'a> {
    pub fn new(session: &'a Session, fetcher: Arc<dyn ImageFetcher>, timeout_secs: u64) -> Self {
        Self {
            session,
            fetcher,
            timeout_secs,
        }
    }

    /// Resolve one reference to embeddable image data.
    ///
    /// A fetch/decode attempt that does not complete within the configured
    /// window fails with [`ImageLoadError::Timeout`] rather than hanging.
    pub async fn resolve(&self, reference: &str) -> Result<String, ImageLoadError> {
        if let Some(cached) = self.session.cached(reference) {
            return Ok(cached);
        }

        // Uploaded assets are matched by basename so both "img/logo.png"
        // and "logo.png" resolve to the same upload.
        let basename = reference.rsplit('/').next().unwrap_or(reference);
        if let Some(asset) = self.session.asset(basename) {
            self.session.cache_insert(reference, asset.clone());
            return Ok(asset.clone());
        }

        let normalized = reference.strip_prefix("./").unwrap_or(reference);

        let fetched = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.fetcher.fetch(normalized),
        )
        .await
        .map_err(|_| ImageLoadError::Timeout {
            reference: reference.to_string(),
            secs: self.timeout_secs,
        })?;

        let bytes = fetched.map_err(|detail| ImageLoadError::Fetch {
            reference: reference.to_string(),
            detail,
        })?;

        let data_uri = encode_png_data_uri(&bytes).map_err(|detail| ImageLoadError::Decode {
            reference: reference.to_string(),
            detail,
        })?;

        debug!("Resolved image '{}' ({} bytes fetched)", reference, bytes.len());
        self.session.cache_insert(reference, data_uri.clone());
        Ok(data_uri)
    }
}

/// Decode arbitrary image bytes and re-encode them as a lossless PNG data URI.
fn encode_png_data_uri(bytes: &[u8]) -> Result<String, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&buf)))
}
