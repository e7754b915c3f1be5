//! Collaborator seams: the browser-side primitives the pipeline drives.
//!
//! pagesnap does no layout, painting, or rasterization of its own. Those
//! belong to the host (an embedded webview, a headless browser, a test
//! double) and are reached through four narrow traits:
//!
//! * [`RenderSurface`] — an isolated live document: write content, inject
//!   style/script, query elements, toggle visibility.
//! * [`Rasterizer`] — `capture(element, options) -> bitmap`.
//! * [`VectorSnapshot`] — `to_vector(element, options) -> SVG text`, with a
//!   library-side fallback when it fails.
//! * [`ImageFetcher`] — fetch raw bytes for an image reference.
//!   [`HttpImageFetcher`] is the built-in reqwest implementation.
//!
//! Async collaborator methods return [`BoxFuture`] so the traits stay
//! object-safe; implementations wrap an `async` block in `Box::pin`.

use futures::future::BoxFuture;
use std::sync::Arc;

/// Opaque handle to an element inside a [`RenderSurface`].
///
/// Handles are only meaningful for the surface that produced them and become
/// stale once that surface is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(pub u64);

/// Fixed parameters for one bitmap capture.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Device-pixel scale factor (the pipeline always passes 2.0).
    pub scale: f32,
    /// Requested width in device-independent pixels.
    pub width: u32,
    /// Requested height in device-independent pixels.
    pub height: u32,
    /// CSS background color to composite under transparent content.
    pub background: String,
    /// Whether the rasterizer may include cross-origin images.
    pub include_cross_origin: bool,
}

/// Parameters for one vector snapshot.
#[derive(Debug, Clone)]
pub struct VectorOptions {
    pub width: u32,
    pub height: u32,
}

/// An isolated live rendering context.
///
/// The pipeline owns exactly one surface per export; it is created through a
/// [`SurfaceFactory`] and torn down on every exit path.
pub trait RenderSurface: Send {
    /// Replace the surface content with `content`. Errors are surfaced as
    /// [`crate::error::PagesnapError::Render`] by the caller.
    fn write_content(&mut self, content: &str) -> Result<(), String>;

    /// Append a `<style>` block to the document head.
    fn inject_style(&mut self, css: &str);

    /// Append a one-shot `<script>` to the document body.
    fn inject_script(&mut self, script: &str);

    /// All elements matching a CSS selector, in document order.
    fn query(&self, selector: &str) -> Vec<ElementRef>;

    /// The document body.
    fn body(&self) -> ElementRef;

    /// The element's serialized HTML, if it still exists.
    fn outer_html(&self, element: ElementRef) -> Option<String>;

    /// One computed-style property value, e.g. `background-color`.
    fn computed_style(&self, element: ElementRef, property: &str) -> Option<String>;

    /// Set one inline style property.
    fn set_style(&mut self, element: ElementRef, property: &str, value: &str);

    /// Whether the animation-freeze script has acknowledged that all timers
    /// and animations are stopped. Polled, never blocking.
    fn animations_stopped(&self) -> bool {
        true
    }

    /// Release the surface. Called automatically by the surface manager's
    /// `Drop` as well; must be idempotent.
    fn teardown(&mut self);
}

/// Creates fresh [`RenderSurface`] instances, one per export.
pub trait SurfaceFactory: Send + Sync {
    fn create(&self) -> Box<dyn RenderSurface>;
}

/// External rasterizer: snapshot one element into a bitmap.
pub trait Rasterizer: Send + Sync {
    /// Capture `target` as a bitmap of `options.width × options.height`
    /// device-independent pixels at `options.scale`.
    fn capture<'a>(
        &'a self,
        target: ElementRef,
        options: &'a CaptureOptions,
    ) -> BoxFuture<'a, Result<image::DynamicImage, String>>;
}

/// External vector-snapshot routine: serialize one element as SVG.
///
/// May fail; the capture engine then falls back to a minimal
/// `<foreignObject>` wrapper it builds itself.
pub trait VectorSnapshot: Send + Sync {
    fn to_vector<'a>(
        &'a self,
        target: ElementRef,
        options: &'a VectorOptions,
    ) -> BoxFuture<'a, Result<String, String>>;
}

/// Fetches the raw bytes of an image reference.
pub trait ImageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, Result<Vec<u8>, String>>;
}

/// The bundle of collaborators one export needs.
#[derive(Clone)]
pub struct Backend {
    pub surfaces: Arc<dyn SurfaceFactory>,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub vector: Arc<dyn VectorSnapshot>,
    pub fetcher: Arc<dyn ImageFetcher>,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}

/// HTTP image fetcher backed by reqwest.
///
/// Fetches cross-origin resources as raw bytes; the resolver decodes and
/// re-encodes them. The overall 3-second bound lives in the resolver, so the
/// client itself carries no timeout.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, Result<Vec<u8>, String>> {
        Box::pin(async move {
            let response = self
                .client
                .get(reference)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            if !response.status().is_success() {
                return Err(format!("HTTP {}", response.status()));
            }
            let bytes = response.bytes().await.map_err(|e| e.to_string())?;
            Ok(bytes.to_vec())
        })
    }
}
