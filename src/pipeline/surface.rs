//! Render-surface lifecycle: load a prepared document, locate its page
//! elements, isolate one at a time for capture, and guarantee teardown.

use crate::backend::{ElementRef, RenderSurface, SurfaceFactory};
use crate::config::ExportConfig;
use crate::error::PagesnapError;
use crate::pipeline::segment;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Styles applied to every loaded document so content fits the capture
/// viewport predictably.
const SCALING_CSS: &str = "\
html, body { margin: 0; padding: 0; overflow: hidden; }\n\
* { box-sizing: border-box; }\n\
img, svg, video, canvas { max-width: 100%; }\n\
table { table-layout: fixed; width: 100%; }\n";

/// Slide decks start with every slide hidden except the first.
const SLIDE_BASE_CSS: &str = "\
.slide { display: none; opacity: 0; }\n\
.slide:first-of-type { display: block; opacity: 1; }\n";

/// Styles that pin all CSS animation and transition state.
const FREEZE_CSS: &str = "\
*, *::before, *::after {\n\
  animation-play-state: paused !important;\n\
  transition: none !important;\n\
  animation-delay: 0s !important;\n\
}\n";

/// Cancels pending timers so script-driven animation stops advancing.
const TIMER_CANCEL_JS: &str = "\
(function () {\n\
  var max = setTimeout(function () {}, 0);\n\
  for (var i = 0; i <= max; i++) { clearTimeout(i); clearInterval(i); }\n\
})();\n";

/// Owns a [`RenderSurface`] for the duration of one export and tears it
/// down when dropped, including on early-error paths.
pub struct SurfaceManager {
    surface: Box<dyn RenderSurface>,
}

impl SurfaceManager {
    pub fn create(factory: &Arc<dyn SurfaceFactory>) -> Self {
        Self {
            surface: factory.create(),
        }
    }

    /// Load the document onto the surface, apply scaling (and optionally
    /// slide-deck and animation-freezing) styles, then wait for the DOM to
    /// settle.
    pub async fn prepare(
        &mut self,
        content: &str,
        config: &ExportConfig,
        is_slide_format: bool,
    ) -> Result<(), PagesnapError> {
        self.surface
            .write_content(content)
            .map_err(|detail| PagesnapError::Render { detail })?;
        self.surface.inject_style(SCALING_CSS);
        if is_slide_format {
            self.surface.inject_style(SLIDE_BASE_CSS);
        }
        if config.freeze_animations {
            self.surface.inject_style(FREEZE_CSS);
            self.surface.inject_script(TIMER_CANCEL_JS);
            // Wait for the stop acknowledgment, bounded by the settle window.
            let deadline = Instant::now() + Duration::from_millis(config.settle_delay_ms);
            while !self.surface.animations_stopped() && Instant::now() < deadline {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
        tokio::time::sleep(Duration::from_millis(config.settle_delay_ms)).await;
        Ok(())
    }

    /// Locate the page elements via the selector cascade. An empty result
    /// means no explicit page structure exists and the whole body is the
    /// single implicit page.
    pub fn locate_pages(&self, is_slide_format: bool) -> Vec<ElementRef> {
        for selector in segment::selector_cascade(is_slide_format) {
            let found = self.surface.query(selector);
            if !found.is_empty() {
                debug!("Located {} page element(s) via `{}`", found.len(), selector);
                return found;
            }
        }
        debug!("No page elements found, treating body as a single page");
        vec![self.surface.body()]
    }

    /// Make exactly one page element visible and hide its siblings.
    pub fn isolate(&mut self, pages: &[ElementRef], target: usize) {
        for (index, &element) in pages.iter().enumerate() {
            if index == target {
                self.surface.set_style(element, "display", "block");
                self.surface.set_style(element, "opacity", "1");
            } else {
                self.surface.set_style(element, "display", "none");
            }
        }
    }

    /// Effective background color of an element, white when the computed
    /// value is absent or fully transparent.
    pub fn background_of(&self, element: ElementRef) -> String {
        match self.surface.computed_style(element, "background-color") {
            Some(color)
                if !color.is_empty()
                    && color != "transparent"
                    && color != "rgba(0, 0, 0, 0)" =>
            {
                color
            }
            _ => "#FFFFFF".to_string(),
        }
    }

    pub fn outer_html(&self, element: ElementRef) -> Option<String> {
        self.surface.outer_html(element)
    }

    pub fn animations_stopped(&self) -> bool {
        self.surface.animations_stopped()
    }
}

impl Drop for SurfaceManager {
    fn drop(&mut self) {
        self.surface.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSurface {
        elements: HashMap<&'static str, Vec<ElementRef>>,
        styles: Mutex<HashMap<(u64, String), String>>,
        torn_down: Arc<AtomicBool>,
        injected: Arc<Mutex<Vec<String>>>,
        animations_running: Arc<AtomicBool>,
    }

    impl RenderSurface for FakeSurface {
        fn write_content(&mut self, _content: &str) -> Result<(), String> {
            Ok(())
        }
        fn inject_style(&mut self, css: &str) {
            self.injected.lock().unwrap().push(css.to_string());
        }
        fn inject_script(&mut self, script: &str) {
            self.injected.lock().unwrap().push(script.to_string());
        }
        fn query(&self, selector: &str) -> Vec<ElementRef> {
            self.elements.get(selector).cloned().unwrap_or_default()
        }
        fn body(&self) -> ElementRef {
            ElementRef(0)
        }
        fn outer_html(&self, _element: ElementRef) -> Option<String> {
            None
        }
        fn computed_style(&self, element: ElementRef, property: &str) -> Option<String> {
            self.styles
                .lock()
                .unwrap()
                .get(&(element.0, property.to_string()))
                .cloned()
        }
        fn set_style(&mut self, element: ElementRef, property: &str, value: &str) {
            self.styles
                .lock()
                .unwrap()
                .insert((element.0, property.to_string()), value.to_string());
        }
        fn animations_stopped(&self) -> bool {
            !self.animations_running.load(Ordering::SeqCst)
        }
        fn teardown(&mut self) {
            self.torn_down.store(true, Ordering::SeqCst);
        }
    }

    struct FakeFactory {
        surface: Mutex<Option<FakeSurface>>,
    }

    impl SurfaceFactory for FakeFactory {
        fn create(&self) -> Box<dyn RenderSurface> {
            Box::new(self.surface.lock().unwrap().take().unwrap_or_default())
        }
    }

    fn factory_with(surface: FakeSurface) -> Arc<dyn SurfaceFactory> {
        Arc::new(FakeFactory {
            surface: Mutex::new(Some(surface)),
        })
    }

    #[test]
    fn cascade_falls_back_to_body() {
        let manager = SurfaceManager::create(&factory_with(FakeSurface::default()));
        assert_eq!(manager.locate_pages(false), vec![ElementRef(0)]);
    }

    #[test]
    fn cascade_prefers_earlier_selectors() {
        let mut surface = FakeSurface::default();
        surface
            .elements
            .insert("div.page", vec![ElementRef(1), ElementRef(2)]);
        surface.elements.insert("section.page", vec![ElementRef(9)]);
        let manager = SurfaceManager::create(&factory_with(surface));
        assert_eq!(
            manager.locate_pages(false),
            vec![ElementRef(1), ElementRef(2)]
        );
    }

    #[test]
    fn isolate_shows_one_hides_rest() {
        let manager_pages = [ElementRef(1), ElementRef(2), ElementRef(3)];
        let mut manager = SurfaceManager::create(&factory_with(FakeSurface::default()));
        manager.isolate(&manager_pages, 1);
        assert_eq!(
            manager.surface.computed_style(ElementRef(1), "display"),
            Some("none".to_string())
        );
        assert_eq!(
            manager.surface.computed_style(ElementRef(2), "display"),
            Some("block".to_string())
        );
        assert_eq!(
            manager.surface.computed_style(ElementRef(2), "opacity"),
            Some("1".to_string())
        );
        assert_eq!(
            manager.surface.computed_style(ElementRef(3), "display"),
            Some("none".to_string())
        );
    }

    #[test]
    fn transparent_background_defaults_to_white() {
        let mut surface = FakeSurface::default();
        surface.styles.lock().unwrap().insert(
            (5, "background-color".to_string()),
            "rgba(0, 0, 0, 0)".to_string(),
        );
        let manager = SurfaceManager::create(&factory_with(surface));
        assert_eq!(manager.background_of(ElementRef(5)), "#FFFFFF");
        assert_eq!(manager.background_of(ElementRef(7)), "#FFFFFF");
    }

    #[test]
    fn drop_tears_the_surface_down() {
        let flag = Arc::new(AtomicBool::new(false));
        let surface = FakeSurface {
            torn_down: Arc::clone(&flag),
            ..Default::default()
        };
        {
            let _manager = SurfaceManager::create(&factory_with(surface));
        }
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn freeze_styles_injected_when_enabled() {
        let injected = Arc::new(Mutex::new(Vec::new()));
        let surface = FakeSurface {
            injected: Arc::clone(&injected),
            ..Default::default()
        };
        let mut manager = SurfaceManager::create(&factory_with(surface));
        let config = ExportConfig::builder()
            .freeze_animations(true)
            .settle_delay_ms(0)
            .build()
            .unwrap();
        manager
            .prepare("<body></body>", &config, false)
            .await
            .unwrap();
        let injected = injected.lock().unwrap();
        assert_eq!(injected.len(), 3);
        assert!(injected[1].contains("animation-play-state"));
        assert!(injected[2].contains("clearInterval"));
    }

    #[tokio::test]
    async fn missing_stop_acknowledgment_never_blocks_prepare() {
        let surface = FakeSurface {
            animations_running: Arc::new(AtomicBool::new(true)),
            ..Default::default()
        };
        let mut manager = SurfaceManager::create(&factory_with(surface));
        let config = ExportConfig::builder()
            .freeze_animations(true)
            .settle_delay_ms(40)
            .build()
            .unwrap();

        // The surface never acknowledges the freeze; prepare must give up
        // at the settle deadline instead of polling forever.
        let started = std::time::Instant::now();
        manager
            .prepare("<body></body>", &config, false)
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn slide_decks_get_the_base_slide_styles() {
        let injected = Arc::new(Mutex::new(Vec::new()));
        let surface = FakeSurface {
            injected: Arc::clone(&injected),
            ..Default::default()
        };
        let mut manager = SurfaceManager::create(&factory_with(surface));
        let mut config = ExportConfig::default();
        config.settle_delay_ms = 0;
        manager
            .prepare("<body></body>", &config, true)
            .await
            .unwrap();
        let injected = injected.lock().unwrap();
        assert_eq!(injected.len(), 2);
        assert!(injected[1].contains(".slide:first-of-type"));
    }

    #[tokio::test]
    async fn freeze_styles_skipped_by_default() {
        let injected = Arc::new(Mutex::new(Vec::new()));
        let surface = FakeSurface {
            injected: Arc::clone(&injected),
            ..Default::default()
        };
        let mut manager = SurfaceManager::create(&factory_with(surface));
        let mut config = ExportConfig::default();
        config.settle_delay_ms = 0;
        manager
            .prepare("<body></body>", &config, false)
            .await
            .unwrap();
        assert_eq!(injected.lock().unwrap().len(), 1);
    }
}
