//! Advisory conversion-duration estimate.
//!
//! Shown to the user before a conversion starts; never gates behavior.

use crate::config::OutputFormat;
use std::time::Duration;

/// Fixed per-job overhead (surface construction, artifact assembly).
const BASE_MS: u64 = 500;

/// Rough expected duration of converting `page_count` pages to `format`.
///
/// Per-page cost is format-dependent: SVG serialization is cheapest, PDF
/// embedding sits in the middle, JPEG rasterization plus encoding is the
/// most expensive.
pub fn estimate_duration(page_count: usize, format: OutputFormat) -> Duration {
    let per_page_ms = match format {
        OutputFormat::Svg => 300,
        OutputFormat::Pdf => 700,
        OutputFormat::Jpg => 1100,
    };
    Duration::from_millis(BASE_MS + page_count as u64 * per_page_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_with_page_count() {
        let one = estimate_duration(1, OutputFormat::Pdf);
        let ten = estimate_duration(10, OutputFormat::Pdf);
        assert!(ten > one);
    }

    #[test]
    fn format_cost_ordering() {
        let pages = 5;
        let svg = estimate_duration(pages, OutputFormat::Svg);
        let pdf = estimate_duration(pages, OutputFormat::Pdf);
        let jpg = estimate_duration(pages, OutputFormat::Jpg);
        assert!(svg < pdf);
        assert!(pdf < jpg);
    }

    #[test]
    fn zero_pages_is_base_cost_only() {
        assert_eq!(
            estimate_duration(0, OutputFormat::Jpg),
            Duration::from_millis(BASE_MS)
        );
    }
}
