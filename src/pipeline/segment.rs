//! Heuristic page/slide detection over raw markup.
//!
//! Classification is pure string work: a family of regex patterns is checked
//! in order and the first pattern with any matches supplies the count for
//! that family. The selector cascade mirrors the same precedence for the
//! live-surface lookup performed at capture time.

use once_cell::sync::Lazy;
use regex::Regex;

/// Markup patterns that indicate explicit page boundaries.
static PAGE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)<div[^>]*class\s*=\s*["'][^"']*\bpage\b[^"']*["']"#,
        r#"(?i)<div[^>]*id\s*=\s*["']page\d+["']"#,
        r#"(?i)<section[^>]*class\s*=\s*["'][^"']*\bpage\b[^"']*["']"#,
        r#"(?i)<article[^>]*class\s*=\s*["'][^"']*\bpage\b[^"']*["']"#,
        r#"(?i)<hr[^>]*class\s*=\s*["'][^"']*\bpage-break\b"#,
        r#"(?i)<!--\s*page-break\s*-->"#,
        r#"(?i)<div[^>]*style\s*=\s*["'][^"']*page-break-(?:before|after)\s*:\s*always"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Markup patterns that indicate a slide deck.
static SLIDE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)<div[^>]*class\s*=\s*["'][^"']*\bslide\b[^"']*["']"#,
        r#"(?i)<div[^>]*id\s*=\s*["']slide\d+["']"#,
        r#"(?i)<section[^>]*class\s*=\s*["'][^"']*\bslide\b[^"']*["']"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Textual signals of slide-navigation scripting.
const SLIDE_SIGNALS: [&str; 4] = [
    "changeSlide",
    "nextSlide",
    "prevSlide",
    r#"class="slides-container""#,
];

/// What the classifier concluded about a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Whether more than one page was detected.
    pub is_multi_page: bool,
    /// Whether the document looks like a slide deck.
    pub is_slide_format: bool,
    /// Number of renderable pages, always at least 1.
    pub page_count: usize,
}

/// Count of the first pattern in the family with any matches, 0 if none.
fn count_first_match(patterns: &[Regex], content: &str) -> usize {
    patterns
        .iter()
        .map(|re| re.find_iter(content).count())
        .find(|&n| n > 0)
        .unwrap_or(0)
}

/// Classify a markup document as paged or slide-based and count its pages.
///
/// Page boundaries count as separators, so `k` boundary matches yield
/// `k + 1` pages. Slide elements count as pages directly; a deck's page
/// count is whichever of those two readings is larger.
pub fn classify(content: &str) -> Classification {
    let page_matches = count_first_match(&PAGE_PATTERNS, content);
    let slide_matches = count_first_match(&SLIDE_PATTERNS, content);
    let has_slide_signal = SLIDE_SIGNALS.iter().any(|s| content.contains(s));

    let is_slide_format = slide_matches > 0 || has_slide_signal;
    let page_count = if is_slide_format {
        slide_matches.max(page_matches + 1)
    } else {
        page_matches + 1
    };

    Classification {
        is_multi_page: page_count > 1,
        is_slide_format,
        page_count,
    }
}

/// CSS selectors to try, in order, when locating page elements on a live
/// surface. The first selector with any matches wins; an empty cascade
/// result means the whole body is a single implicit page.
pub fn selector_cascade(is_slide_format: bool) -> Vec<&'static str> {
    let mut selectors = Vec::new();
    if is_slide_format {
        selectors.extend(["div.slide", "div[id^=slide]", "section.slide"]);
    }
    selectors.extend([
        "div.page",
        "div[id^=page]",
        "section.page",
        "article.page",
    ]);
    selectors
}
