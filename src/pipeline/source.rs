//! Source document loading: kind detection and SVG dimension handling.
//!
//! A document is plain text plus a kind tag. Only `.html`, `.htm`, and
//! `.svg` are accepted; anything else is rejected up front with
//! [`PagesnapError::UnsupportedFileType`] so no further processing runs.

use crate::error::PagesnapError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// The kind of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Html,
    Svg,
}

/// Raw text content of the uploaded file, immutable once loaded.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Original file name (used to derive the artifact name).
    pub name: String,
    pub kind: SourceKind,
    pub content: String,
    /// Intrinsic dimensions declared by an SVG root element, when present.
    pub svg_size: Option<(f32, f32)>,
}

impl SourceDocument {
    /// Read a document from disk, validating the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PagesnapError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let content = std::fs::read_to_string(path).map_err(|e| PagesnapError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_parts(name, content)
    }

    /// Build a document from an in-memory upload (name + content).
    pub fn from_parts(
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, PagesnapError> {
        let name = name.into();
        let content = content.into();
        let extension = name
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        let kind = match extension.as_str() {
            "html" | "htm" => SourceKind::Html,
            "svg" => SourceKind::Svg,
            _ => return Err(PagesnapError::UnsupportedFileType { extension }),
        };

        let svg_size = match kind {
            SourceKind::Svg => {
                let size = extract_svg_dimensions(&content);
                debug!("SVG intrinsic size: {:?}", size);
                size
            }
            SourceKind::Html => None,
        };

        Ok(Self {
            name,
            kind,
            content,
            svg_size,
        })
    }

    /// File name without its extension, or `"converted"` when unknown.
    pub fn base_name(&self) -> &str {
        let stem = self
            .name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(self.name.as_str());
        if stem.is_empty() {
            "converted"
        } else {
            stem
        }
    }
}

static RE_SVG_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<svg\b[^>]*>").unwrap());
static RE_ATTR_WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bwidth\s*=\s*["']([^"']+)["']"#).unwrap());
static RE_ATTR_HEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bheight\s*=\s*["']([^"']+)["']"#).unwrap());
static RE_ATTR_VIEWBOX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bviewBox\s*=\s*["']([^"']+)["']"#).unwrap());
static RE_SIZING_ATTRS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+(?:width|height|viewBox|preserveAspectRatio)\s*=\s*(?:"[^"]*"|'[^']*')"#)
        .unwrap()
});

/// Parse a CSS-ish length, tolerating a `px` suffix.
fn parse_length(raw: &str) -> Option<f32> {
    raw.trim().trim_end_matches("px").trim().parse::<f32>().ok()
}

/// Intrinsic dimensions of the root `<svg>`: `width`/`height` attributes
/// first, `viewBox` third/fourth values as fallback, 800×600 for a
/// dimension that remains unknown when the other was found.
pub fn extract_svg_dimensions(content: &str) -> Option<(f32, f32)> {
    let open_tag = RE_SVG_OPEN.find(content)?.as_str();

    let mut width = RE_ATTR_WIDTH
        .captures(open_tag)
        .and_then(|c| parse_length(&c[1]));
    let mut height = RE_ATTR_HEIGHT
        .captures(open_tag)
        .and_then(|c| parse_length(&c[1]));

    if width.is_none() || height.is_none() {
        if let Some(vb) = RE_ATTR_VIEWBOX.captures(open_tag) {
            let values: Vec<f32> = vb[1]
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.parse().ok())
                .collect();
            if values.len() >= 4 {
                width = width.or(Some(values[2]));
                height = height.or(Some(values[3]));
            }
        }
    }

    match (width, height) {
        (None, None) => None,
        (w, h) => Some((w.unwrap_or(800.0), h.unwrap_or(600.0))),
    }
}

/// Rewrite the root `<svg>` element to the selected output size: `width`,
/// `height`, a matching `viewBox`, and `preserveAspectRatio="xMidYMid meet"`.
pub fn resize_svg(content: &str, width: u32, height: u32) -> Result<String, PagesnapError> {
    let open = RE_SVG_OPEN.find(content).ok_or_else(|| PagesnapError::Render {
        detail: "No <svg> root element found".into(),
    })?;

    let tag = open.as_str();
    let stripped = RE_SIZING_ATTRS.replace_all(tag, "");
    let sizing = format!(
        r#" width="{width}" height="{height}" viewBox="0 0 {width} {height}" preserveAspectRatio="xMidYMid meet""#
    );

    // Insert the new sizing attributes just before the tag close.
    let rebuilt = if let Some(rest) = stripped.strip_suffix("/>") {
        format!("{rest}{sizing}/>")
    } else if let Some(rest) = stripped.strip_suffix('>') {
        format!("{rest}{sizing}>")
    } else {
        return Err(PagesnapError::Internal("Malformed <svg> open tag".into()));
    };

    let mut out = String::with_capacity(content.len() + sizing.len());
    out.push_str(&content[..open.start()]);
    out.push_str(&rebuilt);
    out.push_str(&content[open.end()..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_extension_accepted() {
        let doc = SourceDocument::from_parts("report.html", "<p>hi</p>").unwrap();
        assert_eq!(doc.kind, SourceKind::Html);
        assert_eq!(doc.base_name(), "report");
    }

    #[test]
    fn htm_extension_accepted() {
        let doc = SourceDocument::from_parts("a.htm", "<p></p>").unwrap();
        assert_eq!(doc.kind, SourceKind::Html);
    }

    #[test]
    fn unsupported_extension_rejected() {
        let err = SourceDocument::from_parts("report.docx", "").unwrap_err();
        assert!(matches!(
            err,
            PagesnapError::UnsupportedFileType { extension } if extension == "docx"
        ));
    }

    #[test]
    fn svg_dimensions_from_attributes() {
        let doc = SourceDocument::from_parts(
            "pic.svg",
            r#"<svg width="300px" height="200" xmlns="http://www.w3.org/2000/svg"></svg>"#,
        )
        .unwrap();
        assert_eq!(doc.svg_size, Some((300.0, 200.0)));
    }

    #[test]
    fn svg_dimensions_from_viewbox() {
        let size =
            extract_svg_dimensions(r#"<svg viewBox="0 0 640 480" xmlns="x"></svg>"#).unwrap();
        assert_eq!(size, (640.0, 480.0));
    }

    #[test]
    fn svg_without_dimensions() {
        assert_eq!(extract_svg_dimensions(r#"<svg xmlns="x"></svg>"#), None);
    }

    #[test]
    fn resize_replaces_sizing_attributes() {
        let svg = r#"<svg width="300" height="200" viewBox="0 0 300 200"><rect/></svg>"#;
        let out = resize_svg(svg, 595, 842).unwrap();
        assert!(out.contains(r#"width="595""#), "got: {out}");
        assert!(out.contains(r#"height="842""#));
        assert!(out.contains(r#"viewBox="0 0 595 842""#));
        assert!(out.contains("preserveAspectRatio"));
        assert!(out.contains("<rect/>"));
    }

    #[test]
    fn resize_without_root_svg_fails() {
        assert!(resize_svg("<p>not svg</p>", 100, 100).is_err());
    }

    #[test]
    fn base_name_falls_back_to_converted() {
        let doc = SourceDocument::from_parts(".html", "<p></p>").unwrap();
        assert_eq!(doc.base_name(), "converted");
    }
}
