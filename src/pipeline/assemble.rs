//! Artifact assembly: turn captured snapshots into the final downloadable
//! bytes.
//!
//! Packaging policy by format and page count:
//!
//! | format | 1 page        | N pages                         |
//! |--------|---------------|---------------------------------|
//! | pdf    | one-page PDF  | multi-page PDF                  |
//! | jpg    | single `.jpg` | ZIP of `page_001.jpg` ...       |
//! | svg    | single `.svg` | ZIP of `page_001.svg` ...       |

use crate::config::{ExportConfig, OutputFormat};
use crate::error::PagesnapError;
use crate::output::Artifact;
use crate::pipeline::capture::Snapshot;
use crate::status::{self, Severity};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, XObjectTransform,
};
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const PT_TO_MM: f32 = 0.352778;

/// Assemble the captured snapshots into one artifact named
/// `{base_name}_{timestamp}.{ext}`.
pub fn assemble(
    snapshots: Vec<Snapshot>,
    base_name: &str,
    config: &ExportConfig,
) -> Result<Artifact, PagesnapError> {
    if snapshots.is_empty() {
        return Err(PagesnapError::Export {
            detail: "No pages were captured".into(),
        });
    }

    status::report(
        &config.status,
        &format!("Generating {} file...", config.format),
        Severity::Info,
        true,
    );

    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let single = snapshots.len() == 1;
    let extension = config.format.extension();

    let (media_type, extension, bytes) = match config.format {
        OutputFormat::Pdf => ("application/pdf", extension, assemble_pdf(&snapshots, config)?),
        OutputFormat::Jpg if single => (
            "image/jpeg",
            extension,
            encode_jpeg(bitmap(&snapshots[0])?, config.jpeg_quality)?,
        ),
        OutputFormat::Svg if single => (
            "image/svg+xml",
            extension,
            finalize_svg(vector(&snapshots[0])?).into_bytes(),
        ),
        OutputFormat::Jpg | OutputFormat::Svg => {
            ("application/zip", "zip", assemble_zip(&snapshots, config)?)
        }
    };

    let file_name = format!("{base_name}_{timestamp}.{extension}");
    debug!("Assembled {} ({} bytes)", file_name, bytes.len());

    Ok(Artifact {
        file_name,
        media_type,
        bytes,
    })
}

fn bitmap(snapshot: &Snapshot) -> Result<&DynamicImage, PagesnapError> {
    match snapshot {
        Snapshot::Bitmap(img) => Ok(img),
        Snapshot::Vector(_) => Err(PagesnapError::Internal(
            "Expected a bitmap snapshot".into(),
        )),
    }
}

fn vector(snapshot: &Snapshot) -> Result<&str, PagesnapError> {
    match snapshot {
        Snapshot::Vector(svg) => Ok(svg),
        Snapshot::Bitmap(_) => Err(PagesnapError::Internal(
            "Expected a vector snapshot".into(),
        )),
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, PagesnapError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
    // JPEG has no alpha channel.
    image
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| PagesnapError::Export {
            detail: format!("JPEG encoding failed: {e}"),
        })?;
    Ok(bytes)
}

/// Standalone SVG files carry an XML declaration.
fn finalize_svg(svg: &str) -> String {
    if svg.trim_start().starts_with("<?xml") {
        svg.to_string()
    } else {
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{svg}")
    }
}

/// Build a multi-page PDF, one full-bleed image per page. Page dimensions
/// come from the configured size in px, mapped 1 px = 1 pt at 72 dpi.
fn assemble_pdf(
    snapshots: &[Snapshot],
    config: &ExportConfig,
) -> Result<Vec<u8>, PagesnapError> {
    let (width, height) = config.size.dimensions();
    let page_w = Mm(width as f32 * PT_TO_MM);
    let page_h = Mm(height as f32 * PT_TO_MM);

    let mut doc = PdfDocument::new("Converted Document");
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let mut pages = Vec::with_capacity(snapshots.len());

    for (index, snapshot) in snapshots.iter().enumerate() {
        let image = bitmap(snapshot)?;
        let jpeg = encode_jpeg(image, config.jpeg_quality)?;
        let raw = RawImage::decode_from_bytes(&jpeg, &mut warnings).map_err(|e| {
            PagesnapError::Export {
                detail: format!("PDF image embedding failed on page {}: {e}", index + 1),
            }
        })?;
        let xobj_id = doc.add_image(&raw);

        // Captured bitmaps are 2x scale; stretch to the page box.
        let scale_x = width as f32 / image.width() as f32;
        let scale_y = height as f32 / image.height() as f32;
        let ops = vec![Op::UseXobject {
            id: xobj_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                dpi: Some(72.0),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                rotate: None,
            },
        }];
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    doc.with_pages(pages);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}

/// Pack every snapshot into a deflate ZIP as `page_001.{ext}`,
/// `page_002.{ext}`, ...
fn assemble_zip(
    snapshots: &[Snapshot],
    config: &ExportConfig,
) -> Result<Vec<u8>, PagesnapError> {
    let extension = config.format.extension();
    let total = snapshots.len();
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(6));

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (index, snapshot) in snapshots.iter().enumerate() {
        let entry_bytes = match config.format {
            OutputFormat::Jpg => encode_jpeg(bitmap(snapshot)?, config.jpeg_quality)?,
            OutputFormat::Svg => finalize_svg(vector(snapshot)?).into_bytes(),
            OutputFormat::Pdf => {
                return Err(PagesnapError::Internal(
                    "PDF output is never zipped".into(),
                ))
            }
        };
        let name = format!("page_{:03}.{extension}", index + 1);
        writer
            .start_file(name.as_str(), options)
            .and_then(|_| writer.write_all(&entry_bytes).map_err(Into::into))
            .map_err(|e| PagesnapError::Export {
                detail: format!("ZIP write failed for {name}: {e}"),
            })?;
        status::set_progress(&config.status, index + 1, total);
    }

    let cursor = writer.finish().map_err(|e| PagesnapError::Export {
        detail: format!("ZIP finalization failed: {e}"),
    })?;
    status::set_progress(&config.status, total, total);
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PageSelection, PageSize};
    use std::io::Read;

    fn solid_bitmap(w: u32, h: u32) -> Snapshot {
        Snapshot::Bitmap(DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            w,
            h,
            image::Rgba([200, 10, 10, 255]),
        )))
    }

    fn config(format: OutputFormat) -> ExportConfig {
        ExportConfig::builder()
            .format(format)
            .size(PageSize::Custom {
                width: 100,
                height: 140,
            })
            .pages(PageSelection::All)
            .build()
            .unwrap()
    }

    #[test]
    fn single_jpg_is_a_jpeg_file() {
        let artifact =
            assemble(vec![solid_bitmap(200, 280)], "doc", &config(OutputFormat::Jpg)).unwrap();
        assert_eq!(artifact.media_type, "image/jpeg");
        assert!(artifact.file_name.starts_with("doc_"));
        assert!(artifact.file_name.ends_with(".jpg"));
        // JPEG SOI marker.
        assert_eq!(&artifact.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn multiple_jpgs_become_a_zip() {
        let snapshots = vec![
            solid_bitmap(200, 280),
            solid_bitmap(200, 280),
            solid_bitmap(200, 280),
        ];
        let artifact = assemble(snapshots, "doc", &config(OutputFormat::Jpg)).unwrap();
        assert_eq!(artifact.media_type, "application/zip");
        assert!(artifact.file_name.ends_with(".zip"));

        let mut archive = zip::ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, ["page_001.jpg", "page_002.jpg", "page_003.jpg"]);
    }

    #[test]
    fn multi_page_pdf_is_one_file() {
        let snapshots = vec![solid_bitmap(200, 280), solid_bitmap(200, 280)];
        let artifact = assemble(snapshots, "report", &config(OutputFormat::Pdf)).unwrap();
        assert_eq!(artifact.media_type, "application/pdf");
        assert!(artifact.file_name.ends_with(".pdf"));
        assert_eq!(&artifact.bytes[..5], b"%PDF-");
    }

    #[test]
    fn single_svg_gets_xml_declaration() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        let artifact = assemble(
            vec![Snapshot::Vector(svg.to_string())],
            "vector",
            &config(OutputFormat::Svg),
        )
        .unwrap();
        assert_eq!(artifact.media_type, "image/svg+xml");
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\""));
        assert!(text.ends_with("</svg>"));
    }

    #[test]
    fn svg_zip_entries_round_trip() {
        let snapshots = vec![
            Snapshot::Vector("<svg>1</svg>".into()),
            Snapshot::Vector("<svg>2</svg>".into()),
        ];
        let artifact = assemble(snapshots, "deck", &config(OutputFormat::Svg)).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
        let mut first = String::new();
        archive
            .by_name("page_001.svg")
            .unwrap()
            .read_to_string(&mut first)
            .unwrap();
        assert!(first.contains("<svg>1</svg>"));
    }

    #[test]
    fn zip_reports_completion_after_finalization() {
        use crate::status::StatusSink;
        use std::sync::{Arc, Mutex};

        #[derive(Default)]
        struct Recorder {
            progress: Mutex<Vec<(usize, usize)>>,
        }
        impl StatusSink for Recorder {
            fn set_progress(&self, current: usize, total: usize) {
                self.progress.lock().unwrap().push((current, total));
            }
        }

        let recorder = Arc::new(Recorder::default());
        let config = ExportConfig::builder()
            .format(OutputFormat::Jpg)
            .status(recorder.clone())
            .build()
            .unwrap();
        assemble(
            vec![solid_bitmap(10, 10), solid_bitmap(10, 10)],
            "doc",
            &config,
        )
        .unwrap();

        // Per-entry ticks, then the finalization tick.
        let progress = recorder.progress.lock().unwrap();
        assert_eq!(*progress, vec![(1, 2), (2, 2), (2, 2)]);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = assemble(Vec::new(), "doc", &config(OutputFormat::Pdf));
        assert!(matches!(err, Err(PagesnapError::Export { .. })));
    }

    #[test]
    fn existing_xml_declaration_is_kept() {
        let svg = "<?xml version=\"1.0\"?><svg/>";
        assert_eq!(finalize_svg(svg), svg);
    }
}
