//! Pagination and PDF output.
//!
//! `paginate` is a pure function from a [`Document`] to placed text: it walks
//! the sections with a running vertical cursor, wraps each block with the
//! static metrics, and starts a new page whenever a line would cross the
//! bottom margin. `render_pdf` replays that layout through `printpdf` with
//! the built-in Helvetica faces and drops the photo into its reserved box on
//! page one.

use std::fs::File;
use std::io::{BufWriter, Cursor as ByteCursor};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use printpdf::image_crate::codecs::jpeg::JpegDecoder;
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{BuiltinFont, Image, ImageTransform, Mm, PdfDocument, PdfLayerReference};
use serde::Serialize;
use tracing::warn;

use crate::models::record::CvRecord;
use crate::render::document::{build_document, BlockStyle, Document};
use crate::render::layout::{helvetica, PageConfig};

pub const EXPORT_FILE_NAME: &str = "My_CV.pdf";

/// Gap between the photo box and the text that flows around or below it.
const PHOTO_GAP_MM: f32 = 4.0;

/// One line of text with its resolved position. `y_mm` is the baseline
/// measured from the top of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x_mm: f32,
    pub y_mm: f32,
    pub size_pt: f32,
    pub bold: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageLayout {
    pub items: Vec<PlacedText>,
}

#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub file: PathBuf,
    pub pages: usize,
}

struct LayoutCursor<'a> {
    config: &'a PageConfig,
    pages: Vec<PageLayout>,
    y: f32,
}

impl<'a> LayoutCursor<'a> {
    fn new(config: &'a PageConfig) -> Self {
        LayoutCursor {
            config,
            pages: vec![PageLayout::default()],
            y: config.margin_mm,
        }
    }

    /// Starts a new page if `needed` millimetres do not fit above the
    /// bottom margin.
    fn ensure(&mut self, needed: f32) {
        if self.y + needed > self.config.bottom_limit_mm() {
            self.pages.push(PageLayout::default());
            self.y = self.config.margin_mm;
        }
    }

    fn line(&mut self, text: String, size_pt: f32, bold: bool) {
        let height = self.config.line_height_mm(size_pt);
        self.ensure(height);
        self.y += height;
        let item = PlacedText {
            text,
            x_mm: self.config.margin_mm,
            y_mm: self.y,
            size_pt,
            bold,
        };
        if let Some(page) = self.pages.last_mut() {
            page.items.push(item);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y += mm;
    }
}

/// Lays the document out onto pages. Deterministic for a given document and
/// page configuration.
pub fn paginate(document: &Document, config: &PageConfig) -> Vec<PageLayout> {
    let metrics = helvetica();
    let mut cursor = LayoutCursor::new(config);

    // The header shares page one with the photo box, so its lines wrap to a
    // narrower column when a photo is present.
    let header_width = if document.has_photo {
        config.text_width_mm() - config.photo_box_mm - PHOTO_GAP_MM
    } else {
        config.text_width_mm()
    };

    for (index, section) in document.sections.iter().enumerate() {
        let is_header = index == 0 && section.title.is_none();

        if let Some(title) = &section.title {
            // Keep a section title together with at least one body line.
            cursor.ensure(
                config.line_height_mm(config.heading_pt) + config.line_height_mm(config.body_pt),
            );
            cursor.line(title.clone(), config.heading_pt, true);
            cursor.gap(config.block_gap_mm);
        }

        for (position, block) in section.blocks.iter().enumerate() {
            if position > 0 {
                cursor.gap(config.block_gap_mm);
            }
            let (size_pt, bold, prefix) = match block.style {
                BlockStyle::Name => (config.name_pt, true, ""),
                BlockStyle::Contact => (config.body_pt, false, ""),
                BlockStyle::SubHeading => (config.sub_pt, true, ""),
                BlockStyle::Body => (config.body_pt, false, ""),
                BlockStyle::Bullet => (config.body_pt, false, "- "),
            };
            let width = if is_header {
                header_width
            } else {
                config.text_width_mm()
            };
            let text = format!("{prefix}{}", block.text);
            for wrapped in metrics.wrap(&text, size_pt, bold, width) {
                cursor.line(wrapped, size_pt, bold);
            }
        }

        if is_header && document.has_photo {
            // Everything after the header flows below the photo box.
            let photo_bottom = config.margin_mm + config.photo_box_mm + PHOTO_GAP_MM;
            if cursor.y < photo_bottom {
                cursor.y = photo_bottom;
            }
        }
        cursor.gap(config.section_gap_mm);
    }

    cursor.pages
}

/// Renders the record to `out_path`. A photo that cannot be decoded is
/// logged and skipped; the export still succeeds without it.
pub fn render_pdf(
    record: &CvRecord,
    config: &PageConfig,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let document = build_document(record);
    let pages = paginate(&document, config);

    let (doc, first_page, first_layer) = PdfDocument::new(
        "My CV",
        Mm(config.page_width_mm.into()),
        Mm(config.page_height_mm.into()),
        "Page 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) = doc.add_page(
                Mm(config.page_width_mm.into()),
                Mm(config.page_height_mm.into()),
                format!("Page {}", index + 1),
            );
            doc.get_page(page_ref).get_layer(layer_ref)
        };

        if index == 0 {
            if let Some(photo) = record.personal_info.photo.as_deref() {
                if let Err(err) = embed_photo(&layer, photo, config) {
                    warn!(error = %err, "could not embed photo, exporting without it");
                }
            }
        }

        for item in &page.items {
            let font = if item.bold { &bold } else { &regular };
            layer.use_text(
                item.text.clone(),
                item.size_pt.into(),
                Mm(item.x_mm.into()),
                Mm((config.page_height_mm - item.y_mm).into()),
                font,
            );
        }
    }

    let file = File::create(out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    doc.save(&mut BufWriter::new(file))?;

    Ok(ExportSummary {
        file: out_path.to_path_buf(),
        pages: pages.len(),
    })
}

/// Decodes the stored data URL and places the image inside the photo box
/// top-right on the current layer, preserving aspect ratio.
fn embed_photo(
    layer: &PdfLayerReference,
    data_url: &str,
    config: &PageConfig,
) -> anyhow::Result<()> {
    let bytes = decode_data_url(data_url).context("photo is not a base64 data URL")?;
    let kind = infer::get(&bytes).ok_or_else(|| anyhow!("unrecognized image data"))?;
    let image = match kind.mime_type() {
        "image/jpeg" => Image::try_from(JpegDecoder::new(ByteCursor::new(&bytes))?)?,
        "image/png" => Image::try_from(PngDecoder::new(ByteCursor::new(&bytes))?)?,
        other => bail!("unsupported photo format: {other}"),
    };

    let px_w = image.image.width.0 as f32;
    let px_h = image.image.height.0 as f32;
    if px_w <= 0.0 || px_h <= 0.0 {
        bail!("photo has no pixels");
    }

    let dpi = (px_w * 25.4 / config.photo_box_mm).max(px_h * 25.4 / config.photo_box_mm);
    let shown_w = px_w * 25.4 / dpi;
    let shown_h = px_h * 25.4 / dpi;
    let x = config.page_width_mm - config.margin_mm - shown_w;
    let y = config.page_height_mm - config.margin_mm - shown_h;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x.into())),
            translate_y: Some(Mm(y.into())),
            dpi: Some(dpi.into()),
            ..Default::default()
        },
    );
    Ok(())
}

fn decode_data_url(data_url: &str) -> Option<Vec<u8>> {
    let rest = data_url.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    BASE64.decode(payload).ok()
}
