//! A4 pages of Helvetica text lines, rendered with printpdf.
//!
//! Coordinates are in millimetres from the top-left corner of the page, with
//! `y` naming the text baseline. printpdf measures from the bottom-left, so
//! `y` is flipped when the page is drawn.

use crate::error::{BoardError, Result};
use printpdf::{BuiltinFont, Mm, PdfDocument};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const FONT_SIZE_PT: f32 = 16.0;

const DOCUMENT_TITLE: &str = "FlowBoard Export";
const LAYER: &str = "Text";

#[derive(Debug, Clone, PartialEq)]
struct TextLine {
    x_mm: f32,
    y_mm: f32,
    text: String,
}

/// Text placed page by page; nothing is rendered until `to_bytes`.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPages {
    pages: Vec<Vec<TextLine>>,
}

impl Default for PdfPages {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfPages {
    /// One empty page.
    pub fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
        }
    }

    /// Places `text` on the current (last) page.
    pub fn text(&mut self, text: &str, x_mm: f32, y_mm: f32) {
        let line = TextLine {
            x_mm,
            y_mm,
            text: text.to_string(),
        };
        if let Some(page) = self.pages.last_mut() {
            page.push(line);
        }
    }

    pub fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text placed on the given page, in placement order.
    pub fn page_text(&self, page: usize) -> Vec<&str> {
        self.pages
            .get(page)
            .map(|lines| lines.iter().map(|l| l.text.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(DOCUMENT_TITLE, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| BoardError::Pdf(format!("{:?}", err)))?;

        let mut layer = doc.get_page(first_page).get_layer(first_layer);
        for (i, lines) in self.pages.iter().enumerate() {
            if i > 0 {
                let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER);
                layer = doc.get_page(page).get_layer(page_layer);
            }
            for line in lines {
                layer.use_text(
                    printable(&line.text),
                    FONT_SIZE_PT,
                    Mm(line.x_mm),
                    Mm(PAGE_HEIGHT_MM - line.y_mm),
                    &font,
                );
            }
        }

        doc.save_to_bytes()
            .map_err(|err| BoardError::Pdf(format!("{:?}", err)))
    }
}

/// Built-in fonts only cover single-byte text: control characters become
/// spaces and anything outside ASCII becomes `?`.
fn printable(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            c if c.is_control() => ' ',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}
