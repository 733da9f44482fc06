//! PDF drawing backend for the report layout.
//!
//! Walks the pages the paginator produced and draws each block at its
//! cursor position. All layout decisions (order, heights, page breaks) were
//! already made in miljo-core; this module only knows how to paint.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};
use thiserror::Error;

use miljo_core::layout::{
    Block, Card, DISCLAIMER, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, Page, REC_GLYPHS, REPORT_TITLE,
    SECTION_PALETTE, STAT_PREFIX, Stat, TOP_MARGIN_MM,
};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not write report file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not build report document: {0}")]
    Pdf(String),
}

const MARGIN_MM: f64 = 18.0;
const CONTENT_WIDTH_MM: f64 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

const INK: (f64, f64, f64) = (0.15, 0.15, 0.17);
const MUTED: (f64, f64, f64) = (0.45, 0.45, 0.48);
const CARD_FILL: (f64, f64, f64) = (0.93, 0.95, 0.93);
const BANNER_FILL: (f64, f64, f64) = (0.10, 0.35, 0.22);
const WHITE: (f64, f64, f64) = (1.0, 1.0, 1.0);

/// Draw the paginated report to `path`. Any failure here is fatal to the
/// pipeline: a missing report is an error, not a degraded result.
pub fn render_pdf(path: &Path, pages: &[Page]) -> Result<(), RenderError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(REPORT_TITLE, Mm(PAGE_WIDTH_MM as f32), Mm(PAGE_HEIGHT_MM as f32), "Innehåll");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;

    for (i, page) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) =
                doc.add_page(Mm(PAGE_WIDTH_MM as f32), Mm(PAGE_HEIGHT_MM as f32), "Innehåll");
            doc.get_page(page_idx).get_layer(layer_idx)
        };

        let painter = Painter {
            layer,
            regular: &regular,
            bold: &bold,
        };

        let mut cursor = TOP_MARGIN_MM;
        for block in &page.blocks {
            painter.draw_block(block, cursor);
            cursor += block.height_mm();
        }
        painter.draw_footer();
    }

    // an empty page list still yields a valid (blank) document
    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    Ok(())
}

struct Painter<'a> {
    layer: PdfLayerReference,
    regular: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
}

impl Painter<'_> {
    fn draw_block(&self, block: &Block, cursor: f64) {
        match block {
            Block::Banner { title, subtitle } => self.draw_banner(title, subtitle, cursor),
            Block::Meta { label, value } => self.draw_meta(label, value, cursor),
            Block::CardRow(cards) => self.draw_card_row(cards, cursor),
            Block::Section {
                index,
                title,
                color,
                stats,
            } => self.draw_section(*index, title, *color, stats, cursor),
            Block::Heading(text) => self.draw_heading(text, cursor),
            Block::Recommendation { index, text } => self.draw_recommendation(*index, text, cursor),
            Block::PageBreak => {}
        }
    }

    fn draw_banner(&self, title: &str, subtitle: &str, cursor: f64) {
        self.fill_rect(MARGIN_MM, cursor, CONTENT_WIDTH_MM, 24.0, BANNER_FILL);
        self.text(title, 24.0, MARGIN_MM + 6.0, cursor + 12.0, self.bold, WHITE);
        self.text(subtitle, 11.0, MARGIN_MM + 6.0, cursor + 20.0, self.regular, WHITE);
    }

    fn draw_meta(&self, label: &str, value: &str, cursor: f64) {
        self.text(
            &format!("{label}: {value}"),
            10.0,
            MARGIN_MM,
            cursor + 5.0,
            self.regular,
            MUTED,
        );
    }

    fn draw_card_row(&self, cards: &[Card], cursor: f64) {
        if cards.is_empty() {
            return;
        }
        let gap = 6.0;
        let width = (CONTENT_WIDTH_MM - gap * (cards.len() as f64 - 1.0)) / cards.len() as f64;

        for (i, card) in cards.iter().enumerate() {
            let x = MARGIN_MM + i as f64 * (width + gap);
            self.fill_rect(x, cursor, width, 28.0, CARD_FILL);
            self.text(&card.label, 9.0, x + 5.0, cursor + 8.0, self.regular, MUTED);
            self.text(&card.value, 18.0, x + 5.0, cursor + 18.0, self.bold, INK);
            self.text(&card.unit, 9.0, x + 5.0, cursor + 24.0, self.regular, MUTED);
        }
    }

    fn draw_section(&self, index: usize, title: &str, color: usize, stats: &[Stat], cursor: f64) {
        let band = SECTION_PALETTE[color % SECTION_PALETTE.len()];
        self.stroke_rect(MARGIN_MM, cursor, CONTENT_WIDTH_MM, 40.0, MUTED);
        self.fill_rect(MARGIN_MM, cursor, CONTENT_WIDTH_MM, 10.0, band);
        self.text(
            &format!("{index}. {title}"),
            12.0,
            MARGIN_MM + 4.0,
            cursor + 7.0,
            self.bold,
            WHITE,
        );

        for (i, stat) in stats.iter().enumerate() {
            self.text(
                &format!("{STAT_PREFIX} {}: {}", stat.label, stat.value),
                10.0,
                MARGIN_MM + 6.0,
                cursor + 16.5 + i as f64 * 6.5,
                self.regular,
                INK,
            );
        }
    }

    fn draw_heading(&self, text: &str, cursor: f64) {
        self.text(text, 16.0, MARGIN_MM, cursor + 8.0, self.bold, INK);
    }

    fn draw_recommendation(&self, index: usize, text: &str, cursor: f64) {
        let glyph = REC_GLYPHS[index % REC_GLYPHS.len()];
        self.fill_rect(MARGIN_MM, cursor, CONTENT_WIDTH_MM, 14.0, CARD_FILL);
        self.text(glyph, 12.0, MARGIN_MM + 4.0, cursor + 9.0, self.bold, BANNER_FILL);
        self.text(text, 10.0, MARGIN_MM + 12.0, cursor + 9.0, self.regular, INK);
    }

    fn draw_footer(&self) {
        let size = 7.0;
        let x = (PAGE_WIDTH_MM - approx_text_width_mm(DISCLAIMER, size)) / 2.0;
        self.text(
            DISCLAIMER,
            size,
            x.max(MARGIN_MM),
            PAGE_HEIGHT_MM - 10.0,
            self.regular,
            MUTED,
        );
    }

    /// `y_mm` is measured from the top of the page; PDF space grows upward.
    fn text(
        &self,
        text: &str,
        size: f64,
        x_mm: f64,
        y_mm: f64,
        font: &IndirectFontRef,
        color: (f64, f64, f64),
    ) {
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(color.0 as f32, color.1 as f32, color.2 as f32, None)));
        self.layer
            .use_text(text, size as f32, Mm(x_mm as f32), Mm((PAGE_HEIGHT_MM - y_mm) as f32), font);
    }

    fn fill_rect(&self, x: f64, y_mm: f64, width: f64, height: f64, color: (f64, f64, f64)) {
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(color.0 as f32, color.1 as f32, color.2 as f32, None)));
        let rect = Rect::new(
            Mm(x as f32),
            Mm((PAGE_HEIGHT_MM - y_mm - height) as f32),
            Mm((x + width) as f32),
            Mm((PAGE_HEIGHT_MM - y_mm) as f32),
        )
        .with_mode(PaintMode::Fill);
        self.layer.add_rect(rect);
    }

    fn stroke_rect(&self, x: f64, y_mm: f64, width: f64, height: f64, color: (f64, f64, f64)) {
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(color.0 as f32, color.1 as f32, color.2 as f32, None)));
        self.layer.set_outline_thickness(0.5);
        let rect = Rect::new(
            Mm(x as f32),
            Mm((PAGE_HEIGHT_MM - y_mm - height) as f32),
            Mm((x + width) as f32),
            Mm((PAGE_HEIGHT_MM - y_mm) as f32),
        )
        .with_mode(PaintMode::Stroke);
        self.layer.add_rect(rect);
    }
}

/// Rough width estimate for centering; Helvetica averages about half the
/// font size per glyph.
fn approx_text_width_mm(text: &str, size_pt: f64) -> f64 {
    const PT_TO_MM: f64 = 0.352_778;
    text.chars().count() as f64 * size_pt * 0.5 * PT_TO_MM
}

#[cfg(test)]
mod tests {
    use super::*;
    use miljo_core::fallback::fallback_classify;
    use miljo_core::layout::{CONTENT_LIMIT_MM, build_blocks, paginate};
    use miljo_core::locator::FactorTable;
    use miljo_core::aggregate::CategoryAggregate;
    use std::fs;

    fn sample_pages() -> Vec<Page> {
        let aggregates = vec![
            CategoryAggregate {
                name: "Kylskåp".to_string(),
                total_cost: 10000.0,
                total_quantity: 5.0,
                count: 2,
            },
            CategoryAggregate {
                name: "Arbetsjacka".to_string(),
                total_cost: 1200.0,
                total_quantity: 4.0,
                count: 4,
            },
        ];
        let factors = FactorTable::from_iter([
            ("kyl".to_string(), 410.0),
            ("övrigt".to_string(), 7.0),
        ]);
        let result = fallback_classify(&aggregates, &factors);
        paginate(
            build_blocks("inkop.xlsx", "2026-08-07 09:12", &result),
            CONTENT_LIMIT_MM,
        )
    }

    #[test]
    fn test_renders_a_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rapport.pdf");

        render_pdf(&path, &sample_pages()).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.len() > 1000, "suspiciously small report");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_page_list_still_writes_a_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tom.pdf");

        render_pdf(&path, &[]).unwrap();
        assert!(fs::read(&path).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let path = Path::new("/finns/inte/rapport.pdf");
        assert!(matches!(
            render_pdf(path, &sample_pages()),
            Err(RenderError::Io(_))
        ));
    }
}
