//! Fixed-layout PDF export of a meeting summary: title, participants,
//! context, a key/value table of scheduled vs actual times, then the
//! summary text split into paragraphs. Built on printpdf's builtin
//! Helvetica so no font files ship with the binary.

use anyhow::Result;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

pub struct SummaryDocument {
    pub developer: String,
    pub investor: String,
    pub context_title: String,
    pub scheduled_start: Option<String>,
    pub scheduled_end: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub status: String,
    pub body: String,
}

const PAGE_WIDTH: f64 = 210.0;
const PAGE_HEIGHT: f64 = 297.0;
const MARGIN: f64 = 20.0;
const LINE_HEIGHT: f64 = 6.0;
const VALUE_COLUMN: f64 = 80.0;
const WRAP_COLUMNS: usize = 90;

struct Writer {
    doc: printpdf::PdfDocumentReference,
    layer: PdfLayerReference,
    y: f64,
}

impl Writer {
    fn text(&mut self, text: &str, size: f64, x: f64, font: &IndirectFontRef) {
        self.layer.use_text(text, size as f32, Mm(x as f32), Mm(self.y as f32), font);
    }

    fn advance(&mut self, lines: f64) {
        self.y -= LINE_HEIGHT * lines;
        if self.y < MARGIN {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }
}

pub fn render_summary(summary: &SummaryDocument) -> Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new("Meeting Summary", Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow::anyhow!("font load failed: {}", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow::anyhow!("font load failed: {}", e))?;

    let layer = doc.get_page(page).get_layer(layer);
    let mut w = Writer {
        doc,
        layer,
        y: PAGE_HEIGHT - MARGIN,
    };

    w.text("Meeting Summary", 18.0, MARGIN, &bold);
    w.advance(2.0);

    w.text(
        &format!("Participants: {} and {}", summary.developer, summary.investor),
        11.0,
        MARGIN,
        &regular,
    );
    w.advance(1.2);
    w.text(
        &format!("Context: {}", summary.context_title),
        11.0,
        MARGIN,
        &regular,
    );
    w.advance(2.0);

    let not_set = "not set".to_string();
    let rows = [
        ("Scheduled start", summary.scheduled_start.as_ref().unwrap_or(&not_set)),
        ("Scheduled end", summary.scheduled_end.as_ref().unwrap_or(&not_set)),
        ("Started", summary.started_at.as_ref().unwrap_or(&not_set)),
        ("Ended", summary.ended_at.as_ref().unwrap_or(&not_set)),
        ("Status", &summary.status),
    ];
    for (key, value) in rows {
        w.text(key, 10.0, MARGIN, &bold);
        w.text(value, 10.0, VALUE_COLUMN, &regular);
        w.advance(1.0);
    }
    w.advance(1.0);

    w.text("Summary", 13.0, MARGIN, &bold);
    w.advance(1.5);

    for paragraph in summary.body.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        for line in wrap_text(&paragraph.replace('\n', " "), WRAP_COLUMNS) {
            w.text(&line, 10.0, MARGIN, &regular);
            w.advance(1.0);
        }
        w.advance(0.8);
    }

    let bytes = w
        .doc
        .save_to_bytes()
        .map_err(|e| anyhow::anyhow!("PDF serialization failed: {}", e))?;
    Ok(bytes)
}

/// Greedy word wrap; overlong words get a line of their own.
fn wrap_text(text: &str, max_columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_columns {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SummaryDocument {
        SummaryDocument {
            developer: "ada".to_string(),
            investor: "grace".to_string(),
            context_title: "Foo".to_string(),
            scheduled_start: Some("2026-03-01T10:00:00+00:00".to_string()),
            scheduled_end: None,
            started_at: Some("2026-03-01T10:02:11+00:00".to_string()),
            ended_at: Some("2026-03-01T10:41:09+00:00".to_string()),
            status: "completed".to_string(),
            body: "First paragraph about traction.\n\nSecond paragraph about terms."
                .to_string(),
        }
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = render_summary(&sample()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn long_bodies_paginate_without_error() {
        let mut doc = sample();
        doc.body = "A long meeting produced many notes. ".repeat(400);
        let bytes = render_summary(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn wrap_respects_the_column_limit() {
        let lines = wrap_text("one two three four five six", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "one two three four five six");

        let lines = wrap_text("supercalifragilisticexpialidocious", 10);
        assert_eq!(lines.len(), 1);
    }
}
