//! Paginated PDF export.
//!
//! Text-only Letter pages using the standard Helvetica font, so no font data is
//! embedded. Every page starts with the header row; cells are padded or
//! truncated to a fixed character width.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cardbatch_core::{COLUMNS, Report};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 40.0;
const Y_START: f32 = 720.0;
const FONT_SIZE: f32 = 10.0;
const LEADING: f32 = 14.5;
/// WinAnsiEncoding code for the horizontal ellipsis.
const ELLIPSIS: u8 = 0x85;

#[derive(Debug, Clone)]
pub struct PdfOptions {
    /// Lines per page, header included
    pub rows_per_page: usize,
    /// Characters per cell
    pub cell_width: usize,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            rows_per_page: 45,
            cell_width: 20,
        }
    }
}

/// Split the report body into pages of lines, each page led by the header.
pub fn paginate(report: &Report, opts: &PdfOptions) -> Vec<Vec<String>> {
    let per_page = opts.rows_per_page.max(2);
    let header: String = COLUMNS
        .iter()
        .map(|c| pad_right(c, opts.cell_width))
        .collect();

    let mut pages = vec![vec![header.clone()]];
    for row in report.body() {
        if pages.last().is_some_and(|p| p.len() >= per_page) {
            pages.push(vec![header.clone()]);
        }
        let line: String = row
            .iter()
            .map(|cell| pad_right(&cell.display(), opts.cell_width))
            .collect();
        if let Some(page) = pages.last_mut() {
            page.push(line);
        }
    }
    pages
}

/// Pad with spaces to `width` characters, or cut to `width - 1` and append an ellipsis.
pub fn pad_right(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        format!("{:<width$}", text)
    }
}

/// Render the report to PDF bytes.
pub fn render_pdf(report: &Report, opts: &PdfOptions) -> Vec<u8> {
    let pages = paginate(report, opts);
    let mut doc = PdfWriter::default();

    // 1: catalog, 2: page tree, 3: font, then a (page, content) pair per page
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
    doc.object(b"<< /Type /Catalog /Pages 2 0 R >>");
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
    doc.object(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .as_bytes(),
    );
    doc.object(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>");

    for (lines, page_id) in pages.iter().zip(&page_ids) {
        let content_id = page_id + 1;
        doc.object(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
            )
            .as_bytes(),
        );
        doc.stream(&content_stream(lines));
    }

    doc.finish()
}

pub fn write_pdf(report: &Report, path: &Path, opts: &PdfOptions) -> Result<usize> {
    let pages = paginate(report, opts).len();
    let bytes = render_pdf(report, opts);
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(pages)
}

fn content_stream(lines: &[String]) -> Vec<u8> {
    let mut s = Vec::new();
    s.extend_from_slice(
        format!("BT\n/F1 {FONT_SIZE} Tf\n{LEADING} TL\n{MARGIN} {Y_START} Td\n").as_bytes(),
    );
    for line in lines {
        s.push(b'(');
        s.extend(encode_text(line));
        s.extend_from_slice(b") Tj\nT*\n");
    }
    s.extend_from_slice(b"ET\n");
    s
}

/// WinAnsi bytes for a PDF string literal, with `( ) \` escaped.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            '…' => out.push(ELLIPSIS),
            ' '..='~' => out.push(ch as u8),
            '\u{A0}'..='\u{FF}' => out.push(ch as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

/// Sequential object writer that tracks offsets for the xref table.
#[derive(Default)]
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn begin(&mut self) {
        if self.buf.is_empty() {
            self.buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        }
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
    }

    fn object(&mut self, body: &[u8]) {
        self.begin();
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, data: &[u8]) {
        self.begin();
        self.buf
            .extend_from_slice(format!("<< /Length {} >>\nstream\n", data.len()).as_bytes());
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_at = self.buf.len();
        let mut xref = String::new();
        let _ = writeln!(xref, "xref\n0 {}", self.offsets.len() + 1);
        xref.push_str("0000000000 65535 f \n");
        for off in &self.offsets {
            let _ = writeln!(xref, "{off:010} 00000 n ");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            self.offsets.len() + 1
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}
