//! Text extraction from uploaded resumes, dispatched by declared MIME type.

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, TableCellContent, TableChild,
    TableRowChild,
};
use thiserror::Error;
use tracing::{debug, warn};

pub const PLAIN_TEXT_MIME: &str = "text/plain";
pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Raw-text fallback for PDFs the extractor cannot read is cut to this many characters.
pub const PDF_FALLBACK_MAX_CHARS: usize = 10_000;

#[derive(Debug, Error)]
pub enum FileParseError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("Failed to read DOCX document: {0}")]
    Docx(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Docx,
    Pdf,
}

impl FileKind {
    /// Matches the media type only; parameters such as `charset` are ignored.
    pub fn from_mime(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            PLAIN_TEXT_MIME => Some(FileKind::PlainText),
            DOCX_MIME => Some(FileKind::Docx),
            PDF_MIME => Some(FileKind::Pdf),
            _ => None,
        }
    }
}

pub fn parse_file(content_type: &str, data: &[u8]) -> Result<String, FileParseError> {
    let kind = FileKind::from_mime(content_type)
        .ok_or_else(|| FileParseError::Unsupported(content_type.to_string()))?;
    debug!("Parsing {} byte upload as {:?}", data.len(), kind);

    match kind {
        FileKind::PlainText => Ok(decode_text(data)),
        FileKind::Docx => extract_docx_text(data),
        FileKind::Pdf => Ok(extract_pdf_text(data)),
    }
}

/// Lossy UTF-8 decode with any leading byte-order mark removed.
fn decode_text(data: &[u8]) -> String {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    String::from_utf8_lossy(data).into_owned()
}

fn extract_docx_text(data: &[u8]) -> Result<String, FileParseError> {
    let docx = docx_rs::read_docx(data).map_err(|e| FileParseError::Docx(e.to_string()))?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => lines.push(paragraph_text(p)),
            DocumentChild::Table(table) => {
                for row in &table.rows {
                    #[allow(irrefutable_let_patterns)]
                    let TableChild::TableRow(row) = row else {
                        continue;
                    };
                    for cell in &row.cells {
                        #[allow(irrefutable_let_patterns)]
                        let TableRowChild::TableCell(cell) = cell else {
                            continue;
                        };
                        for content in &cell.children {
                            if let TableCellContent::Paragraph(p) = content {
                                lines.push(paragraph_text(p));
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(lines.join("\n").trim_end().to_string())
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}

/// Uses the PDF extractor, falling back to truncated raw text when it fails
/// or finds nothing. The extractor can panic on malformed input, so it runs
/// under `catch_unwind`.
fn extract_pdf_text(data: &[u8]) -> String {
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data));

    match extracted {
        Ok(Ok(text)) if !text.trim().is_empty() => text,
        Ok(Ok(_)) => {
            warn!("PDF extraction found no text, using raw fallback");
            raw_text_fallback(data)
        }
        Ok(Err(e)) => {
            warn!("PDF extraction failed ({e}), using raw fallback");
            raw_text_fallback(data)
        }
        Err(_) => {
            warn!("PDF extractor panicked, using raw fallback");
            raw_text_fallback(data)
        }
    }
}

fn raw_text_fallback(data: &[u8]) -> String {
    decode_text(data)
        .chars()
        .take(PDF_FALLBACK_MAX_CHARS)
        .collect()
}
