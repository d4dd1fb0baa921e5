use std::io::Write;
use std::panic::{catch_unwind, UnwindSafe};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::extraction::{ExtractionError, TextExtractor};
use crate::models::Document;

/// `pdf-extract` backed extractor. Page text is concatenated in page order.
///
/// With a scratch directory configured, each document is spooled to a uniquely named
/// temp file that is removed when extraction finishes, whatever the outcome.
/// Without one, the in-memory buffer is parsed directly.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor {
    scratch_dir: Option<PathBuf>,
}

impl PdfTextExtractor {
    pub fn new(scratch_dir: Option<PathBuf>) -> Self {
        Self { scratch_dir }
    }

    fn extract_via_scratch(&self, dir: &Path, document: &Document) -> Result<String, ExtractionError> {
        let mut scratch = tempfile::Builder::new()
            .prefix("resume-")
            .suffix(".pdf")
            .tempfile_in(dir)?;
        scratch.write_all(&document.bytes)?;
        scratch.flush()?;

        let path = scratch.path().to_path_buf();
        debug!("Spooled {} to {}", document.name, path.display());

        // `scratch` is dropped (and the file deleted) when this function returns.
        parse_guarded(|| pdf_extract::extract_text(&path))
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, document: &Document) -> Result<String, ExtractionError> {
        if document.bytes.is_empty() {
            return Err(ExtractionError::Empty);
        }

        match &self.scratch_dir {
            Some(dir) => self.extract_via_scratch(dir, document),
            None => {
                let bytes: &[u8] = &document.bytes;
                parse_guarded(|| pdf_extract::extract_text_from_mem(bytes))
            }
        }
    }
}

/// Runs a `pdf-extract` call, turning both its errors and its panics into `ExtractionError`.
fn parse_guarded<F>(parse: F) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, pdf_extract::OutputError> + UnwindSafe,
{
    match catch_unwind(parse) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractionError::Parse(format!("{e:?}"))),
        Err(_) => Err(ExtractionError::Parse("PDF parser panicked".to_string())),
    }
}

/// Builds a single-page PDF with one Helvetica text line per entry of `lines`.
/// Offsets in the xref table are computed, so the output is well-formed.
#[cfg(test)]
pub(crate) fn minimal_pdf(lines: &[&str]) -> Vec<u8> {
    let mut content = String::from("BT\n/F1 12 Tf\n72 720 Td\n");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            content.push_str("0 -16 Td\n");
        }
        let escaped = line
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        content.push_str(&format!("({escaped}) Tj\n"));
    }
    content.push_str("ET\n");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    out.into_bytes()
}
