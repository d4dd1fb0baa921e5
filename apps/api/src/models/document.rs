use std::path::Path;

use bytes::Bytes;

/// An uploaded resume: raw bytes plus the (sanitized) display name.
/// Consumed once by the extractor and never retained by the pipeline.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub bytes: Bytes,
}

impl Document {
    pub fn new(name: impl AsRef<str>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: sanitize_filename(name.as_ref()),
            bytes: bytes.into(),
        }
    }

    /// Only `.pdf` uploads are accepted (case-insensitive check of the text after the
    /// last dot). A bare `.pdf` name counts as a PDF even though `Path::extension` sees none.
    pub fn is_pdf(&self) -> bool {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
    }

    /// File name without its extension. Used as the fallback candidate name.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// Keeps only the last path component of an uploaded file name.
/// `.` and `..` components are dropped; dots inside a name (`cv..pdf`) are kept.
pub fn sanitize_filename(name: &str) -> String {
    name.split(['/', '\\'])
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .last()
        .unwrap_or("unnamed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extension_is_case_insensitive() {
        assert!(Document::new("resume.PDF", Vec::new()).is_pdf());
        assert!(Document::new("resume.pdf", Vec::new()).is_pdf());
        assert!(!Document::new("resume.docx", Vec::new()).is_pdf());
        assert!(!Document::new("pdf", Vec::new()).is_pdf());
    }

    #[test]
    fn test_bare_pdf_name_is_accepted() {
        assert!(Document::new(".pdf", Vec::new()).is_pdf());
        assert!(!Document::new("resume.pdf.exe", Vec::new()).is_pdf());
    }

    #[test]
    fn test_sanitize_removes_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\cv.pdf"), "cv.pdf");
        assert_eq!(sanitize_filename("uploads/../"), "uploads");
        assert_eq!(sanitize_filename(""), "unnamed");
        assert_eq!(sanitize_filename(".."), "unnamed");
        assert_eq!(sanitize_filename("./.."), "unnamed");
    }

    #[test]
    fn test_inner_double_dots_keep_pdf_extension() {
        let doc = Document::new("cv..pdf", Vec::new());
        assert_eq!(doc.name, "cv..pdf");
        assert!(doc.is_pdf());

        let doc = Document::new("jane.v2..PDF", Vec::new());
        assert_eq!(doc.name, "jane.v2..PDF");
        assert!(doc.is_pdf());
    }

    #[test]
    fn test_stem_drops_extension() {
        let doc = Document::new("jane_doe.resume.pdf", Vec::new());
        assert_eq!(doc.stem(), "jane_doe.resume");
    }
}
