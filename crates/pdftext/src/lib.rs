//! Document text extraction for cardlab
//!
//! Wraps `pdf-extract` behind a small trait so the pipeline can run
//! against canned text in tests. Extraction is best-effort: a missing
//! file or a parser error yields `None`, never a hard failure.

use std::path::Path;

use tracing::warn;

/// Extracts the reference text for one chapter from a document on disk.
pub trait TextExtractor: Send + Sync {
    /// Full text of the document, or `None` if the file is missing or
    /// extraction fails.
    fn extract(&self, path: &Path) -> Option<String>;
}

/// PDF extractor backed by `pdf-extract`
///
/// Pages that yield no text (scanned images, decorative pages) are
/// dropped; the rest are joined with newlines in page order.
#[derive(Debug, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Option<String> {
        if !path.exists() {
            warn!("document not found: {}", path.display());
            return None;
        }

        match pdf_extract::extract_text_by_pages(path) {
            Ok(pages) => {
                let text = pages
                    .iter()
                    .map(|p| p.trim())
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                if text.is_empty() {
                    warn!("no text extracted from {}", path.display());
                    None
                } else {
                    Some(text)
                }
            }
            Err(e) => {
                warn!("failed to extract text from {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_none() {
        let extractor = PdfExtractor;
        assert!(extractor
            .extract(Path::new("/nonexistent/chapter01.pdf"))
            .is_none());
    }

    #[test]
    fn garbage_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-pdf.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let extractor = PdfExtractor;
        assert!(extractor.extract(&path).is_none());
    }
}
