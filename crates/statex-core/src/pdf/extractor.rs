//! Statement document reader using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, warn};

use super::{Result, StatementDocument, StatementPage, Table, TableSettings, detect_tables};
use crate::error::PdfError;

/// A loaded PDF statement with per-page text.
#[derive(Debug, Clone)]
pub struct PdfStatement {
    pages: Vec<PdfPage>,
}

/// Content from a single PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text, `None` when the page had none.
    pub text: Option<String>,
}

impl PdfPage {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            number,
            text: (!text.trim().is_empty()).then_some(text),
        }
    }
}

impl PdfStatement {
    /// Load a statement from PDF bytes.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Owner-password-only files open with an empty user password
        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(PdfError::NoPages);
        }

        let texts = match pdf_extract::extract_text_from_mem_by_pages(&raw_data) {
            Ok(texts) if texts.len() == page_numbers.len() => texts,
            Ok(texts) => {
                warn!(
                    "pdf-extract returned {} pages for a {}-page document, using lopdf text",
                    texts.len(),
                    page_numbers.len()
                );
                lopdf_page_texts(&doc, &page_numbers)
            }
            Err(e) => {
                warn!("pdf-extract failed ({}), using lopdf text", e);
                lopdf_page_texts(&doc, &page_numbers)
            }
        };

        let pages: Vec<PdfPage> = page_numbers
            .iter()
            .zip(texts)
            .map(|(number, text)| PdfPage::new(*number, text))
            .collect();

        debug!("Loaded PDF with {} pages", pages.len());
        Ok(Self { pages })
    }

    /// Build a statement from already extracted page texts.
    pub fn from_page_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PdfPage::new(i as u32 + 1, text))
            .collect();
        Self { pages }
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Text of a specific page (1-indexed).
    pub fn page_text(&self, page: u32) -> Result<Option<&str>> {
        self.pages
            .iter()
            .find(|p| p.number == page)
            .map(|p| p.text.as_deref())
            .ok_or(PdfError::InvalidPage(page))
    }
}

fn lopdf_page_texts(doc: &Document, page_numbers: &[u32]) -> Vec<String> {
    page_numbers
        .iter()
        .map(|n| match doc.extract_text(&[*n]) {
            Ok(text) => text,
            Err(e) => {
                debug!("{}", PdfError::TextExtraction(format!("page {}: {}", n, e)));
                String::new()
            }
        })
        .collect()
}

impl StatementPage for PdfPage {
    fn extract_text(&self) -> Option<String> {
        self.text.clone()
    }

    fn extract_tables(&self, settings: &TableSettings) -> Result<Vec<Table>> {
        match &self.text {
            Some(text) => detect_tables(text, settings),
            None => Ok(Vec::new()),
        }
    }
}

impl StatementDocument for PdfStatement {
    type Page = PdfPage;

    fn pages(&self) -> &[PdfPage] {
        &self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(PdfStatement::load(b"not a pdf"), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_from_page_texts() {
        let doc = PdfStatement::from_page_texts(["Page one", "   "]);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_text(1).unwrap(), Some("Page one"));
        assert_eq!(doc.page_text(2).unwrap(), None);
        assert!(matches!(doc.page_text(3), Err(PdfError::InvalidPage(3))));
        assert!(doc.pages()[1].extract_tables(&TableSettings::default()).unwrap().is_empty());
    }
}
