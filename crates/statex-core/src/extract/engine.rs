//! Document-level extraction: pages, candidate sets, reconciliation.

use tracing::{debug, info, warn};

use super::rows::RowBuilder;
use super::score::reconcile;
use super::strategy::extract_page_tables;
use super::text::parse_text_lines;
use super::{ExtractionReport, StatementExtraction};
use crate::models::{ExtractionConfig, RawTransaction, StatementMetadata};
use crate::normalize::detect_currency;
use crate::pdf::{PdfStatement, StatementDocument, StatementPage};

const PREVIEW_CHARS: usize = 200;

/// Statement extraction engine.
///
/// Holds no state besides its configuration; every call works on one
/// document and returns its transactions in reading order.
pub struct StatementExtractor {
    config: ExtractionConfig,
}

impl StatementExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Enable or disable the text-derived candidate set.
    pub fn with_text_fallback(mut self, enabled: bool) -> Self {
        self.config.text_fallback = enabled;
        self
    }

    fn default_metadata(&self, source: Option<&str>) -> StatementMetadata {
        StatementMetadata::with_default_currency(
            self.config.default_currency.clone(),
            self.config.default_currency_confidence,
        )
        .with_source(source)
    }

    /// Extract from raw PDF bytes.
    ///
    /// A document that cannot be opened yields an empty result with default
    /// metadata rather than an error.
    pub fn extract_pdf(&self, data: &[u8], source: Option<&str>) -> StatementExtraction {
        match PdfStatement::load(data) {
            Ok(doc) => self.extract_document(&doc, source),
            Err(e) => {
                warn!("Could not open {}: {}", source.unwrap_or("document"), e);
                StatementExtraction::empty(self.default_metadata(source))
            }
        }
    }

    /// Extract transactions and metadata from a document.
    pub fn extract_document<D: StatementDocument>(&self, doc: &D, source: Option<&str>) -> StatementExtraction {
        let mut metadata = self.default_metadata(source);
        let pages = doc.pages();
        let mut report = ExtractionReport {
            pages: pages.len(),
            ..ExtractionReport::default()
        };
        info!("Extracting {} ({} pages)", source.unwrap_or("document"), pages.len());

        let builder = RowBuilder::new(&self.config.layout, &self.config.placeholder_description);
        let mut table_set: Vec<RawTransaction> = Vec::new();
        let mut page_texts: Vec<String> = Vec::with_capacity(pages.len());

        for (idx, page) in pages.iter().enumerate() {
            let page_number = idx + 1;
            let text = page.extract_text();

            if page_number == 1 {
                self.inspect_first_page(text.as_deref(), &mut metadata);
            }

            let outcome = extract_page_tables(page, page_number, &self.config.profiles, &builder);
            if outcome.table_less {
                report.table_less_pages.push(page_number);
            }
            report.table_drops.merge(&outcome.drops);
            report.page_profiles.push(outcome.profile);
            table_set.extend(outcome.transactions);

            if let Some(text) = text {
                page_texts.push(text);
            }
        }

        let text_set = if self.config.text_fallback {
            let (transactions, drops) = parse_text_lines(
                page_texts.iter().map(String::as_str),
                &self.config.placeholder_description,
            );
            report.text_drops = drops;
            transactions
        } else {
            Vec::new()
        };

        report.table_count = table_set.len();
        report.text_count = text_set.len();

        let (chosen, transactions, table_score, text_score) = reconcile(table_set, text_set);
        report.chosen = Some(chosen);
        report.table_score = table_score;
        report.text_score = text_score;

        info!(
            "Chose {:?} set: {} transactions (table {} scored {:.2}, text {} scored {:.2})",
            chosen,
            transactions.len(),
            report.table_count,
            table_score,
            report.text_count,
            text_score
        );

        StatementExtraction {
            transactions,
            metadata,
            report,
        }
    }

    fn inspect_first_page(&self, text: Option<&str>, metadata: &mut StatementMetadata) {
        let Some(text) = text else {
            warn!("Page 1 has no extractable text");
            return;
        };

        let preview: String = text.chars().take(PREVIEW_CHARS).collect();
        debug!("Page 1 preview: {:?}", preview);

        match detect_currency(text) {
            Some(detection) => {
                info!(
                    "Detected currency {} via {} ({:.2})",
                    detection.code, detection.method, detection.confidence
                );
                metadata.apply_detection(detection);
            }
            None => debug!("No currency signal on page 1, using {}", metadata.currency),
        }
    }
}

impl Default for StatementExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::CandidateSource;

    #[test]
    fn test_unreadable_pdf_yields_empty_result() {
        let result = StatementExtractor::default().extract_pdf(b"%PDF-garbage", Some("broken.pdf"));
        assert!(result.is_empty());
        assert_eq!(result.metadata.currency, "GEL");
        assert_eq!(result.metadata.currency_detection_method, "default");
        assert_eq!(result.metadata.source.as_deref(), Some("broken.pdf"));
    }

    #[test]
    fn test_text_only_document() {
        let doc = PdfStatement::from_page_texts([
            "Account statement ₾\n15.04.2024 14:02 Transfer to Landlord 500.00 1500.00",
            "16.04.2024 Salary 2000.00 3500.00",
        ]);
        let result = StatementExtractor::default().extract_document(&doc, None);
        assert_eq!(result.report.chosen, Some(CandidateSource::Text));
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(result.metadata.currency_detection_method, "symbol:₾");
    }

    #[test]
    fn test_text_fallback_disabled() {
        let doc = PdfStatement::from_page_texts(["15.04.2024 Transfer to Landlord 500.00 1500.00"]);
        let result = StatementExtractor::default()
            .with_text_fallback(false)
            .extract_document(&doc, None);
        assert!(result.is_empty());
        assert_eq!(result.report.text_count, 0);
    }
}
