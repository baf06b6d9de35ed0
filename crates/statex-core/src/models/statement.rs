//! Statement data models: extracted transactions, metadata and output payload.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::amounts::round_to_cents;
use crate::normalize::currency::CurrencyDetection;

/// Placeholder used when a row resolves no description text.
pub const PLACEHOLDER_DESCRIPTION: &str = "Imported transaction";

/// One transaction extracted from a statement.
///
/// Negative amounts are debits (expenses), positive amounts credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Booking date.
    pub date: NaiveDate,

    /// Free-text description as printed on the statement.
    pub description: String,

    /// Signed amount, unrounded until output.
    pub amount: Decimal,
}

impl RawTransaction {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
        }
    }

    /// Append continuation text from the same page to the description.
    ///
    /// A description equal to `placeholder` is replaced outright.
    pub(crate) fn merge_description(&mut self, extra: &str, placeholder: &str) {
        let extra = extra.trim();
        if extra.is_empty() {
            return;
        }
        if self.description == placeholder {
            self.description = extra.to_string();
        } else {
            self.description.push(' ');
            self.description.push_str(extra);
        }
    }

    pub fn is_debit(&self) -> bool {
        self.amount.is_sign_negative()
    }
}

/// Statement-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementMetadata {
    /// ISO currency code.
    pub currency: String,

    /// Confidence of the currency decision (0.0 - 1.0).
    pub currency_confidence: f32,

    /// How the currency was found (e.g. `symbol:₾`, `default`).
    pub currency_detection_method: String,

    /// Source document name.
    pub source: Option<String>,

    /// Statement period bounds; never populated.
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

impl StatementMetadata {
    /// Metadata carrying the configured default currency.
    pub fn with_default_currency(code: impl Into<String>, confidence: f32) -> Self {
        Self::from_detection(CurrencyDetection::fallback(code, confidence))
    }

    pub fn from_detection(detection: CurrencyDetection) -> Self {
        Self {
            currency: detection.code,
            currency_confidence: detection.confidence,
            currency_detection_method: detection.method,
            source: None,
            period_start: None,
            period_end: None,
        }
    }

    pub fn with_source(mut self, source: Option<&str>) -> Self {
        self.source = source.map(str::to_string);
        self
    }

    pub(crate) fn apply_detection(&mut self, detection: CurrencyDetection) {
        self.currency = detection.code;
        self.currency_confidence = detection.confidence;
        self.currency_detection_method = detection.method;
    }
}

impl Default for StatementMetadata {
    fn default() -> Self {
        Self::with_default_currency("GEL", 0.4)
    }
}

/// A finalized transaction with translation and category attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub translated_description: String,

    /// Rounded to two decimal places.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    pub category: Option<String>,

    /// Rounded to two decimal places.
    pub confidence: f64,
}

impl CategorizedTransaction {
    pub fn new(
        raw: &RawTransaction,
        translated_description: String,
        category: Option<String>,
        confidence: f64,
    ) -> Self {
        Self {
            date: raw.date,
            description: raw.description.clone(),
            translated_description,
            amount: round_to_cents(raw.amount),
            category,
            confidence: (confidence * 100.0).round() / 100.0,
        }
    }
}

/// The document-level output: enriched transactions plus metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementPayload {
    pub transactions: Vec<CategorizedTransaction>,
    pub metadata: StatementMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_merge_description() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut tx = RawTransaction::new(date, PLACEHOLDER_DESCRIPTION, Decimal::from(-5));
        tx.merge_description("  Zoommer ", PLACEHOLDER_DESCRIPTION);
        assert_eq!(tx.description, "Zoommer");
        tx.merge_description("Tbilisi", PLACEHOLDER_DESCRIPTION);
        assert_eq!(tx.description, "Zoommer Tbilisi");
        assert!(tx.is_debit());
    }

    #[test]
    fn test_merge_description_custom_placeholder() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut tx = RawTransaction::new(date, "n/a", Decimal::from(-5));
        tx.merge_description("Carrefour", "n/a");
        assert_eq!(tx.description, "Carrefour");

        let mut tx = RawTransaction::new(date, PLACEHOLDER_DESCRIPTION, Decimal::from(-5));
        tx.merge_description("Carrefour", "n/a");
        assert_eq!(tx.description, "Imported transaction Carrefour");
    }

    #[test]
    fn test_payload_json_shape() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let raw = RawTransaction::new(date, "Coffee Shop", Decimal::from_str("-20.004").unwrap());
        let payload = StatementPayload {
            transactions: vec![CategorizedTransaction::new(
                &raw,
                "Coffee Shop".to_string(),
                Some("Restaurants".to_string()),
                0.4399,
            )],
            metadata: StatementMetadata::default().with_source(Some("march.pdf")),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["transactions"][0]["date"], "2024-03-01");
        assert_eq!(json["transactions"][0]["amount"], -20.0);
        assert_eq!(json["transactions"][0]["translatedDescription"], "Coffee Shop");
        assert_eq!(json["transactions"][0]["confidence"], 0.44);
        assert_eq!(json["metadata"]["currency"], "GEL");
        assert_eq!(json["metadata"]["currencyDetectionMethod"], "default");
        assert_eq!(json["metadata"]["source"], "march.pdf");
        assert!(json["metadata"]["periodStart"].is_null());
    }
}
