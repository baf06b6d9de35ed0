//! Date, amount and currency normalization shared by every row and line builder.

pub mod amounts;
pub mod currency;
pub mod dates;
pub mod patterns;

pub use amounts::{AmountExtractor, Direction, parse_amount, round_to_cents};
pub use currency::{CurrencyDetector, detect_currency};
pub use dates::{DateExtractor, parse_date, parse_date_with_pivot};

/// Pulls one kind of statement field (date, amount, currency) out of free text.
///
/// The text-line parser and the table-less page diagnostics scan with
/// `extract_all`; currency detection picks its winner with `extract`.
pub trait FieldExtractor {
    type Output;

    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Every occurrence, in text order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A normalized value found in statement text.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    pub value: T,
    /// 0.0 - 1.0; currency tiers rank on it.
    pub confidence: f32,
    /// Byte span in the scanned text, when known.
    pub position: Option<(usize, usize)>,
    /// The matched fragment (`-12,50`), or a method tag such as `symbol:₾`.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
