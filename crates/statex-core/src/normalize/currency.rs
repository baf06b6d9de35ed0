//! Statement currency detection from page text.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::patterns::{CURRENCY_LABEL, ISO_TOKEN};
use super::{ExtractionMatch, FieldExtractor};

/// ISO codes accepted from labels and bare tokens.
pub const ISO_WHITELIST: &[&str] = &[
    "GEL", "USD", "EUR", "GBP", "RUB", "KZT", "AMD", "AZN", "TRY", "UAH", "JPY", "CNY", "INR",
    "CHF", "PLN",
];

const SYMBOLS: &[(char, &str)] = &[
    ('₾', "GEL"),
    ('₽', "RUB"),
    ('$', "USD"),
    ('€', "EUR"),
    ('£', "GBP"),
    ('¥', "JPY"),
    ('₹', "INR"),
    ('₺', "TRY"),
];

lazy_static! {
    // (whole word with its inflections, code, confidence, tag)
    static ref KEYWORDS: Vec<(Regex, &'static str, f32, &'static str)> = [
        (r"lari", "GEL", 0.85, "lari"),
        (r"ლარ(?:ი|ის|ით|ად|ში)?", "GEL", 0.85, "lari"),
        (r"ro?ubles?", "RUB", 0.8, "ruble"),
        (r"рубл(?:ь|я|ей|ю|ем|е|ях|ям|ями)", "RUB", 0.8, "ruble"),
        (r"tenge", "KZT", 0.8, "tenge"),
        (r"тенге", "KZT", 0.8, "tenge"),
        (r"drams?", "AMD", 0.75, "dram"),
        (r"драм(?:а|ы|ов|ах)?", "AMD", 0.75, "dram"),
    ]
    .iter()
    .map(|(stem, code, confidence, tag)| {
        (Regex::new(&format!(r"(?i)\b(?:{})\b", stem)).unwrap(), *code, *confidence, *tag)
    })
    .collect();
}

const LABEL_CONFIDENCE: f32 = 0.95;
const SYMBOL_CONFIDENCE: f32 = 0.9;
const ISO_CONFIDENCE: f32 = 0.65;

/// Outcome of currency detection for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyDetection {
    /// ISO 4217 code.
    pub code: String,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// How the code was found, e.g. `symbol:₾` or `default`.
    pub method: String,
}

impl CurrencyDetection {
    /// The fallback used when nothing in the text signals a currency.
    pub fn fallback(code: impl Into<String>, confidence: f32) -> Self {
        Self {
            code: code.into(),
            confidence,
            method: "default".to_string(),
        }
    }
}

/// Detect the statement currency from whole-page text.
///
/// Signals in priority order: explicit label, currency symbol, language
/// keyword stem, bare whitelisted ISO token. The highest-confidence candidate
/// wins; within a tier the most frequent one does.
pub fn detect_currency(text: &str) -> Option<CurrencyDetection> {
    CurrencyDetector::new()
        .extract(text)
        .map(|m| CurrencyDetection {
            code: m.value,
            confidence: m.confidence,
            method: m.source,
        })
}

/// Currency extractor producing one match per signal, tagged with its method.
pub struct CurrencyDetector;

impl CurrencyDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CurrencyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for CurrencyDetector {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let mut best: Option<(Self::Output, usize)> = None;

        for candidate in self.extract_all(text) {
            let hits = count_hits(text, &candidate);
            let better = match &best {
                None => true,
                Some((current, current_hits)) => {
                    candidate.confidence > current.confidence
                        || (candidate.confidence == current.confidence && hits > *current_hits)
                }
            };
            if better {
                best = Some((candidate, hits));
            }
        }

        best.map(|(m, _)| m)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in CURRENCY_LABEL.captures_iter(text) {
            let code = caps["code"].to_uppercase();
            if ISO_WHITELIST.contains(&code.as_str()) {
                results.push(ExtractionMatch::new(code.clone(), LABEL_CONFIDENCE, format!("label:{}", code)));
                break;
            }
        }

        for (symbol, code) in SYMBOLS {
            if text.contains(*symbol) {
                results.push(ExtractionMatch::new(
                    code.to_string(),
                    SYMBOL_CONFIDENCE,
                    format!("symbol:{}", symbol),
                ));
            }
        }

        for (stem, code, confidence, tag) in KEYWORDS.iter() {
            if stem.is_match(text) && !results.iter().any(|r| r.source == format!("keyword:{}", tag)) {
                results.push(ExtractionMatch::new(code.to_string(), *confidence, format!("keyword:{}", tag)));
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        for m in ISO_TOKEN.find_iter(text) {
            let token = m.as_str();
            if ISO_WHITELIST.contains(&token) && !seen.contains(&token) {
                seen.push(token);
                results.push(ExtractionMatch::new(token.to_string(), ISO_CONFIDENCE, format!("iso:{}", token)));
            }
        }

        results
    }
}

fn count_hits(text: &str, candidate: &ExtractionMatch<String>) -> usize {
    match candidate.source.split_once(':') {
        Some(("symbol", symbol)) => text.matches(symbol).count(),
        Some(("iso", code)) => ISO_TOKEN.find_iter(text).filter(|m| m.as_str() == code).count(),
        Some(("keyword", tag)) => KEYWORDS
            .iter()
            .filter(|(_, _, _, t)| *t == tag)
            .map(|(stem, _, _, _)| stem.find_iter(text).count())
            .sum(),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_only() {
        let found = detect_currency("Balance 1 500.00 ₾\nPurchase 20.00 ₾").unwrap();
        assert_eq!(found.code, "GEL");
        assert_eq!(found.method, "symbol:₾");
        assert!((found.confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_label_beats_symbol() {
        let found = detect_currency("Account currency: USD\nPaid 20.00 €").unwrap();
        assert_eq!(found.code, "USD");
        assert_eq!(found.method, "label:USD");
    }

    #[test]
    fn test_russian_label_and_keyword() {
        let found = detect_currency("Валюта: RUB").unwrap();
        assert_eq!(found.code, "RUB");

        let found = detect_currency("Сумма в рублях").unwrap();
        assert_eq!(found.code, "RUB");
        assert_eq!(found.method, "keyword:ruble");
    }

    #[test]
    fn test_stems_inside_words_are_ignored() {
        let found = detect_currency("Salaries paid 1500.00 USD").unwrap();
        assert_eq!(found.code, "USD");
        assert_eq!(found.method, "iso:USD");

        let found = detect_currency("Dramatic Theatre 20.00 EUR").unwrap();
        assert_eq!(found.code, "EUR");

        let found = detect_currency("Итого 500 рублей, 20 lari").unwrap();
        assert_eq!(found.method, "keyword:lari");
    }

    #[test]
    fn test_iso_token_frequency() {
        let found = detect_currency("EUR 10.00 USD 5.00 USD 7.00").unwrap();
        assert_eq!(found.code, "USD");
        assert_eq!(found.method, "iso:USD");
        assert!((found.confidence - 0.65).abs() < f32::EPSILON);
    }

    #[test]
    fn test_nothing_found() {
        assert!(detect_currency("Statement of account").is_none());
        let fallback = CurrencyDetection::fallback("GEL", 0.4);
        assert_eq!(fallback.method, "default");
    }
}
