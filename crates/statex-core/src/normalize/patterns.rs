//! Common regex patterns for bank statement extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Date substrings embedded in longer values
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{4}-\d{1,2}-\d{1,2}|\d{1,2}[./\-]\d{1,2}[./\-](?:\d{4}|\d{2}))\b"
    ).unwrap();

    pub static ref DATE_WORDY: Regex = Regex::new(
        r"\b(\d{1,2}\s+[A-Za-z]{3,9}\.?\s+\d{4})\b"
    ).unwrap();

    pub static ref DATE_SHORT_YEAR: Regex = Regex::new(
        r"^(\d{1,2})[./\-](\d{1,2})[./\-](\d{2})$"
    ).unwrap();

    // Loose date-like tokens used only for diagnostics
    pub static ref DATE_LIKE: Regex = Regex::new(
        r"\d{1,2}[./\-]\d{1,2}[./\-]\d{2,4}"
    ).unwrap();

    pub static ref TIME: Regex = Regex::new(
        r"^\d{1,2}:\d{2}(?::\d{2})?$"
    ).unwrap();

    // A text line that opens a transaction: <date> [<time>] <rest>
    pub static ref DATED_LINE: Regex = Regex::new(
        r"^\s*(?P<date>\d{4}-\d{1,2}-\d{1,2}|\d{1,2}[./\-]\d{1,2}[./\-](?:\d{4}|\d{2})|\d{1,2}\s+[A-Za-z]{3,9}\.?\s+\d{4})(?:\s+(?P<time>\d{1,2}:\d{2}(?::\d{2})?))?\s+(?P<rest>\S.*)$"
    ).unwrap();

    // Numbers carrying a two-digit decimal part, optionally signed or parenthesized
    pub static ref DECIMAL_NUMBER: Regex = Regex::new(
        r"(?P<sign>[+\-\u{2212}]?)(?P<open>\(?)\b(?P<num>(?:\d{1,3}(?:[,.'\u{00a0} ]\d{3})+|\d+)[.,]\d{2})\b(?P<close>\)?)"
    ).unwrap();

    // A whole line that is nothing but an amount (optionally with a currency)
    pub static ref PURE_AMOUNT: Regex = Regex::new(
        r"(?i)^\s*[+\-\u{2212}]?\(?\s*[\d\s.,'\u{00a0}]*\d[.,]\d{2}\s*\)?\s*(?:[A-Z]{3}|[₾₽$€£¥₹₺])?\s*$"
    ).unwrap();

    // Inline "<number> <currency>" fragments inside descriptions
    pub static ref INLINE_AMOUNT: Regex = Regex::new(
        r"(?i)(?P<sign>[+\-\u{2212}]?)\b(?P<num>\d[\d\u{00a0}.,']*\d|\d)\s*(?P<code>GEL|USD|EUR|GBP|RUB|KZT|AMD|AZN|TRY|UAH|JPY|CNY|INR|CHF|PLN|₾|₽|\$|€|£|¥|₹|₺)(?:\b|$|\s)"
    ).unwrap();

    // Redacted account numbers such as "****1234" or "GE29***1234"
    pub static ref MASKED_VALUE: Regex = Regex::new(
        r"\*{2,}\s*\d{2,6}\b"
    ).unwrap();

    // Long bare digit runs (references, account ids)
    pub static ref LONG_NUMERIC_ID: Regex = Regex::new(
        r"^\d{8,}$"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    // Explicit currency labels: "Currency: USD", "Валюта: RUB", "ვალუტა: GEL"
    pub static ref CURRENCY_LABEL: Regex = Regex::new(
        r"(?i)(?:currency|валюта|ვალუტა)\s*[:：]\s*(?P<code>[A-Za-z]{3})\b"
    ).unwrap();

    pub static ref ISO_TOKEN: Regex = Regex::new(r"\b[A-Z]{3}\b").unwrap();
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Check whether a value is a redacted account number.
pub fn is_masked(s: &str) -> bool {
    MASKED_VALUE.is_match(s)
}

/// Check whether a value is a long bare numeric identifier.
pub fn is_long_numeric_id(s: &str) -> bool {
    LONG_NUMERIC_ID.is_match(s.trim())
}

/// Check whether a value is a time of day.
pub fn is_time(s: &str) -> bool {
    TIME.is_match(s.trim())
}
