//! Date normalization for statement cells and text lines.

use chrono::{Datelike, NaiveDate};

use super::patterns::{DATE_NUMERIC, DATE_SHORT_YEAR, DATE_WORDY};
use super::{ExtractionMatch, FieldExtractor};

/// Fixed formats tried in order against every candidate string.
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Two-digit years below this value land in the 2000s, the rest in the 1900s.
pub const DEFAULT_CENTURY_PIVOT: u32 = 70;

/// Parse a date from a raw cell or token.
///
/// Tries the fixed formats against the whole value, then against a date
/// substring embedded in a longer string, then against each whitespace token.
/// Two-digit years (`DD/MM/YY`) are resolved last with the default pivot.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_date_with_pivot(value, DEFAULT_CENTURY_PIVOT)
}

/// Same as [`parse_date`] with an explicit two-digit-year pivot.
pub fn parse_date_with_pivot(value: &str, pivot: u32) -> Option<NaiveDate> {
    let cleaned = value.trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Some(date) = parse_fixed(cleaned) {
        return Some(date);
    }

    let embedded = DATE_NUMERIC
        .find(cleaned)
        .or_else(|| DATE_WORDY.find(cleaned))
        .map(|m| m.as_str());
    if let Some(date) = embedded.and_then(parse_fixed) {
        return Some(date);
    }

    if let Some(date) = cleaned.split_whitespace().find_map(parse_fixed) {
        return Some(date);
    }

    parse_short_year(cleaned, pivot).or_else(|| embedded.and_then(|e| parse_short_year(e, pivot)))
}

fn parse_fixed(s: &str) -> Option<NaiveDate> {
    let s = s.trim().trim_end_matches([',', ';']);
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(s, fmt)
            .ok()
            // chrono accepts any digit count for %Y; statements always print four
            .filter(|d| (1000..=9999).contains(&d.year()))
    })
}

fn parse_short_year(s: &str, pivot: u32) -> Option<NaiveDate> {
    let caps = DATE_SHORT_YEAR.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let short: u32 = caps[3].parse().ok()?;
    let year = if short < pivot { 2000 + short } else { 1900 + short };
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// Date field extractor scanning free text for every parseable date.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        for m in DATE_NUMERIC.find_iter(text) {
            if let Some(date) = parse_date(m.as_str()) {
                results.push(
                    ExtractionMatch::new(date, 0.9, m.as_str()).with_position(m.start(), m.end()),
                );
            }
        }

        for m in DATE_WORDY.find_iter(text) {
            if let Some(date) = parse_fixed(m.as_str()) {
                results.push(
                    ExtractionMatch::new(date, 0.95, m.as_str()).with_position(m.start(), m.end()),
                );
            }
        }

        results.sort_by_key(|r| r.position.map(|p| p.0).unwrap_or(usize::MAX));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fixed_formats() {
        assert_eq!(parse_date("2024-03-01"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("01.03.2024"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("01/03/2024"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("01-03-2024"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("1 Mar 2024"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("1 March 2024"), Some(ymd(2024, 3, 1)));
    }

    #[test]
    fn test_embedded_and_tokens() {
        assert_eq!(parse_date("Value date: 15.04.2024"), Some(ymd(2024, 4, 15)));
        assert_eq!(parse_date("15.04.2024 14:02"), Some(ymd(2024, 4, 15)));
    }

    #[test]
    fn test_short_year_pivot() {
        assert_eq!(parse_date("01/03/24"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("01/03/69"), Some(ymd(2069, 3, 1)));
        assert_eq!(parse_date("01/03/70"), Some(ymd(1970, 3, 1)));
        assert_eq!(parse_date("31/12/99"), Some(ymd(1999, 12, 31)));
    }

    #[test]
    fn test_rejects_non_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("20.00"), None);
        assert_eq!(parse_date("1,234.56"), None);
        assert_eq!(parse_date("Coffee Shop"), None);
        assert_eq!(parse_date("31.02.2024"), None);
    }

    #[test]
    fn test_extract_all_in_order() {
        let found = DateExtractor::new().extract_all("from 01.03.2024 to 31 March 2024");
        let dates: Vec<NaiveDate> = found.into_iter().map(|m| m.value).collect();
        assert_eq!(dates, vec![ymd(2024, 3, 1), ymd(2024, 3, 31)]);
    }
}
