//! Amount normalization for mixed decimal/thousands conventions.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::patterns::DECIMAL_NUMBER;
use super::{ExtractionMatch, FieldExtractor};

lazy_static! {
    static ref CURRENCY_WORDS: Regex = Regex::new(
        r"(?i)\b(?:gel|usd|eur|gbp|rub|kzt|amd|azn|try|uah|jpy|cny|inr|chf|pln|lari|ლარი|ლ|руб(?:лей|ля|ль)?|тг|тенге|dram|драм)\b\.?"
    ).unwrap();

    static ref CURRENCY_SYMBOLS: Regex = Regex::new(r"\p{Sc}").unwrap();
}

/// Direction of money movement relative to the account holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Money leaving the account (expense), stored negative.
    Debit,
    /// Money entering the account, stored positive.
    Credit,
}

impl Direction {
    /// Apply this direction to an absolute amount.
    pub fn apply(self, amount: Decimal) -> Decimal {
        match self {
            Self::Debit => -amount.abs(),
            Self::Credit => amount.abs(),
        }
    }
}

fn normalize_marks(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '\u{00a0}' | '\u{202f}' | '\u{2007}' | '\u{2009}' => ' ',
            '\u{2212}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{fe63}' | '\u{ff0d}' => '-',
            '·' => '.',
            other => other,
        })
        .collect()
}

/// Parse a monetary amount from a cell or text fragment.
///
/// Handles parenthesized negatives, leading/trailing signs, currency codes and
/// symbols, and both `1,234.56` and `1.234,56` conventions. The right-most
/// separator is the decimal mark when both appear; a lone comma is decimal.
/// The value is returned unrounded.
pub fn parse_amount(value: &str) -> Option<Decimal> {
    let marked = normalize_marks(value.trim());
    if marked.is_empty() {
        return None;
    }

    let stripped = CURRENCY_WORDS.replace_all(&marked, "");
    let stripped = CURRENCY_SYMBOLS.replace_all(&stripped, "");
    let mut s: String = stripped
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'')
        .collect();

    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') && s.len() > 2 {
        negative = true;
        s = s[1..s.len() - 1].to_string();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.to_string();
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.to_string();
    } else if let Some(rest) = s.strip_suffix('-') {
        negative = !negative;
        s = rest.to_string();
    }

    if s.is_empty()
        || !s.chars().any(|c| c.is_ascii_digit())
        || !s.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        return None;
    }

    let normalized = normalize_separators(&s);
    let amount = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -amount } else { amount })
}

fn normalize_separators(s: &str) -> String {
    let commas = s.matches(',').count();
    let dots = s.matches('.').count();

    match (commas, dots) {
        (0, 0) | (0, 1) => s.to_string(),
        (_, 0) if commas == 1 => s.replace(',', "."),
        (_, 0) => s.replace(',', ""),
        (0, _) => {
            // 1.234.567 -> 1234.567: only the last dot survives
            let last = s.rfind('.').unwrap_or(s.len());
            let (head, tail) = s.split_at(last);
            format!("{}{}", head.replace('.', ""), tail)
        }
        _ => {
            let comma_pos = s.rfind(',');
            let dot_pos = s.rfind('.');
            match (comma_pos, dot_pos) {
                (Some(c), Some(d)) if c > d => s.replace('.', "").replace(',', "."),
                _ => s.replace(',', ""),
            }
        }
    }
}

/// Read the direction a value's own formatting implies, if any.
///
/// Parentheses or a leading/trailing minus mean debit; a leading plus means credit.
pub fn explicit_direction(value: &str) -> Option<Direction> {
    let marked = normalize_marks(value.trim());
    let s = marked.trim();
    if (s.starts_with('(') && s.ends_with(')')) || s.starts_with('-') || s.ends_with('-') {
        Some(Direction::Debit)
    } else if s.starts_with('+') {
        Some(Direction::Credit)
    } else {
        None
    }
}

/// Round to two decimal places; used only when emitting output.
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Extractor for numbers with a two-digit decimal part in free text.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in DECIMAL_NUMBER.captures_iter(text) {
            let Some(full) = caps.get(0) else { continue };
            let parenthesized = !caps["open"].is_empty() && !caps["close"].is_empty();
            let Some(value) = parse_amount(&caps["num"]) else { continue };

            let value = if parenthesized || matches!(&caps["sign"], "-" | "\u{2212}") {
                -value
            } else {
                value
            };

            results.push(
                ExtractionMatch::new(value, 0.8, full.as_str()).with_position(full.start(), full.end()),
            );
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_conventions() {
        assert_eq!(parse_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1 234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1\u{00a0}234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("12,345,678.90"), Some(dec("12345678.90")));
        assert_eq!(parse_amount("20,50"), Some(dec("20.50")));
        assert_eq!(parse_amount("1.234.567"), Some(dec("1234.567")));
    }

    #[test]
    fn test_parse_signs_and_currency() {
        assert_eq!(parse_amount("(20.00)"), Some(dec("-20.00")));
        assert_eq!(parse_amount("+15.00 GEL"), Some(dec("15.00")));
        assert_eq!(parse_amount("\u{2212}7.10"), Some(dec("-7.10")));
        assert_eq!(parse_amount("-3,54 ₾"), Some(dec("-3.54")));
        assert_eq!(parse_amount("$ 99.99"), Some(dec("99.99")));
        assert_eq!(parse_amount("125.00 руб."), Some(dec("125.00")));
        assert_eq!(parse_amount("20.00-"), Some(dec("-20.00")));
    }

    #[test]
    fn test_parse_rejects_non_amounts() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("Coffee Shop"), None);
        assert_eq!(parse_amount("2024-03-01"), None);
        assert_eq!(parse_amount("14:02"), None);
        assert_eq!(parse_amount("****1234"), None);
        assert_eq!(parse_amount("GEL"), None);
    }

    #[test]
    fn test_unrounded_until_output() {
        let raw = parse_amount("10.005").unwrap();
        assert_eq!(raw, dec("10.005"));
        assert_eq!(round_to_cents(raw), dec("10.01"));
    }

    #[test]
    fn test_explicit_direction() {
        assert_eq!(explicit_direction("(20.00)"), Some(Direction::Debit));
        assert_eq!(explicit_direction("-5.00"), Some(Direction::Debit));
        assert_eq!(explicit_direction("+5.00"), Some(Direction::Credit));
        assert_eq!(explicit_direction("5.00"), None);
        assert_eq!(Direction::Debit.apply(dec("5")), dec("-5"));
        assert_eq!(Direction::Credit.apply(dec("-5")), dec("5"));
    }

    #[test]
    fn test_extract_all_signed() {
        let found = AmountExtractor::new().extract_all("fee (2.50) refund +10.00 paid -1,000.00");
        let values: Vec<Decimal> = found.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![dec("-2.50"), dec("10.00"), dec("-1000.00")]);
        assert_eq!(explicit_direction(&found[1].source), Some(Direction::Credit));
    }
}
