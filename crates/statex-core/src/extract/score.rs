//! Candidate set scoring and reconciliation.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::columns::is_header_text;
use crate::models::RawTransaction;

/// Which candidate set a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Table,
    Text,
}

/// Badness of a candidate set; lower is better.
///
/// `median(|amount|) * (1 + header_fraction + zero_fraction)`, where the
/// fractions count header-looking descriptions and zero amounts. An empty
/// set scores infinity.
pub fn badness(transactions: &[RawTransaction]) -> f64 {
    if transactions.is_empty() {
        return f64::INFINITY;
    }

    let mut magnitudes: Vec<Decimal> = transactions.iter().map(|t| t.amount.abs()).collect();
    magnitudes.sort();
    let mid = magnitudes.len() / 2;
    let median = if magnitudes.len() % 2 == 0 {
        (magnitudes[mid - 1] + magnitudes[mid]) / Decimal::TWO
    } else {
        magnitudes[mid]
    };

    let n = transactions.len() as f64;
    let headers = transactions
        .iter()
        .filter(|t| is_header_text(&t.description))
        .count() as f64;
    let zeros = transactions.iter().filter(|t| t.amount.is_zero()).count() as f64;

    median.to_f64().unwrap_or(f64::INFINITY) * (1.0 + headers / n + zeros / n)
}

/// Pick the final transaction list.
///
/// The text set replaces the table set only when the table set is empty or
/// the text set scores strictly better.
pub fn reconcile(
    table: Vec<RawTransaction>,
    text: Vec<RawTransaction>,
) -> (CandidateSource, Vec<RawTransaction>, f64, f64) {
    let table_score = badness(&table);
    let text_score = badness(&text);

    if table.is_empty() || text_score < table_score {
        (CandidateSource::Text, text, table_score, text_score)
    } else {
        (CandidateSource::Table, table, table_score, text_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn tx(description: &str, amount: &str) -> RawTransaction {
        RawTransaction::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            description,
            Decimal::from_str(amount).unwrap(),
        )
    }

    #[test]
    fn test_badness() {
        assert!(badness(&[]).is_infinite());
        assert_eq!(badness(&[tx("a", "-10"), tx("b", "30"), tx("c", "-20")]), 20.0);
        assert_eq!(badness(&[tx("a", "-10"), tx("b", "30")]), 20.0);
        // one of two descriptions is a header word
        assert_eq!(badness(&[tx("Balance", "-10"), tx("b", "-10")]), 15.0);
        assert_eq!(badness(&[tx("Debit card transaction Wolt", "-10"), tx("b", "-10")]), 10.0);
    }

    #[test]
    fn test_table_wins_ties() {
        let table = vec![tx("Coffee", "-20")];
        let text = vec![tx("Coffee", "-20")];
        let (source, chosen, _, _) = reconcile(table.clone(), text);
        assert_eq!(source, CandidateSource::Table);
        assert_eq!(chosen, table);
    }

    #[test]
    fn test_text_wins_when_cleaner_or_table_empty() {
        let table = vec![tx("Coffee", "-20"), tx("Balance", "-1500")];
        let text = vec![tx("Coffee", "-20")];
        let (source, _, table_score, text_score) = reconcile(table, text.clone());
        assert_eq!(source, CandidateSource::Text);
        assert!(text_score < table_score);

        let (source, chosen, _, _) = reconcile(Vec::new(), text.clone());
        assert_eq!(source, CandidateSource::Text);
        assert_eq!(chosen, text);

        let (source, chosen, _, _) = reconcile(Vec::new(), Vec::new());
        assert_eq!(source, CandidateSource::Text);
        assert!(chosen.is_empty());
    }
}
