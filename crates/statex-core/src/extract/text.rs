//! Text-fallback line parser for statements without usable tables.
//!
//! A line of the form `<date> [<time>] <rest>` opens a transaction; following
//! lines that carry no date are folded into it as detail text.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::DropCounts;
use super::columns::looks_like_header;
use crate::models::RawTransaction;
use crate::normalize::amounts::explicit_direction;
use crate::normalize::patterns::{
    DATE_NUMERIC, DATE_WORDY, DATED_LINE, DECIMAL_NUMBER, INLINE_AMOUNT, MASKED_VALUE, PURE_AMOUNT,
    collapse_whitespace, is_masked,
};
use crate::normalize::{AmountExtractor, Direction, FieldExtractor, parse_amount, parse_date};

lazy_static! {
    static ref DEBIT_VOCABULARY: Regex = Regex::new(
        r"(?i)\b(?:transfer\s+to|payment|withdrawal|purchase|fee|commission|оплата|списание|снятие|перевод\s+на|გადახდა|გატანა|საკომისიო)"
    ).unwrap();

    static ref CREDIT_VOCABULARY: Regex = Regex::new(
        r"(?i)\b(?:transfer\s+from|salary|deposit|credited|refund|cashback|зачисление|поступление|зарплата|ხელფასი|ჩარიცხვა)"
    ).unwrap();

    static ref INLINE_TIME: Regex = Regex::new(r"\b\d{1,2}:\d{2}(?::\d{2})?\b").unwrap();
}

/// Fields of a transaction opened by a dated line.
#[derive(Debug, Clone)]
pub struct TextDraft {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Option<Decimal>,
    /// Direction written on the amount itself (`+` / `-` / parentheses).
    pub explicit: Option<Direction>,
}

/// Transaction being accumulated until the next dated line.
#[derive(Debug, Clone)]
pub struct PendingTextTransaction {
    pub record: TextDraft,
    /// Fragments removed from the opening line (time, running balance, masked refs).
    pub meta_parts: Vec<String>,
    /// Continuation lines.
    pub detail_parts: Vec<String>,
}

impl PendingTextTransaction {
    /// Open a pending transaction from a dated line, if it is one.
    pub fn open(line: &str) -> Option<Self> {
        let caps = DATED_LINE.captures(line)?;
        let date = parse_date(&caps["date"])?;
        let mut meta_parts = Vec::new();
        if let Some(time) = caps.name("time") {
            meta_parts.push(time.as_str().to_string());
        }

        let rest = caps["rest"].to_string();
        // value dates and times inside the line would otherwise read as numbers
        let scrubbed = DATE_NUMERIC.replace_all(&rest, " ");
        let scrubbed = DATE_WORDY.replace_all(&scrubbed, " ");
        let scrubbed = INLINE_TIME.replace_all(&scrubbed, " ");
        let scrubbed = MASKED_VALUE.replace_all(&scrubbed, " ");

        let numbers = AmountExtractor::new().extract_all(&scrubbed);
        let chosen = match numbers.len() {
            0 => None,
            1 => numbers.first(),
            n => numbers.get(n - 2),
        };

        for m in &numbers {
            if chosen.is_some_and(|c| c.position == m.position) {
                continue;
            }
            meta_parts.push(m.source.clone());
        }
        for m in MASKED_VALUE.find_iter(&rest) {
            meta_parts.push(m.as_str().to_string());
        }

        let description = INLINE_AMOUNT.replace_all(&scrubbed, " ");
        let description = DECIMAL_NUMBER.replace_all(&description, " ");
        let description = strip_dangling_codes(&collapse_whitespace(&description));

        Some(Self {
            record: TextDraft {
                date,
                description,
                amount: chosen.map(|m| m.value),
                explicit: chosen.and_then(|m| explicit_direction(&m.source)),
            },
            meta_parts,
            detail_parts: Vec::new(),
        })
    }

    /// Consume a non-dated line following the opening line.
    pub fn absorb(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || looks_like_header(line) || is_masked(line) {
            return;
        }

        if PURE_AMOUNT.is_match(line) {
            if self.record.amount.is_none() {
                self.record.amount = parse_amount(line);
                self.record.explicit = explicit_direction(line);
            }
            return;
        }

        self.detail_parts.push(collapse_whitespace(line));
    }

    fn full_description(&self) -> String {
        let mut parts = Vec::with_capacity(1 + self.detail_parts.len());
        if !self.record.description.is_empty() {
            parts.push(self.record.description.as_str());
        }
        parts.extend(self.detail_parts.iter().map(String::as_str));
        parts.join(" ")
    }

    fn direction(&self, description: &str, amount: Decimal) -> Direction {
        match self.record.explicit {
            Some(Direction::Credit) => return Direction::Credit,
            Some(Direction::Debit) => return Direction::Debit,
            None => {}
        }
        if amount.is_sign_negative() || DEBIT_VOCABULARY.is_match(description) {
            Direction::Debit
        } else if CREDIT_VOCABULARY.is_match(description) {
            Direction::Credit
        } else {
            Direction::Debit
        }
    }

    /// Close the record; `None` when it has no usable amount.
    pub fn finish(self, placeholder: &str, drops: &mut DropCounts) -> Option<RawTransaction> {
        let Some(amount) = self.record.amount else {
            debug!("Dropped text record without amount: {}", self.record.description);
            drops.no_amount += 1;
            return None;
        };
        if amount.is_zero() {
            drops.zero_amount += 1;
            return None;
        }

        let mut description = self.full_description();
        if description.is_empty() {
            description = placeholder.to_string();
        }
        let direction = self.direction(&description, amount);

        trace!(
            "Text record {} {:?} {} (meta {:?})",
            self.record.date, direction, amount, self.meta_parts
        );
        Some(RawTransaction::new(self.record.date, description, direction.apply(amount)))
    }
}

fn strip_dangling_codes(description: &str) -> String {
    let trimmed = description
        .trim_end_matches(|c: char| matches!(c, '₾' | '₽' | '$' | '€' | '£' | '¥' | '₹' | '₺') || c.is_whitespace());
    trimmed.to_string()
}

/// Parse every page's text into transactions, in reading order.
///
/// A pending record stays open across page breaks and is flushed by the next
/// dated line or the end of the document.
pub fn parse_text_lines<'a, I>(pages: I, placeholder: &str) -> (Vec<RawTransaction>, DropCounts)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut transactions = Vec::new();
    let mut drops = DropCounts::default();
    let mut pending: Option<PendingTextTransaction> = None;

    for text in pages {
        for line in text.lines() {
            if let Some(opened) = PendingTextTransaction::open(line) {
                if let Some(done) = pending.take() {
                    transactions.extend(done.finish(placeholder, &mut drops));
                }
                pending = Some(opened);
            } else if let Some(current) = pending.as_mut() {
                current.absorb(line);
            }
        }
    }

    if let Some(done) = pending.take() {
        transactions.extend(done.finish(placeholder, &mut drops));
    }

    debug!(
        "Text fallback produced {} transactions ({} dropped)",
        transactions.len(),
        drops.total()
    );
    (transactions, drops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn parse(text: &str) -> Vec<RawTransaction> {
        parse_text_lines([text], "Imported transaction").0
    }

    #[test]
    fn test_transfer_with_balance() {
        let txs = parse("15.04.2024 14:02 Transfer to Landlord 500.00 1500.00");
        assert_eq!(
            txs,
            vec![RawTransaction::new(
                NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
                "Transfer to Landlord",
                dec("-500.00")
            )]
        );
    }

    #[test]
    fn test_sign_rules() {
        let txs = parse(
            "01.03.2024 Salary March 2,000.00 3,500.00\n\
             02.03.2024 Refund +12.00\n\
             03.03.2024 Something -4.00\n\
             04.03.2024 Zoommer 59.99",
        );
        let amounts: Vec<Decimal> = txs.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![dec("2000.00"), dec("12.00"), dec("-4.00"), dec("-59.99")]);
    }

    #[test]
    fn test_continuation_lines() {
        let txs = parse(
            "05.03.2024 Card purchase 20.00 980.00\n\
             Wolt Tbilisi\n\
             ****1234\n\
             Date Description Amount\n\
             \n\
             06.03.2024 Transfer from Nino\n\
             150.00 GEL\n\
             Bank of Georgia",
        );
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].description, "Card purchase Wolt Tbilisi");
        assert_eq!(txs[0].amount, dec("-20.00"));
        assert_eq!(txs[1].description, "Transfer from Nino Bank of Georgia");
        assert_eq!(txs[1].amount, dec("150.00"));
    }

    #[test]
    fn test_records_without_amount_are_dropped() {
        let (txs, drops) = parse_text_lines(
            ["10.03.2024 Opening note", "11.03.2024 Fee 0.00\n12.03.2024 Fee 1.50"],
            "Imported transaction",
        );
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].amount, dec("-1.50"));
        assert_eq!(drops.no_amount, 1);
        assert_eq!(drops.zero_amount, 1);
    }

    #[test]
    fn test_space_grouped_thousands() {
        let txs = parse("15.04.2024 Transfer to Landlord 1 500.00 2 000.00\n16.04.2024 Зарплата 12 000,00 14 000,00");
        assert_eq!(txs[0].description, "Transfer to Landlord");
        assert_eq!(txs[0].amount, dec("-1500.00"));
        assert_eq!(txs[1].amount, dec("12000.00"));
    }

    #[test]
    fn test_value_date_not_read_as_amount() {
        let txs = parse("01.03.2024 Netflix 16.03.2024 25.00");
        assert_eq!(txs[0].amount, dec("-25.00"));
        assert_eq!(txs[0].description, "Netflix");
    }
}
