//! Row transaction builder: one transaction per table row.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::DropCounts;
use super::columns::{ColumnRoles, infer_columns, is_header_row, is_header_text, looks_like_header};
use crate::models::{LegacyColumnLayout, RawTransaction};
use crate::normalize::amounts::explicit_direction;
use crate::normalize::patterns::{
    DATE_NUMERIC, DATE_WORDY, INLINE_AMOUNT, TIME, collapse_whitespace, is_long_numeric_id,
    is_masked, is_time,
};
use crate::normalize::{Direction, parse_amount, parse_date};
use crate::pdf::{Table, TableRow};

lazy_static! {
    static ref LEADING_TIME: Regex = Regex::new(r"^\s*\d{1,2}:\d{2}(?::\d{2})?\b").unwrap();
}

/// Operation-column values too generic to serve as a description.
const GENERIC_LABELS: &[&str] = &[
    "payment",
    "transfer",
    "operation",
    "transaction",
    "purchase",
    "card payment",
    "оплата",
    "перевод",
    "операция",
    "покупка",
    "გადარიცხვა",
    "გადახდა",
    "ოპერაცია",
    "შესყიდვა",
];

/// Builds transactions from table rows using inferred column roles.
pub struct RowBuilder<'a> {
    layout: &'a LegacyColumnLayout,
    placeholder: &'a str,
}

impl<'a> RowBuilder<'a> {
    pub fn new(layout: &'a LegacyColumnLayout, placeholder: &'a str) -> Self {
        Self { layout, placeholder }
    }

    /// Build every transaction a table yields, in row order.
    pub fn build_table(&self, table: &Table, drops: &mut DropCounts) -> Vec<RawTransaction> {
        let Some(first) = table.first() else {
            return Vec::new();
        };

        let (roles, has_header) = infer_columns(first, self.layout);
        let body = if has_header { &table[1..] } else { &table[..] };

        let mut transactions: Vec<RawTransaction> = Vec::new();
        for row in body {
            if row.iter().all(|c| cell_str(c).is_none()) {
                continue;
            }
            if is_header_row(row) {
                drops.header_like += 1;
                continue;
            }

            match self.build_row(row, &roles) {
                RowOutcome::Transaction(tx) => transactions.push(tx),
                RowOutcome::Continuation(text) => match transactions.last_mut() {
                    Some(last) => {
                        trace!("Merging continuation row into previous description: {}", text);
                        last.merge_description(&text, self.placeholder);
                    }
                    None => {
                        debug!("Dropped row without date or amount: {:?}", row);
                        drops.no_date += 1;
                    }
                },
                RowOutcome::Dropped(reason) => {
                    debug!("Dropped row ({}): {:?}", reason.as_str(), row);
                    reason.count(drops);
                }
            }
        }

        transactions
    }

    fn build_row(&self, row: &TableRow, roles: &ColumnRoles) -> RowOutcome {
        let resolved_date = resolve_date(row, roles);
        let amount = resolve_amount(row, roles)
            .or_else(|| self.inline_amount(row, roles))
            .filter(|a| !a.is_zero());

        let Some((date, date_in_description)) = resolved_date else {
            if amount.is_none() {
                if let Some(text) = continuation_text(row, roles) {
                    return RowOutcome::Continuation(text);
                }
            }
            return RowOutcome::Dropped(DropReason::NoDate);
        };

        let Some(amount) = amount else {
            let zero = resolve_amount_raw(row, roles).is_some_and(|a| a.is_zero());
            return RowOutcome::Dropped(if zero { DropReason::ZeroAmount } else { DropReason::NoAmount });
        };

        let description = self.resolve_description(row, roles, date_in_description);
        if is_header_text(&description) {
            return RowOutcome::Dropped(DropReason::HeaderLike);
        }

        trace!("Row -> {} {} {}", date, amount, description);
        RowOutcome::Transaction(RawTransaction::new(date, description, amount))
    }

    fn resolve_description(&self, row: &TableRow, roles: &ColumnRoles, date_in_description: bool) -> String {
        let raw = raw_description(row, roles, date_in_description).unwrap_or_default();
        let cleaned = collapse_whitespace(&INLINE_AMOUNT.replace_all(&raw, " "));
        if cleaned.is_empty() {
            self.placeholder.to_string()
        } else {
            cleaned
        }
    }

    fn inline_amount(&self, row: &TableRow, roles: &ColumnRoles) -> Option<Decimal> {
        let raw = raw_description(row, roles, false)?;
        let caps = INLINE_AMOUNT.captures(&raw)?;
        let value = parse_amount(&caps["num"])?;
        let direction = match &caps["sign"] {
            "+" => Direction::Credit,
            _ => Direction::Debit,
        };
        Some(direction.apply(value))
    }
}

enum RowOutcome {
    Transaction(RawTransaction),
    Continuation(String),
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy)]
enum DropReason {
    NoDate,
    NoAmount,
    ZeroAmount,
    HeaderLike,
}

impl DropReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::NoDate => "no date",
            Self::NoAmount => "no amount",
            Self::ZeroAmount => "zero amount",
            Self::HeaderLike => "header-like description",
        }
    }

    fn count(self, drops: &mut DropCounts) {
        match self {
            Self::NoDate => drops.no_date += 1,
            Self::NoAmount => drops.no_amount += 1,
            Self::ZeroAmount => drops.zero_amount += 1,
            Self::HeaderLike => drops.header_like += 1,
        }
    }
}

fn cell_str(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn cell_at(row: &TableRow, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| row.get(i)).and_then(cell_str)
}

/// A date at the very start of a value, with the byte offset where it ends.
fn leading_date(value: &str) -> Option<(NaiveDate, usize)> {
    let m = DATE_NUMERIC
        .find(value)
        .filter(|m| m.start() == 0)
        .or_else(|| DATE_WORDY.find(value).filter(|m| m.start() == 0))?;
    parse_date(m.as_str()).map(|d| (d, m.end()))
}

/// Resolve the row date; the flag is set when it came from the description column.
fn resolve_date(row: &TableRow, roles: &ColumnRoles) -> Option<(NaiveDate, bool)> {
    if let Some((date, _)) = cell_at(row, roles.description).and_then(leading_date) {
        return Some((date, true));
    }

    if let Some(date) = cell_at(row, roles.date).and_then(parse_date) {
        return Some((date, false));
    }

    row.iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != roles.description && Some(*i) != roles.date)
        .filter_map(|(_, c)| cell_str(c))
        .find_map(parse_date)
        .map(|d| (d, false))
}

fn resolve_amount_raw(row: &TableRow, roles: &ColumnRoles) -> Option<Decimal> {
    let debit = cell_at(row, roles.debit).and_then(parse_amount);
    let credit = cell_at(row, roles.credit).and_then(parse_amount);
    debit.or(credit)
}

/// Signed amount from the debit/credit columns.
///
/// The positional scan runs only when neither column parses. A parsed zero in
/// both columns resolves to zero.
fn resolve_amount(row: &TableRow, roles: &ColumnRoles) -> Option<Decimal> {
    let debit = cell_at(row, roles.debit).and_then(parse_amount);
    let credit = cell_at(row, roles.credit).and_then(parse_amount);
    if debit.is_none() && credit.is_none() {
        return positional_amount(row, roles);
    }

    // Expense precedence when both columns carry a value
    if let Some(debit) = debit.filter(|a| !a.is_zero()) {
        return Some(Direction::Debit.apply(debit));
    }
    if let Some(credit) = credit.filter(|a| !a.is_zero()) {
        return Some(Direction::Credit.apply(credit));
    }
    Some(Decimal::ZERO)
}

/// Right-to-left scan for an amount outside the known columns.
///
/// The terminal column is usually a running balance, so a non-terminal
/// candidate is preferred.
fn positional_amount(row: &TableRow, roles: &ColumnRoles) -> Option<Decimal> {
    let terminal = row.iter().rposition(|c| cell_str(c).is_some())?;

    let candidates: Vec<(usize, &str, Decimal)> = row
        .iter()
        .enumerate()
        .rev()
        .filter(|(i, _)| Some(*i) != roles.date && Some(*i) != roles.description)
        .filter_map(|(i, c)| cell_str(c).map(|s| (i, s)))
        .filter(|(_, s)| !is_time(s) && !is_masked(s) && !is_long_numeric_id(s) && parse_date(s).is_none())
        .filter_map(|(i, s)| parse_amount(s).filter(|a| !a.is_zero()).map(|a| (i, s, a)))
        .collect();

    let (_, source, amount) = candidates
        .iter()
        .find(|(i, _, _)| *i != terminal)
        .or_else(|| candidates.first())?;

    let direction = explicit_direction(source).unwrap_or(Direction::Debit);
    Some(direction.apply(*amount))
}

fn raw_description(row: &TableRow, roles: &ColumnRoles, date_in_description: bool) -> Option<String> {
    if let Some(text) = cell_at(row, roles.description) {
        if date_in_description {
            if let Some((_, end)) = leading_date(text) {
                let rest = LEADING_TIME.replace(&text[end..], "");
                return Some(rest.trim().to_string());
            }
        }
        return Some(text.to_string());
    }

    let operation = row.get(1).and_then(cell_str)?;
    let generic = GENERIC_LABELS.contains(&operation.to_lowercase().as_str());
    if generic || parse_amount(operation).is_some() || parse_date(operation).is_some() || TIME.is_match(operation) {
        return None;
    }
    Some(operation.to_string())
}

/// Text of a row that only continues the previous row's description.
fn continuation_text(row: &TableRow, roles: &ColumnRoles) -> Option<String> {
    let text_columns = [roles.description, Some(1)];
    let only_text = row
        .iter()
        .enumerate()
        .all(|(i, c)| cell_str(c).is_none() || text_columns.contains(&Some(i)));
    if !only_text {
        return None;
    }

    let text = cell_at(row, roles.description).or_else(|| row.get(1).and_then(cell_str))?;
    if looks_like_header(text) || is_masked(text) {
        return None;
    }
    Some(collapse_whitespace(text))
}
