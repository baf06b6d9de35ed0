//! Column role inference from a table's header row.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::models::LegacyColumnLayout;
use crate::normalize::parse_date;
use crate::pdf::TableRow;

lazy_static! {
    // Header vocabulary, one pattern per family
    static ref HEADER_FAMILIES: Vec<Regex> = [
        r"\b(?:date|дата|თარიღ)",
        r"\b(?:operation|transaction|операци|ოპერაცი|ტრანზაქცი)",
        r"\b(?:turnover|оборот|ბრუნვა)",
        r"\b(?:balance|остаток|сальдо|ნაშთ)",
        r"\b(?:description|details|purpose|описание|назначение|აღწერა|დანიშნულება)",
        r"\b(?:beneficiary|recipient|получатель|ბენეფიციარ|მიმღებ)",
        r"\b(?:debit|дебет|დებეტ|расход|გასავალ)",
        r"\b(?:credit|кредит|კრედიტ|приход|შემოსავალ)",
        r"\b(?:amount|сумма|თანხა)",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
    .collect();

    static ref DATE_ROLE: Regex = Regex::new(r"(?i)\b(?:date|дата|თარიღ)").unwrap();

    static ref DEBIT_ROLE: Regex = Regex::new(
        r"(?i)\b(?:debit|дебет|დებეტ|расход|გასავალ|out\b|withdrawals?\b)|\(dr\)|\(დებ\)"
    ).unwrap();

    static ref CREDIT_ROLE: Regex = Regex::new(
        r"(?i)\b(?:credit|кредит|კრედიტ|приход|შემოსავალ|in\b|deposits?\b)|\(cr\)|\(კრ\)"
    ).unwrap();

    static ref DESCRIPTION_ROLE: Regex = Regex::new(
        r"(?i)\b(?:description|details|purpose|описание|назначение|აღწერა|დანიშნულება)"
    ).unwrap();

    // Operation columns describe a row only when no description column exists
    static ref OPERATION_ROLE: Regex = Regex::new(
        r"(?i)\b(?:operation|операци|ოპერაცი)"
    ).unwrap();
}

/// Words allowed between header terms.
const HEADER_CONNECTORS: &[&str] = &["of", "and", "the", "in", "out", "no", "by", "per", "и", "по", "на", "და"];

/// Semantic column positions for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnRoles {
    pub date: Option<usize>,
    pub debit: Option<usize>,
    pub credit: Option<usize>,
    pub description: Option<usize>,
}

impl ColumnRoles {
    /// The legacy layout fallback positions.
    pub fn from_layout(layout: &LegacyColumnLayout) -> Self {
        Self {
            date: Some(layout.date),
            debit: Some(layout.debit),
            credit: Some(layout.credit),
            description: Some(layout.description),
        }
    }

    fn claimed(&self, idx: usize) -> bool {
        [self.date, self.debit, self.credit, self.description].contains(&Some(idx))
    }
}

/// Check whether text reads like table header vocabulary.
///
/// True when at least two vocabulary families match, or when the text is a
/// single header word on its own.
pub fn looks_like_header(text: &str) -> bool {
    let families = HEADER_FAMILIES.iter().filter(|re| re.is_match(text)).count();
    match families {
        0 => false,
        1 => text.split_whitespace().count() == 1,
        _ => true,
    }
}

/// Check whether text consists of header vocabulary only.
///
/// Every word must be a header term or a connector.
pub fn is_header_text(text: &str) -> bool {
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    !words.is_empty()
        && words.iter().all(|word| {
            HEADER_CONNECTORS.contains(&word.to_lowercase().as_str())
                || HEADER_FAMILIES.iter().any(|re| re.is_match(word))
        })
}

fn row_text(row: &TableRow) -> String {
    row.iter()
        .flatten()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A genuine header matches header vocabulary and carries no parseable date.
pub fn is_header_row(row: &TableRow) -> bool {
    let text = row_text(row);
    !text.is_empty() && looks_like_header(&text) && parse_date(&text).is_none()
}

/// Infer column roles from a table's first row.
///
/// Returns the roles and whether the row was a genuine header. Each header
/// cell takes at most one role; the first cell matching a role wins it. An
/// operation column is the description only when no description column is
/// found. Unresolved roles fall back to the layout positions when those are free.
pub fn infer_columns(first_row: &TableRow, layout: &LegacyColumnLayout) -> (ColumnRoles, bool) {
    if !is_header_row(first_row) {
        return (ColumnRoles::from_layout(layout), false);
    }

    let mut roles = ColumnRoles {
        date: None,
        debit: None,
        credit: None,
        description: None,
    };
    let mut operation = None;

    for (idx, cell) in first_row.iter().enumerate() {
        let Some(cell) = cell.as_deref() else { continue };
        if roles.date.is_none() && DATE_ROLE.is_match(cell) {
            roles.date = Some(idx);
        } else if roles.debit.is_none() && DEBIT_ROLE.is_match(cell) {
            roles.debit = Some(idx);
        } else if roles.credit.is_none() && CREDIT_ROLE.is_match(cell) {
            roles.credit = Some(idx);
        } else if roles.description.is_none() && DESCRIPTION_ROLE.is_match(cell) {
            roles.description = Some(idx);
        } else if operation.is_none() && OPERATION_ROLE.is_match(cell) {
            operation = Some(idx);
        }
    }
    if roles.description.is_none() {
        roles.description = operation;
    }

    fill_defaults(&mut roles, &ColumnRoles::from_layout(layout), first_row);

    trace!("Inferred column roles {:?} from header", roles);
    (roles, true)
}

// A default position is used only when no other role holds it and its header
// cell is not some other recognized column (amount, balance, ...).
fn fill_defaults(roles: &mut ColumnRoles, fallback: &ColumnRoles, header: &TableRow) {
    let available = |roles: &ColumnRoles, idx: Option<usize>| -> Option<usize> {
        let idx = idx?;
        if roles.claimed(idx) {
            return None;
        }
        let recognized = header
            .get(idx)
            .and_then(|c| c.as_deref())
            .is_some_and(|c| HEADER_FAMILIES.iter().any(|re| re.is_match(c)));
        (!recognized).then_some(idx)
    };

    if roles.date.is_none() {
        roles.date = available(&*roles, fallback.date);
    }
    if roles.debit.is_none() {
        roles.debit = available(&*roles, fallback.debit);
    }
    if roles.credit.is_none() {
        roles.credit = available(&*roles, fallback.credit);
    }
    if roles.description.is_none() {
        roles.description = available(&*roles, fallback.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> TableRow {
        cells
            .iter()
            .map(|c| (!c.is_empty()).then(|| c.to_string()))
            .collect()
    }

    #[test]
    fn test_header_vocabulary() {
        assert!(looks_like_header("Date Debit Credit Description"));
        assert!(looks_like_header("Description"));
        assert!(looks_like_header("თარიღი ბრუნვა (დებ) დანიშნულება"));
        assert!(looks_like_header("Дата операции Сумма"));
        assert!(!looks_like_header("Payment to Landlord"));
        assert!(!looks_like_header("Coffee Shop"));
    }

    #[test]
    fn test_header_text_needs_only_vocabulary() {
        assert!(is_header_text("Description"));
        assert!(is_header_text("Date of operation"));
        assert!(is_header_text("Debit / Credit turnover"));
        assert!(is_header_text("თარიღი და თანხა"));
        assert!(!is_header_text("Debit card transaction Wolt"));
        assert!(!is_header_text("POS transaction, amount 5.00, Bolt"));
        assert!(!is_header_text(""));
    }

    #[test]
    fn test_dated_row_is_not_header() {
        assert!(is_header_row(&row(&["Date", "Amount", "Balance"])));
        assert!(!is_header_row(&row(&["01.03.2024", "Balance transfer", "Date change"])));
    }

    #[test]
    fn test_infer_from_header() {
        let layout = LegacyColumnLayout::default();
        let (roles, header) = infer_columns(&row(&["Date", "Debit", "Credit", "Description"]), &layout);
        assert!(header);
        assert_eq!(roles.date, Some(0));
        assert_eq!(roles.debit, Some(1));
        assert_eq!(roles.credit, Some(2));
        assert_eq!(roles.description, Some(3));
    }

    #[test]
    fn test_in_out_whole_words() {
        let layout = LegacyColumnLayout::default();
        let (roles, _) = infer_columns(
            &row(&["Transaction date", "Details", "In", "Out", "Balance"]),
            &layout,
        );
        assert_eq!(roles.date, Some(0));
        assert_eq!(roles.description, Some(1));
        assert_eq!(roles.credit, Some(2));
        assert_eq!(roles.debit, Some(3));
    }

    #[test]
    fn test_description_column_outranks_operation() {
        let layout = LegacyColumnLayout::default();
        let (roles, _) = infer_columns(
            &row(&["Date", "Operation", "Debit", "Credit", "Balance", "Description"]),
            &layout,
        );
        assert_eq!(roles.description, Some(5));
        assert_eq!(roles.debit, Some(2));
        assert_eq!(roles.credit, Some(3));

        let (roles, _) = infer_columns(&row(&["Date", "Operation", "Amount"]), &layout);
        assert_eq!(roles.description, Some(1));
    }

    #[test]
    fn test_unresolved_roles_use_unclaimed_defaults() {
        let layout = LegacyColumnLayout::default();
        let (roles, _) = infer_columns(&row(&["Date", "Amount", "Description"]), &layout);
        assert_eq!(roles.date, Some(0));
        assert_eq!(roles.description, Some(2));
        // position 2 is taken by the description column
        assert_eq!(roles.debit, None);
        assert_eq!(roles.credit, Some(3));
    }

    #[test]
    fn test_defaults_skip_recognized_columns() {
        let layout = LegacyColumnLayout::default();
        let (roles, _) = infer_columns(&row(&["Date", "Details", "Amount", "Balance"]), &layout);
        assert_eq!(roles.debit, None);
        assert_eq!(roles.credit, None);
    }

    #[test]
    fn test_no_header_uses_layout() {
        let layout = LegacyColumnLayout::default();
        let (roles, header) = infer_columns(&row(&["01.03.2024", "Payment", "20.00"]), &layout);
        assert!(!header);
        assert_eq!(roles, ColumnRoles::from_layout(&layout));
    }
}
