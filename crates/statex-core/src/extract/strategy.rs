//! Table extraction strategist: ordered geometry profiles per page.

use tracing::{debug, info, warn};

use super::DropCounts;
use super::rows::RowBuilder;
use crate::models::RawTransaction;
use crate::normalize::patterns::DATE_LIKE;
use crate::normalize::{DateExtractor, FieldExtractor};
use crate::pdf::{StatementPage, Table, TableProfile};

/// Outcome of table extraction on one page.
#[derive(Debug, Clone, Default)]
pub struct PageTables {
    pub transactions: Vec<RawTransaction>,
    /// Name of the accepted profile.
    pub profile: Option<String>,
    /// No profile found any table at all.
    pub table_less: bool,
    pub drops: DropCounts,
}

/// Try each profile in order and keep the first one that yields rows.
///
/// A profile is accepted when its non-empty tables build at least one
/// transaction. Profiles that fail are skipped.
pub fn extract_page_tables<P: StatementPage>(
    page: &P,
    page_number: usize,
    profiles: &[TableProfile],
    builder: &RowBuilder<'_>,
) -> PageTables {
    let mut saw_table = false;

    for profile in profiles {
        let tables = match page.extract_tables(&profile.settings) {
            Ok(tables) => tables,
            Err(e) => {
                debug!("Page {}: profile '{}' failed: {}", page_number, profile.name, e);
                continue;
            }
        };

        let tables: Vec<&Table> = tables.iter().filter(|t| !is_empty_table(t)).collect();
        if tables.is_empty() {
            debug!("Page {}: profile '{}' found no tables", page_number, profile.name);
            continue;
        }
        saw_table = true;

        let mut drops = DropCounts::default();
        let transactions: Vec<RawTransaction> = tables
            .iter()
            .flat_map(|t| builder.build_table(t, &mut drops))
            .collect();

        debug!(
            "Page {}: profile '{}' -> {} tables, {} transactions, {} dropped rows",
            page_number,
            profile.name,
            tables.len(),
            transactions.len(),
            drops.total()
        );

        if !transactions.is_empty() {
            info!(
                "Page {}: using profile '{}' ({} transactions)",
                page_number,
                profile.name,
                transactions.len()
            );
            return PageTables {
                transactions,
                profile: Some(profile.name.clone()),
                table_less: false,
                drops,
            };
        }
    }

    if !saw_table {
        log_table_less(page, page_number);
    }

    PageTables {
        table_less: !saw_table,
        ..PageTables::default()
    }
}

fn is_empty_table(table: &Table) -> bool {
    table
        .iter()
        .all(|row| row.iter().flatten().all(|c| c.trim().is_empty()))
}

fn log_table_less<P: StatementPage>(page: &P, page_number: usize) {
    let Some(text) = page.extract_text() else {
        warn!("Page {}: no tables and no text", page_number);
        return;
    };

    let dates = DateExtractor::new().extract_all(&text);
    let date_like = DATE_LIKE.find_iter(&text).count();
    let sample: Vec<&str> = dates.iter().take(5).map(|m| m.source.as_str()).collect();
    warn!(
        "Page {}: no tables detected; {} date-like tokens, {} parseable dates (sample: {:?})",
        page_number,
        date_like,
        dates.len(),
        sample
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;
    use crate::models::LegacyColumnLayout;
    use crate::pdf::{TableSettings, TableStrategy, default_profiles};

    struct ScriptedPage {
        strict: Vec<Table>,
        text_tables: Vec<Table>,
    }

    impl StatementPage for ScriptedPage {
        fn extract_text(&self) -> Option<String> {
            Some("Statement 01.03.2024".to_string())
        }

        fn extract_tables(&self, settings: &TableSettings) -> crate::pdf::Result<Vec<Table>> {
            match (settings.vertical_strategy, settings.snap_tolerance) {
                (TableStrategy::Lines, 3) => Ok(self.strict.clone()),
                (TableStrategy::Lines, _) => Err(PdfError::TableDetection("boom".to_string())),
                (TableStrategy::Text, _) => Ok(self.text_tables.clone()),
                (TableStrategy::LinesStrict, _) => Ok(Vec::new()),
            }
        }
    }

    fn table(rows: &[&[&str]]) -> Table {
        rows.iter()
            .map(|r| r.iter().map(|c| (!c.is_empty()).then(|| c.to_string())).collect())
            .collect()
    }

    #[test]
    fn test_first_productive_profile_wins() {
        let page = ScriptedPage {
            // header only: a table, but no transactions
            strict: vec![table(&[&["Date", "Debit", "Credit", "Description"], &["", "", "", ""]])],
            text_tables: vec![table(&[
                &["Date", "Debit", "Credit", "Description"],
                &["01.03.2024", "20.00", "", "Coffee Shop"],
            ])],
        };
        let layout = LegacyColumnLayout::default();
        let builder = RowBuilder::new(&layout, "Imported transaction");

        let result = extract_page_tables(&page, 1, &default_profiles(), &builder);
        assert_eq!(result.profile.as_deref(), Some("text (explicit)"));
        assert_eq!(result.transactions.len(), 1);
        assert!(!result.table_less);
    }

    #[test]
    fn test_table_less_page() {
        let page = ScriptedPage {
            strict: Vec::new(),
            text_tables: Vec::new(),
        };
        let layout = LegacyColumnLayout::default();
        let builder = RowBuilder::new(&layout, "Imported transaction");

        let result = extract_page_tables(&page, 2, &default_profiles(), &builder);
        assert!(result.table_less);
        assert!(result.transactions.is_empty());
        assert!(result.profile.is_none());
    }
}
