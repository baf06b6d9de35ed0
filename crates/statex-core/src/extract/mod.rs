//! Statement transaction extraction.
//!
//! Table-derived and text-derived candidate sets are built independently and
//! reconciled by a badness score; see [`StatementExtractor`].

pub mod columns;
mod engine;
pub mod rows;
pub mod score;
pub mod strategy;
pub mod text;

pub use columns::{ColumnRoles, infer_columns, is_header_row, is_header_text, looks_like_header};
pub use engine::StatementExtractor;
pub use rows::RowBuilder;
pub use score::{CandidateSource, badness, reconcile};
pub use strategy::{PageTables, extract_page_tables};
pub use text::{PendingTextTransaction, parse_text_lines};

use serde::Serialize;

use crate::models::{RawTransaction, StatementMetadata};

/// Counts of rows or lines dropped while building transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    pub no_date: usize,
    pub no_amount: usize,
    pub header_like: usize,
    pub zero_amount: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.no_date + self.no_amount + self.header_like + self.zero_amount
    }

    pub fn merge(&mut self, other: &DropCounts) {
        self.no_date += other.no_date;
        self.no_amount += other.no_amount;
        self.header_like += other.header_like;
        self.zero_amount += other.zero_amount;
    }
}

/// Diagnostics for one extraction run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    /// Number of pages read.
    pub pages: usize,
    /// 1-indexed pages on which no profile found any table.
    pub table_less_pages: Vec<usize>,
    /// Profile accepted per page, `None` when no profile produced rows.
    pub page_profiles: Vec<Option<String>>,
    /// Which candidate set was returned.
    pub chosen: Option<CandidateSource>,
    pub table_score: f64,
    pub text_score: f64,
    pub table_count: usize,
    pub text_count: usize,
    pub table_drops: DropCounts,
    pub text_drops: DropCounts,
}

/// Result of extracting one document.
#[derive(Debug, Clone)]
pub struct StatementExtraction {
    pub transactions: Vec<RawTransaction>,
    pub metadata: StatementMetadata,
    pub report: ExtractionReport,
}

impl StatementExtraction {
    /// An empty result carrying only metadata.
    pub fn empty(metadata: StatementMetadata) -> Self {
        Self {
            transactions: Vec::new(),
            metadata,
            report: ExtractionReport {
                table_score: f64::INFINITY,
                text_score: f64::INFINITY,
                ..ExtractionReport::default()
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
