//! Document reader boundary: pages, tables and table-detection settings.

mod extractor;
mod table;

pub use extractor::{PdfPage, PdfStatement};
pub use table::detect_tables;

use serde::{Deserialize, Serialize};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// One table row; absent cells are `None`.
pub type TableRow = Vec<Option<String>>;

/// An ordered sequence of rows.
pub type Table = Vec<TableRow>;

/// A single page as the extraction engine sees it.
pub trait StatementPage {
    /// Plain text of the page, if any could be read.
    fn extract_text(&self) -> Option<String>;

    /// Detect tables on the page with the given geometry settings.
    fn extract_tables(&self, settings: &TableSettings) -> Result<Vec<Table>>;
}

/// A readable statement document.
pub trait StatementDocument {
    type Page: StatementPage;

    /// Pages in reading order.
    fn pages(&self) -> &[Self::Page];
}

/// How cell boundaries are found along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStrategy {
    /// Ruling lines, with tab stops accepted as column separators.
    Lines,
    /// Ruling lines only.
    LinesStrict,
    /// Text-positional grouping on whitespace gaps.
    Text,
}

/// Geometry parameters for table detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Strategy for column boundaries.
    pub vertical_strategy: TableStrategy,

    /// Strategy for row boundaries.
    pub horizontal_strategy: TableStrategy,

    /// Distance within which edges snap together. Must be positive.
    pub snap_tolerance: u32,

    /// Distance within which edge segments are joined.
    pub join_tolerance: u32,

    /// Minimum edge length (cells per row for line-based detection).
    pub edge_min_length: Option<u32>,

    /// Distance within which characters belong to the same word.
    pub text_tolerance: u32,

    /// Tolerance for edges to count as intersecting.
    pub intersection_tolerance: u32,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            vertical_strategy: TableStrategy::Lines,
            horizontal_strategy: TableStrategy::Lines,
            snap_tolerance: 3,
            join_tolerance: 3,
            edge_min_length: None,
            text_tolerance: 3,
            intersection_tolerance: 3,
        }
    }
}

/// A named table-detection profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    pub name: String,
    pub settings: TableSettings,
}

impl TableProfile {
    pub fn new(name: impl Into<String>, settings: TableSettings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }
}

/// The ordered profiles tried on every page, strict first.
pub fn default_profiles() -> Vec<TableProfile> {
    vec![
        TableProfile::new(
            "lines (strict)",
            TableSettings {
                vertical_strategy: TableStrategy::Lines,
                horizontal_strategy: TableStrategy::Lines,
                snap_tolerance: 3,
                join_tolerance: 3,
                edge_min_length: Some(3),
                text_tolerance: 3,
                intersection_tolerance: 3,
            },
        ),
        TableProfile::new(
            "lines (relaxed)",
            TableSettings {
                vertical_strategy: TableStrategy::Lines,
                horizontal_strategy: TableStrategy::Lines,
                snap_tolerance: 5,
                join_tolerance: 5,
                edge_min_length: Some(1),
                text_tolerance: 5,
                intersection_tolerance: 5,
            },
        ),
        TableProfile::new(
            "text (explicit)",
            TableSettings {
                vertical_strategy: TableStrategy::Text,
                horizontal_strategy: TableStrategy::Text,
                ..TableSettings::default()
            },
        ),
        TableProfile::new(
            "lines_strict + explicit",
            TableSettings {
                vertical_strategy: TableStrategy::LinesStrict,
                horizontal_strategy: TableStrategy::LinesStrict,
                ..TableSettings::default()
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profiles_order() {
        let names: Vec<String> = default_profiles().into_iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec!["lines (strict)", "lines (relaxed)", "text (explicit)", "lines_strict + explicit"]
        );
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: TableSettings =
            serde_json::from_str(r#"{"vertical_strategy": "text", "join_tolerance": 8}"#).unwrap();
        assert_eq!(settings.vertical_strategy, TableStrategy::Text);
        assert_eq!(settings.join_tolerance, 8);
        assert_eq!(settings.snap_tolerance, 3);
        assert_eq!(settings.edge_min_length, None);
    }
}
