//! Table detection over page text lines.
//!
//! Text extracted from statement PDFs keeps column boundaries either as
//! ruling characters (`|`), tab stops, or runs of spaces. Each strategy reads
//! one of those signals; consecutive qualifying lines form a table.

use regex::Regex;
use tracing::trace;

use super::{Result, Table, TableRow, TableSettings, TableStrategy};
use crate::error::PdfError;

/// Split page text into tables according to `settings`.
pub fn detect_tables(text: &str, settings: &TableSettings) -> Result<Vec<Table>> {
    if settings.snap_tolerance == 0 {
        return Err(PdfError::TableDetection(
            "snap_tolerance must be positive".to_string(),
        ));
    }

    let splitter = CellSplitter::new(settings)?;
    let min_cells = settings
        .edge_min_length
        .map(|n| (n as usize).max(2))
        .unwrap_or(3);
    let max_gap = (settings.join_tolerance / 5) as usize;

    let mut tables = Vec::new();
    let mut current: Table = Vec::new();
    let mut gap = 0usize;

    for line in text.lines() {
        let cells = splitter.split(line);
        if cells.len() >= min_cells {
            current.push(cells);
            gap = 0;
            continue;
        }

        if current.is_empty() {
            continue;
        }
        gap += 1;
        if gap > max_gap {
            flush(&mut current, &mut tables);
            gap = 0;
        }
    }
    flush(&mut current, &mut tables);

    trace!(
        "Detected {} tables ({:?}/{:?}, min cells {})",
        tables.len(),
        settings.vertical_strategy,
        settings.horizontal_strategy,
        min_cells
    );
    Ok(tables)
}

fn flush(current: &mut Table, tables: &mut Vec<Table>) {
    if current.len() >= 2 {
        let width = current.iter().map(Vec::len).max().unwrap_or(0);
        let mut table = std::mem::take(current);
        for row in &mut table {
            row.resize(width, None);
        }
        tables.push(table);
    } else {
        current.clear();
    }
}

enum CellSplitter {
    Ruled { tabs: bool },
    Gaps(Regex),
}

impl CellSplitter {
    fn new(settings: &TableSettings) -> Result<Self> {
        Ok(match settings.vertical_strategy {
            TableStrategy::Lines => Self::Ruled { tabs: true },
            TableStrategy::LinesStrict => Self::Ruled { tabs: false },
            TableStrategy::Text => {
                let width = settings.join_tolerance.saturating_sub(1).max(2);
                let gap = Regex::new(&format!(r"[ \u{{00a0}}]{{{},}}|\t", width))
                    .map_err(|e| PdfError::TableDetection(e.to_string()))?;
                Self::Gaps(gap)
            }
        })
    }

    fn split(&self, line: &str) -> TableRow {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }

        let parts: Vec<&str> = match self {
            Self::Ruled { tabs } => {
                if line.contains('|') {
                    line.trim_matches('|').split('|').collect()
                } else if *tabs && line.contains('\t') {
                    line.split('\t').collect()
                } else {
                    return Vec::new();
                }
            }
            Self::Gaps(gap) => gap.split(line).collect(),
        };

        parts
            .into_iter()
            .map(|cell| {
                let cell = cell.trim();
                (!cell.is_empty()).then(|| cell.to_string())
            })
            .collect()
    }
}
