//! Sheet discovery: find the climate-factor reference sheet and the
//! transaction sheet inside an uploaded workbook.
//!
//! Uploads come from different purchasing systems, so both lookups are
//! heuristic. The factor sheet is recognized by name, the transaction sheet
//! by how densely populated its header row is.

use thiserror::Error;

use crate::grid::{Cell, Sheet, first_number};

/// Sheet-name markers (lowercase) that identify a factor/reference sheet.
const FACTOR_SHEET_MARKERS: [&str; 2] = ["klimat", "kategorisering"];

/// Header marker for the column holding impact factors.
const FACTOR_COLUMN_MARKER: &str = "klimat";

/// Factor-table key used when nothing else matches a category.
pub const OTHER_CATEGORY: &str = "övrigt";

/// How many rows from the top of each sheet are scanned for a header.
const HEADER_SCAN_ROWS: usize = 20;

/// A header row must hold more populated cells than this.
const HEADER_MIN_CELLS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("no sheet in the workbook looks like transaction data")]
    NoTransactionData,
}

/// Category name (lowercase) mapped to an impact factor, in insertion order.
///
/// Insertion order matters: the fallback classifier walks the entries and
/// takes the first match, so the structure must iterate the same way every
/// run. Re-inserting a key overwrites the value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactorTable {
    entries: Vec<(String, f64)>,
}

impl FactorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a factor. Last write wins, position is kept.
    pub fn insert(&mut self, category: impl Into<String>, factor: f64) {
        let category = category.into();
        match self.entries.iter_mut().find(|(k, _)| *k == category) {
            Some(entry) => entry.1 = factor,
            None => self.entries.push((category, factor)),
        }
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == category)
            .map(|(_, v)| *v)
    }

    /// The designated fallback factor, if the sheet provided one.
    pub fn other(&self) -> Option<f64> {
        self.get(OTHER_CATEGORY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, f64)> for FactorTable {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        let mut table = FactorTable::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

/// The sheet picked as holding row-level purchase records.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionTable {
    pub sheet_name: String,
    pub header: Vec<Cell>,
    pub rows: Vec<Vec<Cell>>,
}

/// Scan a workbook for the factor table and the transaction sheet.
///
/// The factor table may come out empty (not every export ships a climate
/// sheet); a missing transaction sheet is fatal.
pub fn locate(sheets: &[Sheet]) -> Result<(FactorTable, TransactionTable), LocateError> {
    let factors = build_factor_table(sheets);
    let table = find_transaction_table(sheets).ok_or(LocateError::NoTransactionData)?;
    Ok((factors, table))
}

/// Merge every qualifying reference sheet into one factor table.
/// Later sheets overwrite earlier ones on key collisions.
pub fn build_factor_table(sheets: &[Sheet]) -> FactorTable {
    let mut table = FactorTable::new();

    for sheet in sheets {
        let name = sheet.name.to_lowercase();
        if !FACTOR_SHEET_MARKERS.iter().any(|m| name.contains(m)) {
            continue;
        }

        let Some(header) = sheet.rows.first() else {
            continue;
        };
        let Some(factor_col) = header.iter().position(|cell| {
            cell.display().to_lowercase().contains(FACTOR_COLUMN_MARKER)
        }) else {
            continue;
        };

        for row in sheet.rows.iter().skip(1) {
            let key = row
                .first()
                .map(|c| c.display().trim().to_lowercase())
                .unwrap_or_default();
            if key.is_empty() {
                continue;
            }
            let Some(cell) = row.get(factor_col) else {
                continue;
            };
            if cell.is_empty() {
                continue;
            }
            if let Some(factor) = first_number(&cell.display()) {
                table.insert(key, factor);
            }
        }
    }

    table
}

/// Pick the sheet most likely to hold transaction rows.
///
/// Per sheet: the first row within the top [`HEADER_SCAN_ROWS`] rows holding
/// more than [`HEADER_MIN_CELLS`] populated cells is the sheet's only header
/// candidate, and every later row with at least one populated cell counts as
/// data. The sheet with strictly the most data rows wins.
fn find_transaction_table(sheets: &[Sheet]) -> Option<TransactionTable> {
    let mut best: Option<(TransactionTable, usize)> = None;

    for sheet in sheets {
        for (idx, row) in sheet.rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
            if populated_cells(row) <= HEADER_MIN_CELLS {
                continue;
            }

            let rows: Vec<Vec<Cell>> = sheet.rows[idx + 1..]
                .iter()
                .filter(|r| r.iter().any(|c| !c.is_empty()))
                .cloned()
                .collect();

            if best.as_ref().is_none_or(|(_, count)| rows.len() > *count) {
                let count = rows.len();
                best = Some((
                    TransactionTable {
                        sheet_name: sheet.name.clone(),
                        header: row.clone(),
                        rows,
                    },
                    count,
                ));
            }
            break; // one header candidate per sheet
        }
    }

    best.map(|(table, _)| table)
}

fn populated_cells(row: &[Cell]) -> usize {
    row.iter().filter(|c| !c.is_empty()).count()
}
