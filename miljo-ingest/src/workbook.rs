//! Read uploaded workbooks into [`Sheet`] grids.
//!
//! Excel formats go through calamine's auto-detection, CSV exports become a
//! single-sheet workbook. Cell conversion is lossy on purpose: downstream
//! only cares about text, numbers and emptiness.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use thiserror::Error;

use miljo_core::grid::{Cell, Sheet};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("unsupported file format: {0:?}")]
    UnsupportedFormat(String),
    #[error("could not read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("could not read csv: {0}")]
    Csv(#[from] csv::Error),
}

/// Read an uploaded Excel buffer (xlsx/xls/xlsb/ods) into sheets.
pub fn read_workbook_bytes(bytes: &[u8]) -> Result<Vec<Sheet>, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    collect_sheets(&mut workbook)
}

/// Read a workbook from disk, dispatching on the file extension.
/// `.csv` files come back as a single sheet named after the file stem.
pub fn read_workbook_path(path: &Path) -> Result<Vec<Sheet>, IngestError> {
    if !path.exists() {
        return Err(IngestError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "xlsx" | "xls" | "xlsb" | "ods" => {
            let mut workbook = open_workbook_auto(path)?;
            collect_sheets(&mut workbook)
        }
        "csv" => {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("csv")
                .to_string();
            Ok(vec![read_csv_sheet(path, name)?])
        }
        _ => Err(IngestError::UnsupportedFormat(ext)),
    }
}

fn collect_sheets<RS>(workbook: &mut Sheets<RS>) -> Result<Vec<Sheet>, IngestError>
where
    RS: std::io::Read + std::io::Seek,
{
    let names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(names.len());

    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(convert_cell).collect())
            .collect();
        sheets.push(Sheet::new(name, rows));
    }

    Ok(sheets)
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::String(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        // formula errors carry no usable value
        Data::Error(_) => Cell::Empty,
    }
}

/// One CSV file as one sheet; every record is a row, header included.
fn read_csv_sheet(path: &Path, name: String) -> Result<Sheet, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<Cell> = record
            .iter()
            .map(|field| {
                let field = field.trim();
                if field.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    Ok(Sheet::new(name, rows))
}
