//! Workbook grid model shared by every pipeline stage.
//!
//! Readers normalize whatever the file format gives them into [`Sheet`]s of
//! [`Cell`]s; everything downstream only ever sees this.

use regex::Regex;

/// A single cell value. Spreadsheets in the wild mix text and numbers freely,
/// so both are first-class and everything else collapses to `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Whitespace-only text counts as empty, matching how the sheet
    /// heuristics count populated cells.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// String rendering used for category keys and factor extraction.
    /// Whole numbers print without a decimal point.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }

    /// Numeric view of the cell. Text is parsed with decimal commas and
    /// grouping spaces tolerated; anything unparseable is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => parse_decimal(s),
        }
    }
}

/// One named sheet of an uploaded workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Parse a decimal number from text, accepting Swedish formatting:
/// "1 234,56" and "1234.56" both parse.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// First decimal number appearing anywhere in a free-text cell,
/// e.g. "ca 410 kg CO2/st" gives 410.0.
pub fn first_number(s: &str) -> Option<f64> {
    let re = Regex::new(r"\d+(?:[.,]\d+)?").ok()?;
    re.find(s).and_then(|m| parse_decimal(m.as_str()))
}
