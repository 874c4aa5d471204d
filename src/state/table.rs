/// Tabular input loader
///
/// This module loads the first sheet of a spreadsheet (xlsx, xlsm, xls, ods)
/// or a CSV file into an in-memory table. The first row is the header row.
/// Cell values are normalized into a small `Cell` enum so that later stages
/// never deal with reader-specific types.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{CatalogError, CatalogResult};

/// Spreadsheet extensions handled by calamine
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// A single normalized cell value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Numeric view of the cell. Text is parsed, anything non-finite is missing.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(v) => *v,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Integer view of the cell; accepts whole floats such as 3.0
    pub fn as_i64(&self) -> Option<i64> {
        if let Cell::Text(s) = self {
            if let Ok(v) = s.trim().parse::<i64>() {
                return Some(v);
            }
        }
        let value = self.as_f64()?;
        (value.fract() == 0.0 && value.abs() < i64::MAX as f64).then_some(value as i64)
    }

    /// Text view, trimmed; empty string for empty cells
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(v) => crate::state::data::format_number(*v),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

/// An in-memory sheet: named columns over rows of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Human-readable source name used in error messages
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table from already-parsed parts (used by tests and callers
    /// that source data elsewhere)
    pub fn from_rows(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Load a table, choosing the reader by file extension
    pub fn load(path: &Path) -> CatalogResult<Self> {
        if !path.exists() {
            return Err(CatalogError::file_io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            ));
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let table = if ext == "csv" {
            Self::load_csv(path)?
        } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Self::load_spreadsheet(path)?
        } else {
            return Err(CatalogError::UnsupportedTable {
                path: path.to_path_buf(),
            });
        };

        info!(
            "📄 Loaded {} rows x {} columns from {}",
            table.rows.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    /// First worksheet of a workbook
    fn load_spreadsheet(path: &Path) -> CatalogResult<Self> {
        let spreadsheet_err = |message: String| CatalogError::Spreadsheet {
            path: path.to_path_buf(),
            message,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_err(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| spreadsheet_err("workbook has no sheets".to_string()))?
            .map_err(|e| spreadsheet_err(e.to_string()))?;

        // calamine trims leading empty columns; pad them back so positional
        // columns keep their sheet position
        let col_offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);

        let mut rows = range.rows().map(|row| {
            let mut cells = vec![Cell::Empty; col_offset];
            cells.extend(row.iter().map(cell_from_data));
            cells
        });

        let headers = match rows.next() {
            Some(header_row) => header_names(&header_row),
            None => Vec::new(),
        };
        let rows: Vec<Vec<Cell>> = rows.collect();

        debug!("Sheet starts at column offset {}", col_offset);
        Ok(Self::from_rows(file_label(path), headers, rows))
    }

    fn load_csv(path: &Path) -> CatalogResult<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

        let headers = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| header_or_default(h.trim(), i))
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(cell_from_text).collect());
        }

        Ok(Self::from_rows(file_label(path), headers, rows))
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive, whitespace-tolerant column lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
    }

    /// Cell at (row, col); short rows read as empty
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(EMPTY)
    }
}

/// Normalize a calamine cell
fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::Number(*v),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

/// Normalize a CSV field: numbers become numbers, blanks become empty
fn cell_from_text(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        Cell::Empty
    } else if let Ok(v) = trimmed.parse::<f64>() {
        Cell::Number(v)
    } else {
        Cell::Text(field.to_string())
    }
}

fn header_names(cells: &[Cell]) -> Vec<String> {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| header_or_default(&cell.as_text(), i))
        .collect()
}

/// Unnamed header cells get a positional placeholder
fn header_or_default(text: &str, index: usize) -> String {
    if text.is_empty() {
        format!("Unnamed: {}", index)
    } else {
        text.to_string()
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
