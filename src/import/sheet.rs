//! Tabular readers: first worksheet of a workbook, or a CSV file.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::ImportError;

/// A header row plus data rows, all as optional cell text.
#[derive(Debug, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers
            .iter()
            .position(|h| h.trim() == name)
            .or_else(|| {
                self.headers
                    .iter()
                    .position(|h| h.trim().eq_ignore_ascii_case(name))
            })
    }
}

pub fn read_table(path: &Path) -> Result<Table, ImportError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path),
        other => Err(ImportError::UnsupportedFormat(other.to_string())),
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn read_workbook(path: &Path) -> Result<Table, ImportError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ImportError::Read(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptySheet)?
        .map_err(|e| ImportError::Read(e.to_string()))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or(ImportError::EmptySheet)?
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();

    Ok(Table {
        headers,
        rows: rows
            .map(|row| row.iter().map(cell_text).collect())
            .collect(),
    })
}

fn read_csv(path: &Path) -> Result<Table, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ImportError::Read(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| ImportError::Read(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect::<Vec<_>>();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ImportError::EmptySheet);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Read(e.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        None
                    } else {
                        Some(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Table { headers, rows })
}
