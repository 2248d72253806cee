use std::path::Path;

use calamine::{DataType, Reader, open_workbook_auto};
use tracing::{debug, error, info};

use crate::remuneraciones::tools::config::RetryPolicy;
use crate::remuneraciones::tools::error::{Result, ToolError};
use crate::remuneraciones::tools::io::retry::with_lock_retry;
use crate::remuneraciones::tools::model::{Cell, Table};

/// Spreadsheet extensions the loader accepts, compared case-insensitively.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// A sheet to load together with the headers it must carry.
#[derive(Debug, Clone, Copy)]
pub struct SheetRequest<'a> {
    pub name: &'a str,
    pub required: &'a [&'a str],
}

/// Checks that `path` exists, has a spreadsheet extension, and is not empty.
pub fn validate_file(path: &Path) -> Result<()> {
    let result = check_file(path);
    if let Err(err) = &result {
        error!(path = %path.display(), error = %err, "input file rejected");
    }
    result
}

fn check_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ToolError::NotFound(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ToolError::InvalidFormat(path.to_path_buf()));
    }
    if std::fs::metadata(path)?.len() == 0 {
        return Err(ToolError::EmptyFile(path.to_path_buf()));
    }
    Ok(())
}

/// Loads a single sheet. See [`read_sheets`].
pub fn read_sheet(
    path: &Path,
    sheet: &str,
    required: &[&str],
    policy: RetryPolicy,
) -> Result<Table> {
    let mut tables = read_sheets(path, &[SheetRequest { name: sheet, required }], policy)?;
    tables
        .pop()
        .ok_or_else(|| ToolError::MissingSheet(sheet.to_string()))
}

/// Validates the file, opens it (retrying while another program holds a
/// lock on it), and reads each requested sheet into a [`Table`].
///
/// Required headers that only differ in case from an existing header are
/// renamed to the requested spelling, so a `rut` column satisfies `Rut`.
pub fn read_sheets(
    path: &Path,
    requests: &[SheetRequest<'_>],
    policy: RetryPolicy,
) -> Result<Vec<Table>> {
    validate_file(path)?;

    let mut tables: Vec<Table> = with_lock_retry(path, policy, || {
        let mut workbook = open_workbook_auto(path)?;
        requests
            .iter()
            .map(|request| -> Result<Table> {
                let range = workbook
                    .worksheet_range(request.name)
                    .ok_or_else(|| ToolError::MissingSheet(request.name.to_string()))??;
                Ok(range_to_table(request.name, &range))
            })
            .collect()
    })?;

    for (table, request) in tables.iter_mut().zip(requests) {
        canonicalize_headers(table, request.required);
        require_columns(table, request.required)?;
        info!(
            sheet = %table.sheet_name,
            rows = table.len(),
            columns = table.columns.len(),
            "sheet loaded"
        );
    }

    Ok(tables)
}

/// Fails with [`ToolError::MissingColumns`] when any required header is absent.
pub fn require_columns(table: &Table, required: &[&str]) -> Result<()> {
    let missing = table.missing_columns(required);
    if missing.is_empty() {
        return Ok(());
    }
    let err = ToolError::MissingColumns {
        sheet: table.sheet_name.clone(),
        columns: missing,
    };
    error!(error = %err, "sheet validation failed");
    Err(err)
}

fn canonicalize_headers(table: &mut Table, required: &[&str]) {
    for &name in required {
        if table.has_column(name) {
            continue;
        }
        let found = table
            .columns
            .iter()
            .find(|column| column.trim().eq_ignore_ascii_case(name))
            .cloned();
        if let Some(found) = found {
            debug!(sheet = %table.sheet_name, from = %found, to = name, "renaming header");
            table.rename_column(&found, name);
        }
    }
}

fn range_to_table(sheet: &str, range: &calamine::Range<DataType>) -> Table {
    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(header_text).collect(),
        None => Vec::new(),
    };

    let mut table = Table::new(sheet, columns);
    for row in rows {
        let cells: Vec<Cell> = row.iter().map(data_to_cell).collect();
        if cells.iter().all(Cell::is_empty) {
            continue;
        }
        table.push_row(cells);
    }
    table
}

fn header_text(cell: &DataType) -> String {
    match data_to_cell(cell) {
        Cell::Empty => String::new(),
        other => other.to_string(),
    }
}

fn data_to_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::Empty | DataType::Error(_) => Cell::Empty,
        DataType::Float(value) | DataType::DateTime(value) => Cell::Number(*value),
        DataType::Int(value) => Cell::Number(*value as f64),
        DataType::Bool(value) => Cell::Bool(*value),
        DataType::String(value) => Cell::Text(value.clone()),
        other => Cell::Text(other.to_string()),
    }
}
