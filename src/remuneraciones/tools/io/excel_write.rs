use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::remuneraciones::tools::config::RetryPolicy;
use crate::remuneraciones::tools::error::Result;
use crate::remuneraciones::tools::io::retry::with_lock_retry;
use crate::remuneraciones::tools::model::{Cell, Table};

/// Name of the single sheet in every output workbook.
pub const OUTPUT_SHEET: &str = "Sheet1";

/// Writes the table to `path` as a single-sheet workbook, retrying while
/// another program holds the destination open.
pub fn write_table(path: &Path, table: &Table, policy: RetryPolicy) -> Result<()> {
    with_lock_retry(path, policy, || save_table(path, table))?;
    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.columns.len(),
        "workbook written"
    );
    Ok(())
}

fn save_table(path: &Path, table: &Table) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET)?;

    let header_format = Format::new().set_bold();
    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, header, &header_format)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let excel_col = col_idx as u16;
            match cell {
                Cell::Empty => {}
                Cell::Number(value) => {
                    worksheet.write_number(excel_row, excel_col, *value)?;
                }
                Cell::Text(value) => {
                    worksheet.write_string(excel_row, excel_col, value)?;
                }
                Cell::Bool(value) => {
                    worksheet.write_boolean(excel_row, excel_col, *value)?;
                }
            }
        }
    }

    if !table.columns.is_empty() {
        let col_end = (table.columns.len() as u16).saturating_sub(1);
        worksheet.autofilter(0, 0, table.rows.len() as u32, col_end)?;
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remuneraciones::tools::io::excel_read::read_sheet;
    use tempfile::tempdir;

    #[test]
    fn written_table_reads_back_with_typed_cells() {
        let mut table = Table::new("ignored", vec!["Rut".into(), "Nombre".into(), "OK".into()]);
        table.push_row(vec![Cell::from(1.0), Cell::from("Ana"), Cell::from(true)]);
        table.push_row(vec![Cell::from(2.0), Cell::Empty, Cell::from(false)]);

        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("out.xlsx");
        write_table(&path, &table, RetryPolicy::default()).expect("table written");

        let restored = read_sheet(&path, OUTPUT_SHEET, &["Rut"], RetryPolicy::default())
            .expect("table read");
        assert_eq!(restored.columns, table.columns);
        assert_eq!(restored.rows[0][1], Cell::from("Ana"));
        assert_eq!(restored.rows[1][1], Cell::Empty);
        assert_eq!(restored.rows[1][2], Cell::Bool(false));
    }
}
