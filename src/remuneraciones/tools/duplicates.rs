use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{error, info, instrument, warn};

use crate::remuneraciones::tools::config::Settings;
use crate::remuneraciones::tools::error::{Result, ToolError};
use crate::remuneraciones::tools::io::excel_read::{self, require_columns};
use crate::remuneraciones::tools::io::excel_write;
use crate::remuneraciones::tools::model::{Cell, Table};
use crate::remuneraciones::tools::pipeline::Progress;

/// Sheet read from both duplicate-consolidation inputs.
pub const DUPLICATES_SHEET: &str = "Hoja1";
/// Column whose repeated values mark duplicate rows.
pub const KEY_COLUMN: &str = "DUPLICADOS";
/// Zero-based index of the first summed column (the 17th column).
pub const SUM_FROM_COLUMN: usize = 16;

/// Result of collapsing duplicate rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidation {
    pub table: Table,
    /// Rows that shared their key with at least one other row.
    pub duplicate_rows: usize,
    /// Rows removed after summing.
    pub removed: usize,
    /// Headers of the columns that were summed.
    pub summed_columns: Vec<String>,
}

/// Columns summed across a duplicate group: every column from the 17th
/// onward, or, for narrower sheets, every numeric column. The key column is
/// never summed.
pub fn summable_columns(table: &Table, key_idx: usize) -> Vec<usize> {
    if table.columns.len() > SUM_FROM_COLUMN {
        return (SUM_FROM_COLUMN..table.columns.len())
            .filter(|&idx| idx != key_idx)
            .collect();
    }

    warn!(
        columns = table.columns.len(),
        "sheet has fewer than 17 columns, summing every numeric column"
    );
    (0..table.columns.len())
        .filter(|&idx| idx != key_idx)
        .filter(|&idx| {
            table
                .rows
                .iter()
                .all(|row| matches!(row[idx], Cell::Number(_) | Cell::Empty))
        })
        .collect()
}

/// Merges rows sharing a `key` value: summable columns hold the group sum,
/// the first row of each group is kept, and the result is sorted by key.
/// Rows with a blank key collapse to their first row without summing.
pub fn consolidate(mut table: Table, key: &str) -> Result<Consolidation> {
    require_columns(&table, &[key])?;
    let key_idx = table
        .column_index(key)
        .ok_or_else(|| ToolError::MissingColumns {
            sheet: table.sheet_name.clone(),
            columns: vec![key.to_string()],
        })?;

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (row_idx, row) in table.rows.iter().enumerate() {
        let group_key = row[key_idx].key();
        groups
            .entry(group_key.clone())
            .or_insert_with(|| {
                order.push(group_key);
                Vec::new()
            })
            .push(row_idx);
    }

    let duplicate_rows: usize = groups
        .values()
        .filter(|members| members.len() > 1)
        .map(Vec::len)
        .sum();

    let mut summed_columns = Vec::new();
    let mut removed = 0;
    if duplicate_rows == 0 {
        info!("no duplicate rows found");
    } else {
        info!(duplicate_rows, "duplicate rows found");
        let summable = summable_columns(&table, key_idx);
        summed_columns = summable
            .iter()
            .map(|&idx| table.columns[idx].clone())
            .collect();

        for group_key in &order {
            let members = &groups[group_key];
            // Blank keys are deduplicated but never summed.
            if members.len() < 2 || group_key.is_empty() {
                continue;
            }
            for &col in &summable {
                match group_sum(&table, members, col) {
                    Some(sum) => table.rows[members[0]][col] = Cell::Number(sum),
                    None => warn!(
                        key = %group_key,
                        column = %table.columns[col],
                        "non-numeric values in summed column, keeping first row"
                    ),
                }
            }
        }

        let keep: HashSet<usize> = groups.values().map(|members| members[0]).collect();
        let before = table.rows.len();
        table.rows = std::mem::take(&mut table.rows)
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| keep.contains(idx))
            .map(|(_, row)| row)
            .collect();
        removed = before - table.rows.len();
        info!(removed, "duplicate rows removed");
    }

    table.sort_by_columns(&[key_idx]);

    Ok(Consolidation {
        table,
        duplicate_rows,
        removed,
        summed_columns,
    })
}

fn group_sum(table: &Table, members: &[usize], col: usize) -> Option<f64> {
    members.iter().try_fold(0.0, |acc, &row| match &table.rows[row][col] {
        Cell::Number(value) => Some(acc + value),
        Cell::Empty => Some(acc),
        _ => None,
    })
}

/// Consolidates duplicate rows of `primary` and writes the result to
/// `output`. `secondary` is validated and loaded but not yet used.
#[instrument(
    level = "info",
    skip_all,
    fields(primary = %primary.display(), secondary = %secondary.display(), output = %output.display())
)]
pub fn process_duplicates(
    primary: &Path,
    secondary: &Path,
    output: &Path,
    settings: &Settings,
    progress: &mut Progress<'_>,
) -> Result<()> {
    let result = run(primary, secondary, output, settings, progress);
    if let Err(err) = &result {
        error!(error = %err, detail = ?err, "duplicate pipeline failed");
    }
    result
}

fn run(
    primary: &Path,
    secondary: &Path,
    output: &Path,
    settings: &Settings,
    progress: &mut Progress<'_>,
) -> Result<()> {
    progress(0, "Iniciando proceso de duplicados...");
    progress(10, "Cargando primer archivo...");
    excel_read::validate_file(primary)?;
    excel_read::validate_file(secondary)?;
    let table = excel_read::read_sheet(primary, DUPLICATES_SHEET, &[], settings.retry)?;

    progress(20, "Cargando segundo archivo...");
    let extra = excel_read::read_sheet(secondary, DUPLICATES_SHEET, &[], settings.retry)?;
    info!(rows = extra.len(), "secondary workbook loaded");

    progress(30, "Detectando duplicados...");
    let consolidation = consolidate(table, KEY_COLUMN)?;
    if consolidation.duplicate_rows == 0 {
        progress(40, "No se encontraron duplicados, preparando archivo...");
    } else {
        progress(
            40,
            &format!(
                "Calculando suma de columnas para {} duplicados...",
                consolidation.duplicate_rows
            ),
        );
        progress(50, "Actualizando registros duplicados...");
        progress(60, "Eliminando duplicados adicionales...");
    }

    progress(70, "Ordenando datos...");
    progress(80, "Guardando resultado final...");
    excel_write::write_table(output, &consolidation.table, settings.retry)?;
    progress(
        100,
        &format!(
            "Proceso de duplicados completado! Archivo guardado en {}",
            output.display()
        ),
    );
    Ok(())
}
