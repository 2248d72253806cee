//! Proportional split of monetary columns by hour share.
//!
//! For a column `C` and a row with teacher total `T` and weight hours `H`
//! the apportioned value is `round((C / T) * H)`. Division by zero, blank
//! cells and other non-finite intermediate results collapse to zero
//! through [`non_finite_to_zero`]. Ties round half to even.

use tracing::{debug, info, warn};

use crate::remuneraciones::tools::config::Catalog;
use crate::remuneraciones::tools::error::{Result, ToolError};
use crate::remuneraciones::tools::merge::CombinedTable;
use crate::remuneraciones::tools::mode::{Mode, Weight};
use crate::remuneraciones::tools::model::Cell;

/// Replaces NaN and infinities with zero.
pub fn non_finite_to_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Value of one hour of `amount` for a teacher working `total_hours`.
pub fn hourly_rate(amount: f64, total_hours: f64) -> f64 {
    if total_hours == 0.0 {
        return 0.0;
    }
    non_finite_to_zero(amount / total_hours)
}

/// Share of `amount` earned by `weight_hours` out of `total_hours`, rounded
/// to an integer. A blank amount apportions to zero.
pub fn apportion_value(amount: Option<f64>, total_hours: f64, weight_hours: f64) -> i64 {
    let rate = hourly_rate(amount.unwrap_or(f64::NAN), total_hours);
    non_finite_to_zero((rate * weight_hours).round_ties_even()) as i64
}

/// What happened to each catalog column during an apportionment pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApportionReport {
    /// Source columns that produced outputs.
    pub apportioned: Vec<String>,
    /// Catalog columns absent from the workbook.
    pub missing: Vec<String>,
    /// Columns that could not be computed, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Appends the apportioned columns for every catalog column present in the
/// joined table. Missing columns are skipped with a notice; a column that
/// fails to compute is logged and left without outputs.
pub fn apportion(combined: &mut CombinedTable, mode: Mode, catalog: &Catalog) -> ApportionReport {
    let mut report = ApportionReport::default();

    if let Some(name) = mode.row_sum_column() {
        let sums = combined
            .hours
            .iter()
            .map(|hours| Cell::Number(hours.combined()))
            .collect();
        combined.push_column(name, sums);
    }

    for (column, policy) in mode.policies(catalog) {
        if !combined.table.has_column(&column) {
            info!(column = %column, "column not present in workbook, skipping");
            report.missing.push(column);
            continue;
        }

        let outputs = mode.outputs(&column, policy);
        match compute_column(combined, &column, &outputs) {
            Ok(values) => {
                for ((name, _), cells) in outputs.into_iter().zip(values) {
                    combined.push_column(name, cells);
                }
                report.apportioned.push(column);
            }
            Err(err) => {
                warn!(column = %column, error = %err, "failed to apportion column");
                report.failed.push((column, err.to_string()));
            }
        }
    }

    info!(
        mode = %mode,
        apportioned = report.apportioned.len(),
        missing = report.missing.len(),
        failed = report.failed.len(),
        "apportionment finished"
    );
    report
}

fn compute_column(
    combined: &CombinedTable,
    column: &str,
    outputs: &[(String, Weight)],
) -> Result<Vec<Vec<Cell>>> {
    let idx = combined
        .table
        .column_index(column)
        .ok_or_else(|| ToolError::Column {
            column: column.to_string(),
            reason: "column disappeared".into(),
        })?;

    let amounts = combined
        .table
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| amount(&row[idx], column, row_idx))
        .collect::<Result<Vec<_>>>()?;

    let values: Vec<Vec<Cell>> = outputs
        .iter()
        .map(|(name, weight)| {
            debug!(output = %name, "computing apportioned column");
            amounts
                .iter()
                .zip(&combined.hours)
                .map(|(amount, hours)| {
                    let weight_hours = match weight {
                        Weight::Program(program) => {
                            hours.program_hours.get(*program).copied().unwrap_or_default()
                        }
                        Weight::Combined => hours.combined(),
                    };
                    Cell::Number(apportion_value(*amount, hours.total, weight_hours) as f64)
                })
                .collect::<Vec<Cell>>()
        })
        .collect();

    Ok(values)
}

fn amount(cell: &Cell, column: &str, row_idx: usize) -> Result<Option<f64>> {
    if cell.is_empty() {
        return Ok(None);
    }
    cell.as_number().map(Some).ok_or_else(|| ToolError::Column {
        column: column.to_string(),
        reason: format!("non-numeric value '{cell}' in data row {}", row_idx + 1),
    })
}
