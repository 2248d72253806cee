use tracing::{info, warn};

use crate::remuneraciones::tools::merge::CombinedTable;
use crate::remuneraciones::tools::model::Cell;

/// A teacher whose aggregated hours exceed the weekly cap.
#[derive(Debug, Clone, PartialEq)]
pub struct OvertimeViolation {
    pub row: usize,
    pub rut: String,
    pub nombre: String,
    pub hours: f64,
}

/// Lists every joined row whose teacher total exceeds `limit`. Advisory
/// only: rows are neither removed nor changed.
pub fn find_overtime(combined: &CombinedTable, limit: f64) -> Vec<OvertimeViolation> {
    let violations: Vec<OvertimeViolation> = combined
        .hours
        .iter()
        .enumerate()
        .filter(|(_, hours)| hours.total > limit)
        .map(|(row, hours)| OvertimeViolation {
            row,
            rut: hours.rut.key(),
            nombre: hours.nombre.to_string(),
            hours: hours.total,
        })
        .collect();

    for violation in &violations {
        warn!(
            rut = %violation.rut,
            nombre = %violation.nombre,
            hours = violation.hours,
            limit,
            "teacher exceeds the weekly hour limit"
        );
    }

    if violations.is_empty() {
        info!(limit, "no teacher exceeds the weekly hour limit");
    } else {
        warn!(count = violations.len(), limit, "hour limit violations found");
    }

    violations
}

/// Per-row flag: `true` when the teacher total is within `limit`.
pub fn validity_flags(combined: &CombinedTable, limit: f64) -> Vec<Cell> {
    combined
        .hours
        .iter()
        .map(|hours| Cell::Bool(hours.total <= limit))
        .collect()
}
