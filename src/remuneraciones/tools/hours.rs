use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::remuneraciones::tools::error::Result;
use crate::remuneraciones::tools::io::excel_read::require_columns;
use crate::remuneraciones::tools::model::{Cell, Table};

/// Identity column shared by the hours and total sheets.
pub const RUT: &str = "Rut";
/// Display name column of the hours sheet.
pub const NOMBRE: &str = "Nombre";
/// Per-teacher hour total attached to every row.
pub const TOTAL_HOURS_COLUMN: &str = "TOTAL HORAS POR DOCENTE";

/// One hours-sheet row that recorded at least some program hours.
#[derive(Debug, Clone, PartialEq)]
pub struct HoursRow {
    /// Position of the row in the source sheet.
    pub row_id: usize,
    pub rut: Cell,
    pub nombre: Cell,
    /// Hours per program, in the order the programs were requested.
    pub program_hours: Vec<f64>,
    /// Sum of every program's hours over all rows of the same teacher.
    pub total_per_teacher: f64,
}

impl HoursRow {
    /// Grouping key: a teacher is the `(Rut, Nombre)` pair, so two
    /// spellings of the same name form two groups.
    pub fn teacher_key(&self) -> (String, String) {
        (self.rut.key(), self.nombre.key())
    }
}

/// Sums program hours per teacher and attaches the teacher total to each
/// row. Rows whose program hours add up to exactly zero are dropped.
pub fn aggregate(hours: &Table, programs: &[&str]) -> Result<Vec<HoursRow>> {
    let mut required = vec![RUT, NOMBRE];
    required.extend_from_slice(programs);
    require_columns(hours, &required)?;

    let rut_idx = hours.column_index(RUT).unwrap_or_default();
    let nombre_idx = hours.column_index(NOMBRE).unwrap_or_default();
    let program_idx: Vec<usize> = programs
        .iter()
        .filter_map(|program| hours.column_index(program))
        .collect();

    let mut rows = Vec::with_capacity(hours.len());
    let mut dropped = 0usize;
    for (row_id, cells) in hours.rows.iter().enumerate() {
        let program_hours: Vec<f64> = program_idx
            .iter()
            .map(|&idx| hour_value(&cells[idx], &hours.columns[idx], row_id))
            .collect();
        let row_total: f64 = program_hours.iter().sum();
        if row_total == 0.0 {
            dropped += 1;
            continue;
        }
        rows.push(HoursRow {
            row_id,
            rut: cells[rut_idx].clone(),
            nombre: cells[nombre_idx].clone(),
            program_hours,
            total_per_teacher: 0.0,
        });
    }

    let mut totals: HashMap<(String, String), f64> = HashMap::new();
    for row in &rows {
        *totals.entry(row.teacher_key()).or_default() += row.program_hours.iter().sum::<f64>();
    }
    for row in &mut rows {
        row.total_per_teacher = totals.get(&row.teacher_key()).copied().unwrap_or_default();
    }

    info!(
        rows = rows.len(),
        teachers = totals.len(),
        dropped,
        "hours aggregated"
    );
    Ok(rows)
}

fn hour_value(cell: &Cell, column: &str, row_id: usize) -> f64 {
    if cell.is_empty() {
        return 0.0;
    }
    match cell.as_number() {
        Some(value) if value.is_finite() => value,
        _ => {
            warn!(column, row = row_id + 2, value = %cell, "non-numeric hours treated as 0");
            0.0
        }
    }
}

/// Per-teacher hours after collapsing all of a teacher's rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherHours {
    pub rut: Cell,
    pub nombre: Cell,
    pub program_hours: Vec<f64>,
    pub total: f64,
}

impl TeacherHours {
    /// Hours for a total-sheet row with no matching teacher.
    pub fn unmatched(rut: Cell, programs: usize) -> Self {
        Self {
            rut,
            nombre: Cell::Empty,
            program_hours: vec![0.0; programs],
            total: 0.0,
        }
    }

    /// Sum of program hours on this row.
    pub fn combined(&self) -> f64 {
        self.program_hours.iter().sum()
    }
}

/// Collapses aggregated rows into one entry per `(Rut, Nombre)`, keeping
/// first-seen order and summing each program column.
pub fn collapse(rows: &[HoursRow]) -> Vec<TeacherHours> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut teachers: Vec<TeacherHours> = Vec::new();

    for row in rows {
        match index.get(&row.teacher_key()) {
            Some(&pos) => {
                let teacher = &mut teachers[pos];
                for (sum, hours) in teacher.program_hours.iter_mut().zip(&row.program_hours) {
                    *sum += hours;
                }
            }
            None => {
                index.insert(row.teacher_key(), teachers.len());
                teachers.push(TeacherHours {
                    rut: row.rut.clone(),
                    nombre: row.nombre.clone(),
                    program_hours: row.program_hours.clone(),
                    total: row.total_per_teacher,
                });
            }
        }
    }

    debug!(teachers = teachers.len(), "hours collapsed per teacher");
    teachers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours_table(rows: &[(f64, &str, f64, f64)]) -> Table {
        let mut table = Table::new(
            "HORAS",
            vec!["Rut".into(), "Nombre".into(), "PIE".into(), "SN".into()],
        );
        for (rut, nombre, pie, sn) in rows {
            table.push_row(vec![
                Cell::from(*rut),
                Cell::from(*nombre),
                Cell::from(*pie),
                Cell::from(*sn),
            ]);
        }
        table
    }

    #[test]
    fn zero_hour_rows_are_dropped_and_totals_attached() {
        let table = hours_table(&[
            (1.0, "A", 10.0, 0.0),
            (1.0, "A", 20.0, 5.0),
            (2.0, "B", 0.0, 0.0),
        ]);
        let rows = aggregate(&table, &["PIE", "SN"]).expect("aggregated");

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.total_per_teacher == 35.0));
        assert_eq!(rows[0].row_id, 0);
        assert_eq!(rows[1].row_id, 1);
    }

    #[test]
    fn name_variants_of_one_rut_form_separate_teachers() {
        let table = hours_table(&[(1.0, "Ana", 10.0, 0.0), (1.0, "ANA", 4.0, 0.0)]);
        let rows = aggregate(&table, &["PIE", "SN"]).expect("aggregated");
        assert_eq!(rows[0].total_per_teacher, 10.0);
        assert_eq!(rows[1].total_per_teacher, 4.0);
        assert_eq!(collapse(&rows).len(), 2);
    }

    #[test]
    fn collapse_sums_each_program_separately() {
        let table = hours_table(&[(1.0, "A", 10.0, 2.0), (1.0, "A", 20.0, 3.0)]);
        let rows = aggregate(&table, &["PIE", "SN"]).expect("aggregated");
        let teachers = collapse(&rows);

        assert_eq!(teachers.len(), 1);
        assert_eq!(teachers[0].program_hours, vec![30.0, 5.0]);
        assert_eq!(teachers[0].total, 35.0);
        assert_eq!(teachers[0].combined(), 35.0);
    }

    #[test]
    fn blank_hours_count_as_zero() {
        let mut table = Table::new("HORAS", vec!["Rut".into(), "Nombre".into(), "SEP".into()]);
        table.push_row(vec![Cell::from(3.0), Cell::from("C"), Cell::Empty]);
        let rows = aggregate(&table, &["SEP"]).expect("aggregated");
        assert!(rows.is_empty());
    }
}
