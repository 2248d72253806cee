use std::collections::HashMap;

use tracing::info;

use crate::remuneraciones::tools::hours::{NOMBRE, RUT, TOTAL_HOURS_COLUMN, TeacherHours};
use crate::remuneraciones::tools::model::{Cell, Table};

/// Total-sheet rows joined with per-teacher hours. `hours[i]` belongs to
/// `table.rows[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTable {
    pub table: Table,
    pub hours: Vec<TeacherHours>,
}

impl CombinedTable {
    /// Appends a derived column to the joined table.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Cell>) {
        self.table.push_column(name, values);
    }

    /// Sorts rows by `(Rut, Nombre)` of the joined teacher.
    pub fn sort_by_teacher(&mut self) {
        let mut pairs: Vec<(Vec<Cell>, TeacherHours)> = std::mem::take(&mut self.table.rows)
            .into_iter()
            .zip(std::mem::take(&mut self.hours))
            .collect();
        pairs.sort_by(|(_, lhs), (_, rhs)| {
            lhs.rut
                .sort_cmp(&rhs.rut)
                .then_with(|| lhs.nombre.sort_cmp(&rhs.nombre))
        });
        let (rows, hours): (Vec<Vec<Cell>>, Vec<TeacherHours>) = pairs.into_iter().unzip();
        self.table.rows = rows;
        self.hours = hours;
    }
}

/// Left join of the total sheet against per-teacher hours on `Rut`.
///
/// Every total row survives. A Rut with several teachers (name variants)
/// yields one row per teacher; a Rut with none gets zero hours. The joined
/// `Nombre`, program-hour and total-hour columns are appended; header
/// clashes get `_x` on the total side and `_y` on the hours side.
pub fn left_join(total: &Table, teachers: &[TeacherHours], programs: &[&str]) -> CombinedTable {
    let rut_idx = total.column_index(RUT);

    let mut appended: Vec<String> = Vec::with_capacity(programs.len() + 2);
    appended.push(NOMBRE.to_string());
    appended.extend(programs.iter().map(|program| program.to_string()));
    appended.push(TOTAL_HOURS_COLUMN.to_string());

    let mut columns: Vec<String> = total
        .columns
        .iter()
        .map(|column| {
            if column != RUT && appended.contains(column) {
                format!("{column}_x")
            } else {
                column.clone()
            }
        })
        .collect();
    columns.extend(appended.iter().map(|column| {
        if total.has_column(column) {
            format!("{column}_y")
        } else {
            column.clone()
        }
    }));

    let mut by_rut: HashMap<String, Vec<&TeacherHours>> = HashMap::new();
    for teacher in teachers {
        by_rut.entry(teacher.rut.key()).or_default().push(teacher);
    }

    let mut table = Table::new(total.sheet_name.clone(), columns);
    let mut hours = Vec::with_capacity(total.len());
    let mut unmatched = 0usize;
    for (row_idx, cells) in total.rows.iter().enumerate() {
        let rut = rut_idx
            .map(|idx| total.cell(row_idx, idx).clone())
            .unwrap_or_default();
        let matches: Vec<TeacherHours> = match by_rut.get(&rut.key()) {
            Some(found) if !rut.is_empty() => found.iter().map(|&teacher| teacher.clone()).collect(),
            _ => {
                unmatched += 1;
                vec![TeacherHours::unmatched(rut.clone(), programs.len())]
            }
        };

        for teacher in matches {
            let mut row = cells.clone();
            row.push(teacher.nombre.clone());
            row.extend(teacher.program_hours.iter().map(|&value| Cell::Number(value)));
            row.push(Cell::Number(teacher.total));
            table.push_row(row);
            hours.push(teacher);
        }
    }

    info!(rows = table.len(), unmatched, "total sheet joined with hours");
    CombinedTable { table, hours }
}
