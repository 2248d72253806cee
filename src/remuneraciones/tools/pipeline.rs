use std::path::Path;

use tracing::{error, info, instrument};

use crate::remuneraciones::tools::apportion::{self, ApportionReport};
use crate::remuneraciones::tools::config::Settings;
use crate::remuneraciones::tools::error::Result;
use crate::remuneraciones::tools::hours::{self, NOMBRE, RUT};
use crate::remuneraciones::tools::io::excel_read::{self, SheetRequest};
use crate::remuneraciones::tools::io::excel_write;
use crate::remuneraciones::tools::merge;
use crate::remuneraciones::tools::mode::Mode;
use crate::remuneraciones::tools::model::Table;
use crate::remuneraciones::tools::validate::{self, OvertimeViolation};

/// Sheet holding the per-program hours of each teacher.
pub const HOURS_SHEET: &str = "HORAS";
/// Sheet holding the compensation line items of each teacher.
pub const TOTAL_SHEET: &str = "TOTAL";

/// Progress sink: percentage (non-decreasing within a run) and a status line.
pub type Progress<'a> = dyn FnMut(u8, &str) + 'a;

/// Result of an in-memory apportionment run.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub table: Table,
    pub report: ApportionReport,
    pub violations: Vec<OvertimeViolation>,
}

/// Parses `mode` before touching the file system, then runs [`process`].
pub fn process_named(
    mode: &str,
    input: &Path,
    output: &Path,
    settings: &Settings,
    progress: &mut Progress<'_>,
) -> Result<()> {
    let mode: Mode = mode.parse()?;
    process(mode, input, output, settings, progress)
}

/// Reads the `HORAS` and `TOTAL` sheets of `input`, apportions every
/// catalog column present, and writes the result to `output`.
#[instrument(
    level = "info",
    skip_all,
    fields(%mode, input = %input.display(), output = %output.display())
)]
pub fn process(
    mode: Mode,
    input: &Path,
    output: &Path,
    settings: &Settings,
    progress: &mut Progress<'_>,
) -> Result<()> {
    let result = run(mode, input, output, settings, progress);
    if let Err(err) = &result {
        error!(error = %err, detail = ?err, "salary pipeline failed");
    }
    result
}

fn run(
    mode: Mode,
    input: &Path,
    output: &Path,
    settings: &Settings,
    progress: &mut Progress<'_>,
) -> Result<()> {
    progress(0, &format!("Iniciando proceso {mode}..."));
    let (hours, total) = load_workbook(input, mode, settings)?;
    progress(20, "Datos cargados, procesando...");

    let outcome = transform(&hours, &total, mode, settings, progress)?;

    progress(90, &format!("Exportando datos {mode}..."));
    excel_write::write_table(output, &outcome.table, settings.retry)?;
    info!(rows = outcome.table.len(), "salary pipeline finished");
    progress(100, &format!("Proceso {mode} completado!"));
    Ok(())
}

/// Loads both sheets in one pass over the workbook.
pub fn load_workbook(input: &Path, mode: Mode, settings: &Settings) -> Result<(Table, Table)> {
    let mut hours_required = vec![RUT, NOMBRE];
    hours_required.extend_from_slice(mode.programs());
    let total_required = [RUT];

    let mut tables = excel_read::read_sheets(
        input,
        &[
            SheetRequest {
                name: HOURS_SHEET,
                required: &hours_required,
            },
            SheetRequest {
                name: TOTAL_SHEET,
                required: &total_required,
            },
        ],
        settings.retry,
    )?
    .into_iter();

    let hours = tables.next().unwrap_or_default();
    let total = tables.next().unwrap_or_default();
    Ok((hours, total))
}

/// Aggregates hours, joins them onto the total sheet, apportions and
/// validates. Pure apart from logging; emits the 50 and 70 milestones.
pub fn transform(
    hours: &Table,
    total: &Table,
    mode: Mode,
    settings: &Settings,
    progress: &mut Progress<'_>,
) -> Result<Outcome> {
    let rows = hours::aggregate(hours, mode.programs())?;
    let teachers = hours::collapse(&rows);
    let mut combined = merge::left_join(total, &teachers, mode.programs());

    progress(50, &format!("Calculando salarios y beneficios {mode}..."));
    let report = apportion::apportion(&mut combined, mode, &settings.catalog);

    progress(70, "Validando horas...");
    let violations = validate::find_overtime(&combined, settings.hour_limit);
    if let Some(column) = mode.validity_column() {
        let flags = validate::validity_flags(&combined, settings.hour_limit);
        combined.push_column(column, flags);
    }
    if mode.sorts_output() {
        combined.sort_by_teacher();
    }

    Ok(Outcome {
        table: combined.table,
        report,
        violations,
    })
}
