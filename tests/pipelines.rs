use std::path::Path;

use remuneraciones_tools::config::{RetryPolicy, Settings};
use remuneraciones_tools::duplicates;
use remuneraciones_tools::io::excel_read::read_sheet;
use remuneraciones_tools::io::excel_write::OUTPUT_SHEET;
use remuneraciones_tools::model::{Cell, Table};
use remuneraciones_tools::pipeline;
use remuneraciones_tools::ToolError;
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

enum Value<'a> {
    Num(f64),
    Text(&'a str),
}

struct Sheet<'a> {
    name: &'a str,
    headers: &'a [&'a str],
    rows: Vec<Vec<Value<'a>>>,
}

fn write_workbook(path: &Path, sheets: &[Sheet<'_>]) {
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name).expect("sheet named");
        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).expect("header written");
        }
        for (row_idx, row) in sheet.rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                let (r, c) = ((row_idx + 1) as u32, col as u16);
                match value {
                    Value::Num(number) => worksheet.write_number(r, c, *number),
                    Value::Text(text) => worksheet.write_string(r, c, *text),
                }
                .expect("cell written");
            }
        }
    }
    workbook.save(path).expect("workbook saved");
}

fn read_output(path: &Path) -> Table {
    read_sheet(path, OUTPUT_SHEET, &[], RetryPolicy::default()).expect("output read")
}

fn value(table: &Table, row: usize, column: &str) -> Cell {
    let idx = table
        .column_index(column)
        .unwrap_or_else(|| panic!("missing column {column}"));
    table.rows[row][idx].clone()
}

fn sep_workbook(path: &Path) {
    use Value::{Num, Text};
    write_workbook(
        path,
        &[
            Sheet {
                name: "HORAS",
                headers: &["Rut", "Nombre", "SEP"],
                rows: vec![
                    vec![Num(1.0), Text("A"), Num(10.0)],
                    vec![Num(1.0), Text("A"), Num(20.0)],
                    vec![Num(2.0), Text("B"), Num(0.0)],
                ],
            },
            Sheet {
                name: "TOTAL",
                headers: &["Rut", "SUELDO BASE"],
                rows: vec![vec![Num(1.0), Num(3000.0)], vec![Num(2.0), Num(1000.0)]],
            },
        ],
    );
}

#[test]
fn single_program_workbook_is_apportioned() {
    let dir = tempdir().expect("temporary directory");
    let input = dir.path().join("remuneraciones.xlsx");
    let output = dir.path().join("resultado.xlsx");
    sep_workbook(&input);

    let mut milestones = Vec::new();
    pipeline::process_named("sep", &input, &output, &Settings::default(), &mut |p, _| {
        milestones.push(p)
    })
    .expect("pipeline ran");

    assert_eq!(milestones, vec![0, 20, 50, 70, 90, 100]);

    let table = read_output(&output);
    assert_eq!(table.len(), 2);
    assert_eq!(value(&table, 0, "TOTAL HORAS POR DOCENTE"), Cell::Number(30.0));
    assert_eq!(value(&table, 0, "SUELDO BASE_SEP"), Cell::Number(3000.0));
    assert_eq!(value(&table, 1, "Rut"), Cell::Number(2.0));
    assert_eq!(value(&table, 1, "TOTAL HORAS POR DOCENTE"), Cell::Number(0.0));
    assert_eq!(value(&table, 1, "SUELDO BASE_SEP"), Cell::Number(0.0));
    assert_eq!(value(&table, 0, "HORAS_VALIDAS"), Cell::Bool(true));
    assert!(!table.has_column("MUTUAL_SEP"));
}

#[test]
fn repeated_runs_produce_identical_tables() {
    let dir = tempdir().expect("temporary directory");
    let input = dir.path().join("remuneraciones.xlsx");
    let first = dir.path().join("first.xlsx");
    let second = dir.path().join("second.xlsx");
    sep_workbook(&input);

    for output in [&first, &second] {
        pipeline::process_named("sep", &input, output, &Settings::default(), &mut |_, _| {})
            .expect("pipeline ran");
    }

    assert_eq!(read_output(&first).rows, read_output(&second).rows);
}

#[test]
fn dual_program_workbook_accepts_lowercase_rut() {
    use Value::{Num, Text};
    let dir = tempdir().expect("temporary directory");
    let input = dir.path().join("pie.xlsx");
    let output = dir.path().join("pie_resultado.xlsx");
    write_workbook(
        &input,
        &[
            Sheet {
                name: "HORAS",
                headers: &["Rut", "Nombre", "PIE", "SN"],
                rows: vec![
                    vec![Num(5.0), Text("Eva"), Num(20.0), Num(5.0)],
                    vec![Num(4.0), Text("Dan"), Num(30.0), Num(0.0)],
                ],
            },
            Sheet {
                name: "TOTAL",
                headers: &["rut", "SUELDO BASE", "BONO VACACIONES"],
                rows: vec![
                    vec![Num(5.0), Num(2500.0), Num(250.0)],
                    vec![Num(4.0), Num(3000.0), Num(90.0)],
                ],
            },
        ],
    );

    pipeline::process_named("pie", &input, &output, &Settings::default(), &mut |_, _| {})
        .expect("pipeline ran");

    let table = read_output(&output);
    assert_eq!(value(&table, 0, "Rut"), Cell::Number(4.0));
    assert_eq!(value(&table, 0, "SUELDO BASE PIE"), Cell::Number(3000.0));
    assert_eq!(value(&table, 0, "SUELDO BASE SN"), Cell::Number(0.0));
    assert_eq!(value(&table, 1, "SUELDO BASE PIE"), Cell::Number(2000.0));
    assert_eq!(value(&table, 1, "SUELDO BASE SN"), Cell::Number(500.0));
    assert_eq!(value(&table, 1, "SUMA POR FILA"), Cell::Number(25.0));
    assert_eq!(value(&table, 1, "BONO VACACIONES_nuevo"), Cell::Number(250.0));
}

#[test]
fn missing_hours_column_aborts_with_sheet_name() {
    use Value::{Num, Text};
    let dir = tempdir().expect("temporary directory");
    let input = dir.path().join("incompleto.xlsx");
    let output = dir.path().join("resultado.xlsx");
    write_workbook(
        &input,
        &[
            Sheet { name: "HORAS", headers: &["Rut", "Nombre"], rows: vec![vec![Num(1.0), Text("A")]] },
            Sheet { name: "TOTAL", headers: &["Rut"], rows: vec![vec![Num(1.0)]] },
        ],
    );

    let result = pipeline::process_named("sep", &input, &output, &Settings::default(), &mut |_, _| {});
    match result {
        Err(ToolError::MissingColumns { sheet, columns }) => {
            assert_eq!(sheet, "HORAS");
            assert_eq!(columns, vec!["SEP"]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn missing_input_is_not_found() {
    let dir = tempdir().expect("temporary directory");
    let result = pipeline::process_named(
        "sep",
        &dir.path().join("nada.xlsx"),
        &dir.path().join("out.xlsx"),
        &Settings::default(),
        &mut |_, _| {},
    );
    assert!(matches!(result, Err(ToolError::NotFound(_))));
}

#[test]
fn duplicate_rows_are_consolidated() {
    use Value::{Num, Text};
    let dir = tempdir().expect("temporary directory");
    let primary = dir.path().join("consolidado.xlsx");
    let secondary = dir.path().join("complemento.xlsx");
    let output = dir.path().join("sin_duplicados.xlsx");
    let headers: &[&str] = &["DUPLICADOS", "Nombre", "Haberes", "Descuentos"];
    write_workbook(
        &primary,
        &[Sheet {
            name: "Hoja1",
            headers,
            rows: vec![
                vec![Num(20.0), Text("Rosa"), Num(100.0), Num(10.0)],
                vec![Num(10.0), Text("Luis"), Num(50.0), Num(5.0)],
                vec![Num(20.0), Text("Rosa M."), Num(40.0), Num(4.0)],
            ],
        }],
    );
    write_workbook(&secondary, &[Sheet { name: "Hoja1", headers, rows: vec![vec![Num(1.0)]] }]);

    let mut milestones = Vec::new();
    duplicates::process_duplicates(
        &primary,
        &secondary,
        &output,
        &Settings::default(),
        &mut |p, _| milestones.push(p),
    )
    .expect("duplicates processed");

    assert_eq!(milestones.first(), Some(&0));
    assert_eq!(milestones.last(), Some(&100));
    assert!(milestones.windows(2).all(|pair| pair[0] <= pair[1]));

    let table = read_output(&output);
    assert_eq!(table.len(), 2);
    assert_eq!(value(&table, 0, "DUPLICADOS"), Cell::Number(10.0));
    assert_eq!(value(&table, 1, "Nombre"), Cell::from("Rosa"));
    assert_eq!(value(&table, 1, "Haberes"), Cell::Number(140.0));
    assert_eq!(value(&table, 1, "Descuentos"), Cell::Number(14.0));
}

#[test]
fn duplicates_require_the_key_column() {
    use Value::Num;
    let dir = tempdir().expect("temporary directory");
    let primary = dir.path().join("a.xlsx");
    let secondary = dir.path().join("b.xlsx");
    write_workbook(&primary, &[Sheet { name: "Hoja1", headers: &["Rut"], rows: vec![vec![Num(1.0)]] }]);
    write_workbook(&secondary, &[Sheet { name: "Hoja1", headers: &["Rut"], rows: vec![vec![Num(1.0)]] }]);

    let result = duplicates::process_duplicates(
        &primary,
        &secondary,
        &dir.path().join("out.xlsx"),
        &Settings::default(),
        &mut |_, _| {},
    );
    assert!(matches!(result, Err(ToolError::MissingColumns { .. })));
}
