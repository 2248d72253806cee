use std::cmp::Ordering;
use std::fmt;

/// A single spreadsheet value as the pipelines see it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Blank cell. Numeric code paths treat it as not-a-number.
    #[default]
    Empty,
    /// Floating point number; Excel stores every number this way.
    Number(f64),
    /// Plain string value.
    Text(String),
    /// Boolean value.
    Bool(bool),
}

impl Cell {
    /// Returns the numeric value of the cell, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            Cell::Text(value) => value.trim().parse::<f64>().ok(),
            Cell::Empty => None,
        }
    }

    /// True for blank cells and whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }

    /// Normalised text used when cells act as join or grouping keys.
    /// Integral numbers drop their decimal part so `12345678` read as a
    /// float still matches the same identifier stored as text.
    pub fn key(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            Cell::Number(value) => value.to_string(),
            Cell::Text(value) => value.trim().to_string(),
            Cell::Bool(value) => value.to_string(),
        }
    }

    /// Ordering used for sorting output rows: numbers first, then text,
    /// blanks last.
    pub fn sort_cmp(&self, other: &Cell) -> Ordering {
        fn rank(cell: &Cell) -> u8 {
            match cell {
                Cell::Number(_) | Cell::Bool(_) => 0,
                Cell::Text(_) => 1,
                Cell::Empty => 2,
            }
        }

        match (self, other) {
            (Cell::Text(lhs), Cell::Text(rhs)) => lhs.cmp(rhs),
            (Cell::Empty, Cell::Empty) => Ordering::Equal,
            _ => match (self.as_number_strict(), other.as_number_strict()) {
                (Some(lhs), Some(rhs)) => lhs.total_cmp(&rhs),
                _ => rank(self).cmp(&rank(other)),
            },
        }
    }

    fn as_number_strict(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(_) => write!(f, "{}", self.key()),
            Cell::Text(value) => write!(f, "{value}"),
            Cell::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

/// A sheet held in memory: an ordered header row plus data rows. Every row
/// has exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given headers.
    pub fn new(sheet_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the header equal to `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Whether a header equal to `name` exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Returns the required columns that the table does not carry.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Renames the first header equal to `from`. Returns whether a rename
    /// happened.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Appends a column. `values` must hold one cell per row.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Returns the cell at `row`/`column`, or an empty cell when out of range.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY)
    }

    /// Stable sort of the rows by the given column indices.
    pub fn sort_by_columns(&mut self, columns: &[usize]) {
        self.rows.sort_by(|lhs, rhs| {
            columns.iter().fold(Ordering::Equal, |acc, &idx| {
                acc.then_with(|| lhs[idx].sort_cmp(&rhs[idx]))
            })
        });
    }
}
