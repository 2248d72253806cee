use std::fmt;
use std::str::FromStr;

use crate::remuneraciones::tools::config::Catalog;
use crate::remuneraciones::tools::error::ToolError;

/// How a monetary column is distributed in a given mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPolicy {
    /// One output per program, each weighted by that program's hours.
    SplitPerProgram,
    /// A single output weighted by the sum of every program's hours.
    CombinedOnly,
}

/// Which hours an apportioned output is weighted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    /// Hours of the program at this index of [`Mode::programs`].
    Program(usize),
    /// Sum of all program hours on the row.
    Combined,
}

/// Apportionment variant. Both variants share loading, aggregation and
/// validation; they differ in the program-hour columns and in how the
/// monetary columns fan out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `SEP`: one program, one output per monetary column.
    SingleProgram,
    /// `PIE`: `PIE` and `SN` hours; six columns split per program, the
    /// rest apportioned against the combined hours.
    DualProgram,
}

impl Mode {
    /// Short label used in status messages.
    pub fn label(self) -> &'static str {
        match self {
            Mode::SingleProgram => "SEP",
            Mode::DualProgram => "PIE",
        }
    }

    /// Program-hour columns read from the hours sheet.
    pub fn programs(self) -> &'static [&'static str] {
        match self {
            Mode::SingleProgram => &["SEP"],
            Mode::DualProgram => &["PIE", "SN"],
        }
    }

    /// Per-column policy table, in output order.
    pub fn policies(self, catalog: &Catalog) -> Vec<(String, ColumnPolicy)> {
        match self {
            Mode::SingleProgram => catalog
                .single_program
                .iter()
                .map(|column| (column.clone(), ColumnPolicy::SplitPerProgram))
                .collect(),
            // Split columns first, then the ones weighted by combined hours.
            Mode::DualProgram => catalog
                .dual_program_split
                .iter()
                .map(|column| (column.clone(), ColumnPolicy::SplitPerProgram))
                .chain(
                    catalog
                        .dual_program_combined
                        .iter()
                        .map(|column| (column.clone(), ColumnPolicy::CombinedOnly)),
                )
                .collect(),
        }
    }

    /// Output columns produced for `column` under `policy`.
    pub fn outputs(self, column: &str, policy: ColumnPolicy) -> Vec<(String, Weight)> {
        match (self, policy) {
            (_, ColumnPolicy::CombinedOnly) => {
                vec![(format!("{column}_nuevo"), Weight::Combined)]
            }
            (Mode::SingleProgram, ColumnPolicy::SplitPerProgram) => self
                .programs()
                .iter()
                .enumerate()
                .map(|(idx, program)| (format!("{column}_{program}"), Weight::Program(idx)))
                .collect(),
            (Mode::DualProgram, ColumnPolicy::SplitPerProgram) => self
                .programs()
                .iter()
                .enumerate()
                .map(|(idx, program)| (format!("{column} {program}"), Weight::Program(idx)))
                .collect(),
        }
    }

    /// Extra column holding the per-row sum of program hours.
    pub fn row_sum_column(self) -> Option<&'static str> {
        match self {
            Mode::SingleProgram => None,
            Mode::DualProgram => Some("SUMA POR FILA"),
        }
    }

    /// Boolean column flagging rows within the hour cap.
    pub fn validity_column(self) -> Option<&'static str> {
        match self {
            Mode::SingleProgram => Some("HORAS_VALIDAS"),
            Mode::DualProgram => None,
        }
    }

    /// Whether output rows are sorted by `(Rut, Nombre)`.
    pub fn sorts_output(self) -> bool {
        matches!(self, Mode::DualProgram)
    }
}

impl FromStr for Mode {
    type Err = ToolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sep" | "single" | "single-program" => Ok(Mode::SingleProgram),
            "pie" | "dual" | "dual-program" => Ok(Mode::DualProgram),
            _ => Err(ToolError::UnrecognizedMode(value.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
