use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::remuneraciones::tools::error::Result;

/// Column catalog shipped with the binary.
const DEFAULT_CATALOG: &str = include_str!("../../../config/catalog.json");

/// Statutory weekly hour cap per teacher.
pub const DEFAULT_HOUR_LIMIT: f64 = 44.0;

/// Known monetary column names, kept as data so payroll staff can version
/// them without touching the apportionment code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Columns apportioned by `SEP` hours in single-program mode.
    pub single_program: Vec<String>,
    /// Columns split into one output per program in dual-program mode.
    pub dual_program_split: Vec<String>,
    /// Columns apportioned against the combined `PIE + SN` hours.
    pub dual_program_combined: Vec<String>,
}

impl Catalog {
    /// Parses a catalog document and drops repeated names, keeping the
    /// first occurrence of each.
    pub fn from_json(source: &str) -> Result<Self> {
        let mut catalog: Catalog = serde_json::from_str(source)?;
        dedupe(&mut catalog.single_program);
        dedupe(&mut catalog.dual_program_split);
        dedupe(&mut catalog.dual_program_combined);
        Ok(catalog)
    }

    /// Reads and parses a catalog document from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    /// Returns the catalog compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_json_or_empty(DEFAULT_CATALOG)
    }

    fn from_json_or_empty(source: &str) -> Self {
        Self::from_json(source).unwrap_or_else(|err| {
            error!(error = %err, "column catalog is invalid, no column will be apportioned");
            Catalog {
                single_program: Vec::new(),
                dual_program_split: Vec::new(),
                dual_program_combined: Vec::new(),
            }
        })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn dedupe(names: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    names.retain(|name| seen.insert(name.clone()));
}

/// Bounded, fixed-delay retry for files held open by another program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub attempts: u32,
    /// Sleep between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Everything a pipeline run needs besides its file paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub catalog: Catalog,
    pub retry: RetryPolicy,
    pub hour_limit: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: Catalog::builtin(),
            retry: RetryPolicy::default(),
            hour_limit: DEFAULT_HOUR_LIMIT,
        }
    }
}
