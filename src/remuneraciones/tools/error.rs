use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(windows)]
const LOCK_HINT: &str = "; close it in Excel and try again";
#[cfg(not(windows))]
const LOCK_HINT: &str = "";

/// Error type covering the different failure cases that can occur when the
/// tool loads, apportions, or writes payroll workbooks.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the column catalog cannot be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::Error),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    NotFound(PathBuf),

    /// Raised when the input is not a spreadsheet the loader understands.
    #[error("invalid file format for {0}: expected .xlsx or .xls")]
    InvalidFormat(PathBuf),

    /// Raised when the input file has zero bytes.
    #[error("the file {0} is empty")]
    EmptyFile(PathBuf),

    /// Raised when a workbook lacks a sheet the pipeline reads.
    #[error("missing sheet '{0}'")]
    MissingSheet(String),

    /// Raised when a sheet lacks one or more required columns.
    #[error("sheet {sheet} is missing column(s): {}", .columns.join(", "))]
    MissingColumns { sheet: String, columns: Vec<String> },

    /// Raised when a file stays locked by another process after every retry.
    #[error("the file {} is in use by another program{}", .path.display(), LOCK_HINT)]
    Locked { path: PathBuf },

    /// Raised when the caller asks for a processing mode that does not exist.
    #[error("unrecognized processing mode '{0}' (expected 'sep' or 'pie')")]
    UnrecognizedMode(String),

    /// Raised when a single monetary column cannot be apportioned. The
    /// apportioner logs and swallows this error.
    #[error("cannot apportion column '{column}': {reason}")]
    Column { column: String, reason: String },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ToolError {
    /// Returns true when the error signals that another process holds the
    /// file, which is the only failure the retry loop waits out.
    pub fn is_lock_conflict(&self) -> bool {
        match self {
            ToolError::Locked { .. } => true,
            ToolError::Io(err) => is_lock_io(err),
            ToolError::ExcelRead(calamine::Error::Io(err)) => is_lock_io(err),
            ToolError::ExcelRead(calamine::Error::Xlsx(calamine::XlsxError::Io(err))) => {
                is_lock_io(err)
            }
            ToolError::ExcelRead(calamine::Error::Xls(calamine::XlsError::Io(err))) => {
                is_lock_io(err)
            }
            ToolError::ExcelWrite(rust_xlsxwriter::XlsxError::IoError(err)) => is_lock_io(err),
            _ => false,
        }
    }
}

// 32/33 are the Windows sharing and lock violation codes.
fn is_lock_io(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::PermissionDenied || matches!(err.raw_os_error(), Some(32 | 33))
}
