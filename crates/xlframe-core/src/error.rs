//! Error types for workbook operations.

use thiserror::Error;

/// Result type for workbook operations
pub type Result<T> = std::result::Result<T, XlError>;

/// Errors that can occur while validating, reading or exporting a workbook
#[derive(Debug, Error)]
pub enum XlError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Path does not carry a recognized spreadsheet extension
    #[error("File must be an Excel file (.xlsx or .xls)")]
    UnsupportedExtension(String),

    /// An argument failed a field-level constraint
    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: String,
    },

    /// Failed to open workbook
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    /// Workbook has no sheets to select by default
    #[error("Workbook contains no sheets")]
    NoSheets,

    /// Sheet not found in workbook
    #[error("Sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    /// A cell could not be represented in its column's inferred type
    #[error(
        "could not convert value at row {row} in column '{column}' to {expected} (found {found})"
    )]
    SchemaInference {
        column: String,
        row: usize,
        expected: String,
        found: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Calamine error
    #[error("Excel error: {0}")]
    Calamine(String),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON export error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Archive error while writing a workbook
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl XlError {
    /// Shorthand for an [`XlError::InvalidArgument`]
    pub fn invalid_argument(field: &'static str, reason: impl Into<String>) -> Self {
        XlError::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    /// True for failures raised before any library call
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            XlError::FileNotFound(_)
                | XlError::UnsupportedExtension(_)
                | XlError::InvalidArgument { .. }
        )
    }
}

impl From<calamine::Error> for XlError {
    fn from(err: calamine::Error) -> Self {
        XlError::Calamine(err.to_string())
    }
}

impl From<calamine::XlsxError> for XlError {
    fn from(err: calamine::XlsxError) -> Self {
        XlError::Calamine(err.to_string())
    }
}

impl From<calamine::XlsError> for XlError {
    fn from(err: calamine::XlsError) -> Self {
        XlError::Calamine(err.to_string())
    }
}
