//! Error types for the Metre processing pipeline.
//!
//! One error type per layer:
//!
//! - [`SheetError`] - the input bytes could not be read as a sheet
//! - [`ColumnError`] - a required column is absent from the sheet
//! - [`ExportError`] - the output workbook could not be written
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Sheet Reading Errors
// =============================================================================

/// Errors while turning uploaded bytes into a dataset.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook container could not be parsed.
    #[error("Error reading Excel file: {0}")]
    Workbook(String),

    /// Delimited text could not be parsed.
    #[error("Error reading CSV file: {0}")]
    Delimited(String),

    /// Failed to decode text content.
    #[error("Failed to decode file content as {0}")]
    Encoding(String),

    /// The workbook has no worksheet.
    #[error("Workbook contains no sheets")]
    NoSheets,

    /// Empty input or first sheet without a header row.
    #[error("File is empty")]
    EmptyFile,
}

impl From<calamine::Error> for SheetError {
    fn from(err: calamine::Error) -> Self {
        SheetError::Workbook(err.to_string())
    }
}

impl From<csv::Error> for SheetError {
    fn from(err: csv::Error) -> Self {
        SheetError::Delimited(err.to_string())
    }
}

// =============================================================================
// Column Errors
// =============================================================================

/// A column the transform depends on is not present.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnError {
    #[error("Error: '{0}' column not found in the file.")]
    MissingColumn(String),
}

impl ColumnError {
    /// Name of the column this error is about.
    pub fn column(&self) -> &str {
        match self {
            ColumnError::MissingColumn(name) => name,
        }
    }
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing the output workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Sheet has {0} columns, more than a worksheet can hold")]
    TooManyColumns(usize),

    #[error("Sheet has {0} rows, more than a worksheet can hold")]
    TooManyRows(usize),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::process_bytes`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input could not be read.
    #[error("{0}")]
    Sheet(#[from] SheetError),

    /// `Hoeveelheid` is missing, so no row can be filtered.
    #[error("{}", join_messages(.0))]
    Columns(Vec<ColumnError>),

    /// Output workbook could not be written.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_messages(errors: &[ColumnError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for sheet reading.
pub type SheetResult<T> = Result<T, SheetError>;

/// Result type for workbook export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type ProcessResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
