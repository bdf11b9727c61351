//! # Metre - measurement sheet processing
//!
//! Metre takes a bill-of-quantities sheet (`Hoeveelheid`, `Hours`,
//! `Meeteenheid`, `ID Klant`), drops the rows without a quantity, derives
//! production and classification columns, and writes the result to a new
//! workbook ready for import.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ xlsx / csv  │────▶│   Parser    │────▶│  Transform  │────▶│    xlsx     │
//! │  (upload)   │     │ (calamine)  │     │ (row rules) │     │ "Processed" │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use metre::{process_file, ProcessOptions};
//!
//! let result = process_file("Meetstaat.xlsx".as_ref(), &ProcessOptions::default())?;
//! println!("{} rows kept, {} dropped", result.dataset.row_count(), result.dropped_rows);
//! std::fs::write(&result.file_name, &result.output)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cell values, datasets and quantity categories
//! - [`parser`] - Workbook and delimited-text reading
//! - [`transform`] - Unit table, row transformer and pipeline
//! - [`export`] - xlsx writing and output naming
//! - [`config`] - Processing options and environment overrides
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;
pub mod config;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ColumnError,
    ExportError,
    PipelineError,
    ServerError,
    SheetError,
    SheetResult,
    ExportResult,
    ProcessResult,
    ServerResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    columns,
    CellValue,
    Dataset,
    QuantityType,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{ProcessOptions, port_from_env};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    parse_bytes,
    parse_file,
    detect_format,
    detect_encoding,
    detect_delimiter,
    decode_content,
    ParsedSheet,
    SheetFormat,
};

// =============================================================================
// Re-exports - Row transform
// =============================================================================

pub use transform::{
    transform,
    missing_columns,
    daily_output,
    elemental_query,
    lookup_unit,
    quantity_type,
    units_description,
    Transformed,
    UNIT_CATEGORIES,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{processed_file_name, write_xlsx, OUTPUT_SHEET_NAME, XLSX_MIME};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    process_file,
    process_bytes,
    process_dataset,
    PipelineResult,
    SheetInfo,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{
    PreviewResponse,
    PreviewMetadata,
    error_response,
};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
