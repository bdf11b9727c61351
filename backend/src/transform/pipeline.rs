//! High-level pipeline API: uploaded sheet in, processed workbook out.
//!
//! Combines parsing, the row transform, and xlsx export, reporting each step
//! through the log broadcaster.
//!
//! # Example
//!
//! ```rust,ignore
//! use metre::{process_file, ProcessOptions};
//!
//! let result = process_file("Meetstaat.xlsx".as_ref(), &ProcessOptions::default())?;
//! std::fs::write(&result.file_name, &result.output)?;
//! ```

use serde::Serialize;
use std::path::Path;

use super::rows::{transform, Transformed};
use crate::api::logs::JobLog;
use crate::config::ProcessOptions;
use crate::error::{ColumnError, PipelineError, ProcessResult};
use crate::export::{processed_file_name, write_xlsx};
use crate::models::Dataset;
use crate::parser::{parse_bytes, ParsedSheet, SheetFormat};

/// Name used when the upload carries no file name.
const DEFAULT_UPLOAD_NAME: &str = "upload.xlsx";

/// Result of a complete processing run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Job id carried by every log entry of this run
    pub job_id: String,

    /// Processed rows, exactly as written to `output`
    pub dataset: Dataset,

    /// The output workbook
    pub output: Vec<u8>,

    /// Suggested name for `output`
    pub file_name: String,

    /// Missing columns whose derived columns were skipped
    pub warnings: Vec<ColumnError>,

    /// Rows removed by the quantity filter
    pub dropped_rows: usize,

    /// Input sheet metadata
    pub sheet_info: SheetInfo,
}

impl PipelineResult {
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}

/// Input sheet information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfo {
    pub format: SheetFormat,
    pub sheet_name: String,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    pub columns: Vec<String>,
    pub row_count: usize,
}

impl From<&ParsedSheet> for SheetInfo {
    fn from(parsed: &ParsedSheet) -> Self {
        Self {
            format: parsed.format,
            sheet_name: parsed.sheet_name.clone(),
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            columns: parsed.dataset.columns().to_vec(),
            row_count: parsed.dataset.row_count(),
        }
    }
}

/// Process a sheet file from disk.
pub fn process_file(path: &Path, options: &ProcessOptions) -> ProcessResult<PipelineResult> {
    let bytes = std::fs::read(path)?;
    let name = path.file_name().and_then(|n| n.to_str());
    process_bytes(&bytes, name, options)
}

/// Process uploaded bytes.
///
/// `file_name` picks the input format and names the output.
pub fn process_bytes(
    bytes: &[u8],
    file_name: Option<&str>,
    options: &ProcessOptions,
) -> ProcessResult<PipelineResult> {
    let log = JobLog::new();
    log.info(format!(
        "📄 NEW UPLOAD: {} ({} bytes)",
        file_name.unwrap_or("upload"),
        bytes.len()
    ));

    let parsed = parse_bytes(bytes, file_name).map_err(|e| {
        log.error(e.to_string());
        e
    })?;
    let sheet_info = SheetInfo::from(&parsed);
    log_sheet_info(&log, &sheet_info);

    let output_name = processed_file_name(&xlsx_source_name(file_name.unwrap_or(DEFAULT_UPLOAD_NAME)));
    run(&log, &parsed.dataset, sheet_info, output_name, options)
}

/// Transform and export an already-parsed dataset.
pub fn process_dataset(
    dataset: &Dataset,
    sheet_info: SheetInfo,
    file_name: String,
    options: &ProcessOptions,
) -> ProcessResult<PipelineResult> {
    run(&JobLog::new(), dataset, sheet_info, file_name, options)
}

fn run(
    log: &JobLog,
    dataset: &Dataset,
    sheet_info: SheetInfo,
    file_name: String,
    options: &ProcessOptions,
) -> ProcessResult<PipelineResult> {
    log.info(format!(
        "⚙️  Transforming with element query parameter '{}'...",
        options.element_query_param
    ));

    let Transformed { dataset, missing, dropped_rows } =
        transform(dataset, &options.element_query_param).map_err(|errors| {
            for err in &errors {
                log.error(err.to_string());
            }
            PipelineError::Columns(errors)
        })?;

    for warning in &missing {
        log.warning(warning.to_string());
    }
    if dropped_rows > 0 {
        log.warning(format!("{} rows dropped (empty or zero Hoeveelheid)", dropped_rows));
    }
    log.success(format!(
        "{} rows kept, {} columns",
        dataset.row_count(),
        dataset.columns().len()
    ));

    log.info("💾 Writing workbook...");
    let output = write_xlsx(&dataset).map_err(|e| {
        log.error(e.to_string());
        e
    })?;
    log.success(format!("{} ({} bytes)", file_name, output.len()));

    Ok(PipelineResult {
        job_id: log.job_id().to_string(),
        dataset,
        output,
        file_name,
        warnings: missing,
        dropped_rows,
        sheet_info,
    })
}

/// The output is always xlsx, so other extensions are swapped before the
/// processed suffix is added.
fn xlsx_source_name(name: &str) -> String {
    let path = Path::new(name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("xlsx") => name.to_string(),
        _ => path.with_extension("xlsx").to_string_lossy().into_owned(),
    }
}

fn log_sheet_info(log: &JobLog, info: &SheetInfo) {
    match info.format {
        SheetFormat::Workbook => log.success(format!("Sheet: {}", info.sheet_name)),
        SheetFormat::Delimited => log.success(format!(
            "Delimited text, encoding {}, separator '{}'",
            info.encoding.as_deref().unwrap_or("?"),
            format_delimiter(info.delimiter.unwrap_or(','))
        )),
    }
    log.success(format!("Read {} rows", info.row_count));
    log.info(format!("📋 {} columns: {}", info.columns.len(), info.columns.join(", ")));
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
