//! Sheet parsing: uploaded bytes to a [`Dataset`].
//!
//! Workbooks (xlsx, xls, ods, ...) are read with calamine; anything that is
//! not a workbook container is read as delimited text.
//!
//! # Example
//! ```ignore
//! let parsed = parse_file("meetstaat.xlsx")?;
//! println!("{} rows from sheet {}", parsed.dataset.row_count(), parsed.sheet_name);
//! ```

pub mod delimited;
pub mod workbook;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::{SheetError, SheetResult};
use crate::models::{CellValue, Dataset};

pub use delimited::{decode_content, detect_delimiter, detect_encoding, parse_delimited};
pub use workbook::read_first_sheet;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Container format of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    /// Zip or OLE workbook container.
    Workbook,
    /// Delimited text.
    Delimited,
}

impl fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetFormat::Workbook => f.write_str("workbook"),
            SheetFormat::Delimited => f.write_str("delimited text"),
        }
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub dataset: Dataset,
    pub format: SheetFormat,
    /// Worksheet name, or the file stem for delimited text
    pub sheet_name: String,
    /// Detected text encoding (delimited text only)
    pub encoding: Option<String>,
    /// Detected delimiter (delimited text only)
    pub delimiter: Option<char>,
}

/// Decide how to read `bytes`, using magic numbers first and the file
/// extension second.
pub fn detect_format(bytes: &[u8], file_name: Option<&str>) -> SheetResult<SheetFormat> {
    if bytes.is_empty() {
        return Err(SheetError::EmptyFile);
    }
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        return Ok(SheetFormat::Workbook);
    }

    let extension = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        None | Some("csv") | Some("tsv") | Some("txt") => Ok(SheetFormat::Delimited),
        Some(ext) => Err(SheetError::Workbook(format!(
            "file with extension '.{}' is not a spreadsheet workbook",
            ext
        ))),
    }
}

/// Parse uploaded bytes. `file_name` is only used to pick the format.
pub fn parse_bytes(bytes: &[u8], file_name: Option<&str>) -> SheetResult<ParsedSheet> {
    match detect_format(bytes, file_name)? {
        SheetFormat::Workbook => {
            let (dataset, sheet_name) = read_first_sheet(bytes)?;
            Ok(ParsedSheet {
                dataset,
                format: SheetFormat::Workbook,
                sheet_name,
                encoding: None,
                delimiter: None,
            })
        }
        SheetFormat::Delimited => {
            let encoding = detect_encoding(bytes);
            let content = decode_content(bytes, &encoding)?;
            let delimiter = detect_delimiter(&content);
            let dataset = parse_delimited(&content, delimiter)?;
            let sheet_name = file_name
                .and_then(|name| Path::new(name).file_stem())
                .and_then(|stem| stem.to_str())
                .unwrap_or("Sheet1")
                .to_string();
            Ok(ParsedSheet {
                dataset,
                format: SheetFormat::Delimited,
                sheet_name,
                encoding: Some(encoding),
                delimiter: Some(delimiter),
            })
        }
    }
}

/// Read and parse a file from disk.
pub fn parse_file<P: AsRef<Path>>(path: P) -> SheetResult<ParsedSheet> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path.file_name().and_then(|n| n.to_str());
    parse_bytes(&bytes, name)
}

/// Column names from a header row.
///
/// Blank header cells become `Unnamed: <index>`. Repeated names get a
/// `.1`, `.2`, ... suffix so every column stays addressable.
pub fn header_names(header: &[CellValue]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(header.len());

    for (idx, cell) in header.iter().enumerate() {
        let base = match cell.to_string() {
            s if s.is_empty() => format!("Unnamed: {}", idx),
            s => s,
        };

        let mut name = base.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone(), 0);
        names.push(name);
    }

    names
}
