//! Output workbook writing and naming.
//!
//! The processed dataset is written as a single worksheet named
//! [`OUTPUT_SHEET_NAME`]: one header row, then one row per record, no index
//! column.

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

use crate::error::{ExportError, ExportResult};
use crate::models::{CellValue, Dataset};

/// Name of the only sheet in the output workbook.
pub const OUTPUT_SHEET_NAME: &str = "Filtered Data";

/// MIME type of the output workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Suffix added to the base name of the uploaded file.
pub const PROCESSED_SUFFIX: &str = " Processed";

const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Serialize `dataset` to xlsx bytes.
pub fn write_xlsx(dataset: &Dataset) -> ExportResult<Vec<u8>> {
    if dataset.columns().len() > MAX_COLS {
        return Err(ExportError::TooManyColumns(dataset.columns().len()));
    }
    // +1 for the header row
    if dataset.row_count() + 1 > MAX_ROWS {
        return Err(ExportError::TooManyRows(dataset.row_count()));
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET_NAME)?;

    write_header(worksheet, dataset.columns())?;

    for (row_idx, row) in dataset.rows().iter().enumerate() {
        let row32 = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(worksheet, row32, col_idx as u16, cell)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_header(worksheet: &mut Worksheet, columns: &[String]) -> ExportResult<()> {
    let bold = Format::new().set_bold();
    for (col_idx, name) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, name, &bold)?;
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> ExportResult<()> {
    match cell {
        CellValue::Null => {}
        CellValue::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(f) if f.is_finite() => {
            worksheet.write_number(row, col, *f)?;
        }
        // NaN and infinities have no xlsx number form
        CellValue::Float(_) => {}
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

/// Suggested name for the processed file: `<base> Processed<.ext>`.
///
/// Any directory part of `original` is dropped.
pub fn processed_file_name(original: &str) -> String {
    let file = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(original);

    match file.rfind('.') {
        // A leading dot is a hidden-file name, not an extension
        Some(dot) if dot > 0 => {
            let (base, ext) = file.split_at(dot);
            format!("{}{}{}", base, PROCESSED_SUFFIX, ext)
        }
        _ => format!("{}{}", file, PROCESSED_SUFFIX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_bytes;

    #[test]
    fn test_processed_file_name() {
        assert_eq!(processed_file_name("Meetstaat.xlsx"), "Meetstaat Processed.xlsx");
        assert_eq!(processed_file_name("uploads/Project 12.v2.xlsx"), "Project 12.v2 Processed.xlsx");
        assert_eq!(processed_file_name("Meetstaat"), "Meetstaat Processed");
        assert_eq!(processed_file_name(".hidden"), ".hidden Processed");
    }

    #[test]
    fn test_written_workbook_reads_back() {
        let ds = Dataset::new(
            vec!["Hoeveelheid".into(), "Hours".into(), "Quantity Type".into(), "Note".into()],
            vec![
                vec![CellValue::Int(10), CellValue::Float(0.1), "Volume".into(), CellValue::Null],
                vec![CellValue::Float(2.5), CellValue::Int(4), "Area".into(), CellValue::Bool(true)],
            ],
        );

        let bytes = write_xlsx(&ds).unwrap();
        let parsed = parse_bytes(&bytes, Some("out.xlsx")).unwrap();

        assert_eq!(parsed.sheet_name, OUTPUT_SHEET_NAME);
        let back = parsed.dataset;
        assert_eq!(back.columns(), ds.columns());
        assert_eq!(back.row_count(), 2);
        assert_eq!(back.get(0, "Hours").and_then(CellValue::as_f64), Some(0.1));
        assert_eq!(back.get(0, "Note"), Some(&CellValue::Null));
        assert_eq!(back.get(1, "Quantity Type"), Some(&CellValue::Text("Area".into())));
        assert_eq!(back.get(1, "Note"), Some(&CellValue::Bool(true)));
    }

    #[test]
    fn test_header_only_workbook() {
        let ds = Dataset::new(vec!["Hoeveelheid".into()], vec![]);
        let bytes = write_xlsx(&ds).unwrap();
        let parsed = parse_bytes(&bytes, Some("out.xlsx")).unwrap();
        assert_eq!(parsed.dataset.columns(), ["Hoeveelheid"]);
        assert!(parsed.dataset.is_empty());
    }
}
