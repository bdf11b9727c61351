//! Workbook reading (xlsx, xlsm, xlsb, xls, ods) via calamine.
//!
//! Only the first worksheet is read. Its first used row is the header.

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;

use super::header_names;
use crate::error::{SheetError, SheetResult};
use crate::models::{CellValue, Dataset};

/// First sheet of a workbook as a dataset, with the sheet's name.
pub fn read_first_sheet(bytes: &[u8]) -> SheetResult<(Dataset, String)> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SheetError::NoSheets)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::NoSheets)??;

    Ok((range_to_dataset(&range)?, sheet_name))
}

/// Turn a cell range into a dataset: header row, then data rows.
///
/// Rows where every cell is empty are skipped.
pub fn range_to_dataset(range: &Range<Data>) -> SheetResult<Dataset> {
    let mut rows = range.rows();

    let header = rows.next().ok_or(SheetError::EmptyFile)?;
    let header: Vec<CellValue> = header.iter().map(cell_value).collect();
    let columns = header_names(&header);

    let records = rows
        .map(|row| row.iter().map(cell_value).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(CellValue::is_null))
        .collect();

    Ok(Dataset::new(columns, records))
}

/// Map a calamine cell to a [`CellValue`].
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        // Error cells (#DIV/0!, #N/A, ...) read as missing values
        Data::Error(_) => CellValue::Null,
        // Excel serial date, kept numeric
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_to_dataset() {
        let mut range = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("Hoeveelheid".into()));
        range.set_value((0, 1), Data::String("Meeteenheid".into()));
        range.set_value((0, 2), Data::String("ID Klant".into()));
        range.set_value((1, 0), Data::Float(12.5));
        range.set_value((1, 1), Data::String("m2".into()));
        range.set_value((1, 2), Data::Int(1001));
        // row 2 left empty

        let ds = range_to_dataset(&range).unwrap();
        assert_eq!(ds.columns(), ["Hoeveelheid", "Meeteenheid", "ID Klant"]);
        assert_eq!(ds.row_count(), 1);
        assert_eq!(ds.get(0, "Hoeveelheid"), Some(&CellValue::Float(12.5)));
        assert_eq!(ds.get(0, "ID Klant"), Some(&CellValue::Int(1001)));
    }

    #[test]
    fn test_empty_strings_are_null() {
        assert_eq!(cell_value(&Data::String(String::new())), CellValue::Null);
        assert_eq!(cell_value(&Data::Empty), CellValue::Null);
    }

    #[test]
    fn test_garbage_bytes_are_a_workbook_error() {
        let err = read_first_sheet(b"PK\x03\x04 definitely not a zip").unwrap_err();
        assert!(matches!(err, SheetError::Workbook(_)));
    }
}
