//! Domain models for the Metre processing pipeline.
//!
//! - [`CellValue`] - a single scalar cell (number, text, boolean or null)
//! - [`Dataset`] - an ordered table of rows sharing one header
//! - [`QuantityType`] - category of a measurement unit
//! - [`columns`] - names of the columns read and produced by the transform

use serde::{Serialize, Serializer};
use std::fmt;

// =============================================================================
// Column Names
// =============================================================================

/// Names of the input columns the transform reads and the columns it derives.
pub mod columns {
    /// Measured quantity.
    pub const QUANTITY: &str = "Hoeveelheid";
    /// Estimated hours for the line item.
    pub const HOURS: &str = "Hours";
    /// Unit code of the quantity.
    pub const UNIT: &str = "Meeteenheid";
    /// Client identifier.
    pub const CLIENT_ID: &str = "ID Klant";

    pub const DAILY_OUTPUT: &str = "Daily Output";
    pub const QUANTITY_TYPE: &str = "Quantity Type";
    pub const CLASSIFICATION_LEVEL: &str = "Classification Level";
    pub const OUTLINE_LEVEL: &str = "Outline Level";
    pub const ELEMENTAL_QUERY: &str = "Elemental Query";
}

// =============================================================================
// Cell Value
// =============================================================================

/// A scalar spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    /// Null cells and NaN floats are both treated as missing.
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// True for numeric zero. Text is never zero, even `"0"`.
    pub fn is_zero(&self) -> bool {
        match self {
            CellValue::Int(i) => *i == 0,
            CellValue::Float(f) => *f == 0.0,
            CellValue::Bool(b) => !*b,
            _ => false,
        }
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) if !f.is_nan() => Some(*f),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Renders the value the way it reads in a sheet: whole numbers without a
/// decimal part, booleans as `True`/`False`, null as nothing.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(n) if n.is_nan() => Ok(()),
            CellValue::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Float(n) => write!(f, "{}", n),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            CellValue::Float(_) => serializer.serialize_none(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// An ordered table: one header, rows aligned with it.
///
/// Row and column order are preserved end to end. Every operation returns a
/// new `Dataset`; nothing mutates a dataset that has been handed out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Build a dataset, padding short rows with nulls and cutting long ones.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Value of `column` in row `row`, `None` when either is out of range.
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// All values of one column, in row order.
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Keep the rows for which `keep` returns true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        Dataset {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Replace every value of an existing column.
    ///
    /// Returns `None` when the column does not exist.
    pub fn map_column<F>(&self, name: &str, mut f: F) -> Option<Dataset>
    where
        F: FnMut(&CellValue) -> CellValue,
    {
        let idx = self.column_index(name)?;
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row[idx] = f(&row[idx]);
                row
            })
            .collect();
        Some(Dataset {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Set a column from per-row values computed by `f`.
    ///
    /// An existing column with the same name is overwritten in place and keeps
    /// its position; otherwise the column is appended.
    pub fn with_column<F>(&self, name: &str, mut f: F) -> Dataset
    where
        F: FnMut(&[CellValue]) -> CellValue,
    {
        let existing = self.column_index(name);
        let mut columns = self.columns.clone();
        if existing.is_none() {
            columns.push(name.to_string());
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let value = f(row);
                let mut row = row.clone();
                match existing {
                    Some(idx) => row[idx] = value,
                    None => row.push(value),
                }
                row
            })
            .collect();

        Dataset { columns, rows }
    }

    /// First `n` rows, same columns.
    pub fn head(&self, n: usize) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

// =============================================================================
// Quantity Type
// =============================================================================

/// Category of a measurement unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QuantityType {
    Volume,
    Area,
    Numeric,
    Time,
    Mass,
    Length,
    Angle,
}

impl QuantityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityType::Volume => "Volume",
            QuantityType::Area => "Area",
            QuantityType::Numeric => "Numeric",
            QuantityType::Time => "Time",
            QuantityType::Mass => "Mass",
            QuantityType::Length => "Length",
            QuantityType::Angle => "Angle",
        }
    }
}

impl fmt::Display for QuantityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![CellValue::Int(1), "x".into()],
                vec![CellValue::Int(2)],
            ],
        )
    }

    #[test]
    fn test_short_rows_are_padded() {
        let ds = sample();
        assert_eq!(ds.get(1, "b"), Some(&CellValue::Null));
    }

    #[test]
    fn test_with_column_appends_new_column() {
        let ds = sample().with_column("c", |_| CellValue::Bool(true));
        assert_eq!(ds.columns(), ["a", "b", "c"]);
        assert_eq!(ds.get(0, "c"), Some(&CellValue::Bool(true)));
    }

    #[test]
    fn test_with_column_overwrites_in_place() {
        let ds = sample().with_column("a", |_| CellValue::Int(9));
        assert_eq!(ds.columns(), ["a", "b"]);
        assert_eq!(ds.get(1, "a"), Some(&CellValue::Int(9)));
    }

    #[test]
    fn test_transforms_leave_source_untouched() {
        let ds = sample();
        let _ = ds.map_column("a", |_| CellValue::Null);
        let _ = ds.filter_rows(|_| false);
        assert_eq!(ds, sample());
    }

    #[test]
    fn test_display_whole_float_as_integer() {
        assert_eq!(CellValue::Float(1001.0).to_string(), "1001");
        assert_eq!(CellValue::Float(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Bool(false).to_string(), "False");
    }

    #[test]
    fn test_null_and_zero() {
        assert!(CellValue::Float(f64::NAN).is_null());
        assert!(CellValue::Float(-0.0).is_zero());
        assert!(!CellValue::Text("0".into()).is_zero());
        assert!(!CellValue::Null.is_zero());
    }

    #[test]
    fn test_serialize_cells() {
        let json = serde_json::to_string(&vec![
            CellValue::Null,
            CellValue::Int(1),
            CellValue::Float(1.0),
            CellValue::Text("m3".into()),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,1,1.0,"m3"]"#);
    }
}
