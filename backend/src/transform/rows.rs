//! Row transformer: filters quantity lines and derives the output columns.
//!
//! ```text
//! Dataset ──▶ filter Hoeveelheid ──▶ normalize Hours ──▶ Daily Output
//!         ──▶ Quantity Type ──▶ Classification/Outline Level ──▶ Elemental Query
//! ```
//!
//! Each derived column depends on one input column. A missing input column
//! skips only its derived column, except `Hoeveelheid`: without it no row can
//! be filtered and the transform stops.
//!
//! The transform is pure. It reads the input dataset and returns a new one.

use crate::error::ColumnError;
use crate::models::{columns, CellValue, Dataset};

use super::quantity::quantity_type;

/// Replacement for a missing or zero `Hours` value.
pub const MIN_HOURS: f64 = 0.1;

/// Working hours per day used for `Daily Output`.
pub const HOURS_PER_DAY: f64 = 8.0;

/// Default name of the property in `Elemental Query`.
pub const DEFAULT_ELEMENT_QUERY_PARAM: &str = "Code métré";

/// Output of a successful transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    /// Filtered rows with the derived columns.
    pub dataset: Dataset,
    /// Columns that were missing; their derived columns are absent.
    pub missing: Vec<ColumnError>,
    /// Number of input rows dropped by the quantity filter.
    pub dropped_rows: usize,
}

impl Transformed {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check every required column and collect one error per missing column,
/// in the order `Hoeveelheid`, `Hours`, `Meeteenheid`, `ID Klant`.
pub fn missing_columns(dataset: &Dataset) -> Vec<ColumnError> {
    [columns::QUANTITY, columns::HOURS, columns::UNIT, columns::CLIENT_ID]
        .into_iter()
        .filter(|name| !dataset.has_column(name))
        .map(|name| ColumnError::MissingColumn(name.to_string()))
        .collect()
}

/// Filter and enrich `dataset`.
///
/// Returns `Err` with every missing-column error when `Hoeveelheid` is absent.
/// Otherwise returns the transformed dataset together with the non-fatal
/// missing-column errors.
pub fn transform(
    dataset: &Dataset,
    element_query_param: &str,
) -> Result<Transformed, Vec<ColumnError>> {
    let missing = missing_columns(dataset);
    let Some(quantity_idx) = dataset.column_index(columns::QUANTITY) else {
        return Err(missing);
    };

    let filtered = filter_quantities(dataset, quantity_idx);
    let dropped_rows = dataset.row_count() - filtered.row_count();

    let mut out = match filtered.column_index(columns::HOURS) {
        Some(hours_idx) => {
            let normalized = normalize_hours(&filtered);
            with_daily_output(&normalized, quantity_idx, hours_idx)
        }
        None => filtered,
    };

    if let Some(unit_idx) = out.column_index(columns::UNIT) {
        out = out.with_column(columns::QUANTITY_TYPE, |row| {
            CellValue::Text(quantity_type(&row[unit_idx]).to_string())
        });
    }

    out = out
        .with_column(columns::CLASSIFICATION_LEVEL, |_| CellValue::Int(1))
        .with_column(columns::OUTLINE_LEVEL, |_| CellValue::Float(1.0));

    if let Some(client_idx) = out.column_index(columns::CLIENT_ID) {
        out = out.with_column(columns::ELEMENTAL_QUERY, |row| {
            CellValue::Text(elemental_query(element_query_param, &row[client_idx]))
        });
    }

    Ok(Transformed {
        dataset: out,
        missing,
        dropped_rows,
    })
}

/// Keep rows whose quantity is present and not numeric zero.
fn filter_quantities(dataset: &Dataset, quantity_idx: usize) -> Dataset {
    dataset.filter_rows(|row| {
        let quantity = &row[quantity_idx];
        !quantity.is_null() && !quantity.is_zero()
    })
}

/// Replace null or zero `Hours` with [`MIN_HOURS`].
fn normalize_hours(dataset: &Dataset) -> Dataset {
    dataset
        .map_column(columns::HOURS, |hours| {
            if hours.is_null() || hours.is_zero() {
                CellValue::Float(MIN_HOURS)
            } else {
                hours.clone()
            }
        })
        .unwrap_or_else(|| dataset.clone())
}

fn with_daily_output(dataset: &Dataset, quantity_idx: usize, hours_idx: usize) -> Dataset {
    dataset.with_column(columns::DAILY_OUTPUT, |row| {
        daily_output(&row[quantity_idx], &row[hours_idx])
    })
}

/// `8 × quantity / hours`, null unless both cells are numeric.
pub fn daily_output(quantity: &CellValue, hours: &CellValue) -> CellValue {
    match (quantity.as_f64(), hours.as_f64()) {
        (Some(q), Some(h)) => CellValue::Float(HOURS_PER_DAY * q / h),
        _ => CellValue::Null,
    }
}

/// Rendering of an empty `ID Klant` inside `Elemental Query`.
pub const NULL_CLIENT_ID: &str = "nan";

/// `['<param>'] = '<client id>'`.
///
/// Neither value is escaped: a `'` inside either one produces an expression
/// the consumer cannot parse. An empty client ID renders as [`NULL_CLIENT_ID`].
pub fn elemental_query(param: &str, client_id: &CellValue) -> String {
    if client_id.is_null() {
        return format!("['{}'] = '{}'", param, NULL_CLIENT_ID);
    }
    format!("['{}'] = '{}'", param, client_id)
}
