//! Transformation module.
//!
//! - Quantity: unit code to category table
//! - Rows: the row transformer (filter, derived columns)
//! - Pipeline: parse → transform → export with logging

pub mod pipeline;
pub mod quantity;
pub mod rows;

pub use pipeline::{process_bytes, process_dataset, process_file, PipelineResult, SheetInfo};
pub use quantity::{lookup_unit, quantity_type, units_description, UNIT_CATEGORIES};
pub use rows::{
    daily_output, elemental_query, missing_columns, transform, Transformed,
    DEFAULT_ELEMENT_QUERY_PARAM, HOURS_PER_DAY, MIN_HOURS, NULL_CLIENT_ID,
};
