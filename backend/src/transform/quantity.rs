//! Unit code to quantity category lookup.
//!
//! Unit codes are matched after trimming and lower-casing. Anything not in
//! [`UNIT_CATEGORIES`] is [`QuantityType::Numeric`].

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::models::{CellValue, QuantityType};

/// Known unit codes, lower-case, with their category.
pub const UNIT_CATEGORIES: &[(&str, QuantityType)] = &[
    ("m3", QuantityType::Volume),
    ("cm3", QuantityType::Volume),
    ("cm³", QuantityType::Volume),
    ("dm3", QuantityType::Volume),
    ("dm³", QuantityType::Volume),
    ("km3", QuantityType::Volume),
    ("km³", QuantityType::Volume),
    ("m2", QuantityType::Area),
    ("m²", QuantityType::Area),
    ("cm2", QuantityType::Area),
    ("cm²", QuantityType::Area),
    ("dm2", QuantityType::Area),
    ("dm²", QuantityType::Area),
    ("km2", QuantityType::Area),
    ("km²", QuantityType::Area),
    ("st", QuantityType::Numeric),
    ("s", QuantityType::Time),
    ("min", QuantityType::Time),
    ("h", QuantityType::Time),
    ("d", QuantityType::Time),
    ("kg", QuantityType::Mass),
    ("g", QuantityType::Mass),
    ("t", QuantityType::Mass),
    ("cm", QuantityType::Length),
    ("mm", QuantityType::Length),
    ("km", QuantityType::Length),
    ("m", QuantityType::Length),
    ("rad", QuantityType::Angle),
    ("deg", QuantityType::Angle),
    ("grad", QuantityType::Angle),
];

static UNIT_LOOKUP: Lazy<HashMap<&'static str, QuantityType>> =
    Lazy::new(|| UNIT_CATEGORIES.iter().copied().collect());

/// Category of a unit code, `None` if the code is unknown.
pub fn lookup_unit(code: &str) -> Option<QuantityType> {
    let normalized = code.trim().to_lowercase();
    UNIT_LOOKUP.get(normalized.as_str()).copied()
}

/// Category of a `Meeteenheid` cell. Non-text and unknown codes are `Numeric`.
pub fn quantity_type(unit: &CellValue) -> QuantityType {
    unit.as_str()
        .and_then(lookup_unit)
        .unwrap_or(QuantityType::Numeric)
}

/// Human-readable listing of the table, grouped by category.
pub fn units_description() -> String {
    let order = [
        QuantityType::Volume,
        QuantityType::Area,
        QuantityType::Numeric,
        QuantityType::Time,
        QuantityType::Mass,
        QuantityType::Length,
        QuantityType::Angle,
    ];

    let mut out = String::from("Unit codes (trimmed, case-insensitive):\n\n");
    for category in order {
        let codes: Vec<&str> = UNIT_CATEGORIES
            .iter()
            .filter(|(_, c)| *c == category)
            .map(|(code, _)| *code)
            .collect();
        out.push_str(&format!("  {:<8} {}\n", category.as_str(), codes.join(", ")));
    }
    out.push_str("\nAnything else, or an empty cell, is Numeric.\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_trimmed_and_case_insensitive() {
        assert_eq!(lookup_unit(" M3 "), Some(QuantityType::Volume));
        assert_eq!(lookup_unit("KM²"), Some(QuantityType::Area));
        assert_eq!(lookup_unit("Min"), Some(QuantityType::Time));
    }

    #[test]
    fn test_every_category_is_reachable() {
        assert_eq!(lookup_unit("st"), Some(QuantityType::Numeric));
        assert_eq!(lookup_unit("t"), Some(QuantityType::Mass));
        assert_eq!(lookup_unit("m"), Some(QuantityType::Length));
        assert_eq!(lookup_unit("grad"), Some(QuantityType::Angle));
    }

    #[test]
    fn test_unknown_units_fall_back_to_numeric() {
        assert_eq!(lookup_unit("pallets"), None);
        assert_eq!(quantity_type(&CellValue::Text("pallets".into())), QuantityType::Numeric);
        assert_eq!(quantity_type(&CellValue::Null), QuantityType::Numeric);
        assert_eq!(quantity_type(&CellValue::Int(3)), QuantityType::Numeric);
    }

    #[test]
    fn test_superscript_cubic_metre_is_not_mapped() {
        // Only the prefixed superscript volumes are in the table
        assert_eq!(lookup_unit("m³"), None);
        assert_eq!(quantity_type(&CellValue::Text("m³".into())), QuantityType::Numeric);
        assert_eq!(lookup_unit("dm³"), Some(QuantityType::Volume));
        assert_eq!(lookup_unit("m²"), Some(QuantityType::Area));
    }

    #[test]
    fn test_table_keys_are_normalized() {
        for (code, _) in UNIT_CATEGORIES {
            assert_eq!(code.trim().to_lowercase(), *code);
        }
    }

    #[test]
    fn test_units_description_lists_categories() {
        let text = units_description();
        assert!(text.contains("Volume"));
        assert!(text.contains("grad"));
    }
}
