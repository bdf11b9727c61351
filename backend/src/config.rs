//! Processing options and their environment overrides.
//!
//! `.env` is loaded by the binary at start-up (dotenvy); these variables then
//! override the built-in defaults:
//!
//! | Variable                     | Default        |
//! |------------------------------|----------------|
//! | `METRE_ELEMENT_QUERY_PARAM`  | `Code métré`   |
//! | `METRE_PREVIEW_ROWS`         | `20`           |
//! | `METRE_PORT`                 | `3000`         |
//!
//! Command-line flags and form fields override both.

use serde::{Deserialize, Serialize};

use crate::transform::rows::DEFAULT_ELEMENT_QUERY_PARAM;

pub const ENV_ELEMENT_QUERY_PARAM: &str = "METRE_ELEMENT_QUERY_PARAM";
pub const ENV_PREVIEW_ROWS: &str = "METRE_PREVIEW_ROWS";
pub const ENV_PORT: &str = "METRE_PORT";

pub const DEFAULT_PREVIEW_ROWS: usize = 20;
pub const DEFAULT_PORT: u16 = 3000;

/// Options for one processing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOptions {
    /// Property name used in the `Elemental Query` column
    pub element_query_param: String,

    /// Number of rows included in a preview
    pub preview_rows: usize,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            element_query_param: DEFAULT_ELEMENT_QUERY_PARAM.to_string(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl ProcessOptions {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from `lookup`. Unparsable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        if let Some(param) = lookup(ENV_ELEMENT_QUERY_PARAM) {
            options.element_query_param = param;
        }
        if let Some(rows) = lookup(ENV_PREVIEW_ROWS).and_then(|v| v.trim().parse().ok()) {
            options.preview_rows = rows;
        }
        options
    }

    /// Replace the element query parameter when one is given.
    pub fn with_element_query_param(mut self, param: Option<String>) -> Self {
        if let Some(param) = param {
            self.element_query_param = param;
        }
        self
    }

    pub fn with_preview_rows(mut self, rows: Option<usize>) -> Self {
        if let Some(rows) = rows {
            self.preview_rows = rows;
        }
        self
    }
}

/// Server port from the environment, or [`DEFAULT_PORT`].
pub fn port_from_env() -> u16 {
    std::env::var(ENV_PORT)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = ProcessOptions::default();
        assert_eq!(opts.element_query_param, "Code métré");
        assert_eq!(opts.preview_rows, 20);
    }

    #[test]
    fn test_lookup_overrides() {
        let opts = ProcessOptions::from_lookup(|key| match key {
            ENV_ELEMENT_QUERY_PARAM => Some("Code".to_string()),
            ENV_PREVIEW_ROWS => Some("not a number".to_string()),
            _ => None,
        });
        assert_eq!(opts.element_query_param, "Code");
        assert_eq!(opts.preview_rows, DEFAULT_PREVIEW_ROWS);
    }

    #[test]
    fn test_explicit_values_win() {
        let opts = ProcessOptions::default()
            .with_element_query_param(Some("Artikel".into()))
            .with_preview_rows(None);
        assert_eq!(opts.element_query_param, "Artikel");
        assert_eq!(opts.preview_rows, DEFAULT_PREVIEW_ROWS);
    }
}
