use std::borrow::Borrow;

use indexmap::IndexSet;
use resultgrid_types::Row;
use serde::{Deserialize, Serialize};

/// Display cap on columns per dataset.
pub const DEFAULT_MAX_COLUMNS: usize = 80;

/// Comparison fields shown first when present, in this order.
pub const DEFAULT_PREFERRED_COLUMNS: &[&str] = &[
    "codigo",
    "codigo_base",
    "a_banco",
    "a_desc",
    "a_valor",
    "sinapi.valor",
    "sinapi.ok",
    "sudecap.valor",
    "sudecap.ok",
    "dif_abs",
    "dif_rel",
    "dir",
    "motivos",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOptions {
    pub preferred: Vec<String>,
    /// `0` disables the cap.
    pub max_columns: usize,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self {
            preferred: DEFAULT_PREFERRED_COLUMNS.iter().map(|column| column.to_string()).collect(),
            max_columns: DEFAULT_MAX_COLUMNS,
        }
    }
}

/// Derives the display columns for a set of rows.
///
/// The key union is taken in first-seen order. Preferred keys that occur in
/// the union lead, the rest follow, and the result is cut at the cap. Rows are
/// left untouched; dropped columns stay available in the row data.
pub fn select_columns<R: Borrow<Row>>(rows: &[R], options: &ColumnOptions) -> Vec<String> {
    let mut union: IndexSet<&str> = IndexSet::new();
    for row in rows {
        union.extend(row.borrow().keys().map(String::as_str));
    }

    let mut columns: IndexSet<String> = IndexSet::with_capacity(union.len());
    for preferred in &options.preferred {
        if union.contains(preferred.as_str()) {
            columns.insert(preferred.clone());
        }
    }
    for key in union {
        if !columns.contains(key) {
            columns.insert(key.to_string());
        }
    }

    let mut columns: Vec<String> = columns.into_iter().collect();
    if options.max_columns > 0 {
        columns.truncate(options.max_columns);
    }
    columns
}
