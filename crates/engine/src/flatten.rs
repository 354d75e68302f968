//! Projection of nested records into flat rows keyed by dotted paths.

use resultgrid_types::table::plain_number;
use resultgrid_types::{CellValue, Row};
use serde_json::{Map, Value};

use crate::shape::{Shape, classify};

/// Column key used when the flattened value is not a record and no prefix was given.
pub const SCALAR_COLUMN: &str = "value";

/// Flattens one value into a row.
///
/// Nested records produce `parent.child` keys at any depth. Arrays of scalars
/// are joined with `", "`; arrays containing records are kept as compact JSON
/// text so nested tables never multiply rows.
pub fn flatten(value: &Value) -> Row {
    flatten_with_prefix(value, "")
}

pub fn flatten_with_prefix(value: &Value, prefix: &str) -> Row {
    let mut row = Row::new();
    match classify(value) {
        Shape::Record(map) => flatten_into(&mut row, map, prefix),
        shape => {
            let key = if prefix.is_empty() { SCALAR_COLUMN } else { prefix };
            row.insert(key.to_string(), project(shape));
        }
    }
    row
}

/// Flattens every element of an array independently.
pub fn flatten_all(items: &[Value]) -> Vec<Row> {
    items.iter().map(flatten).collect()
}

pub fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn flatten_into(row: &mut Row, map: &Map<String, Value>, prefix: &str) {
    for (key, value) in map {
        let path = join_path(prefix, key);
        match classify(value) {
            Shape::Record(nested) => flatten_into(row, nested, &path),
            // Colliding paths overwrite in place.
            shape => {
                row.insert(path, project(shape));
            }
        }
    }
}

/// Converts a non-record shape into a single cell.
fn project(shape: Shape<'_>) -> CellValue {
    match shape {
        Shape::Scalar(value) => CellValue::from_scalar(value).unwrap_or(CellValue::Null),
        Shape::ScalarList(items) => CellValue::Text(items.iter().map(list_element_text).collect::<Vec<_>>().join(", ")),
        Shape::RecordList(items) => CellValue::Text(serde_json::to_string(items).unwrap_or_default()),
        Shape::Record(map) => CellValue::Text(serde_json::to_string(map).unwrap_or_default()),
    }
}

fn list_element_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => plain_number(number),
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(list_element_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
