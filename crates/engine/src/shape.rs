//! Structural classification of JSON values.
//!
//! The flattener and the dataset walker branch on the result of [`classify`]
//! instead of probing `Value` variants themselves.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    /// Null, bool, number or string.
    Scalar(&'a Value),
    /// A keyed object.
    Record(&'a Map<String, Value>),
    /// An array without any object element (empty arrays included).
    ScalarList(&'a [Value]),
    /// An array holding at least one object.
    RecordList(&'a [Value]),
}

pub fn classify(value: &Value) -> Shape<'_> {
    match value {
        Value::Object(map) => Shape::Record(map),
        Value::Array(items) if items.iter().any(Value::is_object) => Shape::RecordList(items),
        Value::Array(items) => Shape::ScalarList(items),
        scalar => Shape::Scalar(scalar),
    }
}

/// True when the first element is an object, the condition for an array to be
/// read as a table.
pub fn leads_with_record(items: &[Value]) -> bool {
    items.first().is_some_and(Value::is_object)
}

impl<'a> Shape<'a> {
    /// Returns the rows of an array that qualifies as a table.
    pub fn table_rows(&self) -> Option<&'a [Value]> {
        match *self {
            Shape::RecordList(items) if leads_with_record(items) => Some(items),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_each_shape() {
        assert!(matches!(classify(&json!(1)), Shape::Scalar(_)));
        assert!(matches!(classify(&json!(null)), Shape::Scalar(_)));
        assert!(matches!(classify(&json!({"a": 1})), Shape::Record(_)));
        assert!(matches!(classify(&json!([])), Shape::ScalarList(_)));
        assert!(matches!(classify(&json!([1, "a"])), Shape::ScalarList(_)));
        assert!(matches!(classify(&json!([1, {"a": 1}])), Shape::RecordList(_)));
    }

    #[test]
    fn table_rows_require_leading_record() {
        let leading = json!([{"a": 1}, 2]);
        assert_eq!(classify(&leading).table_rows().map(<[Value]>::len), Some(2));
        let trailing = json!([2, {"a": 1}]);
        assert!(classify(&trailing).table_rows().is_none());
    }
}
