use serde_json::{Map, Value};

/// A record from any endpoint. The column set depends on the dataset and is
/// only known at read time; key order follows the wire.
pub type Row = Map<String, Value>;

/// Renders a JSON value the way it appears in a query string or CSV cell:
/// strings as-is, `null` as empty, everything else in its JSON text form.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Looks up `field` in `row` and renders it with [`value_text`]. Absent fields
/// render as empty.
pub fn field_text(row: &Row, field: &str) -> String {
    row.get(field).map(value_text).unwrap_or_default()
}
