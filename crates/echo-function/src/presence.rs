use serde_json::Value;

/// Whether a value counts as supplied.
///
/// `null`, `false`, zero and the empty string do not; every other value does,
/// including empty objects and arrays.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
