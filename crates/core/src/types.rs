/// Field name as used in models, rule sets and error maps.
pub type FieldName = String;

/// A form model: field name to current value. Owned by the UI layer.
pub type Model = serde_json::Map<String, serde_json::Value>;

/// Returns `true` for values the engine treats as "nothing entered":
/// missing, `null`, or the empty string.
pub fn is_empty_value(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.is_empty(),
        _ => false,
    }
}
