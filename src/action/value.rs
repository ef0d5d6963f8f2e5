use crate::error::ValidationError;

/// A decoded action argument.
#[derive(Debug, Clone)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    Json(serde_json::Value),
}

/// Decodes one JSON-encoded argument according to its declared type name.
///
/// Type names select the decoder: `string`, `int`/`long`, `double`/`float`,
/// `boolean`, and `json` for an arbitrary JSON value passed through as-is.
///
/// # Errors
///
/// Returns [`ValidationError::UnsupportedArgumentType`] for unknown names
/// and [`ValidationError::InvalidArgumentValue`] when the value does not
/// parse as the declared type.
pub fn decode_argument(type_name: &str, raw: &str) -> Result<ArgValue, ValidationError> {
    let invalid = |source: serde_json::Error| ValidationError::InvalidArgumentValue {
        type_name: type_name.to_owned(),
        source,
    };
    match type_name {
        "string" => serde_json::from_str::<String>(raw)
            .map(ArgValue::Str)
            .map_err(invalid),
        "int" | "long" => serde_json::from_str::<i64>(raw)
            .map(ArgValue::Int)
            .map_err(invalid),
        "double" | "float" => serde_json::from_str::<f64>(raw)
            .map(ArgValue::Double)
            .map_err(invalid),
        "boolean" => serde_json::from_str::<bool>(raw)
            .map(ArgValue::Bool)
            .map_err(invalid),
        "json" => serde_json::from_str::<serde_json::Value>(raw)
            .map(ArgValue::Json)
            .map_err(invalid),
        other => Err(ValidationError::UnsupportedArgumentType {
            name: other.to_owned(),
        }),
    }
}
