//! Lightweight structural JSON Schema checks.
//!
//! Covers what tool schemas in practice declare: `"type": "object"` input,
//! `required` keys, and per-property `type` (plus `items.type` for arrays).
//! Anything else in the schema is accepted as-is.

use serde_json::Value;

/// Validate `input` against `schema`, returning a message the brain can act
/// on when the input does not fit.
pub fn validate_arguments(input: &Value, schema: &Value) -> Result<(), String> {
    let Some(schema_obj) = schema.as_object() else {
        return Ok(());
    };

    if matches!(schema_obj.get("type"), Some(Value::String(ty)) if ty == "object")
        && !input.is_object()
    {
        return Err(format!("expected object input, got {}", json_type_name(input)));
    }

    let Some(input_obj) = input.as_object() else {
        return Ok(());
    };

    if let Some(Value::Array(required)) = schema_obj.get("required") {
        for field in required.iter().filter_map(Value::as_str) {
            if !input_obj.contains_key(field) {
                return Err(format!("missing required field: {field}"));
            }
        }
    }

    if let Some(Value::Object(properties)) = schema_obj.get("properties") {
        for (field, prop_schema) in properties {
            let Some(value) = input_obj.get(field) else {
                continue;
            };
            if let Some(Value::String(expected)) = prop_schema.get("type")
                && !json_type_matches(value, expected)
            {
                return Err(format!(
                    "field '{field}' expected type '{expected}', got {}",
                    json_type_name(value)
                ));
            }
            if let Some(items) = value.as_array()
                && let Some(Value::String(expected)) =
                    prop_schema.get("items").and_then(|i| i.get("type"))
                && let Some(bad) = items.iter().find(|v| !json_type_matches(v, expected))
            {
                return Err(format!(
                    "field '{field}' expected items of type '{expected}', got {}",
                    json_type_name(bad)
                ));
            }
        }
    }

    Ok(())
}

fn json_type_matches(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": { "type": "string" },
                "limit": { "type": "integer" },
                "tags": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["code"]
        })
    }

    #[test]
    fn accepts_matching_input() {
        assert!(validate_arguments(&json!({"code": "print(1)", "limit": 3}), &schema()).is_ok());
    }

    #[test]
    fn rejects_non_object() {
        let err = validate_arguments(&json!("print(1)"), &schema()).unwrap_err();
        assert_eq!(err, "expected object input, got string");
    }

    #[test]
    fn rejects_missing_required() {
        let err = validate_arguments(&json!({}), &schema()).unwrap_err();
        assert_eq!(err, "missing required field: code");
    }

    #[test]
    fn rejects_wrong_property_type() {
        let err = validate_arguments(&json!({"code": 1}), &schema()).unwrap_err();
        assert!(err.contains("'code' expected type 'string'"));

        let err = validate_arguments(&json!({"code": "x", "limit": 1.5}), &schema()).unwrap_err();
        assert!(err.contains("'limit'"));
    }

    #[test]
    fn rejects_wrong_item_type() {
        let err =
            validate_arguments(&json!({"code": "x", "tags": ["a", 2]}), &schema()).unwrap_err();
        assert!(err.contains("items of type 'string'"));
    }

    #[test]
    fn non_object_schema_accepts_anything() {
        assert!(validate_arguments(&json!(42), &json!(true)).is_ok());
    }
}
