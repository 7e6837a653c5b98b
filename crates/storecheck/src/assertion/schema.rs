//! JSON Schema conformance for API response bodies.
//!
//! Supports the draft-07 keywords used by API contract checks: `type`,
//! `properties`, `required`, `additionalProperties: false`, `items`, `enum`,
//! `const`, `minimum`, `maximum`, `minLength`, `maxLength`, `minItems`,
//! `maxItems`. Other keywords are ignored.

use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single place where the instance broke the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// JSON pointer into the instance
    pub path: String,
    /// What went wrong
    pub message: String,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{path}: {}", self.message)
    }
}

/// Validate `instance` against `schema`
///
/// Returns every violation found; an empty list means the instance conforms.
///
/// # Errors
///
/// Returns [`CheckError::UnsupportedConfig`] when the schema itself is not a
/// JSON object or boolean, or names an unknown `type`.
pub fn validate_schema(instance: &Value, schema: &Value) -> CheckResult<Vec<SchemaViolation>> {
    let mut violations = Vec::new();
    validate_at(instance, schema, "", &mut violations)?;
    Ok(violations)
}

fn validate_at(
    instance: &Value,
    schema: &Value,
    path: &str,
    out: &mut Vec<SchemaViolation>,
) -> CheckResult<()> {
    let rules = match schema {
        Value::Bool(true) => return Ok(()),
        Value::Bool(false) => {
            out.push(violation(path, "no value is allowed here"));
            return Ok(());
        }
        Value::Object(rules) => rules,
        other => {
            return Err(CheckError::UnsupportedConfig {
                setting: "JSON schema",
                value: other.to_string(),
                expected: "object or boolean schema",
            })
        }
    };

    if let Some(expected) = rules.get("type") {
        if !matches_type(instance, expected)? {
            out.push(violation(
                path,
                format!("expected type {expected}, got {}", type_name(instance)),
            ));
            // Further keywords assume the right shape.
            return Ok(());
        }
    }

    if let Some(allowed) = rules.get("enum") {
        let listed = allowed.as_array().is_some_and(|values| values.contains(instance));
        if !listed {
            out.push(violation(path, format!("{instance} is not one of {allowed}")));
        }
    }
    if let Some(constant) = rules.get("const") {
        if constant != instance {
            out.push(violation(path, format!("expected constant {constant}, got {instance}")));
        }
    }

    match instance {
        Value::Object(fields) => validate_object(fields, rules, path, out)?,
        Value::Array(items) => validate_array(items, rules, path, out)?,
        Value::String(s) => validate_string(s, rules, path, out),
        Value::Number(n) => validate_number(n.as_f64().unwrap_or(f64::NAN), rules, path, out),
        Value::Bool(_) | Value::Null => {}
    }
    Ok(())
}

fn validate_object(
    fields: &Map<String, Value>,
    rules: &Map<String, Value>,
    path: &str,
    out: &mut Vec<SchemaViolation>,
) -> CheckResult<()> {
    if let Some(Value::Array(required)) = rules.get("required") {
        for key in required.iter().filter_map(Value::as_str) {
            if !fields.contains_key(key) {
                out.push(violation(path, format!("missing required property '{key}'")));
            }
        }
    }

    let properties = rules.get("properties").and_then(Value::as_object);
    if let Some(properties) = properties {
        for (key, sub_schema) in properties {
            if let Some(value) = fields.get(key) {
                validate_at(value, sub_schema, &format!("{path}/{key}"), out)?;
            }
        }
    }

    if rules.get("additionalProperties") == Some(&Value::Bool(false)) {
        for key in fields.keys() {
            if !properties.is_some_and(|p| p.contains_key(key)) {
                out.push(violation(path, format!("unexpected property '{key}'")));
            }
        }
    }
    Ok(())
}

fn validate_array(
    items: &[Value],
    rules: &Map<String, Value>,
    path: &str,
    out: &mut Vec<SchemaViolation>,
) -> CheckResult<()> {
    if let Some(min) = rules.get("minItems").and_then(Value::as_u64) {
        if (items.len() as u64) < min {
            out.push(violation(path, format!("expected at least {min} items, got {}", items.len())));
        }
    }
    if let Some(max) = rules.get("maxItems").and_then(Value::as_u64) {
        if (items.len() as u64) > max {
            out.push(violation(path, format!("expected at most {max} items, got {}", items.len())));
        }
    }
    if let Some(item_schema) = rules.get("items") {
        for (i, item) in items.iter().enumerate() {
            validate_at(item, item_schema, &format!("{path}/{i}"), out)?;
        }
    }
    Ok(())
}

fn validate_string(s: &str, rules: &Map<String, Value>, path: &str, out: &mut Vec<SchemaViolation>) {
    let len = s.chars().count() as u64;
    if let Some(min) = rules.get("minLength").and_then(Value::as_u64) {
        if len < min {
            out.push(violation(path, format!("string shorter than {min}")));
        }
    }
    if let Some(max) = rules.get("maxLength").and_then(Value::as_u64) {
        if len > max {
            out.push(violation(path, format!("string longer than {max}")));
        }
    }
}

fn validate_number(n: f64, rules: &Map<String, Value>, path: &str, out: &mut Vec<SchemaViolation>) {
    if let Some(min) = rules.get("minimum").and_then(Value::as_f64) {
        if n < min {
            out.push(violation(path, format!("{n} is less than minimum {min}")));
        }
    }
    if let Some(max) = rules.get("maximum").and_then(Value::as_f64) {
        if n > max {
            out.push(violation(path, format!("{n} is greater than maximum {max}")));
        }
    }
}

fn matches_type(instance: &Value, expected: &Value) -> CheckResult<bool> {
    match expected {
        Value::String(name) => matches_type_name(instance, name),
        Value::Array(names) => {
            for name in names.iter().filter_map(Value::as_str) {
                if matches_type_name(instance, name)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(CheckError::UnsupportedConfig {
            setting: "JSON schema type",
            value: other.to_string(),
            expected: "type name or list of type names",
        }),
    }
}

fn matches_type_name(instance: &Value, name: &str) -> CheckResult<bool> {
    Ok(match name {
        "null" => instance.is_null(),
        "boolean" => instance.is_boolean(),
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "number" => instance.is_number(),
        "integer" => instance.is_i64() || instance.is_u64(),
        other => {
            return Err(CheckError::UnsupportedConfig {
                setting: "JSON schema type",
                value: other.to_string(),
                expected: "null, boolean, object, array, string, number, integer",
            })
        }
    })
}

fn type_name(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn violation(path: &str, message: impl Into<String>) -> SchemaViolation {
    SchemaViolation {
        path: path.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> Value {
        json!({
            "type": "object",
            "required": ["name", "age"],
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "age": { "type": "integer", "minimum": 0 },
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        })
    }

    #[test]
    fn test_conforming_instance() {
        let body = json!({"name": "John Doe", "age": 30, "tags": ["admin"]});
        assert!(validate_schema(&body, &user_schema()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_required_and_wrong_type() {
        let body = json!({"age": "thirty"});
        let violations = validate_schema(&body, &user_schema()).unwrap();
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().any(|v| v.message.contains("'name'")));
        assert!(violations.iter().any(|v| v.path == "/age"));
    }

    #[test]
    fn test_nested_item_path() {
        let body = json!({"name": "x", "age": 1, "tags": ["ok", 5]});
        let violations = validate_schema(&body, &user_schema()).unwrap();
        assert_eq!(violations[0].path, "/tags/1");
    }

    #[test]
    fn test_additional_properties_false() {
        let schema = json!({"type": "object", "properties": {"id": {}}, "additionalProperties": false});
        let violations = validate_schema(&json!({"id": 1, "extra": 2}), &schema).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].to_string().contains("extra"));
    }

    #[test]
    fn test_type_list_and_enum() {
        let schema = json!({"type": ["string", "null"], "enum": ["a", null]});
        assert!(validate_schema(&json!(null), &schema).unwrap().is_empty());
        assert_eq!(validate_schema(&json!("b"), &schema).unwrap().len(), 1);
    }

    #[test]
    fn test_array_bounds() {
        let schema = json!({"type": "array", "minItems": 1, "maxItems": 2});
        assert_eq!(validate_schema(&json!([]), &schema).unwrap().len(), 1);
        assert_eq!(validate_schema(&json!([1, 2, 3]), &schema).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_schema_is_config_error() {
        assert!(validate_schema(&json!({}), &json!(42)).is_err());
        assert!(validate_schema(&json!({}), &json!({"type": "widget"})).is_err());
    }
}
