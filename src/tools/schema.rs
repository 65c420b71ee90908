//! Argument validation against a tool's declared JSON Schema
//!
//! Covers the subset the catalog uses: `type` (object, string, integer,
//! number, boolean, array), `properties`, `required`, `default`, `enum`,
//! `items`, object-valued `additionalProperties` and
//! `additionalProperties: false`. Arguments are coerced in place where the
//! intent is unambiguous (`"3"` for an integer, `"true"` for a boolean) and
//! defaults are filled in for absent properties.

use serde_json::{Map, Value};

/// Validate and coerce `args` against `schema`
///
/// Returns every violation found, not just the first one.
pub fn validate_args(schema: &Value, args: &mut Value) -> Result<(), Vec<String>> {
    if args.is_null() {
        *args = Value::Object(Map::new());
    }
    let mut violations = Vec::new();
    check(schema, args, "arguments", &mut violations);
    if violations.is_empty() { Ok(()) } else { Err(violations) }
}

fn check(schema: &Value, value: &mut Value, at: &str, violations: &mut Vec<String>) {
    if let Some(expected) = schema["type"].as_str() {
        coerce(expected, value);
        if !type_matches(expected, value) {
            violations.push(format!("{} must be of type {}", at, expected));
            return;
        }
    }

    if let Some(allowed) = schema["enum"].as_array()
        && !allowed.contains(value)
    {
        let names: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
        violations.push(format!("{} must be one of {}", at, names.join(", ")));
    }

    if let Value::Object(map) = value {
        check_object(schema, map, at, violations);
    }

    if let (Value::Array(items), Some(item_schema)) = (value, schema.get("items")) {
        for (i, item) in items.iter_mut().enumerate() {
            check(item_schema, item, &format!("{}[{}]", at, i), violations);
        }
    }
}

fn check_object(schema: &Value, map: &mut Map<String, Value>, at: &str, violations: &mut Vec<String>) {
    let empty = Map::new();
    let properties = schema["properties"].as_object().unwrap_or(&empty);

    if let Some(required) = schema["required"].as_array() {
        for name in required.iter().filter_map(Value::as_str) {
            if map.get(name).is_none_or(Value::is_null) {
                violations.push(format!("missing required field '{}'", name));
            }
        }
    }

    for (name, prop_schema) in properties {
        match map.get_mut(name) {
            Some(Value::Null) | None => {
                if let Some(default) = prop_schema.get("default") {
                    map.insert(name.clone(), default.clone());
                } else {
                    map.remove(name);
                }
            }
            Some(value) => check(prop_schema, value, &format!("'{}'", name), violations),
        }
    }

    match schema.get("additionalProperties") {
        Some(Value::Bool(false)) => {
            for name in map.keys().filter(|k| !properties.contains_key(*k)) {
                violations.push(format!("unexpected field '{}' in {}", name, at));
            }
        }
        Some(extra @ Value::Object(_)) => {
            for (name, value) in map.iter_mut().filter(|(k, _)| !properties.contains_key(*k)) {
                check(extra, value, &format!("'{}'", name), violations);
            }
        }
        _ => {}
    }
}

fn coerce(expected: &str, value: &mut Value) {
    let Value::String(s) = value else {
        return;
    };
    let coerced = match expected {
        "integer" => s.trim().parse::<i64>().ok().map(Value::from),
        "number" => s.trim().parse::<f64>().ok().and_then(|n| serde_json::Number::from_f64(n).map(Value::Number)),
        "boolean" => match s.trim() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    if let Some(v) = coerced {
        *value = v;
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
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
                "dir": { "type": "string" },
                "recursive_depth": { "type": "integer", "default": 0 },
                "mode": { "type": "string", "enum": ["find_replace", "block", "line_range"] },
                "args": { "type": "array", "items": { "type": "string" } },
                "env": { "type": "object", "additionalProperties": { "type": "string" } }
            },
            "required": ["dir"],
            "additionalProperties": false
        })
    }

    #[test]
    fn test_defaults_are_filled() {
        let mut args = json!({ "dir": "." });
        validate_args(&schema(), &mut args).unwrap();
        assert_eq!(args["recursive_depth"], 0);
    }

    #[test]
    fn test_missing_required_is_reported() {
        let mut args = json!({});
        let violations = validate_args(&schema(), &mut args).unwrap_err();
        assert_eq!(violations, vec!["missing required field 'dir'"]);
    }

    #[test]
    fn test_null_args_treated_as_empty_object() {
        let mut args = Value::Null;
        let violations = validate_args(&schema(), &mut args).unwrap_err();
        assert!(violations[0].contains("'dir'"));
    }

    #[test]
    fn test_string_numbers_are_coerced() {
        let mut args = json!({ "dir": ".", "recursive_depth": "2" });
        validate_args(&schema(), &mut args).unwrap();
        assert_eq!(args["recursive_depth"], 2);
    }

    #[test]
    fn test_wrong_type_and_unknown_field_both_reported() {
        let mut args = json!({ "dir": 5, "bogus": true });
        let violations = validate_args(&schema(), &mut args).unwrap_err();
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().any(|v| v.contains("'dir' must be of type string")));
        assert!(violations.iter().any(|v| v.contains("unexpected field 'bogus'")));
    }

    #[test]
    fn test_enum_and_items_checked() {
        let mut args = json!({ "dir": ".", "mode": "regex", "args": ["-l", 3] });
        let violations = validate_args(&schema(), &mut args).unwrap_err();
        assert!(violations.iter().any(|v| v.contains("'mode' must be one of")));
        assert!(violations.iter().any(|v| v.contains("'args'[1] must be of type string")));
    }

    #[test]
    fn test_map_values_checked() {
        let mut args = json!({ "dir": ".", "env": { "A": "1", "B": 2 } });
        let violations = validate_args(&schema(), &mut args).unwrap_err();
        assert_eq!(violations, vec!["'B' must be of type string"]);
    }
}
