use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::coercion::coerce;
use crate::{TypedValue, Value, ValueKind};

/// Errors produced while reading or writing parameter payloads.
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("{kind} payload must be a JSON array, found {found}")]
    NotAnArray { kind: ValueKind, found: String },
    #[error("{kind} payload element {index}: {reason}")]
    Element {
        kind: ValueKind,
        index: usize,
        reason: String,
    },
    #[error("{kind} element {index} holds a NaN or infinite float")]
    NonFinite { kind: ValueKind, index: usize },
}

/// Rewrite authoring shorthand into the tagged `{ "type", "data" }` form that
/// [`Value`] deserializes from. Bare numbers, bools, strings and numeric arrays
/// map to their obvious kinds; `{ "<tag>": data }` picks the kind by key and
/// `{ "color": [r, g, b, a?] }` fills a missing channel with 1.
pub fn normalize_value_json(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Number(n) => {
            if n.is_f64() {
                json!({ "type": "float", "data": n })
            } else {
                json!({ "type": "int", "data": n })
            }
        }
        JsonValue::Bool(b) => json!({ "type": "bool", "data": b }),
        JsonValue::String(s) => json!({ "type": "text", "data": s }),
        JsonValue::Array(arr) if arr.iter().all(|x| x.is_number()) => match arr.len() {
            2 => json!({ "type": "vec2", "data": arr }),
            3 => json!({ "type": "vec3", "data": arr }),
            _ => json!({ "type": "vec4", "data": arr }),
        },
        JsonValue::Object(obj) => {
            if obj.contains_key("type") && obj.contains_key("data") {
                return JsonValue::Object(obj);
            }
            for tag in [
                "bool", "int", "long", "float", "text", "vec2", "vec3", "vec4", "enum",
                "layermask", "object", "gradient", "curve", "colorblock",
            ] {
                if let Some(data) = obj.get(tag) {
                    return json!({ "type": tag, "data": data });
                }
            }
            if let Some(arr) = obj.get("color").and_then(|x| x.as_array()) {
                let c = |i: usize| arr.get(i).and_then(|x| x.as_f64()).unwrap_or(1.0);
                return json!({
                    "type": "color",
                    "data": { "r": c(0), "g": c(1), "b": c(2), "a": c(3) }
                });
            }
            if let Some(color) = obj.get("color") {
                return json!({ "type": "color", "data": color });
            }
            JsonValue::Object(obj)
        }
        other => other,
    }
}

/// [`normalize_value_json`] followed by deserialization.
pub fn parse_value(value: JsonValue) -> Result<Value, serde_json::Error> {
    let normalized = normalize_value_json(value);
    serde_json::from_value(normalized)
}

/// Convert a core [`Value`] into the compact shorthand form (`{ "vec3": [...] }`).
pub fn value_to_shorthand_json(value: &Value) -> JsonValue {
    match serde_json::to_value(value) {
        Ok(JsonValue::Object(mut obj)) => {
            let tag = obj
                .remove("type")
                .and_then(|t| t.as_str().map(str::to_string))
                .unwrap_or_default();
            let data = obj.remove("data").unwrap_or(JsonValue::Null);
            json!({ tag: data })
        }
        _ => JsonValue::Null,
    }
}

/// Read one element of a typed parameter payload. The concrete JSON form of
/// `T` is tried first; shorthand values are accepted and coerced into
/// `T::KIND` when they carry a different scalar kind.
pub fn parse_element<T: TypedValue>(value: &JsonValue) -> Result<T, String> {
    if let Ok(v) = serde_json::from_value::<T>(value.clone()) {
        return Ok(v);
    }
    let parsed = parse_value(value.clone()).map_err(|e| e.to_string())?;
    coerce(&parsed, T::KIND)
        .as_ref()
        .and_then(T::from_value)
        .ok_or_else(|| format!("cannot convert {} into {}", parsed.kind(), T::KIND))
}

/// Read a whole typed payload. `null` reads as an empty list.
pub fn parse_elements<T: TypedValue>(payload: &JsonValue) -> Result<Vec<T>, JsonError> {
    let items = match payload {
        JsonValue::Null => return Ok(Vec::new()),
        JsonValue::Array(items) => items,
        other => {
            return Err(JsonError::NotAnArray {
                kind: T::KIND,
                found: other.to_string(),
            })
        }
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            parse_element::<T>(item).map_err(|reason| JsonError::Element {
                kind: T::KIND,
                index,
                reason,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    #[test]
    fn normalize_primitive_aliases() {
        assert_eq!(normalize_value_json(json!(1.5))["type"], "float");
        assert_eq!(normalize_value_json(json!(3))["type"], "int");
        assert_eq!(normalize_value_json(json!("hi"))["type"], "text");
        assert_eq!(normalize_value_json(json!([1, 2, 3]))["type"], "vec3");
    }

    #[test]
    fn parse_color_shorthand_array() {
        let v = parse_value(json!({ "color": [1.0, 0.0, 0.0, 1.0] })).unwrap();
        assert_eq!(v, Value::Color(Color::rgba(1.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn shorthand_roundtrip() {
        let v = Value::Vec3([1.0, 2.0, 3.0]);
        let short = value_to_shorthand_json(&v);
        assert_eq!(short, json!({ "vec3": [1.0, 2.0, 3.0] }));
        assert_eq!(parse_value(short).unwrap(), v);
    }

    #[test]
    fn elements_accept_concrete_and_shorthand() {
        let floats: Vec<f32> = parse_elements(&json!([0.5, { "int": 2 }, "1.5"])).unwrap();
        assert_eq!(floats, vec![0.5, 2.0, 1.5]);
        let colors: Vec<Color> =
            parse_elements(&json!([{ "r": 1.0, "g": 1.0, "b": 1.0, "a": 1.0 }])).unwrap();
        assert_eq!(colors, vec![Color::WHITE]);
    }

    #[test]
    fn elements_reject_non_array() {
        assert!(matches!(
            parse_elements::<bool>(&json!({ "values": [] })),
            Err(JsonError::NotAnArray { .. })
        ));
        assert_eq!(parse_elements::<bool>(&JsonValue::Null).unwrap(), Vec::<bool>::new());
    }
}
