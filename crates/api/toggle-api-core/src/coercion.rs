//! Coercion helpers between Value kinds.
//! Used when a dynamic argument (e.g. a toggle's numeric state) is handed to a
//! method whose argument kind differs: scalar <-> integer <-> bool <-> text,
//! scalar broadcasting into vectors and colors.

use crate::value::{Color, EnumValue, LayerMask, Value, ValueKind};

/// Attempt to coerce a Value into a scalar f32.
/// Rules:
/// - Float -> its value
/// - Int/Long/Enum/LayerMask -> numeric value
/// - Bool -> 1.0 / 0.0
/// - Vec2/3/4 -> first component
/// - Color -> red channel
/// - Text -> parsed number or 0.0
pub fn to_float(v: &Value) -> f32 {
    match v {
        Value::Float(f) => *f,
        Value::Int(i) => *i as f32,
        Value::Long(l) => *l as f32,
        Value::Enum(e) => e.0 as f32,
        Value::LayerMask(m) => m.0 as f32,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Vec2(a) => a[0],
        Value::Vec3(a) => a[0],
        Value::Vec4(a) => a[0],
        Value::Color(c) => c.r,
        Value::Text(s) => s.trim().parse().unwrap_or(0.0),
        Value::ColorBlock(_)
        | Value::Gradient(_)
        | Value::Curve(_)
        | Value::Object(_) => 0.0,
    }
}

/// Truncating integer view of [`to_float`], exact for integer kinds.
pub fn to_int(v: &Value) -> i64 {
    match v {
        Value::Int(i) => *i as i64,
        Value::Long(l) => *l,
        Value::Enum(e) => e.0 as i64,
        Value::LayerMask(m) => m.0 as i64,
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .unwrap_or_else(|_| to_float(v) as i64),
        other => to_float(other) as i64,
    }
}

/// Non-zero / non-empty is true.
pub fn to_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Text(s) => matches!(s.trim(), "true" | "True" | "1"),
        Value::Object(o) => o.is_some(),
        other => to_float(other) != 0.0,
    }
}

/// Text rendering of scalar-like values.
pub fn to_text(v: &Value) -> String {
    match v {
        Value::Text(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Long(l) => l.to_string(),
        Value::Enum(e) => e.0.to_string(),
        Value::LayerMask(m) => m.0.to_string(),
        Value::Float(f) => f.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Convert a Value into a fixed-size float array, padding with zeros.
/// Scalars broadcast into every component.
pub fn to_array<const N: usize>(v: &Value) -> [f32; N] {
    let mut out = [0.0f32; N];
    let src: Vec<f32> = match v {
        Value::Vec2(a) => a.to_vec(),
        Value::Vec3(a) => a.to_vec(),
        Value::Vec4(a) => a.to_vec(),
        Value::Color(c) => c.to_array().to_vec(),
        other => vec![to_float(other); N],
    };
    for (slot, x) in out.iter_mut().zip(src) {
        *slot = x;
    }
    out
}

/// Coerce `v` into `kind`. Returns `None` when no sensible conversion exists
/// (structured kinds, object references).
pub fn coerce(v: &Value, kind: ValueKind) -> Option<Value> {
    if v.kind() == kind {
        return Some(v.clone());
    }
    let out = match kind {
        ValueKind::Bool => Value::Bool(to_bool(v)),
        ValueKind::Int => Value::Int(to_int(v) as i32),
        ValueKind::Long => Value::Long(to_int(v)),
        ValueKind::Float => Value::Float(to_float(v)),
        ValueKind::Text => Value::Text(to_text(v)),
        ValueKind::Enum => Value::Enum(EnumValue(to_int(v) as i32)),
        ValueKind::LayerMask => Value::LayerMask(LayerMask(to_int(v).max(0) as u32)),
        ValueKind::Vec2 => Value::Vec2(to_array::<2>(v)),
        ValueKind::Vec3 => Value::Vec3(to_array::<3>(v)),
        ValueKind::Vec4 => Value::Vec4(to_array::<4>(v)),
        ValueKind::Color => match v {
            Value::Vec4(a) => Value::Color(Color::from(*a)),
            _ => return None,
        },
        ValueKind::ColorBlock | ValueKind::Gradient | ValueKind::Curve | ValueKind::Object => {
            return None
        }
    };
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_to_scalar_kinds() {
        let v = Value::Float(2.75);
        assert_eq!(coerce(&v, ValueKind::Int), Some(Value::Int(2)));
        assert_eq!(coerce(&v, ValueKind::Bool), Some(Value::Bool(true)));
        assert_eq!(coerce(&v, ValueKind::Text), Some(Value::Text("2.75".into())));
        assert_eq!(coerce(&v, ValueKind::Vec3), Some(Value::Vec3([2.75; 3])));
    }

    #[test]
    fn same_kind_is_identity() {
        let v = Value::text("hello");
        assert_eq!(coerce(&v, ValueKind::Text), Some(v));
    }

    #[test]
    fn structured_kinds_do_not_coerce() {
        assert_eq!(coerce(&Value::Float(1.0), ValueKind::Gradient), None);
        assert_eq!(coerce(&Value::Float(1.0), ValueKind::Object), None);
    }

    #[test]
    fn text_parses_numbers() {
        assert_eq!(to_int(&Value::text(" 42 ")), 42);
        assert_eq!(to_float(&Value::text("0.5")), 0.5);
        assert!(to_bool(&Value::text("true")));
    }
}
