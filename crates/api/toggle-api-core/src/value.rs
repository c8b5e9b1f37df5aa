//! Value: boxed runtime arguments passed to bound methods.
//! The set of kinds is closed; every kind has a concrete Rust type and a
//! default used when parameter lists grow.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lightweight kind enum used for quick dispatch and for mapping argument
/// type names onto parameter list storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Int,
    Long,
    Float,
    Text,
    Color,
    ColorBlock,
    Vec2,
    Vec3,
    Vec4,
    Gradient,
    Curve,
    LayerMask,
    Enum,
    Object,
}

impl ValueKind {
    pub const ALL: [ValueKind; 15] = [
        ValueKind::Bool,
        ValueKind::Int,
        ValueKind::Long,
        ValueKind::Float,
        ValueKind::Text,
        ValueKind::Color,
        ValueKind::ColorBlock,
        ValueKind::Vec2,
        ValueKind::Vec3,
        ValueKind::Vec4,
        ValueKind::Gradient,
        ValueKind::Curve,
        ValueKind::LayerMask,
        ValueKind::Enum,
        ValueKind::Object,
    ];

    /// Lower-case name, matching the serde tag of the corresponding [`Value`] variant.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Color => "color",
            ValueKind::ColorBlock => "colorblock",
            ValueKind::Vec2 => "vec2",
            ValueKind::Vec3 => "vec3",
            ValueKind::Vec4 => "vec4",
            ValueKind::Gradient => "gradient",
            ValueKind::Curve => "curve",
            ValueKind::LayerMask => "layermask",
            ValueKind::Enum => "enum",
            ValueKind::Object => "object",
        }
    }

    /// Object references cannot round-trip through the generic JSON payload.
    #[inline]
    pub fn is_object(self) -> bool {
        matches!(self, ValueKind::Object)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-owning reference to a scene object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// RGBA color (linear by convention).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const CLEAR: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    pub const fn grey(v: f32, a: f32) -> Self {
        Color::rgba(v, v, v, a)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from(a: [f32; 4]) -> Self {
        Color::rgba(a[0], a[1], a[2], a[3])
    }
}

/// Per-state tint colors of a selectable control.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorBlock {
    pub normal: Color,
    pub highlighted: Color,
    pub pressed: Color,
    pub disabled: Color,
    pub color_multiplier: f32,
    pub fade_duration: f32,
}

impl Default for ColorBlock {
    fn default() -> Self {
        ColorBlock {
            normal: Color::WHITE,
            highlighted: Color::grey(0.96, 1.0),
            pressed: Color::grey(0.78, 1.0),
            disabled: Color::grey(0.78, 0.5),
            color_multiplier: 1.0,
            fade_duration: 0.1,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientColorKey {
    pub color: Color,
    pub time: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientAlphaKey {
    pub alpha: f32,
    pub time: f32,
}

/// Color gradient described by color and alpha keys over `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub color_keys: Vec<GradientColorKey>,
    pub alpha_keys: Vec<GradientAlphaKey>,
}

impl Default for Gradient {
    fn default() -> Self {
        Gradient {
            color_keys: vec![
                GradientColorKey {
                    color: Color::WHITE,
                    time: 0.0,
                },
                GradientColorKey {
                    color: Color::WHITE,
                    time: 1.0,
                },
            ],
            alpha_keys: vec![
                GradientAlphaKey {
                    alpha: 1.0,
                    time: 0.0,
                },
                GradientAlphaKey {
                    alpha: 1.0,
                    time: 1.0,
                },
            ],
        }
    }
}

/// One key of an [`AnimationCurve`] (Hermite tangents).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationCurve {
    pub keys: Vec<Keyframe>,
}

impl AnimationCurve {
    /// Straight line between two keys; tangents follow the slope.
    pub fn linear(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        let slope = if t1 == t0 { 0.0 } else { (v1 - v0) / (t1 - t0) };
        AnimationCurve {
            keys: vec![
                Keyframe {
                    time: t0,
                    value: v0,
                    in_tangent: slope,
                    out_tangent: slope,
                },
                Keyframe {
                    time: t1,
                    value: v1,
                    in_tangent: slope,
                    out_tangent: slope,
                },
            ],
        }
    }
}

impl Default for AnimationCurve {
    fn default() -> Self {
        AnimationCurve::linear(0.0, 0.0, 1.0, 1.0)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

/// Integer-backed enum argument; the enum type itself is named by the argument type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumValue(pub i32);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Value {
    Bool(bool),

    /// 32-bit integer
    Int(i32),

    /// 64-bit integer
    Long(i64),

    /// Scalar float
    Float(f32),

    /// Text / string
    Text(String),

    Color(Color),

    ColorBlock(ColorBlock),

    /// 2D vector
    Vec2([f32; 2]),

    /// 3D vector
    Vec3([f32; 3]),

    /// 4D vector
    Vec4([f32; 4]),

    Gradient(Gradient),

    Curve(AnimationCurve),

    LayerMask(LayerMask),

    Enum(EnumValue),

    /// Optional reference to a scene object
    Object(Option<ObjectId>),
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Color(_) => ValueKind::Color,
            Value::ColorBlock(_) => ValueKind::ColorBlock,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::Gradient(_) => ValueKind::Gradient,
            Value::Curve(_) => ValueKind::Curve,
            Value::LayerMask(_) => ValueKind::LayerMask,
            Value::Enum(_) => ValueKind::Enum,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// False when any float inside the value is NaN or infinite. JSON has no
    /// spelling for those, so they cannot be saved.
    pub fn is_finite(&self) -> bool {
        fn color(c: &Color) -> bool {
            c.to_array().iter().all(|f| f.is_finite())
        }
        match self {
            Value::Float(f) => f.is_finite(),
            Value::Vec2(a) => a.iter().all(|f| f.is_finite()),
            Value::Vec3(a) => a.iter().all(|f| f.is_finite()),
            Value::Vec4(a) => a.iter().all(|f| f.is_finite()),
            Value::Color(c) => color(c),
            Value::ColorBlock(b) => {
                [b.normal, b.highlighted, b.pressed, b.disabled].iter().all(color)
                    && b.color_multiplier.is_finite()
                    && b.fade_duration.is_finite()
            }
            Value::Gradient(g) => {
                g.color_keys
                    .iter()
                    .all(|k| color(&k.color) && k.time.is_finite())
                    && g.alpha_keys
                        .iter()
                        .all(|k| k.alpha.is_finite() && k.time.is_finite())
            }
            Value::Curve(c) => c.keys.iter().all(|k| {
                [k.time, k.value, k.in_tangent, k.out_tangent]
                    .iter()
                    .all(|f| f.is_finite())
            }),
            Value::Bool(_)
            | Value::Int(_)
            | Value::Long(_)
            | Value::Text(_)
            | Value::LayerMask(_)
            | Value::Enum(_)
            | Value::Object(_) => true,
        }
    }

    /// Default-constructed value of a kind.
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int => Value::Int(0),
            ValueKind::Long => Value::Long(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::Color => Value::Color(Color::default()),
            ValueKind::ColorBlock => Value::ColorBlock(ColorBlock::default()),
            ValueKind::Vec2 => Value::Vec2([0.0; 2]),
            ValueKind::Vec3 => Value::Vec3([0.0; 3]),
            ValueKind::Vec4 => Value::Vec4([0.0; 4]),
            ValueKind::Gradient => Value::Gradient(Gradient::default()),
            ValueKind::Curve => Value::Curve(AnimationCurve::default()),
            ValueKind::LayerMask => Value::LayerMask(LayerMask::default()),
            ValueKind::Enum => Value::Enum(EnumValue::default()),
            ValueKind::Object => Value::Object(None),
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn color(r: f32, g: f32, b: f32, a: f32) -> Self {
        Value::Color(Color::rgba(r, g, b, a))
    }
}

/// Concrete Rust type backing one [`ValueKind`].
///
/// `TYPE_NAME` is the argument-type name used in method identifiers when a
/// method is registered without an explicit argument type.
pub trait TypedValue:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + 'static
{
    const KIND: ValueKind;
    const TYPE_NAME: &'static str;

    fn default_value() -> Self;
    fn into_value(self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! typed_value {
    ($ty:ty, $kind:ident, $name:literal, $default:expr) => {
        impl TypedValue for $ty {
            const KIND: ValueKind = ValueKind::$kind;
            const TYPE_NAME: &'static str = $name;

            #[inline]
            fn default_value() -> Self {
                $default
            }

            #[inline]
            fn into_value(self) -> Value {
                Value::$kind(self)
            }

            #[inline]
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$kind(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

typed_value!(bool, Bool, "bool", false);
typed_value!(i32, Int, "int", 0);
typed_value!(i64, Long, "long", 0);
typed_value!(f32, Float, "float", 0.0);
typed_value!(String, Text, "string", String::new());
typed_value!(Color, Color, "Color", Color::default());
typed_value!(ColorBlock, ColorBlock, "ColorBlock", ColorBlock::default());
typed_value!([f32; 2], Vec2, "Vector2", [0.0; 2]);
typed_value!([f32; 3], Vec3, "Vector3", [0.0; 3]);
typed_value!([f32; 4], Vec4, "Vector4", [0.0; 4]);
typed_value!(Gradient, Gradient, "Gradient", Gradient::default());
typed_value!(AnimationCurve, Curve, "AnimationCurve", AnimationCurve::default());
typed_value!(LayerMask, LayerMask, "LayerMask", LayerMask::default());
typed_value!(EnumValue, Enum, "Enum", EnumValue::default());
typed_value!(Option<ObjectId>, Object, "Object", None);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_kind() {
        for kind in ValueKind::ALL {
            assert_eq!(Value::default_for(kind).kind(), kind);
        }
    }

    #[test]
    fn color_defaults_to_white() {
        assert_eq!(Color::default(), Color::WHITE);
        assert_eq!(Value::default_for(ValueKind::Color), Value::Color(Color::WHITE));
    }

    #[test]
    fn curve_default_is_linear_identity() {
        let curve = AnimationCurve::default();
        assert_eq!(curve.keys.len(), 2);
        assert_eq!(curve.keys[0].value, 0.0);
        assert_eq!(curve.keys[1].value, 1.0);
        assert_eq!(curve.keys[0].out_tangent, 1.0);
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let s = serde_json::to_string(&Value::Vec2([1.0, 2.0])).unwrap();
        assert_eq!(s, r#"{"type":"vec2","data":[1.0,2.0]}"#);
        let back: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(back, Value::Vec2([1.0, 2.0]));
    }

    #[test]
    fn typed_value_rejects_other_kinds() {
        assert_eq!(f32::from_value(&Value::Float(0.5)), Some(0.5));
        assert_eq!(f32::from_value(&Value::Int(1)), None);
        assert_eq!(
            <Option<ObjectId>>::from_value(&Value::Object(Some(ObjectId(3)))),
            Some(Some(ObjectId(3)))
        );
    }

    #[test]
    fn non_finite_floats_are_detected_inside_nested_values() {
        assert!(Value::Float(1.5).is_finite());
        assert!(!Value::Float(f32::NAN).is_finite());
        assert!(!Value::Vec3([0.0, f32::INFINITY, 0.0]).is_finite());
        let mut curve = AnimationCurve::default();
        curve.keys[1].out_tangent = f32::NEG_INFINITY;
        assert!(!Value::Curve(curve).is_finite());
        assert!(Value::text("NaN").is_finite());
        for kind in ValueKind::ALL {
            assert!(Value::default_for(kind).is_finite(), "{kind} default");
        }
    }
}
