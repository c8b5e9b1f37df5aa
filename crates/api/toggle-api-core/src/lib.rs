//! toggle-api-core: value union & method identifiers (core, engine-agnostic)

pub mod coercion;
pub mod json;
pub mod method_id;
pub mod value;

pub use method_id::{MethodId, MethodIdError, SEPARATOR};
pub use value::{
    AnimationCurve, Color, ColorBlock, EnumValue, Gradient, GradientAlphaKey, GradientColorKey,
    Keyframe, LayerMask, ObjectId, TypedValue, Value, ValueKind,
};
