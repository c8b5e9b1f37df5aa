//! Per-kind argument storage for property bindings.
//!
//! A `ParameterList` holds a dense, 0-indexed sequence of values of exactly one
//! [`ValueKind`]. There is one storage per list: the boxed [`Value`] view
//! (`get`/`set`) and the typed slice view (`get_raw`/`as_slice`) read and write
//! the same vector.

use serde_json::Value as JsonValue;
use toggle_api_core::json::{parse_elements, JsonError};
use toggle_api_core::{
    AnimationCurve, Color, ColorBlock, EnumValue, Gradient, LayerMask, ObjectId, TypedValue,
    Value, ValueKind,
};

use crate::error::PropertyError;

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterList {
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Text(Vec<String>),
    Color(Vec<Color>),
    ColorBlock(Vec<ColorBlock>),
    Vec2(Vec<[f32; 2]>),
    Vec3(Vec<[f32; 3]>),
    Vec4(Vec<[f32; 4]>),
    Gradient(Vec<Gradient>),
    Curve(Vec<AnimationCurve>),
    LayerMask(Vec<LayerMask>),
    Enum(Vec<EnumValue>),
    Object(Vec<Option<ObjectId>>),
}

macro_rules! each_list {
    ($list:expr, $v:ident => $body:expr) => {
        match $list {
            ParameterList::Bool($v) => $body,
            ParameterList::Int($v) => $body,
            ParameterList::Long($v) => $body,
            ParameterList::Float($v) => $body,
            ParameterList::Text($v) => $body,
            ParameterList::Color($v) => $body,
            ParameterList::ColorBlock($v) => $body,
            ParameterList::Vec2($v) => $body,
            ParameterList::Vec3($v) => $body,
            ParameterList::Vec4($v) => $body,
            ParameterList::Gradient($v) => $body,
            ParameterList::Curve($v) => $body,
            ParameterList::LayerMask($v) => $body,
            ParameterList::Enum($v) => $body,
            ParameterList::Object($v) => $body,
        }
    };
}

/// Types that can live in a [`ParameterList`]; gives typed access to the
/// matching variant.
pub trait ListElement: TypedValue {
    fn list(list: &ParameterList) -> Option<&Vec<Self>>;
    fn list_mut(list: &mut ParameterList) -> Option<&mut Vec<Self>>;
    fn wrap(values: Vec<Self>) -> ParameterList;
}

macro_rules! list_element {
    ($ty:ty, $variant:ident) => {
        impl ListElement for $ty {
            fn list(list: &ParameterList) -> Option<&Vec<Self>> {
                match list {
                    ParameterList::$variant(v) => Some(v),
                    _ => None,
                }
            }
            fn list_mut(list: &mut ParameterList) -> Option<&mut Vec<Self>> {
                match list {
                    ParameterList::$variant(v) => Some(v),
                    _ => None,
                }
            }
            fn wrap(values: Vec<Self>) -> ParameterList {
                ParameterList::$variant(values)
            }
        }
    };
}

list_element!(bool, Bool);
list_element!(i32, Int);
list_element!(i64, Long);
list_element!(f32, Float);
list_element!(String, Text);
list_element!(Color, Color);
list_element!(ColorBlock, ColorBlock);
list_element!([f32; 2], Vec2);
list_element!([f32; 3], Vec3);
list_element!([f32; 4], Vec4);
list_element!(Gradient, Gradient);
list_element!(AnimationCurve, Curve);
list_element!(LayerMask, LayerMask);
list_element!(EnumValue, Enum);
list_element!(Option<ObjectId>, Object);

fn boxed<T: TypedValue>(values: &[T], index: usize) -> Result<Value, PropertyError> {
    values
        .get(index)
        .cloned()
        .map(T::into_value)
        .ok_or(PropertyError::IndexOutOfRange {
            index,
            count: values.len(),
        })
}

fn encode<T: TypedValue>(values: &[T]) -> Result<JsonValue, JsonError> {
    let mut items = Vec::with_capacity(values.len());
    for (index, v) in values.iter().enumerate() {
        if !v.clone().into_value().is_finite() {
            return Err(JsonError::NonFinite { kind: T::KIND, index });
        }
        let item = serde_json::to_value(v).map_err(|e| JsonError::Element {
            kind: T::KIND,
            index,
            reason: e.to_string(),
        })?;
        items.push(item);
    }
    Ok(JsonValue::Array(items))
}

fn store<T: TypedValue>(values: &mut [T], index: usize, value: &Value) -> Result<(), PropertyError> {
    let count = values.len();
    let slot = values
        .get_mut(index)
        .ok_or(PropertyError::IndexOutOfRange { index, count })?;
    *slot = T::from_value(value).ok_or(PropertyError::KindMismatch {
        expected: T::KIND,
        actual: value.kind(),
    })?;
    Ok(())
}

fn fit<T: TypedValue>(values: &mut Vec<T>, len: usize) {
    values.resize_with(len, T::default_value);
}

impl ParameterList {
    /// Empty list of the given kind.
    pub fn empty(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => ParameterList::Bool(Vec::new()),
            ValueKind::Int => ParameterList::Int(Vec::new()),
            ValueKind::Long => ParameterList::Long(Vec::new()),
            ValueKind::Float => ParameterList::Float(Vec::new()),
            ValueKind::Text => ParameterList::Text(Vec::new()),
            ValueKind::Color => ParameterList::Color(Vec::new()),
            ValueKind::ColorBlock => ParameterList::ColorBlock(Vec::new()),
            ValueKind::Vec2 => ParameterList::Vec2(Vec::new()),
            ValueKind::Vec3 => ParameterList::Vec3(Vec::new()),
            ValueKind::Vec4 => ParameterList::Vec4(Vec::new()),
            ValueKind::Gradient => ParameterList::Gradient(Vec::new()),
            ValueKind::Curve => ParameterList::Curve(Vec::new()),
            ValueKind::LayerMask => ParameterList::LayerMask(Vec::new()),
            ValueKind::Enum => ParameterList::Enum(Vec::new()),
            ValueKind::Object => ParameterList::Object(Vec::new()),
        }
    }

    /// `len` default values of the given kind.
    pub fn with_len(kind: ValueKind, len: usize) -> Self {
        let mut list = Self::empty(kind);
        list.resize(len);
        list
    }

    pub fn of<T: ListElement>(values: Vec<T>) -> Self {
        T::wrap(values)
    }

    /// Build a list from boxed values, all of which must carry `kind`.
    pub fn from_values(kind: ValueKind, values: Vec<Value>) -> Result<Self, PropertyError> {
        let mut list = Self::with_len(kind, values.len());
        for (i, v) in values.iter().enumerate() {
            list.set(i, v.clone())?;
        }
        Ok(list)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ParameterList::Bool(_) => ValueKind::Bool,
            ParameterList::Int(_) => ValueKind::Int,
            ParameterList::Long(_) => ValueKind::Long,
            ParameterList::Float(_) => ValueKind::Float,
            ParameterList::Text(_) => ValueKind::Text,
            ParameterList::Color(_) => ValueKind::Color,
            ParameterList::ColorBlock(_) => ValueKind::ColorBlock,
            ParameterList::Vec2(_) => ValueKind::Vec2,
            ParameterList::Vec3(_) => ValueKind::Vec3,
            ParameterList::Vec4(_) => ValueKind::Vec4,
            ParameterList::Gradient(_) => ValueKind::Gradient,
            ParameterList::Curve(_) => ValueKind::Curve,
            ParameterList::LayerMask(_) => ValueKind::LayerMask,
            ParameterList::Enum(_) => ValueKind::Enum,
            ParameterList::Object(_) => ValueKind::Object,
        }
    }

    pub fn count(&self) -> usize {
        each_list!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Boxed read of slot `index`.
    pub fn get(&self, index: usize) -> Result<Value, PropertyError> {
        each_list!(self, v => boxed(v, index))
    }

    /// Boxed write of slot `index`; the value must carry this list's kind
    /// and only finite floats.
    pub fn set(&mut self, index: usize, value: Value) -> Result<(), PropertyError> {
        let expected = self.kind();
        if value.kind() != expected {
            return Err(PropertyError::KindMismatch {
                expected,
                actual: value.kind(),
            });
        }
        if !value.is_finite() {
            return Err(PropertyError::NonFinite { index });
        }
        each_list!(self, v => store(v, index, &value))
    }

    /// Truncate from the tail or append defaults until `count() == len`.
    pub fn resize(&mut self, len: usize) {
        each_list!(self, v => fit(v, len))
    }

    pub fn as_slice<T: ListElement>(&self) -> Option<&[T]> {
        T::list(self).map(Vec::as_slice)
    }

    pub fn as_mut_slice<T: ListElement>(&mut self) -> Option<&mut [T]> {
        T::list_mut(self).map(Vec::as_mut_slice)
    }

    /// Typed read of slot `index`.
    pub fn get_raw<T: ListElement>(&self, index: usize) -> Result<&T, PropertyError> {
        let values = T::list(self).ok_or(PropertyError::KindMismatch {
            expected: T::KIND,
            actual: self.kind(),
        })?;
        values.get(index).ok_or(PropertyError::IndexOutOfRange {
            index,
            count: values.len(),
        })
    }

    /// Serialized payload: non-object kinds as a JSON array, object kinds as
    /// a separate reference array (the JSON side is then `null`). Fails on
    /// NaN or infinite floats, which JSON cannot carry.
    pub fn to_payload(&self) -> Result<(JsonValue, Vec<Option<ObjectId>>), JsonError> {
        if let ParameterList::Object(refs) = self {
            return Ok((JsonValue::Null, refs.clone()));
        }
        each_list!(self, v => encode(v)).map(|json| (json, Vec::new()))
    }

    /// Inverse of [`ParameterList::to_payload`].
    pub fn from_payload(
        kind: ValueKind,
        payload: &JsonValue,
        objects: &[Option<ObjectId>],
    ) -> Result<Self, JsonError> {
        Ok(match kind {
            ValueKind::Bool => ParameterList::Bool(parse_elements(payload)?),
            ValueKind::Int => ParameterList::Int(parse_elements(payload)?),
            ValueKind::Long => ParameterList::Long(parse_elements(payload)?),
            ValueKind::Float => ParameterList::Float(parse_elements(payload)?),
            ValueKind::Text => ParameterList::Text(parse_elements(payload)?),
            ValueKind::Color => ParameterList::Color(parse_elements(payload)?),
            ValueKind::ColorBlock => ParameterList::ColorBlock(parse_elements(payload)?),
            ValueKind::Vec2 => ParameterList::Vec2(parse_elements(payload)?),
            ValueKind::Vec3 => ParameterList::Vec3(parse_elements(payload)?),
            ValueKind::Vec4 => ParameterList::Vec4(parse_elements(payload)?),
            ValueKind::Gradient => ParameterList::Gradient(parse_elements(payload)?),
            ValueKind::Curve => ParameterList::Curve(parse_elements(payload)?),
            ValueKind::LayerMask => ParameterList::LayerMask(parse_elements(payload)?),
            ValueKind::Enum => ParameterList::Enum(parse_elements(payload)?),
            ValueKind::Object => ParameterList::Object(objects.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resize_preserves_prefix_and_defaults_tail() {
        let mut list = ParameterList::of(vec![1.0f32, 2.0, 3.0]);
        list.resize(5);
        assert_eq!(list.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0, 0.0, 0.0]);
        list.resize(2);
        assert_eq!(list.as_slice::<f32>().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn growth_uses_kind_defaults() {
        let list = ParameterList::with_len(ValueKind::Color, 2);
        assert_eq!(list.get(1).unwrap(), Value::Color(Color::WHITE));
        let list = ParameterList::with_len(ValueKind::Text, 1);
        assert_eq!(list.get(0).unwrap(), Value::text(""));
    }

    #[test]
    fn boxed_and_typed_views_share_storage() {
        let mut list = ParameterList::with_len(ValueKind::Text, 2);
        list.set(1, Value::text("on")).unwrap();
        assert_eq!(list.get_raw::<String>(1).unwrap(), "on");
        list.as_mut_slice::<String>().unwrap()[0] = "off".into();
        assert_eq!(list.get(0).unwrap(), Value::text("off"));
    }

    #[test]
    fn out_of_range_and_kind_mismatch() {
        let mut list = ParameterList::with_len(ValueKind::Bool, 2);
        assert!(matches!(
            list.get(2),
            Err(PropertyError::IndexOutOfRange { index: 2, count: 2 })
        ));
        assert!(matches!(
            list.set(0, Value::Float(1.0)),
            Err(PropertyError::KindMismatch {
                expected: ValueKind::Bool,
                actual: ValueKind::Float
            })
        ));
        assert!(matches!(
            list.get_raw::<f32>(0),
            Err(PropertyError::KindMismatch { .. })
        ));
    }

    #[test]
    fn from_values_checks_every_element() {
        let ok = ParameterList::from_values(ValueKind::Int, vec![Value::Int(4), Value::Int(5)]);
        assert_eq!(ok.unwrap(), ParameterList::of(vec![4i32, 5]));
        let bad = ParameterList::from_values(ValueKind::Int, vec![Value::Bool(true)]);
        assert!(bad.is_err());
    }

    #[test]
    fn object_references_travel_outside_the_json_payload() {
        let list = ParameterList::of(vec![Some(ObjectId(3)), None]);
        let (json, refs) = list.to_payload().unwrap();
        assert_eq!(json, JsonValue::Null);
        let back = ParameterList::from_payload(ValueKind::Object, &json, &refs).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn payload_accepts_shorthand_elements() {
        let list =
            ParameterList::from_payload(ValueKind::Vec2, &json!([[1, 2], { "vec2": [3, 4] }]), &[])
                .unwrap();
        assert_eq!(list.as_slice::<[f32; 2]>().unwrap(), &[[1.0, 2.0], [3.0, 4.0]]);
        assert!(ParameterList::from_payload(ValueKind::Float, &json!("nope"), &[]).is_err());
    }

    #[test]
    fn payload_refuses_nested_non_finite_floats() {
        let mut list = ParameterList::of(vec![Color::BLACK, Color::WHITE]);
        assert!(matches!(
            list.set(0, Value::color(f32::NAN, 0.0, 0.0, 1.0)),
            Err(PropertyError::NonFinite { index: 0 })
        ));
        assert_eq!(list.get(0).unwrap(), Value::Color(Color::BLACK));

        list.as_mut_slice::<Color>().unwrap()[1].a = f32::NEG_INFINITY;
        assert!(matches!(
            list.to_payload(),
            Err(JsonError::NonFinite {
                kind: ValueKind::Color,
                index: 1
            })
        ));
    }
}
