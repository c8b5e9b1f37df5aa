//! Property binding: a method identifier plus its per-index arguments.
//!
//! Loading resolves the identifier against a [`Registry`]. Any resolution
//! failure leaves the binding inert: it keeps its persisted fields so it still
//! round-trips, but invoking it does nothing. The reflective handle is looked
//! up lazily, once per load.

use std::fmt;
use std::sync::Arc;

use log::{error, warn};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use toggle_api_core::method_id::{display_name, encode};
use toggle_api_core::{MethodId, ObjectId};

use crate::baked::BakedSetter;
use crate::error::PropertyError;
use crate::parameter_list::ParameterList;
use crate::reflect::{Component, MethodHandle, TypeInfo};
use crate::registry::Registry;

/// Persisted form of a [`Property`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub target_type: String,
    pub argument_type: String,
    pub method_name: String,
    /// Kind-specific JSON array; `null` for object reference kinds.
    #[serde(default)]
    pub parameters: JsonValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_parameters: Vec<Option<ObjectId>>,
}

impl PropertyRecord {
    pub fn new(method_id: &MethodId, parameters: JsonValue) -> Self {
        Self {
            target_type: method_id.target_type().to_string(),
            argument_type: method_id.argument_type().to_string(),
            method_name: method_id.method_name().to_string(),
            parameters,
            object_parameters: Vec::new(),
        }
    }
}

struct Resolved {
    type_info: Arc<TypeInfo>,
    baked: Option<BakedSetter>,
    method: OnceCell<Option<MethodHandle>>,
}

pub struct Property {
    target_type: String,
    argument_type: String,
    method_name: String,
    key: String,
    raw_parameters: JsonValue,
    raw_objects: Vec<Option<ObjectId>>,
    parameters: Option<ParameterList>,
    resolved: Option<Resolved>,
    error: Option<PropertyError>,
}

impl Property {
    /// Bind `method_id` with an already built parameter list. The list kind
    /// must match the argument type's kind.
    pub fn new(method_id: &MethodId, parameters: ParameterList, registry: &Registry) -> Self {
        let mut property = Self::unloaded(PropertyRecord::new(method_id, JsonValue::Null));
        property.parameters = Some(parameters);
        property.reload(registry);
        property
    }

    pub fn from_record(record: PropertyRecord, registry: &Registry) -> Self {
        let mut property = Self::unloaded(record);
        property.reload(registry);
        property
    }

    fn unloaded(record: PropertyRecord) -> Self {
        let key = encode(&record.target_type, &record.argument_type, &record.method_name);
        Self {
            target_type: record.target_type,
            argument_type: record.argument_type,
            method_name: record.method_name,
            key,
            raw_parameters: record.parameters,
            raw_objects: record.object_parameters,
            parameters: None,
            resolved: None,
            error: None,
        }
    }

    /// Re-run deserialization against `registry`, dropping every cached
    /// resolution first.
    pub fn reload(&mut self, registry: &Registry) {
        self.resolved = None;
        self.error = None;
        let live = self.parameters.take();
        if let Some(list) = &live {
            match list.to_payload() {
                Ok((json, objects)) => {
                    self.raw_parameters = json;
                    self.raw_objects = objects;
                }
                Err(e) => {
                    error!("property {} is inert: {e}", self.display_name());
                    self.error = Some(e.into());
                    return;
                }
            }
        }
        match self.resolve(registry, live) {
            Ok((list, resolved)) => {
                self.parameters = Some(list);
                self.resolved = Some(resolved);
            }
            Err(e) => {
                error!("property {} is inert: {e}", self.display_name());
                self.error = Some(e);
            }
        }
    }

    fn resolve(
        &self,
        registry: &Registry,
        live: Option<ParameterList>,
    ) -> Result<(ParameterList, Resolved), PropertyError> {
        MethodId::new(&self.target_type, &self.argument_type, &self.method_name)?;
        let type_info = registry.types.resolve_type(&self.target_type)?.clone();
        let kind = registry.types.resolve_kind(&self.argument_type)?;
        let baked = registry.baked.get(&self.key).cloned();
        if baked.is_none() && !type_info.has_method(&self.method_name, &self.argument_type) {
            return Err(PropertyError::UnresolvableMethod {
                type_name: self.target_type.clone(),
                argument_type: self.argument_type.clone(),
                method_name: self.method_name.clone(),
            });
        }
        let list = match live {
            Some(list) if list.kind() == kind => list,
            Some(_) => {
                return Err(PropertyError::ParameterKindMismatch {
                    type_name: self.argument_type.clone(),
                })
            }
            None => ParameterList::from_payload(kind, &self.raw_parameters, &self.raw_objects)?,
        };
        Ok((
            list,
            Resolved {
                type_info,
                baked,
                method: OnceCell::new(),
            },
        ))
    }

    /// Invoke with the argument at `index`, reporting failures to the caller.
    /// Inert bindings succeed without effect.
    pub fn try_invoke(&self, target: &mut dyn Component, index: usize) -> Result<(), PropertyError> {
        let (Some(list), Some(resolved)) = (&self.parameters, &self.resolved) else {
            return Ok(());
        };
        if index >= list.count() {
            return Err(PropertyError::IndexOutOfRange {
                index,
                count: list.count(),
            });
        }
        if target.type_name() != resolved.type_info.name() {
            return Err(PropertyError::TargetMismatch {
                expected: self.target_type.clone(),
                actual: target.type_name().to_string(),
            });
        }
        if let Some(baked) = &resolved.baked {
            return baked(target, list, index);
        }
        let method = resolved
            .method
            .get_or_init(|| resolved.type_info.method(&self.method_name, &self.argument_type));
        let Some(method) = method else {
            warn!("property {} is not invokable", self.display_name());
            return Ok(());
        };
        let arg = list.get(index)?;
        method(target, &arg).map_err(|source| PropertyError::InvocationFailure {
            method_id: self.key.clone(),
            source,
        })
    }

    /// Invoke and log any failure; never propagates.
    pub fn invoke(&self, target: &mut dyn Component, index: usize) {
        if let Err(e) = self.try_invoke(target, index) {
            error!("property {} failed: {e}", self.key);
        }
    }

    pub fn to_record(&self) -> PropertyRecord {
        let stored = || (self.raw_parameters.clone(), self.raw_objects.clone());
        let (parameters, object_parameters) = match &self.parameters {
            Some(list) => list.to_payload().unwrap_or_else(|e| {
                error!("property {} keeps its last saved parameters: {e}", self.key);
                stored()
            }),
            None => stored(),
        };
        PropertyRecord {
            target_type: self.target_type.clone(),
            argument_type: self.argument_type.clone(),
            method_name: self.method_name.clone(),
            parameters,
            object_parameters,
        }
    }

    /// Identity key `target;argument;method`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn method_id(&self) -> Option<MethodId> {
        MethodId::new(&self.target_type, &self.argument_type, &self.method_name).ok()
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    pub fn argument_type(&self) -> &str {
        &self.argument_type
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn display_name(&self) -> String {
        display_name(&self.target_type, &self.argument_type, &self.method_name)
    }

    pub fn parameters(&self) -> Option<&ParameterList> {
        self.parameters.as_ref()
    }

    pub fn parameters_mut(&mut self) -> Option<&mut ParameterList> {
        self.parameters.as_mut()
    }

    /// Fit the argument list to `len` slots. No-op on inert bindings.
    pub fn resize(&mut self, len: usize) {
        if let Some(list) = &mut self.parameters {
            list.resize(len);
        }
    }

    pub fn has_parse_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&PropertyError> {
        self.error.as_ref()
    }

    pub fn is_baked(&self) -> bool {
        self.resolved.as_ref().is_some_and(|r| r.baked.is_some())
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("key", &self.key)
            .field("parameters", &self.parameters)
            .field("baked", &self.is_baked())
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{CanvasGroup, Image, Text};
    use serde_json::json;
    use toggle_api_core::json::JsonError;
    use toggle_api_core::{Color, Value, ValueKind};

    fn record(target: &str, arg: &str, method: &str, parameters: JsonValue) -> PropertyRecord {
        PropertyRecord {
            target_type: target.into(),
            argument_type: arg.into(),
            method_name: method.into(),
            parameters,
            object_parameters: Vec::new(),
        }
    }

    #[test]
    fn baked_and_reflective_paths_both_apply() {
        let reg = Registry::global();
        let baked = Property::from_record(
            record("Text", "string", "set_text", json!(["off", "on"])),
            reg,
        );
        let reflective = Property::from_record(
            record("Text", "int", "set_font_size", json!([10, 20])),
            reg,
        );
        assert!(baked.is_baked());
        assert!(!reflective.is_baked());

        let mut text = Text::default();
        baked.try_invoke(&mut text, 1).unwrap();
        reflective.try_invoke(&mut text, 1).unwrap();
        assert_eq!(text.text, "on");
        assert_eq!(text.font_size, 20);
    }

    #[test]
    fn unresolvable_method_is_inert_and_round_trips() {
        let rec = record("Text", "string", "set_headline", json!(["a"]));
        let prop = Property::from_record(rec.clone(), Registry::global());
        assert!(prop.has_parse_error());
        assert!(matches!(
            prop.error(),
            Some(PropertyError::UnresolvableMethod { .. })
        ));
        let mut text = Text::default();
        prop.invoke(&mut text, 0);
        assert_eq!(text, Text::default());
        assert_eq!(prop.to_record(), rec);
    }

    #[test]
    fn load_failures_map_to_error_kinds() {
        let reg = Registry::global();
        let unknown_type = Property::from_record(record("Slider", "float", "set_value", json!([])), reg);
        assert!(matches!(
            unknown_type.error(),
            Some(PropertyError::UnresolvableType { .. })
        ));
        let opaque = Property::from_record(record("Text", "Font", "set_font", json!([])), reg);
        assert!(matches!(
            opaque.error(),
            Some(PropertyError::ParameterKindMismatch { .. })
        ));
        let malformed = Property::from_record(record("Te;xt", "string", "set_text", json!([])), reg);
        assert!(matches!(
            malformed.error(),
            Some(PropertyError::MalformedIdentifier(_))
        ));
        let bad_payload =
            Property::from_record(record("Text", "string", "set_text", json!({"a": 1})), reg);
        assert!(matches!(
            bad_payload.error(),
            Some(PropertyError::MalformedParameters(_))
        ));
    }

    #[test]
    fn invocation_failure_is_reported_then_swallowed() {
        let prop = Property::from_record(
            record("Text", "int", "set_font_size", json!([-3])),
            Registry::global(),
        );
        let mut text = Text::default();
        assert!(matches!(
            prop.try_invoke(&mut text, 0),
            Err(PropertyError::InvocationFailure { .. })
        ));
        prop.invoke(&mut text, 0);
        assert_eq!(text.font_size, Text::default().font_size);
    }

    #[test]
    fn target_and_index_are_checked() {
        let prop = Property::from_record(
            record("CanvasGroup", "float", "set_alpha", json!([0.5])),
            Registry::global(),
        );
        let mut image = Image::default();
        assert!(matches!(
            prop.try_invoke(&mut image, 0),
            Err(PropertyError::TargetMismatch { .. })
        ));
        let mut group = CanvasGroup::default();
        assert!(matches!(
            prop.try_invoke(&mut group, 1),
            Err(PropertyError::IndexOutOfRange { index: 1, count: 1 })
        ));
    }

    #[test]
    fn new_checks_list_kind_and_reload_keeps_edits() {
        let reg = Registry::global();
        let id = MethodId::new("Image", "Color", "set_color").unwrap();
        let wrong = Property::new(&id, ParameterList::of(vec![1.0f32]), reg);
        assert!(wrong.has_parse_error());

        let mut prop = Property::new(&id, ParameterList::with_len(ValueKind::Color, 1), reg);
        prop.parameters_mut()
            .unwrap()
            .set(0, Value::Color(Color::BLACK))
            .unwrap();
        prop.reload(reg);
        let mut image = Image::default();
        prop.try_invoke(&mut image, 0).unwrap();
        assert_eq!(image.color, Color::BLACK);
        assert_eq!(prop.display_name(), "Image.color (Color)");
    }

    #[test]
    fn non_finite_floats_never_reach_a_saved_record() {
        let reg = Registry::global();
        let id = MethodId::new("CanvasGroup", "float", "set_alpha").unwrap();
        let mut prop = Property::new(&id, ParameterList::of(vec![0.25f32, 1.0]), reg);
        assert!(matches!(
            prop.parameters_mut().unwrap().set(1, Value::Float(f32::NAN)),
            Err(PropertyError::NonFinite { index: 1 })
        ));
        let saved = prop.to_record();
        assert_eq!(saved.parameters, json!([0.25, 1.0]));
        let reloaded = Property::from_record(saved, reg);
        assert_eq!(reloaded.parameters(), prop.parameters());

        // Slice writes skip the check; saving keeps the last good payload.
        prop.parameters_mut().unwrap().as_mut_slice::<f32>().unwrap()[0] = f32::INFINITY;
        assert_eq!(prop.to_record().parameters, json!([0.25, 1.0]));
        prop.reload(reg);
        assert!(matches!(
            prop.error(),
            Some(PropertyError::MalformedParameters(JsonError::NonFinite { index: 0, .. }))
        ));
        assert_eq!(prop.to_record().parameters, json!([0.25, 1.0]));
    }
}
