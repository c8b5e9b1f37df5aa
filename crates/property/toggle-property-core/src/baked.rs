//! Baked dispatch: identifier keyed direct calls that skip reflective lookup.
//!
//! A baked setter reads its argument straight out of the typed parameter list
//! and calls the component method without boxing. The table is filled once
//! and never mutated after it is handed to a [`crate::Registry`]; identifiers
//! absent from it fall back to the reflective handle.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use toggle_api_core::method_id::encode;
use toggle_api_core::TypedValue;

use crate::error::{InvokeError, PropertyError};
use crate::parameter_list::{ListElement, ParameterList};
use crate::reflect::Component;

pub type BakedSetter = Arc<
    dyn Fn(&mut dyn Component, &ParameterList, usize) -> Result<(), PropertyError> + Send + Sync,
>;

#[derive(Clone, Default)]
pub struct BakedPropertyTable {
    entries: HashMap<String, BakedSetter>,
}

impl BakedPropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bake `C.method(A)` under the key `target_type;A::TYPE_NAME;method`.
    pub fn bake<C, A, F>(&mut self, target_type: &str, method: &str, f: F) -> &mut Self
    where
        C: Component,
        A: ListElement,
        F: Fn(&mut C, A) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        self.bake_as::<C, A, F>(target_type, A::TYPE_NAME, method, f)
    }

    /// Like [`BakedPropertyTable::bake`] with an explicit argument type name.
    pub fn bake_as<C, A, F>(
        &mut self,
        target_type: &str,
        argument_type: &str,
        method: &str,
        f: F,
    ) -> &mut Self
    where
        C: Component,
        A: ListElement,
        F: Fn(&mut C, A) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        let key = encode(target_type, argument_type, method);
        let expected = target_type.to_string();
        let method_id = key.clone();
        let setter: BakedSetter = Arc::new(
            move |target: &mut dyn Component, list: &ParameterList, index: usize| {
                let actual = target.type_name();
                let component = target.as_any_mut().downcast_mut::<C>().ok_or_else(|| {
                    PropertyError::TargetMismatch {
                        expected: expected.clone(),
                        actual: actual.to_string(),
                    }
                })?;
                let arg = list.get_raw::<A>(index)?.clone();
                f(component, arg).map_err(|source| PropertyError::InvocationFailure {
                    method_id: method_id.clone(),
                    source,
                })
            },
        );
        self.entries.insert(key, setter);
        self
    }

    pub fn get(&self, key: &str) -> Option<&BakedSetter> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Baked identifiers, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }
}

impl fmt::Debug for BakedPropertyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BakedPropertyTable")
            .field("entries", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_component;

    #[derive(Debug, Default)]
    struct Gauge {
        fill: f32,
    }
    impl_component!(Gauge, "Gauge");

    #[derive(Debug, Default)]
    struct Label;
    impl_component!(Label, "Label");

    #[test]
    fn baked_setter_reads_typed_slot() {
        let mut table = BakedPropertyTable::new();
        table.bake("Gauge", "set_fill", |g: &mut Gauge, v: f32| {
            g.fill = v;
            Ok(())
        });
        assert!(table.contains("Gauge;float;set_fill"));

        let list = ParameterList::of(vec![0.25f32, 0.75]);
        let mut gauge = Gauge::default();
        let setter = table.get("Gauge;float;set_fill").unwrap();
        setter(&mut gauge as &mut dyn Component, &list, 1).unwrap();
        assert_eq!(gauge.fill, 0.75);

        assert!(matches!(
            setter(&mut gauge as &mut dyn Component, &list, 2),
            Err(PropertyError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            setter(&mut Label as &mut dyn Component, &list, 0),
            Err(PropertyError::TargetMismatch { .. })
        ));
    }
}
