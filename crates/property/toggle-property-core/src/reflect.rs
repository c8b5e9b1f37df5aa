//! Reflective side of property dispatch.
//!
//! Components register their single-argument methods by name as typed closures.
//! A binding resolves its (target type, argument type, method) triple against
//! this registry at load time; unknown names leave the binding inert.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use hashbrown::HashMap;
use toggle_api_core::coercion::coerce;
use toggle_api_core::{TypedValue, Value, ValueKind};

use crate::error::{InvokeError, PropertyError};

/// A live component instance that bindings can target.
pub trait Component: Any + fmt::Debug {
    /// Registered type name, matched against a binding's target type.
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Implement [`Component`] for a concrete type under a registered name.
#[macro_export]
macro_rules! impl_component {
    ($ty:ty, $name:expr) => {
        impl $crate::reflect::Component for $ty {
            fn type_name(&self) -> &'static str {
                $name
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    };
}

pub type MethodHandle =
    Arc<dyn Fn(&mut dyn Component, &Value) -> Result<(), InvokeError> + Send + Sync>;
pub type ComponentFactory = Arc<dyn Fn() -> Box<dyn Component> + Send + Sync>;

/// How an argument type name maps onto parameter storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    Value(ValueKind),
    /// Known type with no parameter list kind (e.g. a font handle).
    Opaque,
}

/// Reflected metadata of one component type.
#[derive(Clone)]
pub struct TypeInfo {
    name: String,
    factory: ComponentFactory,
    methods: HashMap<(String, String), MethodHandle>,
}

impl TypeInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_method(&self, method_name: &str, argument_type: &str) -> bool {
        self.methods
            .contains_key(&(method_name.to_string(), argument_type.to_string()))
    }

    pub fn method(&self, method_name: &str, argument_type: &str) -> Option<MethodHandle> {
        self.methods
            .get(&(method_name.to_string(), argument_type.to_string()))
            .cloned()
    }

    /// (method, argument type) pairs, sorted.
    pub fn methods(&self) -> Vec<(String, String)> {
        let mut out: Vec<_> = self.methods.keys().cloned().collect();
        out.sort();
        out
    }

    pub fn create(&self) -> Box<dyn Component> {
        (self.factory)()
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("methods", &self.methods())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<TypeInfo>>,
    arguments: HashMap<String, ArgumentType>,
}

macro_rules! register_primitive {
    ($reg:expr, $($ty:ty),+ $(,)?) => {
        $( $reg.register_argument(<$ty as TypedValue>::TYPE_NAME, ArgumentType::Value(<$ty as TypedValue>::KIND)); )+
    };
}

impl TypeRegistry {
    /// Registry knowing every primitive argument type and no components.
    pub fn new() -> Self {
        let mut reg = TypeRegistry::default();
        register_primitive!(
            reg,
            bool,
            i32,
            i64,
            f32,
            String,
            toggle_api_core::Color,
            toggle_api_core::ColorBlock,
            [f32; 2],
            [f32; 3],
            [f32; 4],
            toggle_api_core::Gradient,
            toggle_api_core::AnimationCurve,
            toggle_api_core::LayerMask,
            toggle_api_core::EnumValue,
            Option<toggle_api_core::ObjectId>,
        );
        reg
    }

    pub fn register_argument(&mut self, type_name: &str, arg: ArgumentType) {
        self.arguments.insert(type_name.to_string(), arg);
    }

    /// Integer-backed enum argument type.
    pub fn register_enum(&mut self, type_name: &str) {
        self.register_argument(type_name, ArgumentType::Value(ValueKind::Enum));
    }

    /// Object reference argument type.
    pub fn register_object_type(&mut self, type_name: &str) {
        self.register_argument(type_name, ArgumentType::Value(ValueKind::Object));
    }

    pub fn register_opaque_type(&mut self, type_name: &str) {
        self.register_argument(type_name, ArgumentType::Opaque);
    }

    /// Register (or extend) a component type and add methods through the
    /// returned builder.
    pub fn register_component<C: Component + Default>(
        &mut self,
        type_name: &str,
    ) -> ComponentBuilder<'_, C> {
        let name = type_name.to_string();
        self.types.entry(name.clone()).or_insert_with(|| {
            Arc::new(TypeInfo {
                name: name.clone(),
                factory: Arc::new(|| Box::new(C::default()) as Box<dyn Component>),
                methods: HashMap::new(),
            })
        });
        ComponentBuilder {
            registry: self,
            type_name: name,
            _component: PhantomData,
        }
    }

    pub fn resolve_type(&self, type_name: &str) -> Result<&Arc<TypeInfo>, PropertyError> {
        self.types
            .get(type_name)
            .ok_or_else(|| PropertyError::UnresolvableType {
                type_name: type_name.to_string(),
            })
    }

    /// Parameter list kind for an argument type name.
    pub fn resolve_kind(&self, argument_type: &str) -> Result<ValueKind, PropertyError> {
        match self.arguments.get(argument_type) {
            Some(ArgumentType::Value(kind)) => Ok(*kind),
            Some(ArgumentType::Opaque) => Err(PropertyError::ParameterKindMismatch {
                type_name: argument_type.to_string(),
            }),
            None => Err(PropertyError::UnresolvableType {
                type_name: argument_type.to_string(),
            }),
        }
    }

    /// Instantiate a registered component by name.
    pub fn create(&self, type_name: &str) -> Option<Box<dyn Component>> {
        self.types.get(type_name).map(|info| info.create())
    }

    pub fn type_names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.types.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }

    fn insert_method(&mut self, type_name: &str, method: &str, argument_type: &str, handle: MethodHandle) {
        if let Some(info) = self.types.get_mut(type_name) {
            Arc::make_mut(info)
                .methods
                .insert((method.to_string(), argument_type.to_string()), handle);
        }
    }
}

/// Adds methods to one registered component type.
pub struct ComponentBuilder<'a, C> {
    registry: &'a mut TypeRegistry,
    type_name: String,
    _component: PhantomData<fn() -> C>,
}

impl<C: Component> ComponentBuilder<'_, C> {
    /// Infallible method taking `A`, registered under `A::TYPE_NAME`.
    pub fn method<A, F>(self, name: &str, f: F) -> Self
    where
        A: TypedValue,
        F: Fn(&mut C, A) + Send + Sync + 'static,
    {
        self.try_method_as::<A, _>(name, A::TYPE_NAME, move |c, a| {
            f(c, a);
            Ok(())
        })
    }

    /// Infallible method whose argument type has a custom name (enums,
    /// object references).
    pub fn method_as<A, F>(self, name: &str, argument_type: &str, f: F) -> Self
    where
        A: TypedValue,
        F: Fn(&mut C, A) + Send + Sync + 'static,
    {
        self.try_method_as::<A, _>(name, argument_type, move |c, a| {
            f(c, a);
            Ok(())
        })
    }

    pub fn try_method<A, F>(self, name: &str, f: F) -> Self
    where
        A: TypedValue,
        F: Fn(&mut C, A) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        self.try_method_as::<A, _>(name, A::TYPE_NAME, f)
    }

    pub fn try_method_as<A, F>(self, name: &str, argument_type: &str, f: F) -> Self
    where
        A: TypedValue,
        F: Fn(&mut C, A) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        let type_name = self.type_name.clone();
        let handle: MethodHandle = Arc::new(move |target: &mut dyn Component, value: &Value| {
            let actual = target.type_name();
            let component = target.as_any_mut().downcast_mut::<C>().ok_or_else(|| {
                InvokeError::new(format!("target '{actual}' is not a '{type_name}'"))
            })?;
            let arg = A::from_value(value)
                .or_else(|| coerce(value, A::KIND).as_ref().and_then(A::from_value))
                .ok_or_else(|| {
                    InvokeError::new(format!(
                        "cannot pass a {} value as {}",
                        value.kind(),
                        A::KIND
                    ))
                })?;
            f(component, arg)
        });
        self.registry
            .insert_method(&self.type_name, name, argument_type, handle);
        self
    }
}
