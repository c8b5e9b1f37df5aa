//! toggle-property-core: parameter lists, property bindings, baked dispatch
//! and style assets.
//!
//! A [`Property`] pairs a method identifier with per-index arguments and
//! replays it against a live [`Component`]. Dispatch goes through the
//! [`BakedPropertyTable`] when an entry exists and falls back to the
//! reflective handles of the [`TypeRegistry`] otherwise.

pub mod baked;
pub mod components;
pub mod error;
pub mod parameter_list;
pub mod property;
pub mod reflect;
pub mod registry;
pub mod style;
pub mod style_asset;

pub use baked::{BakedPropertyTable, BakedSetter};
pub use error::{InvokeError, PropertyError};
pub use parameter_list::{ListElement, ParameterList};
pub use property::{Property, PropertyRecord};
pub use reflect::{ArgumentType, Component, ComponentBuilder, MethodHandle, TypeInfo, TypeRegistry};
pub use registry::Registry;
pub use style::Style;
pub use style_asset::{StyleAsset, StyleAssetId, StyleAssetRecord, StyleLibrary};
pub use toggle_api_core::{MethodId, ObjectId, Value, ValueKind};
