//! toggle-core: composite toggles over a minimal scene (engine-agnostic)
//!
//! A [`ToggleWorld`] owns scene objects, their components and the toggles
//! attached to them. Toggles store a bitmask, relate to each other through
//! hierarchy, sync and group links, and replay property bindings whenever
//! their value changes.

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod ids;
pub mod scene;
pub mod toggle;
pub mod world;

// Re-exports for hosts
pub use config::Config;
pub use document::{ActionRecord, ListenerRecord, ObjectRecord, SceneDocument, StyleRecord, ToggleRecord};
pub use error::WorldError;
pub use events::{Outputs, ToggleEvent};
pub use ids::{IdAllocator, ToggleId};
pub use scene::{Scene, SceneObject};
pub use toggle::{
    count_mask, index_mask, trailing_zero_count, CompositeToggle, ToggleAction,
    ValueChangedListener, ValueType, MAX_COUNT,
};
pub use world::ToggleWorld;

pub use toggle_api_core::{MethodId, ObjectId, Value, ValueKind};
pub use toggle_property_core::{Property, PropertyRecord, Registry, Style, StyleAssetId};
