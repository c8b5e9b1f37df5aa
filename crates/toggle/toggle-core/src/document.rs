//! Persisted scene and toggle state.
//!
//! References between toggles are stored as the ids of the objects carrying
//! them, so a document stays valid however the world allocates toggle ids.

use serde::{Deserialize, Serialize};
use toggle_api_core::{MethodId, ObjectId};
use toggle_property_core::{PropertyRecord, Style, StyleAssetRecord};

use crate::toggle::ValueType;

fn default_true() -> bool {
    true
}

fn default_value() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ObjectId>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Registered component type names, instantiated with their defaults.
    #[serde(default)]
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRecord {
    pub object: ObjectId,
    #[serde(flatten)]
    pub style: Style,
}

/// One persistent call of a per-index action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub target: Option<ObjectId>,
    pub call: PropertyRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerRecord {
    pub target: Option<ObjectId>,
    pub method: MethodId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleRecord {
    pub object: ObjectId,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub count: i32,
    #[serde(default = "default_value")]
    pub value: i32,
    #[serde(default)]
    pub reset_value_on_init: bool,
    #[serde(default)]
    pub ignore_parent: bool,
    #[serde(default)]
    pub synced: Vec<Option<ObjectId>>,
    #[serde(default)]
    pub grouped: Vec<Option<ObjectId>>,
    #[serde(default)]
    pub activate_objects: Vec<Option<ObjectId>>,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub actions: Vec<Vec<ActionRecord>>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub listeners: Vec<ListenerRecord>,
}

impl ToggleRecord {
    pub fn new(object: ObjectId, value_type: ValueType, count: i32) -> Self {
        Self {
            object,
            value_type,
            count,
            value: default_value(),
            reset_value_on_init: false,
            ignore_parent: false,
            synced: Vec::new(),
            grouped: Vec::new(),
            activate_objects: Vec::new(),
            comments: Vec::new(),
            actions: Vec::new(),
            properties: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
    #[serde(default)]
    pub style_assets: Vec<StyleAssetRecord>,
    #[serde(default)]
    pub styles: Vec<StyleRecord>,
    #[serde(default)]
    pub toggles: Vec<ToggleRecord>,
}

impl SceneDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_toggle_record_uses_defaults() {
        let rec: ToggleRecord = serde_json::from_str(r#"{ "object": 4 }"#).unwrap();
        assert_eq!(rec, ToggleRecord::new(ObjectId(4), ValueType::Boolean, 0));
    }

    #[test]
    fn style_record_flattens_style_fields() {
        let rec: StyleRecord =
            serde_json::from_str(r#"{ "object": 1, "asset": 3, "ignore_properties": ["Text;string;set_text"] }"#)
                .unwrap();
        assert_eq!(rec.style.asset.map(|a| a.0), Some(3));
        assert_eq!(rec.style.ignore_properties.len(), 1);
    }
}
