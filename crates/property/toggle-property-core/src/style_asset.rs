//! Style assets: property lists with single-inheritance fallback to a base.
//!
//! Assets live in a [`StyleLibrary`] arena and refer to their base by id. A
//! base may be shared by many derived assets. Chain walks track visited ids,
//! so malformed data with a cycle still terminates.

use std::collections::BTreeMap;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::property::{Property, PropertyRecord};
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleAssetId(pub u32);

/// Persisted form of a [`StyleAsset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleAssetRecord {
    pub id: StyleAssetId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<StyleAssetId>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

#[derive(Debug, Default)]
pub struct StyleAsset {
    pub name: String,
    pub base: Option<StyleAssetId>,
    pub properties: Vec<Property>,
}

impl StyleAsset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            properties: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: StyleAssetId) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }
}

#[derive(Debug, Default)]
pub struct StyleLibrary {
    assets: BTreeMap<StyleAssetId, StyleAsset>,
    next_id: u32,
}

impl StyleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under the next unused id. Never replaces an existing asset.
    pub fn insert(&mut self, asset: StyleAsset) -> StyleAssetId {
        let mut id = StyleAssetId(self.next_id);
        while self.assets.contains_key(&id) {
            id = StyleAssetId(id.0.wrapping_add(1));
        }
        self.assets.insert(id, asset);
        self.next_id = id.0.wrapping_add(1);
        id
    }

    /// Insert under a fixed id, replacing any asset already there.
    pub fn insert_with_id(&mut self, id: StyleAssetId, asset: StyleAsset) {
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        self.assets.insert(id, asset);
    }

    pub fn get(&self, id: StyleAssetId) -> Option<&StyleAsset> {
        self.assets.get(&id)
    }

    pub fn get_mut(&mut self, id: StyleAssetId) -> Option<&mut StyleAsset> {
        self.assets.get_mut(&id)
    }

    /// Returns false when `id` is unknown.
    pub fn set_base(&mut self, id: StyleAssetId, base: Option<StyleAssetId>) -> bool {
        match self.assets.get_mut(&id) {
            Some(asset) => {
                asset.base = base;
                true
            }
            None => false,
        }
    }

    /// Assets deriving from a removed asset keep the dangling id; walks treat
    /// it as the end of the chain.
    pub fn remove(&mut self, id: StyleAssetId) -> Option<StyleAsset> {
        self.assets.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = StyleAssetId> + '_ {
        self.assets.keys().copied()
    }

    /// `id` followed by its bases, most derived first. Each asset appears at
    /// most once even if the chain loops.
    pub fn enumerate_chain(&self, id: StyleAssetId) -> Vec<StyleAssetId> {
        let mut visited = HashSet::new();
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(asset) = self.assets.get(&current) else {
                break;
            };
            if !visited.insert(current) {
                break;
            }
            chain.push(current);
            cursor = asset.base;
        }
        chain
    }

    /// Effective bindings of `id`: the first occurrence of each identifier
    /// along the chain wins, so derived assets override their bases.
    /// Inert bindings are skipped.
    pub fn effective_properties(&self, id: StyleAssetId) -> Vec<&Property> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for asset_id in self.enumerate_chain(id) {
            let Some(asset) = self.assets.get(&asset_id) else {
                continue;
            };
            for property in &asset.properties {
                if property.has_parse_error() {
                    continue;
                }
                if seen.insert(property.key()) {
                    out.push(property);
                }
            }
        }
        out
    }

    /// Whether `other` is `id` or one of its bases.
    pub fn contains(&self, id: StyleAssetId, other: StyleAssetId) -> bool {
        self.enumerate_chain(id).contains(&other)
    }

    /// Load a persisted asset, resolving its bindings against `registry`.
    pub fn insert_record(&mut self, record: StyleAssetRecord, registry: &Registry) {
        let asset = StyleAsset {
            name: record.name,
            base: record.base,
            properties: record
                .properties
                .into_iter()
                .map(|p| Property::from_record(p, registry))
                .collect(),
        };
        self.insert_with_id(record.id, asset);
    }

    pub fn to_record(&self, id: StyleAssetId) -> Option<StyleAssetRecord> {
        self.assets.get(&id).map(|asset| StyleAssetRecord {
            id,
            name: asset.name.clone(),
            base: asset.base,
            properties: asset.properties.iter().map(Property::to_record).collect(),
        })
    }

    /// Reload every binding, e.g. after the registry changed.
    pub fn reload(&mut self, registry: &Registry) {
        for asset in self.assets.values_mut() {
            for property in &mut asset.properties {
                property.reload(registry);
            }
        }
    }
}
