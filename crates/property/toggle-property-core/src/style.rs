use log::debug;
use serde::{Deserialize, Serialize};

use crate::reflect::Component;
use crate::style_asset::{StyleAssetId, StyleLibrary};

/// Applies a style asset to the components of one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<StyleAssetId>,
    /// Identifier keys this object opts out of.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_properties: Vec<String>,
}

impl Style {
    pub fn new(asset: StyleAssetId) -> Self {
        Self {
            asset: Some(asset),
            ignore_properties: Vec::new(),
        }
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignore_properties.iter().any(|k| k == key)
    }

    /// Invoke every effective binding at index 0 on the component whose type
    /// matches its target. Returns how many bindings found a target.
    pub fn load_style(&self, library: &StyleLibrary, components: &mut [Box<dyn Component>]) -> usize {
        let Some(asset) = self.asset else {
            return 0;
        };
        let mut applied = 0;
        for property in library.effective_properties(asset) {
            if self.is_ignored(property.key()) {
                continue;
            }
            let target = components
                .iter_mut()
                .find(|c| c.type_name() == property.target_type());
            match target {
                Some(component) => {
                    property.invoke(&mut **component, 0);
                    applied += 1;
                }
                None => debug!(
                    "style skips {}: no {} component",
                    property.display_name(),
                    property.target_type()
                ),
            }
        }
        applied
    }
}
