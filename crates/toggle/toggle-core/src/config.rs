//! World configuration.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Events retained before the oldest is dropped.
    pub max_events: usize,
    /// Record value changes and invocation failures in the world outputs.
    pub emit_events: bool,
    /// Apply a style as soon as it is attached to (or re-enabled on) an active object.
    pub load_styles_on_attach: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_events: 1024,
            emit_events: true,
            load_styles_on_attach: true,
        }
    }
}
