//! Shared JSON fixtures for the toggle workspace, indexed by `fixtures/manifest.json`.
//!
//! ```ignore
//! let doc: SceneDocument = toggle_test_fixtures::scenes::load("menu")?;
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const MANIFEST_JSON: &str = include_str!("../../../../fixtures/manifest.json");

static MANIFEST: Lazy<Manifest> =
    Lazy::new(|| serde_json::from_str(MANIFEST_JSON).expect("fixtures/manifest.json is valid"));

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    scenes: BTreeMap<String, Entry>,
    #[serde(default)]
    styles: BTreeMap<String, Entry>,
}

/// Either a bare relative path or `{ "path": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entry {
    Bare(String),
    Table { path: String },
}

impl Entry {
    fn rel(&self) -> &str {
        match self {
            Entry::Bare(rel) | Entry::Table { path: rel } => rel.as_str(),
        }
    }
}

#[derive(Clone, Copy)]
enum Group {
    Scene,
    Style,
}

impl Group {
    fn entries(self) -> &'static BTreeMap<String, Entry> {
        match self {
            Group::Scene => &MANIFEST.scenes,
            Group::Style => &MANIFEST.styles,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Group::Scene => "scene",
            Group::Style => "style",
        }
    }

    fn locate(self, name: &str) -> Result<PathBuf> {
        let Some(entry) = self.entries().get(name) else {
            bail!("no {} fixture named '{name}' in the manifest", self.label());
        };
        Ok(root().join(entry.rel()))
    }

    fn read(self, name: &str) -> Result<String> {
        let path = self.locate(name)?;
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
    }

    fn parse<T: DeserializeOwned>(self, name: &str) -> Result<T> {
        let text = self.read(name)?;
        serde_json::from_str(&text)
            .with_context(|| format!("{} fixture '{name}' does not deserialize", self.label()))
    }
}

fn root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

macro_rules! fixture_group {
    ($module:ident, $group:expr) => {
        pub mod $module {
            use super::*;

            /// Manifest names, sorted.
            pub fn keys() -> Vec<String> {
                $group.entries().keys().cloned().collect()
            }

            pub fn json(name: &str) -> Result<String> {
                $group.read(name)
            }

            pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
                $group.parse(name)
            }

            pub fn path(name: &str) -> Result<PathBuf> {
                $group.locate(name)
            }
        }
    };
}

fixture_group!(scenes, Group::Scene);
fixture_group!(styles, Group::Style);
