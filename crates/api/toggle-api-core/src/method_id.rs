//! MethodId parsing and formatting.
//!
//! Grammar:
//!   TargetType;ArgumentType;method_name
//! - exactly three `;`-separated fields
//! - `;` is reserved and never occurs inside a field
//!   Examples:
//!   "Text;string;set_text" -> target="Text", argument="string", method="set_text"
//!   "ui::Image;Color;set_color" -> target="ui::Image", argument="Color", method="set_color"
//!
//! The string form is the identity: it keys the baked dispatch table, dedups
//! bindings across style chains and is what gets persisted.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Field separator of the string form.
pub const SEPARATOR: char = ';';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodIdError {
    #[error("malformed method identifier '{key}': expected 3 fields, found {fields}")]
    Malformed { key: String, fields: usize },
    #[error("method identifier field '{field}' contains the reserved separator")]
    ReservedSeparator { field: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId {
    target_type: String,
    argument_type: String,
    method_name: String,
}

impl MethodId {
    /// Construct a MethodId from components, rejecting fields that would not
    /// survive a decode.
    pub fn new(
        target_type: impl Into<String>,
        argument_type: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Result<Self, MethodIdError> {
        let id = MethodId {
            target_type: target_type.into(),
            argument_type: argument_type.into(),
            method_name: method_name.into(),
        };
        for field in [&id.target_type, &id.argument_type, &id.method_name] {
            if field.contains(SEPARATOR) {
                return Err(MethodIdError::ReservedSeparator {
                    field: field.clone(),
                });
            }
        }
        Ok(id)
    }

    /// Parse the `;`-joined string form.
    pub fn parse(s: &str) -> Result<Self, MethodIdError> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        if parts.len() != 3 {
            return Err(MethodIdError::Malformed {
                key: s.to_string(),
                fields: parts.len(),
            });
        }
        Ok(MethodId {
            target_type: parts[0].to_string(),
            argument_type: parts[1].to_string(),
            method_name: parts[2].to_string(),
        })
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

    /// Human readable `Type.member (argument)` form for display only.
    pub fn display_name(&self) -> String {
        display_name(&self.target_type, &self.argument_type, &self.method_name)
    }
}

/// Join three fields without validation. Used for the identity key of
/// bindings whose fields came from persisted data.
pub fn encode(target_type: &str, argument_type: &str, method_name: &str) -> String {
    format!("{target_type}{SEPARATOR}{argument_type}{SEPARATOR}{method_name}")
}

/// Split a key into its three fields.
pub fn decode(key: &str) -> Result<(String, String, String), MethodIdError> {
    let id = MethodId::parse(key)?;
    Ok((id.target_type, id.argument_type, id.method_name))
}

/// Pretty printer shared by [`MethodId::display_name`] and bindings that
/// failed to parse.
pub fn display_name(target_type: &str, argument_type: &str, method_name: &str) -> String {
    let member = method_name.strip_prefix("set_").unwrap_or(method_name);
    format!(
        "{}.{} ({})",
        short_type_name(target_type),
        member,
        short_type_name(argument_type)
    )
}

fn short_type_name(name: &str) -> &str {
    let name = name.rsplit("::").next().unwrap_or(name);
    name.rsplit('.').next().unwrap_or(name)
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(
            &self.target_type,
            &self.argument_type,
            &self.method_name,
        ))
    }
}

impl FromStr for MethodId {
    type Err = MethodIdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodId::parse(s)
    }
}

// Serde support: serialize as string, deserialize from string
impl Serialize for MethodId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MethodId {
    fn deserialize<D>(deserializer: D) -> Result<MethodId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MethodId::parse(&s).map_err(de::Error::custom)
    }
}
