//! Per-field input values for the rendered mock forms
//!
//! Values are keyed by the labels that locate a field (role, entity, feature,
//! field) so they survive role and feature switches. The store is only
//! emptied when a new submission starts.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::blueprint::{Feature, Role};

/// Stable identity of one rendered input field.
///
/// The opaque string form length-prefixes every component (`4:User4:Task...`),
/// so labels containing any delimiter cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    role: String,
    entity: String,
    feature: String,
    field: String,
}

impl FieldKey {
    pub fn new(role: &str, entity: &str, feature: &str, field: &str) -> Self {
        Self {
            role: role.to_string(),
            entity: entity.to_string(),
            feature: feature.to_string(),
            field: field.to_string(),
        }
    }

    pub fn for_field(role: &Role, feature: &Feature, field: &str) -> Self {
        Self::new(&role.name, &feature.entity, &feature.name, field)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        for part in [&self.role, &self.entity, &self.feature, &self.field] {
            out.push_str(&part.len().to_string());
            out.push(':');
            out.push_str(part);
        }
        out
    }

    pub fn decode(encoded: &str) -> Option<Self> {
        let (role, rest) = take_component(encoded)?;
        let (entity, rest) = take_component(rest)?;
        let (feature, rest) = take_component(rest)?;
        let (field, rest) = take_component(rest)?;
        if !rest.is_empty() {
            return None;
        }
        Some(Self::new(role, entity, feature, field))
    }
}

/// Split one `<byte-len>:<text>` component off the front of `input`
fn take_component(input: &str) -> Option<(&str, &str)> {
    let (len, rest) = input.split_once(':')?;
    if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let len: usize = len.parse().ok()?;
    let text = rest.get(..len)?;
    Some((text, &rest[len..]))
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::decode(&encoded)
            .ok_or_else(|| de::Error::custom(format!("invalid field key: {:?}", encoded)))
    }
}

/// Current text of every field the user has typed into
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValues {
    values: HashMap<FieldKey, String>,
}

impl FieldValues {
    /// Unknown keys read as empty
    pub fn get(&self, key: &FieldKey) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: FieldKey, value: String) {
        self.values.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
