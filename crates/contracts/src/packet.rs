//! Packet - Event Mapper output
//!
//! Flat, ordered field set relayed to ingestion endpoints.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Number;
use std::fmt;

use crate::ContractError;

/// Scalar packet value
///
/// Numbers keep the exact JSON representation they were read with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PacketValue {
    Number(Number),
    Text(String),
}

impl PacketValue {
    /// Build a float value, `None` for NaN / infinity
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self::Number)
    }

    /// Numeric view of the value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(_) => None,
        }
    }
}

impl From<i64> for PacketValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for PacketValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<Number> for PacketValue {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PacketValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PacketValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for PacketValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Relay packet
///
/// Built once per event through [`PacketBuilder`]; read-only afterwards.
/// Field names come from the fixed per-event schemas, so they are `'static`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Packet {
    fields: Vec<(&'static str, PacketValue)>,
}

impl Packet {
    /// Start building a packet
    pub fn builder() -> PacketBuilder {
        PacketBuilder::default()
    }

    /// Look up a field value by name
    pub fn get(&self, name: &str) -> Option<&PacketValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// Field names in insertion order
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    /// Fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PacketValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compact JSON text, as carried in the `json` query parameter
    pub fn to_json(&self) -> Result<String, ContractError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for Packet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Incremental packet construction
#[derive(Debug, Default)]
pub struct PacketBuilder {
    fields: Vec<(&'static str, PacketValue)>,
}

impl PacketBuilder {
    /// Append a field; a repeated name replaces the earlier value in place
    pub fn field(mut self, name: &'static str, value: impl Into<PacketValue>) -> Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Append a field only when a value is present
    pub fn field_opt(self, name: &'static str, value: Option<impl Into<PacketValue>>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    pub fn build(self) -> Packet {
        Packet {
            fields: self.fields,
        }
    }
}
