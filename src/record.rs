//! Canonical decode output.
//!
//! A [`DecodedRecord`] is an ordered flat mapping of field name to value:
//! the model name first, then the recovered fields in the order the protocol
//! reports them. Hex fields are fixed-minimum-width uppercase strings;
//! values wider than the minimum print in full. Cipher fields that could not
//! be recovered carry the literal [`UNKNOWN`] token instead of a placeholder
//! number. Building a record never fails.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Literal reported for cipher results when no key matched or none was
/// provisioned.
pub const UNKNOWN: &str = "Unknown";

/// A single reported field value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Int(u32),
}

/// Ordered field map produced by one successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    model: &'static str,
    fields: Vec<(&'static str, FieldValue)>,
}

/// Fixed-minimum-width uppercase hex, the `%0NX` convention.
pub fn hex(value: u64, min_width: usize) -> String {
    format!("{value:0min_width$X}")
}

impl DecodedRecord {
    pub fn new(model: &'static str) -> Self {
        Self {
            model,
            fields: Vec::new(),
        }
    }

    pub fn model(&self) -> &'static str {
        self.model
    }

    /// Reported fields in report order, model excluded.
    pub fn fields(&self) -> &[(&'static str, FieldValue)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn push_hex(&mut self, name: &'static str, value: u64, min_width: usize) {
        self.fields
            .push((name, FieldValue::Text(hex(value, min_width))));
    }

    pub fn push_int(&mut self, name: &'static str, value: u32) {
        self.fields.push((name, FieldValue::Int(value)));
    }

    pub fn push_text(&mut self, name: &'static str, text: impl Into<String>) {
        self.fields.push((name, FieldValue::Text(text.into())));
    }
}

impl Serialize for DecodedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("model", self.model)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
