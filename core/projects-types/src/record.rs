//! The project record: a JSON object identified by its `packageName`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::visibility::{RegionGate, Visibility, VISIBLE_CODE};
use crate::{Error, Result};

/// A stored project document.
///
/// Only three fields carry meaning to the service: `packageName` (identity),
/// `code` (visibility) and `ip` (region gate). Every other field is opaque
/// and survives reads and writes untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectRecord(Map<String, Value>);

impl ProjectRecord {
    pub const PACKAGE_NAME: &'static str = "packageName";
    pub const CODE: &'static str = "code";
    pub const REGION: &'static str = "ip";

    /// Wraps an existing JSON object.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Builds a record from an arbitrary JSON value, rejecting anything that
    /// is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(Error::NotAnObject(json_kind(&other))),
        }
    }

    /// Parses a record from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// The package name, if the record carries one as a string.
    pub fn package_name(&self) -> Option<&str> {
        self.0.get(Self::PACKAGE_NAME).and_then(Value::as_str)
    }

    /// Stamps `packageName` with `key`, replacing any value the body carried.
    #[must_use]
    pub fn with_package_name(mut self, key: &str) -> Self {
        self.0
            .insert(Self::PACKAGE_NAME.to_string(), Value::String(key.to_string()));
        self
    }

    /// The visibility code. Only the string `"2"` is visible.
    pub fn visibility(&self) -> Visibility {
        match self.0.get(Self::CODE) {
            Some(Value::String(code)) if code == VISIBLE_CODE => Visibility::Visible,
            _ => Visibility::Hidden,
        }
    }

    /// The region gate read from the `ip` field. Country codes are kept
    /// verbatim: `"fr"` and `" FR "` are not `FR`.
    pub fn region_gate(&self) -> RegionGate {
        match self.0.get(Self::REGION) {
            None => RegionGate::Default,
            Some(Value::String(region)) if region.is_empty() => RegionGate::Open,
            Some(Value::String(region)) => RegionGate::Country(region.clone()),
            Some(_) => RegionGate::Closed,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ProjectRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for ProjectRecord {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
