//! Attribute values carried by discovered resources.

use serde::Serialize;
use std::collections::BTreeMap;

/// Attribute map of a discovered resource, sorted by attribute name.
pub type AttributeMap = BTreeMap<String, Value>;

/// Terraform-compatible attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Interpolation expression pointing at another generated resource or variable
    Reference(Reference),
}

/// Interpolation expression such as `oci_core_vcn.export_vcn.id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub expression: String,
}

impl Value {
    pub fn reference(expression: impl Into<String>) -> Value {
        Value::Reference(Reference {
            expression: expression.into(),
        })
    }

    /// Convert a JSON value returned by the cloud API. `null` means absent.
    pub fn from_json(json: serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Value::Bool(b)),
            serde_json::Value::Number(n) => Some(Value::Number(n)),
            serde_json::Value::String(s) => Some(Value::String(s)),
            serde_json::Value::Array(items) => Some(Value::List(
                items.into_iter().filter_map(Value::from_json).collect(),
            )),
            serde_json::Value::Object(fields) => Some(Value::Map(
                fields
                    .into_iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Plain textual form used for query parameters and id comparisons.
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Reference(r) => Some(r.expression.clone()),
            Value::List(_) | Value::Map(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

/// Convert a JSON object into an attribute map, dropping `null` fields.
pub fn attributes_from_json(json: serde_json::Value) -> AttributeMap {
    match Value::from_json(json) {
        Some(Value::Map(map)) => map,
        _ => AttributeMap::new(),
    }
}

/// Read a string attribute, treating an empty string as absent.
pub fn non_empty_str<'a>(attributes: &'a AttributeMap, key: &str) -> Option<&'a str> {
    attributes
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
