//! Attribute-level diff between two records of the same resource
//!
//! Records are compared through their serialized form, one top-level
//! attribute at a time. Sets must serialize in a canonical order (e.g.
//! `BTreeSet`) so that reordering never shows up as a change; `null` and a
//! missing attribute are the same thing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// A single attribute whose value differs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute name
    pub attribute: String,
    /// Value in the current (remote) record
    pub current: Option<Value>,
    /// Value in the desired record
    pub desired: Option<Value>,
}

impl AttributeChange {
    /// Check if the attribute is being set from nothing
    pub fn is_addition(&self) -> bool {
        self.current.is_none() && self.desired.is_some()
    }

    /// Check if the attribute is being cleared
    pub fn is_removal(&self) -> bool {
        self.current.is_some() && self.desired.is_none()
    }
}

impl fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.attribute,
            render(self.current.as_ref()),
            render(self.desired.as_ref())
        )
    }
}

fn render(value: Option<&Value>) -> String {
    match value {
        None => "(unset)".to_string(),
        Some(Value::String(s)) => format!("{:?}", s),
        Some(other) => other.to_string(),
    }
}

/// Compute the attributes that differ between `current` and `desired`
///
/// Returns changes sorted by attribute name. Values that fail to serialize
/// into an object are compared as a single attribute named `"."`.
pub fn diff_attributes<C: Serialize>(current: &C, desired: &C) -> Vec<AttributeChange> {
    let current = serde_json::to_value(current).unwrap_or(Value::Null);
    let desired = serde_json::to_value(desired).unwrap_or(Value::Null);

    match (current, desired) {
        (Value::Object(current), Value::Object(desired)) => diff_objects(&current, &desired),
        (current, desired) => {
            let current = non_null(current);
            let desired = non_null(desired);
            if current == desired {
                Vec::new()
            } else {
                vec![AttributeChange {
                    attribute: ".".to_string(),
                    current,
                    desired,
                }]
            }
        }
    }
}

fn diff_objects(current: &Map<String, Value>, desired: &Map<String, Value>) -> Vec<AttributeChange> {
    let keys: BTreeSet<&String> = current.keys().chain(desired.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let current = current.get(key).cloned().and_then(non_null);
            let desired = desired.get(key).cloned().and_then(non_null);
            (current != desired).then(|| AttributeChange {
                attribute: key.clone(),
                current,
                desired,
            })
        })
        .collect()
}

fn non_null(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => Some(other),
    }
}
