//! Binding descriptors: `{ "reference": "...", "value": <fallback> }`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

pub const REFERENCE_KEY: &str = "reference";
pub const VALUE_KEY: &str = "value";

/// An object is a binding iff it carries a string `reference`.
pub fn is_binding(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|map| map.get(REFERENCE_KEY))
        .is_some_and(Value::is_string)
}

/// Strips the `${...}` wrapper (or a bare leading `$`) from a reference.
pub fn normalize_reference(reference: &str) -> &str {
    let trimmed = reference.trim();
    let inner = trimmed
        .strip_prefix("${")
        .or_else(|| trimmed.strip_prefix('$'))
        .unwrap_or(trimmed);
    inner.strip_suffix('}').unwrap_or(inner).trim()
}

/// Owned binding descriptor.
///
/// `value` is `Some(Value::Null)` when the descriptor spells out
/// `"value": null`, which still counts as a fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub reference: String,
    pub value: Option<Value>,
}

impl Binding {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        BindingRef::from_value(value).map(|b| Self {
            reference: b.reference.to_string(),
            value: b.value.cloned(),
        })
    }

    pub fn as_ref(&self) -> BindingRef<'_> {
        BindingRef {
            reference: &self.reference,
            value: self.value.as_ref(),
        }
    }

    /// The descriptor's own `value` when present, else `fallback`.
    pub fn fallback_or(&self, fallback: Option<&Value>) -> Option<Value> {
        self.as_ref().fallback_or(fallback)
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(REFERENCE_KEY.into(), Value::String(self.reference.clone()));
        if let Some(v) = &self.value {
            map.insert(VALUE_KEY.into(), v.clone());
        }
        Value::Object(map)
    }
}

/// Borrowed view of a binding descriptor sitting inside a JSON tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindingRef<'a> {
    pub reference: &'a str,
    pub value: Option<&'a Value>,
}

impl<'a> BindingRef<'a> {
    pub fn from_value(value: &'a Value) -> Option<Self> {
        let map = value.as_object()?;
        let reference = map.get(REFERENCE_KEY)?.as_str()?;
        Some(Self {
            reference,
            value: map.get(VALUE_KEY),
        })
    }

    pub fn fallback_or(&self, fallback: Option<&Value>) -> Option<Value> {
        self.value.or(fallback).cloned()
    }

    /// True when the descriptor's fallback is a list or an object.
    pub fn has_structural_fallback(&self) -> bool {
        matches!(self.value, Some(Value::Array(_)) | Some(Value::Object(_)))
    }
}

/// A prop value, split at the JSON boundary into literals and bindings.
#[derive(Debug, Clone, PartialEq)]
pub enum Bindable {
    Literal(Value),
    Binding(Binding),
}

impl From<Value> for Bindable {
    fn from(value: Value) -> Self {
        match Binding::from_value(&value) {
            Some(binding) => Bindable::Binding(binding),
            None => Bindable::Literal(value),
        }
    }
}

impl From<Binding> for Bindable {
    fn from(binding: Binding) -> Self {
        Bindable::Binding(binding)
    }
}

impl From<Bindable> for Value {
    fn from(bindable: Bindable) -> Self {
        match bindable {
            Bindable::Literal(v) => v,
            Bindable::Binding(b) => b.to_value(),
        }
    }
}

impl Serialize for Bindable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Bindable::Literal(v) => v.serialize(serializer),
            Bindable::Binding(b) => b.to_value().serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Bindable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Bindable::from)
    }
}
