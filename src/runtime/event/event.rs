//! Event instances

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::runtime::value::Value;
use crate::util::hash::hash_name;

/// One occurrence of an event: a type hash plus ordered attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    name: String,
    hash: u64,
    #[serde(default)]
    attributes: IndexMap<String, Value>,
}

impl Event {
    /// Create an event of the type called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let hash = hash_name(&name);
        Self {
            name,
            hash,
            attributes: IndexMap::new(),
        }
    }

    /// Name of the event type.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hash identifying the event type.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Whether the stored hash matches the name.
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.hash == hash_name(&self.name)
    }

    /// Builder form of [`Event::set`].
    pub fn with(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace an attribute, returning the previous value.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.attributes.insert(key.into(), value.into())
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Remove an attribute, keeping the order of the others.
    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<Value> {
        self.attributes.shift_remove(key)
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.attributes.contains_key(key)
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
