//! In-memory ordered mapping mirrored to the config file.
//!
//! Values live in a hash map, display/serialization order in a separate key
//! list. Every mutation keeps the two in step; [`ConfigDocument::normalize_order`]
//! repairs drift before serialization.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::error::{CopgError, Result};

/// An entry removed from the document, with the index it occupied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedEntry {
    pub key: String,
    pub value: Value,
    pub index: usize,
}

/// Ordered key → value mapping backing the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigDocument {
    values: HashMap<String, Value>,
    order: Vec<String>,
}

impl PartialEq for ConfigDocument {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.values == other.values
    }
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse JSON text; the root must be an object.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)
            .map_err(|e| CopgError::Persistence(format!("config is not valid JSON: {e}")))?;
        Self::from_value(root)
    }

    /// Build from an already-parsed JSON value; the root must be an object.
    pub fn from_value(root: Value) -> Result<Self> {
        let Value::Object(map) = root else {
            return Err(CopgError::Persistence(
                "config root must be a JSON object".to_string(),
            ));
        };

        let mut doc = Self::new();
        for (key, value) in map {
            doc.order.push(key.clone());
            doc.values.insert(key, value);
        }
        Ok(doc)
    }

    /// Serialize as 2-space indented JSON in key order (no trailing newline).
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }

    /// Ordered JSON object view of the document.
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.values.len());
        for key in self.effective_order() {
            if let Some(value) = self.values.get(key) {
                map.insert(key.to_string(), value.clone());
            }
        }
        Value::Object(map)
    }

    /// Make the order list contain every stored key exactly once.
    ///
    /// Stale and duplicate keys are dropped; keys missing from the list are
    /// appended (sorted, since their original position is unknown).
    pub fn normalize_order(&mut self) {
        let order: Vec<String> = self
            .effective_order()
            .into_iter()
            .map(str::to_string)
            .collect();
        if order != self.order {
            warn!(
                before = self.order.len(),
                after = order.len(),
                "Key order list was out of sync, repaired"
            );
            self.order = order;
        }
    }

    fn effective_order(&self) -> Vec<&str> {
        let mut seen = HashSet::with_capacity(self.order.len());
        let mut order: Vec<&str> = self
            .order
            .iter()
            .map(String::as_str)
            .filter(|k| self.values.contains_key(*k) && seen.insert(*k))
            .collect();

        let mut missing: Vec<&str> = self
            .values
            .keys()
            .map(String::as_str)
            .filter(|k| !seen.contains(k))
            .collect();
        missing.sort_unstable();
        order.extend(missing);
        order
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    /// Keys in serialization order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// `(key, value)` pairs in serialization order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order
            .iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.as_str(), v)))
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.order.iter().position(|k| k == key)
    }

    /// Insert or replace. New keys go to the end; existing keys keep their slot.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if self.values.insert(key.clone(), value).is_none() {
            trace!(key = %key, "Appending key");
            self.order.push(key);
        }
    }

    /// Insert at a specific position, clamped to the current length.
    ///
    /// An existing entry with the same key is moved, not duplicated.
    pub fn insert_at(&mut self, index: usize, key: impl Into<String>, value: Value) {
        let key = key.into();
        if self.values.contains_key(&key) {
            self.order.retain(|k| k != &key);
        }
        let index = index.min(self.order.len());
        trace!(key = %key, index, "Inserting key at index");
        self.order.insert(index, key.clone());
        self.values.insert(key, value);
    }

    /// Replace `old` with `new` at the same position.
    ///
    /// The value is kept unless `value` is given. Fails if `old` is missing or
    /// `new` already names a different entry.
    pub fn rename(&mut self, old: &str, new: &str, value: Option<Value>) -> Result<()> {
        let index = self.index_of(old).ok_or_else(|| CopgError::NotFound {
            what: format!("key {old}"),
        })?;
        if old != new && self.values.contains_key(new) {
            return Err(CopgError::validation("key", format!("{new} already exists")));
        }

        let previous = self.values.remove(old).unwrap_or(Value::Null);
        let value = value.unwrap_or(previous);
        self.order[index] = new.to_string();
        self.values.insert(new.to_string(), value);
        trace!(old = %old, new = %new, index, "Renamed key in place");
        Ok(())
    }

    /// Remove a key, returning its value and former index.
    pub fn remove(&mut self, key: &str) -> Option<RemovedEntry> {
        let value = self.values.remove(key)?;
        let index = self.index_of(key).unwrap_or(self.order.len());
        self.order.retain(|k| k != key);
        Some(RemovedEntry {
            key: key.to_string(),
            value,
            index,
        })
    }
}
