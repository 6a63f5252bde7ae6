//! Attribute storage and dirty tracking
//!
//! An [`AttributeStore`] holds the current attribute values of one entity
//! together with two snapshots: `original`, the values as last loaded or
//! saved, and `changes`, the dirty set captured by the most recent update.
//! Dirtiness is always recomputed from `attributes` against `original`.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::value::{is_equivalent, Row};

/// Hook applied to every value written through [`AttributeStore::set`]
pub type Sanitizer = Arc<dyn Fn(&str, Value) -> Value + Send + Sync>;

/// Per-entity attribute values with original and changes snapshots
#[derive(Clone)]
pub struct AttributeStore {
    attributes: Row,
    original: Row,
    changes: Row,
    key_name: String,
    sanitizer: Option<Sanitizer>,
}

impl fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeStore")
            .field("attributes", &self.attributes)
            .field("original", &self.original)
            .field("changes", &self.changes)
            .field("key_name", &self.key_name)
            .field("sanitizer", &self.sanitizer.is_some())
            .finish()
    }
}

impl Default for AttributeStore {
    fn default() -> Self {
        Self::new("ID")
    }
}

impl AttributeStore {
    /// Create an empty store whose primary key attribute is `key_name`
    pub fn new(key_name: &str) -> Self {
        Self {
            attributes: Row::new(),
            original: Row::new(),
            changes: Row::new(),
            key_name: key_name.to_string(),
            sanitizer: None,
        }
    }

    /// Install the hook applied by [`set`](Self::set)
    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    /// Name of the primary key attribute
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Current primary key value, if set
    pub fn key(&self) -> Option<&Value> {
        self.attributes.get(&self.key_name)
    }

    /// Get an attribute value; `"id"` reads the primary key
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key == "id" {
            return self.key();
        }

        self.attributes.get(key)
    }

    /// Whether an attribute is present and not null
    pub fn has(&self, key: &str) -> bool {
        self.get(key).map_or(false, |value| !value.is_null())
    }

    /// Set an attribute after passing it through the sanitizer
    pub fn set(&mut self, key: &str, value: Value) -> &mut Self {
        let value = match &self.sanitizer {
            Some(sanitize) => sanitize(key, value),
            None => value,
        };

        self.attributes.insert(key.to_string(), value);
        self
    }

    /// Set every attribute in `attributes`
    pub fn fill(&mut self, attributes: Row) -> &mut Self {
        for (key, value) in attributes {
            self.set(&key, value);
        }
        self
    }

    /// Remove an attribute
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// All current attributes
    pub fn all(&self) -> &Row {
        &self.attributes
    }

    /// Replace the attribute map wholesale, bypassing the sanitizer
    pub fn set_raw(&mut self, attributes: Row, sync: bool) -> &mut Self {
        self.attributes = attributes;

        if sync {
            self.sync_original();
        }
        self
    }

    /// Snapshot the current attributes as the original state
    pub fn sync_original(&mut self) -> &mut Self {
        self.original = self.attributes.clone();
        self
    }

    /// Snapshot a single attribute as original, if it is set
    pub fn sync_original_attribute(&mut self, key: &str) -> &mut Self {
        if let Some(value) = self.attributes.get(key) {
            self.original.insert(key.to_string(), value.clone());
        }
        self
    }

    /// Record the current dirty set as the last committed changes
    pub fn sync_changes(&mut self) -> &mut Self {
        self.changes = self.get_dirty();
        self
    }

    /// Original value of an attribute
    pub fn get_original(&self, key: &str) -> Option<&Value> {
        self.original.get(key)
    }

    /// The whole original snapshot
    pub fn original(&self) -> &Row {
        &self.original
    }

    /// Changes captured by the last successful update
    pub fn get_changes(&self) -> &Row {
        &self.changes
    }

    /// Attributes whose value is not equivalent to the original
    pub fn get_dirty(&self) -> Row {
        self.attributes
            .iter()
            .filter(|(key, value)| !self.original_is_equivalent(key, value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Whether the store, or any of `keys`, is dirty
    pub fn is_dirty(&self, keys: &[&str]) -> bool {
        has_changes(&self.get_dirty(), keys)
    }

    /// Complement of [`is_dirty`](Self::is_dirty)
    pub fn is_clean(&self, keys: &[&str]) -> bool {
        !self.is_dirty(keys)
    }

    /// Whether the last update changed anything, or any of `keys`
    pub fn was_changed(&self, keys: &[&str]) -> bool {
        has_changes(&self.changes, keys)
    }

    /// The requested attributes; absent ones map to null
    pub fn only(&self, keys: &[&str]) -> Row {
        keys.iter()
            .map(|key| {
                let value = self.get(key).cloned().unwrap_or(Value::Null);
                (key.to_string(), value)
            })
            .collect()
    }

    /// Restore an attribute to its original value, if it has been set
    pub fn revert(&mut self, key: &str) -> &mut Self {
        if self.attributes.contains_key(key) {
            let original = self.original.get(key).cloned().unwrap_or(Value::Null);
            self.attributes.insert(key.to_string(), original);
        }
        self
    }

    fn original_is_equivalent(&self, key: &str, current: &Value) -> bool {
        match self.original.get(key) {
            Some(original) => is_equivalent(current, original),
            None => false,
        }
    }
}

fn has_changes(changes: &Row, keys: &[&str]) -> bool {
    if keys.is_empty() {
        return !changes.is_empty();
    }

    keys.iter().any(|key| changes.contains_key(*key))
}
