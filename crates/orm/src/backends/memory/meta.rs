//! In-memory metadata

use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use serde_json::Value;

use crate::backends::{BackendResult, MetaStore};
use crate::error::BackendError;

type MetaKey = (String, i64, String);

/// Meta values keyed by meta type, object id and meta key
#[derive(Debug)]
pub struct MemoryMeta {
    values: DashMap<MetaKey, Vec<(i64, Value)>>,
    next_id: AtomicI64,
}

impl Default for MemoryMeta {
    fn default() -> Self {
        Self {
            values: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryMeta {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(meta_type: &str, object_id: i64, key: &str) -> BackendResult<MetaKey> {
        if object_id <= 0 {
            return Err(BackendError::new("invalid_meta_object", "Invalid object ID."));
        }
        if key.is_empty() {
            return Err(BackendError::new("invalid_meta_key", "Invalid meta key."));
        }
        Ok((meta_type.to_string(), object_id, key.to_string()))
    }
}

impl MetaStore for MemoryMeta {
    fn get(&self, meta_type: &str, object_id: i64, key: &str) -> BackendResult<Vec<Value>> {
        let key = Self::key(meta_type, object_id, key)?;
        Ok(self
            .values
            .get(&key)
            .map(|values| values.iter().map(|(_, value)| value.clone()).collect())
            .unwrap_or_default())
    }

    fn add(
        &self,
        meta_type: &str,
        object_id: i64,
        key: &str,
        value: Value,
        unique: bool,
    ) -> BackendResult<Option<i64>> {
        let key = Self::key(meta_type, object_id, key)?;
        let mut values = self.values.entry(key).or_default();

        if unique && !values.is_empty() {
            return Ok(None);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        values.push((id, value));
        Ok(Some(id))
    }

    fn update(&self, meta_type: &str, object_id: i64, key: &str, value: Value) -> BackendResult<bool> {
        let key = Self::key(meta_type, object_id, key)?;
        let mut values = self.values.entry(key).or_default();

        if values.len() == 1 && values[0].1 == value {
            return Ok(false);
        }

        let id = match values.first() {
            Some((id, _)) => *id,
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        values.clear();
        values.push((id, value));
        Ok(true)
    }

    fn delete(&self, meta_type: &str, object_id: i64, key: &str) -> BackendResult<bool> {
        let key = Self::key(meta_type, object_id, key)?;
        Ok(self.values.remove(&key).is_some_and(|(_, values)| !values.is_empty()))
    }
}
