//! Metadata attached to a persisted model

use std::any::type_name;

use serde_json::Value;
use tracing::{debug, warn};

use crate::backends::MetaStore;
use crate::error::BackendError;
use crate::model::{Model, ModelExtensions};

/// Meta access for one model, under one meta type (`post`, `term`, ...)
#[derive(Debug, Clone, Copy)]
pub struct Metadata<'a, M> {
    model: &'a M,
    meta_type: &'a str,
}

impl<'a, M: Model> Metadata<'a, M> {
    /// Metadata under the model's own [`Model::meta_type`]
    pub fn new(model: &'a M) -> Self {
        Self {
            model,
            meta_type: model.meta_type(),
        }
    }

    pub fn with_type(model: &'a M, meta_type: &'a str) -> Self {
        Self { model, meta_type }
    }

    pub fn meta_type(&self) -> &str {
        self.meta_type
    }

    /// First value stored under `key`
    pub fn get_meta(&self, key: &str) -> Option<Value> {
        self.get_meta_values(key).into_iter().next()
    }

    /// Every value stored under `key`
    pub fn get_meta_values(&self, key: &str) -> Vec<Value> {
        match self.store().get(self.meta_type, self.model.id(), key) {
            Ok(values) => values,
            Err(err) => {
                self.log_failure("get", key, &err);
                Vec::new()
            }
        }
    }

    /// Add a value unless `key` already has one; returns the new meta id
    pub fn add_meta(&self, key: &str, value: impl Into<Value>) -> Option<i64> {
        debug!(meta_type = self.meta_type, object_id = self.model.id(), key, "Adding meta");

        match self.store().add(self.meta_type, self.model.id(), key, value.into(), true) {
            Ok(id) => id,
            Err(err) => {
                self.log_failure("add", key, &err);
                None
            }
        }
    }

    pub fn update_meta(&self, key: &str, value: impl Into<Value>) -> bool {
        debug!(meta_type = self.meta_type, object_id = self.model.id(), key, "Updating meta");

        self.store()
            .update(self.meta_type, self.model.id(), key, value.into())
            .unwrap_or_else(|err| {
                self.log_failure("update", key, &err);
                false
            })
    }

    pub fn delete_meta(&self, key: &str) -> bool {
        debug!(meta_type = self.meta_type, object_id = self.model.id(), key, "Deleting meta");

        self.store()
            .delete(self.meta_type, self.model.id(), key)
            .unwrap_or_else(|err| {
                self.log_failure("delete", key, &err);
                false
            })
    }

    fn store(&self) -> &dyn MetaStore {
        self.model.context().meta().as_ref()
    }

    fn log_failure(&self, op: &str, key: &str, err: &BackendError) {
        warn!(
            model = type_name::<M>(),
            meta_type = self.meta_type,
            object_id = self.model.id(),
            key,
            op,
            error = %err,
            "Meta operation failed"
        );
    }
}
