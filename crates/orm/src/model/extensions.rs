//! Model Extensions - Attribute access, identity and serialization
//!
//! Implemented for every [`Model`].

use serde_json::Value;

use crate::attributes::AttributeStore;
use crate::context::Context;
use crate::error::ModelResult;
use crate::model::core_trait::Model;
use crate::model::lifecycle::construct;
use crate::value::{parse_object_id, Row};

/// Extension trait for models with attribute and identity helpers
pub trait ModelExtensions: Model {
    /// Create a new, non-persisted instance
    fn new(ctx: &Context) -> Self {
        construct(ctx)
    }

    /// Create a new instance filled with `attributes`; they start out dirty
    fn with_attributes(ctx: &Context, attributes: Row) -> Self {
        let mut model = Self::new(ctx);
        model.fill(attributes);
        model
    }

    fn context(&self) -> &Context {
        self.state().context()
    }

    fn attributes(&self) -> &AttributeStore {
        &self.state().attributes
    }

    fn attributes_mut(&mut self) -> &mut AttributeStore {
        &mut self.state_mut().attributes
    }

    /// Get an attribute; `"id"` reads the primary key
    fn get(&self, key: &str) -> Option<&Value> {
        self.attributes().get(key)
    }

    fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.attributes_mut().set(key, value.into());
        self
    }

    fn fill(&mut self, attributes: Row) -> &mut Self {
        self.attributes_mut().fill(attributes);
        self
    }

    fn has(&self, key: &str) -> bool {
        self.attributes().has(key)
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes_mut().remove(key)
    }

    fn exists(&self) -> bool {
        self.state().exists
    }

    fn recently_created(&self) -> bool {
        self.state().recently_created
    }

    fn key_name(&self) -> &str {
        self.attributes().key_name()
    }

    /// Current primary key value
    fn key(&self) -> Option<&Value> {
        self.attributes().key()
    }

    /// Primary key as an integer; 0 when unset or not an id
    fn id(&self) -> i64 {
        self.key().and_then(parse_object_id).unwrap_or(0)
    }

    /// Primary key used to address the stored record: the original value,
    /// falling back to the current one
    fn key_for_save(&self) -> Option<Value> {
        let attributes = self.attributes();
        attributes
            .get_original(attributes.key_name())
            .or_else(|| attributes.key())
            .cloned()
    }

    fn get_original(&self, key: &str) -> Option<&Value> {
        self.attributes().get_original(key)
    }

    fn get_dirty(&self) -> Row {
        self.attributes().get_dirty()
    }

    fn get_changes(&self) -> &Row {
        self.attributes().get_changes()
    }

    fn is_dirty(&self, keys: &[&str]) -> bool {
        self.attributes().is_dirty(keys)
    }

    fn is_clean(&self, keys: &[&str]) -> bool {
        self.attributes().is_clean(keys)
    }

    fn was_changed(&self, keys: &[&str]) -> bool {
        self.attributes().was_changed(keys)
    }

    fn only(&self, keys: &[&str]) -> Row {
        self.attributes().only(keys)
    }

    fn revert(&mut self, key: &str) -> &mut Self {
        self.attributes_mut().revert(key);
        self
    }

    fn to_array(&self) -> Row {
        self.attributes().all().clone()
    }

    fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string(self.attributes().all())?)
    }

    fn object_type(&self) -> &'static str {
        Self::OBJECT_TYPE
    }

    fn table(&self) -> &'static str {
        Self::TABLE
    }
}

impl<M: Model> ModelExtensions for M {}
