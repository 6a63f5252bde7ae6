//! Core Model Trait - Base definition for entities
//!
//! A model is any type that owns a [`ModelState`] and names its object type,
//! table and primary key. Everything else (attribute access, persistence,
//! querying) comes from the blanket traits in the sibling modules.

use std::sync::Arc;

use serde_json::Value;

use crate::attributes::{AttributeStore, Sanitizer};
use crate::context::Context;
use crate::error::ModelResult;
use crate::query::{Action, ActionOutput, DbQuery, Query};

/// Per-instance state shared by every model
#[derive(Debug, Clone)]
pub struct ModelState {
    ctx: Context,
    pub attributes: AttributeStore,
    /// Whether the entity is persisted
    pub exists: bool,
    /// Set only during the save that inserted the entity
    pub recently_created: bool,
}

impl ModelState {
    /// Fresh, non-existing state whose attribute writes go through the
    /// `sanitize_attribute` hook of `object_type`
    pub fn new(ctx: Context, key_name: &str, object_type: &str) -> Self {
        let hook = ctx.hook(object_type, "sanitize_attribute");
        let events = ctx.events().clone();
        let sanitizer: Sanitizer = Arc::new(move |key: &str, value: Value| events.sanitize(&hook, key, value));

        Self {
            attributes: AttributeStore::new(key_name).with_sanitizer(sanitizer),
            ctx,
            exists: false,
            recently_created: false,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

/// Core trait for entities
pub trait Model: Sized + Send + Sync + 'static {
    /// Post type or taxonomy name; also the middle segment of hook names
    const OBJECT_TYPE: &'static str = "";

    /// Table name, without prefix
    const TABLE: &'static str = "posts";

    /// Primary key attribute
    const PRIMARY_KEY: &'static str = "ID";

    /// Wrap a freshly built state
    fn from_state(state: ModelState) -> Self;

    fn state(&self) -> &ModelState;

    fn state_mut(&mut self) -> &mut ModelState;

    /// Create the query backend for this model type
    fn new_query(ctx: &Context) -> Box<dyn Query> {
        Box::new(DbQuery::new(ctx.connection().clone(), ctx.table(Self::TABLE)))
    }

    /// Run once per model type, before the first instance is initialized
    fn boot(_ctx: &Context) {}

    /// Run on every new instance, before the original snapshot is taken
    fn initialize(&mut self) {}

    /// Invalidate cached copies of this entity after a save or delete
    fn flush_cache(&self) {}

    /// Handle a persistence action in the model itself.
    ///
    /// `None` defers to the query backend.
    fn doing(&self, _action: &Action) -> Option<ModelResult<ActionOutput>> {
        None
    }

    /// Meta type used by [`Metadata`](crate::metadata::Metadata)
    fn meta_type(&self) -> &'static str {
        "post"
    }
}
