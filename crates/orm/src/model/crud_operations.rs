//! CRUD Operations - Save, update and delete for models
//!
//! Persistence goes through [`Model::doing`] first and the query backend
//! second. Cancellable events (`saving`, `creating`, `updating`, `deleting`)
//! turn a write into a soft failure; programming errors come back as `Err`.

use std::any::type_name;

use serde_json::Value;
use tracing::debug;

use crate::context::Context;
use crate::error::{ModelError, ModelResult};
use crate::events::ModelEvent;
use crate::model::core_trait::Model;
use crate::model::extensions::ModelExtensions;
use crate::model::lifecycle::fire;
use crate::model::query_methods::QueryMethods;
use crate::query::{Action, ActionOutput};
use crate::value::Row;

/// Trait providing persistence operations for models
pub trait CrudOperations: Model {
    /// Persist the model, inserting or updating as needed.
    ///
    /// Returns `Ok(false)` when a listener cancels or the backend rejects the
    /// write. A clean, existing model saves successfully without a backend call.
    fn save(&mut self) -> ModelResult<bool> {
        if fire(self, ModelEvent::Saving).is_cancel() {
            return Ok(false);
        }

        self.state_mut().recently_created = false;

        let saved = if self.state().exists {
            if self.attributes().is_dirty(&[]) {
                self.perform_update()?
            } else {
                true
            }
        } else {
            self.perform_insert()?
        };

        if saved {
            self.flush_cache();
            self.attributes_mut().sync_original();
            fire(self, ModelEvent::Saved);
        }

        Ok(saved)
    }

    /// Fill the model and save it; `false` when the model is not persisted
    fn update(&mut self, attributes: Row) -> ModelResult<bool> {
        if !self.state().exists {
            return Ok(false);
        }

        self.fill(attributes);
        self.save()
    }

    /// Delete the persisted record.
    ///
    /// `None` when the model was never persisted. Without `force`, post
    /// backends move the record to the trash.
    fn delete(&mut self, force: bool) -> ModelResult<Option<bool>> {
        if !self.state().exists {
            return Ok(None);
        }

        if fire(self, ModelEvent::Deleting).is_cancel() {
            return Ok(Some(false));
        }

        let id = self.key_for_save().unwrap_or(Value::Null);
        let output = self.perform(&Action::Delete { id, force })?;
        if !output.succeeded() {
            return Ok(Some(false));
        }

        self.state_mut().exists = false;
        self.flush_cache();
        fire(self, ModelEvent::Deleted);

        Ok(Some(true))
    }

    /// Force-delete the records with the given ids, returning how many went
    fn destroy(ctx: &Context, ids: &[Value]) -> ModelResult<usize> {
        let mut count = 0;

        for id in ids {
            if let Some(mut model) = Self::find(ctx, id)? {
                if model.delete(true)? == Some(true) {
                    count += 1;
                }
            }
        }

        Ok(count)
    }

    /// Dispatch a persistence action to the model, then to its query backend
    fn perform(&self, action: &Action) -> ModelResult<ActionOutput> {
        if let Some(output) = self.doing(action) {
            return output;
        }

        Self::new_query_builder(self.context())
            .query()
            .perform(action)
            .ok_or_else(|| ModelError::unsupported_action(action.name(), type_name::<Self>()))
    }

    #[doc(hidden)]
    fn perform_update(&mut self) -> ModelResult<bool> {
        if fire(self, ModelEvent::Updating).is_cancel() {
            return Ok(false);
        }

        let dirty = self.get_dirty();
        if !dirty.is_empty() {
            let id = self.key_for_save().unwrap_or(Value::Null);
            debug!(model = type_name::<Self>(), keys = dirty.len(), "Updating model");

            let output = self.perform(&Action::Update { id, dirty })?;
            if !output.succeeded() {
                return Ok(false);
            }

            self.attributes_mut().sync_changes();
            fire(self, ModelEvent::Updated);
        }

        Ok(true)
    }

    #[doc(hidden)]
    fn perform_insert(&mut self) -> ModelResult<bool> {
        if fire(self, ModelEvent::Creating).is_cancel() {
            return Ok(false);
        }

        let attributes = self.to_array();
        let output = self.perform(&Action::Insert(attributes))?;

        let id = match output.inserted_id() {
            Some(id) => id,
            None => return Ok(false),
        };
        debug!(model = type_name::<Self>(), id, "Inserted model");

        {
            let state = self.state_mut();
            state.exists = true;
            state.recently_created = true;
        }
        let key_name = Self::PRIMARY_KEY;
        self.attributes_mut().set(key_name, Value::from(id));

        fire(self, ModelEvent::Created);
        Ok(true)
    }
}

impl<M: Model> CrudOperations for M {}
