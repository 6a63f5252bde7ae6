//! Query Methods - Builder entry points for models

use serde_json::Value;

use crate::collection::Collection;
use crate::context::Context;
use crate::error::ModelResult;
use crate::model::core_trait::Model;
use crate::model::lifecycle::hydrate;
use crate::query::Builder;
use crate::value::Row;

/// Trait providing query operations for models
pub trait QueryMethods: Model {
    /// A builder bound to this model type, without any query vars applied
    fn new_query_builder(ctx: &Context) -> Builder<Self> {
        Builder::new(Self::new_query(ctx)).set_model(ctx)
    }

    /// Start a query for this model type
    fn query(ctx: &Context) -> Builder<Self> {
        Self::new_query_builder(ctx)
    }

    /// Every record of this type the backend returns by default
    fn all(ctx: &Context) -> ModelResult<Collection<Self>> {
        Self::query(ctx).get()
    }

    /// Find a record by primary key
    fn find(ctx: &Context, id: &Value) -> ModelResult<Option<Self>> {
        Self::query(ctx).find(id)
    }

    /// Hydrate a persisted instance from a raw row
    fn new_from_builder(ctx: &Context, row: Row) -> Self {
        hydrate(ctx, row)
    }
}

impl<M: Model> QueryMethods for M {}
