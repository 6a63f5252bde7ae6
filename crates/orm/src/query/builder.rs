//! Query Builder - Fluent, backend-neutral queries

use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

use super::{Query, QueryResult};
use crate::collection::Collection;
use crate::config::ModelConfig;
use crate::context::Context;
use crate::error::{ModelError, ModelResult};
use crate::model::{Model, QueryMethods};
use crate::value::Row;

/// Fluent query over one backend, optionally bound to a model type.
///
/// Verbs are recorded through [`Query::apply_query_var`], so the same chain
/// works against every backend. Operations that hydrate models need a bound
/// model and fail with [`ModelError::ModelNotDefined`] otherwise.
pub struct Builder<M> {
    query: Box<dyn Query>,
    model: Option<Context>,
    _phantom: PhantomData<M>,
}

impl<M> Clone for Builder<M> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            model: self.model.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<M> fmt::Debug for Builder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("table", &self.query.table())
            .field("object_type", &self.query.object_type())
            .field("bound", &self.model.is_some())
            .finish()
    }
}

impl<M> Builder<M> {
    pub fn new(query: Box<dyn Query>) -> Self {
        Self {
            query,
            model: None,
            _phantom: PhantomData,
        }
    }

    pub fn query(&self) -> &dyn Query {
        self.query.as_ref()
    }

    pub fn query_mut(&mut self) -> &mut dyn Query {
        self.query.as_mut()
    }

    /// Fetch one raw row by primary key, without hydrating
    pub fn raw(&self, id: &Value) -> Option<Row> {
        self.query.get_by_id(id)
    }

    /// Run the query and return the raw rows
    pub fn get_raw(&self) -> ModelResult<Vec<Row>> {
        let result: QueryResult = self.query.do_query(self.query.query_vars())?;
        self.query.extract_items(result)
    }

    /// The pending query vars; empty for SQL-backed queries
    pub fn to_array(&self) -> Row {
        self.query.to_array()
    }

    /// Invoke `name` on the backend, then on its var store, then record it as
    /// a query var
    pub fn call(mut self, name: &str, args: &[Value]) -> ModelResult<Self> {
        if let Some(result) = self.query.call(name, args) {
            result?;
            return Ok(self);
        }

        if let Some(result) = self.query.query_vars_mut().call_method(name, args) {
            result?;
            return Ok(self);
        }

        self.query.apply_query_var(name, args)?;
        Ok(self)
    }

    /// Store a query var
    pub fn with_var(self, name: &str, value: impl Into<Value>) -> ModelResult<Self> {
        self.call(name, &[value.into()])
    }

    /// Store a query var as `true`
    pub fn flag(self, name: &str) -> ModelResult<Self> {
        self.call(name, &[])
    }

    /// Add an equality condition; SQL backends only
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> ModelResult<Self> {
        self.call("where", &[Value::from(column), value.into()])
    }

    pub fn select(mut self, columns: &str) -> ModelResult<Self> {
        self.query.apply_query_var("select", &[Value::from(columns)])?;
        Ok(self)
    }

    pub fn limit(mut self, limit: u64) -> ModelResult<Self> {
        self.query.apply_query_var("limit", &[Value::from(limit)])?;
        Ok(self)
    }

    pub fn take(self, limit: u64) -> ModelResult<Self> {
        self.limit(limit)
    }

    /// Skip `offset` records; negative values count as 0
    pub fn offset(mut self, offset: i64) -> ModelResult<Self> {
        self.query.apply_query_var("offset", &[Value::from(offset.max(0))])?;
        Ok(self)
    }

    pub fn skip(self, offset: i64) -> ModelResult<Self> {
        self.offset(offset)
    }

    /// Order by `column`, descending unless `direction` says otherwise
    pub fn orderby(mut self, column: &str, direction: Option<&str>) -> ModelResult<Self> {
        let direction = direction.unwrap_or("DESC");
        self.query
            .apply_query_var("orderby", &[Value::from(column), Value::from(direction)])?;
        Ok(self)
    }

    /// Limit to page `page` (1-based) of `per_page` records
    pub fn for_page(self, page: u64, per_page: u64) -> ModelResult<Self> {
        let page = i64::try_from(page).unwrap_or(i64::MAX);
        let per_page_count = i64::try_from(per_page).unwrap_or(i64::MAX);
        let skip = page.saturating_sub(1).saturating_mul(per_page_count);
        self.skip(skip)?.take(per_page)
    }

    /// [`for_page`](Self::for_page) with the configured page size
    pub fn page(self, page: u64) -> ModelResult<Self> {
        let per_page = self
            .model
            .as_ref()
            .map_or(ModelConfig::default().per_page, |ctx| ctx.config().per_page);
        self.for_page(page, per_page)
    }
}

impl<M: Model> Builder<M> {
    /// Bind the builder to `M`, pointing the backend at its table, primary key
    /// and object type
    pub fn set_model(mut self, ctx: &Context) -> Self {
        self.query.set_table(M::TABLE);
        self.query.set_primary_key(M::PRIMARY_KEY);
        if !M::OBJECT_TYPE.is_empty() {
            self.query.set_object_type(M::OBJECT_TYPE);
        }

        self.model = Some(ctx.clone());
        self
    }

    pub fn model(&self) -> Option<&Context> {
        self.model.as_ref()
    }

    fn bound(&self) -> ModelResult<&Context> {
        self.model.as_ref().ok_or(ModelError::ModelNotDefined)
    }

    /// Find a model by primary key
    pub fn find(&self, id: &Value) -> ModelResult<Option<M>> {
        let ctx = self.bound()?;
        Ok(self.raw(id).map(|row| M::new_from_builder(ctx, row)))
    }

    /// Run the query and hydrate every row
    pub fn get(&self) -> ModelResult<Collection<M>> {
        let ctx = self.bound()?;
        let models = self
            .get_raw()?
            .into_iter()
            .map(|row| M::new_from_builder(ctx, row))
            .collect();

        Ok(Collection::new(models))
    }

    /// Run the query limited to one record
    pub fn first(&self) -> ModelResult<Option<M>> {
        self.bound()?;
        Ok(self.clone().limit(1)?.get()?.into_first())
    }
}
