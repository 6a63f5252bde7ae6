//! Query backends and the fluent builder
//!
//! A [`Query`] turns the generic verbs of the [`Builder`] (select, limit,
//! offset, orderby, insert, update, delete) into the native calls of one data
//! store. Three backends ship with the crate:
//!
//! - [`DbQuery`] drives the SQL builder through a [`Connection`](crate::backends::Connection)
//! - [`PostQuery`] builds post searches over a [`PostStore`](crate::backends::PostStore)
//! - [`TermQuery`] builds term searches over a [`TermStore`](crate::backends::TermStore)

pub mod builder;
pub mod db;
pub mod post;
pub mod term;
pub mod vars;

pub use builder::Builder;
pub use db::DbQuery;
pub use post::PostQuery;
pub use term::TermQuery;
pub use vars::QueryVars;

use serde_json::Value;

use crate::backends::PostQueryResult;
use crate::error::{ModelResult, QueryError};
use crate::sql::QueryBuilder;
use crate::value::Row;

/// Borrowed var store of a backend
#[derive(Debug, Clone, Copy)]
pub enum VarsRef<'a> {
    Array(&'a QueryVars),
    Sql(&'a QueryBuilder),
}

/// Mutably borrowed var store of a backend
#[derive(Debug)]
pub enum VarsMut<'a> {
    Array(&'a mut QueryVars),
    Sql(&'a mut QueryBuilder),
}

impl VarsMut<'_> {
    /// Invoke an operation of the var store itself, if it has one named `name`
    pub fn call_method(&mut self, name: &str, args: &[Value]) -> Option<ModelResult<()>> {
        match self {
            VarsMut::Array(vars) => vars.call_method(name, args),
            VarsMut::Sql(sql) => sql.call(name, args),
        }
    }
}

/// Raw result handle returned by [`Query::do_query`]
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Rows(Vec<Row>),
    Posts(PostQueryResult),
    Terms(Vec<Row>),
}

/// A persistence action dispatched through a model
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Insert(Row),
    Update { id: Value, dirty: Row },
    Delete { id: Value, force: bool },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Insert(_) => "insert",
            Action::Update { .. } => "update",
            Action::Delete { .. } => "delete",
        }
    }
}

/// Outcome of an [`Action`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutput {
    Inserted(Option<i64>),
    Updated(bool),
    Deleted(bool),
}

impl ActionOutput {
    /// The new id, if the insert produced a positive one
    pub fn inserted_id(&self) -> Option<i64> {
        match self {
            ActionOutput::Inserted(Some(id)) if *id > 0 => Some(*id),
            _ => None,
        }
    }

    pub fn succeeded(&self) -> bool {
        match self {
            ActionOutput::Inserted(_) => self.inserted_id().is_some(),
            ActionOutput::Updated(ok) | ActionOutput::Deleted(ok) => *ok,
        }
    }
}

/// Look a query var up in a translation table
pub fn translate<'a>(table: &'static [(&'static str, &'static str)], name: &'a str) -> &'a str {
    table
        .iter()
        .find(|(from, _)| *from == name)
        .map_or(name, |(_, to)| *to)
}

/// A query backend
pub trait Query: Send + Sync {
    fn table(&self) -> &str;
    fn primary_key(&self) -> &str;
    fn object_type(&self) -> &str;

    fn set_table(&mut self, table: &str);
    fn set_primary_key(&mut self, primary_key: &str);
    fn set_object_type(&mut self, object_type: &str);

    fn query_vars(&self) -> VarsRef<'_>;
    fn query_vars_mut(&mut self) -> VarsMut<'_>;

    /// Generic query var names mapped to this backend's names
    fn translations(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Fetch one raw row; absence and backend errors are `None`
    fn get_by_id(&self, id: &Value) -> Option<Row>;

    /// Run a search with the given var store
    fn do_query(&self, vars: VarsRef<'_>) -> ModelResult<QueryResult>;

    /// Pull the raw rows out of a result handle
    fn extract_items(&self, result: QueryResult) -> ModelResult<Vec<Row>> {
        match result {
            QueryResult::Rows(rows) => Ok(rows),
            _ => Err(QueryError::InvalidResult { expected: "QueryResult::Rows" }.into()),
        }
    }

    /// Record a query var in the var store
    fn apply_query_var(&mut self, name: &str, args: &[Value]) -> ModelResult<()> {
        apply_translated(self, name, args)
    }

    /// Invoke one of the backend's own operations by name
    fn call(&mut self, name: &str, args: &[Value]) -> Option<ModelResult<()>> {
        let target = match name {
            "set_table" | "set_primary_key" | "set_object_type" => name,
            _ => return None,
        };

        let value = match args.first() {
            Some(Value::String(value)) => value.clone(),
            _ => {
                return Some(Err(
                    QueryError::invalid_arguments(name, "expected a string").into()
                ))
            }
        };

        match target {
            "set_table" => self.set_table(&value),
            "set_primary_key" => self.set_primary_key(&value),
            _ => self.set_object_type(&value),
        }
        Some(Ok(()))
    }

    /// Perform a persistence action; `None` when the backend lacks it
    fn perform(&self, _action: &Action) -> Option<ActionOutput> {
        None
    }

    /// The pending query vars, empty for SQL-backed queries
    fn to_array(&self) -> Row {
        match self.query_vars() {
            VarsRef::Array(vars) => vars.to_array(),
            VarsRef::Sql(_) => Row::new(),
        }
    }

    fn clone_box(&self) -> Box<dyn Query>;
}

impl Clone for Box<dyn Query> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Translate `name`, then store it in an array-like var store or invoke the
/// SQL builder operation of that name.
pub fn apply_translated<Q: Query + ?Sized>(query: &mut Q, name: &str, args: &[Value]) -> ModelResult<()> {
    let name = translate(query.translations(), name);

    match query.query_vars_mut() {
        VarsMut::Array(vars) => {
            vars.call(name, args);
            Ok(())
        }
        VarsMut::Sql(sql) => sql
            .call(name, args)
            .unwrap_or_else(|| Err(QueryError::unsupported(name).into())),
    }
}

/// Shared `orderby` handling of the post and term backends: sets both
/// `orderby` and `order` when a direction is given.
pub(crate) fn apply_orderby(vars: &mut QueryVars, args: &[Value]) {
    if let Some(orderby) = args.first() {
        vars.set("orderby", orderby.clone());
    }

    if let Some(order) = args.get(1) {
        vars.set("order", order.clone());
    }
}
