//! Core Backend Traits
//!
//! The data stores a model talks to. Each trait mirrors one WordPress data
//! API: the `$wpdb` connection, the post functions, the term functions and
//! the metadata functions. Failures come back as structured
//! [`BackendError`]s; the query backends decide whether they mean absence or
//! a failed mutation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BackendError;
use crate::query::QueryVars;
use crate::sql::QueryBuilder;
use crate::value::Row;

pub type BackendResult<T> = Result<T, BackendError>;

/// Database connection executing SQL builder queries
pub trait Connection: Send + Sync {
    /// Fetch the rows matching the query
    fn select(&self, query: &QueryBuilder) -> BackendResult<Vec<Row>>;

    /// Insert a row into `table` (prefix applied) and return the new value of `key`
    fn insert_get_id(&self, table: &str, values: &Row, key: &str) -> BackendResult<Option<i64>>;

    /// Update the matching rows, returning how many were affected
    fn update(&self, query: &QueryBuilder, values: &Row) -> BackendResult<u64>;

    /// Delete the matching rows, returning how many were affected
    fn delete(&self, query: &QueryBuilder) -> BackendResult<u64>;
}

/// Result of a post search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostQueryResult {
    pub posts: Vec<Row>,
    /// Matches before pagination
    pub found_posts: u64,
    pub max_num_pages: u64,
}

/// Post data functions
pub trait PostStore: Send + Sync {
    fn get_post(&self, id: i64) -> BackendResult<Option<Row>>;

    /// Insert a post, returning its id
    fn insert_post(&self, data: &Row) -> BackendResult<i64>;

    /// Update a post, returning its id
    fn update_post(&self, id: i64, data: &Row) -> BackendResult<i64>;

    /// Move a post to the trash, returning the trashed post
    fn trash_post(&self, id: i64) -> BackendResult<Option<Row>>;

    /// Delete a post; without `force` it is trashed when the trash is enabled
    fn delete_post(&self, id: i64, force: bool) -> BackendResult<Option<Row>>;

    fn query(&self, vars: &QueryVars) -> BackendResult<PostQueryResult>;
}

/// Identifiers of an inserted or updated term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermIds {
    pub term_id: i64,
    pub term_taxonomy_id: i64,
}

/// Term data functions
pub trait TermStore: Send + Sync {
    fn get_term(&self, id: i64, taxonomy: &str) -> BackendResult<Option<Row>>;

    fn insert_term(&self, name: &str, taxonomy: &str, args: &Row) -> BackendResult<TermIds>;

    fn update_term(&self, id: i64, taxonomy: &str, args: &Row) -> BackendResult<TermIds>;

    fn delete_term(&self, id: i64, taxonomy: &str) -> BackendResult<bool>;

    fn query(&self, vars: &QueryVars) -> BackendResult<Vec<Row>>;
}

/// Metadata functions, keyed by meta type (`post`, `term`, ...)
pub trait MetaStore: Send + Sync {
    /// Every value stored under `key`, in insertion order
    fn get(&self, meta_type: &str, object_id: i64, key: &str) -> BackendResult<Vec<Value>>;

    /// Add a value; with `unique`, fails when `key` already has a value
    fn add(&self, meta_type: &str, object_id: i64, key: &str, value: Value, unique: bool)
        -> BackendResult<Option<i64>>;

    /// Replace every value of `key` with `value`, adding it when absent
    fn update(&self, meta_type: &str, object_id: i64, key: &str, value: Value) -> BackendResult<bool>;

    fn delete(&self, meta_type: &str, object_id: i64, key: &str) -> BackendResult<bool>;
}
