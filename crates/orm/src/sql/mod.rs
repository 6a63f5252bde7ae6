//! SQL query builder used by table-backed models

pub mod builder;
pub mod generation;
pub mod types;

pub use builder::QueryBuilder;
pub use generation::{placeholder, wrap};
pub use types::{Boolean, OrderDirection, QueryOperator, WhereCondition};
