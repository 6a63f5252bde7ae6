//! Query vars bag
//!
//! The argument map handed to post and term searches. Fluent calls with an
//! unknown name store that name as a key: one argument stores the argument,
//! no argument stores `true`.

use std::ops::Index;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelResult, QueryError};
use crate::value::Row;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryVars {
    vars: Row,
}

impl QueryVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Set a var; last write wins
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Whether a var is set to a non-null value
    pub fn has(&self, key: &str) -> bool {
        self.vars.get(key).map_or(false, |value| !value.is_null())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    /// Merge `vars` over the current ones
    pub fn with(mut self, vars: Row) -> Self {
        self.vars.extend(vars);
        self
    }

    pub fn with_var(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set `name` to `true`
    pub fn flag(mut self, name: &str) -> Self {
        self.set(name, true);
        self
    }

    /// Store `name` as a key: the first argument, or `true` without arguments
    pub fn call(&mut self, name: &str, args: &[Value]) -> &mut Self {
        let value = args.first().cloned().unwrap_or(Value::Bool(true));
        self.set(name, value)
    }

    /// Invoke one of the bag's own operations by name.
    ///
    /// Only `with` is recognised; `None` for anything else.
    pub fn call_method(&mut self, name: &str, args: &[Value]) -> Option<ModelResult<()>> {
        if name != "with" {
            return None;
        }

        let result = match args.first() {
            Some(Value::Object(map)) => {
                self.vars
                    .extend(map.iter().map(|(key, value)| (key.clone(), value.clone())));
                Ok(())
            }
            _ => Err(QueryError::invalid_arguments(name, "expected a map of query vars").into()),
        };
        Some(result)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn to_array(&self) -> Row {
        self.vars.clone()
    }
}

impl From<Row> for QueryVars {
    fn from(vars: Row) -> Self {
        Self { vars }
    }
}

impl Index<&str> for QueryVars {
    type Output = Value;

    /// Missing vars read as null
    fn index(&self, key: &str) -> &Value {
        self.vars.get(key).unwrap_or(&NULL)
    }
}
