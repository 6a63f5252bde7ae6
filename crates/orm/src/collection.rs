//! Ordered results of a query

use serde_json::Value;

use crate::model::{Model, ModelExtensions};
use crate::value::Row;

/// Models returned by a query, in backend order
#[derive(Debug, Clone)]
pub struct Collection<M> {
    items: Vec<M>,
}

impl<M> Default for Collection<M> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<M> Collection<M> {
    pub fn new(items: Vec<M>) -> Self {
        Self { items }
    }

    pub fn first(&self) -> Option<&M> {
        self.items.first()
    }

    pub fn into_first(self) -> Option<M> {
        self.items.into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.items.iter()
    }

    /// Wrap every item into another type
    pub fn map_into<T, F>(self, f: F) -> Collection<T>
    where
        F: FnMut(M) -> T,
    {
        Collection::new(self.items.into_iter().map(f).collect())
    }

    pub fn into_vec(self) -> Vec<M> {
        self.items
    }
}

impl<M: Model> Collection<M> {
    /// Primary key of each item; null for items without one
    pub fn keys(&self) -> Vec<Value> {
        self.items
            .iter()
            .map(|item| item.key().cloned().unwrap_or(Value::Null))
            .collect()
    }

    pub fn to_array(&self) -> Vec<Row> {
        self.items.iter().map(ModelExtensions::to_array).collect()
    }
}

impl<M> IntoIterator for Collection<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, M> IntoIterator for &'a Collection<M> {
    type Item = &'a M;
    type IntoIter = std::slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<M> FromIterator<M> for Collection<M> {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
