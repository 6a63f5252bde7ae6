//! In-memory table storage evaluating SQL builder clauses

use std::cmp::Ordering;

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use super::{column, compare_values, like, values_equal};
use crate::backends::{BackendResult, Connection};
use crate::error::BackendError;
use crate::sql::{Boolean, OrderDirection, QueryBuilder, QueryOperator, WhereCondition};
use crate::value::{parse_object_id, Row};

/// Tables of rows keyed by their prefixed name
#[derive(Debug, Default)]
pub struct MemoryConnection {
    tables: DashMap<String, Vec<Row>>,
    sequences: DashMap<String, i64>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows stored in `table` (prefixed name)
    pub fn count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, |rows| rows.len())
    }

    fn table_of(query: &QueryBuilder) -> BackendResult<String> {
        query
            .table_name()
            .ok_or_else(|| BackendError::new("db_no_table", "No table selected."))
    }
}

impl Connection for MemoryConnection {
    fn select(&self, query: &QueryBuilder) -> BackendResult<Vec<Row>> {
        let table = Self::table_of(query)?;
        debug!(sql = %query.to_sql(), "Selecting rows");

        let mut rows: Vec<Row> = match self.tables.get(&table) {
            Some(rows) => rows.iter().filter(|row| matches(row, query.wheres())).cloned().collect(),
            None => Vec::new(),
        };

        if !query.orders().is_empty() {
            rows.sort_by(|a, b| {
                query
                    .orders()
                    .iter()
                    .map(|(name, direction)| {
                        let ordering = compare_values(column(a, name), column(b, name));
                        match direction {
                            OrderDirection::Asc => ordering,
                            OrderDirection::Desc => ordering.reverse(),
                        }
                    })
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let offset = query.offset_value().unwrap_or(0) as usize;
        let rows = rows.into_iter().skip(offset);
        let rows: Vec<Row> = match query.limit_value() {
            Some(limit) => rows.take(limit as usize).collect(),
            None => rows.collect(),
        };

        let columns = query.columns();
        if columns.is_empty() || columns.iter().any(|c| c == "*") {
            return Ok(rows);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|name| (name.clone(), column(&row, name).clone()))
                    .collect()
            })
            .collect())
    }

    fn insert_get_id(&self, table: &str, values: &Row, key: &str) -> BackendResult<Option<i64>> {
        let mut sequence = self.sequences.entry(table.to_string()).or_insert(0);
        let mut row = values.clone();

        let id = match values.get(key).and_then(parse_object_id) {
            Some(id) => {
                let taken = self
                    .tables
                    .get(table)
                    .is_some_and(|rows| rows.iter().any(|r| values_equal(column(r, key), &Value::from(id))));
                if taken {
                    return Err(BackendError::new(
                        "db_insert_error",
                        format!("Duplicate entry '{}' for key '{}'", id, key),
                    ));
                }
                *sequence = (*sequence).max(id);
                id
            }
            None => {
                *sequence += 1;
                *sequence
            }
        };
        drop(sequence);

        row.insert(key.to_string(), Value::from(id));
        self.tables.entry(table.to_string()).or_default().push(row);

        debug!(table, id, "Inserted row");
        Ok(Some(id))
    }

    fn update(&self, query: &QueryBuilder, values: &Row) -> BackendResult<u64> {
        let table = Self::table_of(query)?;
        let mut affected = 0;

        if let Some(mut rows) = self.tables.get_mut(&table) {
            for row in rows.iter_mut().filter(|row| matches(row, query.wheres())) {
                row.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
                affected += 1;
            }
        }

        debug!(table = %table, affected, "Updated rows");
        Ok(affected)
    }

    fn delete(&self, query: &QueryBuilder) -> BackendResult<u64> {
        let table = Self::table_of(query)?;
        let mut affected = 0;

        if let Some(mut rows) = self.tables.get_mut(&table) {
            let before = rows.len();
            rows.retain(|row| !matches(row, query.wheres()));
            affected = (before - rows.len()) as u64;
        }

        debug!(table = %table, affected, "Deleted rows");
        Ok(affected)
    }
}

/// Evaluate where clauses with `and` binding tighter than `or`
fn matches(row: &Row, wheres: &[WhereCondition]) -> bool {
    if wheres.is_empty() {
        return true;
    }

    let mut groups: Vec<Vec<&WhereCondition>> = vec![Vec::new()];
    for condition in wheres {
        if condition.boolean == Boolean::Or && groups.last().is_some_and(|g| !g.is_empty()) {
            groups.push(Vec::new());
        }
        if let Some(group) = groups.last_mut() {
            group.push(condition);
        }
    }

    groups
        .iter()
        .any(|group| group.iter().all(|condition| evaluate(row, condition)))
}

fn evaluate(row: &Row, condition: &WhereCondition) -> bool {
    let actual = column(row, &condition.column);
    let expected = condition.value.as_ref().unwrap_or(&Value::Null);

    match condition.operator {
        QueryOperator::Equal => values_equal(actual, expected),
        QueryOperator::NotEqual => !actual.is_null() && !values_equal(actual, expected),
        QueryOperator::GreaterThan => !actual.is_null() && compare_values(actual, expected) == Ordering::Greater,
        QueryOperator::GreaterThanOrEqual => !actual.is_null() && compare_values(actual, expected) != Ordering::Less,
        QueryOperator::LessThan => !actual.is_null() && compare_values(actual, expected) == Ordering::Less,
        QueryOperator::LessThanOrEqual => !actual.is_null() && compare_values(actual, expected) != Ordering::Greater,
        QueryOperator::Like => !actual.is_null() && like(actual, expected),
        QueryOperator::NotLike => !actual.is_null() && !like(actual, expected),
        QueryOperator::In => condition.values.iter().any(|v| values_equal(actual, v)),
        QueryOperator::NotIn => !actual.is_null() && !condition.values.iter().any(|v| values_equal(actual, v)),
        QueryOperator::IsNull => actual.is_null(),
        QueryOperator::IsNotNull => !actual.is_null(),
    }
}
