//! SQL-backed query

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{Action, ActionOutput, Query, QueryResult, VarsMut, VarsRef};
use crate::backends::Connection;
use crate::error::{ModelResult, QueryError};
use crate::sql::QueryBuilder;
use crate::value::Row;

const TRANSLATIONS: &[(&str, &str)] = &[("orderby", "orderBy")];

/// Query backend driving the SQL builder over a [`Connection`]
#[derive(Clone)]
pub struct DbQuery {
    connection: Arc<dyn Connection>,
    query: QueryBuilder,
    table: String,
    primary_key: String,
    object_type: String,
}

impl DbQuery {
    /// Create a backend whose var store is `query`
    pub fn new(connection: Arc<dyn Connection>, query: QueryBuilder) -> Self {
        let table = query.table.clone().unwrap_or_default();

        Self {
            connection,
            query,
            table,
            primary_key: "ID".to_string(),
            object_type: String::new(),
        }
    }

    /// The pending SQL query
    pub fn builder(&self) -> &QueryBuilder {
        &self.query
    }

    pub fn insert(&self, attributes: &Row) -> Option<i64> {
        let table = format!("{}{}", self.query.prefix(), self.table);
        debug!(table = %table, "Inserting row");

        match self
            .connection
            .insert_get_id(&table, attributes, &self.primary_key)
        {
            Ok(id) => id,
            Err(err) => {
                warn!(table = %table, error = %err, "Insert failed");
                None
            }
        }
    }

    pub fn update(&self, id: &Value, dirty: &Row) -> bool {
        debug!(table = %self.table, id = %id, "Updating row");

        match self.connection.update(&self.query_for_save(id), dirty) {
            Ok(affected) => affected > 0,
            Err(err) => {
                warn!(table = %self.table, id = %id, error = %err, "Update failed");
                false
            }
        }
    }

    /// Delete the row; there is no soft delete for plain tables, so `force`
    /// has no effect
    pub fn delete(&self, id: &Value, _force: bool) -> bool {
        debug!(table = %self.table, id = %id, "Deleting row");

        match self.connection.delete(&self.query_for_save(id)) {
            Ok(affected) => affected > 0,
            Err(err) => {
                warn!(table = %self.table, id = %id, error = %err, "Delete failed");
                false
            }
        }
    }

    fn query_for_save(&self, id: &Value) -> QueryBuilder {
        QueryBuilder::table(self.query.prefix(), &self.table).where_eq(&self.primary_key, id.clone())
    }
}

impl Query for DbQuery {
    fn table(&self) -> &str {
        &self.table
    }

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn object_type(&self) -> &str {
        &self.object_type
    }

    fn set_table(&mut self, table: &str) {
        self.table = table.to_string();
        self.query.set_table(table);
    }

    fn set_primary_key(&mut self, primary_key: &str) {
        self.primary_key = primary_key.to_string();
    }

    fn set_object_type(&mut self, object_type: &str) {
        self.object_type = object_type.to_string();
    }

    fn query_vars(&self) -> VarsRef<'_> {
        VarsRef::Sql(&self.query)
    }

    fn query_vars_mut(&mut self) -> VarsMut<'_> {
        VarsMut::Sql(&mut self.query)
    }

    fn translations(&self) -> &'static [(&'static str, &'static str)] {
        TRANSLATIONS
    }

    fn get_by_id(&self, id: &Value) -> Option<Row> {
        debug!(table = %self.table, id = %id, "Fetching row by id");

        let query = self
            .query
            .clone()
            .where_eq(&self.primary_key, id.clone())
            .limit(1);

        match self.connection.select(&query) {
            Ok(rows) => rows.into_iter().next(),
            Err(err) => {
                warn!(table = %self.table, id = %id, error = %err, "Fetch by id failed");
                None
            }
        }
    }

    fn do_query(&self, vars: VarsRef<'_>) -> ModelResult<QueryResult> {
        let query = match vars {
            VarsRef::Sql(query) => query,
            VarsRef::Array(_) => {
                return Err(QueryError::InvalidQueryVars { expected: "sql::QueryBuilder" }.into())
            }
        };

        debug!(sql = %query.to_sql(), "Running table query");
        match self.connection.select(query) {
            Ok(rows) => Ok(QueryResult::Rows(rows)),
            Err(err) => {
                warn!(table = %self.table, error = %err, "Table query failed");
                Ok(QueryResult::Rows(Vec::new()))
            }
        }
    }

    fn perform(&self, action: &Action) -> Option<ActionOutput> {
        let output = match action {
            Action::Insert(attributes) => ActionOutput::Inserted(self.insert(attributes)),
            Action::Update { id, dirty } => ActionOutput::Updated(self.update(id, dirty)),
            Action::Delete { id, force } => ActionOutput::Deleted(self.delete(id, *force)),
        };
        Some(output)
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }
}
