//! Term query backend

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{apply_orderby, apply_translated, Action, ActionOutput, Query, QueryResult, QueryVars, VarsMut, VarsRef};
use crate::backends::TermStore;
use crate::error::{ModelResult, QueryError};
use crate::value::{parse_object_id, Row};

const TRANSLATIONS: &[(&str, &str)] = &[("select", "fields"), ("limit", "number")];

/// Query backend for the terms of one taxonomy
#[derive(Clone)]
pub struct TermQuery {
    terms: Arc<dyn TermStore>,
    vars: QueryVars,
    table: String,
    primary_key: String,
    object_type: String,
}

impl TermQuery {
    pub fn new(terms: Arc<dyn TermStore>, vars: QueryVars) -> Self {
        Self {
            terms,
            vars,
            table: "terms".to_string(),
            primary_key: "term_id".to_string(),
            object_type: "category".to_string(),
        }
    }

    pub fn vars(&self) -> &QueryVars {
        &self.vars
    }

    /// Insert a term; `name` is required
    pub fn insert(&self, attributes: &Row) -> Option<i64> {
        let name = match attributes.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(value) if !value.is_null() => value.to_string(),
            _ => return None,
        };

        debug!(taxonomy = %self.object_type, name = %name, "Inserting term");
        match self.terms.insert_term(&name, &self.object_type, attributes) {
            Ok(ids) => Some(ids.term_id),
            Err(err) => {
                warn!(taxonomy = %self.object_type, error = %err, "Insert term failed");
                None
            }
        }
    }

    pub fn update(&self, id: &Value, dirty: &Row) -> bool {
        let id = match parse_object_id(id) {
            Some(id) => id,
            None => return false,
        };

        debug!(term_id = id, taxonomy = %self.object_type, "Updating term");
        match self.terms.update_term(id, &self.object_type, dirty) {
            Ok(ids) => ids.term_id > 0,
            Err(err) => {
                warn!(term_id = id, error = %err, "Update term failed");
                false
            }
        }
    }

    /// Delete a term; terms have no trash, so `force` has no effect
    pub fn delete(&self, id: &Value, _force: bool) -> bool {
        let id = match parse_object_id(id) {
            Some(id) => id,
            None => return false,
        };

        debug!(term_id = id, taxonomy = %self.object_type, "Deleting term");
        match self.terms.delete_term(id, &self.object_type) {
            Ok(deleted) => deleted,
            Err(err) => {
                warn!(term_id = id, error = %err, "Delete term failed");
                false
            }
        }
    }
}

impl Query for TermQuery {
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
    }

    fn set_primary_key(&mut self, primary_key: &str) {
        self.primary_key = primary_key.to_string();
    }

    fn set_object_type(&mut self, object_type: &str) {
        self.object_type = object_type.to_string();
    }

    fn query_vars(&self) -> VarsRef<'_> {
        VarsRef::Array(&self.vars)
    }

    fn query_vars_mut(&mut self) -> VarsMut<'_> {
        VarsMut::Array(&mut self.vars)
    }

    fn translations(&self) -> &'static [(&'static str, &'static str)] {
        TRANSLATIONS
    }

    fn get_by_id(&self, id: &Value) -> Option<Row> {
        let id = parse_object_id(id)?;
        debug!(term_id = id, taxonomy = %self.object_type, "Fetching term");

        match self.terms.get_term(id, &self.object_type) {
            Ok(term) => term,
            Err(err) => {
                warn!(term_id = id, error = %err, "Fetch term failed");
                None
            }
        }
    }

    fn do_query(&self, vars: VarsRef<'_>) -> ModelResult<QueryResult> {
        let vars = match vars {
            VarsRef::Array(vars) => vars,
            VarsRef::Sql(_) => return Err(QueryError::InvalidQueryVars { expected: "QueryVars" }.into()),
        };

        debug!(taxonomy = %self.object_type, vars = vars.len(), "Running term query");
        match self.terms.query(vars) {
            Ok(terms) => Ok(QueryResult::Terms(terms)),
            Err(err) => {
                warn!(taxonomy = %self.object_type, error = %err, "Term query failed");
                Ok(QueryResult::Terms(Vec::new()))
            }
        }
    }

    fn extract_items(&self, result: QueryResult) -> ModelResult<Vec<Row>> {
        match result {
            QueryResult::Terms(terms) => Ok(terms),
            _ => Err(QueryError::InvalidResult { expected: "QueryResult::Terms" }.into()),
        }
    }

    fn apply_query_var(&mut self, name: &str, args: &[Value]) -> ModelResult<()> {
        if name == "orderby" {
            apply_orderby(&mut self.vars, args);
            return Ok(());
        }

        apply_translated(self, name, args)
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
