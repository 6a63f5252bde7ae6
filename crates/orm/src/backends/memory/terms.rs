//! In-memory taxonomy terms

use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use super::{column, int_var, list_var, paginate, slugify, sort_rows, values_equal};
use crate::backends::{BackendResult, TermIds, TermStore};
use crate::error::BackendError;
use crate::query::QueryVars;
use crate::value::Row;

/// Terms of every taxonomy. Each term belongs to exactly one taxonomy, so
/// `term_taxonomy_id` equals `term_id`.
#[derive(Debug)]
pub struct MemoryTerms {
    terms: DashMap<i64, Row>,
    next_id: AtomicI64,
}

impl Default for MemoryTerms {
    fn default() -> Self {
        Self {
            terms: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryTerms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn exists(&self, name: &str, taxonomy: &str, parent: &Value, except: Option<i64>) -> bool {
        self.terms.iter().any(|entry| {
            let term = entry.value();
            Some(*entry.key()) != except
                && column(term, "taxonomy") == taxonomy
                && column(term, "name").as_str().is_some_and(|n| n.eq_ignore_ascii_case(name))
                && values_equal(column(term, "parent"), parent)
        })
    }

    fn ids(term_id: i64) -> TermIds {
        TermIds {
            term_id,
            term_taxonomy_id: term_id,
        }
    }
}

fn text_arg(args: &Row, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

impl TermStore for MemoryTerms {
    fn get_term(&self, id: i64, taxonomy: &str) -> BackendResult<Option<Row>> {
        Ok(self
            .terms
            .get(&id)
            .filter(|term| taxonomy.is_empty() || column(term, "taxonomy") == taxonomy)
            .map(|term| term.value().clone()))
    }

    fn insert_term(&self, name: &str, taxonomy: &str, args: &Row) -> BackendResult<TermIds> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BackendError::new("empty_term_name", "A name is required for this term."));
        }

        let parent = args.get("parent").cloned().unwrap_or(Value::from(0));
        if self.exists(name, taxonomy, &parent, None) {
            return Err(BackendError::new(
                "term_exists",
                "A term with the name provided already exists in this taxonomy.",
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let slug = text_arg(args, "slug").unwrap_or_else(|| slugify(name));

        let mut term = Row::new();
        term.insert("term_id".into(), Value::from(id));
        term.insert("term_taxonomy_id".into(), Value::from(id));
        term.insert("name".into(), Value::from(name));
        term.insert("slug".into(), Value::from(slug));
        term.insert("taxonomy".into(), Value::from(taxonomy));
        term.insert(
            "description".into(),
            Value::from(text_arg(args, "description").unwrap_or_default()),
        );
        term.insert("parent".into(), parent);
        term.insert("count".into(), Value::from(0));

        debug!(term_id = id, taxonomy, "Stored term");
        self.terms.insert(id, term);
        Ok(Self::ids(id))
    }

    fn update_term(&self, id: i64, taxonomy: &str, args: &Row) -> BackendResult<TermIds> {
        if self.get_term(id, taxonomy)?.is_none() {
            return Err(BackendError::new("invalid_term", "Empty Term."));
        }

        if let Some(name) = args.get("name") {
            let name = name.as_str().map(str::trim).unwrap_or_default();
            if name.is_empty() {
                return Err(BackendError::new("empty_term_name", "A name is required for this term."));
            }

            let parent = match args.get("parent") {
                Some(parent) => parent.clone(),
                None => self
                    .terms
                    .get(&id)
                    .map_or(Value::from(0), |term| column(&term, "parent").clone()),
            };
            if self.exists(name, taxonomy, &parent, Some(id)) {
                return Err(BackendError::new(
                    "term_exists",
                    "A term with the name provided already exists in this taxonomy.",
                ));
            }
        }

        if let Some(mut term) = self.terms.get_mut(&id) {
            for key in ["name", "slug", "description", "parent"] {
                if let Some(value) = args.get(key) {
                    term.insert(key.to_string(), value.clone());
                }
            }
        }

        debug!(term_id = id, taxonomy, "Updated term");
        Ok(Self::ids(id))
    }

    fn delete_term(&self, id: i64, taxonomy: &str) -> BackendResult<bool> {
        if self.get_term(id, taxonomy)?.is_none() {
            return Ok(false);
        }

        debug!(term_id = id, taxonomy, "Deleted term");
        Ok(self.terms.remove(&id).is_some())
    }

    fn query(&self, vars: &QueryVars) -> BackendResult<Vec<Row>> {
        let taxonomies = vars.get("taxonomy").map(list_var).unwrap_or_default();
        let include = vars.get("include").map(list_var).filter(|ids| !ids.is_empty());
        let exclude = vars.get("exclude").map(list_var).unwrap_or_default();
        let parent = vars.get("parent").filter(|v| !v.is_null() && *v != "");
        let hide_empty = vars.get("hide_empty").is_some_and(|v| v == true);

        let mut terms: Vec<Row> = self
            .terms
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|term| {
                taxonomies.is_empty() || taxonomies.iter().any(|t| values_equal(column(term, "taxonomy"), t))
            })
            .filter(|term| {
                include
                    .as_ref()
                    .map_or(true, |ids| ids.iter().any(|id| values_equal(column(term, "term_id"), id)))
            })
            .filter(|term| !exclude.iter().any(|id| values_equal(column(term, "term_id"), id)))
            .filter(|term| parent.map_or(true, |p| values_equal(column(term, "parent"), p)))
            .filter(|term| !hide_empty || int_var(term.get("count")).unwrap_or(0) > 0)
            .collect();

        let orderby = match vars.get("orderby").and_then(Value::as_str).unwrap_or("name") {
            "id" | "term_id" => "term_id",
            "slug" => "slug",
            "count" => "count",
            "description" => "description",
            "parent" => "parent",
            "none" => "none",
            _ => "name",
        };
        let descending = vars
            .get("order")
            .and_then(Value::as_str)
            .is_some_and(|order| order.eq_ignore_ascii_case("DESC"));

        if orderby != "none" {
            sort_rows(&mut terms, orderby, descending, "term_id");
        }

        let offset = int_var(vars.get("offset")).unwrap_or(0).max(0) as usize;
        let limit = int_var(vars.get("number")).filter(|n| *n > 0).map(|n| n as usize);
        let terms = paginate(terms, offset, limit);

        let terms = match vars.get("fields").and_then(Value::as_str) {
            Some("ids") => terms
                .into_iter()
                .map(|term| Row::from([("term_id".to_string(), column(&term, "term_id").clone())]))
                .collect(),
            Some("names") => terms
                .into_iter()
                .map(|term| Row::from([("name".to_string(), column(&term, "name").clone())]))
                .collect(),
            _ => terms,
        };

        Ok(terms)
    }
}
