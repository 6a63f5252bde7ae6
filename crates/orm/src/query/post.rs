//! Post query backend

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{apply_orderby, apply_translated, Action, ActionOutput, Query, QueryResult, QueryVars, VarsMut, VarsRef};
use crate::backends::{PostQueryResult, PostStore};
use crate::error::{ModelResult, QueryError};
use crate::value::{parse_object_id, Row};

const TRANSLATIONS: &[(&str, &str)] = &[
    ("select", "fields"),
    ("limit", "posts_per_page"),
    ("parent", "post_parent"),
    ("status", "post_status"),
    ("include", "post__in"),
    ("exclude", "post__not_in"),
];

/// Query backend for post entities of one post type
#[derive(Clone)]
pub struct PostQuery {
    posts: Arc<dyn PostStore>,
    vars: QueryVars,
    table: String,
    primary_key: String,
    object_type: String,
    trash_enabled: bool,
}

impl PostQuery {
    pub fn new(posts: Arc<dyn PostStore>, vars: QueryVars) -> Self {
        Self {
            posts,
            vars,
            table: "posts".to_string(),
            primary_key: "ID".to_string(),
            object_type: "post".to_string(),
            trash_enabled: true,
        }
    }

    /// Whether non-forced deletes move posts to the trash
    pub fn with_trash(mut self, enabled: bool) -> Self {
        self.trash_enabled = enabled;
        self
    }

    pub fn vars(&self) -> &QueryVars {
        &self.vars
    }

    /// Insert a post, as this backend's post type unless `post_type` is given
    pub fn insert(&self, attributes: &Row) -> Option<i64> {
        debug!(post_type = %self.object_type, "Inserting post");

        let mut data = attributes.clone();
        data.entry("post_type".to_string())
            .or_insert_with(|| Value::from(self.object_type.as_str()));

        match self.posts.insert_post(&data) {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(post_type = %self.object_type, error = %err, "Insert post failed");
                None
            }
        }
    }

    /// Update a post; an empty change-set or a missing post fails
    pub fn update(&self, id: &Value, dirty: &Row) -> bool {
        let id = match parse_object_id(id) {
            Some(id) => id,
            None => return false,
        };

        if dirty.is_empty() || !self.post_exists(id) {
            return false;
        }

        debug!(post_id = id, "Updating post");
        match self.posts.update_post(id, dirty) {
            Ok(updated) => updated != 0,
            Err(err) => {
                warn!(post_id = id, error = %err, "Update post failed");
                false
            }
        }
    }

    /// Trash the post unless `force`, the trash is disabled or the post is
    /// already trashed; otherwise delete it permanently
    pub fn delete(&self, id: &Value, force: bool) -> bool {
        let id = match parse_object_id(id) {
            Some(id) => id,
            None => return false,
        };

        let result = if !force && self.trash_enabled && self.post_status(id).as_deref() != Some("trash") {
            debug!(post_id = id, "Trashing post");
            self.posts.trash_post(id)
        } else {
            debug!(post_id = id, "Deleting post");
            self.posts.delete_post(id, true)
        };

        match result {
            Ok(post) => post.is_some(),
            Err(err) => {
                warn!(post_id = id, error = %err, "Delete post failed");
                false
            }
        }
    }

    fn fetch(&self, id: i64) -> Option<Row> {
        match self.posts.get_post(id) {
            Ok(post) => post,
            Err(err) => {
                warn!(post_id = id, error = %err, "Fetch post failed");
                None
            }
        }
    }

    fn post_exists(&self, id: i64) -> bool {
        self.post_status(id).is_some()
    }

    fn post_status(&self, id: i64) -> Option<String> {
        self.fetch(id)
            .and_then(|post| post.get("post_status").and_then(Value::as_str).map(str::to_string))
    }
}

impl Query for PostQuery {
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

    /// Fetch a post of this backend's post type
    fn get_by_id(&self, id: &Value) -> Option<Row> {
        let id = parse_object_id(id)?;
        debug!(post_id = id, post_type = %self.object_type, "Fetching post");

        let post = self.fetch(id)?;
        let post_type = post.get("post_type").and_then(Value::as_str);

        if post_type != Some(self.object_type.as_str()) {
            return None;
        }

        Some(post)
    }

    fn do_query(&self, vars: VarsRef<'_>) -> ModelResult<QueryResult> {
        let vars = match vars {
            VarsRef::Array(vars) => vars,
            VarsRef::Sql(_) => return Err(QueryError::InvalidQueryVars { expected: "QueryVars" }.into()),
        };

        debug!(post_type = %self.object_type, vars = vars.len(), "Running post query");
        match self.posts.query(vars) {
            Ok(result) => Ok(QueryResult::Posts(result)),
            Err(err) => {
                warn!(post_type = %self.object_type, error = %err, "Post query failed");
                Ok(QueryResult::Posts(PostQueryResult::default()))
            }
        }
    }

    fn extract_items(&self, result: QueryResult) -> ModelResult<Vec<Row>> {
        match result {
            QueryResult::Posts(result) => Ok(result.posts),
            _ => Err(QueryError::InvalidResult { expected: "PostQueryResult" }.into()),
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
