//! In-memory post storage

use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use super::{column, int_var, list_var, now, paginate, slugify, sort_rows, values_equal};
use crate::backends::{BackendResult, PostQueryResult, PostStore};
use crate::error::BackendError;
use crate::query::QueryVars;
use crate::value::Row;

const DEFAULT_PER_PAGE: i64 = 10;

/// Posts of every type, with a trash that remembers the previous status
#[derive(Debug)]
pub struct MemoryPosts {
    posts: DashMap<i64, Row>,
    trashed_status: DashMap<i64, Value>,
    next_id: AtomicI64,
    trash_enabled: bool,
}

impl Default for MemoryPosts {
    fn default() -> Self {
        Self {
            posts: DashMap::new(),
            trashed_status: DashMap::new(),
            next_id: AtomicI64::new(1),
            trash_enabled: true,
        }
    }
}

impl MemoryPosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// With the trash disabled, trashing deletes permanently
    pub fn with_trash(mut self, enabled: bool) -> Self {
        self.trash_enabled = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    fn defaults(id: i64) -> Row {
        let date = now();
        let mut post = Row::new();
        post.insert("ID".into(), Value::from(id));
        post.insert("post_author".into(), Value::from(0));
        post.insert("post_title".into(), Value::from(""));
        post.insert("post_content".into(), Value::from(""));
        post.insert("post_excerpt".into(), Value::from(""));
        post.insert("post_status".into(), Value::from("publish"));
        post.insert("post_type".into(), Value::from("post"));
        post.insert("post_name".into(), Value::from(""));
        post.insert("post_parent".into(), Value::from(0));
        post.insert("menu_order".into(), Value::from(0));
        post.insert("post_date".into(), Value::from(date.clone()));
        post.insert("post_modified".into(), Value::from(date));
        post
    }

    fn status_matches(post: &Row, statuses: &[Value]) -> bool {
        let status = column(post, "post_status");

        if statuses.iter().any(|s| s == "any") {
            return status != "trash";
        }
        statuses.iter().any(|s| values_equal(status, s))
    }
}

impl PostStore for MemoryPosts {
    fn get_post(&self, id: i64) -> BackendResult<Option<Row>> {
        Ok(self.posts.get(&id).map(|post| post.value().clone()))
    }

    fn insert_post(&self, data: &Row) -> BackendResult<i64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut post = Self::defaults(id);

        post.extend(
            data.iter()
                .filter(|(key, _)| key.as_str() != "ID")
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        if column(&post, "post_name").as_str().is_some_and(str::is_empty) {
            let slug = column(&post, "post_title").as_str().map(slugify);
            if let Some(slug) = slug {
                post.insert("post_name".into(), Value::from(slug));
            }
        }

        debug!(post_id = id, post_type = %column(&post, "post_type"), "Stored post");
        self.posts.insert(id, post);
        Ok(id)
    }

    fn update_post(&self, id: i64, data: &Row) -> BackendResult<i64> {
        let mut post = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| BackendError::new("invalid_post", "Invalid post ID."))?;

        post.extend(
            data.iter()
                .filter(|(key, _)| key.as_str() != "ID")
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        post.insert("post_modified".into(), Value::from(now()));

        Ok(id)
    }

    fn trash_post(&self, id: i64) -> BackendResult<Option<Row>> {
        if !self.trash_enabled {
            return self.delete_post(id, true);
        }

        let mut post = match self.posts.get_mut(&id) {
            Some(post) => post,
            None => return Ok(None),
        };

        if post.get("post_status").is_some_and(|s| s == "trash") {
            return Ok(None);
        }

        let previous = post
            .insert("post_status".into(), Value::from("trash"))
            .unwrap_or(Value::Null);
        self.trashed_status.insert(id, previous);

        debug!(post_id = id, "Trashed post");
        Ok(Some(post.value().clone()))
    }

    fn delete_post(&self, id: i64, force: bool) -> BackendResult<Option<Row>> {
        let soft = {
            let post = match self.posts.get(&id) {
                Some(post) => post,
                None => return Ok(None),
            };
            let post_type = column(&post, "post_type");
            !force
                && self.trash_enabled
                && (post_type == "post" || post_type == "page")
                && column(&post, "post_status") != "trash"
        };

        if soft {
            return self.trash_post(id);
        }

        self.trashed_status.remove(&id);
        debug!(post_id = id, "Deleted post");
        Ok(self.posts.remove(&id).map(|(_, post)| post))
    }

    fn query(&self, vars: &QueryVars) -> BackendResult<PostQueryResult> {
        let post_types = match vars.get("post_type") {
            Some(value) => list_var(value),
            None => vec![Value::from("post")],
        };
        let statuses = match vars.get("post_status") {
            Some(value) => list_var(value),
            None => vec![Value::from("publish")],
        };
        let include = vars.get("post__in").map(list_var);
        let exclude = vars.get("post__not_in").map(list_var).unwrap_or_default();
        let parent = vars.get("post_parent").filter(|v| !v.is_null());

        let mut posts: Vec<Row> = self
            .posts
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|post| {
                let post_type = column(post, "post_type");
                post_types.iter().any(|t| t == "any" || values_equal(post_type, t))
            })
            .filter(|post| Self::status_matches(post, &statuses))
            .filter(|post| {
                include
                    .as_ref()
                    .map_or(true, |ids| ids.iter().any(|id| values_equal(column(post, "ID"), id)))
            })
            .filter(|post| !exclude.iter().any(|id| values_equal(column(post, "ID"), id)))
            .filter(|post| parent.map_or(true, |p| values_equal(column(post, "post_parent"), p)))
            .collect();

        let orderby = vars
            .get("orderby")
            .and_then(Value::as_str)
            .unwrap_or("date");
        let descending = !vars
            .get("order")
            .and_then(Value::as_str)
            .is_some_and(|order| order.eq_ignore_ascii_case("ASC"));

        let orderby = match orderby {
            "date" => "post_date",
            "modified" => "post_modified",
            "title" => "post_title",
            "name" => "post_name",
            "parent" => "post_parent",
            "author" => "post_author",
            "type" => "post_type",
            "id" | "ID" => "ID",
            other => other,
        };
        if orderby != "none" {
            sort_rows(&mut posts, orderby, descending, "ID");
        }

        let found_posts = posts.len() as u64;
        let per_page = if vars.get("nopaging").is_some_and(|v| v == true) {
            -1
        } else {
            int_var(vars.get("posts_per_page")).unwrap_or(DEFAULT_PER_PAGE)
        };

        let (posts, max_num_pages) = if per_page < 0 {
            let offset = int_var(vars.get("offset")).unwrap_or(0).max(0) as usize;
            let pages = u64::from(found_posts > 0);
            (paginate(posts, offset, None), pages)
        } else {
            let paged = int_var(vars.get("paged")).unwrap_or(1).max(1);
            let offset = int_var(vars.get("offset"))
                .unwrap_or_else(|| paged.saturating_sub(1).saturating_mul(per_page))
                .max(0) as usize;
            let pages = if per_page == 0 {
                0
            } else {
                found_posts.div_ceil(per_page as u64)
            };
            (paginate(posts, offset, Some(per_page as usize)), pages)
        };

        let posts = match vars.get("fields").and_then(Value::as_str) {
            Some("ids") => posts
                .into_iter()
                .map(|post| Row::from([("ID".to_string(), column(&post, "ID").clone())]))
                .collect(),
            Some("id=>parent") => posts
                .into_iter()
                .map(|post| {
                    Row::from([
                        ("ID".to_string(), column(&post, "ID").clone()),
                        ("post_parent".to_string(), column(&post, "post_parent").clone()),
                    ])
                })
                .collect(),
            _ => posts,
        };

        Ok(PostQueryResult {
            posts,
            found_posts,
            max_num_pages,
        })
    }
}
