//! Shared handles every model is bound to

use std::fmt;
use std::sync::Arc;

use crate::backends::{
    Connection, MemoryConnection, MemoryMeta, MemoryPosts, MemoryTerms, MetaStore, PostStore, TermStore,
};
use crate::config::ModelConfig;
use crate::error::ModelResult;
use crate::events::{hook_name, EventSink, NullSink};
use crate::sql::QueryBuilder;

/// Configuration plus the data stores and event sink models talk to.
///
/// Cloning is cheap; every model instance carries its own clone.
#[derive(Clone)]
pub struct Context {
    config: Arc<ModelConfig>,
    connection: Arc<dyn Connection>,
    posts: Arc<dyn PostStore>,
    terms: Arc<dyn TermStore>,
    meta: Arc<dyn MetaStore>,
    events: Arc<dyn EventSink>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(
        config: ModelConfig,
        connection: Arc<dyn Connection>,
        posts: Arc<dyn PostStore>,
        terms: Arc<dyn TermStore>,
        meta: Arc<dyn MetaStore>,
        events: Arc<dyn EventSink>,
    ) -> ModelResult<Self> {
        config.validate()?;

        Ok(Self {
            config: Arc::new(config),
            connection,
            posts,
            terms,
            meta,
            events,
        })
    }

    /// A context backed by fresh in-memory stores and no event listeners
    pub fn in_memory() -> Self {
        Self::memory_stores(ModelConfig::default())
    }

    /// In-memory stores honouring `config`, once it validates
    pub fn in_memory_with(config: ModelConfig) -> ModelResult<Self> {
        config.validate()?;
        Ok(Self::memory_stores(config))
    }

    fn memory_stores(config: ModelConfig) -> Self {
        let posts = MemoryPosts::new().with_trash(config.trash_enabled());

        Self {
            config: Arc::new(config),
            connection: Arc::new(MemoryConnection::new()),
            posts: Arc::new(posts),
            terms: Arc::new(MemoryTerms::new()),
            meta: Arc::new(MemoryMeta::new()),
            events: Arc::new(NullSink),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_connection(mut self, connection: Arc<dyn Connection>) -> Self {
        self.connection = connection;
        self
    }

    pub fn with_posts(mut self, posts: Arc<dyn PostStore>) -> Self {
        self.posts = posts;
        self
    }

    pub fn with_terms(mut self, terms: Arc<dyn TermStore>) -> Self {
        self.terms = terms;
        self
    }

    pub fn with_meta(mut self, meta: Arc<dyn MetaStore>) -> Self {
        self.meta = meta;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn posts(&self) -> &Arc<dyn PostStore> {
        &self.posts
    }

    pub fn terms(&self) -> &Arc<dyn TermStore> {
        &self.terms
    }

    pub fn meta(&self) -> &Arc<dyn MetaStore> {
        &self.meta
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    /// SQL builder for `table`, with the configured prefix
    pub fn table(&self, table: &str) -> QueryBuilder {
        QueryBuilder::table(&self.config.table_prefix, table)
    }

    /// Full hook name of `event` for `object_type`
    pub fn hook(&self, object_type: &str, event: &str) -> String {
        hook_name(&self.config.hook_prefix, object_type, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_defaults() {
        let ctx = Context::in_memory();
        assert_eq!(ctx.config().hook_prefix, "wp");
        assert_eq!(ctx.hook("post", "saving"), "wp/post/saving");
        assert_eq!(ctx.table("posts").table_name().as_deref(), Some("wp_posts"));
    }

    #[test]
    fn test_in_memory_with_validates_config() {
        let config = ModelConfig {
            per_page: 0,
            ..ModelConfig::default()
        };
        assert!(Context::in_memory_with(config).is_err());

        let config = ModelConfig {
            per_page: 5,
            ..ModelConfig::default()
        };
        let ctx = Context::in_memory_with(config).unwrap();
        assert_eq!(ctx.config().per_page, 5);
    }

    #[test]
    fn test_new_validates_config() {
        let ctx = Context::in_memory();
        let config = ModelConfig {
            per_page: 0,
            ..ModelConfig::default()
        };

        let result = Context::new(
            config,
            ctx.connection().clone(),
            ctx.posts().clone(),
            ctx.terms().clone(),
            ctx.meta().clone(),
            ctx.events().clone(),
        );
        assert!(result.is_err());
    }
}
