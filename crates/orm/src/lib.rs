//! # wp-orm: Models for WordPress data
//!
//! Active-record style models for posts, taxonomy terms and plain tables.
//! Attributes are dirty-tracked against the last persisted snapshot, saves
//! and deletes publish cancellable lifecycle events, and one fluent
//! [`Builder`] drives three query backends: the SQL builder, post searches
//! and term searches.
//!
//! Every model is bound to a [`Context`] holding the configuration and the
//! data stores. [`Context::in_memory`] wires in-process stores, which is
//! what the test suite runs against.

pub mod attributes;
pub mod backends;
pub mod collection;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod metadata;
pub mod model;
pub mod observers;
pub mod query;
pub mod registry;
pub mod sql;
pub mod value;

// Re-export core traits and types
pub use attributes::AttributeStore;
pub use collection::Collection;
pub use config::{ConfigError, ModelConfig};
pub use context::Context;
pub use error::{BackendError, ModelError, ModelResult, QueryError};
pub use events::{Dispatcher, EventContext, EventSink, ModelEvent, NullSink, Outcome};
pub use metadata::Metadata;
pub use model::{CrudOperations, FullModel, Model, ModelExtensions, ModelState, QueryMethods};
pub use observers::{ModelObserver, ObserverRegistry};
pub use query::{Builder, DbQuery, PostQuery, Query, QueryVars, TermQuery};
pub use registry::{booted_models, clear_booted_models, is_booted};
pub use value::Row;

/// Everything needed to define and use models
pub mod prelude {
    pub use crate::model;
    pub use crate::{
        Builder, Collection, Context, CrudOperations, Metadata, Model, ModelConfig, ModelError,
        ModelEvent, ModelExtensions, ModelResult, Outcome, QueryMethods, QueryVars, Row,
    };
}
