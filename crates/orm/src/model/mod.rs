//! Model System - Modular model trait system for WordPress entities
//!
//! This module provides a decomposed model system with focused traits for
//! different aspects of model functionality:
//!
//! - `core_trait`: Core Model trait and per-instance state
//! - `lifecycle`: Construction, hydration and event publication
//! - `extensions`: Attribute access, identity and serialization
//! - `crud_operations`: Save, update and delete
//! - `query_methods`: Builder entry points
//! - `macros`: The `model!` declaration macro

pub mod core_trait;
pub mod crud_operations;
pub mod extensions;
pub(crate) mod lifecycle;
pub mod macros;
pub mod query_methods;

// Re-export main types and traits for convenience
pub use core_trait::{Model, ModelState};
pub use crud_operations::CrudOperations;
pub use extensions::ModelExtensions;
pub use query_methods::QueryMethods;

pub use crate::query::{Action, ActionOutput};

/// Composite trait that includes all model functionality
pub trait FullModel: Model + CrudOperations + QueryMethods + ModelExtensions {}

impl<T> FullModel for T where T: Model + CrudOperations + QueryMethods + ModelExtensions {}
