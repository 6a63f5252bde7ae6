//! Data store abstractions
//!
//! The traits in [`core`] are implemented by the host application; the
//! [`memory`] module provides in-process implementations of all of them.

pub mod core;
pub mod memory;

pub use self::core::*;
pub use memory::{MemoryConnection, MemoryMeta, MemoryPosts, MemoryTerms};
