//! Storage Layer
//!
//! This module defines the storage boundary consumed by the tree services:
//!
//! - `TreeStore<N>` - find / save / delete for one tree family
//! - `LocationCatalog` - location defaults and formats
//! - `MemoryTreeStore` / `MemoryLocationCatalog` - in-process backend
//!
//! Real databases implement the two traits; the services never issue
//! queries of their own.

mod error;
mod memory_store;
mod tree_store;

pub use error::StoreError;
pub use memory_store::{MemoryLocationCatalog, MemoryTreeStore};
pub use tree_store::{LocationCatalog, TreeStore};
