//! Tree Services
//!
//! This module contains the path-tree business logic:
//!
//! - `TreeEngine` - parent walks, path computation, descendant queries,
//!   cascades and leaf-first chain deletion, shared by both tree families
//! - `CategoryService` - category validation, saves and bulk chains
//! - `LocationService` - location defaults, formats and code trees
//!
//! Services sit on top of the storage traits in [`crate::db`]. They hold no
//! state between calls beyond their store handles and configuration.

pub mod category_service;
pub mod error;
pub mod location_service;
pub mod tree_engine;

pub use category_service::CategoryService;
pub use error::TreeError;
pub use location_service::{DeletedDefaultTree, LocationService};
pub use tree_engine::{assert_same_scope, join_labels, TreeEngine};

#[cfg(test)]
mod category_service_test;
