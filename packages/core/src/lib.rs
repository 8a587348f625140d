//! Inventory Path-Tree Engine
//!
//! This crate keeps the two owner-scoped, materialized-path trees of the
//! inventory system consistent: the category taxonomy and the location code
//! addressing scheme.
//!
//! # Architecture
//!
//! - **Materialized paths**: every node caches its separator-joined path and
//!   level; both are recomputed on each save and cascaded into the subtree
//! - **Scoped trees**: nodes belong to a user or project scope; duplicates
//!   and bulk deletes never cross scopes
//! - **Format templates**: location segments are validated per level by
//!   compiled character definitions (`\d`, `\a`, `\p`, literals)
//! - **Storage boundary**: persistence is abstracted behind async traits
//!
//! # Modules
//!
//! - [`validation`] - Separator and character definition compiler
//! - [`models`] - Records (Category, LocationDefault, LocationFormat, LocationCode)
//! - [`db`] - Storage traits and the in-memory backend
//! - [`services`] - Tree engine, CategoryService, LocationService
//! - [`config`] - Separators and depth limits
//! - [`logging`] - Tracing subscriber setup

pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod services;
pub mod validation;

// Re-export commonly used types
pub use config::TreeConfig;
pub use models::*;
pub use services::*;
