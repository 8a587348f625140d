//! Service Layer Error Types
//!
//! This module defines error types for tree operations. Every validation
//! error is raised before the first write of the operation that detects it;
//! storage errors are passed through unchanged.

use crate::db::StoreError;
use crate::models::Scope;
use crate::validation::FormatError;
use thiserror::Error;

/// Tree operation errors
#[derive(Error, Debug)]
pub enum TreeError {
    /// Separator, template or segment rejected by the format compiler
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Required field left blank
    #[error("Missing required field: {0}")]
    EmptyValue(String),

    /// Referenced record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A node would appear twice in its own ancestry
    #[error("'{label}' cannot be a child of itself (parents: '{parents}')")]
    SelfAncestry { label: String, parents: String },

    /// A root with this name/segment already exists in the scope
    #[error("A root '{label}' already exists in {scope}")]
    DuplicateRoot { label: String, scope: Scope },

    /// The parent already has a child with this name/segment
    #[error("'{label}' already exists under parent {parent_id}")]
    DuplicateSibling { label: String, parent_id: String },

    /// A location default with this name already exists in the scope
    #[error("Location default '{name}' already exists in {scope}")]
    DuplicateDefault { name: String, scope: Scope },

    /// A location code chain mixes two defaults
    #[error("All segments must be derived from the same location default, expected '{expected}', found '{found}'")]
    CrossDefaultMix { expected: String, found: String },

    /// A location code chain is longer than its default has formats
    #[error("There are more segments than defined formats, found: {found}, allowed: {allowed}")]
    DepthExceedsFormatCount { found: usize, allowed: usize },

    /// Operation addressed a record owned by another scope
    #[error("Record '{id}' belongs to {found}, not {expected}")]
    ForeignScope {
        id: String,
        expected: Scope,
        found: Scope,
    },

    /// Parent walk or cascade went past the configured depth
    #[error("Hierarchy at '{id}' is deeper than {max_depth} levels")]
    HierarchyTooDeep { id: String, max_depth: usize },

    /// Service configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Storage operation failed
    #[error("Storage operation failed: {0}")]
    Storage(#[from] StoreError),
}

impl TreeError {
    /// Create a not found error
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a self ancestry error
    pub fn self_ancestry(label: impl Into<String>, parents: impl Into<String>) -> Self {
        Self::SelfAncestry {
            label: label.into(),
            parents: parents.into(),
        }
    }

    /// Create a foreign scope error
    pub fn foreign_scope(id: impl Into<String>, expected: &Scope, found: &Scope) -> Self {
        Self::ForeignScope {
            id: id.into(),
            expected: expected.clone(),
            found: found.clone(),
        }
    }

    /// Create a hierarchy depth error
    pub fn hierarchy_too_deep(id: impl Into<String>, max_depth: usize) -> Self {
        Self::HierarchyTooDeep {
            id: id.into(),
            max_depth,
        }
    }
}
