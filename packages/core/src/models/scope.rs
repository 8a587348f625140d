//! Ownership scope
//!
//! Every tree belongs to exactly one owner: a user (categories) or a project
//! (location defaults and their codes). Two nodes are only ever compared for
//! duplicates inside the same scope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Owning identity that partitions one set of trees from another
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Scope {
    User(String),
    Project(String),
}

impl Scope {
    pub fn user(id: impl Into<String>) -> Self {
        Scope::User(id.into())
    }

    pub fn project(id: impl Into<String>) -> Self {
        Scope::Project(id.into())
    }

    /// The owner's identifier without its kind
    pub fn id(&self) -> &str {
        match self {
            Scope::User(id) | Scope::Project(id) => id,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::User(id) => write!(f, "user:{}", id),
            Scope::Project(id) => write!(f, "project:{}", id),
        }
    }
}
