//! Path Tree Node
//!
//! Shape shared by both materialized-path tree families (categories and
//! location codes). The consistency engine only sees nodes through
//! [`PathTreeNode`], and the storage boundary only filters them through
//! [`TreeFilter`].

use super::Scope;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A record that lives in an owner-scoped, separator-delimited tree
///
/// `path` and `level` are caches; only the tree engine writes them through
/// [`PathTreeNode::stamp`].
pub trait PathTreeNode: Clone + fmt::Debug + Send + Sync + 'static {
    fn id(&self) -> &str;

    fn parent_id(&self) -> Option<&str>;

    /// Name (category) or segment (location code)
    fn label(&self) -> &str;

    fn scope(&self) -> &Scope;

    fn path(&self) -> &str;

    fn level(&self) -> u32;

    /// Secondary partition inside a scope (the format of a location code)
    fn group_id(&self) -> Option<&str> {
        None
    }

    /// Store freshly computed `path` and `level`
    fn stamp(&mut self, path: String, level: u32);

    /// Record `actor` as the last updater
    fn touch(&mut self, actor: &str);

    fn is_root(&self) -> bool {
        self.parent_id().is_none()
    }

    /// Whether this node satisfies every criterion set on `filter`
    fn matches_filter(&self, filter: &TreeFilter) -> bool {
        if let Some(id) = &filter.id {
            if self.id() != id {
                return false;
            }
        }

        if let Some(scope) = &filter.scope {
            if self.scope() != scope {
                return false;
            }
        }

        match &filter.parent {
            ParentFilter::Any => {}
            ParentFilter::Root => {
                if !self.is_root() {
                    return false;
                }
            }
            ParentFilter::Id(parent_id) => {
                if self.parent_id() != Some(parent_id.as_str()) {
                    return false;
                }
            }
        }

        if let Some(label) = &filter.label {
            if self.label() != label {
                return false;
            }
        }

        if let Some(level) = filter.level {
            if self.level() != level {
                return false;
            }
        }

        if let Some(path) = &filter.path {
            if self.path() != path {
                return false;
            }
        }

        if let Some(group_id) = &filter.group_id {
            if self.group_id() != Some(group_id.as_str()) {
                return false;
            }
        }

        true
    }
}

/// Parent criterion of a [`TreeFilter`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParentFilter {
    #[default]
    Any,
    /// Only nodes without a parent
    Root,
    /// Only direct children of the given node
    Id(String),
}

impl ParentFilter {
    /// `Root` for `None`, `Id` otherwise
    pub fn from_option(parent_id: Option<&str>) -> Self {
        match parent_id {
            Some(id) => ParentFilter::Id(id.to_string()),
            None => ParentFilter::Root,
        }
    }
}

/// Field filter understood by every [`crate::db::TreeStore`]
///
/// Unset fields match everything.
///
/// # Examples
///
/// ```rust
/// # use inventory_core::models::{Scope, TreeFilter};
/// let filter = TreeFilter::new()
///     .with_scope(Scope::user("alice"))
///     .with_root()
///     .with_label("Arts");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    #[serde(default)]
    pub parent: ParentFilter,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl TreeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_parent(mut self, parent_id: Option<&str>) -> Self {
        self.parent = ParentFilter::from_option(parent_id);
        self
    }

    pub fn with_parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent = ParentFilter::Id(parent_id.into());
        self
    }

    pub fn with_root(mut self) -> Self {
        self.parent = ParentFilter::Root;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }
}
