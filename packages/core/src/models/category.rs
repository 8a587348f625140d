//! Category taxonomy node

use super::{PathTreeNode, Scope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named node in a user- or project-owned category tree.
///
/// `path` joins the names of every ancestor and this node with the category
/// separator (`Arts>Music>Local`); `level` is the number of ancestors.
/// Both are recomputed by the category service before every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub scope: Scope,
    pub parent_id: Option<String>,
    pub name: String,
    pub path: String,
    pub level: u32,
    pub creator: String,
    pub updater: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Category {
    /// Create an unsaved category; `path` and `level` are filled in on save
    pub fn new(scope: Scope, name: impl Into<String>, parent_id: Option<String>, actor: &str) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            scope,
            parent_id,
            name: name.into(),
            path: String::new(),
            level: 0,
            creator: actor.to_string(),
            updater: actor.to_string(),
            created: now,
            updated: now,
        }
    }
}

impl PathTreeNode for Category {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn stamp(&mut self, path: String, level: u32) {
        self.path = path;
        self.level = level;
    }

    fn touch(&mut self, actor: &str) {
        self.updater = actor.to_string();
        self.updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TreeFilter;

    #[test]
    fn test_new_category_is_unstamped_root() {
        let category = Category::new(Scope::user("u1"), "Arts", None, "u1");

        assert!(category.is_root());
        assert!(category.path.is_empty());
        assert_eq!(category.level, 0);
        assert_eq!(category.creator, "u1");
        assert_eq!(category.updater, "u1");
        assert!(Uuid::parse_str(&category.id).is_ok());
    }

    #[test]
    fn test_matches_filter() {
        let mut category = Category::new(
            Scope::user("u1"),
            "Music",
            Some("parent-1".to_string()),
            "u1",
        );
        category.stamp("Arts>Music".to_string(), 1);

        assert!(category.matches_filter(&TreeFilter::new()));
        assert!(category.matches_filter(
            &TreeFilter::new()
                .with_scope(Scope::user("u1"))
                .with_parent_id("parent-1")
                .with_label("Music")
                .with_level(1)
        ));
        assert!(!category.matches_filter(&TreeFilter::new().with_root()));
        assert!(!category.matches_filter(&TreeFilter::new().with_scope(Scope::user("u2"))));
        assert!(!category.matches_filter(&TreeFilter::new().with_level(0)));
        assert!(category.matches_filter(&TreeFilter::new().with_path("Arts>Music")));
    }

    #[test]
    fn test_touch_updates_audit_fields() {
        let mut category = Category::new(Scope::user("u1"), "Arts", None, "u1");
        let created = category.created;

        category.touch("u2");

        assert_eq!(category.creator, "u1");
        assert_eq!(category.updater, "u2");
        assert!(category.updated >= created);
    }
}
