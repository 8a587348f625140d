//! Location addressing records
//!
//! - `LocationDefault` - a named, project-owned collection of formats with
//!   the separator used by every code built from it
//! - `LocationFormat` - one character definition, applied at the tree level
//!   given by its `segment_order`
//! - `LocationCode` - a node of a location tree whose `segment` matches its
//!   format (`B01:C02:R03` for three formats)

use super::{PathTreeNode, Scope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default separator between location code segments
pub const DEFAULT_LOCATION_SEPARATOR: &str = ":";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDefault {
    pub id: String,
    /// Owning project
    pub scope: Scope,
    pub name: String,
    pub description: Option<String>,
    /// Whether other projects may clone these formats
    pub shared: bool,
    pub separator: String,
    pub creator: String,
    pub updater: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl LocationDefault {
    pub fn new(scope: Scope, name: impl Into<String>, separator: impl Into<String>, actor: &str) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            scope,
            name: name.into(),
            description: None,
            shared: true,
            separator: separator.into(),
            creator: actor.to_string(),
            updater: actor.to_string(),
            created: now,
            updated: now,
        }
    }

    pub fn touch(&mut self, actor: &str) {
        self.updater = actor.to_string();
        self.updated = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFormat {
    pub id: String,
    pub default_id: String,
    /// Character definition, e.g. `B\d\d`
    pub char_definition: String,
    /// Tree level this format governs, lowest first
    pub segment_order: u32,
    /// Derived from `char_definition` on save
    pub segment_length: usize,
    pub description: Option<String>,
    pub creator: String,
    pub updater: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl LocationFormat {
    pub fn new(
        default_id: impl Into<String>,
        char_definition: impl Into<String>,
        segment_order: u32,
        actor: &str,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            default_id: default_id.into(),
            char_definition: char_definition.into(),
            segment_order,
            segment_length: 0,
            description: None,
            creator: actor.to_string(),
            updater: actor.to_string(),
            created: now,
            updated: now,
        }
    }

    pub fn touch(&mut self, actor: &str) {
        self.updater = actor.to_string();
        self.updated = Utc::now();
    }
}

/// A segment of a location tree.
///
/// `scope` and `default_id` are copied from the format's default whenever
/// the code is validated, so store filters never need a join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCode {
    pub id: String,
    pub scope: Scope,
    pub default_id: String,
    pub format_id: String,
    pub parent_id: Option<String>,
    pub segment: String,
    pub path: String,
    pub level: u32,
    pub creator: String,
    pub updater: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl LocationCode {
    pub fn new(
        default: &LocationDefault,
        format: &LocationFormat,
        segment: impl Into<String>,
        parent_id: Option<String>,
        actor: &str,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            scope: default.scope.clone(),
            default_id: default.id.clone(),
            format_id: format.id.clone(),
            parent_id,
            segment: segment.into(),
            path: String::new(),
            level: 0,
            creator: actor.to_string(),
            updater: actor.to_string(),
            created: now,
            updated: now,
        }
    }
}

impl PathTreeNode for LocationCode {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn label(&self) -> &str {
        &self.segment
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

    fn group_id(&self) -> Option<&str> {
        Some(&self.format_id)
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
    fn test_location_default_defaults() {
        let default = LocationDefault::new(
            Scope::project("p1"),
            "Warehouse",
            DEFAULT_LOCATION_SEPARATOR,
            "u1",
        );

        assert!(default.shared);
        assert_eq!(default.separator, ":");
        assert!(default.description.is_none());
    }

    #[test]
    fn test_code_inherits_default_scope() {
        let default = LocationDefault::new(Scope::project("p1"), "Warehouse", ":", "u1");
        let format = LocationFormat::new(&default.id, r"B\d\d", 0, "u1");
        let code = LocationCode::new(&default, &format, "B01", None, "u1");

        assert_eq!(code.scope, Scope::project("p1"));
        assert_eq!(code.default_id, default.id);
        assert_eq!(code.group_id(), Some(format.id.as_str()));
        assert!(code.matches_filter(&TreeFilter::new().with_group_id(format.id.clone())));
        assert!(!code.matches_filter(&TreeFilter::new().with_group_id("other")));
    }
}
