//! In-memory storage backend
//!
//! Reference implementation of [`TreeStore`] and [`LocationCatalog`] backed
//! by `tokio::sync::RwLock`-guarded maps. Used by the test suites and by
//! callers that keep trees in process.

use crate::db::{LocationCatalog, StoreError, TreeStore};
use crate::models::{LocationDefault, LocationFormat, PathTreeNode, Scope, TreeFilter};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Tree nodes keyed by id
pub struct MemoryTreeStore<N: PathTreeNode> {
    nodes: RwLock<HashMap<String, N>>,
}

impl<N: PathTreeNode> MemoryTreeStore<N> {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored nodes
    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }
}

impl<N: PathTreeNode> Default for MemoryTreeStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<N: PathTreeNode> TreeStore<N> for MemoryTreeStore<N> {
    async fn find_one(&self, filter: &TreeFilter) -> Result<Option<N>, StoreError> {
        Ok(self.find_many(filter).await?.into_iter().next())
    }

    async fn find_many(&self, filter: &TreeFilter) -> Result<Vec<N>, StoreError> {
        let nodes = self.nodes.read().await;
        let mut found: Vec<N> = nodes
            .values()
            .filter(|node| node.matches_filter(filter))
            .cloned()
            .collect();

        found.sort_by(|a, b| a.path().cmp(b.path()).then_with(|| a.id().cmp(b.id())));
        Ok(found)
    }

    async fn save(&self, node: N) -> Result<N, StoreError> {
        self.nodes
            .write()
            .await
            .insert(node.id().to_string(), node.clone());
        Ok(node)
    }

    async fn delete(&self, node: &N) -> Result<(), StoreError> {
        self.nodes
            .write()
            .await
            .remove(node.id())
            .map(|_| ())
            .ok_or_else(|| StoreError::record_not_found(node.id()))
    }
}

/// Location defaults and formats keyed by id
#[derive(Default)]
pub struct MemoryLocationCatalog {
    defaults: RwLock<HashMap<String, LocationDefault>>,
    formats: RwLock<HashMap<String, LocationFormat>>,
}

impl MemoryLocationCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocationCatalog for MemoryLocationCatalog {
    async fn get_default(&self, id: &str) -> Result<Option<LocationDefault>, StoreError> {
        Ok(self.defaults.read().await.get(id).cloned())
    }

    async fn find_default(
        &self,
        scope: &Scope,
        name: &str,
    ) -> Result<Option<LocationDefault>, StoreError> {
        Ok(self
            .defaults
            .read()
            .await
            .values()
            .find(|default| &default.scope == scope && default.name == name)
            .cloned())
    }

    async fn save_default(&self, default: LocationDefault) -> Result<LocationDefault, StoreError> {
        let mut defaults = self.defaults.write().await;

        let clash = defaults.values().any(|existing| {
            existing.id != default.id
                && existing.scope == default.scope
                && existing.name == default.name
        });

        if clash {
            return Err(StoreError::constraint_violation(format!(
                "location default '{}' already exists in {}",
                default.name, default.scope
            )));
        }

        defaults.insert(default.id.clone(), default.clone());
        Ok(default)
    }

    async fn delete_default(&self, id: &str) -> Result<(), StoreError> {
        self.defaults
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::record_not_found(id))
    }

    async fn get_format(&self, id: &str) -> Result<Option<LocationFormat>, StoreError> {
        Ok(self.formats.read().await.get(id).cloned())
    }

    async fn list_formats(&self, default_id: &str) -> Result<Vec<LocationFormat>, StoreError> {
        let formats = self.formats.read().await;
        let mut found: Vec<LocationFormat> = formats
            .values()
            .filter(|format| format.default_id == default_id)
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            a.segment_order
                .cmp(&b.segment_order)
                .then_with(|| a.created.cmp(&b.created))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(found)
    }

    async fn save_format(&self, format: LocationFormat) -> Result<LocationFormat, StoreError> {
        self.formats
            .write()
            .await
            .insert(format.id.clone(), format.clone());
        Ok(format)
    }

    async fn delete_format(&self, id: &str) -> Result<(), StoreError> {
        self.formats
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::record_not_found(id))
    }
}
