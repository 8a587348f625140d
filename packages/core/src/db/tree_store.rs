//! TreeStore Trait - Storage Boundary
//!
//! The tree engine never talks to a database directly. It issues the four
//! operations of [`TreeStore`] (`find_one`, `find_many`, `save`, `delete`)
//! with a [`TreeFilter`], and the location service additionally reads and
//! writes defaults and formats through [`LocationCatalog`].
//!
//! # Transactions
//!
//! Bulk tree operations perform several reads and writes that must be seen
//! as a unit. The tree services do not open transactions themselves; a
//! backend used by concurrent callers must run each public service call
//! inside one transaction (or serialize calls per scope).
//!
//! # Examples
//!
//! ```rust
//! use inventory_core::db::{MemoryTreeStore, TreeStore};
//! use inventory_core::models::{Category, Scope, TreeFilter};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryTreeStore::<Category>::new();
//! let mut arts = Category::new(Scope::user("alice"), "Arts", None, "alice");
//! arts.path = "Arts".to_string();
//! store.save(arts).await?;
//!
//! let found = store
//!     .find_one(&TreeFilter::new().with_root().with_label("Arts"))
//!     .await?;
//! assert!(found.is_some());
//! # Ok(())
//! # }
//! ```

use crate::db::StoreError;
use crate::models::{LocationDefault, LocationFormat, PathTreeNode, Scope, TreeFilter};
use async_trait::async_trait;

/// Persistence operations for one tree family
///
/// Implementations must be `Send + Sync`; results of `find_many` are
/// ordered by `path`.
#[async_trait]
pub trait TreeStore<N: PathTreeNode>: Send + Sync {
    /// First node matching `filter`, or `None`
    async fn find_one(&self, filter: &TreeFilter) -> Result<Option<N>, StoreError>;

    /// Every node matching `filter`, ordered by path
    async fn find_many(&self, filter: &TreeFilter) -> Result<Vec<N>, StoreError>;

    /// Insert or replace a node by id and return the stored value
    async fn save(&self, node: N) -> Result<N, StoreError>;

    /// Remove a node
    ///
    /// # Errors
    ///
    /// `RecordNotFound` if the node is not stored.
    async fn delete(&self, node: &N) -> Result<(), StoreError>;

    /// Fetch a node by id
    async fn get(&self, id: &str) -> Result<Option<N>, StoreError> {
        self.find_one(&TreeFilter::new().with_id(id)).await
    }

    /// Number of direct children of the node `id`
    async fn count_children(&self, id: &str) -> Result<usize, StoreError> {
        Ok(self
            .find_many(&TreeFilter::new().with_parent_id(id))
            .await?
            .len())
    }
}

/// Persistence of location defaults and their formats
#[async_trait]
pub trait LocationCatalog: Send + Sync {
    async fn get_default(&self, id: &str) -> Result<Option<LocationDefault>, StoreError>;

    /// Default named `name` owned by `scope`
    async fn find_default(
        &self,
        scope: &Scope,
        name: &str,
    ) -> Result<Option<LocationDefault>, StoreError>;

    async fn save_default(&self, default: LocationDefault) -> Result<LocationDefault, StoreError>;

    async fn delete_default(&self, id: &str) -> Result<(), StoreError>;

    async fn get_format(&self, id: &str) -> Result<Option<LocationFormat>, StoreError>;

    /// Formats of a default ordered by `segment_order`
    async fn list_formats(&self, default_id: &str) -> Result<Vec<LocationFormat>, StoreError>;

    async fn save_format(&self, format: LocationFormat) -> Result<LocationFormat, StoreError>;

    async fn delete_format(&self, id: &str) -> Result<(), StoreError>;
}
