//! Category Service
//!
//! Validation, persistence and bulk operations for category trees. Every
//! save recomputes the node's path and level and then cascades the new
//! paths into the node's subtree.

use crate::config::TreeConfig;
use crate::db::TreeStore;
use crate::models::{Category, PathTreeNode, Scope, TreeFilter};
use crate::services::tree_engine::{assert_same_scope, join_labels, TreeEngine};
use crate::services::TreeError;
use crate::validation::{check_separator_free, compile_separator};
use std::sync::Arc;

/// Category tree operations for one store
///
/// # Examples
///
/// ```rust
/// # use inventory_core::config::TreeConfig;
/// # use inventory_core::db::MemoryTreeStore;
/// # use inventory_core::models::{Category, Scope};
/// # use inventory_core::services::CategoryService;
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryTreeStore::<Category>::new());
/// let service = CategoryService::new(store, &TreeConfig::default())?;
/// let scope = Scope::user("alice");
///
/// let chain = service
///     .create_tree(&["Arts", "Music", "Local"], &scope, "alice")
///     .await?;
/// assert_eq!(chain[2].path, "Arts>Music>Local");
/// assert_eq!(chain[2].level, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CategoryService {
    engine: TreeEngine<Category>,
    separator: String,
}

impl CategoryService {
    pub fn new(store: Arc<dyn TreeStore<Category>>, config: &TreeConfig) -> Result<Self, TreeError> {
        config.validate().map_err(TreeError::InvalidConfig)?;

        Ok(Self {
            engine: TreeEngine::new(store, config.max_depth),
            separator: compile_separator(&config.category_separator)?,
        })
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn engine(&self) -> &TreeEngine<Category> {
        &self.engine
    }

    /// Check `category` against the tree rules and stamp its path and level.
    ///
    /// # Errors
    ///
    /// - `EmptyValue` for a blank name
    /// - `Format(SeparatorInValue)` if the name contains the separator
    /// - `NotFound` / `ForeignScope` for a missing or foreign parent
    /// - `SelfAncestry` if an ancestor has the same name, the node would
    ///   become its own ancestor, or a descendant would end up below a
    ///   namesake
    /// - `DuplicateRoot` / `DuplicateSibling` on a name clash in the scope
    pub async fn validate_and_stamp(&self, category: &mut Category) -> Result<(), TreeError> {
        if category.name.trim().is_empty() {
            return Err(TreeError::EmptyValue("name".to_string()));
        }

        check_separator_free(&category.name, &self.separator)?;

        let parents = self.engine.get_parents(category).await?;

        for parent in &parents {
            assert_same_scope(parent, &category.scope)?;
        }

        if parents.iter().any(|parent| parent.name == category.name) {
            return Err(TreeError::self_ancestry(
                &category.name,
                join_labels(&parents, &self.separator),
            ));
        }

        self.engine.check_subtree(category, &parents).await?;

        let namesakes = self
            .engine
            .store()
            .find_many(
                &TreeFilter::new()
                    .with_scope(category.scope.clone())
                    .with_parent(category.parent_id.as_deref())
                    .with_label(category.name.clone()),
            )
            .await?;

        if namesakes.iter().any(|other| other.id != category.id) {
            return Err(match &category.parent_id {
                None => TreeError::DuplicateRoot {
                    label: category.name.clone(),
                    scope: category.scope.clone(),
                },
                Some(parent_id) => TreeError::DuplicateSibling {
                    label: category.name.clone(),
                    parent_id: parent_id.clone(),
                },
            });
        }

        let level = parents.len() as u32;
        let mut chain = parents;
        chain.push(category.clone());
        category.stamp(join_labels(&chain, &self.separator), level);

        Ok(())
    }

    /// Validate, persist and cascade a category (create, rename or reparent)
    pub async fn save(&self, category: Category, actor: &str) -> Result<Category, TreeError> {
        let mut category = category;
        self.validate_and_stamp(&mut category).await?;
        category.touch(actor);

        let saved = self.engine.store().save(category).await?;
        let cascaded = self.engine.cascade_after_save(&saved, &self.separator).await?;

        tracing::debug!(
            "Saved category '{}' ({} descendant(s) re-stamped)",
            saved.path,
            cascaded.len()
        );
        Ok(saved)
    }

    /// Get or create every category of `names`, each the child of the one
    /// before it. Returns the whole chain, root first.
    ///
    /// Names are checked for the separator before anything is written. A
    /// later failure leaves the already created prefix in place; pass the
    /// chain to [`CategoryService::delete_tree`] or use
    /// [`CategoryService::create_tree_atomic`] to undo it.
    pub async fn create_tree<S: AsRef<str> + Sync>(
        &self,
        names: &[S],
        scope: &Scope,
        actor: &str,
    ) -> Result<Vec<Category>, TreeError> {
        let mut created = Vec::new();
        self.build_chain(names, scope, actor, &mut created).await
    }

    /// Like [`CategoryService::create_tree`], but on failure deletes the
    /// categories this call created before returning the error
    pub async fn create_tree_atomic<S: AsRef<str> + Sync>(
        &self,
        names: &[S],
        scope: &Scope,
        actor: &str,
    ) -> Result<Vec<Category>, TreeError> {
        let mut created = Vec::new();

        match self.build_chain(names, scope, actor, &mut created).await {
            Ok(chain) => Ok(chain),
            Err(e) => {
                tracing::warn!(
                    "Category chain failed ({}), rolling back {} new node(s)",
                    e,
                    created.len()
                );
                self.engine.delete_tree(&created, scope).await?;
                Err(e)
            }
        }
    }

    async fn build_chain<S: AsRef<str> + Sync>(
        &self,
        names: &[S],
        scope: &Scope,
        actor: &str,
        created: &mut Vec<Category>,
    ) -> Result<Vec<Category>, TreeError> {
        for name in names {
            check_separator_free(name.as_ref(), &self.separator)?;
        }

        let mut chain: Vec<Category> = Vec::with_capacity(names.len());

        for (level, name) in names.iter().enumerate() {
            let name = name.as_ref();
            let parent_id = chain.last().map(|parent| parent.id.clone());
            let filter = TreeFilter::new()
                .with_scope(scope.clone())
                .with_parent(parent_id.as_deref())
                .with_label(name)
                .with_level(level as u32);

            let node = match self.engine.store().find_one(&filter).await? {
                Some(existing) => existing,
                None => {
                    let node = self
                        .save(Category::new(scope.clone(), name, parent_id, actor), actor)
                        .await?;
                    created.push(node.clone());
                    node
                }
            };

            chain.push(node);
        }

        tracing::info!(
            "Category chain '{}' ready in {} ({} new)",
            chain.last().map(|c| c.path.as_str()).unwrap_or_default(),
            scope,
            created.len()
        );
        Ok(chain)
    }

    /// Delete the chain returned by `create_tree` from the leaf backward,
    /// stopping at the first category that still has children
    pub async fn delete_tree(&self, chain: &[Category], scope: &Scope) -> Result<Vec<String>, TreeError> {
        self.engine.delete_tree(chain, scope).await
    }

    /// Ancestors of `category`, root first
    pub async fn get_parents(&self, scope: &Scope, category: &Category) -> Result<Vec<Category>, TreeError> {
        assert_same_scope(category, scope)?;
        self.engine.get_parents(category).await
    }

    pub async fn compute_path(&self, category: &Category, include_self: bool) -> Result<String, TreeError> {
        self.engine
            .compute_path(category, &self.separator, include_self)
            .await
    }

    /// Path of the parents only, e.g. `Arts>Music` for `Arts>Music>Local`
    pub async fn parents_path(&self, category: &Category) -> Result<String, TreeError> {
        self.compute_path(category, false).await
    }

    pub async fn get_children(&self, scope: &Scope, category: &Category) -> Result<Vec<Category>, TreeError> {
        assert_same_scope(category, scope)?;
        self.engine.get_children(category).await
    }

    pub async fn get_children_and_root(
        &self,
        scope: &Scope,
        category: &Category,
    ) -> Result<Vec<Category>, TreeError> {
        assert_same_scope(category, scope)?;
        self.engine.get_children_and_root(category).await
    }

    pub async fn get_child_tree_from_list(
        &self,
        scope: &Scope,
        categories: &[Category],
        with_root: bool,
    ) -> Result<Vec<Vec<Category>>, TreeError> {
        for category in categories {
            assert_same_scope(category, scope)?;
        }

        self.engine
            .get_child_tree_from_list(categories, with_root)
            .await
    }

    /// Chains (root first, match last) of every category named `name`
    pub async fn get_all_root_trees(&self, scope: &Scope, name: &str) -> Result<Vec<Vec<Category>>, TreeError> {
        self.engine.get_all_root_trees(name, scope).await
    }

    /// Categories of `scope` whose full path is one of `paths`, in input order
    pub async fn get_all_child_paths_for_category_list<S: AsRef<str> + Sync>(
        &self,
        scope: &Scope,
        paths: &[S],
    ) -> Result<Vec<Category>, TreeError> {
        let mut result: Vec<Category> = Vec::new();

        for path in paths {
            let found = self
                .engine
                .store()
                .find_many(
                    &TreeFilter::new()
                        .with_scope(scope.clone())
                        .with_path(path.as_ref()),
                )
                .await?;

            for category in found {
                if !result.iter().any(|c| c.id == category.id) {
                    result.push(category);
                }
            }
        }

        Ok(result)
    }
}
