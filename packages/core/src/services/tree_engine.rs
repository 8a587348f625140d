//! Tree Consistency Engine
//!
//! Family-agnostic operations over [`PathTreeNode`]s stored behind a
//! [`TreeStore`]: parent-chain resolution, path computation, descendant
//! enumeration, cascading path/level recomputation and the leaf-first chain
//! delete used both for pruning and for rollback.
//!
//! Every walk is an explicit worklist bounded by `max_depth`, so a corrupt
//! parent cycle is reported as `HierarchyTooDeep` instead of looping.
//!
//! The engine performs no scope checks of its own except in
//! [`TreeEngine::delete_tree`]; the category and location services call
//! [`assert_same_scope`] before delegating here.

use crate::db::TreeStore;
use crate::models::{PathTreeNode, Scope, TreeFilter};
use crate::services::TreeError;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Reject `node` unless it is owned by `scope`
pub fn assert_same_scope<N: PathTreeNode>(node: &N, scope: &Scope) -> Result<(), TreeError> {
    if node.scope() != scope {
        return Err(TreeError::foreign_scope(node.id(), scope, node.scope()));
    }

    Ok(())
}

/// Join the labels of `nodes` with `separator`
pub fn join_labels<N: PathTreeNode>(nodes: &[N], separator: &str) -> String {
    nodes
        .iter()
        .map(|node| node.label())
        .collect::<Vec<_>>()
        .join(separator)
}

fn sort_by_path<N: PathTreeNode>(nodes: &mut [N]) {
    nodes.sort_by(|a, b| {
        a.path()
            .to_lowercase()
            .cmp(&b.path().to_lowercase())
            .then_with(|| a.id().cmp(b.id()))
    });
}

pub struct TreeEngine<N: PathTreeNode> {
    store: Arc<dyn TreeStore<N>>,
    max_depth: usize,
}

impl<N: PathTreeNode> Clone for TreeEngine<N> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            max_depth: self.max_depth,
        }
    }
}

impl<N: PathTreeNode> TreeEngine<N> {
    pub fn new(store: Arc<dyn TreeStore<N>>, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    pub fn store(&self) -> &Arc<dyn TreeStore<N>> {
        &self.store
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Ancestors of `node`, root first.
    ///
    /// `node` itself need not be stored; its `parent_id` is followed through
    /// the store.
    ///
    /// # Errors
    ///
    /// - `NotFound` if a parent link points at a missing node
    /// - `SelfAncestry` if the walk reaches `node` again (reparenting under
    ///   one of its own descendants)
    /// - `HierarchyTooDeep` past `max_depth` ancestors
    pub async fn get_parents(&self, node: &N) -> Result<Vec<N>, TreeError> {
        let mut parents: Vec<N> = Vec::new();
        let mut next = node.parent_id().map(str::to_string);

        while let Some(parent_id) = next {
            if parent_id == node.id() {
                parents.reverse();
                return Err(TreeError::self_ancestry(
                    node.label(),
                    parents
                        .iter()
                        .map(|p| p.label())
                        .collect::<Vec<_>>()
                        .join(", "),
                ));
            }

            if parents.len() >= self.max_depth {
                return Err(TreeError::hierarchy_too_deep(node.id(), self.max_depth));
            }

            let parent = self
                .store
                .get(&parent_id)
                .await?
                .ok_or_else(|| TreeError::not_found("Parent", parent_id.clone()))?;

            next = parent.parent_id().map(str::to_string);
            parents.push(parent);
        }

        parents.reverse();
        Ok(parents)
    }

    /// Separator-joined labels of the ancestors of `node`, optionally
    /// followed by `node` itself
    pub async fn compute_path(
        &self,
        node: &N,
        separator: &str,
        include_self: bool,
    ) -> Result<String, TreeError> {
        let mut chain = self.get_parents(node).await?;

        if include_self {
            chain.push(node.clone());
        }

        Ok(join_labels(&chain, separator))
    }

    /// Direct children of `node`, ordered by path
    pub async fn get_children(&self, node: &N) -> Result<Vec<N>, TreeError> {
        let mut children = self
            .store
            .find_many(&TreeFilter::new().with_parent_id(node.id()))
            .await?;
        sort_by_path(&mut children);
        Ok(children)
    }

    /// `node` followed by its direct children
    pub async fn get_children_and_root(&self, node: &N) -> Result<Vec<N>, TreeError> {
        let mut nodes = vec![node.clone()];
        nodes.extend(self.get_children(node).await?);
        Ok(nodes)
    }

    /// Every direct and transitive child of `node`, ordered by path
    pub async fn get_descendants(&self, node: &N) -> Result<Vec<N>, TreeError> {
        let mut descendants = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut pending: Vec<(String, usize)> = vec![(node.id().to_string(), 0)];

        while let Some((parent_id, depth)) = pending.pop() {
            if depth >= self.max_depth {
                return Err(TreeError::hierarchy_too_deep(parent_id, self.max_depth));
            }

            let children = self
                .store
                .find_many(&TreeFilter::new().with_parent_id(parent_id))
                .await?;

            for child in children {
                if child.id() == node.id() || !seen.insert(child.id().to_string()) {
                    continue;
                }

                pending.push((child.id().to_string(), depth + 1));
                descendants.push(child);
            }
        }

        sort_by_path(&mut descendants);
        Ok(descendants)
    }

    /// One entry per input node: the node (when `with_root`) plus all of its
    /// descendants, ordered by path.
    ///
    /// Entries with identical member sets are returned once; entries that
    /// merely overlap are kept apart.
    pub async fn get_child_tree_from_list(
        &self,
        nodes: &[N],
        with_root: bool,
    ) -> Result<Vec<Vec<N>>, TreeError> {
        let mut trees: Vec<Vec<N>> = Vec::new();
        let mut seen: HashSet<BTreeSet<String>> = HashSet::new();

        for node in nodes {
            let mut members = self.get_descendants(node).await?;

            if with_root {
                members.push(node.clone());
                sort_by_path(&mut members);
            }

            let key: BTreeSet<String> = members.iter().map(|m| m.id().to_string()).collect();

            if seen.insert(key) {
                trees.push(members);
            }
        }

        Ok(trees)
    }

    /// For every node labelled `label` in `scope`, its chain from the root
    /// down to and including the node
    pub async fn get_all_root_trees(&self, label: &str, scope: &Scope) -> Result<Vec<Vec<N>>, TreeError> {
        let matches = self
            .store
            .find_many(&TreeFilter::new().with_scope(scope.clone()).with_label(label))
            .await?;
        let mut trees = Vec::with_capacity(matches.len());

        for node in matches {
            let mut chain = self.get_parents(&node).await?;
            chain.push(node);
            trees.push(chain);
        }

        Ok(trees)
    }

    /// Check the stored subtree of `node` against the position `node` is
    /// about to take below `ancestors` (root first), before anything is
    /// written.
    ///
    /// `node` carries its new label; its children are looked up by id. Fails
    /// with `SelfAncestry` if a descendant's label repeats a label on its new
    /// chain. Returns the number of levels below `node` (0 for a leaf).
    pub async fn check_subtree(&self, node: &N, ancestors: &[N]) -> Result<usize, TreeError> {
        let mut root_chain: Vec<String> = ancestors.iter().map(|a| a.label().to_string()).collect();
        root_chain.push(node.label().to_string());

        let mut deepest = 0;
        let mut pending: Vec<(String, Vec<String>, usize)> =
            vec![(node.id().to_string(), root_chain, 0)];

        while let Some((parent_id, chain, depth)) = pending.pop() {
            let children = self
                .store
                .find_many(&TreeFilter::new().with_parent_id(parent_id.clone()))
                .await?;

            for child in children {
                if child.id() == node.id() {
                    continue;
                }

                if ancestors.len() + depth + 1 > self.max_depth {
                    return Err(TreeError::hierarchy_too_deep(parent_id, self.max_depth));
                }

                if chain.iter().any(|label| label == child.label()) {
                    return Err(TreeError::self_ancestry(child.label(), chain.join(", ")));
                }

                let mut child_chain = chain.clone();
                child_chain.push(child.label().to_string());
                deepest = deepest.max(depth + 1);
                pending.push((child.id().to_string(), child_chain, depth + 1));
            }
        }

        Ok(deepest)
    }

    /// Re-stamp and re-save every descendant of the already saved `node`.
    ///
    /// Children are visited depth first; each one is saved even when its own
    /// label did not change, because its cached path embeds its ancestors.
    /// Descendants are not re-validated here; services run
    /// [`TreeEngine::check_subtree`] before saving `node`.
    /// Returns the re-saved descendants in visit order.
    pub async fn cascade_after_save(&self, node: &N, separator: &str) -> Result<Vec<N>, TreeError> {
        let mut updated = Vec::new();
        let mut pending: Vec<(String, String, u32)> =
            vec![(node.id().to_string(), node.path().to_string(), node.level())];

        while let Some((parent_id, parent_path, parent_level)) = pending.pop() {
            let level = parent_level + 1;

            if level as usize > self.max_depth {
                return Err(TreeError::hierarchy_too_deep(parent_id, self.max_depth));
            }

            let children = self
                .store
                .find_many(&TreeFilter::new().with_parent_id(parent_id))
                .await?;

            for mut child in children {
                let path = format!("{}{}{}", parent_path, separator, child.label());
                child.stamp(path, level);

                let child = self.store.save(child).await?;
                tracing::debug!("Re-stamped '{}' at level {}", child.path(), level);

                pending.push((child.id().to_string(), child.path().to_string(), level));
                updated.push(child);
            }
        }

        Ok(updated)
    }

    /// Delete a chain (root first, as built by a `create_tree`) from the leaf
    /// backward, stopping at the first node that still has children.
    ///
    /// Every node must belong to `scope`; otherwise nothing is deleted.
    /// Returns the deleted paths in deletion order.
    pub async fn delete_tree(&self, chain: &[N], scope: &Scope) -> Result<Vec<String>, TreeError> {
        for node in chain {
            if let Err(e) = assert_same_scope(node, scope) {
                tracing::warn!("Refusing to delete tree: {}", e);
                return Err(e);
            }
        }

        let mut deleted = Vec::new();

        for node in chain.iter().rev() {
            let current = match self.store.get(node.id()).await? {
                Some(current) => current,
                None => {
                    tracing::debug!("Node {} already gone, skipping", node.id());
                    continue;
                }
            };

            if self.store.count_children(current.id()).await? > 0 {
                tracing::debug!("Stopping at shared node '{}'", current.path());
                break;
            }

            self.store.delete(&current).await?;
            deleted.push(current.path().to_string());
        }

        tracing::info!("Deleted {} node(s) from {}", deleted.len(), scope);
        Ok(deleted)
    }
}
