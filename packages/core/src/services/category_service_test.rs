//! Tests for category tree validation, cascades and bulk chains

#[cfg(test)]
mod category_service_tests {
    use crate::config::TreeConfig;
    use crate::db::{MemoryTreeStore, TreeStore};
    use crate::models::{Category, Scope};
    use crate::services::{CategoryService, TreeError};
    use crate::validation::FormatError;
    use std::sync::Arc;

    fn create_test_service() -> (CategoryService, Arc<MemoryTreeStore<Category>>) {
        let store = Arc::new(MemoryTreeStore::<Category>::new());
        let service = CategoryService::new(store.clone(), &TreeConfig::default()).unwrap();
        (service, store)
    }

    #[tokio::test]
    async fn test_create_tree_stamps_paths_and_levels() {
        let (service, _store) = create_test_service();
        let scope = Scope::user("alice");

        let chain = service
            .create_tree(&["Arts", "Music", "Local"], &scope, "alice")
            .await
            .unwrap();

        let stamped: Vec<(&str, u32)> = chain.iter().map(|c| (c.path.as_str(), c.level)).collect();
        assert_eq!(
            stamped,
            vec![("Arts", 0), ("Arts>Music", 1), ("Arts>Music>Local", 2)]
        );
        assert_eq!(chain[1].parent_id.as_deref(), Some(chain[0].id.as_str()));
        assert_eq!(chain[2].creator, "alice");
    }

    #[tokio::test]
    async fn test_create_tree_is_idempotent() {
        let (service, store) = create_test_service();
        let scope = Scope::user("alice");

        let first = service
            .create_tree(&["Arts", "Music"], &scope, "alice")
            .await
            .unwrap();
        let second = service
            .create_tree(&["Arts", "Music"], &scope, "alice")
            .await
            .unwrap();

        let first_ids: Vec<&str> = first.iter().map(|c| c.id.as_str()).collect();
        let second_ids: Vec<&str> = second.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(first_ids, second_ids);
        assert_eq!(store.len().await, 2);

        // Extending an existing chain only adds the new tail.
        let extended = service
            .create_tree(&["Arts", "Music", "Jazz"], &scope, "alice")
            .await
            .unwrap();
        assert_eq!(extended[0].id, first[0].id);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_separator_in_name_rejected_before_write() {
        let (service, store) = create_test_service();
        let scope = Scope::user("alice");

        let result = service
            .create_tree(&["Arts", "Rock>Pop"], &scope, "alice")
            .await;

        assert!(matches!(
            result,
            Err(TreeError::Format(FormatError::SeparatorInValue { .. }))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (service, _store) = create_test_service();

        let result = service
            .save(Category::new(Scope::user("alice"), "  ", None, "alice"), "alice")
            .await;

        assert!(matches!(result, Err(TreeError::EmptyValue(_))));
    }

    #[tokio::test]
    async fn test_duplicate_root_on_rename() {
        let (service, _store) = create_test_service();
        let scope = Scope::user("alice");

        service
            .save(Category::new(scope.clone(), "Root", None, "alice"), "alice")
            .await
            .unwrap();
        let mut other = service
            .save(Category::new(scope.clone(), "Other", None, "alice"), "alice")
            .await
            .unwrap();

        other.name = "Root".to_string();
        let result = service.save(other, "alice").await;

        assert!(matches!(result, Err(TreeError::DuplicateRoot { .. })));
    }

    #[tokio::test]
    async fn test_same_root_name_in_other_scope_allowed() {
        let (service, _store) = create_test_service();

        service
            .save(Category::new(Scope::user("alice"), "Root", None, "alice"), "alice")
            .await
            .unwrap();
        let result = service
            .save(Category::new(Scope::project("p1"), "Root", None, "bob"), "bob")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_sibling_rejected() {
        let (service, _store) = create_test_service();
        let scope = Scope::user("alice");

        let chain = service
            .create_tree(&["Arts", "Music"], &scope, "alice")
            .await
            .unwrap();

        let result = service
            .save(
                Category::new(scope.clone(), "Music", Some(chain[0].id.clone()), "alice"),
                "alice",
            )
            .await;

        assert!(matches!(result, Err(TreeError::DuplicateSibling { .. })));
    }

    #[tokio::test]
    async fn test_resave_unchanged_category_is_allowed() {
        let (service, _store) = create_test_service();
        let scope = Scope::user("alice");

        let chain = service
            .create_tree(&["Arts", "Music"], &scope, "alice")
            .await
            .unwrap();

        let saved = service.save(chain[1].clone(), "bob").await.unwrap();
        assert_eq!(saved.path, "Arts>Music");
        assert_eq!(saved.updater, "bob");
        assert_eq!(saved.creator, "alice");
    }

    #[tokio::test]
    async fn test_ancestor_namesake_rejected() {
        let (service, store) = create_test_service();
        let scope = Scope::user("alice");

        let result = service
            .create_tree(&["A", "B", "A"], &scope, "alice")
            .await;

        assert!(matches!(result, Err(TreeError::SelfAncestry { .. })));
        // The plain variant keeps the prefix it already wrote.
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_create_tree_atomic_rolls_back_new_nodes() {
        let (service, store) = create_test_service();
        let scope = Scope::user("alice");

        let result = service
            .create_tree_atomic(&["A", "B", "A"], &scope, "alice")
            .await;

        assert!(matches!(result, Err(TreeError::SelfAncestry { .. })));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_tree_atomic_keeps_existing_prefix() {
        let (service, store) = create_test_service();
        let scope = Scope::user("alice");

        let existing = service
            .create_tree(&["A", "B"], &scope, "alice")
            .await
            .unwrap();

        let result = service
            .create_tree_atomic(&["A", "B", "C", "A"], &scope, "alice")
            .await;

        assert!(matches!(result, Err(TreeError::SelfAncestry { .. })));
        assert_eq!(store.len().await, 2);
        for category in &existing {
            assert!(store.get(&category.id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_rename_cascades_to_descendants() {
        let (service, store) = create_test_service();
        let scope = Scope::user("alice");

        let chain = service
            .create_tree(&["Arts", "Music", "Local"], &scope, "alice")
            .await
            .unwrap();

        let mut arts = chain[0].clone();
        arts.name = "Culture".to_string();
        service.save(arts, "alice").await.unwrap();

        let local = store.get(&chain[2].id).await.unwrap().unwrap();
        assert_eq!(local.path, "Culture>Music>Local");
        assert_eq!(local.level, 2);
        assert_eq!(
            service.compute_path(&local, true).await.unwrap(),
            local.path
        );
    }

    #[tokio::test]
    async fn test_reparent_moves_subtree() {
        let (service, store) = create_test_service();
        let scope = Scope::user("alice");

        let arts = service.create_tree(&["Arts", "Music", "Local"], &scope, "alice").await.unwrap();
        let media = service.create_tree(&["Media"], &scope, "alice").await.unwrap();

        let mut music = arts[1].clone();
        music.parent_id = Some(media[0].id.clone());
        let music = service.save(music, "alice").await.unwrap();
        assert_eq!(music.path, "Media>Music");

        let local = store.get(&arts[2].id).await.unwrap().unwrap();
        assert_eq!(local.path, "Media>Music>Local");
        assert!(service.get_children(&scope, &arts[0]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reparent_under_descendant_rejected() {
        let (service, store) = create_test_service();
        let scope = Scope::user("alice");

        let chain = service
            .create_tree(&["Arts", "Music"], &scope, "alice")
            .await
            .unwrap();

        let mut arts = chain[0].clone();
        arts.parent_id = Some(chain[1].id.clone());
        let result = service.save(arts, "alice").await;

        assert!(matches!(result, Err(TreeError::SelfAncestry { .. })));
        let stored = store.get(&chain[0].id).await.unwrap().unwrap();
        assert!(stored.parent_id.is_none());
    }

    #[tokio::test]
    async fn test_delete_tree_keeps_shared_prefix() {
        let (service, store) = create_test_service();
        let scope = Scope::user("alice");

        let abc = service.create_tree(&["A", "B", "C"], &scope, "alice").await.unwrap();
        service.create_tree(&["A", "D"], &scope, "alice").await.unwrap();

        let deleted = service.delete_tree(&abc, &scope).await.unwrap();

        assert_eq!(deleted, vec!["A>B>C".to_string(), "A>B".to_string()]);
        assert!(store.get(&abc[0].id).await.unwrap().is_some());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_foreign_scope_queries_rejected() {
        let (service, store) = create_test_service();
        let alice = Scope::user("alice");
        let mallory = Scope::user("mallory");

        let chain = service.create_tree(&["A", "B"], &alice, "alice").await.unwrap();

        assert!(matches!(
            service.get_parents(&mallory, &chain[1]).await,
            Err(TreeError::ForeignScope { .. })
        ));
        assert!(matches!(
            service.get_children(&mallory, &chain[0]).await,
            Err(TreeError::ForeignScope { .. })
        ));
        assert!(matches!(
            service.get_child_tree_from_list(&mallory, &chain, true).await,
            Err(TreeError::ForeignScope { .. })
        ));
        assert!(matches!(
            service.delete_tree(&chain, &mallory).await,
            Err(TreeError::ForeignScope { .. })
        ));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_path_queries() {
        let (service, _store) = create_test_service();
        let scope = Scope::user("alice");

        let chain = service
            .create_tree(&["Arts", "Music", "Local"], &scope, "alice")
            .await
            .unwrap();
        service.create_tree(&["Arts", "Film"], &scope, "alice").await.unwrap();

        assert_eq!(service.parents_path(&chain[2]).await.unwrap(), "Arts>Music");
        assert_eq!(service.parents_path(&chain[0]).await.unwrap(), "");

        let parents = service.get_parents(&scope, &chain[2]).await.unwrap();
        assert_eq!(parents.len(), 2);

        let with_root = service.get_children_and_root(&scope, &chain[0]).await.unwrap();
        let names: Vec<&str> = with_root.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Arts", "Film", "Music"]);

        let found = service
            .get_all_child_paths_for_category_list(
                &scope,
                &["Arts>Music>Local", "Arts>Film", "Arts>Missing", "Arts>Film"],
            )
            .await
            .unwrap();
        let paths: Vec<&str> = found.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["Arts>Music>Local", "Arts>Film"]);

        let trees = service.get_all_root_trees(&scope, "Local").await.unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].len(), 3);
    }

    #[tokio::test]
    async fn test_custom_separator() {
        let store = Arc::new(MemoryTreeStore::<Category>::new());
        let config = TreeConfig {
            category_separator: "::".to_string(),
            ..TreeConfig::default()
        };
        let service = CategoryService::new(store, &config).unwrap();
        let scope = Scope::user("alice");

        let chain = service
            .create_tree(&["A>1", "B"], &scope, "alice")
            .await
            .unwrap();
        assert_eq!(chain[1].path, "A>1::B");

        let result = service.create_tree(&["A::B"], &scope, "alice").await;
        assert!(matches!(
            result,
            Err(TreeError::Format(FormatError::SeparatorInValue { .. }))
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let store = Arc::new(MemoryTreeStore::<Category>::new());
        let config = TreeConfig {
            max_depth: 0,
            ..TreeConfig::default()
        };

        assert!(matches!(
            CategoryService::new(store, &config),
            Err(TreeError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_rename_onto_descendant_name_rejected() {
        let (service, store) = create_test_service();
        let scope = Scope::user("alice");

        let chain = service
            .create_tree(&["Arts", "Music"], &scope, "alice")
            .await
            .unwrap();

        let mut arts = chain[0].clone();
        arts.name = "Music".to_string();
        let result = service.save(arts, "alice").await;

        assert!(matches!(result, Err(TreeError::SelfAncestry { .. })));
        let leaf = store.get(&chain[1].id).await.unwrap().unwrap();
        assert_eq!(leaf.path, "Arts>Music");
        let root = store.get(&chain[0].id).await.unwrap().unwrap();
        assert_eq!(root.name, "Arts");
    }

    #[tokio::test]
    async fn test_reparent_below_descendant_namesake_rejected() {
        let (service, store) = create_test_service();
        let scope = Scope::user("alice");

        let jazz = service
            .create_tree(&["Jazz", "Live"], &scope, "alice")
            .await
            .unwrap();
        let live = service.create_tree(&["Live"], &scope, "alice").await.unwrap();

        let mut moved = jazz[0].clone();
        moved.parent_id = Some(live[0].id.clone());
        let result = service.save(moved, "alice").await;

        assert!(matches!(result, Err(TreeError::SelfAncestry { .. })));
        let stored = store.get(&jazz[1].id).await.unwrap().unwrap();
        assert_eq!(stored.path, "Jazz>Live");
    }
}
