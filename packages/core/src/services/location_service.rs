//! Location Service
//!
//! Location defaults, their formats, and the location code trees built from
//! them. A code at tree level *n* is normally governed by the format with the
//! *n*-th lowest `segment_order`; every segment is checked against its
//! format's compiled character definition before it is saved.

use crate::config::TreeConfig;
use crate::db::{LocationCatalog, TreeStore};
use crate::models::{
    LocationCode, LocationDefault, LocationFormat, PathTreeNode, Scope, TreeFilter,
};
use crate::services::tree_engine::{assert_same_scope, join_labels, TreeEngine};
use crate::services::TreeError;
use crate::validation::{check_separator_free, compile_template, validate_segment, FormatValidator};
use std::sync::Arc;

/// Paths removed by [`LocationService::delete_default_tree`], per format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedDefaultTree {
    pub name: String,
    /// `(char_definition, deleted code paths)` in segment order
    pub formats: Vec<(String, Vec<String>)>,
}

#[derive(Clone)]
pub struct LocationService {
    engine: TreeEngine<LocationCode>,
    catalog: Arc<dyn LocationCatalog>,
    default_separator: String,
}

impl LocationService {
    pub fn new(
        store: Arc<dyn TreeStore<LocationCode>>,
        catalog: Arc<dyn LocationCatalog>,
        config: &TreeConfig,
    ) -> Result<Self, TreeError> {
        config.validate().map_err(TreeError::InvalidConfig)?;

        Ok(Self {
            engine: TreeEngine::new(store, config.max_depth),
            catalog,
            default_separator: config.location_separator.clone(),
        })
    }

    pub fn engine(&self) -> &TreeEngine<LocationCode> {
        &self.engine
    }

    pub fn catalog(&self) -> &Arc<dyn LocationCatalog> {
        &self.catalog
    }

    //
    // DEFAULTS
    //

    /// Create a location default; `separator` falls back to the configured one
    pub async fn create_default(
        &self,
        scope: &Scope,
        name: &str,
        separator: Option<&str>,
        actor: &str,
    ) -> Result<LocationDefault, TreeError> {
        let separator = separator.unwrap_or(&self.default_separator);
        self.save_default(LocationDefault::new(scope.clone(), name, separator, actor), actor)
            .await
    }

    /// Validate and persist a default.
    ///
    /// Changing the separator of an existing default re-checks every format
    /// and stored segment against the new separator, then re-stamps every
    /// code path before the default itself is written. If re-stamping or the
    /// final write fails, code paths are re-stamped with the old separator.
    pub async fn save_default(
        &self,
        default: LocationDefault,
        actor: &str,
    ) -> Result<LocationDefault, TreeError> {
        let mut default = default;

        if default.name.trim().is_empty() {
            return Err(TreeError::EmptyValue("name".to_string()));
        }

        let validator = FormatValidator::new(&default.separator)?;

        if let Some(existing) = self.catalog.find_default(&default.scope, &default.name).await? {
            if existing.id != default.id {
                return Err(TreeError::DuplicateDefault {
                    name: default.name.clone(),
                    scope: default.scope.clone(),
                });
            }
        }

        let old_separator = match self.catalog.get_default(&default.id).await? {
            Some(previous) if previous.separator != default.separator => previous.separator,
            _ => {
                default.touch(actor);
                let saved = self.catalog.save_default(default).await?;
                tracing::debug!("Saved location default '{}' in {}", saved.name, saved.scope);
                return Ok(saved);
            }
        };

        let formats = self.catalog.list_formats(&default.id).await?;

        for format in &formats {
            validator.validate_char_definition(&format.char_definition)?;

            let codes = self
                .engine
                .store()
                .find_many(&TreeFilter::new().with_group_id(format.id.clone()))
                .await?;

            for code in &codes {
                check_separator_free(&code.segment, validator.separator())?;
            }
        }

        let name = default.name.clone();
        default.touch(actor);

        let result = match self.restamp_codes(&formats, validator.separator()).await {
            Ok(count) => self
                .catalog
                .save_default(default)
                .await
                .map(|saved| (saved, count))
                .map_err(TreeError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok((saved, count)) => {
                tracing::info!(
                    "Changed separator of '{}' from '{}' to '{}' ({} code(s) re-stamped)",
                    saved.name,
                    old_separator,
                    saved.separator,
                    count
                );
                Ok(saved)
            }
            Err(e) => {
                tracing::warn!("Separator change of '{}' failed ({}), restoring '{}'", name, e, old_separator);

                if let Err(restore) = self.restamp_codes(&formats, &old_separator).await {
                    tracing::error!("Could not restore code paths of '{}': {}", name, restore);
                }

                Err(e)
            }
        }
    }

    /// Re-stamp every code tree rooted in one of `formats` with `separator`.
    /// Returns the number of codes written.
    async fn restamp_codes(&self, formats: &[LocationFormat], separator: &str) -> Result<usize, TreeError> {
        let mut count = 0;

        for format in formats {
            let roots = self
                .engine
                .store()
                .find_many(&TreeFilter::new().with_group_id(format.id.clone()).with_root())
                .await?;

            for mut root in roots {
                let path = root.segment.clone();
                root.stamp(path, 0);

                let root = self.engine.store().save(root).await?;
                count += 1 + self.engine.cascade_after_save(&root, separator).await?.len();
            }
        }

        Ok(count)
    }

    pub async fn get_default(&self, id: &str) -> Result<LocationDefault, TreeError> {
        self.catalog
            .get_default(id)
            .await?
            .ok_or_else(|| TreeError::not_found("Location default", id))
    }

    //
    // FORMATS
    //

    pub async fn create_format(
        &self,
        default: &LocationDefault,
        char_definition: &str,
        segment_order: u32,
        actor: &str,
    ) -> Result<LocationFormat, TreeError> {
        self.save_format(
            LocationFormat::new(&default.id, char_definition, segment_order, actor),
            actor,
        )
        .await
    }

    /// Compile the character definition against the default's separator,
    /// stamp `segment_length` and persist
    pub async fn save_format(
        &self,
        format: LocationFormat,
        actor: &str,
    ) -> Result<LocationFormat, TreeError> {
        let mut format = format;
        let default = self.get_default(&format.default_id).await?;
        let template = compile_template(&format.char_definition, &default.separator)?;

        format.segment_length = template.segment_length();
        format.touch(actor);

        let saved = self.catalog.save_format(format).await?;
        tracing::debug!(
            "Saved format '{}' (length {}) for '{}'",
            saved.char_definition,
            saved.segment_length,
            default.name
        );
        Ok(saved)
    }

    /// Formats of `default` in segment order
    pub async fn list_formats(&self, default: &LocationDefault) -> Result<Vec<LocationFormat>, TreeError> {
        Ok(self.catalog.list_formats(&default.id).await?)
    }

    /// Format `char_definition` of the default named `default_name` in `scope`
    pub async fn get_char_definition(
        &self,
        scope: &Scope,
        default_name: &str,
        char_definition: &str,
    ) -> Result<Option<LocationFormat>, TreeError> {
        let default = match self.catalog.find_default(scope, default_name).await? {
            Some(default) => default,
            None => return Ok(None),
        };

        Ok(self
            .catalog
            .list_formats(&default.id)
            .await?
            .into_iter()
            .find(|format| format.char_definition == char_definition))
    }

    /// Get or create a default named like `default` in `target_scope` and
    /// copy all of its formats.
    ///
    /// Returns `None` if the target default already existed. Defaults that
    /// are not `shared` can only be cloned within their own scope.
    pub async fn clone_default_tree(
        &self,
        default: &LocationDefault,
        target_scope: &Scope,
        actor: &str,
    ) -> Result<Option<(LocationDefault, Vec<LocationFormat>)>, TreeError> {
        if !default.shared && &default.scope != target_scope {
            return Err(TreeError::foreign_scope(&default.id, target_scope, &default.scope));
        }

        if self
            .catalog
            .find_default(target_scope, &default.name)
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let mut clone = LocationDefault::new(
            target_scope.clone(),
            default.name.clone(),
            default.separator.clone(),
            actor,
        );
        clone.description = default.description.clone();
        clone.shared = default.shared;
        let clone = self.save_default(clone, actor).await?;

        let mut formats = Vec::new();

        for source in self.catalog.list_formats(&default.id).await? {
            let mut format = LocationFormat::new(
                &clone.id,
                source.char_definition.clone(),
                source.segment_order,
                actor,
            );
            format.description = source.description.clone();
            formats.push(self.save_format(format, actor).await?);
        }

        tracing::info!(
            "Cloned location default '{}' into {} ({} format(s))",
            clone.name,
            target_scope,
            formats.len()
        );
        Ok(Some((clone, formats)))
    }

    /// Delete every code of every format of `default` (leaves first), then
    /// the formats, then the default itself
    pub async fn delete_default_tree(
        &self,
        default: &LocationDefault,
        scope: &Scope,
    ) -> Result<DeletedDefaultTree, TreeError> {
        if &default.scope != scope {
            tracing::warn!("Refusing to delete default '{}' from {}", default.name, scope);
            return Err(TreeError::foreign_scope(&default.id, scope, &default.scope));
        }

        let formats = self.catalog.list_formats(&default.id).await?;
        let mut codes: Vec<LocationCode> = Vec::new();

        for format in &formats {
            codes.extend(
                self.engine
                    .store()
                    .find_many(&TreeFilter::new().with_group_id(format.id.clone()))
                    .await?,
            );
        }

        codes.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.path.cmp(&b.path)));

        let mut report: Vec<(String, Vec<String>)> = formats
            .iter()
            .map(|format| (format.char_definition.clone(), Vec::new()))
            .collect();

        for code in codes {
            self.engine.store().delete(&code).await?;

            if let Some(index) = formats.iter().position(|f| f.id == code.format_id) {
                report[index].1.push(code.path.clone());
            }
        }

        for format in &formats {
            self.catalog.delete_format(&format.id).await?;
        }

        self.catalog.delete_default(&default.id).await?;

        tracing::info!("Deleted location default '{}' from {}", default.name, scope);
        Ok(DeletedDefaultTree {
            name: default.name.clone(),
            formats: report,
        })
    }

    //
    // LOCATION CODES
    //

    /// Check `code` against its format and tree rules, then stamp its
    /// scope, default, path and level.
    ///
    /// # Errors
    ///
    /// - `EmptyValue` for a blank segment
    /// - `NotFound` for a missing format, default or parent
    /// - `Format(SeparatorInValue)` before `Format(SegmentDoesNotMatchTemplate)`
    /// - `SelfAncestry`, `ForeignScope`, `CrossDefaultMix`,
    ///   `DepthExceedsFormatCount`, `DuplicateRoot`, `DuplicateSibling`
    ///
    /// The stored subtree of `code` is checked at its new depth as well, so
    /// a move or rename cannot push a descendant past the last format or
    /// below a namesake.
    pub async fn validate_and_stamp(&self, code: &mut LocationCode) -> Result<(), TreeError> {
        if code.segment.is_empty() {
            return Err(TreeError::EmptyValue("segment".to_string()));
        }

        let format = self
            .catalog
            .get_format(&code.format_id)
            .await?
            .ok_or_else(|| TreeError::not_found("Location format", code.format_id.clone()))?;
        let default = self.get_default(&format.default_id).await?;

        let template = compile_template(&format.char_definition, &default.separator)?;
        validate_segment(&code.segment, &template)?;

        let parents = self.engine.get_parents(code).await?;

        if parents.iter().any(|parent| parent.segment == code.segment) {
            return Err(TreeError::self_ancestry(
                &code.segment,
                join_labels(&parents, &default.separator),
            ));
        }

        for parent in &parents {
            assert_same_scope(parent, &default.scope)?;

            if parent.default_id != default.id {
                return Err(TreeError::CrossDefaultMix {
                    expected: default.id.clone(),
                    found: parent.default_id.clone(),
                });
            }
        }

        let below = self.engine.check_subtree(code, &parents).await?;
        let allowed = self.catalog.list_formats(&default.id).await?.len();
        let found = parents.len() + 1 + below;

        if found > allowed {
            return Err(TreeError::DepthExceedsFormatCount { found, allowed });
        }

        let namesakes = self
            .engine
            .store()
            .find_many(
                &TreeFilter::new()
                    .with_scope(default.scope.clone())
                    .with_parent(code.parent_id.as_deref())
                    .with_label(code.segment.clone()),
            )
            .await?;

        if namesakes.iter().any(|other| other.id != code.id) {
            return Err(match &code.parent_id {
                None => TreeError::DuplicateRoot {
                    label: code.segment.clone(),
                    scope: default.scope.clone(),
                },
                Some(parent_id) => TreeError::DuplicateSibling {
                    label: code.segment.clone(),
                    parent_id: parent_id.clone(),
                },
            });
        }

        code.scope = default.scope.clone();
        code.default_id = default.id.clone();

        let level = parents.len() as u32;
        let mut chain = parents;
        chain.push(code.clone());
        code.stamp(join_labels(&chain, &default.separator), level);

        Ok(())
    }

    /// Validate, persist and cascade a location code
    pub async fn save(&self, code: LocationCode, actor: &str) -> Result<LocationCode, TreeError> {
        let mut code = code;
        self.validate_and_stamp(&mut code).await?;
        code.touch(actor);

        let separator = self.get_default(&code.default_id).await?.separator;
        let saved = self.engine.store().save(code).await?;
        let cascaded = self.engine.cascade_after_save(&saved, &separator).await?;

        tracing::debug!(
            "Saved location code '{}' ({} descendant(s) re-stamped)",
            saved.path,
            cascaded.len()
        );
        Ok(saved)
    }

    /// Get or create one code per segment, level *n* using the *n*-th format
    /// of `default`. Returns the whole chain, root first.
    ///
    /// The chain length and every segment's separator are checked before
    /// anything is written.
    pub async fn create_tree<S: AsRef<str> + Sync>(
        &self,
        default: &LocationDefault,
        segments: &[S],
        scope: &Scope,
        actor: &str,
    ) -> Result<Vec<LocationCode>, TreeError> {
        let mut created = Vec::new();
        self.build_chain(default, segments, scope, actor, &mut created)
            .await
    }

    /// Like [`LocationService::create_tree`], but on failure deletes the
    /// codes this call created before returning the error
    pub async fn create_tree_atomic<S: AsRef<str> + Sync>(
        &self,
        default: &LocationDefault,
        segments: &[S],
        scope: &Scope,
        actor: &str,
    ) -> Result<Vec<LocationCode>, TreeError> {
        let mut created = Vec::new();

        match self
            .build_chain(default, segments, scope, actor, &mut created)
            .await
        {
            Ok(chain) => Ok(chain),
            Err(e) => {
                tracing::warn!(
                    "Location chain failed ({}), rolling back {} new code(s)",
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
        default: &LocationDefault,
        segments: &[S],
        scope: &Scope,
        actor: &str,
        created: &mut Vec<LocationCode>,
    ) -> Result<Vec<LocationCode>, TreeError> {
        if &default.scope != scope {
            tracing::warn!("Refusing to build codes for '{}' in {}", default.name, scope);
            return Err(TreeError::foreign_scope(&default.id, scope, &default.scope));
        }

        let formats = self.catalog.list_formats(&default.id).await?;

        if segments.len() > formats.len() {
            return Err(TreeError::DepthExceedsFormatCount {
                found: segments.len(),
                allowed: formats.len(),
            });
        }

        for segment in segments {
            check_separator_free(segment.as_ref(), &default.separator)?;
        }

        let mut chain: Vec<LocationCode> = Vec::with_capacity(segments.len());

        for ((level, segment), format) in segments.iter().enumerate().zip(&formats) {
            let segment = segment.as_ref();
            let parent_id = chain.last().map(|parent| parent.id.clone());
            let filter = TreeFilter::new()
                .with_scope(scope.clone())
                .with_parent(parent_id.as_deref())
                .with_label(segment)
                .with_level(level as u32)
                .with_group_id(format.id.clone());

            let code = match self.engine.store().find_one(&filter).await? {
                Some(existing) => existing,
                None => {
                    let code = self
                        .save(
                            LocationCode::new(default, format, segment, parent_id, actor),
                            actor,
                        )
                        .await?;
                    created.push(code.clone());
                    code
                }
            };

            chain.push(code);
        }

        tracing::info!(
            "Location chain '{}' ready for '{}' ({} new)",
            chain.last().map(|c| c.path.as_str()).unwrap_or_default(),
            default.name,
            created.len()
        );
        Ok(chain)
    }

    /// Delete the chain returned by `create_tree` from the leaf backward,
    /// stopping at the first code that still has children
    pub async fn delete_tree(&self, chain: &[LocationCode], scope: &Scope) -> Result<Vec<String>, TreeError> {
        self.engine.delete_tree(chain, scope).await
    }

    pub async fn get_parents(&self, scope: &Scope, code: &LocationCode) -> Result<Vec<LocationCode>, TreeError> {
        assert_same_scope(code, scope)?;
        self.engine.get_parents(code).await
    }

    pub async fn compute_path(&self, code: &LocationCode, include_self: bool) -> Result<String, TreeError> {
        let separator = self.get_default(&code.default_id).await?.separator;
        self.engine.compute_path(code, &separator, include_self).await
    }

    /// Path of the parent segments only
    pub async fn parents_path(&self, code: &LocationCode) -> Result<String, TreeError> {
        self.compute_path(code, false).await
    }

    pub async fn get_children(&self, scope: &Scope, code: &LocationCode) -> Result<Vec<LocationCode>, TreeError> {
        assert_same_scope(code, scope)?;
        self.engine.get_children(code).await
    }

    pub async fn get_children_and_root(
        &self,
        scope: &Scope,
        code: &LocationCode,
    ) -> Result<Vec<LocationCode>, TreeError> {
        assert_same_scope(code, scope)?;
        self.engine.get_children_and_root(code).await
    }

    pub async fn get_child_tree_from_list(
        &self,
        scope: &Scope,
        codes: &[LocationCode],
        with_root: bool,
    ) -> Result<Vec<Vec<LocationCode>>, TreeError> {
        for code in codes {
            assert_same_scope(code, scope)?;
        }

        self.engine.get_child_tree_from_list(codes, with_root).await
    }

    /// Chains (root first, match last) of every code with `segment`
    pub async fn get_all_root_trees(
        &self,
        scope: &Scope,
        segment: &str,
    ) -> Result<Vec<Vec<LocationCode>>, TreeError> {
        self.engine.get_all_root_trees(segment, scope).await
    }
}
