// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Keeps the database objects behind view definitions in step with the definitions.
//!
//! Every operation is an ordered sequence of statements on the definition's
//! connection. Nothing runs inside a transaction, so a failure part way through
//! leaves the statements before it applied.

use crate::{
    compiler::{
        CompiledQuery,
        QueryCompiler,
    },
    executor::{
        ExecuteError,
        Executor,
    },
    permissions::PermissionPolicy,
    statements::{
        unique_index_name,
        CreateIndexStatement,
        CreateViewStatement,
        DropIndexStatement,
        DropViewStatement,
        ParamError,
        RefreshMaterializedViewStatement,
        Statement,
        ViewExistsQuery,
        ViewKind,
    },
    store::{
        StoreError,
        ViewStore,
    },
    view::{
        ViewChange,
        ViewDefinition,
        ViewId,
        ViewSnapshot,
    },
};
use chrono::{
    DateTime,
    Utc,
};
use log::*;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Execute(#[from] ExecuteError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Cannot render the query of view `{view}`: {source}")]
    Query {
        view: String,
        #[source]
        source: ParamError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created { at: DateTime<Utc> },
    /// The source has no query for the definition. Nothing was executed.
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { at: DateTime<Utc> },
    NotMaterialized,
    Missing,
    /// The database refused the refresh, typically for lack of a unique index.
    Failed { reason: String },
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed { .. })
    }
}

/// Creates, refreshes and drops the database objects of view definitions.
#[derive(Clone)]
pub struct ViewSynchronizer {
    executor: Arc<dyn Executor>,
    compiler: Arc<dyn QueryCompiler>,
    store: Arc<dyn ViewStore>,
    policy: PermissionPolicy,
}

impl ViewSynchronizer {
    pub fn new(executor: Arc<dyn Executor>, compiler: Arc<dyn QueryCompiler>, store: Arc<dyn ViewStore>) -> Self {
        Self {
            executor,
            compiler,
            store,
            policy: PermissionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PermissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<dyn ViewStore> {
        &self.store
    }

    pub fn policy(&self) -> &PermissionPolicy {
        &self.policy
    }

    /// Drop whatever object holds the definition's name, create the view from a
    /// freshly compiled query, index it and apply permissions. Both timestamps are
    /// then set and the definition goes through [`Self::save`].
    ///
    /// A name held by another stored definition is rejected before any statement runs.
    pub async fn create_or_replace(&self, definition: &mut ViewDefinition) -> Result<CreateOutcome, SyncError> {
        let query = match definition.query(self.compiler.as_ref()) {
            Some(query) => query,
            None => {
                warn!(
                    "{} has no query for method {}, cannot create view {}",
                    definition.source, definition.query_method_name, definition.view_name
                );
                return Ok(CreateOutcome::Skipped);
            }
        };
        self.ensure_unique_name(definition).await?;
        // The create below replaces any object at the current name and alias,
        // so only a rename or a move leaves an old object to drop.
        let original = self
            .stored_snapshot(definition)
            .await?
            .filter(|s| s.view_name != definition.view_name || s.connection_alias != definition.connection_alias);
        let permissions = self.policy.statements_for(definition);
        self.create_view(
            &definition.connection_alias,
            &definition.view_name,
            definition.kind(),
            &query,
            definition.unique_fields.as_slice(),
            &permissions,
        )
        .await?;

        let now = Utc::now();
        definition.created_at = Some(now);
        definition.last_refreshed_at = Some(now);
        self.save(definition, original.as_ref()).await?;
        Ok(CreateOutcome::Created { at: now })
    }

    async fn ensure_unique_name(&self, definition: &ViewDefinition) -> Result<(), SyncError> {
        match self.store.find(&definition.view_name).await? {
            Some(existing) if existing.current.id != definition.id => {
                Err(StoreError::DuplicateName(definition.view_name.clone()).into())
            }
            _ => Ok(()),
        }
    }

    /// The values last persisted for a saved definition.
    async fn stored_snapshot(&self, definition: &ViewDefinition) -> Result<Option<ViewSnapshot>, SyncError> {
        Ok(match definition.id {
            Some(id) => self.store.get(id).await?.map(|loaded| loaded.original),
            None => None,
        })
    }

    /// Replace `view_name` on `alias` with a view over `query`. The unique index is only
    /// built for a materialized view with `unique_fields`.
    pub async fn create_view<S: AsRef<str>>(
        &self,
        alias: &str,
        view_name: &str,
        kind: ViewKind,
        query: &CompiledQuery,
        unique_fields: &[S],
        permissions: &[Statement],
    ) -> Result<(), SyncError> {
        let sql = query.inline().map_err(|source| SyncError::Query {
            view: view_name.to_string(),
            source,
        })?;
        self.drop(alias, view_name).await?;
        info!("Creating {} {} on {}", kind, view_name, alias);
        self.executor
            .execute(alias, &CreateViewStatement::new(kind, view_name, sql).into())
            .await?;
        if kind.is_materialized() {
            if unique_fields.is_empty() {
                warn!(
                    "Materialized view {} has no unique fields and cannot be refreshed concurrently",
                    view_name
                );
            } else {
                self.executor
                    .execute(alias, &DropIndexStatement::if_exists(unique_index_name(view_name)).into())
                    .await?;
                self.executor
                    .execute(
                        alias,
                        &CreateIndexStatement::unique_for_view(view_name, unique_fields).into(),
                    )
                    .await?;
            }
        }
        self.executor.execute_all(alias, permissions).await?;
        Ok(())
    }

    /// Refresh a materialized view concurrently. Refusals from the database are logged
    /// and reported in the outcome, leaving `last_refreshed_at` untouched.
    pub async fn refresh(&self, definition: &mut ViewDefinition) -> Result<RefreshOutcome, SyncError> {
        if !definition.materialized {
            warn!("View {} is not materialized and cannot be refreshed", definition.view_name);
            return Ok(RefreshOutcome::NotMaterialized);
        }
        let alias = definition.connection_alias.clone();
        let original = self.stored_snapshot(definition).await?;
        if !self.exists(&definition.view_name, true, &alias).await? {
            warn!(
                "View {} does not exist and cannot be refreshed",
                definition.view_name
            );
            return Ok(RefreshOutcome::Missing);
        }
        info!("Refreshing view {}", definition.view_name);
        let statement: Statement = RefreshMaterializedViewStatement::concurrently(definition.view_name.as_str()).into();
        match self.executor.execute(&alias, &statement).await {
            Ok(_) => (),
            Err(e) if e.is_operational() => {
                warn!("Cannot refresh {}: {}", definition.view_name, e);
                return Ok(RefreshOutcome::Failed { reason: e.to_string() });
            }
            Err(e) => return Err(e.into()),
        }
        let now = Utc::now();
        definition.last_refreshed_at = Some(now);
        self.save(definition, original.as_ref()).await?;
        Ok(RefreshOutcome::Refreshed { at: now })
    }

    /// Drop the object left behind by a rename, a change of kind or a move to another
    /// connection. Must run after the new values are persisted.
    pub async fn drop_if_renamed_or_retyped(
        &self,
        original: Option<&ViewSnapshot>,
        definition: &ViewDefinition,
    ) -> Result<Option<ViewChange>, SyncError> {
        let change = match ViewChange::detect(original, definition) {
            Some(change) => change,
            None => return Ok(None),
        };
        info!(
            "View {} on {} was replaced by {} on {}, dropping it",
            change.previous.view_name, change.previous.connection_alias, definition.view_name, definition.connection_alias
        );
        self.drop(&change.previous.connection_alias, &change.previous.view_name)
            .await?;
        Ok(Some(change))
    }

    /// Drop any view or materialized view named `view_name`. Succeeds when there is none.
    pub async fn drop(&self, alias: &str, view_name: &str) -> Result<(), SyncError> {
        for kind in ViewKind::all() {
            let statement: Statement = DropViewStatement::if_exists(kind, view_name).into();
            match self.executor.execute(alias, &statement).await {
                Ok(_) => (),
                Err(e) if e.is_does_not_exist() => debug!("Ignoring {}: {}", statement, e),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub async fn exists(&self, view_name: &str, materialized: bool, alias: &str) -> Result<bool, SyncError> {
        let query = ViewExistsQuery::new(view_name, ViewKind::from_materialized(materialized));
        Ok(self.executor.exists(alias, &query).await?)
    }

    /// Persist a definition. `original` is the snapshot it was loaded with, if any.
    ///
    /// A blank query method name is defaulted and the output fields are resolved
    /// first. Creating the view is left to [`Self::create_or_replace`].
    pub async fn save(
        &self,
        definition: &mut ViewDefinition,
        original: Option<&ViewSnapshot>,
    ) -> Result<Option<ViewChange>, SyncError> {
        definition.default_query_method_name();
        definition.resolve_fields(self.compiler.as_ref());
        self.store.persist(definition).await?;
        self.drop_if_renamed_or_retyped(original, definition).await
    }

    /// Remove the definition, then its database object.
    pub async fn delete(&self, definition: &ViewDefinition) -> Result<Option<ViewDefinition>, SyncError> {
        let removed = match definition.id {
            Some(id) => self.store.remove(id).await?,
            None => None,
        };
        self.drop(&definition.connection_alias, &definition.view_name)
            .await?;
        Ok(removed)
    }

    /// Load and create a stored definition. `None` when no definition has the id.
    pub async fn create_by_id(&self, id: ViewId) -> Result<Option<CreateOutcome>, SyncError> {
        match self.store.get(id).await? {
            Some(loaded) => {
                let (mut definition, _) = loaded.into_parts();
                Ok(Some(self.create_or_replace(&mut definition).await?))
            }
            None => {
                warn!("No view with id {} to create", id);
                Ok(None)
            }
        }
    }

    pub async fn refresh_by_id(&self, id: ViewId) -> Result<Option<RefreshOutcome>, SyncError> {
        match self.store.get(id).await? {
            Some(loaded) => {
                let (mut definition, _) = loaded.into_parts();
                Ok(Some(self.refresh(&mut definition).await?))
            }
            None => {
                warn!("No view with id {} to refresh", id);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        compiler::QueryRegistry,
        executor::{
            MemoryExecutor,
            DEFAULT_ALIAS,
            INSUFFICIENT_PRIVILEGE,
            UNDEFINED_COLUMN,
        },
        store::MemoryViewStore,
        view::ViewDefinitionBuilder,
    };

    const SOURCE: &str = "tests.fakemodel";

    struct Fixture {
        executor: Arc<MemoryExecutor>,
        store: Arc<MemoryViewStore>,
        sync: ViewSynchronizer,
    }

    fn fixture() -> Fixture {
        let executor = Arc::new(MemoryExecutor::new().with_alias("other"));
        let store = Arc::new(MemoryViewStore::new());
        let registry = QueryRegistry::new()
            .with_method(SOURCE, "get_view_qs", || {
                Some(
                    CompiledQuery::new("SELECT uuid, name FROM fake_model WHERE name <> $1")
                        .bind("excluded")
                        .columns(["uuid", "name"]),
                )
            })
            .with_method(SOURCE, "get_other_qs", || {
                Some(CompiledQuery::new("SELECT 'b' AS uuid").columns(["uuid"]))
            })
            .with_method(SOURCE, "get_empty_qs", || None);
        let sync = ViewSynchronizer::new(executor.clone(), Arc::new(registry), store.clone());
        Fixture { executor, store, sync }
    }

    fn fake_view() -> ViewDefinition {
        ViewDefinitionBuilder::default()
            .view_name("fake_view")
            .source(SOURCE)
            .query_method_name("get_view_qs")
            .unique_fields(vec!["uuid".to_string()])
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_materialized() {
        let f = fixture();
        let mut view = fake_view();
        let outcome = f.sync.create_or_replace(&mut view).await.unwrap();
        assert!(matches!(outcome, CreateOutcome::Created { .. }));
        assert!(f.sync.exists("fake_view", true, DEFAULT_ALIAS).await.unwrap());
        assert!(!f.sync.exists("fake_view", false, DEFAULT_ALIAS).await.unwrap());
        assert!(f.executor.has_unique_index(DEFAULT_ALIAS, "unique_fake_view"));
        assert!(view.is_saved());
        assert_eq!(view.created_at, view.last_refreshed_at);
        assert!(view.created_at.is_some());

        let object = f.executor.object(DEFAULT_ALIAS, "fake_view").unwrap();
        assert_eq!(object.query, "SELECT uuid, name FROM fake_model WHERE name <> 'excluded'");
        assert_eq!(object.owner.as_deref(), Some("postgres"));
        assert_eq!(
            f.executor.statements(DEFAULT_ALIAS),
            vec![
                "DROP VIEW IF EXISTS \"fake_view\"",
                "DROP MATERIALIZED VIEW IF EXISTS \"fake_view\"",
                "CREATE MATERIALIZED VIEW \"fake_view\" AS SELECT uuid, name FROM fake_model WHERE name <> 'excluded'",
                "DROP INDEX IF EXISTS \"unique_fake_view\"",
                "CREATE UNIQUE INDEX \"unique_fake_view\" ON \"fake_view\" (\"uuid\")",
                "ALTER TABLE public.\"fake_view\" OWNER TO \"postgres\"",
                "GRANT ALL ON TABLE public.\"fake_view\" TO \"postgres\"",
            ]
        );
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let f = fixture();
        let mut view = fake_view();
        f.sync.create_or_replace(&mut view).await.unwrap();
        f.sync.create_or_replace(&mut view).await.unwrap();
        assert_eq!(f.executor.kind(DEFAULT_ALIAS, "fake_view"), Some(ViewKind::MaterializedView));
        assert_eq!(f.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_without_query_is_skipped() {
        let f = fixture();
        let mut view = fake_view();
        view.query_method_name = "get_empty_qs".to_string();
        assert_eq!(f.sync.create_or_replace(&mut view).await.unwrap(), CreateOutcome::Skipped);
        view.query_method_name = "get_missing_qs".to_string();
        assert_eq!(f.sync.create_or_replace(&mut view).await.unwrap(), CreateOutcome::Skipped);
        assert!(f.executor.statements(DEFAULT_ALIAS).is_empty());
        assert!(view.created_at.is_none());
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_plain_view_has_no_index() {
        let f = fixture();
        let mut view = fake_view();
        view.materialized = false;
        f.sync.create_or_replace(&mut view).await.unwrap();
        assert_eq!(f.executor.kind(DEFAULT_ALIAS, "fake_view"), Some(ViewKind::View));
        assert!(!f.executor.has_unique_index(DEFAULT_ALIAS, "unique_fake_view"));
    }

    #[tokio::test]
    async fn test_permission_failure_keeps_view() {
        let f = fixture();
        f.executor
            .fail_on("GRANT ALL", INSUFFICIENT_PRIVILEGE, "permission denied");
        let mut view = fake_view();
        let err = f.sync.create_or_replace(&mut view).await.unwrap_err();
        assert!(matches!(err, SyncError::Execute(e) if e.code() == Some(INSUFFICIENT_PRIVILEGE)));
        assert_eq!(f.executor.kind(DEFAULT_ALIAS, "fake_view"), Some(ViewKind::MaterializedView));
        assert!(view.created_at.is_none());
    }

    #[tokio::test]
    async fn test_refresh() {
        let f = fixture();
        let mut view = fake_view();
        f.sync.create_or_replace(&mut view).await.unwrap();
        let created = view.last_refreshed_at;
        let before = Utc::now();
        let outcome = f.sync.refresh(&mut view).await.unwrap();
        assert!(outcome.is_refreshed());
        let refreshed = view.last_refreshed_at.unwrap();
        assert!(refreshed >= before);
        assert!(Some(refreshed) >= created);
        assert_eq!(f.executor.object(DEFAULT_ALIAS, "fake_view").unwrap().refreshes, 1);
        let stored = f.store.find("fake_view").await.unwrap().unwrap();
        assert_eq!(stored.current.last_refreshed_at, Some(refreshed));
    }

    #[tokio::test]
    async fn test_refresh_without_unique_index() {
        let f = fixture();
        let mut view = fake_view();
        view.unique_fields.clear();
        f.sync.create_or_replace(&mut view).await.unwrap();
        let last = view.last_refreshed_at;
        let outcome = f.sync.refresh(&mut view).await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
        assert_eq!(view.last_refreshed_at, last);
    }

    #[tokio::test]
    async fn test_refresh_plain_and_missing() {
        let f = fixture();
        let mut view = fake_view();
        view.materialized = false;
        assert_eq!(f.sync.refresh(&mut view).await.unwrap(), RefreshOutcome::NotMaterialized);
        assert!(view.last_refreshed_at.is_none());

        view.materialized = true;
        assert_eq!(f.sync.refresh(&mut view).await.unwrap(), RefreshOutcome::Missing);
        assert!(view.last_refreshed_at.is_none());
        assert!(f.executor.statements(DEFAULT_ALIAS).is_empty());
    }

    #[tokio::test]
    async fn test_refresh_propagates_other_errors() {
        let f = fixture();
        let mut view = fake_view();
        f.sync.create_or_replace(&mut view).await.unwrap();
        f.executor.fail_on("REFRESH", INSUFFICIENT_PRIVILEGE, "must be owner");
        assert!(f.sync.refresh(&mut view).await.is_err());
    }

    #[tokio::test]
    async fn test_drop_missing() {
        let f = fixture();
        f.sync.drop(DEFAULT_ALIAS, "no_such_view").await.unwrap();
        assert_eq!(f.executor.statements(DEFAULT_ALIAS).len(), 2);
    }

    #[tokio::test]
    async fn test_drop_swallows_wrong_kind_only() {
        let f = fixture();
        f.executor.fail_on("DROP VIEW", "42809", "\"fake_view\" is not a view");
        f.sync.drop(DEFAULT_ALIAS, "fake_view").await.unwrap();
        f.executor.fail_on("DROP MATERIALIZED", "57014", "canceling statement");
        let err = f.sync.drop(DEFAULT_ALIAS, "fake_view").await.unwrap_err();
        assert!(matches!(err, SyncError::Execute(e) if e.is_operational()));
    }

    #[tokio::test]
    async fn test_save_defaults_and_caches_fields() {
        let f = fixture();
        let mut view = fake_view();
        view.query_method_name.clear();
        assert!(f.sync.save(&mut view, None).await.unwrap().is_none());
        assert_eq!(view.query_method_name, "get_fake_view_qs");
        assert!(view.fields.is_empty());

        view.query_method_name = "get_view_qs".to_string();
        f.sync.save(&mut view, None).await.unwrap();
        assert_eq!(view.fields, vec!["uuid".to_string(), "name".to_string()]);
        assert!(f.executor.statements(DEFAULT_ALIAS).is_empty());
    }

    #[tokio::test]
    async fn test_rename_drops_old_view() {
        let f = fixture();
        let mut view = fake_view();
        f.sync.create_or_replace(&mut view).await.unwrap();
        let (mut view, original) = f.store.get(view.id.unwrap()).await.unwrap().unwrap().into_parts();

        view.view_name = "renamed_view".to_string();
        let change = f.sync.save(&mut view, Some(&original)).await.unwrap().unwrap();
        assert!(change.renamed && !change.retyped);
        f.sync.create_or_replace(&mut view).await.unwrap();
        assert!(f.sync.exists("renamed_view", true, DEFAULT_ALIAS).await.unwrap());
        assert!(!f.sync.exists("fake_view", true, DEFAULT_ALIAS).await.unwrap());
        assert!(!f.sync.exists("fake_view", false, DEFAULT_ALIAS).await.unwrap());
    }

    #[tokio::test]
    async fn test_retype_drops_materialized() {
        let f = fixture();
        let mut view = fake_view();
        f.sync.create_or_replace(&mut view).await.unwrap();
        let original = view.snapshot();

        view.materialized = false;
        let change = f.sync.save(&mut view, Some(&original)).await.unwrap().unwrap();
        assert!(change.retyped);
        assert_eq!(f.executor.kind(DEFAULT_ALIAS, "fake_view"), None);
        f.sync.create_or_replace(&mut view).await.unwrap();
        assert_eq!(f.executor.kind(DEFAULT_ALIAS, "fake_view"), Some(ViewKind::View));
    }

    #[tokio::test]
    async fn test_relocate_drops_on_old_alias() {
        let f = fixture();
        let mut view = fake_view();
        f.sync.create_or_replace(&mut view).await.unwrap();
        let original = view.snapshot();

        view.connection_alias = "other".to_string();
        f.sync.save(&mut view, Some(&original)).await.unwrap();
        f.sync.create_or_replace(&mut view).await.unwrap();
        assert_eq!(f.executor.kind(DEFAULT_ALIAS, "fake_view"), None);
        assert_eq!(f.executor.kind("other", "fake_view"), Some(ViewKind::MaterializedView));
    }

    #[tokio::test]
    async fn test_create_after_unsaved_rename() {
        let f = fixture();
        let mut view = fake_view();
        f.sync.create_or_replace(&mut view).await.unwrap();
        let (mut view, _) = f.store.get(view.id.unwrap()).await.unwrap().unwrap().into_parts();
        view.fields.clear();

        view.view_name = "renamed_view".to_string();
        f.sync.create_or_replace(&mut view).await.unwrap();
        assert_eq!(f.executor.kind(DEFAULT_ALIAS, "fake_view"), None);
        assert_eq!(f.executor.kind(DEFAULT_ALIAS, "renamed_view"), Some(ViewKind::MaterializedView));
        let names: Vec<String> = f.store.list().await.unwrap().into_iter().map(|v| v.view_name).collect();
        assert_eq!(names, vec!["renamed_view"]);
        assert_eq!(view.fields, vec!["uuid", "name"]);
    }

    #[tokio::test]
    async fn test_create_after_unsaved_retype() {
        let f = fixture();
        let mut view = fake_view();
        f.sync.create_or_replace(&mut view).await.unwrap();

        view.materialized = false;
        f.sync.create_or_replace(&mut view).await.unwrap();
        assert_eq!(f.executor.kind(DEFAULT_ALIAS, "fake_view"), Some(ViewKind::View));
        assert!(!f.store.find("fake_view").await.unwrap().unwrap().current.materialized);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_before_ddl() {
        let f = fixture();
        let mut view = fake_view();
        f.sync.create_or_replace(&mut view).await.unwrap();
        f.executor.clear_statements();

        let mut other = fake_view();
        other.query_method_name = "get_other_qs".to_string();
        let err = f.sync.create_or_replace(&mut other).await.unwrap_err();
        assert!(matches!(err, SyncError::Store(StoreError::DuplicateName(name)) if name == "fake_view"));
        assert!(f.executor.statements(DEFAULT_ALIAS).is_empty());
        assert_eq!(
            f.executor.object(DEFAULT_ALIAS, "fake_view").unwrap().query,
            "SELECT uuid, name FROM fake_model WHERE name <> 'excluded'"
        );
        assert!(other.id.is_none());
    }

    #[tokio::test]
    async fn test_unique_index_failure_keeps_view() {
        let f = fixture();
        f.executor
            .fail_on("CREATE UNIQUE INDEX", UNDEFINED_COLUMN, "column \"uuid\" does not exist");
        let mut view = fake_view();
        let err = f.sync.create_or_replace(&mut view).await.unwrap_err();
        assert!(matches!(err, SyncError::Execute(e) if e.code() == Some(UNDEFINED_COLUMN)));
        assert_eq!(f.executor.kind(DEFAULT_ALIAS, "fake_view"), Some(ViewKind::MaterializedView));
        assert!(!f.executor.has_unique_index(DEFAULT_ALIAS, "unique_fake_view"));
        assert!(view.created_at.is_none());
        assert!(view.last_refreshed_at.is_none());
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_refresh_saves_through_hook() {
        let f = fixture();
        let mut view = fake_view();
        f.sync.create_or_replace(&mut view).await.unwrap();
        view.fields.clear();
        f.store.persist(&mut view).await.unwrap();

        assert!(f.sync.refresh(&mut view).await.unwrap().is_refreshed());
        let stored = f.store.find("fake_view").await.unwrap().unwrap().current;
        assert_eq!(stored.fields, vec!["uuid", "name"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let f = fixture();
        let mut view = fake_view();
        f.sync.create_or_replace(&mut view).await.unwrap();
        let removed = f.sync.delete(&view).await.unwrap();
        assert_eq!(removed.map(|v| v.view_name), Some("fake_view".to_string()));
        assert!(!f.sync.exists("fake_view", true, DEFAULT_ALIAS).await.unwrap());
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_by_id() {
        let f = fixture();
        let mut view = fake_view();
        let id = f.store.persist(&mut view).await.unwrap();
        assert!(matches!(
            f.sync.create_by_id(id).await.unwrap(),
            Some(CreateOutcome::Created { .. })
        ));
        assert!(f.sync.refresh_by_id(id).await.unwrap().unwrap().is_refreshed());
        assert!(f.sync.create_by_id(ViewId::from(99)).await.unwrap().is_none());
        assert!(f.sync.refresh_by_id(ViewId::from(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_parameter() {
        let executor = Arc::new(MemoryExecutor::new());
        let registry = QueryRegistry::new().with_method(SOURCE, "get_view_qs", || {
            Some(CompiledQuery::new("SELECT uuid FROM fake_model WHERE id = $1"))
        });
        let sync = ViewSynchronizer::new(executor.clone(), Arc::new(registry), Arc::new(MemoryViewStore::new()));
        let err = sync.create_or_replace(&mut fake_view()).await.unwrap_err();
        assert!(matches!(err, SyncError::Query { view, .. } if view == "fake_view"));
        assert!(executor.statements(DEFAULT_ALIAS).is_empty());
    }
}
