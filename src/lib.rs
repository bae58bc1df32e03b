// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle management for PostgreSQL views and materialized views whose
//! contents are defined by named query methods on registered data sources.

pub mod compiler;
pub mod config;
pub mod executor;
pub mod permissions;
pub mod statements;
pub mod store;
pub mod sync;
pub mod view;
pub mod worker;

pub mod prelude {
    pub use super::{
        compiler::{
            CompiledQuery,
            QueryCompiler,
            QueryRegistry,
            QuerySource,
        },
        config::{
            ConfigError,
            ConnectionConfig,
            ViewsConfig,
        },
        executor::{
            ErrorClass,
            ExecuteError,
            Executor,
            MemoryExecutor,
            PgExecutor,
            DEFAULT_ALIAS,
        },
        permissions::{
            permission_statements,
            PermissionPolicy,
        },
        statements::{
            SqlParam,
            Statement,
            ViewKind,
        },
        store::{
            MemoryViewStore,
            StoreError,
            ViewStore,
        },
        sync::{
            CreateOutcome,
            RefreshOutcome,
            SyncError,
            ViewSynchronizer,
        },
        view::{
            Loaded,
            SourceRef,
            ViewChange,
            ViewDefinition,
            ViewDefinitionBuilder,
            ViewId,
            ViewSnapshot,
        },
        worker::{
            ViewTask,
            ViewWorker,
            ViewWorkerHandle,
            WorkerError,
        },
    };
}
