// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::config::{
    ConnectionConfig,
    ViewsConfig,
};
use log::*;
use sqlx::{
    postgres::PgPoolOptions,
    PgPool,
    Postgres,
};
use std::{
    collections::HashMap,
    time::Duration,
};

/// Executes statements on PostgreSQL, with one connection pool per alias.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pools: HashMap<String, PgPool>,
}

impl PgExecutor {
    /// Create a pool for every configured connection. Connections are opened on first use.
    pub fn connect_lazy(config: &ViewsConfig) -> Result<Self, ExecuteError> {
        let mut pools = HashMap::new();
        for (alias, connection) in config.connections.iter() {
            debug!("Registering connection {} at {}", alias, connection.redacted_url());
            pools.insert(alias.clone(), Self::pool_for(connection)?);
        }
        Ok(Self { pools })
    }

    pub fn from_pools<I, S>(pools: I) -> Self
    where
        I: IntoIterator<Item = (S, PgPool)>,
        S: Into<String>,
    {
        Self {
            pools: pools.into_iter().map(|(alias, pool)| (alias.into(), pool)).collect(),
        }
    }

    fn pool_for(connection: &ConnectionConfig) -> Result<PgPool, ExecuteError> {
        Ok(PgPoolOptions::new()
            .max_connections(connection.max_connections)
            .acquire_timeout(Duration::from_secs(connection.acquire_timeout_secs))
            .connect_lazy(&connection.url)?)
    }

    pub fn pool(&self, alias: &str) -> Result<&PgPool, ExecuteError> {
        self.pools
            .get(alias)
            .ok_or_else(|| ExecuteError::UnknownConnection(alias.to_string()))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &String> {
        self.pools.keys()
    }
}

#[async_trait]
impl Executor for PgExecutor {
    async fn execute(&self, alias: &str, statement: &Statement) -> Result<u64, ExecuteError> {
        let pool = self.pool(alias)?;
        let sql = statement.to_string();
        debug!("[{}] {}", alias, sql);
        let result = sqlx::query::<Postgres>(&sql).persistent(false).execute(pool).await?;
        Ok(result.rows_affected())
    }

    async fn exists(&self, alias: &str, query: &ViewExistsQuery) -> Result<bool, ExecuteError> {
        let pool = self.pool(alias)?;
        let exists = sqlx::query_scalar::<Postgres, bool>(query.sql())
            .bind(query.name.as_str())
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }
}

impl From<sqlx::Error> for ExecuteError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db) => Self::Database {
                code: db.code().map(|c| c.into_owned()).unwrap_or_default(),
                message: db.message().to_string(),
            },
            sqlx::Error::Io(e) => Self::Connection(e.to_string()),
            other @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed) => {
                Self::Connection(other.to_string())
            }
            other => Self::Other(anyhow::Error::new(other)),
        }
    }
}
