// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Statement execution against named database connections.

use crate::statements::{
    Statement,
    ViewExistsQuery,
};
use async_trait::async_trait;

mod error;
pub use error::*;

mod memory;
pub use memory::*;

mod postgres;
pub use postgres::*;

/// The alias of the connection views live on unless configured otherwise.
pub const DEFAULT_ALIAS: &str = "default";

/// Issues statements on a connection selected by alias.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute a statement, returning the number of affected rows.
    async fn execute(&self, alias: &str, statement: &Statement) -> Result<u64, ExecuteError>;

    /// Run a catalog probe.
    async fn exists(&self, alias: &str, query: &ViewExistsQuery) -> Result<bool, ExecuteError>;

    /// Execute statements in order, stopping at the first failure.
    async fn execute_all(&self, alias: &str, statements: &[Statement]) -> Result<(), ExecuteError> {
        for statement in statements {
            self.execute(alias, statement).await?;
        }
        Ok(())
    }
}
