// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The declarative view record and its change detection.

use crate::{
    compiler::{
        CompiledQuery,
        QueryCompiler,
    },
    executor::DEFAULT_ALIAS,
    statements::ViewKind,
};
use chrono::{
    DateTime,
    Utc,
};
use derive_builder::Builder;
use derive_more::{
    Display,
    From,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Formatter;

mod change;
pub use change::*;

/// Store-assigned identifier of a view definition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct ViewId(u64);

impl ViewId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Names the data source whose query method defines a view, e.g. `"app.model"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceRef {
    fn from(source: &str) -> Self {
        Self(source.to_string())
    }
}

fn default_alias() -> String {
    DEFAULT_ALIAS.to_string()
}

fn default_materialized() -> bool {
    true
}

/// A view whose contents are the result of calling `query_method_name` on `source`.
#[derive(Builder, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct ViewDefinition {
    #[builder(setter(strip_option), default)]
    #[serde(default)]
    pub id: Option<ViewId>,
    /// Also the literal name of the database object
    #[builder(setter(into))]
    pub view_name: String,
    #[builder(setter(into), default = "default_alias()")]
    #[serde(default = "default_alias")]
    pub connection_alias: String,
    #[builder(setter(into))]
    pub source: SourceRef,
    #[builder(setter(into), default)]
    #[serde(default)]
    pub query_method_name: String,
    /// Output columns of the query, resolved once and then kept as is.
    #[builder(default)]
    #[serde(default)]
    pub fields: Vec<String>,
    /// Columns of the unique index that allows concurrent refreshes. Materialized views only.
    #[builder(default)]
    #[serde(default)]
    pub unique_fields: Vec<String>,
    #[builder(default = "true")]
    #[serde(default = "default_materialized")]
    pub materialized: bool,
    /// Overrides the configured default owner
    #[builder(setter(into, strip_option), default)]
    #[serde(default)]
    pub owner_principal: Option<String>,
    #[builder(default)]
    #[serde(default)]
    pub read_only_principals: Vec<String>,
    #[builder(setter(into, strip_option), default)]
    #[serde(default)]
    pub description: Option<String>,
    #[builder(setter(strip_option), default)]
    #[serde(default)]
    pub last_refreshed_at: Option<DateTime<Utc>>,
    #[builder(setter(strip_option), default)]
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ViewDefinitionBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.view_name {
            Some(name) if name.trim().is_empty() => Err("view_name must not be blank".to_string()),
            _ => Ok(()),
        }
    }
}

impl ViewDefinition {
    pub fn kind(&self) -> ViewKind {
        ViewKind::from_materialized(self.materialized)
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    /// The values change detection compares across a save.
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            view_name: self.view_name.clone(),
            materialized: self.materialized,
            connection_alias: self.connection_alias.clone(),
        }
    }

    /// Fill a blank `query_method_name` with `get_<view_name>_qs`. Returns whether it was blank.
    pub fn default_query_method_name(&mut self) -> bool {
        if !self.query_method_name.trim().is_empty() {
            return false;
        }
        self.query_method_name = format!("get_{}_qs", self.view_name);
        true
    }

    pub fn query<C: QueryCompiler + ?Sized>(&self, compiler: &C) -> Option<CompiledQuery> {
        compiler.resolve(&self.source, &self.query_method_name)
    }

    /// Cache the query's output columns in `fields`.
    ///
    /// Once `fields` is non-empty it is never recomputed, even if the query
    /// has changed shape since. Clear it to force a refresh of the list.
    pub fn resolve_fields<C: QueryCompiler + ?Sized>(&mut self, compiler: &C) -> bool {
        if !self.fields.is_empty() {
            return false;
        }
        match self.query(compiler) {
            Some(query) => {
                self.fields = query.columns;
                !self.fields.is_empty()
            }
            None => false,
        }
    }
}

impl std::fmt::Display for ViewDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} | {} | {}", self.view_name, self.query_method_name, self.source)
    }
}
