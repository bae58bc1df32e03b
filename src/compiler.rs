// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Resolution of a `(source, method)` pair into the SQL that defines a view.
//!
//! Query building itself happens elsewhere. This module only provides the
//! [`QueryCompiler`] seam and [`QueryRegistry`], an explicit lookup table of
//! named query methods.

use crate::{
    statements::{
        inline_params,
        ParamError,
        SqlParam,
    },
    view::SourceRef,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

/// A parameterized SELECT produced by a query method, with its output columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
    pub columns: Vec<String>,
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Default::default()
        }
    }

    /// Bind the next `$n` value
    pub fn bind(mut self, param: impl Into<SqlParam>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// The query text with every parameter rendered as a literal.
    pub fn inline(&self) -> Result<String, ParamError> {
        inline_params(&self.sql, &self.params)
    }
}

/// Turns a source's named query method into SQL.
pub trait QueryCompiler: Send + Sync {
    /// Returns `None` when the source has no such method or the method yields no query.
    fn resolve(&self, source: &SourceRef, method: &str) -> Option<CompiledQuery>;
}

/// A data source with a closed set of query methods.
pub trait QuerySource: 'static {
    /// The reference views use to name this source
    const SOURCE: &'static str;

    fn query(method: &str) -> Option<CompiledQuery>;
}

type QueryMethod = Box<dyn Fn() -> Option<CompiledQuery> + Send + Sync>;

/// Lookup table from `(source, method)` to the function building its query.
#[derive(Default)]
pub struct QueryRegistry {
    methods: HashMap<SourceRef, HashMap<String, QueryMethod>>,
    sources: HashMap<SourceRef, fn(&str) -> Option<CompiledQuery>>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single query method on a source.
    pub fn register<F>(&mut self, source: impl Into<SourceRef>, method: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn() -> Option<CompiledQuery> + Send + Sync + 'static,
    {
        self.methods
            .entry(source.into())
            .or_default()
            .insert(method.into(), Box::new(f));
        self
    }

    /// Register every method of a [`QuerySource`]. Explicitly registered methods take precedence.
    pub fn register_source<S: QuerySource>(&mut self) -> &mut Self {
        self.sources.insert(SourceRef::from(S::SOURCE), S::query);
        self
    }

    pub fn with_method<F>(mut self, source: impl Into<SourceRef>, method: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Option<CompiledQuery> + Send + Sync + 'static,
    {
        self.register(source, method, f);
        self
    }

    pub fn with_source<S: QuerySource>(mut self) -> Self {
        self.register_source::<S>();
        self
    }

    /// Whether the source knows the method, regardless of what it yields.
    pub fn has_method(&self, source: &SourceRef, method: &str) -> bool {
        self.methods
            .get(source)
            .map(|m| m.contains_key(method))
            .unwrap_or(false)
            || self.sources.contains_key(source)
    }
}

impl std::fmt::Debug for QueryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRegistry")
            .field(
                "methods",
                &self
                    .methods
                    .iter()
                    .map(|(s, m)| (s, m.keys().collect::<Vec<_>>()))
                    .collect::<HashMap<_, _>>(),
            )
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl QueryCompiler for QueryRegistry {
    fn resolve(&self, source: &SourceRef, method: &str) -> Option<CompiledQuery> {
        let query = match self.methods.get(source).and_then(|m| m.get(method)) {
            Some(f) => f(),
            None => self.sources.get(source).and_then(|f| f(method)),
        };
        query.filter(|q| !q.is_empty())
    }
}
