// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use super::*;

/// The catalog object kind behind a managed view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    View,
    MaterializedView,
}

impl ViewKind {
    pub fn from_materialized(materialized: bool) -> Self {
        if materialized {
            Self::MaterializedView
        } else {
            Self::View
        }
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self, Self::MaterializedView)
    }

    /// Both kinds, in the order drops are attempted.
    pub fn all() -> [ViewKind; 2] {
        [Self::View, Self::MaterializedView]
    }
}

impl Display for ViewKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::View => write!(f, "VIEW"),
            Self::MaterializedView => write!(f, "MATERIALIZED VIEW"),
        }
    }
}

impl Default for ViewKind {
    fn default() -> Self {
        Self::View
    }
}

#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct CreateViewStatement {
    #[builder(default)]
    pub kind: ViewKind,
    #[builder(setter(into))]
    pub name: QualifiedName,
    /// The defining query, with every parameter already rendered as a literal
    #[builder(setter(into))]
    pub query: String,
}

impl CreateViewStatement {
    pub fn new(kind: ViewKind, name: impl Into<QualifiedName>, query: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            query: query.into(),
        }
    }
}

impl CreateViewStatementBuilder {
    /// Create a MATERIALIZED VIEW instead of a plain one.
    pub fn materialized(&mut self) -> &mut Self {
        self.kind.replace(ViewKind::MaterializedView);
        self
    }
}

impl Display for CreateViewStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CREATE {} {} AS {}", self.kind, self.name, self.query.trim())
    }
}

#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct DropViewStatement {
    #[builder(default)]
    pub kind: ViewKind,
    #[builder(setter(name = "set_if_exists"), default)]
    pub if_exists: bool,
    #[builder(setter(into))]
    pub name: QualifiedName,
}

impl DropViewStatement {
    /// `DROP <kind> IF EXISTS <name>`
    pub fn if_exists(kind: ViewKind, name: impl Into<QualifiedName>) -> Self {
        Self {
            kind,
            if_exists: true,
            name: name.into(),
        }
    }
}

impl DropViewStatementBuilder {
    /// Set IF EXISTS on the statement.
    /// To undo this, use `set_if_exists(false)`.
    pub fn if_exists(&mut self) -> &mut Self {
        self.if_exists.replace(true);
        self
    }
}

impl Display for DropViewStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DROP {}{} {}",
            self.kind,
            if self.if_exists { " IF EXISTS" } else { "" },
            self.name
        )
    }
}

#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct RefreshMaterializedViewStatement {
    #[builder(default = "true")]
    pub concurrently: bool,
    #[builder(setter(into))]
    pub name: QualifiedName,
}

impl RefreshMaterializedViewStatement {
    /// `REFRESH MATERIALIZED VIEW CONCURRENTLY <name>`, which needs a unique index on the view.
    pub fn concurrently(name: impl Into<QualifiedName>) -> Self {
        Self {
            concurrently: true,
            name: name.into(),
        }
    }
}

impl Display for RefreshMaterializedViewStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "REFRESH MATERIALIZED VIEW{} {}",
            if self.concurrently { " CONCURRENTLY" } else { "" },
            self.name
        )
    }
}
