// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Typed PostgreSQL statements for managed views.
//!
//! Every statement renders to SQL through its `Display` impl. Identifiers are
//! carried as [`Name`]s so that quoting is decided once, when the statement is
//! built, rather than at each call site.

use derive_builder::Builder;
use derive_more::From;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::{
    Display,
    Formatter,
};

mod catalog;
pub use catalog::*;

mod index;
pub use index::*;

mod params;
pub use params::*;

mod security;
pub use security::*;

mod views;
pub use views::*;

/// The schema managed views are created in.
pub const PUBLIC_SCHEMA: &str = "public";

/// A SQL identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Name {
    Quoted(String),
    Unquoted(String),
}

impl Name {
    pub fn quoted(name: impl Into<String>) -> Self {
        Self::Quoted(name.into())
    }

    pub fn unquoted(name: impl Into<String>) -> Self {
        Self::Unquoted(name.into())
    }

    /// A role name for GRANT/OWNER clauses. `PUBLIC` is a keyword there and must stay unquoted.
    /// Any other role is quoted, so its case is kept as given.
    pub fn principal(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.eq_ignore_ascii_case("public") {
            Self::Unquoted(name.to_uppercase())
        } else {
            Self::Quoted(name)
        }
    }

    /// The raw identifier, without quotes.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Quoted(s) | Self::Unquoted(s) => s.as_str(),
        }
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quoted(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Self::Unquoted(s) => s.fmt(f),
        }
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::quoted(name)
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Self::quoted(name)
    }
}

impl From<&String> for Name {
    fn from(name: &String) -> Self {
        Self::quoted(name.as_str())
    }
}

/// A relation name, optionally qualified by its schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub schema: Option<Name>,
    pub name: Name,
}

impl QualifiedName {
    /// The name qualified by the `public` schema.
    pub fn public(name: impl Into<Name>) -> Self {
        Name::unquoted(PUBLIC_SCHEMA).dot(name)
    }

    pub fn as_str(&self) -> &str {
        self.name.as_str()
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}.{}", schema, self.name)
        } else {
            self.name.fmt(f)
        }
    }
}

impl From<Name> for QualifiedName {
    fn from(name: Name) -> Self {
        Self { schema: None, name }
    }
}

impl From<&str> for QualifiedName {
    fn from(name: &str) -> Self {
        Name::from(name).into()
    }
}

impl From<String> for QualifiedName {
    fn from(name: String) -> Self {
        Name::from(name).into()
    }
}

impl From<&String> for QualifiedName {
    fn from(name: &String) -> Self {
        Name::from(name).into()
    }
}

/// Qualify a relation name with a schema
pub trait SchemaQualifyExt {
    fn dot(self, name: impl Into<Name>) -> QualifiedName;
}

impl SchemaQualifyExt for Name {
    fn dot(self, name: impl Into<Name>) -> QualifiedName {
        QualifiedName {
            schema: Some(self),
            name: name.into(),
        }
    }
}

/// Any statement the view manager issues against a connection.
#[derive(Clone, Debug, PartialEq, From)]
pub enum Statement {
    CreateView(CreateViewStatement),
    DropView(DropViewStatement),
    RefreshMaterializedView(RefreshMaterializedViewStatement),
    CreateIndex(CreateIndexStatement),
    DropIndex(DropIndexStatement),
    AlterOwner(AlterOwnerStatement),
    Grant(GrantStatement),
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateView(stmt) => stmt.fmt(f),
            Self::DropView(stmt) => stmt.fmt(f),
            Self::RefreshMaterializedView(stmt) => stmt.fmt(f),
            Self::CreateIndex(stmt) => stmt.fmt(f),
            Self::DropIndex(stmt) => stmt.fmt(f),
            Self::AlterOwner(stmt) => stmt.fmt(f),
            Self::Grant(stmt) => stmt.fmt(f),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_name_quoting() {
        assert_eq!(Name::quoted("fake_view").to_string(), "\"fake_view\"");
        assert_eq!(Name::quoted("odd\"name").to_string(), "\"odd\"\"name\"");
        assert_eq!(Name::unquoted("public").to_string(), "public");
        assert_eq!(Name::quoted("odd\"name").as_str(), "odd\"name");
    }

    #[test]
    fn test_principal() {
        assert_eq!(Name::principal("public").to_string(), "PUBLIC");
        assert_eq!(Name::principal("reporting").to_string(), "\"reporting\"");
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(QualifiedName::public("fake_view").to_string(), "public.\"fake_view\"");
        assert_eq!(QualifiedName::from("fake_view").to_string(), "\"fake_view\"");
        assert_eq!(QualifiedName::public("fake_view").as_str(), "fake_view");
    }
}
