// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use super::*;

/// The name of the unique index that backs concurrent refreshes of `view_name`.
pub fn unique_index_name(view_name: &str) -> Name {
    Name::quoted(format!("unique_{}", view_name))
}

#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct CreateIndexStatement {
    #[builder(default)]
    pub unique: bool,
    #[builder(setter(into))]
    pub name: Name,
    #[builder(setter(into))]
    pub table: QualifiedName,
    pub columns: Vec<Name>,
}

impl CreateIndexStatement {
    /// `CREATE UNIQUE INDEX unique_<view> ON <view> (<columns>)`
    pub fn unique_for_view<S: AsRef<str>>(view_name: &str, columns: &[S]) -> Self {
        Self {
            unique: true,
            name: unique_index_name(view_name),
            table: view_name.into(),
            columns: columns.iter().map(|c| Name::quoted(c.as_ref())).collect(),
        }
    }
}

impl Display for CreateIndexStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CREATE{} INDEX {} ON {} ({})",
            if self.unique { " UNIQUE" } else { "" },
            self.name,
            self.table,
            self.columns
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct DropIndexStatement {
    #[builder(setter(name = "set_if_exists"), default)]
    pub if_exists: bool,
    #[builder(setter(into))]
    pub name: Name,
}

impl DropIndexStatement {
    pub fn if_exists(name: impl Into<Name>) -> Self {
        Self {
            if_exists: true,
            name: name.into(),
        }
    }
}

impl DropIndexStatementBuilder {
    /// Set IF EXISTS on the statement.
    /// To undo this, use `set_if_exists(false)`.
    pub fn if_exists(&mut self) -> &mut Self {
        self.if_exists.replace(true);
        self
    }
}

impl Display for DropIndexStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DROP INDEX{} {}",
            if self.if_exists { " IF EXISTS" } else { "" },
            self.name
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_create_unique_index() {
        let statement = CreateIndexStatement::unique_for_view("fake_view", &["uuid", "other"]);
        assert_eq!(
            statement.to_string(),
            "CREATE UNIQUE INDEX \"unique_fake_view\" ON \"fake_view\" (\"uuid\", \"other\")"
        );
        let built = CreateIndexStatementBuilder::default()
            .unique(true)
            .name(unique_index_name("fake_view"))
            .table("fake_view")
            .columns(vec!["uuid".into(), "other".into()])
            .build()
            .unwrap();
        assert_eq!(built, statement);
    }

    #[test]
    fn test_drop_index() {
        assert_eq!(
            DropIndexStatement::if_exists(unique_index_name("fake_view")).to_string(),
            "DROP INDEX IF EXISTS \"unique_fake_view\""
        );
        let statement = DropIndexStatementBuilder::default()
            .name("some_index")
            .build()
            .unwrap();
        assert_eq!(statement.to_string(), "DROP INDEX \"some_index\"");
    }
}
