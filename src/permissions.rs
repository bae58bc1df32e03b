// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Ownership and grants applied to every created view.

use crate::{
    config::ViewsConfig,
    statements::{
        AlterOwnerStatement,
        GrantStatement,
        Name,
        Privilege,
        QualifiedName,
        Statement,
    },
    view::ViewDefinition,
};

/// The ordered statements that hand `view_name` to `owner` and let each read-only
/// principal select from it. Principals are used in the given order, duplicates included.
///
/// Role names are quoted and therefore case-sensitive: `Reporting` names the role
/// created as `"Reporting"`, not `reporting`. Roles created without quotes are
/// stored lowercase and must be passed lowercase. `public` in any case is the
/// `PUBLIC` keyword.
pub fn permission_statements<S: AsRef<str>>(view_name: &str, owner: &str, read_only: &[S]) -> Vec<Statement> {
    let table = QualifiedName::public(view_name);
    let mut statements = Vec::with_capacity(read_only.len() + 2);
    statements.push(
        AlterOwnerStatement {
            table: table.clone(),
            owner: Name::principal(owner),
        }
        .into(),
    );
    statements.push(
        GrantStatement {
            privilege: Privilege::All,
            table: table.clone(),
            to: Name::principal(owner),
        }
        .into(),
    );
    statements.extend(read_only.iter().map(|principal| {
        Statement::from(GrantStatement {
            privilege: Privilege::Select,
            table: table.clone(),
            to: Name::principal(principal.as_ref()),
        })
    }));
    statements
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionPolicy {
    pub default_owner: String,
    pub read_only_principals: Vec<String>,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self::from(&ViewsConfig::default())
    }
}

impl From<&ViewsConfig> for PermissionPolicy {
    fn from(config: &ViewsConfig) -> Self {
        Self {
            default_owner: config.default_owner.clone(),
            read_only_principals: config.read_only_principals.clone(),
        }
    }
}

impl PermissionPolicy {
    pub fn owner_for<'a>(&'a self, definition: &'a ViewDefinition) -> &'a str {
        definition
            .owner_principal
            .as_deref()
            .filter(|owner| !owner.trim().is_empty())
            .unwrap_or(self.default_owner.as_str())
    }

    /// Configured principals first, then the definition's own.
    pub fn read_only_for<'a>(&'a self, definition: &'a ViewDefinition) -> Vec<&'a str> {
        self.read_only_principals
            .iter()
            .chain(definition.read_only_principals.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn statements_for(&self, definition: &ViewDefinition) -> Vec<Statement> {
        permission_statements(
            &definition.view_name,
            self.owner_for(definition),
            self.read_only_for(definition).as_slice(),
        )
    }
}
