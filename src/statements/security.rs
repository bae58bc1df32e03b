// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Privilege {
    All,
    Select,
}

impl Display for Privilege {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "ALL"),
            Self::Select => write!(f, "SELECT"),
        }
    }
}

#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[builder(setter(into))]
pub struct AlterOwnerStatement {
    pub table: QualifiedName,
    pub owner: Name,
}

impl Display for AlterOwnerStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ALTER TABLE {} OWNER TO {}", self.table, self.owner)
    }
}

#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[builder(setter(into))]
pub struct GrantStatement {
    pub privilege: Privilege,
    pub table: QualifiedName,
    pub to: Name,
}

impl Display for GrantStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GRANT {} ON TABLE {} TO {}", self.privilege, self.table, self.to)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_alter_owner() {
        let statement = AlterOwnerStatementBuilder::default()
            .table(QualifiedName::public("fake_view"))
            .owner(Name::principal("postgres"))
            .build()
            .unwrap();
        assert_eq!(
            statement.to_string(),
            "ALTER TABLE public.\"fake_view\" OWNER TO \"postgres\""
        );
    }

    #[test]
    fn test_grant() {
        let statement = GrantStatementBuilder::default()
            .privilege(Privilege::Select)
            .table(QualifiedName::public("fake_view"))
            .to(Name::principal("public"))
            .build()
            .unwrap();
        assert_eq!(statement.to_string(), "GRANT SELECT ON TABLE public.\"fake_view\" TO PUBLIC");
    }
}
