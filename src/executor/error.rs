// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Classification of database failures.

use thiserror::Error;

// SQLSTATE codes as consts
/// The SQLSTATE of `undefined_table`.
pub const UNDEFINED_TABLE: &str = "42P01";
/// The SQLSTATE of `undefined_object`.
pub const UNDEFINED_OBJECT: &str = "42704";
/// The SQLSTATE of `wrong_object_type`, raised e.g. by DROP VIEW on a materialized view.
pub const WRONG_OBJECT_TYPE: &str = "42809";
/// The SQLSTATE of `undefined_column`.
pub const UNDEFINED_COLUMN: &str = "42703";
/// The SQLSTATE of `duplicate_table`.
pub const DUPLICATE_TABLE: &str = "42P07";
/// The SQLSTATE of `insufficient_privilege`.
pub const INSUFFICIENT_PRIVILEGE: &str = "42501";
/// The SQLSTATE of `object_not_in_prerequisite_state`, raised by a concurrent refresh without a unique index.
pub const OBJECT_NOT_IN_PREREQUISITE_STATE: &str = "55000";

/// SQLSTATE classes treated as operational failures.
const OPERATIONAL_CLASSES: &[&str] = &["08", "40", "53", "55", "57", "58"];

/// How a caller should treat a failed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The target object does not exist or is of another kind
    DoesNotExist,
    /// The database could not carry the statement out in its current state
    Operational,
    Other,
}

impl ErrorClass {
    pub fn of_sqlstate(code: &str) -> Self {
        match code {
            UNDEFINED_TABLE | UNDEFINED_OBJECT | WRONG_OBJECT_TYPE => Self::DoesNotExist,
            code if OPERATIONAL_CLASSES.iter().any(|class| code.starts_with(class)) => Self::Operational,
            _ => Self::Other,
        }
    }
}

#[derive(Error, Debug)]
pub enum ExecuteError {
    /// An error reported by the database server
    #[error("{message} (SQLSTATE {code})")]
    Database { code: String, message: String },
    /// The connection could not be used
    #[error("Connection failure: {0}")]
    Connection(String),
    #[error("No connection registered under alias `{0}`")]
    UnknownConnection(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExecuteError {
    pub fn database(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The SQLSTATE, for errors reported by the server.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Database { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Database { code, .. } => ErrorClass::of_sqlstate(code),
            Self::Connection(_) => ErrorClass::Operational,
            Self::UnknownConnection(_) | Self::Other(_) => ErrorClass::Other,
        }
    }

    pub fn is_does_not_exist(&self) -> bool {
        self.class() == ErrorClass::DoesNotExist
    }

    pub fn is_operational(&self) -> bool {
        self.class() == ErrorClass::Operational
    }
}
