// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use super::*;

const MATVIEW_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM pg_matviews WHERE matviewname = $1)";
const VIEW_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM pg_views WHERE viewname = $1)";

/// Catalog probe for a view of a given kind. The name is bound as `$1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewExistsQuery {
    pub kind: ViewKind,
    pub name: String,
}

impl ViewExistsQuery {
    pub fn new(name: impl Into<String>, kind: ViewKind) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn sql(&self) -> &'static str {
        match self.kind {
            ViewKind::View => VIEW_EXISTS,
            ViewKind::MaterializedView => MATVIEW_EXISTS,
        }
    }
}

impl Display for ViewExistsQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.sql().fmt(f)
    }
}
