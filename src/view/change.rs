// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use super::*;

/// The persisted values of a definition as they were when it was loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub view_name: String,
    pub materialized: bool,
    pub connection_alias: String,
}

impl ViewSnapshot {
    pub fn kind(&self) -> ViewKind {
        ViewKind::from_materialized(self.materialized)
    }
}

/// A definition together with the snapshot it was loaded with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loaded {
    pub current: ViewDefinition,
    pub original: ViewSnapshot,
}

impl Loaded {
    pub fn new(current: ViewDefinition) -> Self {
        let original = current.snapshot();
        Self { current, original }
    }

    pub fn into_parts(self) -> (ViewDefinition, ViewSnapshot) {
        (self.current, self.original)
    }
}

/// A change that leaves the previously created object orphaned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewChange {
    pub previous: ViewSnapshot,
    pub renamed: bool,
    pub retyped: bool,
    pub relocated: bool,
}

impl ViewChange {
    /// Compare the loaded snapshot with the values about to be saved.
    ///
    /// A definition that was never persisted has nothing to compare against.
    pub fn detect(original: Option<&ViewSnapshot>, current: &ViewDefinition) -> Option<Self> {
        let previous = original?;
        let change = Self {
            previous: previous.clone(),
            renamed: previous.view_name != current.view_name,
            retyped: previous.materialized != current.materialized,
            relocated: previous.connection_alias != current.connection_alias,
        };
        if change.renamed || change.retyped || change.relocated {
            Some(change)
        } else {
            None
        }
    }
}
