// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Persistence of view definitions.

use crate::view::{
    Loaded,
    ViewDefinition,
    ViewId,
};
use async_trait::async_trait;
use std::cmp::Ordering;
use thiserror::Error;

mod memory;
pub use memory::*;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("A view named `{0}` already exists")]
    DuplicateName(String),
    #[error("No view with id {0}")]
    NotFound(ViewId),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait ViewStore: Send + Sync {
    /// Load a definition together with the snapshot later saves are compared against.
    async fn get(&self, id: ViewId) -> Result<Option<Loaded>, StoreError>;

    async fn find(&self, view_name: &str) -> Result<Option<Loaded>, StoreError>;

    /// Every definition, most recently refreshed first.
    async fn list(&self) -> Result<Vec<ViewDefinition>, StoreError>;

    /// Insert or update, assigning an id on first persist. View names are unique.
    async fn persist(&self, definition: &mut ViewDefinition) -> Result<ViewId, StoreError>;

    async fn remove(&self, id: ViewId) -> Result<Option<ViewDefinition>, StoreError>;
}

/// Listing order: `last_refreshed_at` then `created_at`, both descending, unset values first.
pub fn listing_order(a: &ViewDefinition, b: &ViewDefinition) -> Ordering {
    fn desc<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => b.cmp(a),
        }
    }
    desc(&a.last_refreshed_at, &b.last_refreshed_at).then_with(|| desc(&a.created_at, &b.created_at))
}
