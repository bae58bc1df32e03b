// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use super::*;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Records {
    views: BTreeMap<ViewId, ViewDefinition>,
    next_id: u64,
}

/// A [`ViewStore`] held in process memory.
#[derive(Debug, Default)]
pub struct MemoryViewStore {
    records: RwLock<Records>,
}

impl MemoryViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.views.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ViewStore for MemoryViewStore {
    async fn get(&self, id: ViewId) -> Result<Option<Loaded>, StoreError> {
        Ok(self.records.read().await.views.get(&id).cloned().map(Loaded::new))
    }

    async fn find(&self, view_name: &str) -> Result<Option<Loaded>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .views
            .values()
            .find(|v| v.view_name == view_name)
            .cloned()
            .map(Loaded::new))
    }

    async fn list(&self) -> Result<Vec<ViewDefinition>, StoreError> {
        let mut views: Vec<ViewDefinition> = self.records.read().await.views.values().cloned().collect();
        views.sort_by(listing_order);
        Ok(views)
    }

    async fn persist(&self, definition: &mut ViewDefinition) -> Result<ViewId, StoreError> {
        let mut records = self.records.write().await;
        if records
            .views
            .values()
            .any(|v| v.view_name == definition.view_name && v.id != definition.id)
        {
            return Err(StoreError::DuplicateName(definition.view_name.clone()));
        }
        let id = match definition.id {
            Some(id) => {
                if !records.views.contains_key(&id) {
                    return Err(StoreError::NotFound(id));
                }
                id
            }
            None => {
                records.next_id += 1;
                let id = ViewId::from(records.next_id);
                definition.id = Some(id);
                id
            }
        };
        records.views.insert(id, definition.clone());
        Ok(id)
    }

    async fn remove(&self, id: ViewId) -> Result<Option<ViewDefinition>, StoreError> {
        Ok(self.records.write().await.views.remove(&id))
    }
}
