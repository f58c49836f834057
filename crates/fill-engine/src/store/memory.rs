//! In-process dataset store

use async_trait::async_trait;
use shared_types::Dataset;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{paginate, stamp, DatasetPage, DatasetStore, ListOptions, SyncStatus};
use crate::error::StoreError;

/// Always online, never has pending changes
#[derive(Debug, Default)]
pub struct MemoryDatasetStore {
    datasets: RwLock<HashMap<String, Dataset>>,
}

impl MemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.datasets.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DatasetStore for MemoryDatasetStore {
    async fn save(&self, dataset: Dataset) -> Result<Dataset, StoreError> {
        let dataset = stamp(dataset);
        let id = dataset.id.clone().unwrap_or_default();
        self.datasets
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(id.clone(), dataset.clone());
        tracing::debug!(dataset_id = %id, "Dataset saved");
        Ok(dataset)
    }

    async fn get(&self, id: &str) -> Result<Option<Dataset>, StoreError> {
        Ok(self
            .datasets
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(id)
            .cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self
            .datasets
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(id)
            .is_some())
    }

    async fn list(&self, options: &ListOptions) -> Result<DatasetPage, StoreError> {
        let datasets = self.datasets.read().unwrap_or_else(|p| p.into_inner());
        Ok(paginate(datasets.values(), options))
    }

    async fn sync_status(&self) -> Result<SyncStatus, StoreError> {
        Ok(SyncStatus {
            is_online: true,
            pending_changes: false,
            pending_count: 0,
        })
    }

    async fn force_sync(&self) -> Result<SyncStatus, StoreError> {
        self.sync_status().await
    }
}
