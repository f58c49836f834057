//! Dataset persistence
//!
//! The engine reads and writes datasets only through [`DatasetStore`]. A
//! store may persist eventually; callers must not assume a `save` is durable
//! on a remote backend by the time it returns.

pub mod json_dir;
pub mod memory;

pub use json_dir::JsonDirStore;
pub use memory::MemoryDatasetStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::Dataset;

use crate::error::StoreError;

/// Paging and filtering for [`DatasetStore::list`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    /// Case-insensitive substring match on the dataset name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    fn matches(&self, dataset: &Dataset) -> bool {
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(needle) => dataset
                .name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle.to_lowercase())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub value_count: usize,
}

impl DatasetSummary {
    fn of(dataset: &Dataset) -> Self {
        Self {
            id: dataset.id.clone().unwrap_or_default(),
            name: dataset.name.clone(),
            template_id: dataset.template_id.clone(),
            updated_at: dataset.updated_at.clone(),
            value_count: dataset.values.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetPage {
    pub items: Vec<DatasetSummary>,
    /// Matches before paging
    pub total: usize,
    pub has_more: bool,
}

/// Filter, order and page a set of datasets. Newest first, then by id.
pub fn paginate<'a>(datasets: impl IntoIterator<Item = &'a Dataset>, options: &ListOptions) -> DatasetPage {
    let mut matching: Vec<&Dataset> = datasets.into_iter().filter(|d| options.matches(d)).collect();
    matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));

    let total = matching.len();
    let limit = options.limit.unwrap_or(usize::MAX);
    let items: Vec<DatasetSummary> = matching
        .into_iter()
        .skip(options.offset)
        .take(limit)
        .map(DatasetSummary::of)
        .collect();
    let has_more = options.offset.saturating_add(items.len()) < total;

    DatasetPage { items, total, has_more }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_online: bool,
    pub pending_changes: bool,
    pub pending_count: usize,
}

/// Narrow persistence interface for datasets
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Persist a dataset, assigning an id on first save. Returns the stored copy.
    async fn save(&self, dataset: Dataset) -> Result<Dataset, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Dataset>, StoreError>;

    /// Returns whether anything was deleted
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn list(&self, options: &ListOptions) -> Result<DatasetPage, StoreError>;

    async fn sync_status(&self) -> Result<SyncStatus, StoreError>;

    /// Push pending changes to the backend, if it has one
    async fn force_sync(&self) -> Result<SyncStatus, StoreError>;
}

/// Fill in the id and timestamp a save must carry
pub(crate) fn stamp(mut dataset: Dataset) -> Dataset {
    if dataset.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
        dataset.id = Some(uuid::Uuid::new_v4().to_string());
    }
    dataset.updated_at = Some(chrono::Utc::now().to_rfc3339());
    dataset
}
