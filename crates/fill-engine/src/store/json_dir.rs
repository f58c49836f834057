//! Dataset store backed by a directory of JSON files

use async_trait::async_trait;
use shared_types::Dataset;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{paginate, stamp, DatasetPage, DatasetStore, ListOptions, SyncStatus};
use crate::error::StoreError;

/// One `<id>.json` file per dataset
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        // ids become file names; keep them inside the root
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(self.root.join(format!("{}.json", id)))
    }

    async fn read_all(&self) -> Result<Vec<Dataset>, StoreError> {
        let mut datasets = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<Dataset>(&bytes) {
                Ok(dataset) => datasets.push(dataset),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable dataset file");
                }
            }
        }
        Ok(datasets)
    }
}

#[async_trait]
impl DatasetStore for JsonDirStore {
    async fn save(&self, dataset: Dataset) -> Result<Dataset, StoreError> {
        let dataset = stamp(dataset);
        let id = dataset.id.clone().unwrap_or_default();
        let path = self.path_for(&id)?;

        // write then rename so readers never see a half-written file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&dataset)?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(dataset_id = %id, path = %path.display(), "Dataset saved");
        Ok(dataset)
    }

    async fn get(&self, id: &str) -> Result<Option<Dataset>, StoreError> {
        let Ok(path) = self.path_for(id) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let Ok(path) = self.path_for(id) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, options: &ListOptions) -> Result<DatasetPage, StoreError> {
        let datasets = self.read_all().await?;
        Ok(paginate(&datasets, options))
    }

    async fn sync_status(&self) -> Result<SyncStatus, StoreError> {
        let is_online = tokio::fs::try_exists(&self.root).await?;
        Ok(SyncStatus {
            is_online,
            pending_changes: false,
            pending_count: 0,
        })
    }

    async fn force_sync(&self) -> Result<SyncStatus, StoreError> {
        let status = self.sync_status().await?;
        if !status.is_online {
            return Err(StoreError::Offline);
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::open(dir.path()).await.unwrap();

        let mut dataset = Dataset::new().with_value("rent", json!(1850));
        dataset.name = Some("Unit 4B".into());
        let saved = store.save(dataset).await.unwrap();
        let id = saved.id.clone().unwrap();

        assert!(dir.path().join(format!("{}.json", id)).exists());
        assert_eq!(store.get(&id).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_missing_and_hostile_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::open(dir.path()).await.unwrap();

        assert_eq!(store.get("nope").await.unwrap(), None);
        assert_eq!(store.get("../etc/passwd").await.unwrap(), None);
        assert!(!store.delete("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::open(dir.path()).await.unwrap();
        store.save(Dataset::new()).await.unwrap();
        store.save(Dataset::new()).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();

        let page = store.list(&ListOptions::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(store.force_sync().await.unwrap().is_online);
    }
}
