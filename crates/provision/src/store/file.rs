//! File-based store implementation.
//!
//! Units and images live in one JSON document. Every operation is a
//! read-modify-write under a process-local lock.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use super::{ImageStore, StoreData, UnitFilter, UnitStore};
use crate::error::{Error, Result};
use crate::unit::{Image, Unit};

/// JSON-file backed unit and image store.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty store.
    async fn read(&self) -> Result<StoreData> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| Error::Parse {
                what: self.path.display().to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreData::default()),
            Err(e) => Err(Error::Storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write(&self, data: &StoreData) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(data).map_err(|e| {
            Error::Storage(format!("failed to serialize store: {e}"))
        })?;
        fs::write(&self.path, content).await.map_err(|e| {
            Error::Storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }

    async fn modify<T: Send>(
        &self,
        f: impl FnOnce(&mut StoreData) -> Result<T> + Send,
    ) -> Result<T> {
        let _guard = self.lock.lock().await;
        let mut data = self.read().await?;
        let result = f(&mut data)?;
        self.write(&data).await?;
        Ok(result)
    }
}

#[async_trait]
impl UnitStore for FileStore {
    async fn insert(&self, unit: Unit) -> Result<()> {
        self.modify(|data| data.insert(unit)).await
    }

    async fn find(&self, filter: &UnitFilter) -> Result<Vec<Unit>> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.find(filter))
    }

    async fn update(&self, unit: &Unit) -> Result<()> {
        self.modify(|data| data.update(unit)).await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        self.modify(|data| Ok(data.delete(name))).await
    }
}

#[async_trait]
impl ImageStore for FileStore {
    async fn find_image(&self, name: &str) -> Result<Option<Image>> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.find_image(name))
    }

    async fn insert_image(&self, image: Image) -> Result<()> {
        self.modify(|data| {
            data.insert_image(image);
            Ok(())
        })
        .await
    }

    async fn delete_image(&self, name: &str) -> Result<bool> {
        self.modify(|data| Ok(data.delete_image(name))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitStatus;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("units.json"));
        assert!(store.find(&UnitFilter::all()).await.unwrap().is_empty());
        assert!(store.find_image("myapp").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("units.json");

        let store = FileStore::new(&path);
        store
            .insert(Unit {
                name: "abc".to_string(),
                app_name: "myapp".to_string(),
                unit_type: "python".to_string(),
                status: UnitStatus::Started,
                ..Unit::default()
            })
            .await
            .unwrap();
        store
            .insert_image(Image {
                name: "myapp".to_string(),
            })
            .await
            .unwrap();

        let reopened = FileStore::new(&path);
        let units = reopened.find(&UnitFilter::by_app("myapp")).await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].status, UnitStatus::Started);
        assert!(reopened.find_image("myapp").await.unwrap().is_some());

        assert!(reopened.delete("abc").await.unwrap());
        assert!(store.find(&UnitFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("units.json");
        std::fs::write(&path, "{broken").unwrap();
        let err = FileStore::new(&path)
            .find(&UnitFilter::all())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
