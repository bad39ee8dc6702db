//! In-memory store (for tests and single-process use).

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ImageStore, StoreData, UnitFilter, UnitStore};
use crate::error::Result;
use crate::unit::{Image, Unit};

/// In-memory unit and image store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `units`.
    pub fn with_units(units: impl IntoIterator<Item = Unit>) -> Self {
        Self {
            data: RwLock::new(StoreData {
                units: units.into_iter().collect(),
                images: Vec::new(),
            }),
        }
    }
}

#[async_trait]
impl UnitStore for MemoryStore {
    async fn insert(&self, unit: Unit) -> Result<()> {
        self.data.write().await.insert(unit)
    }

    async fn find(&self, filter: &UnitFilter) -> Result<Vec<Unit>> {
        Ok(self.data.read().await.find(filter))
    }

    async fn update(&self, unit: &Unit) -> Result<()> {
        self.data.write().await.update(unit)
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.data.write().await.delete(name))
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    async fn find_image(&self, name: &str) -> Result<Option<Image>> {
        Ok(self.data.read().await.find_image(name))
    }

    async fn insert_image(&self, image: Image) -> Result<()> {
        self.data.write().await.insert_image(image);
        Ok(())
    }

    async fn delete_image(&self, name: &str) -> Result<bool> {
        Ok(self.data.write().await.delete_image(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitStatus;

    #[tokio::test]
    async fn test_find_preserves_insertion_order() {
        let store = MemoryStore::new();
        for name in ["c", "a", "b"] {
            store
                .insert(Unit {
                    name: name.to_string(),
                    app_name: "myapp".to_string(),
                    ..Unit::default()
                })
                .await
                .unwrap();
        }
        let names: Vec<String> = store
            .find(&UnitFilter::by_app("myapp"))
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::with_units([Unit {
            name: "abc".to_string(),
            app_name: "myapp".to_string(),
            ..Unit::default()
        }]);
        let mut unit = store.find(&UnitFilter::by_name("abc")).await.unwrap()[0].clone();
        unit.status = UnitStatus::Started;
        unit.ip = "10.0.0.4".to_string();
        store.update(&unit).await.unwrap();

        let found = store.find(&UnitFilter::by_name("abc")).await.unwrap();
        assert_eq!(found[0].status, UnitStatus::Started);
        assert_eq!(found[0].ip, "10.0.0.4");

        assert!(store.delete("abc").await.unwrap());
        assert!(!store.delete("abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_images() {
        let store = MemoryStore::new();
        assert!(store.find_image("myapp").await.unwrap().is_none());
        store
            .insert_image(Image {
                name: "myapp".to_string(),
            })
            .await
            .unwrap();
        assert!(store.find_image("myapp").await.unwrap().is_some());
        assert!(store.delete_image("myapp").await.unwrap());
        assert!(store.find_image("myapp").await.unwrap().is_none());
    }
}
