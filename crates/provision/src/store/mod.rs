//! Unit and image persistence.
//!
//! The unit store is the single source of truth for which units exist;
//! provisioner operations never cache units in memory. Writes are
//! per-record and keyed by unit name.

mod file;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::unit::{Image, Unit, UnitStatus};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Selects units by name, application and status. Empty criteria match all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFilter {
    pub name: Option<String>,
    pub app_name: Option<String>,
    pub statuses: Vec<UnitStatus>,
}

impl UnitFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_app(app_name: impl Into<String>) -> Self {
        Self {
            app_name: Some(app_name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn matches(&self, unit: &Unit) -> bool {
        self.name.as_ref().is_none_or(|n| *n == unit.name)
            && self.app_name.as_ref().is_none_or(|a| *a == unit.app_name)
            && (self.statuses.is_empty() || self.statuses.contains(&unit.status))
    }
}

/// Persistent collection of unit records.
#[async_trait]
pub trait UnitStore: Send + Sync {
    /// Insert a new record; fails if a unit with the same name exists.
    async fn insert(&self, unit: Unit) -> Result<()>;

    /// Matching units, in insertion order.
    async fn find(&self, filter: &UnitFilter) -> Result<Vec<Unit>>;

    /// Replace the record with the same name.
    async fn update(&self, unit: &Unit) -> Result<()>;

    /// Remove a record. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;
}

/// Persistent collection of image records.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn find_image(&self, name: &str) -> Result<Option<Image>>;

    async fn insert_image(&self, image: Image) -> Result<()>;

    async fn delete_image(&self, name: &str) -> Result<bool>;
}

/// Document shared by the in-memory and file-backed stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreData {
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl StoreData {
    fn insert(&mut self, unit: Unit) -> Result<()> {
        if self.units.iter().any(|u| u.name == unit.name) {
            return Err(Error::Storage(format!("unit {} already exists", unit.name)));
        }
        self.units.push(unit);
        Ok(())
    }

    fn find(&self, filter: &UnitFilter) -> Vec<Unit> {
        self.units
            .iter()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect()
    }

    fn update(&mut self, unit: &Unit) -> Result<()> {
        let existing = self
            .units
            .iter_mut()
            .find(|u| u.name == unit.name)
            .ok_or_else(|| Error::NotFound(format!("unit {}", unit.name)))?;
        *existing = unit.clone();
        Ok(())
    }

    fn delete(&mut self, name: &str) -> bool {
        let before = self.units.len();
        self.units.retain(|u| u.name != name);
        self.units.len() != before
    }

    fn find_image(&self, name: &str) -> Option<Image> {
        self.images.iter().find(|i| i.name == name).cloned()
    }

    fn insert_image(&mut self, image: Image) {
        if !self.images.iter().any(|i| i.name == image.name) {
            self.images.push(image);
        }
    }

    fn delete_image(&mut self, name: &str) -> bool {
        let before = self.images.len();
        self.images.retain(|i| i.name != name);
        self.images.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str, app: &str, status: UnitStatus) -> Unit {
        Unit {
            name: name.to_string(),
            app_name: app.to_string(),
            unit_type: "python".to_string(),
            status,
            ..Unit::default()
        }
    }

    #[test]
    fn test_filter_matching() {
        let u = unit("abc", "myapp", UnitStatus::Down);
        assert!(UnitFilter::all().matches(&u));
        assert!(UnitFilter::by_name("abc").matches(&u));
        assert!(!UnitFilter::by_name("abd").matches(&u));
        assert!(UnitFilter::by_app("myapp").matches(&u));
        assert!(UnitFilter::all()
            .with_status(UnitStatus::Down)
            .with_status(UnitStatus::Error)
            .matches(&u));
        assert!(!UnitFilter::by_app("myapp")
            .with_status(UnitStatus::Started)
            .matches(&u));
    }

    #[test]
    fn test_insert_rejects_duplicate_names() {
        let mut data = StoreData::default();
        data.insert(unit("abc", "myapp", UnitStatus::Creating))
            .unwrap();
        let err = data
            .insert(unit("abc", "other", UnitStatus::Creating))
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(data.units.len(), 1);
    }

    #[test]
    fn test_update_missing_unit_is_not_found() {
        let mut data = StoreData::default();
        let err = data
            .update(&unit("ghost", "myapp", UnitStatus::Started))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
