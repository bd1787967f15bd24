//! Persistent group → VLAN ID mappings.
//!
//! The store is independent of the live bridge state: an entry can exist
//! for a group whose bridge has not been created yet.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vlan_hal_types::{GroupName, VlanId};

use crate::error::{HalResult, VlanHalError};

/// Storage for VLAN config entries.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Inserts or replaces the entry for `group`.
    async fn insert(&mut self, group: &GroupName, vlan_id: VlanId) -> HalResult<()>;

    /// Removes the entry for `group`, returning the old VLAN ID.
    async fn remove(&mut self, group: &GroupName) -> HalResult<Option<VlanId>>;

    /// Looks up the VLAN ID for `group`.
    async fn get(&mut self, group: &GroupName) -> HalResult<Option<VlanId>>;

    /// All entries, ordered by group name.
    async fn entries(&mut self) -> HalResult<Vec<(GroupName, VlanId)>>;
}

/// Store that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    entries: BTreeMap<GroupName, VlanId>,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn insert(&mut self, group: &GroupName, vlan_id: VlanId) -> HalResult<()> {
        self.entries.insert(group.clone(), vlan_id);
        Ok(())
    }

    async fn remove(&mut self, group: &GroupName) -> HalResult<Option<VlanId>> {
        Ok(self.entries.remove(group))
    }

    async fn get(&mut self, group: &GroupName) -> HalResult<Option<VlanId>> {
        Ok(self.entries.get(group).copied())
    }

    async fn entries(&mut self) -> HalResult<Vec<(GroupName, VlanId)>> {
        Ok(self.entries.iter().map(|(g, v)| (g.clone(), *v)).collect())
    }
}

/// On-disk layout of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    vlans: BTreeMap<GroupName, VlanId>,
}

/// Store persisted as a JSON document.
///
/// The file is read on first access and rewritten after every mutation by
/// writing a sibling temp file and renaming it over the original. A mutation
/// only reaches the cache once the file has been replaced.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    cache: Option<BTreeMap<GroupName, VlanId>>,
}

impl FileConfigStore {
    /// Creates a store backed by `path`. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: None,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&mut self) -> HalResult<&mut BTreeMap<GroupName, VlanId>> {
        if self.cache.is_none() {
            let doc = match tokio::fs::read(&self.path).await {
                Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => StoreDocument::default(),
                Ok(bytes) => serde_json::from_slice::<StoreDocument>(&bytes).map_err(|e| {
                    VlanHalError::store(format!("failed to parse {}: {}", self.path.display(), e))
                })?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("VLAN config store {} not present yet", self.path.display());
                    StoreDocument::default()
                }
                Err(e) => {
                    return Err(VlanHalError::store(format!(
                        "failed to read {}: {}",
                        self.path.display(),
                        e
                    )))
                }
            };
            info!(
                "Loaded {} VLAN config entries from {}",
                doc.vlans.len(),
                self.path.display()
            );
            self.cache = Some(doc.vlans);
        }
        Ok(self.cache.get_or_insert_with(BTreeMap::new))
    }

    async fn persist(&self, vlans: BTreeMap<GroupName, VlanId>) -> HalResult<()> {
        let doc = StoreDocument { vlans };
        let json = serde_json::to_vec_pretty(&doc)
            .map_err(|e| VlanHalError::store(format!("failed to serialize entries: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &json).await.map_err(|e| {
            VlanHalError::store(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            VlanHalError::store(format!("failed to replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn insert(&mut self, group: &GroupName, vlan_id: VlanId) -> HalResult<()> {
        let mut staged = self.load().await?.clone();
        if staged.insert(group.clone(), vlan_id) != Some(vlan_id) {
            self.persist(staged.clone()).await?;
            self.cache = Some(staged);
        }
        Ok(())
    }

    async fn remove(&mut self, group: &GroupName) -> HalResult<Option<VlanId>> {
        let mut staged = self.load().await?.clone();
        let removed = staged.remove(group);
        if removed.is_some() {
            self.persist(staged.clone()).await?;
            self.cache = Some(staged);
        }
        Ok(removed)
    }

    async fn get(&mut self, group: &GroupName) -> HalResult<Option<VlanId>> {
        Ok(self.load().await?.get(group).copied())
    }

    async fn entries(&mut self) -> HalResult<Vec<(GroupName, VlanId)>> {
        Ok(self
            .load()
            .await?
            .iter()
            .map(|(g, v)| (g.clone(), *v))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn group(name: &str) -> GroupName {
        GroupName::new(name).unwrap()
    }

    fn vlan(id: u16) -> VlanId {
        VlanId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_memory_store() {
        let mut store = MemoryConfigStore::new();
        store.insert(&group("brlan0"), vlan(100)).await.unwrap();
        store.insert(&group("brlan0"), vlan(200)).await.unwrap();

        assert_eq!(store.get(&group("brlan0")).await.unwrap(), Some(vlan(200)));
        assert_eq!(store.remove(&group("brlan0")).await.unwrap(), Some(vlan(200)));
        assert_eq!(store.remove(&group("brlan0")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nvram").join("vlan_config.json");

        let mut store = FileConfigStore::new(&path);
        store.insert(&group("brlan1"), vlan(101)).await.unwrap();
        store.insert(&group("brlan0"), vlan(100)).await.unwrap();

        let mut reopened = FileConfigStore::new(&path);
        assert_eq!(
            reopened.entries().await.unwrap(),
            vec![(group("brlan0"), vlan(100)), (group("brlan1"), vlan(101))]
        );

        reopened.remove(&group("brlan1")).await.unwrap();
        let mut third = FileConfigStore::new(&path);
        assert_eq!(third.get(&group("brlan1")).await.unwrap(), None);
        assert_eq!(third.get(&group("brlan0")).await.unwrap(), Some(vlan(100)));
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = FileConfigStore::new(dir.path().join("absent.json"));
        assert!(store.entries().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_file_store_document_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vlan.json");
        let mut store = FileConfigStore::new(&path);
        store.insert(&group("brlan0"), vlan(100)).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["vlans"]["brlan0"], 100);
        assert!(!dir.path().join("vlan.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_failed_write_leaves_entries_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vlan.json");
        let mut store = FileConfigStore::new(&path);
        store.insert(&group("brlan1"), vlan(101)).await.unwrap();

        // A directory in place of the temp file makes every write fail.
        std::fs::create_dir(dir.path().join("vlan.json.tmp")).unwrap();

        assert!(matches!(
            store.insert(&group("brlan0"), vlan(100)).await,
            Err(VlanHalError::Store { .. })
        ));
        assert_eq!(store.get(&group("brlan0")).await.unwrap(), None);

        assert!(store.remove(&group("brlan1")).await.is_err());
        assert_eq!(store.get(&group("brlan1")).await.unwrap(), Some(vlan(101)));

        let mut reopened = FileConfigStore::new(&path);
        assert_eq!(
            reopened.entries().await.unwrap(),
            store.entries().await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vlan.json");
        std::fs::write(&path, r#"{"vlans": {"brlan0": 4095}}"#).unwrap();

        let mut store = FileConfigStore::new(&path);
        assert!(matches!(
            store.get(&group("brlan0")).await,
            Err(VlanHalError::Store { .. })
        ));
    }
}
