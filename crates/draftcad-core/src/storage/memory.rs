//! In-memory storage implementation.

use super::{Storage, StorageError, StorageResult, deserialize, serialize};
use crate::scene::Scene;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
///
/// Drafts are kept in their serialized form so a load goes through the
/// same repair path as a file.
#[derive(Default)]
pub struct MemoryStorage {
    drafts: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {e}"))
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, scene: &Scene) -> StorageResult<()> {
        let bytes = serialize(scene)?;
        let mut drafts = self.drafts.write().map_err(lock_error)?;
        drafts.insert(id.to_string(), bytes);
        Ok(())
    }

    fn load(&self, id: &str) -> StorageResult<Scene> {
        let drafts = self.drafts.read().map_err(lock_error)?;
        let bytes = drafts
            .get(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        deserialize(bytes)
    }

    fn delete(&self, id: &str) -> StorageResult<()> {
        let mut drafts = self.drafts.write().map_err(lock_error)?;
        drafts.remove(id);
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        let drafts = self.drafts.read().map_err(lock_error)?;
        let mut ids: Vec<String> = drafts.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, id: &str) -> StorageResult<bool> {
        let drafts = self.drafts.read().map_err(lock_error)?;
        Ok(drafts.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let scene = Scene::new();

        storage.save("test", &scene).unwrap();
        let loaded = storage.load("test").unwrap();

        assert_eq!(scene.id, loaded.id);
        assert_eq!(scene, loaded);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = storage.load("nonexistent");

        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists() {
        let storage = MemoryStorage::new();

        assert!(!storage.exists("test").unwrap());
        storage.save("test", &Scene::new()).unwrap();
        assert!(storage.exists("test").unwrap());
    }

    #[test]
    fn test_delete() {
        let storage = MemoryStorage::new();

        storage.save("test", &Scene::new()).unwrap();
        storage.delete("test").unwrap();
        assert!(!storage.exists("test").unwrap());
        // Deleting again is fine.
        storage.delete("test").unwrap();
    }

    #[test]
    fn test_list() {
        let storage = MemoryStorage::new();
        let scene = Scene::new();

        storage.save("doc2", &scene).unwrap();
        storage.save("doc1", &scene).unwrap();

        assert_eq!(storage.list().unwrap(), vec!["doc1".to_string(), "doc2".to_string()]);
    }
}
