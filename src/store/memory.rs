use crate::core::repository::{Record, RecordId, Repository};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

struct Collection<T> {
    records: BTreeMap<RecordId, T>,
    last_id: RecordId,
}

/// In-memory repository backed by a BTreeMap. Ids start at 1 and are never
/// reused, even after a delete.
pub struct MemoryRepository<T: Record> {
    inner: Arc<Mutex<Collection<T>>>,
}

impl<T: Record> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Collection {
                records: BTreeMap::new(),
                last_id: 0,
            })),
        }
    }
}

impl<T: Record> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> Repository<T> for MemoryRepository<T> {
    async fn list(&self) -> Result<Vec<T>> {
        let collection = self.inner.lock().await;
        Ok(collection.records.values().cloned().collect())
    }

    async fn get(&self, id: RecordId) -> Result<Option<T>> {
        let collection = self.inner.lock().await;
        let record = collection.records.get(&id).cloned();
        if record.is_some() {
            debug!("{} HIT for id: {}", T::KIND, id);
        } else {
            debug!("{} MISS for id: {}", T::KIND, id);
        }
        Ok(record)
    }

    async fn create(&self, new: T::New) -> Result<T> {
        T::validate(&new)?;
        let mut collection = self.inner.lock().await;
        collection.last_id += 1;
        let record = T::from_new(collection.last_id, new);
        collection.records.insert(record.id(), record.clone());
        debug!("{} CREATE for id: {}", T::KIND, record.id());
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: T::Patch) -> Result<Option<T>> {
        let mut collection = self.inner.lock().await;
        let Some(record) = collection.records.get_mut(&id) else {
            debug!("{} UPDATE MISS for id: {}", T::KIND, id);
            return Ok(None);
        };
        record.apply(patch);
        debug!("{} UPDATE for id: {}", T::KIND, id);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        let mut collection = self.inner.lock().await;
        let removed = collection.records.remove(&id).is_some();
        debug!("{} DELETE for id: {} (removed: {})", T::KIND, id, removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::supplier::{NewSupplier, Supplier, SupplierPatch};

    fn new_supplier(name: &str) -> NewSupplier {
        serde_json::from_value(serde_json::json!({ "name": name })).unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = MemoryRepository::<Supplier>::new();

        let first = repo.create(new_supplier("Alpha")).await.unwrap();
        let second = repo.create(new_supplier("Beta")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_record() {
        let repo = MemoryRepository::<Supplier>::new();
        assert!(repo.get(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let repo = MemoryRepository::<Supplier>::new();
        let supplier = repo.create(new_supplier("Alpha")).await.unwrap();

        let patch = SupplierPatch {
            email: Some("sales@alpha.example".to_string()),
            is_active: Some(false),
            ..Default::default()
        };
        let updated = repo.update(supplier.id, patch).await.unwrap().unwrap();

        assert_eq!(updated.name, "Alpha");
        assert_eq!(updated.email.as_deref(), Some("sales@alpha.example"));
        assert!(!updated.is_active);
        assert_eq!(repo.get(supplier.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let repo = MemoryRepository::<Supplier>::new();
        let result = repo.update(9, SupplierPatch::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_does_not_reuse_ids() {
        let repo = MemoryRepository::<Supplier>::new();
        let first = repo.create(new_supplier("Alpha")).await.unwrap();

        assert!(repo.delete(first.id).await.unwrap());
        assert!(!repo.delete(first.id).await.unwrap());

        let second = repo.create(new_supplier("Beta")).await.unwrap();
        assert_eq!(second.id, 2);
        assert_eq!(repo.list().await.unwrap(), vec![second]);
    }
}
