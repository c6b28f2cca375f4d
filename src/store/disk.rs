use crate::core::repository::{Record, RecordId, Repository};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Partition holding the last id handed out for every record kind.
const SEQUENCES_PARTITION: &str = "sequences";

/// Repository persisted in a fjall partition. Keys are big-endian ids so
/// iteration order matches id order; values are JSON.
pub struct DiskRepository<T: Record> {
    keyspace: Arc<Keyspace>,
    partition: PartitionHandle,
    sequences: PartitionHandle,
    // Serialises id assignment.
    write_lock: Mutex<()>,
    _marker: PhantomData<T>,
}

impl<T: Record> DiskRepository<T> {
    pub fn new(keyspace: Arc<Keyspace>) -> Result<Self> {
        let partition = keyspace
            .open_partition(T::KIND, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open partition: {}", T::KIND))?;
        let sequences = keyspace
            .open_partition(SEQUENCES_PARTITION, PartitionCreateOptions::default())
            .context("Failed to open id sequences partition")?;

        Ok(Self {
            keyspace,
            partition,
            sequences,
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        })
    }

    fn last_id(&self) -> Result<RecordId> {
        match self.sequences.get(T::KIND)? {
            Some(bytes) => {
                let raw: [u8; 4] = bytes
                    .as_ref()
                    .try_into()
                    .with_context(|| format!("Corrupt id sequence for {}", T::KIND))?;
                Ok(RecordId::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    fn read(&self, id: RecordId) -> Result<Option<T>> {
        match self.partition.get(id.to_be_bytes())? {
            Some(value) => {
                let record = serde_json::from_slice(&value)
                    .with_context(|| format!("Failed to decode {} {}", T::LABEL, id))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn write(&self, record: &T) -> Result<()> {
        self.partition
            .insert(record.id().to_be_bytes().to_vec(), serde_json::to_vec(record)?)?;
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist keyspace")
    }
}

#[async_trait]
impl<T: Record> Repository<T> for DiskRepository<T> {
    async fn list(&self) -> Result<Vec<T>> {
        let mut records = Vec::new();
        for item in self.partition.iter() {
            let (_, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }

    async fn get(&self, id: RecordId) -> Result<Option<T>> {
        let record = self.read(id)?;
        if record.is_some() {
            debug!("{} HIT for id: {}", T::KIND, id);
        } else {
            debug!("{} MISS for id: {}", T::KIND, id);
        }
        Ok(record)
    }

    async fn create(&self, new: T::New) -> Result<T> {
        T::validate(&new)?;
        let _guard = self.write_lock.lock().await;
        let id = self.last_id()? + 1;
        let record = T::from_new(id, new);

        // Record and sequence land together or not at all
        let mut batch = self.keyspace.batch();
        batch.insert(
            &self.partition,
            id.to_be_bytes().to_vec(),
            serde_json::to_vec(&record)?,
        );
        batch.insert(&self.sequences, T::KIND.as_bytes(), id.to_be_bytes().to_vec());
        batch
            .commit()
            .with_context(|| format!("Failed to store {} {}", T::LABEL, id))?;
        self.persist()?;
        debug!("{} CREATE for id: {}", T::KIND, id);
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: T::Patch) -> Result<Option<T>> {
        let _guard = self.write_lock.lock().await;
        let Some(mut record) = self.read(id)? else {
            debug!("{} UPDATE MISS for id: {}", T::KIND, id);
            return Ok(None);
        };

        record.apply(patch);
        self.write(&record)?;
        self.persist()?;
        debug!("{} UPDATE for id: {}", T::KIND, id);
        Ok(Some(record))
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let key = id.to_be_bytes();
        if !self.partition.contains_key(key)? {
            debug!("{} DELETE MISS for id: {}", T::KIND, id);
            return Ok(false);
        }

        self.partition.remove(key.to_vec())?;
        self.persist()?;
        debug!("{} DELETE for id: {}", T::KIND, id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::ProjectComponent;
    use crate::core::payment::{NewPayment, Payment, PaymentPatch, PaymentType};
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    fn open(path: &std::path::Path) -> DiskRepository<Payment> {
        let keyspace = Arc::new(fjall::Config::new(path).open().unwrap());
        DiskRepository::new(keyspace).unwrap()
    }

    fn new_payment(amount: i64) -> NewPayment {
        serde_json::from_value(serde_json::json!({
            "projectId": 1,
            "type": "client_payment",
            "amount": amount.to_string(),
            "description": "Installment",
            "paymentDate": "2025-02-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_disk_create_get_list() {
        let dir = tempdir().unwrap();
        let repo = open(dir.path());

        assert!(repo.get(1).await.unwrap().is_none());

        let first = repo.create(new_payment(100)).await.unwrap();
        let second = repo.create(new_payment(200)).await.unwrap();

        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(repo.get(2).await.unwrap(), Some(second.clone()));
        assert_eq!(repo.list().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_disk_update_and_delete() {
        let dir = tempdir().unwrap();
        let repo = open(dir.path());
        let payment = repo.create(new_payment(100)).await.unwrap();

        let patch = PaymentPatch {
            payment_type: Some(PaymentType::SupplierPayment),
            ..Default::default()
        };
        let updated = repo.update(payment.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.payment_type, PaymentType::SupplierPayment);
        assert_eq!(updated.amount, Decimal::from(100));

        assert!(repo.update(99, PaymentPatch::default()).await.unwrap().is_none());
        assert!(repo.delete(payment.id).await.unwrap());
        assert!(!repo.delete(payment.id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disk_create_stores_record_with_its_sequence() {
        let dir = tempdir().unwrap();
        let repo = open(dir.path());

        for expected in 1..=3 {
            let payment = repo.create(new_payment(100)).await.unwrap();
            assert_eq!(payment.id, expected);
            assert_eq!(repo.last_id().unwrap(), expected);
            assert!(repo.read(expected).unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_disk_create_rejects_invalid_record() {
        let dir = tempdir().unwrap();
        let keyspace = Arc::new(fjall::Config::new(dir.path()).open().unwrap());
        let repo: DiskRepository<ProjectComponent> = DiskRepository::new(keyspace).unwrap();

        let new = serde_json::from_value(serde_json::json!({
            "projectId": 1,
            "componentId": 1,
            "supplierId": 1,
            "quantity": "79228162514264337593543950335",
            "unitPrice": "3",
        }))
        .unwrap();
        assert!(repo.create(new).await.is_err());
        assert_eq!(repo.last_id().unwrap(), 0);
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disk_sequence_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let repo = open(dir.path());
            repo.create(new_payment(100)).await.unwrap();
            let second = repo.create(new_payment(200)).await.unwrap();
            repo.delete(second.id).await.unwrap();
        }

        let repo = open(dir.path());
        let records = repo.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, Decimal::from(100));

        let third = repo.create(new_payment(300)).await.unwrap();
        assert_eq!(third.id, 3);
    }
}
