pub mod disk;
pub mod memory;

use crate::core::component::{CostComponent, ProjectComponent};
use crate::core::config::{AppConfig, StorageBackend};
use crate::core::payment::Payment;
use crate::core::project::Project;
use crate::core::projection::CashFlowProjection;
use crate::core::repository::{Record, RecordId, Repository};
use crate::core::supplier::{Supplier, SupplierComponent};
use anyhow::{Context, Result};
use disk::DiskRepository;
use memory::MemoryRepository;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// One repository per record kind.
#[derive(Clone)]
pub struct Ledger {
    pub projects: Arc<dyn Repository<Project>>,
    pub payments: Arc<dyn Repository<Payment>>,
    pub projections: Arc<dyn Repository<CashFlowProjection>>,
    pub suppliers: Arc<dyn Repository<Supplier>>,
    pub cost_components: Arc<dyn Repository<CostComponent>>,
    pub supplier_components: Arc<dyn Repository<SupplierComponent>>,
    pub project_components: Arc<dyn Repository<ProjectComponent>>,
}

impl Ledger {
    pub fn in_memory() -> Self {
        Self {
            projects: Arc::new(MemoryRepository::new()),
            payments: Arc::new(MemoryRepository::new()),
            projections: Arc::new(MemoryRepository::new()),
            suppliers: Arc::new(MemoryRepository::new()),
            cost_components: Arc::new(MemoryRepository::new()),
            supplier_components: Arc::new(MemoryRepository::new()),
            project_components: Arc::new(MemoryRepository::new()),
        }
    }

    /// Opens (or creates) an on-disk ledger under `path`.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path.join("ledger"))
            .open()
            .with_context(|| format!("Failed to open ledger at {}", path.display()))?;
        let keyspace = Arc::new(keyspace);
        debug!("Opened ledger at {}", path.display());

        Ok(Self {
            projects: Arc::new(DiskRepository::new(Arc::clone(&keyspace))?),
            payments: Arc::new(DiskRepository::new(Arc::clone(&keyspace))?),
            projections: Arc::new(DiskRepository::new(Arc::clone(&keyspace))?),
            suppliers: Arc::new(DiskRepository::new(Arc::clone(&keyspace))?),
            cost_components: Arc::new(DiskRepository::new(Arc::clone(&keyspace))?),
            supplier_components: Arc::new(DiskRepository::new(Arc::clone(&keyspace))?),
            project_components: Arc::new(DiskRepository::new(keyspace)?),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match config.storage.backend {
            StorageBackend::Memory => {
                debug!("Using in-memory ledger");
                Ok(Self::in_memory())
            }
            StorageBackend::Disk => Self::open(&config.default_data_path()?),
        }
    }
}

/// Fetches a record or fails with "<Label> <id> not found".
pub async fn require<T: Record>(repo: &dyn Repository<T>, id: RecordId) -> Result<T> {
    repo.get(id)
        .await?
        .with_context(|| format!("{} {} not found", T::LABEL, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::repository::{Relation, list_related, list_where};
    use serde_json::json;
    use tempfile::TempDir;

    async fn add_payment(ledger: &Ledger, project_id: RecordId) -> Payment {
        let new = serde_json::from_value(json!({
            "projectId": project_id,
            "type": "client_payment",
            "amount": "10",
            "description": "x",
            "paymentDate": "2025-01-01T00:00:00Z",
        }))
        .unwrap();
        ledger.payments.create(new).await.unwrap()
    }

    #[tokio::test]
    async fn test_payments_related_to_project() {
        let ledger = Ledger::in_memory();
        add_payment(&ledger, 1).await;
        add_payment(&ledger, 2).await;
        add_payment(&ledger, 1).await;

        let payments = list_related(&*ledger.payments, Relation::Project, 1)
            .await
            .unwrap();
        assert_eq!(payments.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3]);
        assert!(
            list_related(&*ledger.payments, Relation::Project, 5)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_supplier_component_lookups() {
        let ledger = Ledger::in_memory();
        for (supplier, component) in [(1, 10), (1, 11), (2, 10)] {
            let new = serde_json::from_value(json!({
                "supplierId": supplier,
                "componentId": component,
                "price": "99.90",
            }))
            .unwrap();
            ledger.supplier_components.create(new).await.unwrap();
        }

        let repo = &*ledger.supplier_components;
        let by_supplier = list_where(repo, &[(Relation::Supplier, 1)]).await.unwrap();
        assert_eq!(by_supplier.len(), 2);
        let by_component = list_where(repo, &[(Relation::Component, 10)]).await.unwrap();
        assert_eq!(by_component.len(), 2);
        let both = list_where(repo, &[(Relation::Supplier, 2), (Relation::Component, 10)])
            .await
            .unwrap();
        assert_eq!(both.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3]);
        assert!(list_where(repo, &[(Relation::Component, 12)]).await.unwrap().is_empty());
        assert_eq!(list_where(repo, &[]).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_require_reports_missing_record() {
        let ledger = Ledger::in_memory();
        let err = require(&*ledger.projects, 7).await.unwrap_err();
        assert_eq!(err.to_string(), "Project 7 not found");
    }

    #[tokio::test]
    async fn test_open_on_disk_ledger() -> Result<()> {
        let temp_dir = TempDir::new()?;
        {
            let ledger = Ledger::open(temp_dir.path())?;
            add_payment(&ledger, 4).await;
        }

        let ledger = Ledger::open(temp_dir.path())?;
        let payments = list_related(&*ledger.payments, Relation::Project, 4).await?;
        assert_eq!(payments.len(), 1);
        assert!(ledger.projects.list().await?.is_empty());
        Ok(())
    }
}
