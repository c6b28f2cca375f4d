//! Keyed record storage abstractions

use anyhow::Result;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

pub type RecordId = u32;

/// Foreign keys a record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Project,
    Supplier,
    Component,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Relation::Project => "project",
                Relation::Supplier => "supplier",
                Relation::Component => "component",
            }
        )
    }
}

/// A stored record. `New` is the insert shape (no id, defaults not yet
/// applied) and `Patch` the partial update shape.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    type New: Send + 'static;
    type Patch: Send + 'static;

    /// Collection name, also used for storage partitions.
    const KIND: &'static str;
    /// Human readable singular name.
    const LABEL: &'static str;
    const RELATIONS: &'static [Relation] = &[];

    fn id(&self) -> RecordId;

    /// Rejects insert data that cannot form a record. Repositories call this
    /// before [`Record::from_new`].
    fn validate(_new: &Self::New) -> Result<()> {
        Ok(())
    }

    fn from_new(id: RecordId, new: Self::New) -> Self;
    fn apply(&mut self, patch: Self::Patch);

    fn related_id(&self, _relation: Relation) -> Option<RecordId> {
        None
    }
}

#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    /// All records ordered by id.
    async fn list(&self) -> Result<Vec<T>>;
    async fn get(&self, id: RecordId) -> Result<Option<T>>;
    async fn create(&self, new: T::New) -> Result<T>;
    /// Returns `None` when no record has `id`.
    async fn update(&self, id: RecordId, patch: T::Patch) -> Result<Option<T>>;
    /// Returns `false` when no record has `id`.
    async fn delete(&self, id: RecordId) -> Result<bool>;
}

/// Lists the records of `repo` whose `relation` key equals `id`.
pub async fn list_related<T: Record>(
    repo: &dyn Repository<T>,
    relation: Relation,
    id: RecordId,
) -> Result<Vec<T>> {
    list_where(repo, &[(relation, id)]).await
}

/// Lists the records of `repo` matching every `(relation, id)` pair. An
/// empty slice lists everything.
pub async fn list_where<T: Record>(
    repo: &dyn Repository<T>,
    relations: &[(Relation, RecordId)],
) -> Result<Vec<T>> {
    let records = repo.list().await?;
    Ok(records
        .into_iter()
        .filter(|r| {
            relations
                .iter()
                .all(|(relation, id)| r.related_id(*relation) == Some(*id))
        })
        .collect())
}
