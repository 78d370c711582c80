use crate::domain::model::{
    DigitalObject, ObjectId, PersistentIdentifier, RecordedIdentifier, RegistryKey, RegistryRecord,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Read side of the object store. Writes go through a [`StoreTransaction`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, id: &ObjectId) -> Result<bool>;
    async fn retrieve(&self, id: &ObjectId) -> Result<DigitalObject>;
}

/// Read side of the persistent identifier registry.
#[async_trait]
pub trait PiRegistry: Send + Sync {
    async fn get(
        &self,
        service: &str,
        object_id: &ObjectId,
        additional: &str,
    ) -> Result<Option<RegistryRecord>>;
}

/// Scoped unit of work over the object store and the registry.
///
/// Nothing is durable before `commit`; dropping the transaction discards it.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn save(&mut self, object: &DigitalObject) -> Result<()>;
    /// Returns whether a record was removed.
    async fn delete(&mut self, key: &RegistryKey) -> Result<bool>;
    async fn insert(&mut self, record: RegistryRecord) -> Result<()>;
    async fn commit(self) -> Result<()>;
}

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Transaction: StoreTransaction;

    async fn begin(&self) -> Result<Self::Transaction>;
}

/// Knows how a persistent identifier of one type is written into object metadata.
pub trait IdentifierService: Send + Sync {
    fn name(&self) -> &str;
    fn identifier_type(&self) -> &str;
    fn get_identifier(&self, object: &DigitalObject) -> Option<RecordedIdentifier>;
    fn remove_identifier(&self, value: &str, object: &mut DigitalObject) -> Result<()>;
    fn insert_identifier(
        &self,
        identifier: &PersistentIdentifier,
        object: &mut DigitalObject,
    ) -> Result<()>;
}

/// Grammar of one identifier type.
pub trait IdentifierParser: Send + Sync {
    fn identifier_type(&self) -> &str;
    /// Character separating the segments of an identifier.
    fn separator(&self) -> char;
    fn parse(&self, raw: &str) -> Option<PersistentIdentifier>;
}
