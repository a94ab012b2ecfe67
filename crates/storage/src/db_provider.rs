use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Document};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::DBError;

/// Access to a single collection of documents.
///
/// Lookups by id return `Ok(None)` when nothing matched; `Err` is reserved for
/// failures of the store itself (connectivity, invalid ids, codec errors).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, item: &Document) -> Result<(), DBError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, DBError>;

    /// Apply `changes` with `$set` semantics and return the matched document,
    /// as it was before or after the update depending on the store's `ReturnDocument`.
    async fn find_by_id_and_update(
        &self,
        id: &str,
        changes: &Document,
    ) -> Result<Option<Document>, DBError>;

    /// Remove the document and return it as it was stored.
    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Document>, DBError>;

    async fn count_documents(&self, filter: &Document) -> Result<u64, DBError>;
}

pub fn parse_object_id(id: &str) -> Result<ObjectId, DBError> {
    ObjectId::parse_str(id).map_err(|e| DBError::InvalidId(id.to_string(), e))
}

pub fn to_document<T: Serialize>(item: &T) -> Result<Document, DBError> {
    let doc = bson::to_bson(item)?
        .as_document()
        .cloned()
        .ok_or_else(|| DBError::Other("Failed to convert item to BSON document".to_string()))?;
    Ok(doc)
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, DBError> {
    let item = bson::from_document(doc)?;
    Ok(item)
}
