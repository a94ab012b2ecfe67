use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use tokio::sync::Mutex;

use config::ReturnDocument;

use crate::db_provider::parse_object_id;
use crate::errors::DBError;
use crate::DocumentStore;

/// A collection held in process memory.
///
/// Filters are matched on top-level field equality only, which is all the
/// count queries in this workspace need.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<Mutex<Vec<Document>>>,
    return_document: ReturnDocument,
}

impl InMemoryStore {
    pub fn new(return_document: ReturnDocument) -> Self {
        Self { documents: Arc::default(), return_document }
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

fn has_id(doc: &Document, id: &ObjectId) -> bool {
    matches!(doc.get("_id"), Some(Bson::ObjectId(stored)) if stored == id)
}

fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, value)| doc.get(key) == Some(value))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create(&self, item: &Document) -> Result<(), DBError> {
        let mut item = item.clone();
        let id = match item.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => return Err(DBError::Other(format!("Unsupported _id: {}", other))),
            None => ObjectId::new(),
        };
        if !item.contains_key("_id") {
            item.insert("_id", id);
        }

        let mut documents = self.documents.lock().await;
        if documents.iter().any(|doc| has_id(doc, &id)) {
            return Err(DBError::Other(format!("Duplicate key: {}", id)));
        }
        debug!("Inserting {} into memory", id);
        documents.push(item);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, DBError> {
        let id = parse_object_id(id)?;
        let documents = self.documents.lock().await;
        Ok(documents.iter().find(|doc| has_id(doc, &id)).cloned())
    }

    async fn find_by_id_and_update(
        &self,
        id: &str,
        changes: &Document,
    ) -> Result<Option<Document>, DBError> {
        let id = parse_object_id(id)?;
        if changes.contains_key("_id") {
            return Err(DBError::Other("Cannot modify the immutable field '_id'".to_string()));
        }

        let mut documents = self.documents.lock().await;
        let Some(doc) = documents.iter_mut().find(|doc| has_id(doc, &id)) else {
            debug!("No document {} to update", id);
            return Ok(None);
        };

        let before = doc.clone();
        for (key, value) in changes {
            doc.insert(key.clone(), value.clone());
        }

        Ok(Some(match self.return_document {
            ReturnDocument::Before => before,
            ReturnDocument::After => doc.clone(),
        }))
    }

    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Document>, DBError> {
        let id = parse_object_id(id)?;
        let mut documents = self.documents.lock().await;
        let position = documents.iter().position(|doc| has_id(doc, &id));
        Ok(position.map(|index| documents.remove(index)))
    }

    async fn count_documents(&self, filter: &Document) -> Result<u64, DBError> {
        let documents = self.documents.lock().await;
        Ok(documents.iter().filter(|doc| matches_filter(doc, filter)).count() as u64)
    }
}
