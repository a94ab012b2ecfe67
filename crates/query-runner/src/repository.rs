use std::marker::PhantomData;

use log::debug;
use mongodb::bson::Document;

use storage::{from_document, to_document, DBError, DocumentStore};

use crate::models::Model;

/// Decodes what a [`DocumentStore`] returns into the collection's model.
#[derive(Debug)]
pub struct Repository<M, S> {
    store: S,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model, S: DocumentStore> Repository<M, S> {
    pub fn new(store: S) -> Self {
        Self { store, _model: PhantomData }
    }

    pub async fn create(&self, item: &M) -> Result<(), DBError> {
        self.store.create(&to_document(item)?).await
    }

    pub async fn find_by_id_and_update(
        &self,
        id: &str,
        changes: Document,
    ) -> Result<Option<M>, DBError> {
        debug!("{}.find_by_id_and_update({}, {})", M::MODEL_NAME, id, changes);
        self.store.find_by_id_and_update(id, &changes).await?.map(from_document).transpose()
    }

    pub async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<M>, DBError> {
        debug!("{}.find_by_id_and_delete({})", M::MODEL_NAME, id);
        self.store.find_by_id_and_delete(id).await?.map(from_document).transpose()
    }

    pub async fn count_documents(&self, filter: Document) -> Result<u64, DBError> {
        debug!("{}.count_documents({})", M::MODEL_NAME, filter);
        self.store.count_documents(&filter).await
    }
}
