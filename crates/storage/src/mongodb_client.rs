use async_trait::async_trait;
use log::debug;
use mongodb::{
    bson::{doc, Document},
    options::{self, FindOneAndUpdateOptions},
    Client, Collection,
};

use config::ReturnDocument;

use crate::db_provider::parse_object_id;
use crate::errors::DBError;
use crate::DocumentStore;

#[derive(Debug, Clone)]
pub struct MongoDBClient {
    pub client: Client,
    db_name: String,
    collection_name: String,
    return_document: ReturnDocument,
}

impl MongoDBClient {
    pub async fn new(
        mongodb_uri: &str,
        db_name: String,
        collection_name: String,
        return_document: ReturnDocument,
    ) -> Result<Self, DBError> {
        let client = mongodb::Client::with_uri_str(mongodb_uri).await?;
        Ok(Self::with_client(client, db_name, collection_name, return_document))
    }

    /// Bind another collection to an existing client, sharing its connection pool.
    pub fn with_client(
        client: Client,
        db_name: String,
        collection_name: String,
        return_document: ReturnDocument,
    ) -> Self {
        Self { client, db_name, collection_name, return_document }
    }

    pub fn get_collection(&self) -> Collection<Document> {
        self.client.database(&self.db_name).collection(&self.collection_name)
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Round-trip to the server. The driver connects lazily, so this is the
    /// first point where an unreachable deployment shows up.
    pub async fn ping(&self) -> Result<(), DBError> {
        self.client.database(&self.db_name).run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    fn update_options(&self) -> FindOneAndUpdateOptions {
        let return_document = match self.return_document {
            ReturnDocument::Before => options::ReturnDocument::Before,
            ReturnDocument::After => options::ReturnDocument::After,
        };
        FindOneAndUpdateOptions::builder().return_document(return_document).build()
    }
}

#[async_trait]
impl DocumentStore for MongoDBClient {
    async fn create(&self, item: &Document) -> Result<(), DBError> {
        debug!("Inserting into {}", self.collection_name);
        let collection = self.get_collection();
        collection.insert_one(item.clone(), None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, DBError> {
        let query = doc! { "_id": parse_object_id(id)? };
        debug!("Finding {} in {}", id, self.collection_name);
        let collection = self.get_collection();
        let result = collection.find_one(query, None).await?;
        Ok(result)
    }

    async fn find_by_id_and_update(
        &self,
        id: &str,
        changes: &Document,
    ) -> Result<Option<Document>, DBError> {
        let query = doc! { "_id": parse_object_id(id)? };
        debug!("Updating {} in {} with {}", id, self.collection_name, changes);
        let collection = self.get_collection();
        let update_doc = doc! { "$set": changes.clone() };
        let result = collection.find_one_and_update(query, update_doc, self.update_options()).await?;
        Ok(result)
    }

    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Document>, DBError> {
        let query = doc! { "_id": parse_object_id(id)? };
        debug!("Deleting {} from {}", id, self.collection_name);
        let collection = self.get_collection();
        let result = collection.find_one_and_delete(query, None).await?;
        Ok(result)
    }

    async fn count_documents(&self, filter: &Document) -> Result<u64, DBError> {
        debug!("Counting {} matching {}", self.collection_name, filter);
        let collection = self.get_collection();
        let count = collection.count_documents(filter.clone(), None).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{doc, oid::ObjectId, Document};
    use mongodb::Client;
    use serial_test::serial;

    use config::ReturnDocument;

    use crate::mongodb_client::MongoDBClient;
    use crate::{DBError, DocumentStore};

    // Global test configuration constants
    const DB_URI: &str = "mongodb://localhost:27017";
    const DB_NAME: &str = "test_db";
    const COLLECTION_NAME: &str = "test_collection";

    // Helper function to setup the MongoDBClient
    async fn setup_db_provider(return_document: ReturnDocument) -> Result<MongoDBClient, DBError> {
        let db_provider = MongoDBClient::new(
            DB_URI,
            DB_NAME.to_string(),
            COLLECTION_NAME.to_string(),
            return_document,
        )
        .await?;
        Ok(db_provider)
    }

    async fn teardown() -> Result<(), DBError> {
        let client = Client::with_uri_str(DB_URI).await?;
        client.database(DB_NAME).drop(None).await?;
        Ok(())
    }

    fn new_user(age: i32) -> (String, Document) {
        let id = ObjectId::new();
        (id.to_hex(), doc! { "_id": id, "name": "Alice", "age": age })
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a MongoDB server on localhost:27017"]
    async fn able_to_ping() -> Result<(), DBError> {
        let db_provider = setup_db_provider(ReturnDocument::After).await?;
        db_provider.ping().await?;
        Ok(())
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a MongoDB server on localhost:27017"]
    async fn test_create_and_find() -> Result<(), DBError> {
        let db_provider = setup_db_provider(ReturnDocument::After).await?;
        let (id, user) = new_user(27);

        db_provider.create(&user).await?;

        let result = db_provider.find_by_id(&id).await?;
        assert_eq!(result, Some(user));

        teardown().await?;
        Ok(())
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a MongoDB server on localhost:27017"]
    async fn test_update_returns_requested_version() -> Result<(), DBError> {
        let after = setup_db_provider(ReturnDocument::After).await?;
        let before = setup_db_provider(ReturnDocument::Before).await?;
        let (id, user) = new_user(27);
        after.create(&user).await?;

        let updated = after.find_by_id_and_update(&id, &doc! { "age": 34 }).await?.unwrap();
        assert_eq!(updated.get_i32("age").unwrap(), 34);

        let previous = before.find_by_id_and_update(&id, &doc! { "age": 35 }).await?.unwrap();
        assert_eq!(previous.get_i32("age").unwrap(), 34);

        teardown().await?;
        Ok(())
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a MongoDB server on localhost:27017"]
    async fn test_update_unknown_id_is_absent() -> Result<(), DBError> {
        let db_provider = setup_db_provider(ReturnDocument::After).await?;

        let result =
            db_provider.find_by_id_and_update(&ObjectId::new().to_hex(), &doc! { "age": 34 }).await?;
        assert_eq!(result, None);

        teardown().await?;
        Ok(())
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a MongoDB server on localhost:27017"]
    async fn test_delete_and_count() -> Result<(), DBError> {
        let db_provider = setup_db_provider(ReturnDocument::After).await?;
        let (id, user) = new_user(34);
        let (_, other) = new_user(34);
        db_provider.create(&user).await?;
        db_provider.create(&other).await?;

        let deleted = db_provider.find_by_id_and_delete(&id).await?;
        assert_eq!(deleted, Some(user));
        assert_eq!(db_provider.find_by_id(&id).await?, None);
        assert_eq!(db_provider.count_documents(&doc! { "age": 34 }).await?, 1);

        teardown().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected_before_any_round_trip() -> Result<(), DBError> {
        let db_provider = setup_db_provider(ReturnDocument::After).await?;

        let result = db_provider.find_by_id_and_delete("not-an-id").await;
        assert!(matches!(result, Err(DBError::InvalidId(_, _))));

        Ok(())
    }
}
