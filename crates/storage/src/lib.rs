pub use db_provider::{from_document, parse_object_id, to_document, DocumentStore};
pub use errors::DBError;
pub use memory::InMemoryStore;
pub use mongodb_client::MongoDBClient;

pub mod db_provider;
pub mod errors;
pub mod memory;
pub mod mongodb_client;
