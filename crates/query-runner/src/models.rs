use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A typed view of the documents in one collection.
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    const MODEL_NAME: &'static str;
}

// User DB Model
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub age: i32,
}

impl User {
    pub fn age_filter(age: i32) -> Document {
        doc! { "age": age }
    }
}

impl Model for User {
    const MODEL_NAME: &'static str = "User";
}

// Task DB Model
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn incomplete_filter() -> Document {
        doc! { "completed": false }
    }
}

impl Model for Task {
    const MODEL_NAME: &'static str = "Task";
}
