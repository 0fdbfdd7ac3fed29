use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Profile document as stored in the users collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "$id")]
    pub id: String,                // document ID
    #[serde(rename = "$collectionId")]
    pub collection_id: String,
    #[serde(rename = "$databaseId")]
    pub database_id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: String,        // opaque platform timestamp
    #[serde(rename = "$updatedAt")]
    pub updated_at: String,
    #[serde(rename = "$permissions")]
    pub permissions: Vec<String>,
    #[serde(rename = "$sequence")]
    pub sequence: Value,           // number or string depending on platform version
    #[serde(rename = "accountId", default)]
    pub account_id: String,        // owning account
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: String,            // initials avatar URL
    #[serde(flatten)]
    pub extra: Map<String, Value>, // any other attributes of the collection
}

/// The signed-in user as the session holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$collectionId")]
    pub collection_id: String,
    #[serde(rename = "$databaseId")]
    pub database_id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: String,
    #[serde(rename = "$updatedAt")]
    pub updated_at: String,
    #[serde(rename = "$permissions")]
    pub permissions: Vec<String>,
    #[serde(rename = "$sequence")]
    pub sequence: Value,
    pub name: String,
    pub email: String,
    pub avatar: String,
}

impl From<UserDocument> for User {
    fn from(d: UserDocument) -> Self {
        Self {
            id: d.id,
            collection_id: d.collection_id,
            database_id: d.database_id,
            created_at: d.created_at,
            updated_at: d.updated_at,
            permissions: d.permissions,
            sequence: d.sequence,
            name: d.name,
            email: d.email,
            avatar: d.avatar,
        }
    }
}
