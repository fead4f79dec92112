use mongodb::bson::Binary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub name: String,
    pub data: Binary,
    /// Content hash, unique together with `sourceId`.
    pub h: String,
}

impl Media {
    pub const COLLECTION: &'static str = "media";
}
