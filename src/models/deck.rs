use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub name: String,
}

impl Deck {
    pub const COLLECTION: &'static str = "deck";
}
