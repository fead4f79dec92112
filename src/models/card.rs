use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Right/wrong answer streak.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Streak {
    pub right: i32,
    pub wrong: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CardStat {
    pub streak: Streak,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub deck_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_id: Option<String>,
    pub front: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srs_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<String>,
    pub created: DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stat: Option<CardStat>,
}

impl Card {
    pub const COLLECTION: &'static str = "card";
}
