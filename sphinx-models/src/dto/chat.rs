//! Chat payload.

use serde::{Deserialize, Serialize};

use crate::SphinxBool;

/// A chat as sent by the relay (`chat_seen` and group events).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatDto {
    pub id: i64,
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    /// 0 = conversation, 1 = group, 2 = tribe.
    #[serde(rename = "type", default)]
    pub chat_type: i32,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub contact_ids: Vec<i64>,
    #[serde(default)]
    pub is_muted: Option<SphinxBool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub deleted: Option<SphinxBool>,
    #[serde(default)]
    pub group_key: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub price_to_join: Option<i64>,
    #[serde(default)]
    pub price_per_message: Option<i64>,
    #[serde(default)]
    pub escrow_amount: Option<i64>,
    #[serde(default)]
    pub escrow_millis: Option<i64>,
    #[serde(default)]
    pub unlisted: Option<SphinxBool>,
    #[serde(default)]
    pub private: Option<SphinxBool>,
    #[serde(default, alias = "owner_pubkey")]
    pub owner_pub_key: Option<String>,
    #[serde(default)]
    pub seen: Option<SphinxBool>,
    #[serde(default)]
    pub app_url: Option<String>,
    #[serde(default)]
    pub feed_url: Option<String>,
    #[serde(default)]
    pub meta: Option<String>,
    #[serde(default)]
    pub my_photo_url: Option<String>,
    #[serde(default)]
    pub my_alias: Option<String>,
    #[serde(default)]
    pub pending_contact_ids: Option<Vec<i64>>,
}

impl ChatDto {
    pub fn is_muted(&self) -> bool {
        self.is_muted.map(SphinxBool::value).unwrap_or(false)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.map(SphinxBool::value).unwrap_or(false)
    }

    pub fn is_seen(&self) -> bool {
        self.seen.map(SphinxBool::value).unwrap_or(false)
    }

    pub fn is_private(&self) -> bool {
        self.private.map(SphinxBool::value).unwrap_or(false)
    }

    pub fn is_tribe(&self) -> bool {
        self.chat_type == 2
    }
}
