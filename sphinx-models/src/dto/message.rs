//! Message payload, shared by every message-type event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dto::{ChatDto, ContactDto};
use crate::SphinxBool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: i64,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub chat_id: Option<i64>,
    #[serde(rename = "type", default)]
    pub message_type: i32,
    #[serde(default)]
    pub sender: i64,
    #[serde(default)]
    pub receiver: Option<i64>,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub amount_msat: i64,
    #[serde(default)]
    pub payment_hash: Option<String>,
    #[serde(default)]
    pub payment_request: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub message_content: Option<String>,
    #[serde(default)]
    pub remote_message_content: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub media_key: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_token: Option<String>,
    #[serde(default)]
    pub seen: Option<SphinxBool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub sender_alias: Option<String>,
    #[serde(default)]
    pub sender_pic: Option<String>,
    #[serde(default)]
    pub original_muid: Option<String>,
    #[serde(default)]
    pub reply_uuid: Option<String>,
    #[serde(default)]
    pub thread_uuid: Option<String>,
    #[serde(default)]
    pub chat: Option<ChatDto>,
    #[serde(default)]
    pub contact: Option<ContactDto>,
}

impl MessageDto {
    pub fn is_seen(&self) -> bool {
        self.seen.map(SphinxBool::value).unwrap_or(false)
    }

    /// The message date, when present and parseable as RFC 3339.
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        self.date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc))
    }
}
