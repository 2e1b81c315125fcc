//! Contact payload.

use serde::{Deserialize, Serialize};

use crate::SphinxBool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDto {
    pub id: i64,
    #[serde(default)]
    pub route_hint: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub node_alias: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub private_photo: Option<SphinxBool>,
    #[serde(default)]
    pub is_owner: Option<SphinxBool>,
    #[serde(default)]
    pub deleted: Option<SphinxBool>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub contact_key: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub from_group: Option<SphinxBool>,
    #[serde(default)]
    pub notification_sound: Option<String>,
    #[serde(default)]
    pub tip_amount: Option<i64>,
    #[serde(default)]
    pub blocked: Option<SphinxBool>,
}

impl ContactDto {
    pub fn is_owner(&self) -> bool {
        self.is_owner.map(SphinxBool::value).unwrap_or(false)
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.map(SphinxBool::value).unwrap_or(false)
    }
}
