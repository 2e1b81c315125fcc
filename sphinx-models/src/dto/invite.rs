//! Invite and invoice payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteDto {
    pub id: i64,
    pub invite_string: String,
    #[serde(default)]
    pub invoice: Option<String>,
    #[serde(default)]
    pub welcome_message: Option<String>,
    #[serde(default)]
    pub contact_id: Option<i64>,
    /// 0 pending, 1 ready, 2 delivered, 3 in progress, 4 complete,
    /// 5 expired, 6 payment pending.
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of an `invoice_payment` event: the bolt11 invoice that was paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDto {
    pub invoice: String,
}
