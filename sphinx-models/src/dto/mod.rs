//! Relay payload shapes carried by realtime events.

pub mod chat;
pub mod contact;
pub mod invite;
pub mod message;

use serde::{Deserialize, Serialize};

pub use chat::ChatDto;
pub use contact::ContactDto;
pub use invite::{InviteDto, InvoiceDto};
pub use message::MessageDto;

/// Body of group and tribe membership events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDto {
    pub chat: ChatDto,
    #[serde(default)]
    pub contact: Option<ContactDto>,
    #[serde(default)]
    pub message: Option<MessageDto>,
}

/// Wire envelope of a realtime event: `{"type": "...", "response": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketEnvelope<T> {
    #[serde(rename = "type")]
    pub kind: String,
    pub response: T,
}
