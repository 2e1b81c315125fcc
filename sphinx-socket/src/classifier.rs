//! Classification of raw relay payloads into typed messages.
//!
//! The envelope's `type` field is read first with a probe that ignores every
//! other field. The tag then selects a decoder from a table built once per
//! classifier. Unknown tags are decoded as a plain chat message.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use sphinx_core::error::{SphinxError, SphinxResult};
use sphinx_models::SocketEnvelope;

use crate::message::{json_type, Group, Member, MessageType, SphinxSocketIOMessage};

type DecodeFn = fn(&str) -> serde_json::Result<SphinxSocketIOMessage>;

#[derive(Deserialize)]
struct TypeProbe {
    #[serde(rename = "type")]
    kind: String,
}

fn response<T: DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
    serde_json::from_str::<SocketEnvelope<T>>(raw).map(|envelope| envelope.response)
}

/// Table-driven payload classifier.
pub struct MessageClassifier {
    decoders: HashMap<&'static str, DecodeFn>,
    attempts: AtomicU64,
}

impl MessageClassifier {
    pub fn new() -> Self {
        use SphinxSocketIOMessage as Msg;

        let entries: [(&'static str, DecodeFn); 22] = [
            (json_type::CHAT_SEEN, |raw| Ok(Msg::ChatSeen(response(raw)?))),
            (json_type::CONTACT, |raw| Ok(Msg::Contact(response(raw)?))),
            (json_type::INVITE, |raw| Ok(Msg::Invite(response(raw)?))),
            (json_type::INVOICE_PAYMENT, |raw| Ok(Msg::InvoicePayment(response(raw)?))),
            (json_type::INVOICE, |raw| Ok(Msg::InvoicePayment(response(raw)?))),
            (json_type::GROUP_CREATE, |raw| Ok(Msg::Group(Group::Create(response(raw)?)))),
            (json_type::GROUP_LEAVE, |raw| Ok(Msg::Group(Group::Leave(response(raw)?)))),
            (json_type::GROUP_JOIN, |raw| Ok(Msg::Group(Group::Join(response(raw)?)))),
            (json_type::GROUP_KICK, |raw| Ok(Msg::Group(Group::Kick(response(raw)?)))),
            (json_type::TRIBE_DELETE, |raw| {
                Ok(Msg::Group(Group::TribeDelete(response(raw)?)))
            }),
            (json_type::MEMBER_REQUEST, |raw| {
                Ok(Msg::Group(Group::Member(Member::Request(response(raw)?))))
            }),
            (json_type::MEMBER_APPROVE, |raw| {
                Ok(Msg::Group(Group::Member(Member::Approve(response(raw)?))))
            }),
            (json_type::MEMBER_REJECT, |raw| {
                Ok(Msg::Group(Group::Member(Member::Reject(response(raw)?))))
            }),
            (json_type::ATTACHMENT, |raw| {
                Ok(Msg::MessageType(MessageType::Attachment(response(raw)?)))
            }),
            (json_type::BOOST, |raw| Ok(Msg::MessageType(MessageType::Boost(response(raw)?)))),
            (json_type::CONFIRMATION, |raw| {
                Ok(Msg::MessageType(MessageType::Confirmation(response(raw)?)))
            }),
            (json_type::DELETE, |raw| Ok(Msg::MessageType(MessageType::Delete(response(raw)?)))),
            (json_type::KEY_SEND, |raw| {
                Ok(Msg::MessageType(MessageType::KeySend(response(raw)?)))
            }),
            (json_type::MESSAGE, |raw| {
                Ok(Msg::MessageType(MessageType::Message(response(raw)?)))
            }),
            (json_type::PURCHASE, |raw| {
                Ok(Msg::MessageType(MessageType::Purchase(response(raw)?)))
            }),
            (json_type::PURCHASE_ACCEPT, |raw| {
                Ok(Msg::MessageType(MessageType::PurchaseAccept(response(raw)?)))
            }),
            (json_type::PURCHASE_DENY, |raw| {
                Ok(Msg::MessageType(MessageType::PurchaseDeny(response(raw)?)))
            }),
        ];

        Self {
            decoders: entries.into_iter().collect(),
            attempts: AtomicU64::new(0),
        }
    }

    /// Decode a raw payload into its typed message.
    ///
    /// Unknown `type` values fall back to [`MessageType::Message`].
    pub fn classify(&self, raw: &str) -> SphinxResult<SphinxSocketIOMessage> {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        let probe: TypeProbe = serde_json::from_str(raw)
            .map_err(|e| SphinxError::Classification(format!("missing message type: {e}")))?;

        match self.decoders.get(probe.kind.as_str()) {
            Some(decode) => decode(raw).map_err(|e| {
                SphinxError::Classification(format!("malformed '{}' payload: {e}", probe.kind))
            }),
            None => {
                let dto = response(raw).map_err(|e| {
                    SphinxError::Classification(format!(
                        "unhandled type '{}' is not a message either: {e}",
                        probe.kind
                    ))
                })?;
                warn!("socket message type '{}' not handled, treating as message", probe.kind);
                Ok(SphinxSocketIOMessage::MessageType(MessageType::Message(dto)))
            }
        }
    }

    /// Whether `tag` has a dedicated decoder.
    pub fn is_known_type(&self, tag: &str) -> bool {
        self.decoders.contains_key(tag)
    }

    /// How many payloads this classifier has been asked to decode.
    pub fn classified_count(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl Default for MessageClassifier {
    fn default() -> Self {
        Self::new()
    }
}
