//! Typed realtime messages pushed by the relay.
//!
//! Every payload is classified into exactly one [`SphinxSocketIOMessage`]
//! variant, keyed by the envelope's `type` field (see [`json_type`]).

use sphinx_models::{ChatDto, ContactDto, GroupDto, InviteDto, InvoiceDto, MessageDto};

/// Discriminant strings the relay puts in the envelope's `type` field.
pub mod json_type {
    pub const CHAT_SEEN: &str = "chat_seen";
    pub const CONTACT: &str = "contact";
    pub const INVITE: &str = "invite";
    pub const INVOICE_PAYMENT: &str = "invoice_payment";
    /// Older relays announce paid invoices with the bare message type name.
    pub const INVOICE: &str = "invoice";

    pub const GROUP_CREATE: &str = "group_create";
    pub const GROUP_LEAVE: &str = "group_leave";
    pub const GROUP_JOIN: &str = "group_join";
    pub const GROUP_KICK: &str = "group_kick";
    pub const TRIBE_DELETE: &str = "tribe_delete";
    pub const MEMBER_REQUEST: &str = "member_request";
    pub const MEMBER_APPROVE: &str = "member_approve";
    pub const MEMBER_REJECT: &str = "member_reject";

    pub const ATTACHMENT: &str = "attachment";
    pub const BOOST: &str = "boost";
    pub const CONFIRMATION: &str = "confirmation";
    pub const DELETE: &str = "delete";
    pub const KEY_SEND: &str = "keysend";
    pub const MESSAGE: &str = "message";
    pub const PURCHASE: &str = "purchase";
    pub const PURCHASE_ACCEPT: &str = "purchase_accept";
    pub const PURCHASE_DENY: &str = "purchase_deny";
}

/// A classified realtime message.
#[derive(Debug, Clone, PartialEq)]
pub enum SphinxSocketIOMessage {
    ChatSeen(ChatDto),
    Contact(ContactDto),
    Invite(InviteDto),
    InvoicePayment(InvoiceDto),
    Group(Group),
    MessageType(MessageType),
}

/// Group and tribe membership events.
#[derive(Debug, Clone, PartialEq)]
pub enum Group {
    Create(GroupDto),
    Leave(GroupDto),
    Join(GroupDto),
    Kick(GroupDto),
    TribeDelete(GroupDto),
    Member(Member),
}

/// Tribe join requests and their outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Request(GroupDto),
    Approve(GroupDto),
    Reject(GroupDto),
}

/// Events that carry a single chat message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageType {
    Attachment(MessageDto),
    Boost(MessageDto),
    Confirmation(MessageDto),
    Delete(MessageDto),
    KeySend(MessageDto),
    Message(MessageDto),
    Purchase(MessageDto),
    PurchaseAccept(MessageDto),
    PurchaseDeny(MessageDto),
}

impl SphinxSocketIOMessage {
    /// The canonical discriminant for this variant.
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::ChatSeen(_) => json_type::CHAT_SEEN,
            Self::Contact(_) => json_type::CONTACT,
            Self::Invite(_) => json_type::INVITE,
            Self::InvoicePayment(_) => json_type::INVOICE_PAYMENT,
            Self::Group(group) => group.json_type(),
            Self::MessageType(message) => message.json_type(),
        }
    }

    /// Variant path used in logs, e.g. `Group.Member.Approve`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::ChatSeen(_) => "ChatSeen",
            Self::Contact(_) => "Contact",
            Self::Invite(_) => "Invite",
            Self::InvoicePayment(_) => "InvoicePayment",
            Self::Group(group) => group.kind_name(),
            Self::MessageType(message) => message.kind_name(),
        }
    }

    /// The chat message carried by message-type events.
    pub fn message_dto(&self) -> Option<&MessageDto> {
        match self {
            Self::MessageType(message) => Some(message.dto()),
            _ => None,
        }
    }

    /// The group body carried by group and member events.
    pub fn group_dto(&self) -> Option<&GroupDto> {
        match self {
            Self::Group(group) => Some(group.dto()),
            _ => None,
        }
    }
}

impl Group {
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::Create(_) => json_type::GROUP_CREATE,
            Self::Leave(_) => json_type::GROUP_LEAVE,
            Self::Join(_) => json_type::GROUP_JOIN,
            Self::Kick(_) => json_type::GROUP_KICK,
            Self::TribeDelete(_) => json_type::TRIBE_DELETE,
            Self::Member(Member::Request(_)) => json_type::MEMBER_REQUEST,
            Self::Member(Member::Approve(_)) => json_type::MEMBER_APPROVE,
            Self::Member(Member::Reject(_)) => json_type::MEMBER_REJECT,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Create(_) => "Group.Create",
            Self::Leave(_) => "Group.Leave",
            Self::Join(_) => "Group.Join",
            Self::Kick(_) => "Group.Kick",
            Self::TribeDelete(_) => "Group.TribeDelete",
            Self::Member(Member::Request(_)) => "Group.Member.Request",
            Self::Member(Member::Approve(_)) => "Group.Member.Approve",
            Self::Member(Member::Reject(_)) => "Group.Member.Reject",
        }
    }

    pub fn dto(&self) -> &GroupDto {
        match self {
            Self::Create(dto)
            | Self::Leave(dto)
            | Self::Join(dto)
            | Self::Kick(dto)
            | Self::TribeDelete(dto)
            | Self::Member(Member::Request(dto))
            | Self::Member(Member::Approve(dto))
            | Self::Member(Member::Reject(dto)) => dto,
        }
    }
}

impl MessageType {
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::Attachment(_) => json_type::ATTACHMENT,
            Self::Boost(_) => json_type::BOOST,
            Self::Confirmation(_) => json_type::CONFIRMATION,
            Self::Delete(_) => json_type::DELETE,
            Self::KeySend(_) => json_type::KEY_SEND,
            Self::Message(_) => json_type::MESSAGE,
            Self::Purchase(_) => json_type::PURCHASE,
            Self::PurchaseAccept(_) => json_type::PURCHASE_ACCEPT,
            Self::PurchaseDeny(_) => json_type::PURCHASE_DENY,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Attachment(_) => "MessageType.Attachment",
            Self::Boost(_) => "MessageType.Boost",
            Self::Confirmation(_) => "MessageType.Confirmation",
            Self::Delete(_) => "MessageType.Delete",
            Self::KeySend(_) => "MessageType.KeySend",
            Self::Message(_) => "MessageType.Message",
            Self::Purchase(_) => "MessageType.Purchase",
            Self::PurchaseAccept(_) => "MessageType.PurchaseAccept",
            Self::PurchaseDeny(_) => "MessageType.PurchaseDeny",
        }
    }

    pub fn dto(&self) -> &MessageDto {
        match self {
            Self::Attachment(dto)
            | Self::Boost(dto)
            | Self::Confirmation(dto)
            | Self::Delete(dto)
            | Self::KeySend(dto)
            | Self::Message(dto)
            | Self::Purchase(dto)
            | Self::PurchaseAccept(dto)
            | Self::PurchaseDeny(dto) => dto,
        }
    }
}
