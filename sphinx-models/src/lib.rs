//! Sphinx Models - serde shapes of the payloads the relay pushes over the
//! realtime socket.

pub mod dto;
pub mod sphinx_bool;

pub use dto::{
    ChatDto, ContactDto, GroupDto, InviteDto, InvoiceDto, MessageDto, SocketEnvelope,
};
pub use sphinx_bool::SphinxBool;
