//! The byte- and packet-level transport stack: raw/TLS sockets, the
//! sequence-number conversation, packet framing, and the optional
//! compressed-protocol layer underneath it.

pub mod byte_handler;
pub mod compression;
pub mod conversation;
pub mod packet;

#[cfg(test)]
pub mod test_support;

pub use byte_handler::ByteHandler;
pub use compression::CompressionLayer;
pub use conversation::{Conversation, ProtocolErrorBehavior};
pub use packet::PacketCodec;
