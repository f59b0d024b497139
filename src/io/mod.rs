//! Byte-buffer helpers shared by every payload decoder/encoder.
//!
//! Unlike a naive slice-indexing decoder, [`Buf::get_u8`] and friends return
//! `Err(Error::Protocol(..))` instead of panicking when the buffer runs out:
//! a malformed or truncated packet from the network must never take down the
//! caller.

mod buf;
mod buf_mut;
mod lenenc;

pub use buf::Buf;
pub use buf_mut::BufMut;
pub use lenenc::{lenenc_int_len, write_lenenc_bytes, write_lenenc_int, write_lenenc_str};
