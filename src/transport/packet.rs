//! Packet framing: 3-byte little-endian length + 1-byte sequence + payload,
//! with the `0xFFFFFF` continuation rule for payloads that don't fit in one
//! physical packet, including the terminating empty packet when a payload
//! lands on an exact multiple of the boundary.

use bytes::{BufMut as _, Bytes, BytesMut};
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::byte_handler::ByteHandler;
use crate::transport::compression::CompressionLayer;
use crate::transport::conversation::{Conversation, ProtocolErrorBehavior};

/// A single MySQL packet on the wire: a logical payload is split across
/// one or more of these when it reaches `MAX_PAYLOAD_LEN`.
pub const MAX_PAYLOAD_LEN: usize = 0xFF_FFFF;

/// Reads and writes logical payloads over a [`ByteHandler`], transparently
/// reassembling/fragmenting packets and, when negotiated, passing each
/// physical packet through a [`CompressionLayer`].
///
/// The codec does not own sequence numbers; every call takes the
/// [`Conversation`] that does.
#[derive(Debug)]
pub struct PacketCodec {
    byte_handler: ByteHandler,
    compression: Option<CompressionLayer>,
}

impl PacketCodec {
    pub fn new(byte_handler: ByteHandler) -> Self {
        Self {
            byte_handler,
            compression: None,
        }
    }

    pub fn byte_handler_mut(&mut self) -> &mut ByteHandler {
        &mut self.byte_handler
    }

    pub fn into_byte_handler(self) -> ByteHandler {
        self.byte_handler
    }

    /// Activates the compressed protocol; called once, right after the
    /// handshake response is accepted, if both sides negotiated
    /// `CLIENT_COMPRESS`.
    pub fn enable_compression(&mut self) {
        self.compression = Some(CompressionLayer::new());
    }

    pub fn is_compressed(&self) -> bool {
        self.compression.is_some()
    }

    /// Reads one logical payload, reassembling continuation packets and
    /// validating the sequence number of each physical packet against
    /// `conversation`.
    pub async fn read_packet(
        &mut self,
        conversation: &mut Conversation,
        on_error: ProtocolErrorBehavior,
    ) -> Result<Bytes> {
        let mut payload = BytesMut::new();

        loop {
            let (sequence, chunk) = self.read_physical_frame().await?;
            let expected = conversation.take_next();

            if let Err(e) = conversation.expect(sequence, expected) {
                if on_error == ProtocolErrorBehavior::Throw {
                    return Err(e);
                }
                debug!(
                    target: "mysql_wire::packet",
                    expected,
                    received = sequence,
                    "ignoring out-of-order sequence number"
                );
            }

            let chunk_len = chunk.len();
            payload.put_slice(&chunk);

            if chunk_len < MAX_PAYLOAD_LEN {
                break;
            }
            // `chunk_len == MAX_PAYLOAD_LEN` means a continuation packet
            // follows, even if that continuation is a terminating empty one.
        }

        Ok(payload.freeze())
    }

    /// Writes one logical payload, fragmenting at `MAX_PAYLOAD_LEN` and
    /// appending a terminating empty packet when `payload.len()` is a
    /// positive multiple of `MAX_PAYLOAD_LEN`.
    pub async fn write_packet(
        &mut self,
        conversation: &mut Conversation,
        payload: &[u8],
    ) -> Result<()> {
        let mut offset = 0;
        loop {
            let end = (offset + MAX_PAYLOAD_LEN).min(payload.len());
            let chunk = &payload[offset..end];
            let sequence = conversation.take_next();

            self.write_physical_frame(sequence, chunk).await?;

            offset = end;

            if chunk.len() < MAX_PAYLOAD_LEN {
                break;
            }
            if offset == payload.len() {
                // exact multiple: one more, empty, terminating packet
                let sequence = conversation.take_next();
                self.write_physical_frame(sequence, &[]).await?;
                break;
            }
        }

        self.byte_handler.flush().await
    }

    /// Reads exactly one physical packet (never resolves the `0xFFFFFF`
    /// continuation rule), transparently decompressing first if the
    /// compressed protocol is active.
    async fn read_physical_frame(&mut self) -> Result<(u8, Bytes)> {
        let framed = match &mut self.compression {
            Some(layer) => layer.read_frame(&mut self.byte_handler).await?,
            None => {
                let mut header = [0u8; 4];
                self.byte_handler.read_exact(&mut header).await?;
                let len = u32::from_le_bytes([header[0], header[1], header[2], 0]) as usize;
                let sequence = header[3];

                let mut payload = vec![0u8; len];
                self.byte_handler.read_exact(&mut payload).await?;
                return Ok((sequence, Bytes::from(payload)));
            }
        };

        if framed.len() < 4 {
            return Err(Error::protocol("decompressed packet shorter than header"));
        }
        let len = u32::from_le_bytes([framed[0], framed[1], framed[2], 0]) as usize;
        let sequence = framed[3];
        if framed.len() != 4 + len {
            return Err(Error::protocol("decompressed packet length mismatch"));
        }

        Ok((sequence, framed.slice(4..)))
    }

    async fn write_physical_frame(&mut self, sequence: u8, payload: &[u8]) -> Result<()> {
        let mut framed = BytesMut::with_capacity(4 + payload.len());
        let len = payload.len() as u32;
        framed.put_slice(&len.to_le_bytes()[..3]);
        framed.put_u8(sequence);
        framed.put_slice(payload);

        match &mut self.compression {
            Some(layer) => layer.write_frame(&mut self.byte_handler, &framed).await,
            None => self.byte_handler.write_all(&framed).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::test_support::InMemoryByteHandler;

    fn codec_pair() -> (PacketCodec, PacketCodec) {
        let (a, b) = InMemoryByteHandler::duplex_pair();
        (PacketCodec::new(a.into()), PacketCodec::new(b.into()))
    }

    #[tokio::test]
    async fn it_round_trips_a_small_payload() {
        let (mut writer, mut reader) = codec_pair();
        let mut conv_w = Conversation::new();
        let mut conv_r = Conversation::new();
        conv_w.start_new();
        conv_r.start_new();

        writer.write_packet(&mut conv_w, b"hello").await.unwrap();
        let got = reader
            .read_packet(&mut conv_r, ProtocolErrorBehavior::Throw)
            .await
            .unwrap();
        assert_eq!(&got[..], b"hello");
    }

    #[tokio::test]
    async fn it_round_trips_a_payload_at_the_fragmentation_boundary() {
        let (mut writer, mut reader) = codec_pair();
        let mut conv_w = Conversation::new();
        let mut conv_r = Conversation::new();
        conv_w.start_new();
        conv_r.start_new();

        let payload = vec![0x42u8; MAX_PAYLOAD_LEN];
        writer.write_packet(&mut conv_w, &payload).await.unwrap();
        let got = reader
            .read_packet(&mut conv_r, ProtocolErrorBehavior::Throw)
            .await
            .unwrap();
        assert_eq!(got.len(), MAX_PAYLOAD_LEN);
        assert_eq!(&got[..], &payload[..]);
    }

    #[tokio::test]
    async fn it_round_trips_an_exact_multiple_with_a_terminating_empty_packet() {
        let (mut writer, mut reader) = codec_pair();
        let mut conv_w = Conversation::new();
        let mut conv_r = Conversation::new();
        conv_w.start_new();
        conv_r.start_new();

        let payload = vec![0x7Au8; MAX_PAYLOAD_LEN * 2];
        writer.write_packet(&mut conv_w, &payload).await.unwrap();
        let got = reader
            .read_packet(&mut conv_r, ProtocolErrorBehavior::Throw)
            .await
            .unwrap();
        assert_eq!(got.len(), payload.len());
        assert_eq!(&got[..], &payload[..]);
    }

    #[tokio::test]
    async fn it_rejects_an_out_of_order_sequence() {
        let (mut writer, mut reader) = codec_pair();
        let mut conv_w = Conversation::new();
        let mut conv_r = Conversation::new();
        conv_w.start_new();
        conv_r.start_new();
        conv_r.take_next(); // desynchronize: reader now expects sequence 1

        writer.write_packet(&mut conv_w, b"hi").await.unwrap();
        let err = reader
            .read_packet(&mut conv_r, ProtocolErrorBehavior::Throw)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn it_swallows_an_out_of_order_sequence_when_asked_to_ignore() {
        let (mut writer, mut reader) = codec_pair();
        let mut conv_w = Conversation::new();
        let mut conv_r = Conversation::new();
        conv_w.start_new();
        conv_r.start_new();
        conv_r.take_next();

        writer.write_packet(&mut conv_w, b"hi").await.unwrap();
        let got = reader
            .read_packet(&mut conv_r, ProtocolErrorBehavior::Ignore)
            .await
            .unwrap();
        assert_eq!(&got[..], b"hi");
    }
}
