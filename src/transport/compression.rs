//! The compressed protocol: each physical packet is wrapped in a 7-byte
//! header (u24 compressed length, u8 compressed sequence, u24 uncompressed
//! length) and, when it actually shrinks the payload, zlib-deflated.
//!
//! A thin wrapper the packet codec delegates to, using RFC1950 zlib
//! (`flate2`) rather than a hand-rolled inflate/deflate.

use bytes::{Bytes, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::transport::byte_handler::ByteHandler;

/// Below this size, compressing a packet isn't worth the CPU or the risk
/// that deflate overhead makes it larger; it's sent with the "uncompressed"
/// marker (compressed length == 0) instead.
const MIN_COMPRESS_LEN: usize = 50;

/// Owns the independent sequence counter the compressed protocol layers
/// on top of the inner packet sequence, and does the actual deflate/inflate.
#[derive(Debug)]
pub struct CompressionLayer {
    next_sequence: u8,
}

impl CompressionLayer {
    pub fn new() -> Self {
        Self { next_sequence: 0 }
    }

    fn take_sequence(&mut self) -> u8 {
        let seq = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        seq
    }

    /// Reads one compressed frame and returns the decompressed bytes of the
    /// physical packet it carries (header included).
    pub async fn read_frame(&mut self, byte_handler: &mut ByteHandler) -> Result<Bytes> {
        let mut header = [0u8; 7];
        byte_handler.read_exact(&mut header).await?;

        let compressed_len = u32::from_le_bytes([header[0], header[1], header[2], 0]) as usize;
        let _sequence = header[3];
        let uncompressed_len = u32::from_le_bytes([header[4], header[5], header[6], 0]) as usize;

        let mut body = vec![0u8; compressed_len];
        byte_handler.read_exact(&mut body).await?;

        if uncompressed_len == 0 {
            // marker for "not actually compressed"
            return Ok(Bytes::from(body));
        }

        let mut decoder = ZlibDecoder::new(&body[..]);
        let mut out = Vec::with_capacity(uncompressed_len);
        decoder
            .read_to_end(&mut out)
            .map_err(|e| Error::protocol(format!("zlib inflate failed: {e}")))?;

        if out.len() != uncompressed_len {
            return Err(Error::protocol(
                "decompressed length did not match the compressed header",
            ));
        }

        Ok(Bytes::from(out))
    }

    /// Wraps one physical packet's bytes in a compressed frame and writes
    /// it out, compressing only when it's large enough to be worth it and
    /// only keeping the compressed form if it's actually smaller.
    pub async fn write_frame(&mut self, byte_handler: &mut ByteHandler, framed: &[u8]) -> Result<()> {
        let sequence = self.take_sequence();

        let (compressed_payload, uncompressed_len) = if framed.len() < MIN_COMPRESS_LEN {
            (None, 0usize)
        } else {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder
                .write_all(framed)
                .map_err(|e| Error::protocol(format!("zlib deflate failed: {e}")))?;
            let compressed = encoder
                .finish()
                .map_err(|e| Error::protocol(format!("zlib deflate failed: {e}")))?;

            if compressed.len() < framed.len() {
                (Some(compressed), framed.len())
            } else {
                (None, 0usize)
            }
        };

        let mut out = BytesMut::with_capacity(7 + framed.len());
        match &compressed_payload {
            Some(compressed) => {
                out.extend_from_slice(&(compressed.len() as u32).to_le_bytes()[..3]);
                out.extend_from_slice(&[sequence]);
                out.extend_from_slice(&(uncompressed_len as u32).to_le_bytes()[..3]);
                out.extend_from_slice(compressed);
            }
            None => {
                out.extend_from_slice(&(framed.len() as u32).to_le_bytes()[..3]);
                out.extend_from_slice(&[sequence]);
                out.extend_from_slice(&0u32.to_le_bytes()[..3]);
                out.extend_from_slice(framed);
            }
        }

        byte_handler.write_all(&out).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::test_support::InMemoryByteHandler;

    #[tokio::test]
    async fn it_round_trips_a_large_compressible_frame() {
        let (a, b) = InMemoryByteHandler::duplex_pair();
        let mut a: ByteHandler = a.into();
        let mut b: ByteHandler = b.into();
        let mut writer = CompressionLayer::new();
        let mut reader = CompressionLayer::new();

        let payload = vec![0x41u8; 4096];
        writer.write_frame(&mut a, &payload).await.unwrap();
        let got = reader.read_frame(&mut b).await.unwrap();
        assert_eq!(&got[..], &payload[..]);
    }

    #[tokio::test]
    async fn it_round_trips_incompressible_data_uncompressed() {
        let (a, b) = InMemoryByteHandler::duplex_pair();
        let mut a: ByteHandler = a.into();
        let mut b: ByteHandler = b.into();
        let mut writer = CompressionLayer::new();
        let mut reader = CompressionLayer::new();

        // Too short to bother compressing.
        let payload = b"tiny payload".to_vec();
        writer.write_frame(&mut a, &payload).await.unwrap();
        let got = reader.read_frame(&mut b).await.unwrap();
        assert_eq!(&got[..], &payload[..]);
    }
}
