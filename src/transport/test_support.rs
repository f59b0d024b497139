//! In-memory transport for exercising the framing and session layers
//! without a live server.

#![cfg(test)]

use tokio::io::DuplexStream;

/// An in-memory, full-duplex byte pipe standing in for a TCP socket.
pub struct InMemoryByteHandler;

impl InMemoryByteHandler {
    /// Returns two connected halves: bytes written to one are read from
    /// the other.
    pub fn duplex_pair() -> (DuplexStream, DuplexStream) {
        tokio::io::duplex(64 * 1024)
    }
}
