//! The lowest layer of the stack: read/write raw bytes over a socket, or a
//! TLS-wrapped socket after the in-place upgrade that happens mid-handshake.
//!
//! A single enum rather than a trait object, since there are exactly two
//! concrete transports and no caller needs to supply a third.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Error, Result};

#[cfg(feature = "tls")]
type TlsStream = tokio_rustls::client::TlsStream<TcpStream>;

/// Raw or TLS-wrapped byte transport underneath the packet codec.
///
/// `read` fills up to `buf.len()` bytes and returns `0` only at a clean
/// EOF; `write` either writes the whole segment or fails.
#[derive(Debug)]
pub enum ByteHandler {
    Plain(TcpStream),
    #[cfg(feature = "tls")]
    Tls(Box<TlsStream>),
    #[cfg(test)]
    Mock(tokio::io::DuplexStream),
}

impl ByteHandler {
    pub fn plain(stream: TcpStream) -> Self {
        ByteHandler::Plain(stream)
    }

    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = match self {
            ByteHandler::Plain(s) => s.read(buf).await?,
            #[cfg(feature = "tls")]
            ByteHandler::Tls(s) => s.read(buf).await?,
            #[cfg(test)]
            ByteHandler::Mock(s) => s.read(buf).await?,
        };
        Ok(n)
    }

    /// Fills `buf` completely or fails; a `0`-byte read before `buf` is
    /// full is reported as an `UnexpectedEof` `IoError`, matching the
    /// framing layer's assumption that a short read never happens silently.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..]).await?;
            if n == 0 {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed mid-packet",
                )));
            }
            filled += n;
        }
        Ok(())
    }

    pub async fn write_all(&mut self, segment: &[u8]) -> Result<()> {
        match self {
            ByteHandler::Plain(s) => s.write_all(segment).await?,
            #[cfg(feature = "tls")]
            ByteHandler::Tls(s) => s.write_all(segment).await?,
            #[cfg(test)]
            ByteHandler::Mock(s) => s.write_all(segment).await?,
        }
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        match self {
            ByteHandler::Plain(s) => s.flush().await?,
            #[cfg(feature = "tls")]
            ByteHandler::Tls(s) => s.flush().await?,
            #[cfg(test)]
            ByteHandler::Mock(s) => s.flush().await?,
        }
        Ok(())
    }

    /// Best-effort half-close, called from `Session::dispose` after the
    /// final `COM_QUIT` has been flushed (or attempted).
    pub async fn shutdown(&mut self) -> Result<()> {
        match self {
            ByteHandler::Plain(s) => s.shutdown().await?,
            #[cfg(feature = "tls")]
            ByteHandler::Tls(s) => s.shutdown().await?,
            #[cfg(test)]
            ByteHandler::Mock(s) => s.shutdown().await?,
        }
        Ok(())
    }

    /// Takes ownership of the plain socket underneath this handler so the
    /// caller can hand it to a TLS connector. Fails if TLS was already
    /// negotiated once — the protocol never re-upgrades mid-session.
    #[cfg(feature = "tls")]
    pub fn into_plain_socket(self) -> Result<TcpStream> {
        match self {
            ByteHandler::Plain(s) => Ok(s),
            ByteHandler::Tls(_) => Err(Error::protocol("stream is already TLS-wrapped")),
            #[cfg(test)]
            ByteHandler::Mock(_) => Err(Error::protocol("stream is already TLS-wrapped")),
        }
    }

    #[cfg(feature = "tls")]
    pub fn tls(stream: TlsStream) -> Self {
        ByteHandler::Tls(Box::new(stream))
    }

    pub fn is_tls(&self) -> bool {
        match self {
            ByteHandler::Plain(_) => false,
            #[cfg(feature = "tls")]
            ByteHandler::Tls(_) => true,
            #[cfg(test)]
            ByteHandler::Mock(_) => false,
        }
    }
}

#[cfg(test)]
impl From<tokio::io::DuplexStream> for ByteHandler {
    fn from(stream: tokio::io::DuplexStream) -> Self {
        ByteHandler::Mock(stream)
    }
}
