//! Error and Result types.

/// A specialized `Result` type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way an operation against [`crate::session::Session`] can fail.
///
/// This is the single error currency crossing every layer boundary
/// described in the wire-protocol layering: a lower layer never panics on
/// malformed-but-bounded input, it returns [`Error::Protocol`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket-level failure. Marks the owning session `Failed`.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed framing, bad sequence number, unsupported capability, or an
    /// unexpected payload shape. Marks the owning session `Failed`.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A typed `ERR` payload returned by the server. The session stays
    /// `Connected` — this is a normal, expected outcome of a query.
    #[error("server error {code} ({sql_state}): {message}")]
    Server {
        code: u16,
        sql_state: String,
        message: String,
    },

    /// The server refused credentials, or required an authentication plugin
    /// other than `mysql_native_password`. Marks the session `Failed`.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// A protocol feature this core intentionally does not implement
    /// (`LOCAL INFILE`, prepared statements, the binary row format, an
    /// unrecognized column type).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The caller invoked an operation that the session's current lifecycle
    /// state does not allow.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// The session has already been disposed; the only remaining legal call
    /// was already made.
    #[error("session already disposed")]
    ObjectDisposed,

    /// The caller's cancellation token fired while the operation was
    /// suspended on an already-established session. Marks the session
    /// `Failed`: protocol framing cannot be recovered after a partial
    /// packet.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's cancellation token fired while still connecting (socket
    /// connect, handshake, or authentication). The partially-established
    /// socket is disposed; there is no session to mark `Failed`.
    #[error("connect cancelled before the session was established")]
    ConnectTimeout,

    /// Establishing a TLS session failed.
    #[error("tls error: {0}")]
    Tls(String),

    /// `ConnectOptions` construction was invalid (e.g. an empty host list).
    /// Raised before any I/O is attempted.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Error::Protocol(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported(message.into())
    }

    /// `true` for the subset of errors that must transition the owning
    /// session to `Failed` (everything except a server-side `ERR` payload,
    /// which is a normal query outcome).
    pub fn is_fatal_to_session(&self) -> bool {
        !matches!(self, Error::Server { .. })
    }
}
