//! A MySQL client/server wire-protocol core: packet framing, the session
//! lifecycle (connect, authenticate, converse, reset, dispose), and
//! textual result-set streaming.
//!
//! This crate does not implement a connection pool, a query builder, or
//! prepared statements — see the module docs under [`session`] and
//! [`result`] for what it does cover.

mod io;
mod protocol;
mod transport;

pub mod blocking;
pub mod cancel;
pub mod error;
pub mod options;
pub mod result;
pub mod session;
pub mod value;

pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use options::{CertificateProvider, ConnectOptions, SslMode};
pub use protocol::{ColumnDefinition, ColumnType, FieldFlags};
pub use result::{CursorState, ResultSetCursor};
pub use session::{ConnectionState, Session};
pub use value::{SignedDuration, Value};
