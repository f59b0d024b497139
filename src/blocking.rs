//! A blocking facade over [`Session`], for callers without their own
//! `tokio` runtime.
//!
//! Async stays canonical: this wrapper drives the same state machine to
//! completion on a dedicated single-threaded runtime it owns, rather than
//! reimplementing the protocol synchronously. Every method here is a
//! one-line `block_on` around the matching [`Session`] method.

use tokio::runtime::Runtime;

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::options::ConnectOptions;
use crate::result::ResultSetCursor;
use crate::session::{ConnectionState, Session};

/// Owns a single-threaded `tokio` runtime and a [`Session`], and exposes
/// the session's operations without requiring the caller to be inside an
/// async context.
///
/// Not `Send` across an actual async boundary in any useful way — this is
/// for callers who are themselves synchronous, not for mixing sync and
/// async code in the same process. Every call races against a single
/// [`CancellationToken`] owned by this session; fire it from another thread
/// via [`BlockingSession::cancel_handle`] to unblock a call stuck on I/O.
#[derive(Debug)]
pub struct BlockingSession {
    runtime: Runtime,
    session: Session,
    cancel: CancellationToken,
}

impl BlockingSession {
    pub fn connect(options: &ConnectOptions) -> Result<Self> {
        let runtime = Runtime::new().map_err(crate::error::Error::Io)?;
        let cancel = CancellationToken::new();
        let session = runtime.block_on(Session::connect(options, &cancel))?;
        Ok(Self { runtime, session, cancel })
    }

    /// A handle that, when `cancel()`d from another thread, unblocks
    /// whichever call on this session is currently suspended on I/O.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn server_version(&self) -> &str {
        self.session.server_version()
    }

    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        let cancel = self.cancel.clone();
        self.runtime.block_on(self.session.send(payload, &cancel))
    }

    pub fn send_reply(&mut self, payload: &[u8]) -> Result<()> {
        let cancel = self.cancel.clone();
        self.runtime.block_on(self.session.send_reply(payload, &cancel))
    }

    pub fn receive(&mut self) -> Result<bytes::Bytes> {
        let cancel = self.cancel.clone();
        self.runtime.block_on(self.session.receive(&cancel))
    }

    pub fn receive_reply(&mut self) -> Result<bytes::Bytes> {
        let cancel = self.cancel.clone();
        self.runtime.block_on(self.session.receive_reply(&cancel))
    }

    /// Sends a `COM_QUERY` and opens a cursor over its result.
    pub fn query(&mut self, sql: &str) -> Result<ResultSetCursor<'_>> {
        let mut payload = Vec::new();
        crate::protocol::command::encode_com_query(&mut payload, sql);

        let session = &mut self.session;
        let runtime = &self.runtime;
        let cancel = self.cancel.clone();
        runtime.block_on(session.send(&payload, &cancel))?;
        runtime.block_on(ResultSetCursor::open(session, &cancel))
    }

    pub fn reset(&mut self, username: &str, password: &str, database: Option<&str>) -> Result<()> {
        let cancel = self.cancel.clone();
        self.runtime
            .block_on(self.session.reset(username, password, database, &cancel))
    }

    pub fn try_ping(&mut self) -> bool {
        let cancel = self.cancel.clone();
        self.runtime.block_on(self.session.try_ping(&cancel))
    }

    pub fn dispose(self) {
        let BlockingSession { runtime, session, .. } = self;
        runtime.block_on(session.dispose());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_rejects_connecting_with_invalid_options() {
        let options = ConnectOptions::new("root");
        let err = BlockingSession::connect(&options).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }
}
