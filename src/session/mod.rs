//! The session lifecycle: connect, authenticate, converse, reset, quit,
//! dispose.
//!
//! States form `Created` → `Connected` → `Failed`/`Closed`, with `Failed`
//! reachable only from `Connected` once a fatal protocol or transport
//! error has occurred; any operation against a non-`Connected` session
//! fails fast rather than touching the wire.

mod tls;

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::options::ConnectOptions;
use crate::protocol::auth::scramble_mysql_native_password;
use crate::protocol::auth_switch::AuthSwitchRequest;
use crate::protocol::capabilities::Capabilities;
use crate::protocol::command::{
    encode_com_change_user, encode_com_ping, encode_com_query, encode_com_quit,
    encode_com_reset_connection,
};
use crate::protocol::err::ErrPacket;
use crate::protocol::handshake::{AuthPlugin, Handshake};
use crate::protocol::handshake_response::HandshakeResponse;
use crate::protocol::ok::OkPacket;
use crate::protocol::ssl_request::SslRequest;
use crate::transport::byte_handler::ByteHandler;
use crate::transport::conversation::{Conversation, ProtocolErrorBehavior};
use crate::transport::packet::PacketCodec;

const CLIENT_COLLATION_UTF8MB4: u8 = 45;
const MAX_PACKET_SIZE: u32 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Created,
    Connected,
    Failed,
    Closed,
}

/// A live (or not-yet-live, or no-longer-live) conversation with one MySQL
/// server. Owns its byte handler and codec stack exclusively; a
/// [`crate::result::ResultSetCursor`] only ever borrows it.
#[derive(Debug)]
pub struct Session {
    state: ConnectionState,
    codec: Option<PacketCodec>,
    conversation: Conversation,
    capabilities: Capabilities,
    server_version: String,
    connection_id: u32,
    auth_plugin_data: Vec<u8>,
    hostname: String,
    /// Opaque pool identity; this core never dereferences it, per the
    /// weak-reference guidance for the Session/pool relationship.
    pool_generation: u64,
}

impl Session {
    pub fn created() -> Self {
        Self {
            state: ConnectionState::Created,
            codec: None,
            conversation: Conversation::new(),
            capabilities: Capabilities::empty(),
            server_version: String::new(),
            connection_id: 0,
            auth_plugin_data: Vec::new(),
            hostname: String::new(),
            pool_generation: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    pub fn pool_generation(&self) -> u64 {
        self.pool_generation
    }

    pub fn set_pool_generation(&mut self, generation: u64) {
        self.pool_generation = generation;
    }

    fn require_connected(&self) -> Result<()> {
        match self.state {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Closed => Err(Error::ObjectDisposed),
            ConnectionState::Created | ConnectionState::Failed => {
                Err(Error::InvalidState("session is not connected"))
            }
        }
    }

    fn fail(&mut self, err: &Error) {
        if err.is_fatal_to_session() && self.state == ConnectionState::Connected {
            warn!(
                target: "mysql_wire::session",
                connection_id = self.connection_id,
                error = %err,
                "session transitioning to Failed"
            );
            self.state = ConnectionState::Failed;
        }
    }

    /// Connects to the first reachable address among `options.hosts`,
    /// performs the handshake, optionally upgrades to TLS, and
    /// authenticates with `mysql_native_password`.
    ///
    /// Cancelling `cancel` at any point before this returns disposes the
    /// partially-established socket and surfaces `Error::ConnectTimeout`
    /// rather than leaving a half-authenticated session behind.
    pub async fn connect(options: &ConnectOptions, cancel: &CancellationToken) -> Result<Self> {
        options.validate()?;

        let mut session = Session::created();

        let outcome = tokio::select! {
            result = session.connect_inner(options) => result,
            _ = cancel.cancelled() => Err(Error::ConnectTimeout),
        };

        match outcome {
            Ok(()) => {
                session.state = ConnectionState::Connected;
                Ok(session)
            }
            Err(e) => {
                if matches!(e, Error::ConnectTimeout) {
                    if let Some(codec) = session.codec.take() {
                        let _ = codec.into_byte_handler().shutdown().await;
                    }
                    debug!(target: "mysql_wire::session", "connect cancelled, socket disposed");
                }
                session.state = ConnectionState::Failed;
                Err(e)
            }
        }
    }

    async fn connect_inner(&mut self, options: &ConnectOptions) -> Result<()> {
        let (stream, hostname) = connect_to_any_host(&options.hosts, options.port).await?;
        self.hostname = hostname;

        let byte_handler = ByteHandler::plain(stream);
        self.codec = Some(PacketCodec::new(byte_handler));

        let mut handshake_conversation = Conversation::new();
        handshake_conversation.start_new();

        let handshake_payload = self
            .codec
            .as_mut()
            .unwrap()
            .read_packet(&mut handshake_conversation, ProtocolErrorBehavior::Throw)
            .await?;
        let handshake = Handshake::read(&handshake_payload)?;

        debug!(
            target: "mysql_wire::session",
            connection_id = handshake.connection_id,
            server_version = %handshake.server_version,
            "received initial handshake"
        );

        if handshake.auth_plugin != AuthPlugin::MySqlNativePassword {
            return Err(Error::Authentication(
                "server requires an authentication plugin other than mysql_native_password".into(),
            ));
        }

        let mut client_capabilities =
            Capabilities::required() | Capabilities::PLUGIN_AUTH | Capabilities::COMPRESS;
        if options.database.is_some() {
            client_capabilities |= Capabilities::CONNECT_WITH_DB;
        }
        if options.ssl_mode.requires_tls() {
            client_capabilities |= Capabilities::SSL;
        }

        if options.ssl_mode.requires_tls() {
            if !handshake.server_capabilities.contains(Capabilities::SSL) {
                return Err(Error::Tls("server does not support TLS".into()));
            }
            self.send_ssl_request(&mut handshake_conversation, client_capabilities)
                .await?;
            self.upgrade_to_tls(options).await?;
        }

        let password = options.password.as_deref().unwrap_or("");
        let auth_response = scramble_mysql_native_password(password, &handshake.auth_plugin_data);

        self.send_handshake_response(
            &mut handshake_conversation,
            client_capabilities,
            &options.username,
            options.database.as_deref(),
            "mysql_native_password",
            &auth_response,
        )
        .await?;

        self.complete_authentication(&mut handshake_conversation, password)
            .await?;

        self.capabilities = client_capabilities & handshake.server_capabilities;
        self.server_version = handshake.server_version;
        self.connection_id = handshake.connection_id;
        self.auth_plugin_data = handshake.auth_plugin_data;

        if self.capabilities.contains(Capabilities::COMPRESS) {
            self.codec.as_mut().unwrap().enable_compression();
            debug!(
                target: "mysql_wire::session",
                connection_id = self.connection_id,
                "compressed protocol enabled"
            );
        }

        Ok(())
    }

    async fn send_ssl_request(
        &mut self,
        conversation: &mut Conversation,
        client_capabilities: Capabilities,
    ) -> Result<()> {
        let request = SslRequest {
            client_capabilities,
            max_packet_size: MAX_PACKET_SIZE,
            client_collation: CLIENT_COLLATION_UTF8MB4,
        };
        let mut buf = Vec::new();
        request.encode(&mut buf);

        self.codec
            .as_mut()
            .unwrap()
            .write_packet(conversation, &buf)
            .await
    }

    #[cfg(feature = "tls")]
    async fn upgrade_to_tls(&mut self, options: &ConnectOptions) -> Result<()> {
        let codec = self.codec.take().expect("codec present during handshake");
        let plain = codec.into_byte_handler().into_plain_socket()?;

        let tls_handler = tls::upgrade(
            plain,
            &self.hostname,
            options.cert_provider.as_ref(),
        )
        .await?;

        self.codec = Some(PacketCodec::new(tls_handler));
        Ok(())
    }

    #[cfg(not(feature = "tls"))]
    async fn upgrade_to_tls(&mut self, _options: &ConnectOptions) -> Result<()> {
        Err(Error::Unsupported("this build does not include TLS support".into()))
    }

    async fn send_handshake_response(
        &mut self,
        conversation: &mut Conversation,
        client_capabilities: Capabilities,
        username: &str,
        database: Option<&str>,
        auth_plugin_name: &str,
        auth_response: &[u8],
    ) -> Result<()> {
        let response = HandshakeResponse {
            client_capabilities,
            max_packet_size: MAX_PACKET_SIZE,
            client_collation: CLIENT_COLLATION_UTF8MB4,
            username,
            database,
            auth_plugin_name,
            auth_response,
        };
        let mut buf = Vec::new();
        response.encode(&mut buf);

        self.codec
            .as_mut()
            .unwrap()
            .write_packet(conversation, &buf)
            .await
    }

    /// Reads the server's reply to the handshake response, following at
    /// most one `AuthSwitchRequest` (used when the server insists on a
    /// different nonce for the same `mysql_native_password` plugin).
    async fn complete_authentication(
        &mut self,
        conversation: &mut Conversation,
        password: &str,
    ) -> Result<()> {
        let payload = self
            .codec
            .as_mut()
            .unwrap()
            .read_packet(conversation, ProtocolErrorBehavior::Throw)
            .await?;

        match payload.first().copied() {
            Some(0x00) => {
                OkPacket::read(&payload)?;
                Ok(())
            }
            Some(0xFF) => {
                let err = ErrPacket::read(&payload)?;
                debug!(
                    target: "mysql_wire::auth",
                    code = err.error_code,
                    sql_state = %err.sql_state,
                    message = %err.error_message,
                    "server returned ERR for handshake response"
                );
                Err(Error::Authentication(err.error_message))
            }
            Some(0xFE) => {
                let switch = AuthSwitchRequest::read(&payload)?;
                if switch.auth_plugin_name != "mysql_native_password" {
                    return Err(Error::Authentication(format!(
                        "server switched to unsupported authentication plugin {}",
                        switch.auth_plugin_name
                    )));
                }

                let auth_response =
                    scramble_mysql_native_password(password, &switch.auth_plugin_data);

                self.codec
                    .as_mut()
                    .unwrap()
                    .write_packet(conversation, &auth_response)
                    .await?;

                let final_payload = self
                    .codec
                    .as_mut()
                    .unwrap()
                    .read_packet(conversation, ProtocolErrorBehavior::Throw)
                    .await?;

                match final_payload.first().copied() {
                    Some(0x00) => {
                        OkPacket::read(&final_payload)?;
                        Ok(())
                    }
                    Some(0xFF) => {
                        let err = ErrPacket::read(&final_payload)?;
                        debug!(
                            target: "mysql_wire::auth",
                            code = err.error_code,
                            sql_state = %err.sql_state,
                            message = %err.error_message,
                            "server returned ERR following auth switch"
                        );
                        Err(Error::Authentication(err.error_message))
                    }
                    _ => Err(Error::protocol("unexpected payload following auth switch")),
                }
            }
            _ => Err(Error::protocol("unexpected payload following handshake response")),
        }
    }

    /// Starts a new conversation and writes `payload` as its first packet.
    ///
    /// Cancelling `cancel` mid-write faults the operation and marks the
    /// session `Failed`: a partially-written packet cannot be recovered.
    pub async fn send(&mut self, payload: &[u8], cancel: &CancellationToken) -> Result<()> {
        self.require_connected()?;
        self.conversation.start_new();
        self.write_current(payload, cancel).await
    }

    /// Starts a new conversation and reads its first packet.
    pub async fn receive(&mut self, cancel: &CancellationToken) -> Result<Bytes> {
        self.require_connected()?;
        self.conversation.start_new();
        self.read_current(cancel).await
    }

    /// Continues the current conversation with an outbound packet.
    pub async fn send_reply(&mut self, payload: &[u8], cancel: &CancellationToken) -> Result<()> {
        self.require_connected()?;
        self.require_started()?;
        self.write_current(payload, cancel).await
    }

    /// Continues the current conversation with an inbound packet.
    pub async fn receive_reply(&mut self, cancel: &CancellationToken) -> Result<Bytes> {
        self.require_connected()?;
        self.require_started()?;
        self.read_current(cancel).await
    }

    fn require_started(&self) -> Result<()> {
        if self.conversation.is_started() {
            Ok(())
        } else {
            Err(Error::InvalidState(
                "send_reply/receive_reply called without a preceding send/receive",
            ))
        }
    }

    async fn write_current(&mut self, payload: &[u8], cancel: &CancellationToken) -> Result<()> {
        let codec = self.codec.as_mut().expect("connected session has a codec");
        tokio::select! {
            result = codec.write_packet(&mut self.conversation, payload) => {
                if let Err(e) = &result {
                    self.fail(e);
                }
                result
            }
            _ = cancel.cancelled() => {
                self.fail(&Error::Cancelled);
                Err(Error::Cancelled)
            }
        }
    }

    async fn read_current(&mut self, cancel: &CancellationToken) -> Result<Bytes> {
        let codec = self.codec.as_mut().expect("connected session has a codec");
        tokio::select! {
            result = codec.read_packet(&mut self.conversation, ProtocolErrorBehavior::Throw) => {
                if let Err(e) = &result {
                    self.fail(e);
                }
                result
            }
            _ = cancel.cancelled() => {
                self.fail(&Error::Cancelled);
                Err(Error::Cancelled)
            }
        }
    }

    /// Resets session state server-side: `COM_RESET_CONNECTION` on modern
    /// servers, `COM_CHANGE_USER` (with a full re-authentication) otherwise.
    pub async fn reset(
        &mut self,
        username: &str,
        password: &str,
        database: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.require_connected()?;

        if server_supports_reset_connection(&self.server_version) {
            let mut buf = Vec::new();
            encode_com_reset_connection(&mut buf);
            self.send(&buf, cancel).await?;
            let reply = self.receive_reply(cancel).await?;
            OkPacket::read(&reply).map_err(|e| {
                self.fail(&e);
                e
            })?;

            let mut set_names = Vec::new();
            encode_com_query(&mut set_names, "SET NAMES utf8mb4");
            self.send(&set_names, cancel).await?;
            let set_names_reply = self.receive_reply(cancel).await?;
            OkPacket::read(&set_names_reply).map_err(|e| {
                self.fail(&e);
                e
            })?;

            return Ok(());
        }

        let auth_response = scramble_mysql_native_password(password, &self.auth_plugin_data);
        let mut buf = Vec::new();
        encode_com_change_user(&mut buf, username, &auth_response, database, CLIENT_COLLATION_UTF8MB4);
        self.send(&buf, cancel).await?;

        let reply = self.receive_reply(cancel).await?;
        match reply.first().copied() {
            Some(0x00) => {
                OkPacket::read(&reply)?;
                Ok(())
            }
            Some(0xFE) => {
                let switch = AuthSwitchRequest::read(&reply)?;
                let auth_response =
                    scramble_mysql_native_password(password, &switch.auth_plugin_data);
                self.send_reply(&auth_response, cancel).await?;
                let final_reply = self.receive_reply(cancel).await?;
                OkPacket::read(&final_reply)?;
                self.auth_plugin_data = switch.auth_plugin_data;
                Ok(())
            }
            Some(0xFF) => {
                let err = ErrPacket::read(&reply)?;
                debug!(
                    target: "mysql_wire::auth",
                    code = err.error_code,
                    sql_state = %err.sql_state,
                    message = %err.error_message,
                    "server returned ERR for COM_CHANGE_USER"
                );
                Err(err.into_error())
            }
            _ => Err(Error::protocol("unexpected payload following COM_CHANGE_USER")),
        }
    }

    /// `COM_PING`; swallows I/O, protocol, and cancellation failures and
    /// reports them as `false` rather than surfacing an error, per the
    /// local-recovery policy for this one operation.
    pub async fn try_ping(&mut self, cancel: &CancellationToken) -> bool {
        let mut buf = Vec::new();
        encode_com_ping(&mut buf);

        if self.send(&buf, cancel).await.is_err() {
            return false;
        }
        match self.receive_reply(cancel).await {
            Ok(reply) => OkPacket::read(&reply).is_ok(),
            Err(_) => false,
        }
    }

    /// Best-effort `COM_QUIT` and socket shutdown; never fails.
    pub async fn dispose(mut self) {
        if self.state == ConnectionState::Connected {
            let mut buf = Vec::new();
            encode_com_quit(&mut buf);
            let _ = self.send(&buf, &CancellationToken::new()).await;
        }

        if let Some(codec) = self.codec.as_mut() {
            let _ = codec.byte_handler_mut().shutdown().await;
        }

        self.state = ConnectionState::Closed;
    }

    pub(crate) fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Builds an already-`Connected` session directly on top of a given
    /// byte handler, bypassing `connect`'s handshake. Used by the test
    /// suites of collaborators (like [`crate::result::ResultSetCursor`])
    /// that need a session without a live server.
    #[cfg(test)]
    pub(crate) fn for_test(byte_handler: ByteHandler) -> Self {
        let mut session = Session::created();
        session.codec = Some(PacketCodec::new(byte_handler));
        session.state = ConnectionState::Connected;
        session.server_version = "8.0.0-test".to_owned();
        session
    }
}

async fn connect_to_any_host(hosts: &[String], port: u16) -> Result<(TcpStream, String)> {
    let mut last_error = None;

    for host in hosts {
        debug!(target: "mysql_wire::session", host = %host, port, "attempting connection");
        match resolve_and_connect(host, port).await {
            Ok(stream) => return Ok((stream, host.clone())),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or_else(|| Error::protocol("no hosts configured")))
}

async fn resolve_and_connect(host: &str, port: u16) -> Result<TcpStream> {
    let addrs: Vec<SocketAddr> = lookup_host((host, port)).await?.collect();
    if addrs.is_empty() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no addresses found for host {host}"),
        )));
    }

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }

    Err(Error::Io(last_error.expect("at least one address was attempted")))
}

/// `COM_RESET_CONNECTION` was introduced in MySQL 5.7.3 / MariaDB 10.2.4;
/// treated conservatively, anything parsed below 5.7 falls back to
/// `COM_CHANGE_USER`.
fn server_supports_reset_connection(server_version: &str) -> bool {
    let digits: Vec<u32> = server_version
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .take(3)
        .collect();

    matches!(digits.as_slice(), [major, minor, ..] if *major > 5 || (*major == 5 && *minor >= 7))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_detects_reset_connection_support_by_version() {
        assert!(server_supports_reset_connection("8.0.18"));
        assert!(server_supports_reset_connection("5.7.14"));
        assert!(!server_supports_reset_connection("5.6.51"));
        assert!(!server_supports_reset_connection("5.5.5-10.4.7-MariaDB-1:10.4.7+maria~bionic"));
    }

    #[test]
    fn a_newly_created_session_is_not_connected() {
        let session = Session::created();
        assert_eq!(session.state(), ConnectionState::Created);
        assert!(session.require_connected().is_err());
    }
}
