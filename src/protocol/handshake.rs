//! The initial `Handshake` (protocol version 10) packet the server sends
//! immediately after the connection opens.

use crate::io::Buf;
use crate::protocol::capabilities::Capabilities;
use crate::protocol::status::Status;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPlugin {
    MySqlNativePassword,
    /// Recognized so the handshake can be decoded and a clean
    /// `Error::Unsupported` raised during authentication, rather than
    /// failing to parse the handshake at all.
    CachingSha2Password,
    Other,
}

impl AuthPlugin {
    fn from_name(name: &str) -> Self {
        match name {
            "mysql_native_password" => AuthPlugin::MySqlNativePassword,
            "caching_sha2_password" => AuthPlugin::CachingSha2Password,
            _ => AuthPlugin::Other,
        }
    }
}

#[derive(Debug)]
pub struct Handshake {
    pub protocol_version: u8,
    pub server_version: String,
    pub connection_id: u32,
    pub server_capabilities: Capabilities,
    pub server_default_collation: u8,
    pub status: Status,
    pub auth_plugin: AuthPlugin,
    /// The full auth-plugin nonce (scramble), first and second parts
    /// reassembled into one contiguous buffer.
    pub auth_plugin_data: Vec<u8>,
}

impl Handshake {
    pub fn read(mut buf: &[u8]) -> Result<Self> {
        let protocol_version = buf.get_u8()?;
        if protocol_version != 10 {
            return Err(Error::unsupported(format!(
                "unsupported handshake protocol version {protocol_version}"
            )));
        }

        let server_version = buf.get_str_nul()?.to_owned();
        let connection_id = buf.get_u32_le()?;

        let mut scramble = Vec::with_capacity(20);
        scramble.extend_from_slice(buf.get_bytes(8)?);
        buf.advance(1)?; // reserved filler byte

        let capabilities_1 = buf.get_u16_le()?;
        let mut capabilities = Capabilities::from_bits_truncate(capabilities_1 as u64);

        let char_set = buf.get_u8()?;
        let status = Status::from_bits_truncate(buf.get_u16_le()?);

        let capabilities_2 = buf.get_u16_le()?;
        capabilities |= Capabilities::from_bits_truncate((capabilities_2 as u64) << 16);

        let auth_plugin_data_len = if capabilities.contains(Capabilities::PLUGIN_AUTH) {
            buf.get_u8()?
        } else {
            0
        };

        buf.advance(10)?; // reserved

        if capabilities.contains(Capabilities::SECURE_CONNECTION) {
            let len = (auth_plugin_data_len as i32 - 9).max(12) as usize;
            scramble.extend_from_slice(buf.get_bytes(len)?);
            buf.advance(1)?; // trailing NUL on the scramble
        }

        let auth_plugin = if capabilities.contains(Capabilities::PLUGIN_AUTH) {
            AuthPlugin::from_name(buf.get_str_nul()?)
        } else {
            AuthPlugin::MySqlNativePassword
        };

        Ok(Self {
            protocol_version,
            server_version,
            connection_id,
            server_capabilities: capabilities,
            server_default_collation: char_set,
            status,
            auth_plugin,
            auth_plugin_data: scramble,
        })
    }
}
