//! `HandshakeResponse41`, the client's reply to the server's `Handshake`.

use crate::io::{write_lenenc_bytes, BufMut};
use crate::protocol::capabilities::Capabilities;

pub struct HandshakeResponse<'a> {
    pub client_capabilities: Capabilities,
    pub max_packet_size: u32,
    pub client_collation: u8,
    pub username: &'a str,
    pub database: Option<&'a str>,
    pub auth_plugin_name: &'a str,
    pub auth_response: &'a [u8],
}

impl HandshakeResponse<'_> {
    pub fn encode(&self, buf: &mut Vec<u8>) {
        let capabilities = self.client_capabilities;

        buf.put_u32_le(capabilities.bits() as u32);
        buf.put_u32_le(self.max_packet_size);
        buf.put_u8(self.client_collation);
        buf.put_zeroes(19);
        buf.put_u32_le((capabilities.bits() >> 32) as u32);

        buf.put_str_nul(self.username);

        if capabilities.contains(Capabilities::PLUGIN_AUTH_LENENC_DATA) {
            write_lenenc_bytes(buf, self.auth_response);
        } else if capabilities.contains(Capabilities::SECURE_CONNECTION) {
            buf.put_u8(self.auth_response.len() as u8);
            buf.put_bytes(self.auth_response);
        } else {
            buf.put_u8(0);
        }

        if capabilities.contains(Capabilities::CONNECT_WITH_DB) {
            if let Some(database) = self.database {
                buf.put_str_nul(database);
            }
        }

        if capabilities.contains(Capabilities::PLUGIN_AUTH) {
            buf.put_str_nul(self.auth_plugin_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Buf;

    #[test]
    fn it_encodes_a_well_formed_packet() {
        let response = HandshakeResponse {
            client_capabilities: Capabilities::required() | Capabilities::PLUGIN_AUTH,
            max_packet_size: 16 * 1024 * 1024,
            client_collation: 45,
            username: "root",
            database: Some("test"),
            auth_plugin_name: "mysql_native_password",
            auth_response: &[1, 2, 3, 4],
        };

        let mut buf = Vec::new();
        response.encode(&mut buf);

        let mut cursor: &[u8] = &buf;
        assert_eq!(
            cursor.get_u32_le().unwrap() as u64,
            response.client_capabilities.bits() & 0xFFFF_FFFF
        );
        assert_eq!(cursor.get_u32_le().unwrap(), 16 * 1024 * 1024);
        assert_eq!(cursor.get_u8().unwrap(), 45);
        cursor.advance(19).unwrap();
        cursor.advance(4).unwrap(); // extended capabilities
        assert_eq!(cursor.get_str_nul().unwrap(), "root");
        let len = cursor.get_u8().unwrap() as usize;
        assert_eq!(cursor.get_bytes(len).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(cursor.get_str_nul().unwrap(), "test");
        assert_eq!(cursor.get_str_nul().unwrap(), "mysql_native_password");
    }
}
