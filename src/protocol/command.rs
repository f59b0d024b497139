//! Client command encoders: the one-byte command id plus whatever payload
//! that command carries, sent at the start of a fresh [`Conversation`].
//!
//! [`Conversation`]: crate::transport::conversation::Conversation

use crate::io::BufMut;

const COM_QUIT: u8 = 0x01;
const COM_QUERY: u8 = 0x03;
const COM_PING: u8 = 0x0e;
const COM_RESET_CONNECTION: u8 = 0x1f;
const COM_CHANGE_USER: u8 = 0x11;

pub fn encode_com_quit(buf: &mut Vec<u8>) {
    buf.put_u8(COM_QUIT);
}

pub fn encode_com_query(buf: &mut Vec<u8>, query: &str) {
    buf.put_u8(COM_QUERY);
    buf.put_str(query);
}

pub fn encode_com_ping(buf: &mut Vec<u8>) {
    buf.put_u8(COM_PING);
}

pub fn encode_com_reset_connection(buf: &mut Vec<u8>) {
    buf.put_u8(COM_RESET_CONNECTION);
}

/// `username`/`database` rather than the full `HandshakeResponse41`-style
/// client-attribute block: this core re-authenticates with the same
/// `mysql_native_password` scramble it used on connect, not a renegotiated
/// capability set.
pub fn encode_com_change_user(
    buf: &mut Vec<u8>,
    username: &str,
    auth_response: &[u8],
    database: Option<&str>,
    client_collation: u8,
) {
    buf.put_u8(COM_CHANGE_USER);
    buf.put_str_nul(username);
    buf.put_u8(auth_response.len() as u8);
    buf.put_bytes(auth_response);
    buf.put_str_nul(database.unwrap_or(""));
    buf.put_u16_le(u16::from(client_collation));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_encodes_com_query_with_the_command_byte_first() {
        let mut buf = Vec::new();
        encode_com_query(&mut buf, "SELECT 1");
        assert_eq!(buf[0], COM_QUERY);
        assert_eq!(&buf[1..], b"SELECT 1");
    }

    #[test]
    fn it_encodes_com_ping_as_a_single_byte() {
        let mut buf = Vec::new();
        encode_com_ping(&mut buf);
        assert_eq!(buf, vec![COM_PING]);
    }

    #[test]
    fn it_encodes_com_quit_as_a_single_byte() {
        let mut buf = Vec::new();
        encode_com_quit(&mut buf);
        assert_eq!(buf, vec![COM_QUIT]);
    }
}
