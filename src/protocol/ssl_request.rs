//! `SSLRequest`, the truncated handshake-response sent before the TLS
//! handshake so the server knows to expect an upgrade.

use crate::io::BufMut;
use crate::protocol::capabilities::Capabilities;

pub struct SslRequest {
    pub client_capabilities: Capabilities,
    pub max_packet_size: u32,
    pub client_collation: u8,
}

impl SslRequest {
    pub fn encode(&self, buf: &mut Vec<u8>) {
        debug_assert!(
            self.client_capabilities.contains(Capabilities::SSL),
            "SSLRequest requires the SSL capability bit to be set"
        );

        buf.put_u32_le(self.client_capabilities.bits() as u32);
        buf.put_u32_le(self.max_packet_size);
        buf.put_u8(self.client_collation);
        buf.put_zeroes(23);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_encodes_the_fixed_length_preamble() {
        let req = SslRequest {
            client_capabilities: Capabilities::required() | Capabilities::SSL,
            max_packet_size: 16 * 1024 * 1024,
            client_collation: 45,
        };
        let mut buf = Vec::new();
        req.encode(&mut buf);
        assert_eq!(buf.len(), 4 + 4 + 1 + 23);
    }
}
