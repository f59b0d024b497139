//! The legacy `EOF` payload: terminates a column-definition list, and (on
//! servers/sessions without `CLIENT_DEPRECATE_EOF`) a row list too.

use crate::error::{Error, Result};
use crate::io::Buf;
use crate::protocol::status::Status;

#[derive(Debug, Clone, Copy)]
pub struct EofPacket {
    pub warnings: u16,
    pub status: Status,
}

impl EofPacket {
    pub fn read(mut buf: &[u8]) -> Result<Self> {
        let header = buf.get_u8()?;
        if header != 0xFE {
            return Err(Error::protocol(format!(
                "expected an EOF header (0xFE); received 0x{header:02X}"
            )));
        }

        let warnings = buf.get_u16_le()?;
        let status = Status::from_bits_truncate(buf.get_u16_le()?);

        Ok(Self { warnings, status })
    }

    /// A packet is only a *real* EOF if it's short enough: the legacy EOF
    /// marker (`0xFE`) collides with the lenenc-NULL sentinel and, in a
    /// wide enough row, with an actual column value. MySQL disambiguates
    /// by length: a genuine EOF packet is always under 9 bytes.
    pub fn looks_like_eof(payload: &[u8]) -> bool {
        payload.first() == Some(&0xFE) && payload.len() < 9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EOF: &[u8] = b"\xfe\x00\x00\x02\x00";

    #[test]
    fn it_decodes_eof() {
        let p = EofPacket::read(EOF).unwrap();
        assert_eq!(p.warnings, 0);
        assert!(p.status.contains(Status::AUTOCOMMIT));
    }

    #[test]
    fn it_recognizes_a_short_0xfe_payload_as_eof() {
        assert!(EofPacket::looks_like_eof(EOF));
    }

    #[test]
    fn it_does_not_mistake_a_long_0xfe_prefixed_row_for_eof() {
        let long_payload = vec![0xFEu8; 200];
        assert!(!EofPacket::looks_like_eof(&long_payload));
    }
}
