//! The `OK` payload: server acknowledgement of a successful command, or
//! (with `CLIENT_DEPRECATE_EOF`) the terminator of a result set.

use crate::error::{Error, Result};
use crate::io::Buf;
use crate::protocol::status::Status;

#[derive(Debug, Clone)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status: Status,
    pub warnings: u16,
    pub info: String,
}

impl OkPacket {
    pub fn read(mut buf: &[u8]) -> Result<Self> {
        let header = buf.get_u8()?;
        if header != 0x00 && header != 0xFE {
            return Err(Error::protocol(format!(
                "expected an OK header (0x00 or 0xFE); received 0x{header:02X}"
            )));
        }

        let affected_rows = buf.get_uint_lenenc()?.unwrap_or(0);
        let last_insert_id = buf.get_uint_lenenc()?.unwrap_or(0);
        let status = Status::from_bits_truncate(buf.get_u16_le()?);
        let warnings = buf.get_u16_le()?;
        let info = buf.get_str(buf.remaining())?.to_owned();

        Ok(Self {
            affected_rows,
            last_insert_id,
            status,
            warnings,
            info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_HANDSHAKE: &[u8] = b"\x00\x00\x00\x02@\x00\x00";

    #[test]
    fn it_decodes_ok_handshake() {
        let p = OkPacket::read(OK_HANDSHAKE).unwrap();

        assert_eq!(p.affected_rows, 0);
        assert_eq!(p.last_insert_id, 0);
        assert_eq!(p.warnings, 0);
        assert!(p.status.contains(Status::AUTOCOMMIT));
        assert!(p.status.contains(Status::SESSION_STATE_CHANGED));
        assert!(p.info.is_empty());
    }

    #[test]
    fn it_rejects_a_bad_header_byte() {
        let err = OkPacket::read(&[0x01, 0x00]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
