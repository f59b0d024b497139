//! The `ERR` payload: a typed, expected failure of a command (as opposed to
//! a protocol or transport failure, which never produces one of these).

use crate::error::{Error, Result};
use crate::io::Buf;

#[derive(Debug, Clone)]
pub struct ErrPacket {
    pub error_code: u16,
    pub sql_state: String,
    pub error_message: String,
}

impl ErrPacket {
    pub fn read(mut buf: &[u8]) -> Result<Self> {
        let header = buf.get_u8()?;
        if header != 0xFF {
            return Err(Error::protocol(format!(
                "expected an ERR header (0xFF); received 0x{header:02X}"
            )));
        }

        let error_code = buf.get_u16_le()?;
        let _sql_state_marker = buf.get_u8()?;
        let sql_state = buf.get_str(5)?.to_owned();
        let error_message = buf.get_str(buf.remaining())?.to_owned();

        Ok(Self {
            error_code,
            sql_state,
            error_message,
        })
    }

    pub fn into_error(self) -> Error {
        Error::Server {
            code: self.error_code,
            sql_state: self.sql_state,
            message: self.error_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERR_HANDSHAKE_UNKNOWN_DB: &[u8] = b"\xff\x19\x04#42000Unknown database 'unknown'";

    #[test]
    fn it_decodes_err_unknown_database() {
        let p = ErrPacket::read(ERR_HANDSHAKE_UNKNOWN_DB).unwrap();

        assert_eq!(p.error_code, 1049);
        assert_eq!(p.sql_state, "42000");
        assert_eq!(p.error_message, "Unknown database 'unknown'");
    }

    #[test]
    fn it_converts_into_a_server_error() {
        let p = ErrPacket::read(ERR_HANDSHAKE_UNKNOWN_DB).unwrap();
        let err = p.into_error();
        assert!(err.is_fatal_to_session() == false);
        assert!(matches!(err, Error::Server { code: 1049, .. }));
    }
}
