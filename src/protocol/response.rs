//! Dispatch of a reply payload to OK / ERR / EOF / "something else" by its
//! header byte, the shape every top-level reply in the protocol shares.

use crate::error::Result;
use crate::protocol::eof::EofPacket;
use crate::protocol::err::ErrPacket;
use crate::protocol::ok::OkPacket;

pub const HEADER_OK: u8 = 0x00;
pub const HEADER_ERR: u8 = 0xFF;
pub const HEADER_EOF: u8 = 0xFE;
pub const HEADER_LOCAL_INFILE: u8 = 0xFB;

pub enum GenericResponse {
    Ok(OkPacket),
    Err(ErrPacket),
    Eof(EofPacket),
    /// Not a control payload: a column count, a `ColumnDefinition41`, or a
    /// row, depending on where in the result-set state machine this was
    /// read. The caller decides how to interpret it.
    Other,
}

impl GenericResponse {
    pub fn classify(payload: &[u8]) -> Result<Self> {
        Ok(match payload.first().copied() {
            Some(HEADER_OK) => GenericResponse::Ok(OkPacket::read(payload)?),
            Some(HEADER_ERR) => GenericResponse::Err(ErrPacket::read(payload)?),
            Some(HEADER_EOF) if EofPacket::looks_like_eof(payload) => {
                GenericResponse::Eof(EofPacket::read(payload)?)
            }
            _ => GenericResponse::Other,
        })
    }

    /// Converts a server `ERR` into this crate's error type; a no-op for
    /// every other variant. Callers pattern-match on the `Ok`/`Eof`/`Other`
    /// variants themselves since those carry different payloads.
    pub fn into_result(self) -> Result<Self> {
        match self {
            GenericResponse::Err(e) => Err(e.into_error()),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_classifies_an_ok_payload() {
        let payload = b"\x00\x00\x00\x02@\x00\x00";
        assert!(matches!(
            GenericResponse::classify(payload).unwrap(),
            GenericResponse::Ok(_)
        ));
    }

    #[test]
    fn it_classifies_an_err_payload() {
        let payload = b"\xff\x19\x04#42000Unknown database 'unknown'";
        assert!(matches!(
            GenericResponse::classify(payload).unwrap(),
            GenericResponse::Err(_)
        ));
    }

    #[test]
    fn it_classifies_a_short_eof_payload() {
        let payload = b"\xfe\x00\x00\x02\x00";
        assert!(matches!(
            GenericResponse::classify(payload).unwrap(),
            GenericResponse::Eof(_)
        ));
    }

    #[test]
    fn it_classifies_a_wide_row_starting_with_0xfe_as_other() {
        let payload = vec![0xFEu8; 200];
        assert!(matches!(
            GenericResponse::classify(&payload).unwrap(),
            GenericResponse::Other
        ));
    }
}
