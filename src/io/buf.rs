use byteorder::{ByteOrder, LittleEndian};
use memchr::memchr;

use crate::error::{Error, Result};

/// A cursor over a borrowed payload buffer.
///
/// Every getter checks bounds and returns `Error::Protocol` instead of
/// panicking; MySQL packet bodies are attacker- or corruption-reachable
/// input and must never be trusted to be long enough.
pub trait Buf<'a> {
    fn advance(&mut self, cnt: usize) -> Result<()>;

    fn remaining(&self) -> usize;

    fn get_u8(&mut self) -> Result<u8>;

    fn get_u16_le(&mut self) -> Result<u16>;

    fn get_u24_le(&mut self) -> Result<u32>;

    fn get_u32_le(&mut self) -> Result<u32>;

    fn get_u64_le(&mut self) -> Result<u64>;

    fn get_str(&mut self, len: usize) -> Result<&'a str>;

    fn get_str_nul(&mut self) -> Result<&'a str>;

    fn get_bytes(&mut self, len: usize) -> Result<&'a [u8]>;

    /// The MySQL length-encoded integer. `None` is the `0xFB` NULL sentinel.
    fn get_uint_lenenc(&mut self) -> Result<Option<u64>>;

    fn get_str_lenenc(&mut self) -> Result<Option<&'a str>>;

    fn get_bytes_lenenc(&mut self) -> Result<Option<&'a [u8]>>;
}

impl<'a> Buf<'a> for &'a [u8] {
    fn advance(&mut self, cnt: usize) -> Result<()> {
        if cnt > self.len() {
            return Err(Error::protocol("unexpected end of packet"));
        }
        *self = &self[cnt..];
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.len()
    }

    fn get_u8(&mut self) -> Result<u8> {
        let val = *self
            .first()
            .ok_or_else(|| Error::protocol("unexpected end of packet"))?;
        self.advance(1)?;
        Ok(val)
    }

    fn get_u16_le(&mut self) -> Result<u16> {
        let bytes = self.get_bytes(2)?;
        Ok(LittleEndian::read_u16(bytes))
    }

    fn get_u24_le(&mut self) -> Result<u32> {
        let bytes = self.get_bytes(3)?;
        Ok(LittleEndian::read_u24(bytes))
    }

    fn get_u32_le(&mut self) -> Result<u32> {
        let bytes = self.get_bytes(4)?;
        Ok(LittleEndian::read_u32(bytes))
    }

    fn get_u64_le(&mut self) -> Result<u64> {
        let bytes = self.get_bytes(8)?;
        Ok(LittleEndian::read_u64(bytes))
    }

    fn get_str(&mut self, len: usize) -> Result<&'a str> {
        let bytes = self.get_bytes(len)?;
        std::str::from_utf8(bytes).map_err(|e| Error::protocol(format!("invalid utf-8: {e}")))
    }

    fn get_str_nul(&mut self) -> Result<&'a str> {
        let len = memchr(b'\0', self).ok_or_else(|| Error::protocol("unterminated string"))?;
        let s = self.get_str(len)?;
        self.advance(1)?; // the NUL terminator
        Ok(s)
    }

    fn get_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.len() {
            return Err(Error::protocol("unexpected end of packet"));
        }
        let (head, tail) = self.split_at(len);
        *self = tail;
        Ok(head)
    }

    fn get_uint_lenenc(&mut self) -> Result<Option<u64>> {
        Ok(match self.get_u8()? {
            0xFB => None,
            0xFC => Some(u64::from(self.get_u16_le()?)),
            0xFD => Some(u64::from(self.get_u24_le()?)),
            0xFE => Some(self.get_u64_le()?),
            value => Some(u64::from(value)),
        })
    }

    fn get_str_lenenc(&mut self) -> Result<Option<&'a str>> {
        match self.get_uint_lenenc()? {
            Some(len) => Ok(Some(self.get_str(len as usize)?)),
            None => Ok(None),
        }
    }

    fn get_bytes_lenenc(&mut self) -> Result<Option<&'a [u8]>> {
        match self.get_uint_lenenc()? {
            Some(len) => Ok(Some(self.get_bytes(len as usize)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_reads_fixed_width_integers() {
        let mut buf: &[u8] = &[0x01, 0x02, 0x00, 0x03, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00];
        assert_eq!(buf.get_u8().unwrap(), 0x01);
        assert_eq!(buf.get_u16_le().unwrap(), 0x0002);
        assert_eq!(buf.get_u24_le().unwrap(), 0x000003);
        assert_eq!(buf.get_u32_le().unwrap(), 0x00000004);
    }

    #[test]
    fn it_rejects_truncated_reads() {
        let mut buf: &[u8] = &[0x01];
        assert!(buf.get_u16_le().is_err());
    }

    #[test]
    fn it_reads_nul_terminated_strings() {
        let mut buf: &[u8] = b"hello\0world";
        assert_eq!(buf.get_str_nul().unwrap(), "hello");
        assert_eq!(buf.get_bytes(5).unwrap(), b"world");
    }

    #[test]
    fn it_reads_length_encoded_integers_at_each_width() {
        assert_eq!((&[0x05u8][..]).get_uint_lenenc().unwrap(), Some(5));
        assert_eq!(
            (&[0xFCu8, 0x00, 0x01][..]).get_uint_lenenc().unwrap(),
            Some(256)
        );
        assert_eq!(
            (&[0xFDu8, 0x00, 0x00, 0x01][..]).get_uint_lenenc().unwrap(),
            Some(0x0001_0000)
        );
        assert_eq!(
            (&[0xFEu8, 1, 0, 0, 0, 0, 0, 0, 0][..])
                .get_uint_lenenc()
                .unwrap(),
            Some(1)
        );
        assert_eq!((&[0xFBu8][..]).get_uint_lenenc().unwrap(), None);
    }
}
