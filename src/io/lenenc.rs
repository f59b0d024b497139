//! Encoding side of the MySQL length-encoded integer, kept next to the
//! decoder in [`super::buf`] so the two stay in lockstep.

use super::BufMut;

/// Number of bytes [`write_lenenc_int`] will emit for `value`, used by
/// callers that need to size a buffer up front.
pub fn lenenc_int_len(value: u64) -> usize {
    match value {
        0..=0xFA => 1,
        0xFB..=0xFFFF => 3,
        0x1_0000..=0xFF_FFFF => 4,
        _ => 9,
    }
}

/// Always encodes at the *minimum* applicable width, per the invariant
/// tested in the round-trip suite.
pub fn write_lenenc_int(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xFA => buf.put_u8(value as u8),
        0xFB..=0xFFFF => {
            buf.put_u8(0xFC);
            buf.put_u16_le(value as u16);
        }
        0x1_0000..=0xFF_FFFF => {
            buf.put_u8(0xFD);
            buf.put_u24_le(value as u32);
        }
        _ => {
            buf.put_u8(0xFE);
            buf.put_u64_le(value);
        }
    }
}

pub fn write_lenenc_bytes(buf: &mut Vec<u8>, value: &[u8]) {
    write_lenenc_int(buf, value.len() as u64);
    buf.put_bytes(value);
}

pub fn write_lenenc_str(buf: &mut Vec<u8>, value: &str) {
    write_lenenc_bytes(buf, value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Buf;

    #[test]
    fn it_round_trips_every_width_boundary() {
        for value in [0u64, 0xFA, 0xFB, 0xFFFF, 0x1_0000, 0xFF_FFFF, 0x100_0000, u64::MAX] {
            let mut buf = Vec::new();
            write_lenenc_int(&mut buf, value);
            assert_eq!(buf.len(), lenenc_int_len(value));

            let mut slice: &[u8] = &buf;
            assert_eq!(slice.get_uint_lenenc().unwrap(), Some(value));
        }
    }

    #[test]
    fn it_uses_the_minimum_width() {
        let mut buf = Vec::new();
        write_lenenc_int(&mut buf, 5);
        assert_eq!(buf, vec![5]);
    }
}
