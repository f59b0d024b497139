use byteorder::{ByteOrder, LittleEndian};

/// The write-side counterpart of [`super::Buf`]. Encoding never fails, so
/// unlike the read side there is no `Result` here.
pub trait BufMut {
    fn put_u8(&mut self, val: u8);
    fn put_u16_le(&mut self, val: u16);
    fn put_u24_le(&mut self, val: u32);
    fn put_u32_le(&mut self, val: u32);
    fn put_u64_le(&mut self, val: u64);
    fn put_bytes(&mut self, val: &[u8]);
    fn put_str(&mut self, val: &str);
    fn put_str_nul(&mut self, val: &str);
    fn put_zeroes(&mut self, count: usize);
}

impl BufMut for Vec<u8> {
    fn put_u8(&mut self, val: u8) {
        self.push(val);
    }

    fn put_u16_le(&mut self, val: u16) {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, val);
        self.extend_from_slice(&buf);
    }

    fn put_u24_le(&mut self, val: u32) {
        let mut buf = [0u8; 3];
        LittleEndian::write_u24(&mut buf, val);
        self.extend_from_slice(&buf);
    }

    fn put_u32_le(&mut self, val: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, val);
        self.extend_from_slice(&buf);
    }

    fn put_u64_le(&mut self, val: u64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, val);
        self.extend_from_slice(&buf);
    }

    fn put_bytes(&mut self, val: &[u8]) {
        self.extend_from_slice(val);
    }

    fn put_str(&mut self, val: &str) {
        self.extend_from_slice(val.as_bytes());
    }

    fn put_str_nul(&mut self, val: &str) {
        self.put_str(val);
        self.push(0);
    }

    fn put_zeroes(&mut self, count: usize) {
        self.resize(self.len() + count, 0);
    }
}
