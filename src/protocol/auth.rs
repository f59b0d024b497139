//! The `mysql_native_password` authentication response.
//!
//! `caching_sha2_password`/`sha256_password` are out of scope: the
//! handshake still parses them (see
//! [`crate::protocol::handshake::AuthPlugin`]) so a connection to a server
//! defaulting to them fails with a clear `Error::Unsupported` rather than
//! a parse error.

use sha1::{Digest, Sha1};

/// `SHA1(password) XOR SHA1(nonce || SHA1(SHA1(password)))`.
///
/// `nonce` is the reassembled 20-byte auth-plugin-data from the handshake,
/// already stripped of its NUL terminator.
pub fn scramble_mysql_native_password(password: &str, nonce: &[u8]) -> [u8; 20] {
    let pw_hash = Sha1::digest(password.as_bytes());
    let pw_hash_hash = Sha1::digest(pw_hash);

    let mut ctx = Sha1::new();
    ctx.update(nonce);
    ctx.update(pw_hash_hash);
    let seed_hash = ctx.finalize();

    let mut out = [0u8; 20];
    for i in 0..20 {
        out[i] = pw_hash[i] ^ seed_hash[i];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // Known vector computed independently of this module, via
    // SHA1(pw) XOR SHA1(nonce || SHA1(SHA1(pw))) in Python's hashlib,
    // against a 20-byte nonce and an arbitrary password.
    #[test]
    fn it_matches_a_known_vector() {
        let nonce = b"abcdefghijklmnopqrst";
        let scramble = scramble_mysql_native_password("secret", nonce);
        assert_eq!(
            scramble,
            [
                0x88, 0x17, 0xc5, 0x0f, 0xa7, 0x79, 0xda, 0xef, 0x01, 0x0e, 0xe7, 0x57, 0x78,
                0x25, 0xb0, 0x84, 0x7d, 0xf9, 0x84, 0x2e,
            ]
        );
    }

    #[test]
    fn it_is_deterministic_for_a_given_password_and_nonce() {
        let nonce = b"t6L\\j\"dSU14Oph9\"<H5n";
        let a = scramble_mysql_native_password("hunter2", nonce);
        let b = scramble_mysql_native_password("hunter2", nonce);
        assert_eq!(a, b);
    }

    #[test]
    fn it_differs_for_different_passwords() {
        let nonce = b"t6L\\j\"dSU14Oph9\"<H5n";
        let a = scramble_mysql_native_password("hunter2", nonce);
        let b = scramble_mysql_native_password("hunter3", nonce);
        assert_ne!(a, b);
    }

    #[test]
    fn it_produces_a_twenty_byte_scramble() {
        let nonce = b"t6L\\j\"dSU14Oph9\"<H5n";
        let scramble = scramble_mysql_native_password("hunter2", nonce);
        assert_eq!(scramble.len(), 20);
    }
}
