//! `AuthSwitchRequest`: the server asking the client to re-hash its
//! password with a different plugin and/or a fresh nonce, sent during
//! initial authentication and after `COM_CHANGE_USER`.

use crate::error::{Error, Result};
use crate::io::Buf;

#[derive(Debug)]
pub struct AuthSwitchRequest {
    pub auth_plugin_name: String,
    pub auth_plugin_data: Vec<u8>,
}

impl AuthSwitchRequest {
    pub fn read(mut buf: &[u8]) -> Result<Self> {
        let header = buf.get_u8()?;
        if header != 0xFE {
            return Err(Error::protocol(format!(
                "expected an AuthSwitchRequest header (0xFE); received 0x{header:02X}"
            )));
        }

        let auth_plugin_name = buf.get_str_nul()?.to_owned();
        let mut auth_plugin_data = buf.get_bytes(buf.remaining())?.to_vec();
        // the trailing NUL on the nonce is part of the wire format, not the nonce
        if auth_plugin_data.last() == Some(&0) {
            auth_plugin_data.pop();
        }

        Ok(Self {
            auth_plugin_name,
            auth_plugin_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_decodes_an_auth_switch_request() {
        let mut payload = vec![0xFE];
        payload.extend_from_slice(b"mysql_native_password\0");
        payload.extend_from_slice(b"01234567890123456789\0");

        let req = AuthSwitchRequest::read(&payload).unwrap();
        assert_eq!(req.auth_plugin_name, "mysql_native_password");
        assert_eq!(req.auth_plugin_data, b"01234567890123456789");
    }
}
