//! Client/server capability flags.
//!
//! <https://dev.mysql.com/doc/dev/mysql-server/latest/group__group__cs__capabilities__flags.html>

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u64 {
        const LONG_PASSWORD                  = 1;
        const FOUND_ROWS                     = 1 << 1;
        const LONG_FLAG                      = 1 << 2;
        const CONNECT_WITH_DB                = 1 << 3;
        const NO_SCHEMA                      = 1 << 4;
        const COMPRESS                       = 1 << 5;
        const ODBC                           = 1 << 6;
        const LOCAL_FILES                    = 1 << 7;
        const IGNORE_SPACE                   = 1 << 8;
        const PROTOCOL_41                    = 1 << 9;
        const INTERACTIVE                    = 1 << 10;
        const SSL                            = 1 << 11;
        const IGNORE_SIGPIPE                 = 1 << 12;
        const TRANSACTIONS                   = 1 << 13;
        const RESERVED2                      = 1 << 14;
        const SECURE_CONNECTION               = 1 << 15;
        const MULTI_STATEMENTS               = 1 << 16;
        const MULTI_RESULTS                  = 1 << 17;
        const PS_MULTI_RESULTS               = 1 << 18;
        const PLUGIN_AUTH                    = 1 << 19;
        const CONNECT_ATTRS                  = 1 << 20;
        const PLUGIN_AUTH_LENENC_DATA        = 1 << 21;
        const CAN_HANDLE_EXPIRED_PASSWORDS   = 1 << 22;
        const SESSION_TRACK                  = 1 << 23;
        const DEPRECATE_EOF                  = 1 << 24;
        const SSL_VERIFY_SERVER_CERT         = 1 << 30;
        const REMEMBER_OPTIONS               = 1 << 31;
    }
}

impl Capabilities {
    /// The flags this core always asks for, per the `Required` set in
    /// the wire-protocol interface contract.
    pub fn required() -> Self {
        Capabilities::PROTOCOL_41
            | Capabilities::SECURE_CONNECTION
            | Capabilities::LONG_PASSWORD
            | Capabilities::MULTI_RESULTS
    }
}
