//! Column type tags and field flags carried on a `ColumnDefinition41`
//! payload.
//!
//! <https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_basic_dt_integers.html>

/// The single-byte MySQL column type id. Kept as a thin newtype rather than
/// an exhaustive enum, since the server can in principle send a type id
/// this core doesn't know about — decoding falls back to
/// `Error::Unsupported` rather than refusing to parse the column list at
/// all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnType(pub u8);

impl ColumnType {
    pub const DECIMAL: ColumnType = ColumnType(0);
    pub const TINY: ColumnType = ColumnType(1);
    pub const SHORT: ColumnType = ColumnType(2);
    pub const LONG: ColumnType = ColumnType(3);
    pub const FLOAT: ColumnType = ColumnType(4);
    pub const DOUBLE: ColumnType = ColumnType(5);
    pub const NULL: ColumnType = ColumnType(6);
    pub const TIMESTAMP: ColumnType = ColumnType(7);
    pub const LONGLONG: ColumnType = ColumnType(8);
    pub const INT24: ColumnType = ColumnType(9);
    pub const DATE: ColumnType = ColumnType(10);
    pub const TIME: ColumnType = ColumnType(11);
    pub const DATETIME: ColumnType = ColumnType(12);
    pub const YEAR: ColumnType = ColumnType(13);
    pub const VARCHAR: ColumnType = ColumnType(15);
    pub const BIT: ColumnType = ColumnType(16);
    pub const JSON: ColumnType = ColumnType(245);
    pub const NEWDECIMAL: ColumnType = ColumnType(246);
    pub const ENUM: ColumnType = ColumnType(247);
    pub const SET: ColumnType = ColumnType(248);
    pub const TINY_BLOB: ColumnType = ColumnType(249);
    pub const MEDIUM_BLOB: ColumnType = ColumnType(250);
    pub const LONG_BLOB: ColumnType = ColumnType(251);
    pub const BLOB: ColumnType = ColumnType(252);
    pub const VAR_STRING: ColumnType = ColumnType(253);
    pub const STRING: ColumnType = ColumnType(254);
    pub const GEOMETRY: ColumnType = ColumnType(255);
}

/// The "binary" character-set id MySQL uses to mark a string column as
/// actually holding raw bytes (`BINARY`/`VARBINARY`/`BLOB`).
pub const CHARSET_BINARY: u16 = 63;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldFlags: u16 {
        const NOT_NULL       = 1;
        const PRIMARY_KEY    = 1 << 1;
        const UNIQUE_KEY     = 1 << 2;
        const MULTIPLE_KEY   = 1 << 3;
        const BLOB           = 1 << 4;
        const UNSIGNED       = 1 << 5;
        const ZEROFILL       = 1 << 6;
        const BINARY         = 1 << 7;
        const ENUM           = 1 << 8;
        const AUTO_INCREMENT = 1 << 9;
        const TIMESTAMP      = 1 << 10;
        const SET            = 1 << 11;
    }
}
