//! `ColumnDefinition41`, the per-column metadata packet preceding every
//! text-protocol result set.

use crate::error::{Error, Result};
use crate::io::Buf;
use crate::protocol::column_type::{ColumnType, FieldFlags};

#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub schema: Option<String>,
    pub table_alias: Option<String>,
    pub table: Option<String>,
    pub column_alias: Option<String>,
    pub column: Option<String>,
    pub char_set: u16,
    pub max_size: u32,
    pub column_type: ColumnType,
    pub flags: FieldFlags,
    pub decimals: u8,
}

impl ColumnDefinition {
    /// The name callers address this column by: its alias if the query
    /// gave it one, otherwise its underlying name.
    pub fn name(&self) -> Option<&str> {
        self.column_alias.as_deref().or(self.column.as_deref())
    }

    pub fn read(mut buf: &[u8]) -> Result<Self> {
        let catalog = buf.get_str_lenenc()?;
        if catalog != Some("def") {
            return Err(Error::protocol(format!(
                "expected catalog \"def\" in column definition; received {catalog:?}"
            )));
        }

        let schema = buf.get_str_lenenc()?.map(str::to_owned);
        let table_alias = buf.get_str_lenenc()?.map(str::to_owned);
        let table = buf.get_str_lenenc()?.map(str::to_owned);
        let column_alias = buf.get_str_lenenc()?.map(str::to_owned);
        let column = buf.get_str_lenenc()?.map(str::to_owned);

        let len_fixed_fields = buf.get_uint_lenenc()?.unwrap_or(0);
        if len_fixed_fields != 0x0c {
            return Err(Error::protocol(format!(
                "expected the fixed-length fields marker (0x0c) in column definition; received {len_fixed_fields}"
            )));
        }

        let char_set = buf.get_u16_le()?;
        let max_size = buf.get_u32_le()?;
        let column_type = ColumnType(buf.get_u8()?);
        let flags = FieldFlags::from_bits_truncate(buf.get_u16_le()?);
        let decimals = buf.get_u8()?;

        Ok(Self {
            schema,
            table_alias,
            table,
            column_alias,
            column,
            char_set,
            max_size,
            column_type,
            flags,
            decimals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `def`, schema "test", table/table_alias "t", column/column_alias "a",
    // fixed-fields marker, charset 63 (binary), max_size 11, type LONG (3),
    // flags NOT_NULL, decimals 0.
    fn fixture() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(3);
        buf.extend_from_slice(b"def");
        buf.push(4);
        buf.extend_from_slice(b"test");
        buf.push(1);
        buf.extend_from_slice(b"t");
        buf.push(1);
        buf.extend_from_slice(b"t");
        buf.push(1);
        buf.extend_from_slice(b"a");
        buf.push(1);
        buf.extend_from_slice(b"a");
        buf.push(0x0c);
        buf.extend_from_slice(&63u16.to_le_bytes());
        buf.extend_from_slice(&11u32.to_le_bytes());
        buf.push(ColumnType::LONG.0);
        buf.extend_from_slice(&FieldFlags::NOT_NULL.bits().to_le_bytes());
        buf.push(0);
        buf
    }

    #[test]
    fn it_decodes_a_column_definition() {
        let col = ColumnDefinition::read(&fixture()).unwrap();
        assert_eq!(col.schema.as_deref(), Some("test"));
        assert_eq!(col.name(), Some("a"));
        assert_eq!(col.char_set, 63);
        assert_eq!(col.max_size, 11);
        assert_eq!(col.column_type, ColumnType::LONG);
        assert!(col.flags.contains(FieldFlags::NOT_NULL));
        assert_eq!(col.decimals, 0);
    }

    #[test]
    fn it_rejects_a_non_def_catalog() {
        let mut buf = Vec::new();
        buf.push(3);
        buf.extend_from_slice(b"xyz");
        let err = ColumnDefinition::read(&buf).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
