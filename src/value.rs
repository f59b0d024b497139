//! Decoding a single textual-protocol column value into a typed [`Value`].
//!
//! Every row column in the text protocol is a string; which Rust type it
//! becomes depends on the column's declared [`ColumnType`] and
//! [`FieldFlags`].

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::column_def::ColumnDefinition;
use crate::protocol::column_type::{ColumnType, FieldFlags, CHARSET_BINARY};

/// A signed time-of-day/interval value, since MySQL's `TIME` can express
/// an interval outside a 24-hour day (`-838:59:59` .. `838:59:59`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedDuration {
    pub negative: bool,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub microseconds: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(BigDecimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(SignedDuration),
    String(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
}

/// When MySQL reports an all-zero `DATE`/`DATETIME` (`0000-00-00`), callers
/// that opt in get this sentinel instead of a decode error.
///
/// `old_guids` mirrors a server/driver convention some deployments use for
/// storing UUIDs as a raw 16-byte `BINARY(16)`/`BLOB` column instead of the
/// 36-character text form: when set, a binary-charset column exactly 16
/// bytes long decodes as a UUID from its raw bytes, and the 36-character
/// textual UUID heuristic below is disabled (so a genuine 36-character
/// string column isn't misread as a UUID under that convention).
pub fn decode_column(
    column: &ColumnDefinition,
    text: &[u8],
    convert_zero_datetime: bool,
    old_guids: bool,
) -> Result<Value> {
    let is_binary_charset = column.char_set == CHARSET_BINARY;
    let unsigned = column.flags.contains(FieldFlags::UNSIGNED);

    let s = || -> Result<&str> {
        std::str::from_utf8(text).map_err(|e| Error::protocol(format!("invalid utf-8 in column value: {e}")))
    };

    Ok(match column.column_type {
        ColumnType::TINY if text.len() == 1 && column.max_size == 1 => {
            Value::Bool(parse_int::<u8>(s()?)? != 0)
        }
        ColumnType::TINY if unsigned => Value::U8(parse_int(s()?)?),
        ColumnType::TINY => Value::I8(parse_int(s()?)?),

        ColumnType::SHORT | ColumnType::YEAR if unsigned => Value::U16(parse_int(s()?)?),
        ColumnType::SHORT => Value::I16(parse_int(s()?)?),
        ColumnType::YEAR => Value::I32(parse_int(s()?)?),

        ColumnType::INT24 | ColumnType::LONG if unsigned => Value::U32(parse_int(s()?)?),
        ColumnType::INT24 | ColumnType::LONG => Value::I32(parse_int(s()?)?),

        ColumnType::LONGLONG if unsigned => Value::U64(parse_int(s()?)?),
        ColumnType::LONGLONG => Value::I64(parse_int(s()?)?),

        ColumnType::BIT => Value::U64(text.iter().fold(0u64, |acc, &b| acc * 256 + b as u64)),

        ColumnType::FLOAT => Value::F32(parse_float(s()?)?),
        ColumnType::DOUBLE => Value::F64(parse_float(s()?)?),

        ColumnType::DECIMAL | ColumnType::NEWDECIMAL => Value::Decimal(
            BigDecimal::from_str(s()?)
                .map_err(|e| Error::protocol(format!("invalid decimal literal: {e}")))?,
        ),

        ColumnType::DATE => match parse_date(s()?, convert_zero_datetime)? {
            Some(date) => Value::Date(date),
            None => Value::Null,
        },

        ColumnType::DATETIME | ColumnType::TIMESTAMP => {
            match parse_datetime(s()?, convert_zero_datetime)? {
                Some(dt) => Value::DateTime(dt),
                None => Value::Null,
            }
        }

        ColumnType::TIME => Value::Time(parse_time(s()?)?),

        ColumnType::JSON => Value::String(s()?.to_owned()),

        ColumnType::STRING
            if !is_binary_charset
                && !old_guids
                && column.max_size == 36 * 4
                && looks_like_uuid(s()?) =>
        {
            Value::Uuid(
                Uuid::parse_str(s()?).map_err(|e| Error::protocol(format!("invalid uuid: {e}")))?,
            )
        }

        ColumnType::STRING | ColumnType::VAR_STRING | ColumnType::TINY_BLOB
        | ColumnType::BLOB | ColumnType::MEDIUM_BLOB | ColumnType::LONG_BLOB => {
            if is_binary_charset {
                if old_guids && text.len() == 16 {
                    Value::Uuid(Uuid::from_slice(text).map_err(|e| {
                        Error::protocol(format!("invalid 16-byte uuid: {e}"))
                    })?)
                } else {
                    Value::Bytes(text.to_vec())
                }
            } else {
                Value::String(s()?.to_owned())
            }
        }

        other => {
            return Err(Error::unsupported(format!(
                "column type id {} is not implemented",
                other.0
            )))
        }
    })
}

fn looks_like_uuid(s: &str) -> bool {
    s.len() == 36 && s.as_bytes().get(8) == Some(&b'-')
}

fn parse_int<T: FromStr>(s: &str) -> Result<T> {
    s.parse()
        .map_err(|_| Error::protocol(format!("invalid integer literal: {s:?}")))
}

fn parse_float<T: FromStr>(s: &str) -> Result<T> {
    s.parse()
        .map_err(|_| Error::protocol(format!("invalid floating point literal: {s:?}")))
}

/// `YYYY-MM-DD`. An all-zero date is either the configured sentinel or an
/// error, per the zero-date-handling note in the row value decoder.
fn parse_date(s: &str, convert_zero_datetime: bool) -> Result<Option<NaiveDate>> {
    if s == "0000-00-00" {
        return if convert_zero_datetime {
            Ok(None)
        } else {
            Err(Error::protocol("zero date received with conversion disabled"))
        };
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| Error::protocol(format!("invalid date literal {s:?}: {e}")))
}

/// `YYYY-MM-DD[ HH:MM:SS[.ffffff]]`.
fn parse_datetime(s: &str, convert_zero_datetime: bool) -> Result<Option<NaiveDateTime>> {
    let date_part = &s[..10.min(s.len())];
    if date_part == "0000-00-00" {
        return if convert_zero_datetime {
            Ok(None)
        } else {
            Err(Error::protocol("zero datetime received with conversion disabled"))
        };
    }

    if s.len() == 10 {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| Error::protocol(format!("invalid date literal {s:?}: {e}")))?;
        return Ok(Some(date.and_hms_opt(0, 0, 0).unwrap()));
    }

    let fmt = if s.contains('.') {
        "%Y-%m-%d %H:%M:%S%.f"
    } else {
        "%Y-%m-%d %H:%M:%S"
    };
    NaiveDateTime::parse_from_str(s, fmt)
        .map(Some)
        .map_err(|e| Error::protocol(format!("invalid datetime literal {s:?}: {e}")))
}

/// `[-]HHH:MM:SS[.ffffff]`; the leading sign, if present, applies to the
/// whole interval.
fn parse_time(s: &str) -> Result<SignedDuration> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (hms, frac) = match rest.split_once('.') {
        Some((hms, frac)) => (hms, frac),
        None => (rest, ""),
    };

    let mut parts = hms.splitn(3, ':');
    let hours: u32 = parts
        .next()
        .ok_or_else(|| Error::protocol("malformed TIME literal"))?
        .parse()
        .map_err(|_| Error::protocol("malformed TIME literal"))?;
    let minutes: u32 = parts
        .next()
        .ok_or_else(|| Error::protocol("malformed TIME literal"))?
        .parse()
        .map_err(|_| Error::protocol("malformed TIME literal"))?;
    let seconds: u32 = parts
        .next()
        .ok_or_else(|| Error::protocol("malformed TIME literal"))?
        .parse()
        .map_err(|_| Error::protocol("malformed TIME literal"))?;

    let mut padded = frac.to_owned();
    while padded.len() < 6 {
        padded.push('0');
    }
    let microseconds: u32 = if padded.is_empty() {
        0
    } else {
        padded[..6]
            .parse()
            .map_err(|_| Error::protocol("malformed TIME fractional part"))?
    };

    Ok(SignedDuration {
        negative,
        hours,
        minutes,
        seconds,
        microseconds,
    })
}
