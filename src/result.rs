//! Streaming a result set out of a session that has already sent a query.
//!
//! Each row's raw payload is retained as a single buffer, with per-column
//! offsets computed up front and values decoded lazily on request.

use bytes::Bytes;
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::io::Buf;
use crate::protocol::column_def::ColumnDefinition;
use crate::protocol::eof::EofPacket;
use crate::protocol::response::{GenericResponse, HEADER_LOCAL_INFILE};
use crate::protocol::status::Status;
use crate::session::Session;
use crate::value::{decode_column, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// A result set's columns are known and rows are available to read.
    ReadResultSetHeader,
    /// At least one row has been read from the current result set.
    ReadingRows,
    /// The current result set is exhausted; another follows.
    HasMoreData,
    /// Nothing further follows on this session for this command.
    NoMoreData,
}

/// Reads one-or-more result sets off a session positioned right after a
/// query send, per the column-count/column-defs/EOF/rows/EOF-or-OK shape
/// of the text protocol.
#[derive(Debug)]
pub struct ResultSetCursor<'a> {
    session: &'a mut Session,
    state: CursorState,
    columns: Vec<ColumnDefinition>,
    current_row: Option<Bytes>,
    row_offsets: Vec<Option<(usize, usize)>>,
    affected_rows: u64,
    last_insert_id: u64,
    warnings: u16,
    status: Status,
}

impl<'a> ResultSetCursor<'a> {
    /// Reads the first result-set header off `session`, which must already
    /// have had a command sent on it (`session.send(..)`/`send_reply(..)`).
    pub async fn open(session: &'a mut Session, cancel: &CancellationToken) -> Result<ResultSetCursor<'a>> {
        let mut cursor = ResultSetCursor {
            session,
            state: CursorState::NoMoreData,
            columns: Vec::new(),
            current_row: None,
            row_offsets: Vec::new(),
            affected_rows: 0,
            last_insert_id: 0,
            warnings: 0,
            status: Status::empty(),
        };
        cursor.load_header(cancel).await?;
        Ok(cursor)
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    pub fn last_insert_id(&self) -> u64 {
        self.last_insert_id
    }

    pub fn warnings(&self) -> u16 {
        self.warnings
    }

    /// Reads the next row of the current result set.
    ///
    /// Returns `false` without touching the socket once the current result
    /// set (or the whole command, for a row-less `OK`) is exhausted;
    /// callers write `while cursor.read().await? { ... }`.
    pub async fn read(&mut self, cancel: &CancellationToken) -> Result<bool> {
        match self.state {
            CursorState::ReadResultSetHeader | CursorState::ReadingRows => {}
            CursorState::HasMoreData | CursorState::NoMoreData => return Ok(false),
        }

        let payload = self.session.receive_reply(cancel).await?;

        if EofPacket::looks_like_eof(&payload) {
            let eof = EofPacket::read(&payload)?;
            self.status = eof.status;
            self.warnings = eof.warnings;
            self.current_row = None;
            self.row_offsets.clear();
            self.state = if eof.status.contains(Status::MORE_RESULTS_EXISTS) {
                CursorState::HasMoreData
            } else {
                CursorState::NoMoreData
            };
            return Ok(false);
        }

        self.row_offsets = parse_row_offsets(&payload, self.columns.len())?;
        self.current_row = Some(payload);
        self.state = CursorState::ReadingRows;
        Ok(true)
    }

    /// Decodes column `idx` of the current row. `Value::Null` both for a
    /// genuinely NULL column and is the *only* value this returns for one.
    pub fn value(&self, idx: usize, convert_zero_datetime: bool, old_guids: bool) -> Result<Value> {
        let column = self
            .columns
            .get(idx)
            .ok_or_else(|| Error::protocol(format!("column index {idx} out of range")))?;
        let row = self
            .current_row
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no current row; call read() first"))?;

        let row_bytes: &[u8] = row.as_ref();
        match self.row_offsets.get(idx).copied().flatten() {
            Some((offset, len)) => decode_column(
                column,
                &row_bytes[offset..offset + len],
                convert_zero_datetime,
                old_guids,
            ),
            None => Ok(Value::Null),
        }
    }

    /// Drains any unread rows of the current result set, then advances to
    /// the next one if the session has more to give.
    pub async fn next_result(&mut self, cancel: &CancellationToken) -> Result<bool> {
        while self.state == CursorState::ReadingRows {
            self.read(cancel).await?;
        }

        match self.state {
            CursorState::HasMoreData => {
                self.load_header(cancel).await?;
                Ok(matches!(self.state, CursorState::ReadResultSetHeader))
            }
            _ => Ok(false),
        }
    }

    /// Reads one result-set header: an `OK` (no rows; loops internally past
    /// any further row-less results chained by `MORE_RESULTS_EXISTS`), an
    /// `ERR` (surfaced), or a column-count/column-defs/EOF triple.
    async fn load_header(&mut self, cancel: &CancellationToken) -> Result<()> {
        loop {
            let payload = self.session.receive_reply(cancel).await?;

            if payload.first().copied() == Some(HEADER_LOCAL_INFILE) {
                return Err(Error::unsupported("LOCAL INFILE is not supported"));
            }

            match GenericResponse::classify(&payload)?.into_result() {
                Err(err) => {
                    if let Error::Server { code, sql_state, message } = &err {
                        debug!(
                            target: "mysql_wire::result",
                            code = *code,
                            sql_state = %sql_state,
                            message = %message,
                            "server returned ERR for result set header"
                        );
                    }
                    return Err(err);
                }
                Ok(GenericResponse::Ok(ok)) => {
                    self.affected_rows = ok.affected_rows;
                    self.last_insert_id = ok.last_insert_id;
                    self.warnings = ok.warnings;
                    self.status = ok.status;
                    self.columns.clear();

                    if ok.status.contains(Status::MORE_RESULTS_EXISTS) {
                        self.state = CursorState::HasMoreData;
                        continue;
                    }

                    self.state = CursorState::NoMoreData;
                    return Ok(());
                }
                Ok(_) => {
                    let mut cursor: &[u8] = &payload;
                    let column_count = cursor
                        .get_uint_lenenc()?
                        .ok_or_else(|| Error::protocol("column count must not be NULL"))?;

                    let mut columns = Vec::with_capacity(column_count as usize);
                    for _ in 0..column_count {
                        let column_payload = self.session.receive_reply(cancel).await?;
                        columns.push(ColumnDefinition::read(&column_payload)?);
                    }

                    let eof_payload = self.session.receive_reply(cancel).await?;
                    let eof = EofPacket::read(&eof_payload)?;

                    self.columns = columns;
                    self.status = eof.status;
                    self.warnings = eof.warnings;
                    self.state = CursorState::ReadResultSetHeader;
                    return Ok(());
                }
            }
        }
    }
}

/// Splits a row payload into per-column `(offset, length)` spans, leaving
/// NULL columns (lead byte `0xFB`) as `None`.
fn parse_row_offsets(payload: &[u8], column_count: usize) -> Result<Vec<Option<(usize, usize)>>> {
    let mut offsets = Vec::with_capacity(column_count);
    let mut pos = 0usize;

    for _ in 0..column_count {
        let lead = *payload
            .get(pos)
            .ok_or_else(|| Error::protocol("row payload truncated before column value"))?;

        let (len, header_len): (usize, usize) = match lead {
            0xFB => {
                offsets.push(None);
                pos += 1;
                continue;
            }
            0xFC => {
                let bytes = payload
                    .get(pos + 1..pos + 3)
                    .ok_or_else(|| Error::protocol("row payload truncated in length header"))?;
                (u16::from_le_bytes([bytes[0], bytes[1]]) as usize, 3)
            }
            0xFD => {
                let bytes = payload
                    .get(pos + 1..pos + 4)
                    .ok_or_else(|| Error::protocol("row payload truncated in length header"))?;
                (
                    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]) as usize,
                    4,
                )
            }
            0xFE => {
                let bytes = payload
                    .get(pos + 1..pos + 9)
                    .ok_or_else(|| Error::protocol("row payload truncated in length header"))?;
                (u64::from_le_bytes(bytes.try_into().unwrap()) as usize, 9)
            }
            _ => (lead as usize, 1),
        };

        let value_start = pos + header_len;
        let value_end = value_start
            .checked_add(len)
            .ok_or_else(|| Error::protocol("row column length overflow"))?;
        if value_end > payload.len() {
            return Err(Error::protocol("row payload truncated before column value"));
        }

        offsets.push(Some((value_start, len)));
        pos = value_end;
    }

    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::encode_com_query;
    use crate::transport::byte_handler::ByteHandler;
    use crate::transport::test_support::InMemoryByteHandler;

    fn physical_packet(sequence: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + payload.len());
        let len = payload.len() as u32;
        out.extend_from_slice(&len.to_le_bytes()[..3]);
        out.push(sequence);
        out.extend_from_slice(payload);
        out
    }

    async fn client_session_with_server_script(
        script: Vec<u8>,
    ) -> (Session, tokio::task::JoinHandle<Vec<u8>>) {
        let (client_half, mut server_half) = InMemoryByteHandler::duplex_pair();
        let session = Session::for_test(ByteHandler::from(client_half));

        let server_task = tokio::spawn(async move {
            use tokio::io::{AsyncReadExt, AsyncWriteExt};
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            // drain whatever the client already wrote (the query packet)
            // before replying, matching a half-duplex request/response.
            let n = server_half.read(&mut buf).await.unwrap_or(0);
            received.extend_from_slice(&buf[..n]);
            server_half.write_all(&script).await.unwrap();
            server_half.flush().await.unwrap();
            received
        });

        (session, server_task)
    }

    #[tokio::test]
    async fn it_reads_a_simple_select_one_row() {
        let mut script = Vec::new();
        script.extend(physical_packet(1, &[0x01])); // column_count = 1
        let mut col = Vec::new();
        col.push(3);
        col.extend_from_slice(b"def");
        col.push(0); // schema
        col.push(0); // table_alias
        col.push(0); // table
        col.push(1);
        col.extend_from_slice(b"1"); // column_alias
        col.push(0); // column
        col.push(0x0c);
        col.extend_from_slice(&33u16.to_le_bytes());
        col.extend_from_slice(&1u32.to_le_bytes());
        col.push(crate::protocol::column_type::ColumnType::LONG.0);
        col.extend_from_slice(&0u16.to_le_bytes());
        col.push(0);
        script.extend(physical_packet(2, &col));
        script.extend(physical_packet(3, b"\xfe\x00\x00\x02\x00")); // EOF
        script.extend(physical_packet(4, &[0x01, b'1'])); // row: lenenc(1) "1"
        script.extend(physical_packet(5, b"\xfe\x00\x00\x22\x00")); // EOF, status 0x0022

        let (mut session, server_task) = client_session_with_server_script(script).await;

        let cancel = CancellationToken::new();
        let mut query = Vec::new();
        encode_com_query(&mut query, "SELECT 1");
        session.send(&query, &cancel).await.unwrap();

        let mut cursor = ResultSetCursor::open(&mut session, &cancel).await.unwrap();
        assert_eq!(cursor.state(), CursorState::ReadResultSetHeader);
        assert_eq!(cursor.columns().len(), 1);

        assert!(cursor.read(&cancel).await.unwrap());
        assert_eq!(cursor.value(0, false, false).unwrap(), Value::I32(1));

        assert!(!cursor.read(&cancel).await.unwrap());
        assert_eq!(cursor.state(), CursorState::NoMoreData);

        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn it_reads_an_ok_with_no_rows() {
        let script = physical_packet(1, b"\x00\x00\x00\x02\x00\x00\x00");
        let (mut session, server_task) = client_session_with_server_script(script).await;

        let cancel = CancellationToken::new();
        let mut query = Vec::new();
        encode_com_query(&mut query, "DO 0");
        session.send(&query, &cancel).await.unwrap();

        let cursor = ResultSetCursor::open(&mut session, &cancel).await.unwrap();
        assert_eq!(cursor.state(), CursorState::NoMoreData);
        assert_eq!(cursor.affected_rows(), 0);
        assert_eq!(cursor.last_insert_id(), 0);

        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn it_surfaces_a_server_error() {
        let script = physical_packet(1, b"\xff\x34\x04#42000You have an error");
        let (mut session, server_task) = client_session_with_server_script(script).await;

        let cancel = CancellationToken::new();
        let mut query = Vec::new();
        encode_com_query(&mut query, "BAD");
        session.send(&query, &cancel).await.unwrap();

        let err = ResultSetCursor::open(&mut session, &cancel).await.unwrap_err();
        match err {
            Error::Server { code, sql_state, message } => {
                assert_eq!(code, 1076);
                assert_eq!(sql_state, "42000");
                assert_eq!(message, "You have an error");
            }
            other => panic!("expected a server error, got {other:?}"),
        }
        assert_eq!(session.state(), crate::session::ConnectionState::Connected);

        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn it_reads_multiple_rows_with_a_null() {
        let mut script = Vec::new();
        script.extend(physical_packet(1, &[0x01]));
        let mut col = Vec::new();
        col.push(3);
        col.extend_from_slice(b"def");
        col.push(0);
        col.push(0);
        col.push(0);
        col.push(1);
        col.extend_from_slice(b"n");
        col.push(0);
        col.push(0x0c);
        col.extend_from_slice(&63u16.to_le_bytes());
        col.extend_from_slice(&20u32.to_le_bytes());
        col.push(crate::protocol::column_type::ColumnType::LONGLONG.0);
        col.extend_from_slice(
            &crate::protocol::column_type::FieldFlags::UNSIGNED.bits().to_le_bytes(),
        );
        col.push(0);
        script.extend(physical_packet(2, &col));
        script.extend(physical_packet(3, b"\xfe\x00\x00\x02\x00"));
        script.extend(physical_packet(4, &[0x01, b'5']));
        script.extend(physical_packet(5, &[0xFB]));
        script.extend(physical_packet(6, b"\xfe\x00\x00\x02\x00"));

        let (mut session, server_task) = client_session_with_server_script(script).await;

        let cancel = CancellationToken::new();
        let mut query = Vec::new();
        encode_com_query(&mut query, "SELECT n FROM t");
        session.send(&query, &cancel).await.unwrap();

        let mut cursor = ResultSetCursor::open(&mut session, &cancel).await.unwrap();

        assert!(cursor.read(&cancel).await.unwrap());
        assert_eq!(cursor.value(0, false, false).unwrap(), Value::U64(5));

        assert!(cursor.read(&cancel).await.unwrap());
        assert_eq!(cursor.value(0, false, false).unwrap(), Value::Null);

        assert!(!cursor.read(&cancel).await.unwrap());

        server_task.await.unwrap();
    }
}
