//! Bounded reads of long columns

use std::io::{self, Read};

use bytes::Bytes;
use dbdproxy_core::{DbdError, DbdErrorKind, ProxyResult};
use dbdproxy_driver::LongStream;
use dbdproxy_protocol::ColumnData;

use crate::holder::StatementProperties;

/// Bytes or characters read per chunk
pub const CHUNK_SIZE: usize = 8192;

/// Read up to `limit` bytes; the flag reports whether more data remains
fn read_binary(mut input: impl Read, limit: usize) -> io::Result<(Vec<u8>, bool)> {
    let mut out = Vec::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    while out.len() < limit {
        let want = CHUNK_SIZE.min(limit - out.len());
        let n = input.read(&mut chunk[..want])?;
        if n == 0 {
            return Ok((out, false));
        }
        out.extend_from_slice(&chunk[..n]);
    }
    let mut peek = [0u8; 1];
    let more = loop {
        match input.read(&mut peek) {
            Ok(n) => break n > 0,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    };
    Ok((out, more))
}

fn read_text(mut input: impl Iterator<Item = char>, limit: usize) -> (String, bool) {
    let mut out = String::new();
    let mut taken = 0usize;
    while taken < limit {
        let want = CHUNK_SIZE.min(limit - taken);
        let before = taken;
        for c in input.by_ref().take(want) {
            out.push(c);
            taken += 1;
        }
        if taken - before < want {
            return (out, false);
        }
    }
    let more = input.next().is_some();
    (out, more)
}

/// Value of a long column
///
/// `LongReadLen` of zero returns NULL without reading. Otherwise at most
/// `LongReadLen` bytes or characters are read, unless `jdbc_longreadall`
/// is set. Data beyond the limit is an error unless `LongTruncOk` is set.
///
/// # Errors
/// * `DataTruncation` if the value is longer than allowed
/// * `FetchException` if reading the stream fails
pub fn read_long(
    stream: Option<LongStream>,
    properties: &StatementProperties,
    column: i32,
) -> ProxyResult<ColumnData> {
    if properties.long_read_len == 0 {
        return Ok(ColumnData::Null);
    }
    let Some(stream) = stream else {
        return Ok(ColumnData::Null);
    };
    let limit = if properties.long_read_all {
        usize::MAX
    } else {
        usize::try_from(properties.long_read_len).unwrap_or(0)
    };

    let (data, more) = match stream {
        LongStream::Binary(input) => {
            let (bytes, more) = read_binary(input, limit).map_err(|e| {
                DbdError::with_args(DbdErrorKind::FetchException, [column.to_string(), e.to_string()])
            })?;
            (ColumnData::Bytes(Bytes::from(bytes)), more)
        }
        LongStream::Text(chars) => {
            let (text, more) = read_text(chars, limit);
            (ColumnData::Text(text), more)
        }
    };
    if more && !properties.long_trunc_ok {
        return Err(DbdError::with_args(DbdErrorKind::DataTruncation, [column.to_string()]).into());
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbdproxy_core::ProxyError;
    use std::io::Cursor;

    fn props(long_read_len: i32, long_trunc_ok: bool, long_read_all: bool) -> StatementProperties {
        StatementProperties {
            long_read_len,
            long_trunc_ok,
            chop_blanks: false,
            long_read_all,
        }
    }

    fn binary(len: usize) -> Option<LongStream> {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        Some(LongStream::Binary(Box::new(Cursor::new(data))))
    }

    fn text(s: &str) -> Option<LongStream> {
        let chars: Vec<char> = s.chars().collect();
        Some(LongStream::Text(Box::new(chars.into_iter())))
    }

    fn kind(err: ProxyError) -> DbdErrorKind {
        match err {
            ProxyError::Dbd(e) => e.kind(),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_zero_read_len_is_null() {
        assert_eq!(read_long(binary(10), &props(0, false, true), 1).unwrap(), ColumnData::Null);
        assert_eq!(read_long(None, &props(80, false, false), 1).unwrap(), ColumnData::Null);
    }

    #[test]
    fn test_exact_fit_is_not_truncation() {
        let data = read_long(binary(80), &props(80, false, false), 1).unwrap();
        assert!(matches!(data, ColumnData::Bytes(b) if b.len() == 80));
    }

    #[test]
    fn test_truncation_rules() {
        let err = read_long(binary(81), &props(80, false, false), 3).unwrap_err();
        assert_eq!(kind(err), DbdErrorKind::DataTruncation);

        let data = read_long(binary(81), &props(80, true, false), 3).unwrap();
        assert!(matches!(data, ColumnData::Bytes(b) if b.len() == 80));
    }

    #[test]
    fn test_read_all_spans_chunks() {
        let len = CHUNK_SIZE * 2 + 17;
        let data = read_long(binary(len), &props(10, false, true), 1).unwrap();
        match data {
            ColumnData::Bytes(b) => {
                assert_eq!(b.len(), len);
                assert_eq!(b[CHUNK_SIZE], (CHUNK_SIZE % 251) as u8);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_text_limits_count_characters() {
        let data = read_long(text("h\u{e9}llo"), &props(5, false, false), 1).unwrap();
        assert_eq!(data, ColumnData::Text("h\u{e9}llo".into()));
        let data = read_long(text("h\u{e9}llo world"), &props(5, true, false), 1).unwrap();
        assert_eq!(data, ColumnData::Text("h\u{e9}llo".into()));
        let err = read_long(text("h\u{e9}llo world"), &props(5, false, false), 2).unwrap_err();
        assert_eq!(kind(err), DbdErrorKind::DataTruncation);
    }

    #[test]
    fn test_io_failure_is_fetch_exception() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk gone"))
            }
        }
        let err = read_long(Some(LongStream::Binary(Box::new(Broken))), &props(80, false, false), 4)
            .unwrap_err();
        match err {
            ProxyError::Dbd(e) => {
                assert_eq!(e.kind(), DbdErrorKind::FetchException);
                assert!(e.message().contains("disk gone"));
                assert!(e.message().contains('4'));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
