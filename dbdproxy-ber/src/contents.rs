//! Bounded reader over the contents of a constructed value

use std::io::{self, Read};

/// A reader limited to a fixed number of bytes of an underlying stream
///
/// Once `limit` bytes have been consumed every read reports end of stream,
/// whether or not the underlying stream has more data. Decoding a sequence
/// uses this to tell "end of my contents" apart from "end of the
/// connection" while the next message stays unread in the underlying
/// stream. The underlying stream is borrowed, never closed.
pub struct BerContentsReader<'a> {
    inner: &'a mut dyn Read,
    limit: usize,
    count: usize,
}

impl<'a> BerContentsReader<'a> {
    pub fn new(inner: &'a mut dyn Read, limit: usize) -> Self {
        Self {
            inner,
            limit,
            count: 0,
        }
    }

    /// Bytes consumed so far
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.count
    }

    pub fn is_exhausted(&self) -> bool {
        self.count >= self.limit
    }
}

impl Read for BerContentsReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_exhausted() || buf.is_empty() {
            return Ok(0);
        }
        let max = buf.len().min(self.remaining());
        let n = self.inner.read(&mut buf[..max])?;
        self.count += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &[u8] = b"All good dogs go to heaven.";
    const PREFIX: usize = 13;

    #[test]
    fn test_byte_at_a_time_stops_at_limit() {
        let mut underlying = TEXT;
        let mut prefix = Vec::new();
        {
            let mut reader = BerContentsReader::new(&mut underlying, PREFIX);
            let mut one = [0u8; 1];
            while reader.read(&mut one).unwrap() == 1 {
                prefix.push(one[0]);
            }
            assert!(reader.is_exhausted());
            assert_eq!(reader.count(), PREFIX);
        }
        assert_eq!(prefix, &TEXT[..PREFIX]);

        let mut rest = Vec::new();
        underlying.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, &TEXT[PREFIX..]);
    }

    #[test]
    fn test_bulk_read_is_clamped() {
        let mut underlying = TEXT;
        let mut buf = [0u8; 24];
        let n = {
            let mut reader = BerContentsReader::new(&mut underlying, PREFIX);
            let n = reader.read(&mut buf).unwrap();
            assert_eq!(reader.read(&mut buf).unwrap(), 0);
            n
        };
        assert_eq!(&buf[..n], &TEXT[..PREFIX]);

        let next = underlying.read(&mut buf).unwrap();
        assert_eq!(&buf[..next], &TEXT[PREFIX..]);
    }

    #[test]
    fn test_short_underlying_stream() {
        let mut underlying: &[u8] = b"abc";
        let mut reader = BerContentsReader::new(&mut underlying, 10);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
        assert_eq!(reader.count(), 3);
        assert!(!reader.is_exhausted());
    }
}
