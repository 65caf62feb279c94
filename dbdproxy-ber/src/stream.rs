//! Stream helpers shared by the codec

use std::io::{self, Read};

use dbdproxy_core::ProxyError;

/// Read a single octet, `None` at end of stream
pub(crate) fn read_octet(input: &mut dyn Read) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Read exactly `length` octets without trusting `length` for the allocation
pub(crate) fn read_octets(input: &mut dyn Read, length: usize, what: &str) -> Result<Vec<u8>, ProxyError> {
    let mut buf = Vec::with_capacity(length.min(64 * 1024));
    (&mut *input).take(length as u64).read_to_end(&mut buf)?;
    if buf.len() != length {
        return Err(truncated(what));
    }
    Ok(buf)
}

pub(crate) fn truncated(what: &str) -> ProxyError {
    ProxyError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("stream ended inside {}", what),
    ))
}
