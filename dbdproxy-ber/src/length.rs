//! BER definite length field

use std::io::{Read, Write};

use dbdproxy_core::{ProxyError, ProxyResult};

use crate::stream::{read_octet, truncated};

/// Largest number of length octets accepted in the long form
const MAX_LENGTH_OCTETS: usize = 4;

/// BER Length encoding
///
/// BER length can be encoded in two forms:
/// - **Short form**: For lengths 0-127 (1 byte)
/// - **Long form**: For lengths > 127 (1 + n bytes)
///
/// # Encoding Format
///
/// Short form:
/// ```text
/// Byte: 0 L L L L L L L
/// ```
///
/// Long form:
/// ```text
/// First byte:      1 N N N N N N N  (N = number of length bytes)
/// Following bytes: L L L L L L L L  (big-endian length value)
/// ```
///
/// The indefinite form (`0x80`) is never produced by this protocol and is
/// rejected on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    /// Short form: length 0-127
    Short(u8),
    /// Long form: length > 127, encoded with length-of-length
    Long(usize),
}

impl BerLength {
    /// Create a new BER length, choosing the short form when possible
    pub fn new(length: usize) -> Self {
        if length < 128 {
            BerLength::Short(length as u8)
        } else {
            BerLength::Long(length)
        }
    }

    /// Get the length value
    pub fn value(&self) -> usize {
        match self {
            BerLength::Short(l) => *l as usize,
            BerLength::Long(l) => *l,
        }
    }

    /// Number of octets the encoded length occupies
    pub fn encoded_len(&self) -> usize {
        match self {
            BerLength::Short(_) => 1,
            BerLength::Long(length) => 1 + Self::significant_octets(*length),
        }
    }

    fn significant_octets(length: usize) -> usize {
        let bits = usize::BITS - length.leading_zeros();
        (bits as usize).div_ceil(8).max(1)
    }

    /// Append the encoded length to `buf`
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            BerLength::Short(length) => buf.push(*length),
            BerLength::Long(length) => {
                let count = Self::significant_octets(*length);
                buf.push(0x80 | count as u8);
                for i in (0..count).rev() {
                    buf.push(((*length >> (i * 8)) & 0xFF) as u8);
                }
            }
        }
    }

    /// Encode length to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf
    }

    pub fn write_to(&self, out: &mut dyn Write) -> ProxyResult<()> {
        out.write_all(&self.encode())?;
        Ok(())
    }

    /// Read a length field from a stream
    ///
    /// # Error Handling
    /// Returns an error if:
    /// - The stream ends anywhere inside the field (I/O error)
    /// - The indefinite form is used
    /// - More than four length octets are used
    pub fn read_from(input: &mut dyn Read) -> ProxyResult<Self> {
        let first = read_octet(input)?.ok_or_else(|| truncated("length"))?;
        if first & 0x80 == 0 {
            return Ok(BerLength::Short(first));
        }

        let count = (first & 0x7F) as usize;
        if count == 0 {
            return Err(ProxyError::Decode(
                "indefinite length encoding not supported".to_string(),
            ));
        }
        if count > MAX_LENGTH_OCTETS {
            return Err(ProxyError::Decode(format!(
                "length encoding too large: {} bytes (max {})",
                count, MAX_LENGTH_OCTETS
            )));
        }

        let mut length = 0usize;
        for _ in 0..count {
            let octet = read_octet(input)?.ok_or_else(|| truncated("length"))?;
            length = (length << 8) | octet as usize;
        }
        Ok(BerLength::Long(length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> ProxyResult<BerLength> {
        let mut input = bytes;
        BerLength::read_from(&mut input)
    }

    #[test]
    fn test_short_form() {
        assert_eq!(BerLength::new(0).encode(), vec![0x00]);
        assert_eq!(BerLength::new(127).encode(), vec![0x7F]);
        assert_eq!(decode(&[0x7F]).unwrap().value(), 127);
    }

    #[test]
    fn test_long_form_boundaries() {
        assert_eq!(BerLength::new(128).encode(), vec![0x81, 0x80]);
        assert_eq!(BerLength::new(255).encode(), vec![0x81, 0xFF]);
        assert_eq!(BerLength::new(256).encode(), vec![0x82, 0x01, 0x00]);
        assert_eq!(BerLength::new(65536).encode(), vec![0x83, 0x01, 0x00, 0x00]);
        for length in [128usize, 255, 256, 65535, 65536, 1 << 24] {
            let encoded = BerLength::new(length).encode();
            assert_eq!(encoded.len(), BerLength::new(length).encoded_len());
            assert_eq!(decode(&encoded).unwrap().value(), length);
        }
    }

    #[test]
    fn test_non_minimal_long_form_accepted() {
        assert_eq!(decode(&[0x82, 0x00, 0x05]).unwrap().value(), 5);
    }

    #[test]
    fn test_indefinite_rejected() {
        assert!(matches!(decode(&[0x80]), Err(ProxyError::Decode(_))));
    }

    #[test]
    fn test_too_many_octets_rejected() {
        assert!(matches!(decode(&[0x85, 1, 2, 3, 4, 5]), Err(ProxyError::Decode(_))));
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(decode(&[]), Err(ProxyError::Io(_))));
        assert!(matches!(decode(&[0x82, 0x01]), Err(ProxyError::Io(_))));
    }
}
