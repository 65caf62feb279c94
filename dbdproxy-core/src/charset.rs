//! Character encoding contract
//!
//! Octet strings on the wire are plain bytes. A session interprets them with
//! the encoding the client names in its Connect request, or ASCII before
//! that. Names follow the client's conventions (`ASCII`, `ISO8859_1`,
//! `UTF8`, `Cp1252`, ...) and also accept WHATWG labels.
//!
//! Decoding never fails: malformed input becomes U+FFFD. Encoding never
//! fails either: characters the encoding cannot represent become `?`.

use std::borrow::Cow;
use std::fmt;

use encoding_rs::Encoding;

use crate::dbd::{DbdError, DbdErrorKind};
use crate::error::ProxyResult;

/// A resolved character encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Charset {
    /// 7-bit US-ASCII, the bootstrap encoding of every session
    Ascii,
    /// ISO-8859-1, bytes map one-to-one onto U+0000..U+00FF
    Latin1,
    /// Any other encoding known to `encoding_rs`
    Encoding(&'static Encoding),
}

impl Charset {
    /// Encoding used when a client asks for the platform default
    pub const PLATFORM_DEFAULT: Charset = Charset::Encoding(encoding_rs::UTF_8);

    /// Resolve an encoding by name
    ///
    /// An empty name selects [`Charset::PLATFORM_DEFAULT`].
    ///
    /// # Errors
    /// Returns an `UnsupportedEncoding` proxy error for unknown names.
    pub fn for_name(name: &str) -> ProxyResult<Charset> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Ok(Self::PLATFORM_DEFAULT);
        }

        let key: String = trimmed
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_uppercase)
            .collect();
        match key.as_str() {
            "ASCII" | "USASCII" | "646" | "ISO646US" => return Ok(Charset::Ascii),
            "ISO88591" | "88591" | "LATIN1" | "ISOLATIN1" | "L1" => return Ok(Charset::Latin1),
            "UTF8" => return Ok(Charset::Encoding(encoding_rs::UTF_8)),
            _ => {}
        }

        let label: Cow<'_, str> = match key.strip_prefix("ISO8859") {
            Some(part) if !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()) => {
                Cow::Owned(format!("iso-8859-{part}"))
            }
            _ => Cow::Borrowed(trimmed),
        };
        Encoding::for_label_no_replacement(label.as_bytes())
            .map(Charset::Encoding)
            .ok_or_else(|| DbdError::with_args(DbdErrorKind::UnsupportedEncoding, [trimmed]).into())
    }

    /// Canonical name of this encoding
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Ascii => "US-ASCII",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Encoding(encoding) => encoding.name(),
        }
    }

    /// Decode bytes into text
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
                .collect(),
            Charset::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Charset::Encoding(encoding) => {
                let (text, _) = encoding.decode_without_bom_handling(bytes);
                text.into_owned()
            }
        }
    }

    /// Encode text into bytes
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Charset::Encoding(encoding) => {
                let (bytes, _, had_errors) = encoding.encode(text);
                if !had_errors {
                    return bytes.into_owned();
                }
                // encoding_rs substitutes numeric character references; use '?'
                let mut out = Vec::with_capacity(text.len());
                let mut buf = [0u8; 4];
                for c in text.chars() {
                    let (chunk, _, unmappable) = encoding.encode(c.encode_utf8(&mut buf));
                    if unmappable {
                        out.push(b'?');
                    } else {
                        out.extend_from_slice(&chunk);
                    }
                }
                out
            }
        }
    }
}

impl Default for Charset {
    fn default() -> Self {
        Charset::Ascii
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxyError;

    #[test]
    fn test_java_style_names() {
        assert_eq!(Charset::for_name("ASCII").unwrap(), Charset::Ascii);
        assert_eq!(Charset::for_name("US-ASCII").unwrap(), Charset::Ascii);
        assert_eq!(Charset::for_name("ISO8859_1").unwrap(), Charset::Latin1);
        assert_eq!(Charset::for_name("iso-8859-1").unwrap(), Charset::Latin1);
        assert_eq!(Charset::for_name("UTF8").unwrap().name(), "UTF-8");
        assert_eq!(Charset::for_name("Cp1252").unwrap().name(), "windows-1252");
        assert_eq!(Charset::for_name("ISO8859_2").unwrap().name(), "ISO-8859-2");
    }

    #[test]
    fn test_empty_name_is_platform_default() {
        assert_eq!(Charset::for_name("").unwrap(), Charset::PLATFORM_DEFAULT);
    }

    #[test]
    fn test_unknown_name() {
        match Charset::for_name("no-such-charset") {
            Err(ProxyError::Dbd(e)) => {
                assert_eq!(e.kind(), DbdErrorKind::UnsupportedEncoding);
                assert!(e.message().contains("no-such-charset"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ascii_replacement() {
        assert_eq!(Charset::Ascii.encode("caf\u{e9}"), b"caf?".to_vec());
        assert_eq!(Charset::Ascii.decode(&[0x61, 0xE9]), "a\u{FFFD}");
    }

    #[test]
    fn test_latin1_round_trip() {
        let text = "d\u{e9}j\u{e0} vu";
        let bytes = Charset::Latin1.encode(text);
        assert_eq!(bytes.len(), 7);
        assert_eq!(Charset::Latin1.decode(&bytes), text);
        assert_eq!(Charset::Latin1.encode("\u{20ac}"), b"?".to_vec());
    }

    #[test]
    fn test_unmappable_becomes_question_mark() {
        let cp1252 = Charset::for_name("windows-1252").unwrap();
        assert_eq!(cp1252.encode("a\u{4e2d}b"), b"a?b".to_vec());
        assert_eq!(cp1252.encode("\u{20ac}"), vec![0x80]);
    }
}
