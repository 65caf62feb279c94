//! BER value types
//!
//! The supported value types form a closed set, [`BerObject`]. Every variant
//! implements [`BerContents`]: it knows its identifier, the length of its
//! contents, how to append its contents to a buffer and how to populate
//! itself from a stream. Application messages are these same values carrying
//! application identifiers.

use std::fmt;
use std::io::{Read, Write};
use std::sync::OnceLock;

use bytes::Bytes;
use dbdproxy_core::{Charset, ProxyError, ProxyResult};

use crate::contents::BerContentsReader;
use crate::identifier::Identifier;
use crate::length::BerLength;
use crate::module::BerModule;
use crate::stream::read_octets;

/// Capabilities shared by every BER value
pub trait BerContents {
    fn identifier(&self) -> Identifier;

    /// Length of the contents octets (excluding identifier and length)
    fn content_length(&self) -> usize;

    /// Append the contents octets to `buf`
    fn encode_contents(&self, buf: &mut Vec<u8>);

    /// Populate this value from `length` contents octets of `input`
    fn read_contents(&mut self, input: &mut dyn Read, module: &BerModule, length: usize) -> ProxyResult<()>;

    /// Total encoded length: identifier, length field and contents
    fn encoded_length(&self) -> usize {
        let content_length = self.content_length();
        self.identifier().encoded().len() + BerLength::new(content_length).encoded_len() + content_length
    }

    /// Append the full identifier-length-contents encoding to `buf`
    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.identifier().encoded());
        BerLength::new(self.content_length()).encode_into(buf);
        self.encode_contents(buf);
    }

    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_length());
        self.encode_into(&mut buf);
        buf
    }

    /// Write the complete encoding with a single `write_all`
    fn write_to(&self, out: &mut dyn Write) -> ProxyResult<()> {
        out.write_all(&self.encode())?;
        Ok(())
    }
}

/// NULL, or an application value with empty contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BerNull {
    identifier: Identifier,
}

impl BerNull {
    pub const fn tagged(identifier: Identifier) -> Self {
        Self { identifier }
    }
}

impl BerContents for BerNull {
    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn content_length(&self) -> usize {
        0
    }

    fn encode_contents(&self, _buf: &mut Vec<u8>) {}

    fn read_contents(&mut self, _input: &mut dyn Read, _module: &BerModule, length: usize) -> ProxyResult<()> {
        expect_length(self.identifier, length, 0)
    }
}

/// BOOLEAN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BerBoolean {
    identifier: Identifier,
    value: bool,
}

impl BerBoolean {
    pub const fn new(value: bool) -> Self {
        Self {
            identifier: Identifier::BOOLEAN,
            value,
        }
    }

    pub const fn value(&self) -> bool {
        self.value
    }
}

impl BerContents for BerBoolean {
    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn content_length(&self) -> usize {
        1
    }

    fn encode_contents(&self, buf: &mut Vec<u8>) {
        buf.push(if self.value { 0xFF } else { 0x00 });
    }

    fn read_contents(&mut self, input: &mut dyn Read, _module: &BerModule, length: usize) -> ProxyResult<()> {
        expect_length(self.identifier, length, 1)?;
        let octets = read_octets(input, length, "BOOLEAN contents")?;
        self.value = octets[0] != 0;
        Ok(())
    }
}

/// INTEGER, ENUMERATED, or an application value with integer contents
///
/// The value is a signed 32-bit integer encoded in minimal two's-complement
/// form: the fewest octets that sign-extend back to the same value.
///
/// | value | contents |
/// |-------|----------|
/// | 0     | `00`     |
/// | -1    | `FF`     |
/// | 127   | `7F`     |
/// | 128   | `00 80`  |
/// | -128  | `80`     |
/// | 32767 | `7F FF`  |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BerInteger {
    identifier: Identifier,
    value: i32,
}

impl BerInteger {
    pub const fn new(value: i32) -> Self {
        Self::tagged(Identifier::INTEGER, value)
    }

    pub const fn enumerated(value: i32) -> Self {
        Self::tagged(Identifier::ENUMERATED, value)
    }

    pub const fn tagged(identifier: Identifier, value: i32) -> Self {
        Self { identifier, value }
    }

    pub const fn value(&self) -> i32 {
        self.value
    }

    pub fn is_enumerated(&self) -> bool {
        self.identifier == Identifier::ENUMERATED
    }

    fn minimal_octets(value: i32) -> usize {
        let bytes = value.to_be_bytes();
        let mut count = 4;
        while count > 1 {
            let first = bytes[4 - count];
            let next_high_bit = bytes[5 - count] & 0x80;
            let redundant = (first == 0x00 && next_high_bit == 0) || (first == 0xFF && next_high_bit != 0);
            if !redundant {
                break;
            }
            count -= 1;
        }
        count
    }
}

impl BerContents for BerInteger {
    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn content_length(&self) -> usize {
        Self::minimal_octets(self.value)
    }

    fn encode_contents(&self, buf: &mut Vec<u8>) {
        let count = Self::minimal_octets(self.value);
        buf.extend_from_slice(&self.value.to_be_bytes()[4 - count..]);
    }

    fn read_contents(&mut self, input: &mut dyn Read, _module: &BerModule, length: usize) -> ProxyResult<()> {
        if length == 0 || length > 4 {
            return Err(ProxyError::Decode(format!(
                "{} integer contents must be 1 to 4 octets, got {}",
                self.identifier, length
            )));
        }
        let octets = read_octets(input, length, "INTEGER contents")?;
        let mut value: i32 = if octets[0] & 0x80 != 0 { -1 } else { 0 };
        for octet in octets {
            value = (value << 8) | i32::from(octet);
        }
        self.value = value;
        Ok(())
    }
}

/// OCTET STRING, or an application value with octet string contents
///
/// Holds raw bytes plus the encoding used to interpret them. The text form
/// is decoded on first use and cached.
#[derive(Clone)]
pub struct BerOctetString {
    identifier: Identifier,
    bytes: Bytes,
    charset: Charset,
    text: OnceLock<String>,
}

impl BerOctetString {
    pub fn from_bytes(bytes: impl Into<Bytes>, charset: Charset) -> Self {
        Self::tagged_bytes(Identifier::OCTET_STRING, bytes, charset)
    }

    /// Encode `text` with `charset`
    pub fn from_text(text: &str, charset: Charset) -> Self {
        Self::tagged_text(Identifier::OCTET_STRING, text, charset)
    }

    pub fn tagged_bytes(identifier: Identifier, bytes: impl Into<Bytes>, charset: Charset) -> Self {
        Self {
            identifier,
            bytes: bytes.into(),
            charset,
            text: OnceLock::new(),
        }
    }

    pub fn tagged_text(identifier: Identifier, text: &str, charset: Charset) -> Self {
        Self {
            identifier,
            bytes: Bytes::from(charset.encode(text)),
            charset,
            text: OnceLock::new(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// The bytes decoded with this value's encoding
    pub fn text(&self) -> &str {
        self.text.get_or_init(|| self.charset.decode(&self.bytes))
    }

    /// The bytes decoded with another encoding, bypassing the cache
    pub fn text_in(&self, charset: Charset) -> String {
        charset.decode(&self.bytes)
    }
}

impl BerContents for BerOctetString {
    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn content_length(&self) -> usize {
        self.bytes.len()
    }

    fn encode_contents(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.bytes);
    }

    fn read_contents(&mut self, input: &mut dyn Read, module: &BerModule, length: usize) -> ProxyResult<()> {
        self.bytes = Bytes::from(read_octets(input, length, "OCTET STRING contents")?);
        self.charset = module.charset();
        self.text = OnceLock::new();
        Ok(())
    }
}

impl PartialEq for BerOctetString {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && self.bytes == other.bytes
    }
}

impl Eq for BerOctetString {}

impl fmt::Debug for BerOctetString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BerOctetString")
            .field("identifier", &self.identifier)
            .field("len", &self.bytes.len())
            .field("charset", &self.charset)
            .finish()
    }
}

/// SEQUENCE, or an application value with constructed contents
///
/// The contents octets are computed once, when the sequence is built or
/// decoded, and the children are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BerSequence {
    identifier: Identifier,
    children: Vec<BerObject>,
    contents: Bytes,
}

impl BerSequence {
    pub fn new(children: Vec<BerObject>) -> Self {
        Self::tagged(Identifier::SEQUENCE, children)
    }

    pub fn tagged(identifier: Identifier, children: Vec<BerObject>) -> Self {
        let contents = Self::encode_children(&children);
        Self {
            identifier,
            children,
            contents,
        }
    }

    fn encode_children(children: &[BerObject]) -> Bytes {
        let mut buf = Vec::with_capacity(children.iter().map(BerContents::encoded_length).sum());
        for child in children {
            child.encode_into(&mut buf);
        }
        Bytes::from(buf)
    }

    pub fn children(&self) -> &[BerObject] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BerObject> {
        self.children.get(index)
    }

    pub fn into_children(self) -> Vec<BerObject> {
        self.children
    }
}

impl BerContents for BerSequence {
    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn content_length(&self) -> usize {
        self.contents.len()
    }

    fn encode_contents(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.contents);
    }

    fn read_contents(&mut self, input: &mut dyn Read, module: &BerModule, length: usize) -> ProxyResult<()> {
        let mut reader = BerContentsReader::new(input, length);
        let mut children = Vec::new();
        let module = if length > 0 { module.nested()? } else { module.clone() };
        while let Some(child) = module.read_from(&mut reader)? {
            children.push(child);
        }
        if reader.count() != length {
            return Err(ProxyError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "{} contents ended after {} of {} bytes",
                    self.identifier,
                    reader.count(),
                    length
                ),
            )));
        }
        self.contents = Self::encode_children(&children);
        self.children = children;
        Ok(())
    }
}

/// A decoded or constructed BER value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BerObject {
    /// End-of-contents marker; decodable, never written by the protocol
    EndOfContents,
    Null(BerNull),
    Boolean(BerBoolean),
    Integer(BerInteger),
    OctetString(BerOctetString),
    Sequence(BerSequence),
}

impl BerObject {
    /// The universal NULL value
    pub const NULL: BerObject = BerObject::Null(BerNull::tagged(Identifier::NULL));

    pub fn integer(value: i32) -> Self {
        BerObject::Integer(BerInteger::new(value))
    }

    pub fn boolean(value: bool) -> Self {
        BerObject::Boolean(BerBoolean::new(value))
    }

    pub fn text(text: &str, charset: Charset) -> Self {
        BerObject::OctetString(BerOctetString::from_text(text, charset))
    }

    /// An octet string for `Some`, NULL for `None`
    pub fn optional_text(text: Option<&str>, charset: Charset) -> Self {
        match text {
            Some(text) => Self::text(text, charset),
            None => Self::NULL,
        }
    }

    pub fn sequence(children: Vec<BerObject>) -> Self {
        BerObject::Sequence(BerSequence::new(children))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, BerObject::Null(n) if n.identifier == Identifier::NULL)
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            BerObject::Integer(i) => Some(i.value()),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            BerObject::Boolean(b) => Some(b.value()),
            _ => None,
        }
    }

    pub fn as_octet_string(&self) -> Option<&BerOctetString> {
        match self {
            BerObject::OctetString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&BerSequence> {
        match self {
            BerObject::Sequence(s) => Some(s),
            _ => None,
        }
    }

    fn as_contents(&self) -> &dyn BerContents {
        match self {
            BerObject::EndOfContents => &END_OF_CONTENTS,
            BerObject::Null(v) => v,
            BerObject::Boolean(v) => v,
            BerObject::Integer(v) => v,
            BerObject::OctetString(v) => v,
            BerObject::Sequence(v) => v,
        }
    }
}

const END_OF_CONTENTS: BerNull = BerNull::tagged(Identifier::END_OF_CONTENTS);

impl BerContents for BerObject {
    fn identifier(&self) -> Identifier {
        self.as_contents().identifier()
    }

    fn content_length(&self) -> usize {
        self.as_contents().content_length()
    }

    fn encode_contents(&self, buf: &mut Vec<u8>) {
        self.as_contents().encode_contents(buf);
    }

    fn read_contents(&mut self, input: &mut dyn Read, module: &BerModule, length: usize) -> ProxyResult<()> {
        match self {
            BerObject::EndOfContents => expect_length(Identifier::END_OF_CONTENTS, length, 0),
            BerObject::Null(v) => v.read_contents(input, module, length),
            BerObject::Boolean(v) => v.read_contents(input, module, length),
            BerObject::Integer(v) => v.read_contents(input, module, length),
            BerObject::OctetString(v) => v.read_contents(input, module, length),
            BerObject::Sequence(v) => v.read_contents(input, module, length),
        }
    }
}

impl fmt::Display for BerObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identifier = self.identifier();
        let tagged = identifier.class() != crate::identifier::TagClass::Universal;
        if tagged {
            write!(f, "{} ", identifier)?;
        }
        match self {
            BerObject::EndOfContents => f.write_str("EOC"),
            BerObject::Null(_) => f.write_str("NULL"),
            BerObject::Boolean(b) => write!(f, "{}", b.value()),
            BerObject::Integer(i) => write!(f, "{}", i.value()),
            BerObject::OctetString(s) => write!(f, "{:?}", s.text()),
            BerObject::Sequence(s) => {
                f.write_str("[")?;
                for (i, child) in s.children().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str("]")
            }
        }
    }
}

fn expect_length(identifier: Identifier, length: usize, expected: usize) -> ProxyResult<()> {
    if length != expected {
        return Err(ProxyError::Decode(format!(
            "{} contents must be {} octets, got {}",
            identifier, expected, length
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> BerObject {
        let module = BerModule::new();
        let mut input = bytes;
        module.read_from(&mut input).unwrap().unwrap()
    }

    #[test]
    fn test_integer_minimal_encoding() {
        let cases: [(i32, &[u8]); 9] = [
            (0, &[0x00]),
            (-1, &[0xFF]),
            (127, &[0x7F]),
            (128, &[0x00, 0x80]),
            (-128, &[0x80]),
            (-129, &[0xFF, 0x7F]),
            (32767, &[0x7F, 0xFF]),
            (32768, &[0x00, 0x80, 0x00]),
            (i32::MIN, &[0x80, 0x00, 0x00, 0x00]),
        ];
        for (value, contents) in cases {
            let encoded = BerInteger::new(value).encode();
            assert_eq!(encoded[0], 0x02, "identifier for {}", value);
            assert_eq!(encoded[1] as usize, contents.len(), "length for {}", value);
            assert_eq!(&encoded[2..], contents, "contents for {}", value);
        }
    }

    #[test]
    fn test_integer_round_trip() {
        let values = [
            0, -1, 127, 128, -128, 129, 254, 255, 256, 1729, 32767, 32768, -32768, -32769,
            i32::MIN, i32::MAX, i32::MIN + 1, 0x8080_8080u32 as i32,
        ];
        for value in values {
            assert_eq!(decode(&BerInteger::new(value).encode()).as_integer(), Some(value));
        }
    }

    #[test]
    fn test_integer_length_rejected() {
        let module = BerModule::new();
        let mut input: &[u8] = &[0x02, 0x05, 0, 0, 0, 0, 1];
        assert!(matches!(module.read_from(&mut input), Err(ProxyError::Decode(_))));
        let mut input: &[u8] = &[0x02, 0x00];
        assert!(matches!(module.read_from(&mut input), Err(ProxyError::Decode(_))));
    }

    #[test]
    fn test_enumerated_shares_integer_shape() {
        let encoded = BerInteger::enumerated(128).encode();
        assert_eq!(encoded, vec![0x0A, 0x02, 0x00, 0x80]);
        match decode(&encoded) {
            BerObject::Integer(i) => {
                assert!(i.is_enumerated());
                assert_eq!(i.value(), 128);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_boolean() {
        assert_eq!(BerBoolean::new(true).encode(), vec![0x01, 0x01, 0xFF]);
        assert_eq!(decode(&[0x01, 0x01, 0x00]).as_boolean(), Some(false));
        assert_eq!(decode(&[0x01, 0x01, 0x2A]).as_boolean(), Some(true));
    }

    #[test]
    fn test_null_and_end_of_contents() {
        assert_eq!(BerObject::NULL.encode(), vec![0x05, 0x00]);
        assert!(decode(&[0x05, 0x00]).is_null());
        assert_eq!(decode(&[0x00, 0x00]), BerObject::EndOfContents);
        assert_eq!(BerObject::EndOfContents.encode(), vec![0x00, 0x00]);
    }

    #[test]
    fn test_octet_string_round_trip_lengths() {
        for length in [0usize, 1, 127, 128, 254, 255, 256, 65535, 65536, 70000] {
            let bytes: Vec<u8> = (0..length).map(|i| (i % 251) as u8).collect();
            let original = BerOctetString::from_bytes(bytes.clone(), Charset::Ascii);
            let decoded = decode(&original.encode());
            assert_eq!(decoded.as_octet_string().unwrap().bytes().as_ref(), bytes.as_slice());
        }
    }

    #[test]
    fn test_octet_string_text() {
        let s = BerOctetString::from_text("hello, world", Charset::Ascii);
        let decoded = decode(&s.encode());
        assert_eq!(decoded.as_octet_string().unwrap().text(), "hello, world");
        assert_eq!(decoded.to_string(), "\"hello, world\"");
    }

    #[test]
    fn test_sequence_encoding() {
        let seq = BerSequence::new(vec![
            BerObject::text("hello, world", Charset::Ascii),
            BerObject::integer(42),
            BerObject::NULL,
        ]);
        let mut expected = vec![0x30, 19, 0x04, 12];
        expected.extend_from_slice(b"hello, world");
        expected.extend_from_slice(&[0x02, 0x01, 42, 0x05, 0x00]);
        assert_eq!(seq.encode(), expected);

        let decoded = decode(&expected);
        assert_eq!(decoded.to_string(), "[\"hello, world\", 42, NULL]");
    }

    #[test]
    fn test_sequence_determinism_nested() {
        let leaf = |n: i32| {
            BerObject::sequence(vec![
                BerObject::integer(n),
                BerObject::text(&"x".repeat(n as usize * 40), Charset::Ascii),
                BerObject::NULL,
                BerObject::boolean(n % 2 == 0),
                BerObject::Integer(BerInteger::enumerated(n)),
            ])
        };
        let middle = BerObject::sequence(vec![leaf(1), leaf(2), BerObject::sequence(vec![])]);
        let outer = BerObject::sequence(vec![middle.clone(), leaf(7), middle]);

        let first = outer.encode();
        let decoded = decode(&first);
        assert_eq!(decoded, outer);
        assert_eq!(decoded.encode(), first);
    }

    #[test]
    fn test_sequence_length_mismatch() {
        // declared 6 content bytes, nested integer claims 5 of which only 4 remain
        let module = BerModule::new();
        let mut input: &[u8] = &[0x30, 0x06, 0x02, 0x05, 0x00, 0x00, 0x00, 0x01];
        assert!(module.read_from(&mut input).is_err());
    }

    #[test]
    fn test_sequence_truncated_stream() {
        let module = BerModule::new();
        let mut input: &[u8] = &[0x30, 0x06, 0x02, 0x01, 0x05];
        match module.read_from(&mut input) {
            Err(ProxyError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sequence_leaves_following_object() {
        let mut bytes = BerObject::sequence(vec![BerObject::integer(1), BerObject::integer(2)]).encode();
        bytes.extend_from_slice(&BerObject::integer(3).encode());
        let module = BerModule::new();
        let mut input = bytes.as_slice();
        let first = module.read_from(&mut input).unwrap().unwrap();
        assert_eq!(first.as_sequence().unwrap().len(), 2);
        let second = module.read_from(&mut input).unwrap().unwrap();
        assert_eq!(second.as_integer(), Some(3));
        assert!(module.read_from(&mut input).unwrap().is_none());
    }
}
