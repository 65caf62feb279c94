//! BER identifier (tag class, form, tag number)

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};

use dbdproxy_core::{ProxyError, ProxyResult};

use crate::stream::{read_octet, truncated};

/// BER Tag Class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-specific types, used for every protocol message
/// - **Context-specific**: Context-dependent types
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Get tag class from bits 7-6 of the first identifier octet
    pub const fn from_bits(octet: u8) -> Self {
        match (octet >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    /// Convert tag class to bits (for encoding)
    pub const fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// Primitive or constructed encoding (bit 6 of the first octet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    Primitive,
    Constructed,
}

impl Form {
    pub const fn from_bits(octet: u8) -> Self {
        if octet & FORM_MASK != 0 {
            Form::Constructed
        } else {
            Form::Primitive
        }
    }

    pub const fn to_bits(self) -> u8 {
        match self {
            Form::Primitive => 0x00,
            Form::Constructed => FORM_MASK,
        }
    }
}

const FORM_MASK: u8 = 0x20;
const TAG_NUMBER_MASK: u8 = 0x1F;
/// One lead octet plus up to five 7-bit chunks for a `u32` tag number
const MAX_OCTETS: usize = 6;

/// BER identifier
///
/// Identifies the type of a BER value. The encoded octets are computed once
/// when the identifier is built, so writing and comparing identifiers never
/// re-derives the variable-length form.
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C F T T T T T
/// ```
///
/// High tag number form (tag number >= 31):
/// ```text
/// First octet:      C C F 1 1 1 1 1
/// Following octets: 1 T T T T T T T ... 0 T T T T T T T
/// ```
///
/// # Equality
/// Two identifiers are equal when class, form and tag number all match.
/// Form takes part in the comparison: protocol messages reuse tag numbers
/// with both primitive and constructed encodings.
///
/// Universal identifiers are fixed by the format and only available as the
/// associated constants; [`Identifier::new`] refuses the universal class.
#[derive(Clone, Copy)]
pub struct Identifier {
    class: TagClass,
    form: Form,
    number: u32,
    octets: [u8; MAX_OCTETS],
    len: u8,
}

impl Identifier {
    pub const END_OF_CONTENTS: Identifier = Identifier::build(TagClass::Universal, Form::Primitive, 0);
    pub const BOOLEAN: Identifier = Identifier::build(TagClass::Universal, Form::Primitive, 1);
    pub const INTEGER: Identifier = Identifier::build(TagClass::Universal, Form::Primitive, 2);
    pub const OCTET_STRING: Identifier = Identifier::build(TagClass::Universal, Form::Primitive, 4);
    pub const NULL: Identifier = Identifier::build(TagClass::Universal, Form::Primitive, 5);
    pub const ENUMERATED: Identifier = Identifier::build(TagClass::Universal, Form::Primitive, 10);
    pub const SEQUENCE: Identifier = Identifier::build(TagClass::Universal, Form::Constructed, 16);

    /// Create a non-universal identifier
    ///
    /// # Errors
    /// Returns `ProxyError::Protocol` for the universal class.
    pub fn new(class: TagClass, form: Form, number: u32) -> ProxyResult<Self> {
        if class == TagClass::Universal {
            return Err(ProxyError::Protocol(format!(
                "universal identifier {} cannot be created by applications",
                number
            )));
        }
        Ok(Self::build(class, form, number))
    }

    /// Create an application class identifier
    pub const fn application(form: Form, number: u32) -> Self {
        Self::build(TagClass::Application, form, number)
    }

    const fn build(class: TagClass, form: Form, number: u32) -> Self {
        let mut octets = [0u8; MAX_OCTETS];
        let lead = class.to_bits() | form.to_bits();
        if number < TAG_NUMBER_MASK as u32 {
            octets[0] = lead | number as u8;
            return Self {
                class,
                form,
                number,
                octets,
                len: 1,
            };
        }

        octets[0] = lead | TAG_NUMBER_MASK;
        let mut chunks: u32 = 1;
        let mut rest = number >> 7;
        while rest > 0 {
            chunks += 1;
            rest >>= 7;
        }
        let mut i: u32 = 0;
        while i < chunks {
            let shift = 7 * (chunks - 1 - i);
            let mut octet = ((number >> shift) & 0x7F) as u8;
            if i + 1 < chunks {
                octet |= 0x80;
            }
            octets[1 + i as usize] = octet;
            i += 1;
        }
        Self {
            class,
            form,
            number,
            octets,
            len: (chunks + 1) as u8,
        }
    }

    pub const fn class(&self) -> TagClass {
        self.class
    }

    pub const fn form(&self) -> Form {
        self.form
    }

    pub const fn number(&self) -> u32 {
        self.number
    }

    pub const fn is_constructed(&self) -> bool {
        matches!(self.form, Form::Constructed)
    }

    /// The encoded identifier octets
    pub fn encoded(&self) -> &[u8] {
        &self.octets[..self.len as usize]
    }

    pub fn write_to(&self, out: &mut dyn Write) -> ProxyResult<()> {
        out.write_all(self.encoded())?;
        Ok(())
    }

    /// Read an identifier from a stream
    ///
    /// # Returns
    /// `Ok(None)` when the stream is at a clean end before the first octet.
    ///
    /// # Error Handling
    /// Returns an error if:
    /// - The stream ends inside a high tag number (I/O error)
    /// - The tag number does not fit in 32 bits
    /// - A universal tag number is not one of the supported types
    pub fn read_from(input: &mut dyn Read) -> ProxyResult<Option<Self>> {
        let Some(first) = read_octet(input)? else {
            return Ok(None);
        };
        let class = TagClass::from_bits(first);
        let form = Form::from_bits(first);
        let mut number = u32::from(first & TAG_NUMBER_MASK);

        if number == u32::from(TAG_NUMBER_MASK) {
            number = 0;
            let mut count = 0;
            loop {
                let octet = read_octet(input)?.ok_or_else(|| truncated("identifier"))?;
                count += 1;
                if count > MAX_OCTETS - 1 || number > (u32::MAX >> 7) {
                    return Err(ProxyError::Decode(
                        "tag number too large or invalid encoding".to_string(),
                    ));
                }
                number = (number << 7) | u32::from(octet & 0x7F);
                if octet & 0x80 == 0 {
                    break;
                }
            }
        }

        if class == TagClass::Universal {
            return Self::universal(number).map(Some);
        }
        Ok(Some(Self::build(class, form, number)))
    }

    fn universal(number: u32) -> ProxyResult<Self> {
        match number {
            0 => Ok(Self::END_OF_CONTENTS),
            1 => Ok(Self::BOOLEAN),
            2 => Ok(Self::INTEGER),
            4 => Ok(Self::OCTET_STRING),
            5 => Ok(Self::NULL),
            10 => Ok(Self::ENUMERATED),
            16 => Ok(Self::SEQUENCE),
            other => Err(ProxyError::Decode(format!(
                "unsupported universal type {} ({})",
                universal_name(other),
                other
            ))),
        }
    }
}

fn universal_name(number: u32) -> &'static str {
    match number {
        3 => "BIT STRING",
        6 => "OBJECT IDENTIFIER",
        7 => "ObjectDescriptor",
        8 => "EXTERNAL",
        9 => "REAL",
        11 => "EMBEDDED PDV",
        12 => "UTF8String",
        17 => "SET",
        18..=22 | 25..=30 => "character string",
        23 => "UTCTime",
        24 => "GeneralizedTime",
        _ => "unknown",
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.encoded() == other.encoded()
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded().hash(state);
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({:?}, {:?}, {})", self.class, self.form, self.number)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class {
            TagClass::Universal => "UNIVERSAL",
            TagClass::Application => "APPLICATION",
            TagClass::ContextSpecific => "CONTEXT",
            TagClass::Private => "PRIVATE",
        };
        write!(f, "[{} {}]", class, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> ProxyResult<Option<Identifier>> {
        let mut input = bytes;
        Identifier::read_from(&mut input)
    }

    #[test]
    fn test_short_form() {
        assert_eq!(Identifier::INTEGER.encoded(), &[0x02]);
        assert_eq!(Identifier::SEQUENCE.encoded(), &[0x30]);
        let connect = Identifier::application(Form::Constructed, 0x0B);
        assert_eq!(connect.encoded(), &[0x6B]);
        let fetch = Identifier::application(Form::Primitive, 0x11);
        assert_eq!(fetch.encoded(), &[0x51]);
    }

    #[test]
    fn test_high_tag_number_form() {
        let id = Identifier::application(Form::Primitive, 31);
        assert_eq!(id.encoded(), &[0x5F, 0x1F]);

        // 1011 = 0x3F3 -> 0b111_1110011 -> 0x87 0x73
        let id = Identifier::application(Form::Constructed, 1011);
        assert_eq!(id.encoded(), &[0x7F, 0x87, 0x73]);

        let id = Identifier::new(TagClass::Private, Form::Primitive, u32::MAX).unwrap();
        assert_eq!(id.encoded().len(), 6);
        assert_eq!(decode(id.encoded()).unwrap(), Some(id));
    }

    #[test]
    fn test_round_trip() {
        for number in [0u32, 1, 30, 31, 75, 127, 128, 1000, 1033, 16383, 16384, 1 << 21] {
            for form in [Form::Primitive, Form::Constructed] {
                let id = Identifier::new(TagClass::ContextSpecific, form, number).unwrap();
                let decoded = decode(id.encoded()).unwrap().unwrap();
                assert_eq!(decoded, id);
                assert_eq!(decoded.number(), number);
                assert_eq!(decoded.form(), form);
            }
        }
    }

    #[test]
    fn test_equality_includes_form() {
        let a = Identifier::application(Form::Primitive, 0x19);
        let b = Identifier::new(TagClass::Application, Form::Primitive, 0x19).unwrap();
        let c = Identifier::application(Form::Constructed, 0x19);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Identifier::new(TagClass::Private, Form::Primitive, 0x19).unwrap());
    }

    #[test]
    fn test_universal_is_reserved() {
        assert!(Identifier::new(TagClass::Universal, Form::Primitive, 2).is_err());
    }

    #[test]
    fn test_clean_eof() {
        assert!(decode(&[]).unwrap().is_none());
    }

    #[test]
    fn test_truncated_high_tag_number() {
        match decode(&[0x7F, 0x87]) {
            Err(ProxyError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_universal_types() {
        for octet in [0x03u8, 0x06, 0x09, 0x31, 0x0C, 0x13] {
            match decode(&[octet]) {
                Err(ProxyError::Decode(msg)) => assert!(msg.contains("unsupported")),
                other => panic!("unexpected {:?} for {:#x}", other, octet),
            }
        }
    }

    #[test]
    fn test_universal_table() {
        assert_eq!(decode(&[0x30]).unwrap(), Some(Identifier::SEQUENCE));
        assert_eq!(decode(&[0x0A]).unwrap(), Some(Identifier::ENUMERATED));
        assert_eq!(decode(&[0x00]).unwrap(), Some(Identifier::END_OF_CONTENTS));
    }
}
