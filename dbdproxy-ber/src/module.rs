//! Identifier registry and stream decoder
//!
//! A [`BerModule`] turns identifiers read from a stream into empty values
//! of the right shape, then lets each value read its own contents. The
//! universal types are built in; application types are supplied by the
//! protocol layer through [`BerModuleBuilder`].

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use dbdproxy_core::{Charset, ProxyError, ProxyResult};

use crate::identifier::{Identifier, TagClass};
use crate::length::BerLength;
use crate::object::{BerBoolean, BerContents, BerInteger, BerObject, BerOctetString, BerSequence};

/// Deepest constructed value a module will decode
///
/// Top-level values sit at depth zero.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Creates an empty value for an identifier, or declines it
pub trait BerObjectFactory: Send + Sync {
    fn create(&self, identifier: &Identifier) -> Option<BerObject>;
}

impl<F> BerObjectFactory for F
where
    F: Fn(&Identifier) -> Option<BerObject> + Send + Sync,
{
    fn create(&self, identifier: &Identifier) -> Option<BerObject> {
        self(identifier)
    }
}

#[derive(Default)]
struct Registry {
    exact: HashMap<Identifier, Box<dyn BerObjectFactory>>,
    predicates: Vec<Box<dyn BerObjectFactory>>,
}

impl Registry {
    fn create(&self, identifier: &Identifier) -> Option<BerObject> {
        if let Some(factory) = self.exact.get(identifier) {
            return factory.create(identifier);
        }
        self.predicates.iter().find_map(|factory| factory.create(identifier))
    }
}

/// Builder for a [`BerModule`] with application types
///
/// # Example
/// ```
/// use dbdproxy_ber::{BerInteger, BerModuleBuilder, BerObject, Form, Identifier};
///
/// let fetch = Identifier::application(Form::Primitive, 8);
/// let module = BerModuleBuilder::new()
///     .register(fetch, |id: &Identifier| Some(BerObject::Integer(BerInteger::tagged(*id, 0))))
///     .unwrap()
///     .build();
/// let decoded = module.decode(&[0x48, 0x01, 0x07]).unwrap();
/// assert_eq!(decoded.as_integer(), Some(7));
/// ```
#[derive(Default)]
pub struct BerModuleBuilder {
    registry: Registry,
    charset: Charset,
}

impl BerModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for one identifier
    ///
    /// Fails for universal identifiers, which are built in, and for
    /// identifiers registered twice.
    pub fn register(mut self, identifier: Identifier, factory: impl BerObjectFactory + 'static) -> ProxyResult<Self> {
        if identifier.class() == TagClass::Universal {
            return Err(ProxyError::Protocol(format!(
                "cannot register universal identifier {}",
                identifier
            )));
        }
        if self.registry.exact.contains_key(&identifier) {
            return Err(ProxyError::Protocol(format!(
                "identifier {} registered twice",
                identifier
            )));
        }
        self.registry.exact.insert(identifier, Box::new(factory));
        Ok(self)
    }

    /// Register a factory consulted, in registration order, for identifiers
    /// without an exact registration
    pub fn register_predicate(mut self, factory: impl BerObjectFactory + 'static) -> Self {
        self.registry.predicates.push(Box::new(factory));
        self
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn build(self) -> BerModule {
        BerModule {
            registry: Arc::new(self.registry),
            charset: self.charset,
            depth: 0,
        }
    }
}

/// Decoder for a set of identifiers
///
/// Clones share the registry; the string encoding is per clone, so a
/// session can switch its own encoding without affecting others.
#[derive(Clone)]
pub struct BerModule {
    registry: Arc<Registry>,
    charset: Charset,
    depth: usize,
}

impl BerModule {
    /// A module that knows only the universal types
    pub fn new() -> Self {
        BerModuleBuilder::new().build()
    }

    /// Encoding applied to octet strings as they are decoded
    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn set_charset(&mut self, charset: Charset) {
        self.charset = charset;
    }

    /// Module for reading the children of a constructed value
    ///
    /// Fails once the children would sit deeper than [`MAX_NESTING_DEPTH`].
    pub fn nested(&self) -> ProxyResult<BerModule> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ProxyError::Decode(format!(
                "BER values nested deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        Ok(Self {
            registry: Arc::clone(&self.registry),
            charset: self.charset,
            depth: self.depth + 1,
        })
    }

    /// Create an empty value for `identifier`
    pub fn create(&self, identifier: &Identifier) -> ProxyResult<BerObject> {
        let created = if identifier.class() == TagClass::Universal {
            self.create_universal(identifier)
        } else {
            self.registry.create(identifier)
        };
        created.ok_or_else(|| {
            ProxyError::Decode(format!("Unrecognized BER object identifier {}", identifier))
        })
    }

    fn create_universal(&self, identifier: &Identifier) -> Option<BerObject> {
        let object = match identifier.number() {
            0 => BerObject::EndOfContents,
            1 => BerObject::Boolean(BerBoolean::new(false)),
            2 => BerObject::Integer(BerInteger::new(0)),
            4 => BerObject::OctetString(BerOctetString::from_bytes(Vec::new(), self.charset)),
            5 => BerObject::NULL,
            10 => BerObject::Integer(BerInteger::enumerated(0)),
            16 => BerObject::Sequence(BerSequence::new(Vec::new())),
            _ => return None,
        };
        Some(object)
    }

    /// Read the next complete value from `input`
    ///
    /// Returns `Ok(None)` when the stream ends cleanly before an identifier.
    /// A stream that ends anywhere after the first identifier octet is an
    /// I/O error.
    pub fn read_from(&self, input: &mut dyn Read) -> ProxyResult<Option<BerObject>> {
        let Some(identifier) = Identifier::read_from(input)? else {
            return Ok(None);
        };
        let mut object = self.create(&identifier)?;
        let length = BerLength::read_from(input)?.value();
        object.read_contents(input, self, length)?;
        log::trace!("decoded {} ({} content bytes)", identifier, length);
        Ok(Some(object))
    }

    /// Decode exactly one value from a buffer
    pub fn decode(&self, bytes: &[u8]) -> ProxyResult<BerObject> {
        let mut input = bytes;
        let object = self
            .read_from(&mut input)?
            .ok_or_else(|| ProxyError::Decode("empty input".to_string()))?;
        if !input.is_empty() {
            return Err(ProxyError::Decode(format!(
                "{} trailing bytes after {}",
                input.len(),
                object.identifier()
            )));
        }
        Ok(object)
    }
}

impl Default for BerModule {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BerModule")
            .field("registered", &self.registry.exact.len())
            .field("predicates", &self.registry.predicates.len())
            .field("charset", &self.charset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Form;
    use crate::object::BerNull;

    const APP_INT: Identifier = Identifier::application(Form::Primitive, 3);

    fn module_with_int() -> BerModule {
        BerModuleBuilder::new()
            .register(APP_INT, |id: &Identifier| {
                Some(BerObject::Integer(BerInteger::tagged(*id, 0)))
            })
            .unwrap()
            .build()
    }

    #[test]
    fn test_unrecognized_identifier() {
        let err = BerModule::new().decode(&[0x43, 0x01, 0x01]).unwrap_err();
        assert!(err.to_string().contains("Unrecognized BER object identifier"));
    }

    #[test]
    fn test_application_integer() {
        let encoded = BerInteger::tagged(APP_INT, 300).encode();
        assert_eq!(encoded, vec![0x43, 0x02, 0x01, 0x2C]);
        let decoded = module_with_int().decode(&encoded).unwrap();
        assert_eq!(decoded.identifier(), APP_INT);
        assert_eq!(decoded.as_integer(), Some(300));
    }

    #[test]
    fn test_form_distinguishes_registration() {
        let constructed = Identifier::application(Form::Constructed, 3);
        let err = module_with_int().decode(&[constructed.encoded()[0], 0x00]).unwrap_err();
        assert!(matches!(err, ProxyError::Decode(_)));
    }

    #[test]
    fn test_predicate_factory_high_tag() {
        let module = BerModuleBuilder::new()
            .register_predicate(|id: &Identifier| {
                (id.class() == TagClass::Application && id.number() == 75).then(|| {
                    BerObject::OctetString(BerOctetString::tagged_bytes(*id, Vec::new(), Charset::Ascii))
                })
            })
            .build();

        let id = Identifier::application(Form::Constructed, 75);
        assert_eq!(id.encoded(), &[0x7F, 0x4B]);
        let original = BerOctetString::tagged_text(id, "hello, world", Charset::Ascii);
        let decoded = module.decode(&original.encode()).unwrap();
        assert_eq!(decoded, BerObject::OctetString(original));
        assert_eq!(decoded.as_octet_string().unwrap().text(), "hello, world");
    }

    #[test]
    fn test_exact_registration_beats_predicate() {
        let module = BerModuleBuilder::new()
            .register_predicate(|id: &Identifier| Some(BerObject::Null(BerNull::tagged(*id))))
            .register(APP_INT, |id: &Identifier| {
                Some(BerObject::Integer(BerInteger::tagged(*id, 0)))
            })
            .unwrap()
            .build();
        assert_eq!(module.decode(&[0x43, 0x01, 0x05]).unwrap().as_integer(), Some(5));
        let other = module.decode(&[0x44, 0x00]).unwrap();
        assert!(matches!(other, BerObject::Null(_)));
        assert!(!other.is_null());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let factory = |id: &Identifier| Some(BerObject::Integer(BerInteger::tagged(*id, 0)));
        let result = BerModuleBuilder::new()
            .register(APP_INT, factory)
            .unwrap()
            .register(APP_INT, factory);
        assert!(matches!(result, Err(ProxyError::Protocol(_))));
    }

    #[test]
    fn test_universal_registration_rejected() {
        let result = BerModuleBuilder::new().register(Identifier::INTEGER, |_: &Identifier| -> Option<BerObject> { None });
        assert!(result.is_err());
    }

    #[test]
    fn test_module_charset_applies_to_strings() {
        let mut module = BerModule::new();
        module.set_charset(Charset::Latin1);
        let decoded = module.decode(&[0x04, 0x02, 0x63, 0xE9]).unwrap();
        let s = decoded.as_octet_string().unwrap();
        assert_eq!(s.charset(), Charset::Latin1);
        assert_eq!(s.text(), "c\u{e9}");
    }

    fn nested_sequences(levels: usize) -> Vec<u8> {
        // each level is 0x30 0x84 plus a four-octet length
        let mut buf = Vec::with_capacity(levels * 6);
        for level in 0..levels {
            let remaining = ((levels - level - 1) * 6) as u32;
            buf.extend_from_slice(&[0x30, 0x84]);
            buf.extend_from_slice(&remaining.to_be_bytes());
        }
        buf
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let buf = nested_sequences(100_000);
        let result = BerModule::new().decode(&buf);
        assert!(matches!(result, Err(ProxyError::Decode(_))));
    }

    #[test]
    fn test_nesting_up_to_limit_accepted() {
        let buf = nested_sequences(MAX_NESTING_DEPTH + 1);
        let mut decoded = BerModule::new().decode(&buf).unwrap();
        let mut levels = 1;
        while let Some(child) = decoded.as_sequence().and_then(|s| s.children().first()).cloned() {
            decoded = child;
            levels += 1;
        }
        assert_eq!(levels, MAX_NESTING_DEPTH + 1);

        let too_deep = nested_sequences(MAX_NESTING_DEPTH + 2);
        assert!(matches!(BerModule::new().decode(&too_deep), Err(ProxyError::Decode(_))));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert!(BerModule::new().decode(&[0x05, 0x00, 0x05]).is_err());
    }
}
