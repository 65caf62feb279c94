//! Registries for the proxy's application types
//!
//! [`request_module`] is what the server decodes client traffic with.
//! [`response_module`] decodes the server's replies and is used by clients
//! and tests.

use bytes::Bytes;
use dbdproxy_ber::{
    BerInteger, BerModule, BerModuleBuilder, BerNull, BerObject, BerOctetString, BerSequence,
    Identifier,
};
use dbdproxy_core::{Charset, ProxyResult};

use crate::tags::{self, constructed, primitive, response_tag};

fn empty_shape(id: &Identifier) -> Option<BerObject> {
    Some(BerObject::Null(BerNull::tagged(*id)))
}

fn integer_shape(id: &Identifier) -> Option<BerObject> {
    Some(BerObject::Integer(BerInteger::tagged(*id, 0)))
}

fn octet_string_shape(id: &Identifier) -> Option<BerObject> {
    Some(BerObject::OctetString(BerOctetString::tagged_bytes(
        *id,
        Bytes::new(),
        Charset::Ascii,
    )))
}

fn sequence_shape(id: &Identifier) -> Option<BerObject> {
    Some(BerObject::Sequence(BerSequence::tagged(*id, Vec::new())))
}

fn register_all(
    mut builder: BerModuleBuilder,
    identifiers: impl IntoIterator<Item = Identifier>,
    shape: fn(&Identifier) -> Option<BerObject>,
) -> ProxyResult<BerModuleBuilder> {
    for identifier in identifiers {
        builder = builder.register(identifier, shape)?;
    }
    Ok(builder)
}

/// Registry for decoding requests, with `charset` as the initial encoding
pub fn request_module(charset: Charset) -> ProxyResult<BerModule> {
    let builder = BerModuleBuilder::new().charset(charset);
    let builder = register_all(builder, tags::EMPTY_REQUESTS.map(primitive), empty_shape)?;
    let builder = register_all(builder, tags::HANDLE_REQUESTS.map(primitive), integer_shape)?;
    let builder = register_all(
        builder,
        [primitive(tags::GET_CONNECTION_PROPERTY_REQUEST)],
        octet_string_shape,
    )?;
    let builder = register_all(builder, tags::SEQUENCE_REQUESTS.map(constructed), sequence_shape)?;
    Ok(builder.build())
}

/// Registry for decoding responses
pub fn response_module(charset: Charset) -> ProxyResult<BerModule> {
    let builder = BerModuleBuilder::new().charset(charset);
    let builder = register_all(builder, tags::EMPTY_RESPONSES.map(primitive), empty_shape)?;
    let builder = register_all(builder, tags::INTEGER_RESPONSES.map(primitive), integer_shape)?;
    let builder = register_all(
        builder,
        [primitive(response_tag(tags::GET_GENERATED_KEYS_REQUEST))],
        octet_string_shape,
    )?;
    let builder = register_all(builder, tags::SEQUENCE_RESPONSES.map(constructed), sequence_shape)?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbdproxy_ber::BerContents;
    use dbdproxy_core::ProxyError;

    #[test]
    fn test_modules_build() {
        assert!(request_module(Charset::Ascii).is_ok());
        assert!(response_module(Charset::Ascii).is_ok());
    }

    #[test]
    fn test_deeply_nested_request_is_a_decode_error() {
        let levels = 200_000usize;
        let mut buf = Vec::with_capacity(levels * 6);
        for level in 0..levels {
            let remaining = ((levels - level - 1) * 6) as u32;
            buf.extend_from_slice(&[0x30, 0x84]);
            buf.extend_from_slice(&remaining.to_be_bytes());
        }
        let module = request_module(Charset::Ascii).unwrap();
        assert!(matches!(module.decode(&buf), Err(ProxyError::Decode(_))));
    }

    #[test]
    fn test_request_forms() {
        let module = request_module(Charset::Ascii).unwrap();
        let fetch = BerInteger::tagged(primitive(tags::FETCH_REQUEST), 7).encode();
        assert_eq!(fetch, vec![0x51, 0x01, 0x07]);
        assert_eq!(module.decode(&fetch).unwrap().as_integer(), Some(7));

        // a constructed Fetch is not a registered request
        let wrong_form = [constructed(tags::FETCH_REQUEST).encoded()[0], 0x00];
        assert!(module.decode(&wrong_form).is_err());
    }

    #[test]
    fn test_high_tag_numbers() {
        let id = constructed(response_tag(tags::STATEMENT_FUNC_REQUEST));
        assert_eq!(id.encoded(), &[0x7F, 0x88, 0x08]);
        let module = response_module(Charset::Ascii).unwrap();
        let encoded = BerSequence::tagged(id, vec![BerObject::NULL]).encode();
        let decoded = module.decode(&encoded).unwrap();
        assert_eq!(decoded.identifier(), id);
    }

    #[test]
    fn test_clones_keep_separate_charsets() {
        let template = request_module(Charset::Ascii).unwrap();
        let mut session = template.clone();
        session.set_charset(Charset::Latin1);
        assert_eq!(template.charset(), Charset::Ascii);
        assert_eq!(session.charset(), Charset::Latin1);
    }
}
