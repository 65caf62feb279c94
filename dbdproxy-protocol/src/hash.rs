//! Name/value container used for connection properties

use dbdproxy_ber::{BerContents, BerObject, BerOctetString, BerSequence};
use dbdproxy_core::{Charset, ProxyError, ProxyResult};

use crate::tags::{self, constructed};

/// Ordered key/value pairs, encoded as `[key, value]*` octet strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BerHash {
    entries: Vec<(BerOctetString, BerOctetString)>,
}

impl BerHash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>, charset: Charset) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (BerOctetString::from_text(k, charset), BerOctetString::from_text(v, charset)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode the pairs with `charset`
    pub fn to_pairs(&self, charset: Charset) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.text_in(charset), v.text_in(charset)))
            .collect()
    }

    pub fn from_ber(object: &BerObject) -> ProxyResult<Self> {
        let sequence = object
            .as_sequence()
            .filter(|s| s.identifier() == constructed(tags::BER_HASH))
            .ok_or_else(|| ProxyError::Protocol(format!("expected a property hash, got {}", object)))?;
        if sequence.len() % 2 != 0 {
            return Err(ProxyError::Protocol(format!(
                "property hash has an odd number of elements ({})",
                sequence.len()
            )));
        }
        let mut entries = Vec::with_capacity(sequence.len() / 2);
        for pair in sequence.children().chunks(2) {
            match (pair[0].as_octet_string(), pair[1].as_octet_string()) {
                (Some(k), Some(v)) => entries.push((k.clone(), v.clone())),
                _ => {
                    return Err(ProxyError::Protocol(
                        "property hash entries must be octet strings".to_string(),
                    ));
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn to_ber(&self) -> BerObject {
        let mut children = Vec::with_capacity(self.entries.len() * 2);
        for (k, v) in &self.entries {
            children.push(BerObject::OctetString(k.clone()));
            children.push(BerObject::OctetString(v.clone()));
        }
        BerObject::Sequence(BerSequence::tagged(constructed(tags::BER_HASH), children))
    }
}
