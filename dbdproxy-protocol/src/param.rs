//! Typed parameter values carried by Execute and Func requests

use dbdproxy_ber::{BerObject, BerOctetString};
use dbdproxy_core::{Charset, sql_type};

/// One positional parameter: the raw value (or NULL) and its SQL type hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    value: Option<BerOctetString>,
    type_code: i32,
}

impl Parameter {
    pub fn new(value: Option<BerOctetString>, type_code: i32) -> Self {
        Self { value, type_code }
    }

    pub fn null(type_code: i32) -> Self {
        Self::new(None, type_code)
    }

    pub fn text(value: &str, type_code: i32, charset: Charset) -> Self {
        Self::new(Some(BerOctetString::from_text(value, charset)), type_code)
    }

    pub fn bytes(value: impl Into<bytes::Bytes>, type_code: i32) -> Self {
        Self::new(Some(BerOctetString::from_bytes(value, Charset::Ascii)), type_code)
    }

    pub fn type_code(&self) -> i32 {
        self.type_code
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn value(&self) -> Option<&BerOctetString> {
        self.value.as_ref()
    }

    /// Append the value and type hint to a request's children
    pub(crate) fn push_to(&self, children: &mut Vec<BerObject>) {
        children.push(match &self.value {
            Some(value) => BerObject::OctetString(value.clone()),
            None => BerObject::NULL,
        });
        children.push(BerObject::integer(self.type_code));
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            None => write!(f, "NULL ({})", sql_type::type_name(self.type_code)),
            Some(v) if sql_type::is_binary(self.type_code) => {
                write!(f, "<{} bytes> ({})", v.bytes().len(), sql_type::type_name(self.type_code))
            }
            Some(v) => write!(f, "{:?} ({})", v.text(), sql_type::type_name(self.type_code)),
        }
    }
}
