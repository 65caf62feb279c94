//! Values bound to statement parameters

use std::fmt;

use dbdproxy_core::sql_type;

/// A typed parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL of the given SQL type
    Null(i32),
    Boolean(bool),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    /// Validated decimal text, kept exact
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null(t) => write!(f, "NULL ({})", sql_type::type_name(*t)),
            SqlValue::Boolean(b) => write!(f, "{}", b),
            SqlValue::SmallInt(v) => write!(f, "{}", v),
            SqlValue::Integer(v) => write!(f, "{}", v),
            SqlValue::BigInt(v) => write!(f, "{}", v),
            SqlValue::Real(v) => write!(f, "{}", v),
            SqlValue::Double(v) => write!(f, "{}", v),
            SqlValue::Decimal(v) | SqlValue::Text(v) => write!(f, "{:?}", v),
            SqlValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}
