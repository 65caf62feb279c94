//! Conversion of wire parameters into typed values
//!
//! Every parameter arrives as an octet string (or NULL) together with an
//! SQL type hint. The hint selects how the octets are interpreted.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dbdproxy_core::{DbdError, DbdErrorKind, sql_type};
use dbdproxy_driver::SqlValue;
use dbdproxy_protocol::Parameter;
use regex::Regex;

const DECIMAL_PATTERN: &str = r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$";

static DECIMAL_RE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(DECIMAL_PATTERN));

fn parse<T: std::str::FromStr>(text: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    text.parse::<T>().map_err(|e| format!("{} ({:?})", e, text))
}

fn decimal(text: &str) -> Result<String, String> {
    let re = DECIMAL_RE.as_ref().map_err(|e| e.to_string())?;
    if re.is_match(text) {
        Ok(text.to_string())
    } else {
        Err(format!("invalid decimal ({:?})", text))
    }
}

/// Value for a statement parameter
///
/// # Errors
/// Returns a description of why the octets do not fit the type hint
pub fn bind_value(param: &Parameter) -> Result<SqlValue, String> {
    let type_code = param.type_code();
    let Some(value) = param.value() else {
        return Ok(SqlValue::Null(type_code));
    };
    if sql_type::is_binary(type_code) {
        return Ok(SqlValue::Bytes(value.bytes().to_vec()));
    }
    let text = value.text();
    Ok(match type_code {
        sql_type::TINYINT | sql_type::SMALLINT => SqlValue::SmallInt(parse(text)?),
        sql_type::INTEGER => SqlValue::Integer(parse(text)?),
        sql_type::BIGINT => SqlValue::BigInt(parse(text)?),
        sql_type::REAL => SqlValue::Real(parse(text)?),
        sql_type::FLOAT | sql_type::DOUBLE => SqlValue::Double(parse(text)?),
        sql_type::DECIMAL | sql_type::NUMERIC => SqlValue::Decimal(decimal(text)?),
        sql_type::BIT => SqlValue::Boolean(text == "1"),
        _ => SqlValue::Text(text.to_string()),
    })
}

/// Bind values for all parameters of an Execute request
///
/// # Errors
/// Returns `SetParameter` with the 1-based position of the first parameter
/// that cannot be converted
pub fn bind_values(params: &[Parameter]) -> Result<Vec<SqlValue>, DbdError> {
    params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            bind_value(param).map_err(|reason| {
                log::debug!("parameter {} rejected: {}", i + 1, reason);
                DbdError::with_args(DbdErrorKind::SetParameter, [(i + 1).to_string(), reason])
            })
        })
        .collect()
}

/// An argument of a Func request
#[derive(Debug, Clone, PartialEq)]
pub enum FuncValue {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl FuncValue {
    /// Integer value, if this is an integer that fits
    pub fn as_int(&self) -> Option<i32> {
        match self {
            FuncValue::Byte(v) => Some(i32::from(*v)),
            FuncValue::Short(v) => Some(i32::from(*v)),
            FuncValue::Int(v) => Some(*v),
            FuncValue::Long(v) => i32::try_from(*v).ok(),
            FuncValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FuncValue::Boolean(b) => Some(*b),
            FuncValue::Text(s) => Some(s == "1"),
            _ => self.as_int().map(|v| v != 0),
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            FuncValue::Null | FuncValue::Bytes(_) => None,
            FuncValue::Boolean(b) => Some(if *b { "1" } else { "0" }.to_string()),
            FuncValue::Byte(v) => Some(v.to_string()),
            FuncValue::Short(v) => Some(v.to_string()),
            FuncValue::Int(v) => Some(v.to_string()),
            FuncValue::Long(v) => Some(v.to_string()),
            FuncValue::Float(v) => Some(v.to_string()),
            FuncValue::Double(v) => Some(v.to_string()),
            FuncValue::Decimal(s) | FuncValue::Text(s) => Some(s.clone()),
            FuncValue::Date(d) => Some(d.to_string()),
            FuncValue::Time(t) => Some(t.to_string()),
            FuncValue::Timestamp(ts) => Some(ts.to_string()),
        }
    }
}

fn date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|e| format!("{} ({:?})", e, text))
}

fn time(text: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M:%S").map_err(|e| format!("{} ({:?})", e, text))
}

fn timestamp(text: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| format!("{} ({:?})", e, text))
}

/// Value for a Func argument
///
/// Uses the statement parameter rules, except that TINYINT is a single
/// byte and date and time types are parsed.
pub fn func_value(param: &Parameter) -> Result<FuncValue, String> {
    let type_code = param.type_code();
    let Some(value) = param.value() else {
        return Ok(FuncValue::Null);
    };
    if sql_type::is_binary(type_code) {
        return Ok(FuncValue::Bytes(value.bytes().to_vec()));
    }
    let text = value.text();
    Ok(match type_code {
        sql_type::TINYINT => FuncValue::Byte(parse(text)?),
        sql_type::SMALLINT => FuncValue::Short(parse(text)?),
        sql_type::INTEGER => FuncValue::Int(parse(text)?),
        sql_type::BIGINT => FuncValue::Long(parse(text)?),
        sql_type::REAL => FuncValue::Float(parse(text)?),
        sql_type::FLOAT | sql_type::DOUBLE => FuncValue::Double(parse(text)?),
        sql_type::DECIMAL | sql_type::NUMERIC => FuncValue::Decimal(decimal(text)?),
        sql_type::BIT => FuncValue::Boolean(text == "1"),
        sql_type::DATE => FuncValue::Date(date(text)?),
        sql_type::TIME => FuncValue::Time(time(text)?),
        sql_type::TIMESTAMP => FuncValue::Timestamp(timestamp(text)?),
        _ => FuncValue::Text(text.to_string()),
    })
}

/// Arguments for a Func request
pub fn func_values(params: &[Parameter]) -> Result<Vec<FuncValue>, DbdError> {
    params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            func_value(param).map_err(|reason| {
                DbdError::with_args(DbdErrorKind::SetParameter, [(i + 1).to_string(), reason])
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbdproxy_core::Charset;

    fn text(value: &str, type_code: i32) -> Parameter {
        Parameter::text(value, type_code, Charset::Ascii)
    }

    #[test]
    fn test_numeric_hints() {
        assert_eq!(bind_value(&text("-7", sql_type::TINYINT)), Ok(SqlValue::SmallInt(-7)));
        assert_eq!(bind_value(&text("42", sql_type::INTEGER)), Ok(SqlValue::Integer(42)));
        assert_eq!(
            bind_value(&text("9000000000", sql_type::BIGINT)),
            Ok(SqlValue::BigInt(9_000_000_000))
        );
        assert_eq!(bind_value(&text("1.5", sql_type::REAL)), Ok(SqlValue::Real(1.5)));
        assert_eq!(bind_value(&text("2.25", sql_type::FLOAT)), Ok(SqlValue::Double(2.25)));
        assert!(bind_value(&text("40000", sql_type::SMALLINT)).is_err());
        assert!(bind_value(&text("1e3", sql_type::INTEGER)).is_err());
    }

    #[test]
    fn test_decimal_validation() {
        assert_eq!(
            bind_value(&text("-12.50", sql_type::DECIMAL)),
            Ok(SqlValue::Decimal("-12.50".into()))
        );
        assert!(bind_value(&text(".5E-3", sql_type::NUMERIC)).is_ok());
        assert!(bind_value(&text("12,50", sql_type::NUMERIC)).is_err());
        assert!(bind_value(&text("", sql_type::DECIMAL)).is_err());
    }

    #[test]
    fn test_decimal_pattern_is_shared() {
        let compiled: *const Regex = DECIMAL_RE.as_ref().unwrap();
        for i in 0..1000 {
            assert!(decimal(&format!("{}.25", i)).is_ok());
        }
        assert!(std::ptr::eq(compiled, DECIMAL_RE.as_ref().unwrap()));
    }

    #[test]
    fn test_bit_binary_null_and_text() {
        assert_eq!(bind_value(&text("1", sql_type::BIT)), Ok(SqlValue::Boolean(true)));
        assert_eq!(bind_value(&text("true", sql_type::BIT)), Ok(SqlValue::Boolean(false)));
        assert_eq!(
            bind_value(&Parameter::bytes(vec![0xFF, 0x00], sql_type::VARBINARY)),
            Ok(SqlValue::Bytes(vec![0xFF, 0x00]))
        );
        assert_eq!(
            bind_value(&Parameter::null(sql_type::INTEGER)),
            Ok(SqlValue::Null(sql_type::INTEGER))
        );
        assert_eq!(
            bind_value(&text("2024-01-31", sql_type::DATE)),
            Ok(SqlValue::Text("2024-01-31".into()))
        );
        assert_eq!(bind_value(&text("x", 9999)), Ok(SqlValue::Text("x".into())));
    }

    #[test]
    fn test_error_names_parameter_position() {
        let params = vec![text("5", sql_type::INTEGER), text("abc", sql_type::INTEGER)];
        let err = bind_values(&params).unwrap_err();
        assert_eq!(err.kind(), DbdErrorKind::SetParameter);
        assert!(err.message().starts_with("Error setting parameter 2:"));
        assert!(err.message().contains("abc"));
    }

    #[test]
    fn test_func_values() {
        assert_eq!(func_value(&text("-128", sql_type::TINYINT)), Ok(FuncValue::Byte(-128)));
        assert!(func_value(&text("200", sql_type::TINYINT)).is_err());
        assert_eq!(
            func_value(&text("2024-02-29", sql_type::DATE)),
            Ok(FuncValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );
        assert!(func_value(&text("2023-02-29", sql_type::DATE)).is_err());
        let ts = func_value(&text("2024-01-02 03:04:05.5", sql_type::TIMESTAMP)).unwrap();
        assert_eq!(ts.as_text().as_deref(), Some("2024-01-02 03:04:05.500"));
        assert_eq!(func_value(&text("12:30:00", sql_type::TIME)).unwrap().as_text().as_deref(), Some("12:30:00"));
    }

    #[test]
    fn test_func_value_accessors() {
        assert_eq!(FuncValue::Long(7).as_int(), Some(7));
        assert_eq!(FuncValue::Long(i64::MAX).as_int(), None);
        assert_eq!(FuncValue::Text("1".into()).as_bool(), Some(true));
        assert_eq!(FuncValue::Int(0).as_bool(), Some(false));
        assert_eq!(FuncValue::Boolean(true).as_text().as_deref(), Some("1"));
        assert_eq!(FuncValue::Null.as_text(), None);
    }
}
