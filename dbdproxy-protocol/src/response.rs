//! Server responses

use std::fmt;

use bytes::Bytes;
use dbdproxy_ber::{BerInteger, BerNull, BerObject, BerOctetString, BerSequence};
use dbdproxy_core::{Charset, DbError, DbdError, DbdErrorKind, ProxyError};

use crate::tags::{self, constructed, primitive, response_tag};

/// SQL state sent when the error carries none, or a malformed one
pub const DEFAULT_SQL_STATE: &str = "IDRVR";

/// A value in a property response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Null,
    Integer(i32),
    Text(String),
}

impl PropertyValue {
    fn to_ber(&self, charset: Charset) -> BerObject {
        match self {
            PropertyValue::Null => BerObject::NULL,
            PropertyValue::Integer(i) => BerObject::integer(*i),
            PropertyValue::Text(s) => BerObject::text(s, charset),
        }
    }
}

impl From<Option<String>> for PropertyValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(PropertyValue::Null, PropertyValue::Text)
    }
}

impl From<Option<i32>> for PropertyValue {
    fn from(value: Option<i32>) -> Self {
        value.map_or(PropertyValue::Null, PropertyValue::Integer)
    }
}

/// A column value in a Fetch response
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Null,
    Boolean(bool),
    Integer(i32),
    Text(String),
    Bytes(Bytes),
}

impl ColumnData {
    fn to_ber(&self, charset: Charset) -> BerObject {
        match self {
            ColumnData::Null => BerObject::NULL,
            ColumnData::Boolean(b) => BerObject::boolean(*b),
            ColumnData::Integer(i) => BerObject::integer(*i),
            ColumnData::Text(s) => BerObject::text(s, charset),
            ColumnData::Bytes(b) => BerObject::OctetString(BerOctetString::from_bytes(b.clone(), charset)),
        }
    }
}

/// One element of an error response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorElement {
    pub message: String,
    pub code: i32,
    pub sql_state: String,
}

impl ErrorElement {
    pub fn new(message: impl Into<String>, code: i32, sql_state: Option<&str>) -> Self {
        let sql_state = match sql_state {
            Some(state) if state.chars().count() == 5 => state.to_string(),
            _ => DEFAULT_SQL_STATE.to_string(),
        };
        Self {
            message: message.into(),
            code,
            sql_state,
        }
    }

    fn from_db_error(error: &DbError) -> Self {
        Self::new(error.message(), error.code(), error.sql_state())
    }

    fn to_ber(&self, charset: Charset) -> BerObject {
        BerObject::Sequence(BerSequence::tagged(
            constructed(tags::ERROR),
            vec![
                BerObject::text(&self.message, charset),
                BerObject::text(&self.code.to_string(), charset),
                BerObject::text(&self.sql_state, charset),
            ],
        ))
    }
}

impl fmt::Display for ErrorElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}/{})", self.message, self.code, self.sql_state)
    }
}

/// Error response: one element per link of the error chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorElement>,
}

impl ErrorResponse {
    /// Elements for a database error and its chained causes
    pub fn from_db_error(error: &DbError) -> Self {
        Self {
            errors: error.chain().map(ErrorElement::from_db_error).collect(),
        }
    }

    /// Elements for a proxy error followed by the driver error behind it
    pub fn from_dbd_error(error: &DbdError) -> Self {
        let mut errors = vec![ErrorElement::new(error.message(), error.code(), None)];
        if let Some(cause) = error.cause() {
            errors.extend(cause.chain().map(ErrorElement::from_db_error));
        }
        Self { errors }
    }

    /// The response for any error
    ///
    /// Non request-scoped errors are reported as a generic server exception
    /// carrying the error text.
    pub fn from_error(error: &ProxyError) -> Self {
        match error {
            ProxyError::Database(db) => Self::from_db_error(db),
            ProxyError::Dbd(dbd) => Self::from_dbd_error(dbd),
            other => Self::from_dbd_error(&DbdError::with_args(
                DbdErrorKind::GenericException,
                [other.to_string()],
            )),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.first() {
            Some(first) => write!(f, "{}", first),
            None => f.write_str("(no error)"),
        }
    }
}

/// A response sent to the client
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Connect,
    Disconnect,
    Commit,
    Rollback,
    SetConnectionProperty,
    SetStatementProperty,
    StatementFinish,
    StatementDestroy,
    Prepare { handle: i32 },
    Ping { alive: bool },
    /// Execute produced an update count
    ExecuteRows(i32),
    /// Execute produced a result set with this many columns
    ExecuteResultSet(i32),
    /// The next row, or `None` when the result set is exhausted
    Fetch(Option<Vec<ColumnData>>),
    GetConnectionProperty(Vec<PropertyValue>),
    GetStatementProperty(Vec<PropertyValue>),
    ConnectionFunc(Option<String>),
    StatementFunc(Option<String>),
    GetGeneratedKeys(String),
    Error(ErrorResponse),
}

impl Response {
    /// Tag of the outermost value
    pub fn tag(&self) -> u32 {
        match self {
            Response::Connect => response_tag(tags::CONNECT_REQUEST),
            Response::Disconnect => response_tag(tags::DISCONNECT_REQUEST),
            Response::Commit => response_tag(tags::COMMIT_REQUEST),
            Response::Rollback => response_tag(tags::ROLLBACK_REQUEST),
            Response::SetConnectionProperty => response_tag(tags::SET_CONNECTION_PROPERTY_REQUEST),
            Response::SetStatementProperty => response_tag(tags::SET_STATEMENT_PROPERTY_REQUEST),
            Response::StatementFinish => response_tag(tags::STATEMENT_FINISH_REQUEST),
            Response::StatementDestroy => response_tag(tags::STATEMENT_DESTROY_REQUEST),
            Response::Prepare { .. } => response_tag(tags::PREPARE_REQUEST),
            Response::Ping { .. } => response_tag(tags::PING_REQUEST),
            Response::ExecuteRows(_) | Response::ExecuteResultSet(_) => {
                response_tag(tags::EXECUTE_REQUEST)
            }
            Response::Fetch(_) => response_tag(tags::FETCH_REQUEST),
            Response::GetConnectionProperty(_) => response_tag(tags::GET_CONNECTION_PROPERTY_REQUEST),
            Response::GetStatementProperty(_) => response_tag(tags::GET_STATEMENT_PROPERTY_REQUEST),
            Response::ConnectionFunc(_) => response_tag(tags::CONNECTION_FUNC_REQUEST),
            Response::StatementFunc(_) => response_tag(tags::STATEMENT_FUNC_REQUEST),
            Response::GetGeneratedKeys(_) => response_tag(tags::GET_GENERATED_KEYS_REQUEST),
            Response::Error(_) => tags::ERROR_RESPONSE,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// Encode this response with `charset` for its strings
    pub fn to_ber(&self, charset: Charset) -> BerObject {
        let tag = self.tag();
        let sequence =
            |children: Vec<BerObject>| BerObject::Sequence(BerSequence::tagged(constructed(tag), children));
        match self {
            Response::Connect
            | Response::Disconnect
            | Response::Commit
            | Response::Rollback
            | Response::SetConnectionProperty
            | Response::SetStatementProperty
            | Response::StatementFinish
            | Response::StatementDestroy => BerObject::Null(BerNull::tagged(primitive(tag))),
            Response::Prepare { handle } => BerObject::Integer(BerInteger::tagged(primitive(tag), *handle)),
            Response::Ping { alive } => {
                BerObject::Integer(BerInteger::tagged(primitive(tag), i32::from(*alive)))
            }
            Response::ExecuteRows(count) => sequence(vec![BerObject::Integer(BerInteger::tagged(
                primitive(tags::EXECUTE_ROWS_RESPONSE),
                *count,
            ))]),
            Response::ExecuteResultSet(columns) => sequence(vec![BerObject::Integer(BerInteger::tagged(
                primitive(tags::EXECUTE_RESULT_SET_RESPONSE),
                *columns,
            ))]),
            Response::Fetch(row) => {
                let mut children = Vec::with_capacity(row.as_ref().map_or(0, Vec::len) + 1);
                children.push(BerObject::integer(i32::from(row.is_some())));
                if let Some(row) = row {
                    children.extend(row.iter().map(|column| column.to_ber(charset)));
                }
                sequence(children)
            }
            Response::GetConnectionProperty(values) | Response::GetStatementProperty(values) => {
                sequence(values.iter().map(|value| value.to_ber(charset)).collect())
            }
            Response::ConnectionFunc(value) | Response::StatementFunc(value) => {
                sequence(vec![BerObject::optional_text(value.as_deref(), charset)])
            }
            Response::GetGeneratedKeys(key) => {
                BerObject::OctetString(BerOctetString::tagged_text(primitive(tag), key, charset))
            }
            Response::Error(error) => {
                sequence(error.errors.iter().map(|element| element.to_ber(charset)).collect())
            }
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Prepare { handle } => write!(f, "Prepare complete; handle {}", handle),
            Response::Ping { alive } => write!(f, "Ping: {}", i32::from(*alive)),
            Response::ExecuteRows(count) => write!(f, "Execute complete; rows affected: {}", count),
            Response::ExecuteResultSet(columns) => {
                write!(f, "Execute complete; result set columns: {}", columns)
            }
            Response::Fetch(Some(row)) => write!(f, "Fetch complete; {} columns", row.len()),
            Response::Fetch(None) => f.write_str("Fetch complete; no data"),
            Response::GetConnectionProperty(_) | Response::GetStatementProperty(_) => {
                f.write_str("Property data being returned")
            }
            Response::ConnectionFunc(value) | Response::StatementFunc(value) => match value {
                Some(value) => write!(f, "Func returned '{}'", value),
                None => f.write_str("Func returned NULL"),
            },
            Response::GetGeneratedKeys(key) => write!(f, "Generated key '{}'", key),
            Response::Error(error) => write!(f, "Error: {}", error),
            other => write!(f, "{:?} complete", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::response_module;
    use dbdproxy_ber::BerContents;

    fn decode(response: &Response) -> BerObject {
        let module = response_module(Charset::Ascii).unwrap();
        module.decode(&response.to_ber(Charset::Ascii).encode()).unwrap()
    }

    #[test]
    fn test_empty_responses_are_primitive() {
        let encoded = Response::Connect.to_ber(Charset::Ascii).encode();
        // APPLICATION primitive 1011 = 7 * 128 + 115
        assert_eq!(encoded, vec![0x5F, 0x87, 0x73, 0x00]);
    }

    #[test]
    fn test_execute_wrapper() {
        let decoded = decode(&Response::ExecuteResultSet(1));
        let wrapper = decoded.as_sequence().unwrap();
        assert_eq!(wrapper.len(), 1);
        let inner = wrapper.get(0).unwrap();
        assert_eq!(inner.identifier(), primitive(tags::EXECUTE_RESULT_SET_RESPONSE));
        assert_eq!(inner.as_integer(), Some(1));

        let decoded = decode(&Response::ExecuteRows(0));
        let inner = decoded.as_sequence().unwrap().get(0).unwrap().clone();
        assert_eq!(inner.identifier(), primitive(tags::EXECUTE_ROWS_RESPONSE));
    }

    #[test]
    fn test_fetch_layout() {
        let row = Response::Fetch(Some(vec![
            ColumnData::Text("1".to_string()),
            ColumnData::Null,
            ColumnData::Bytes(Bytes::from_static(b"\x00\x01")),
        ]));
        let decoded = decode(&row);
        assert_eq!(decoded.to_string(), "[APPLICATION 1017] [1, \"1\", NULL, \"\\0\\u{1}\"]");

        let done = decode(&Response::Fetch(None));
        let children = done.as_sequence().unwrap().children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].as_integer(), Some(0));
    }

    #[test]
    fn test_func_response_null() {
        let decoded = decode(&Response::StatementFunc(None));
        assert!(decoded.as_sequence().unwrap().get(0).unwrap().is_null());
    }

    #[test]
    fn test_sql_state_defaults() {
        assert_eq!(ErrorElement::new("m", 1, None).sql_state, "IDRVR");
        assert_eq!(ErrorElement::new("m", 1, Some("")).sql_state, "IDRVR");
        assert_eq!(ErrorElement::new("m", 1, Some("42")).sql_state, "IDRVR");
        assert_eq!(ErrorElement::new("m", 1, Some("42000")).sql_state, "42000");
    }

    #[test]
    fn test_error_chain_elements() {
        let db = DbError::new("outer")
            .with_code(7)
            .with_sql_state("HY000")
            .with_next(DbError::new("inner"));
        let response = ErrorResponse::from_error(&ProxyError::Database(db));
        assert_eq!(response.errors.len(), 2);
        assert_eq!(response.errors[0].to_string(), "outer(7/HY000)");
        assert_eq!(response.errors[1].sql_state, "IDRVR");

        let decoded = decode(&Response::Error(response));
        assert_eq!(decoded.identifier(), constructed(tags::ERROR_RESPONSE));
        let first = decoded.as_sequence().unwrap().get(0).unwrap();
        assert_eq!(first.identifier(), constructed(tags::ERROR));
        let fields = first.as_sequence().unwrap();
        assert_eq!(fields.get(1).unwrap().as_octet_string().unwrap().text(), "7");
    }

    #[test]
    fn test_dbd_error_with_cause() {
        let dbd = DbdError::with_args(DbdErrorKind::SetParameter, ["1", "bad value"])
            .caused_by(DbError::new("driver said no").with_code(19));
        let response = ErrorResponse::from_dbd_error(&dbd);
        assert_eq!(response.errors.len(), 2);
        assert_eq!(response.errors[0].message, "Error setting parameter 1: bad value");
        assert_eq!(response.errors[0].code, DbdErrorKind::SetParameter.code());
        assert_eq!(response.errors[1].code, 19);
    }

    #[test]
    fn test_fatal_error_is_generic() {
        let response = ErrorResponse::from_error(&ProxyError::Decode("bad length".to_string()));
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].code, DbdErrorKind::GenericException.code());
        assert!(response.errors[0].message.contains("bad length"));
    }
}
