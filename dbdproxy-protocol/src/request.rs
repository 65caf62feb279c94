//! Client requests
//!
//! A decoded [`BerObject`] is turned into a [`Request`] by looking at its
//! APPLICATION tag and pulling the fields out of its contents. Any shape
//! mismatch is a protocol error: the client and server disagree about the
//! wire format and the session cannot continue.

use std::fmt;

use dbdproxy_ber::{
    BerContents, BerInteger, BerNull, BerObject, BerOctetString, BerSequence, TagClass,
};
use dbdproxy_core::{Charset, KeyRequest, ProxyError, ProxyResult};

use crate::hash::BerHash;
use crate::param::Parameter;
use crate::tags::{self, constructed, primitive};

/// Key type names sent in a Prepare request
const KEY_TYPE_NAME: &str = "name";
const KEY_TYPE_INDEX: &str = "index";

/// Connect request
///
/// The encoding name is always ASCII. The remaining strings are kept as raw
/// octets and decoded once the session knows which encoding the client uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    url: BerOctetString,
    user: Option<BerOctetString>,
    password: Option<BerOctetString>,
    encoding: BerOctetString,
    properties: BerHash,
}

impl ConnectRequest {
    pub fn new(
        url: &str,
        user: Option<&str>,
        password: Option<&str>,
        encoding: &str,
        properties: BerHash,
        charset: Charset,
    ) -> Self {
        Self {
            url: BerOctetString::from_text(url, charset),
            user: user.map(|u| BerOctetString::from_text(u, charset)),
            password: password.map(|p| BerOctetString::from_text(p, charset)),
            encoding: BerOctetString::from_text(encoding, Charset::Ascii),
            properties,
        }
    }

    /// The client's encoding name; empty means the platform default
    pub fn encoding(&self) -> String {
        self.encoding.text_in(Charset::Ascii)
    }

    pub fn url(&self, charset: Charset) -> String {
        self.url.text_in(charset)
    }

    pub fn user(&self, charset: Charset) -> Option<String> {
        self.user.as_ref().map(|u| u.text_in(charset))
    }

    pub fn password(&self, charset: Charset) -> Option<String> {
        self.password.as_ref().map(|p| p.text_in(charset))
    }

    pub fn properties(&self, charset: Charset) -> Vec<(String, String)> {
        self.properties.to_pairs(charset)
    }
}

/// Prepare request: SQL text and the generated keys wanted from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareRequest {
    pub sql: String,
    pub keys: KeyRequest,
}

impl PrepareRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            keys: KeyRequest::Auto,
        }
    }

    pub fn with_keys(mut self, keys: KeyRequest) -> Self {
        self.keys = keys;
        self
    }
}

/// Execute request: statement handle and positional parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    pub handle: i32,
    pub params: Vec<Parameter>,
}

/// Method invocation: method name and typed arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncRequest {
    pub method: String,
    pub params: Vec<Parameter>,
}

/// Generated key lookup; catalog and schema are carried but not matched on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedKeysRequest {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
    pub column: Option<String>,
}

/// A decoded client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Connect(ConnectRequest),
    Disconnect,
    Commit,
    Rollback,
    Ping,
    Prepare(PrepareRequest),
    Execute(ExecuteRequest),
    Fetch { handle: i32 },
    GetConnectionProperty { name: String },
    GetStatementProperty { handle: i32, name: String },
    SetConnectionProperty { name: String, value: String },
    SetStatementProperty { handle: i32, name: String, value: String },
    StatementFinish { handle: i32 },
    StatementDestroy { handle: i32 },
    ConnectionFunc(FuncRequest),
    StatementFunc { handle: i32, func: FuncRequest },
    GetGeneratedKeys(GeneratedKeysRequest),
}

impl Request {
    pub fn tag(&self) -> u32 {
        match self {
            Request::Connect(_) => tags::CONNECT_REQUEST,
            Request::Disconnect => tags::DISCONNECT_REQUEST,
            Request::Commit => tags::COMMIT_REQUEST,
            Request::Rollback => tags::ROLLBACK_REQUEST,
            Request::Ping => tags::PING_REQUEST,
            Request::Prepare(_) => tags::PREPARE_REQUEST,
            Request::Execute(_) => tags::EXECUTE_REQUEST,
            Request::Fetch { .. } => tags::FETCH_REQUEST,
            Request::GetConnectionProperty { .. } => tags::GET_CONNECTION_PROPERTY_REQUEST,
            Request::GetStatementProperty { .. } => tags::GET_STATEMENT_PROPERTY_REQUEST,
            Request::SetConnectionProperty { .. } => tags::SET_CONNECTION_PROPERTY_REQUEST,
            Request::SetStatementProperty { .. } => tags::SET_STATEMENT_PROPERTY_REQUEST,
            Request::StatementFinish { .. } => tags::STATEMENT_FINISH_REQUEST,
            Request::StatementDestroy { .. } => tags::STATEMENT_DESTROY_REQUEST,
            Request::ConnectionFunc(_) => tags::CONNECTION_FUNC_REQUEST,
            Request::StatementFunc { .. } => tags::STATEMENT_FUNC_REQUEST,
            Request::GetGeneratedKeys(_) => tags::GET_GENERATED_KEYS_REQUEST,
        }
    }

    pub fn name(&self) -> &'static str {
        tags::request_name(self.tag())
    }

    /// Interpret a decoded value as a request
    ///
    /// # Error Handling
    /// Returns a protocol error if the identifier is not an APPLICATION
    /// identifier, names no known request, or the contents have the wrong
    /// shape.
    pub fn from_ber(object: &BerObject) -> ProxyResult<Self> {
        let identifier = object.identifier();
        if identifier.class() != TagClass::Application {
            return Err(ProxyError::Protocol(format!(
                "Unknown request received {}",
                identifier
            )));
        }
        let tag = identifier.number();
        let name = tags::request_name(tag);
        log::trace!("decoding {} request", name);
        let request = match tag {
            tags::DISCONNECT_REQUEST => Request::Disconnect,
            tags::COMMIT_REQUEST => Request::Commit,
            tags::ROLLBACK_REQUEST => Request::Rollback,
            tags::PING_REQUEST => Request::Ping,
            tags::FETCH_REQUEST => Request::Fetch {
                handle: handle_of(name, object)?,
            },
            tags::STATEMENT_FINISH_REQUEST => Request::StatementFinish {
                handle: handle_of(name, object)?,
            },
            tags::STATEMENT_DESTROY_REQUEST => Request::StatementDestroy {
                handle: handle_of(name, object)?,
            },
            tags::GET_CONNECTION_PROPERTY_REQUEST => Request::GetConnectionProperty {
                name: object
                    .as_octet_string()
                    .map(|s| s.text().to_string())
                    .ok_or_else(|| shape_error(name, "a property name"))?,
            },
            tags::CONNECT_REQUEST => {
                let mut fields = Fields::of(name, object)?;
                Request::Connect(ConnectRequest {
                    url: fields.octet_string("url")?.clone(),
                    user: fields.optional_octet_string("user")?.cloned(),
                    password: fields.optional_octet_string("password")?.cloned(),
                    encoding: fields.octet_string("character encoding")?.clone(),
                    properties: BerHash::from_ber(fields.next("properties")?)?,
                })
            }
            tags::PREPARE_REQUEST => {
                let mut fields = Fields::of(name, object)?;
                let sql = fields.text("statement")?;
                Request::Prepare(PrepareRequest {
                    sql,
                    keys: key_request(&mut fields)?,
                })
            }
            tags::EXECUTE_REQUEST => {
                let mut fields = Fields::of(name, object)?;
                let handle = fields.integer("statement handle")?;
                let count = fields.integer("parameter count")?;
                let count = usize::try_from(count)
                    .map_err(|_| shape_error(name, "a non-negative parameter count"))?;
                if fields.remaining() < count * 2 {
                    return Err(shape_error(name, "one value and type per parameter"));
                }
                let mut params = Vec::with_capacity(count);
                for _ in 0..count {
                    params.push(fields.parameter()?);
                }
                Request::Execute(ExecuteRequest { handle, params })
            }
            tags::GET_STATEMENT_PROPERTY_REQUEST => {
                let mut fields = Fields::of(name, object)?;
                Request::GetStatementProperty {
                    handle: fields.integer("statement handle")?,
                    name: fields.text("property name")?,
                }
            }
            tags::SET_CONNECTION_PROPERTY_REQUEST => {
                let mut fields = Fields::of(name, object)?;
                Request::SetConnectionProperty {
                    name: fields.text("property name")?,
                    value: fields.text("property value")?,
                }
            }
            tags::SET_STATEMENT_PROPERTY_REQUEST => {
                let mut fields = Fields::of(name, object)?;
                Request::SetStatementProperty {
                    handle: fields.integer("statement handle")?,
                    name: fields.text("property name")?,
                    value: fields.text("property value")?,
                }
            }
            tags::CONNECTION_FUNC_REQUEST => {
                let mut fields = Fields::of(name, object)?;
                Request::ConnectionFunc(fields.func()?)
            }
            tags::STATEMENT_FUNC_REQUEST => {
                let mut fields = Fields::of(name, object)?;
                let handle = fields.integer("statement handle")?;
                Request::StatementFunc {
                    handle,
                    func: fields.func()?,
                }
            }
            tags::GET_GENERATED_KEYS_REQUEST => {
                let mut fields = Fields::of(name, object)?;
                let mut part = |what| -> ProxyResult<Option<String>> {
                    if fields.remaining() == 0 {
                        return Ok(None);
                    }
                    fields.optional_text(what)
                };
                Request::GetGeneratedKeys(GeneratedKeysRequest {
                    catalog: part("catalog")?,
                    schema: part("schema")?,
                    table: part("table")?,
                    column: part("column")?,
                })
            }
            other => {
                return Err(ProxyError::Protocol(format!(
                    "Unknown request received {} (tag {})",
                    identifier, other
                )));
            }
        };
        Ok(request)
    }

    /// Encode this request with `charset` for its strings
    pub fn to_ber(&self, charset: Charset) -> BerObject {
        let text = |s: &str| BerObject::text(s, charset);
        let sequence = |tag: u32, children: Vec<BerObject>| {
            BerObject::Sequence(BerSequence::tagged(constructed(tag), children))
        };
        match self {
            Request::Disconnect | Request::Commit | Request::Rollback | Request::Ping => {
                BerObject::Null(BerNull::tagged(primitive(self.tag())))
            }
            Request::Fetch { handle }
            | Request::StatementFinish { handle }
            | Request::StatementDestroy { handle } => {
                BerObject::Integer(BerInteger::tagged(primitive(self.tag()), *handle))
            }
            Request::GetConnectionProperty { name } => BerObject::OctetString(
                BerOctetString::tagged_text(primitive(self.tag()), name, charset),
            ),
            Request::Connect(connect) => sequence(
                self.tag(),
                vec![
                    BerObject::OctetString(connect.url.clone()),
                    optional(connect.user.as_ref()),
                    optional(connect.password.as_ref()),
                    BerObject::OctetString(connect.encoding.clone()),
                    connect.properties.to_ber(),
                ],
            ),
            Request::Prepare(prepare) => {
                let mut children = vec![text(&prepare.sql)];
                match &prepare.keys {
                    KeyRequest::Off | KeyRequest::Auto => {}
                    KeyRequest::Columns(names) => {
                        children.push(text(KEY_TYPE_NAME));
                        children.extend(names.iter().map(|n| text(n)));
                    }
                    KeyRequest::Indexes(indexes) => {
                        children.push(text(KEY_TYPE_INDEX));
                        children.extend(indexes.iter().map(|i| BerObject::integer(*i)));
                    }
                }
                sequence(self.tag(), children)
            }
            Request::Execute(execute) => {
                let mut children = vec![
                    BerObject::integer(execute.handle),
                    BerObject::integer(execute.params.len() as i32),
                ];
                for param in &execute.params {
                    param.push_to(&mut children);
                }
                sequence(self.tag(), children)
            }
            Request::GetStatementProperty { handle, name } => {
                sequence(self.tag(), vec![BerObject::integer(*handle), text(name)])
            }
            Request::SetConnectionProperty { name, value } => {
                sequence(self.tag(), vec![text(name), text(value)])
            }
            Request::SetStatementProperty {
                handle,
                name,
                value,
            } => sequence(
                self.tag(),
                vec![BerObject::integer(*handle), text(name), text(value)],
            ),
            Request::ConnectionFunc(func) => {
                let mut children = vec![text(&func.method)];
                for param in &func.params {
                    param.push_to(&mut children);
                }
                sequence(self.tag(), children)
            }
            Request::StatementFunc { handle, func } => {
                let mut children = vec![BerObject::integer(*handle), text(&func.method)];
                for param in &func.params {
                    param.push_to(&mut children);
                }
                sequence(self.tag(), children)
            }
            Request::GetGeneratedKeys(keys) => sequence(
                self.tag(),
                [&keys.catalog, &keys.schema, &keys.table, &keys.column]
                    .into_iter()
                    .map(|part| BerObject::optional_text(part.as_deref(), charset))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Prepare(prepare) => write!(f, "Prepare: {}", prepare.sql),
            Request::Execute(execute) => write!(
                f,
                "Execute handle {} ({} parameters)",
                execute.handle,
                execute.params.len()
            ),
            Request::Fetch { handle } => write!(f, "Fetch handle {}", handle),
            Request::GetConnectionProperty { name } => {
                write!(f, "Get connection property: {}", name)
            }
            Request::GetStatementProperty { handle, name } => {
                write!(f, "Get statement property: {} (handle {})", name, handle)
            }
            Request::SetConnectionProperty { name, value } => {
                write!(f, "Set connection property: {}={}", name, value)
            }
            Request::SetStatementProperty {
                handle,
                name,
                value,
            } => write!(f, "Set statement property: {}={} (handle {})", name, value, handle),
            Request::StatementFinish { handle } => write!(f, "StatementFinish handle {}", handle),
            Request::StatementDestroy { handle } => write!(f, "StatementDestroy handle {}", handle),
            Request::ConnectionFunc(func) => write!(f, "ConnectionFunc {}", func.method),
            Request::StatementFunc { handle, func } => {
                write!(f, "StatementFunc {} (handle {})", func.method, handle)
            }
            Request::GetGeneratedKeys(keys) => {
                let parts: Vec<&str> = [&keys.catalog, &keys.schema, &keys.table, &keys.column]
                    .into_iter()
                    .filter_map(|p| p.as_deref())
                    .collect();
                write!(f, "GetGeneratedKeys {}", parts.join("."))
            }
            other => f.write_str(other.name()),
        }
    }
}

fn optional(value: Option<&BerOctetString>) -> BerObject {
    value.map_or(BerObject::NULL, |v| BerObject::OctetString(v.clone()))
}

fn handle_of(request: &str, object: &BerObject) -> ProxyResult<i32> {
    object
        .as_integer()
        .ok_or_else(|| shape_error(request, "a statement handle"))
}

fn shape_error(request: &str, what: &str) -> ProxyError {
    ProxyError::Protocol(format!("{} request: expected {}", request, what))
}

/// Key type and key columns following the SQL text of a Prepare request
///
/// Without at least one key column the request asks for whatever keys the
/// driver generates, even when a key type is present.
fn key_request(fields: &mut Fields<'_>) -> ProxyResult<KeyRequest> {
    if fields.remaining() < 2 {
        return Ok(KeyRequest::Auto);
    }
    let Some(key_type) = fields.optional_text("key type")? else {
        return Ok(KeyRequest::Auto);
    };
    let keys = match key_type.as_str() {
        KEY_TYPE_NAME => {
            let mut names = Vec::with_capacity(fields.remaining());
            while fields.remaining() > 0 {
                names.push(fields.text("key column name")?);
            }
            KeyRequest::Columns(names)
        }
        KEY_TYPE_INDEX => {
            let mut indexes = Vec::with_capacity(fields.remaining());
            while fields.remaining() > 0 {
                indexes.push(fields.integer("key column index")?);
            }
            KeyRequest::Indexes(indexes)
        }
        _ => KeyRequest::Auto,
    };
    Ok(keys)
}

/// Cursor over the children of a constructed request
struct Fields<'a> {
    request: &'static str,
    children: &'a [BerObject],
    position: usize,
}

impl<'a> Fields<'a> {
    fn of(request: &'static str, object: &'a BerObject) -> ProxyResult<Self> {
        let sequence = object
            .as_sequence()
            .ok_or_else(|| shape_error(request, "constructed contents"))?;
        Ok(Self {
            request,
            children: sequence.children(),
            position: 0,
        })
    }

    fn remaining(&self) -> usize {
        self.children.len() - self.position
    }

    fn error(&self, what: &str) -> ProxyError {
        ProxyError::Protocol(format!(
            "{} request: expected {} at element {}",
            self.request, what, self.position
        ))
    }

    fn next(&mut self, what: &str) -> ProxyResult<&'a BerObject> {
        let child = self.children.get(self.position).ok_or_else(|| self.error(what))?;
        self.position += 1;
        Ok(child)
    }

    fn integer(&mut self, what: &str) -> ProxyResult<i32> {
        let child = self.next(what)?;
        child.as_integer().ok_or_else(|| {
            self.position -= 1;
            self.error(what)
        })
    }

    fn octet_string(&mut self, what: &str) -> ProxyResult<&'a BerOctetString> {
        let child = self.next(what)?;
        child.as_octet_string().ok_or_else(|| {
            self.position -= 1;
            self.error(what)
        })
    }

    fn optional_octet_string(&mut self, what: &str) -> ProxyResult<Option<&'a BerOctetString>> {
        let child = self.next(what)?;
        if child.is_null() {
            return Ok(None);
        }
        child.as_octet_string().map(Some).ok_or_else(|| {
            self.position -= 1;
            self.error(what)
        })
    }

    fn text(&mut self, what: &str) -> ProxyResult<String> {
        Ok(self.octet_string(what)?.text().to_string())
    }

    fn optional_text(&mut self, what: &str) -> ProxyResult<Option<String>> {
        Ok(self.optional_octet_string(what)?.map(|s| s.text().to_string()))
    }

    fn parameter(&mut self) -> ProxyResult<Parameter> {
        let value = self.optional_octet_string("parameter value")?.cloned();
        let type_code = self.integer("parameter type")?;
        Ok(Parameter::new(value, type_code))
    }

    /// Method name followed by value/type pairs; a dangling value is ignored
    fn func(&mut self) -> ProxyResult<FuncRequest> {
        let method = self.text("method name")?;
        let mut params = Vec::with_capacity(self.remaining() / 2);
        while self.remaining() >= 2 {
            params.push(self.parameter()?);
        }
        Ok(FuncRequest { method, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::request_module;
    use dbdproxy_core::sql_type;

    fn round_trip(request: &Request) -> Request {
        let module = request_module(Charset::Ascii).unwrap();
        let decoded = module.decode(&request.to_ber(Charset::Ascii).encode()).unwrap();
        Request::from_ber(&decoded).unwrap()
    }

    #[test]
    fn test_simple_requests() {
        for request in [
            Request::Disconnect,
            Request::Commit,
            Request::Rollback,
            Request::Ping,
            Request::Fetch { handle: 3 },
            Request::StatementFinish { handle: 999 },
            Request::StatementDestroy { handle: 1 },
            Request::GetConnectionProperty {
                name: "AutoCommit".to_string(),
            },
        ] {
            assert_eq!(round_trip(&request), request);
        }
    }

    #[test]
    fn test_prepare_key_requests() {
        let plain = Request::Prepare(PrepareRequest::new("SELECT 1"));
        assert_eq!(round_trip(&plain), plain);

        let by_name = Request::Prepare(
            PrepareRequest::new("INSERT INTO t VALUES (?)")
                .with_keys(KeyRequest::Columns(vec!["ID".to_string()])),
        );
        assert_eq!(round_trip(&by_name), by_name);

        let by_index = Request::Prepare(
            PrepareRequest::new("INSERT INTO t VALUES (?)").with_keys(KeyRequest::Indexes(vec![1, 2])),
        );
        assert_eq!(round_trip(&by_index), by_index);
    }

    #[test]
    fn test_prepare_key_type_without_columns_is_auto() {
        let object = BerObject::Sequence(BerSequence::tagged(
            constructed(tags::PREPARE_REQUEST),
            vec![
                BerObject::text("INSERT INTO t VALUES (1)", Charset::Ascii),
                BerObject::text("name", Charset::Ascii),
            ],
        ));
        match Request::from_ber(&object).unwrap() {
            Request::Prepare(prepare) => assert_eq!(prepare.keys, KeyRequest::Auto),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_execute_parameters() {
        let request = Request::Execute(ExecuteRequest {
            handle: 1,
            params: vec![
                Parameter::text("42", sql_type::INTEGER, Charset::Ascii),
                Parameter::null(sql_type::VARCHAR),
                Parameter::bytes(vec![0u8, 1, 2], sql_type::VARBINARY),
            ],
        });
        match round_trip(&request) {
            Request::Execute(execute) => {
                assert_eq!(execute.handle, 1);
                assert_eq!(execute.params.len(), 3);
                assert_eq!(execute.params[0].value().unwrap().text(), "42");
                assert!(execute.params[1].is_null());
                assert_eq!(execute.params[1].type_code(), sql_type::VARCHAR);
                assert_eq!(execute.params[2].value().unwrap().bytes().as_ref(), &[0u8, 1, 2]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_execute_count_exceeds_values() {
        let object = BerObject::Sequence(BerSequence::tagged(
            constructed(tags::EXECUTE_REQUEST),
            vec![BerObject::integer(1), BerObject::integer(2), BerObject::NULL, BerObject::integer(4)],
        ));
        assert!(matches!(Request::from_ber(&object), Err(ProxyError::Protocol(_))));
    }

    #[test]
    fn test_connect_strings_decoded_late() {
        let connect = ConnectRequest::new(
            "jdbc:sqlite::memory:",
            None,
            Some("caf\u{e9}"),
            "ISO8859_1",
            BerHash::from_pairs([("k", "v")], Charset::Latin1),
            Charset::Latin1,
        );
        match round_trip(&Request::Connect(connect)) {
            Request::Connect(decoded) => {
                assert_eq!(decoded.encoding(), "ISO8859_1");
                assert_eq!(decoded.url(Charset::Latin1), "jdbc:sqlite::memory:");
                assert_eq!(decoded.user(Charset::Latin1), None);
                assert_eq!(decoded.password(Charset::Latin1).as_deref(), Some("caf\u{e9}"));
                assert_eq!(
                    decoded.properties(Charset::Latin1),
                    vec![("k".to_string(), "v".to_string())]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_func_requests() {
        let func = FuncRequest {
            method: "ResultSetMetaData.getColumnName".to_string(),
            params: vec![Parameter::text("1", sql_type::INTEGER, Charset::Ascii)],
        };
        let request = Request::StatementFunc { handle: 2, func };
        assert_eq!(round_trip(&request), request);

        let request = Request::ConnectionFunc(FuncRequest {
            method: "getAutoCommit".to_string(),
            params: Vec::new(),
        });
        assert_eq!(round_trip(&request), request);
    }

    #[test]
    fn test_generated_keys_short_sequence() {
        let object = BerObject::Sequence(BerSequence::tagged(
            constructed(tags::GET_GENERATED_KEYS_REQUEST),
            vec![BerObject::NULL, BerObject::NULL, BerObject::text("orders", Charset::Ascii)],
        ));
        match Request::from_ber(&object).unwrap() {
            Request::GetGeneratedKeys(keys) => {
                assert_eq!(keys.table.as_deref(), Some("orders"));
                assert_eq!(keys.column, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_application_request_rejected() {
        let err = Request::from_ber(&BerObject::integer(1)).unwrap_err();
        assert!(err.to_string().contains("Unknown request received"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_container_tag_is_not_a_request() {
        let hash = BerHash::new().to_ber();
        assert!(matches!(Request::from_ber(&hash), Err(ProxyError::Protocol(_))));
    }

    #[test]
    fn test_display() {
        let request = Request::Prepare(PrepareRequest::new("SELECT 1"));
        assert_eq!(request.to_string(), "Prepare: SELECT 1");
        assert_eq!(Request::Ping.to_string(), "Ping");
    }
}
