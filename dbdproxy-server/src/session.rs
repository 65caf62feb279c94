//! One client session
//!
//! A [`Session`] reads requests from a byte stream, runs them against its
//! database connection and writes one response per request. It handles a
//! single client and runs on a thread of its own; nothing in it is shared
//! with other sessions except the decoding registry, which is cloned.
//!
//! # Session Lifecycle
//! 1. **Connecting**: only Connect and Disconnect are accepted
//! 2. **Connected**: after a successful Connect
//! 3. **Disconnected**: after Disconnect, end of stream or a fatal error
//!
//! # Error Handling
//! Database and proxy errors are reported to the client as an error
//! response and the session continues. Any other error means the stream
//! can no longer be trusted: the session rolls back, sends one generic
//! error response if it still can, releases everything and ends.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufReader, Read, Write};

use dbdproxy_ber::{BerContents, BerModule};
use dbdproxy_core::{Charset, DbdError, DbdErrorKind, KeyRequest, ProxyError, ProxyResult, sql_type};
use dbdproxy_driver::{Credentials, DbConnection, DbResultSet, DriverManager, ExecuteOutcome};
use dbdproxy_protocol::{
    ColumnData, ConnectRequest, ErrorResponse, ExecuteRequest, FuncRequest, GeneratedKeysRequest,
    PrepareRequest, PropertyValue, Request, Response, request_module,
};

use crate::coerce;
use crate::config::{ServerConfig, StatementDefaults};
use crate::func::{self, FuncTarget};
use crate::holder::{StatementHolder, StatementProperties};
use crate::keys::KeyCache;
use crate::lob;

const AUTO_COMMIT: &str = "AutoCommit";
const CURSOR_NAME: &str = "CursorName";
const LONG_READ_LEN: &str = "LongReadLen";
const LONG_TRUNC_OK: &str = "LongTruncOk";
const CHOP_BLANKS: &str = "ChopBlanks";
const LONG_READ_ALL: &str = "jdbc_longreadall";

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Connected,
    Disconnected,
}

/// What every session of a server starts from
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Request registry; each session works on its own clone
    pub module: BerModule,
    pub drivers: DriverManager,
    pub defaults: StatementDefaults,
}

impl SessionContext {
    pub fn new(module: BerModule, drivers: DriverManager, defaults: StatementDefaults) -> Self {
        Self {
            module,
            drivers,
            defaults,
        }
    }

    /// Context for `config`, with the given drivers
    pub fn from_config(config: &ServerConfig, drivers: DriverManager) -> ProxyResult<Self> {
        let module = request_module(config.bootstrap_charset()?)?;
        Ok(Self::new(module, drivers, config.statement))
    }
}

#[derive(Debug, Clone)]
struct Login {
    url: String,
    credentials: Credentials,
}

fn lookup(
    statements: &mut BTreeMap<i32, StatementHolder>,
    handle: i32,
) -> Result<&mut StatementHolder, DbdError> {
    statements.get_mut(&handle).ok_or_else(|| {
        DbdError::with_args(DbdErrorKind::InvalidStatementHandle, [handle.to_string()])
    })
}

fn flag(value: bool) -> PropertyValue {
    PropertyValue::Integer(i32::from(value))
}

/// Value of one column of the current row
fn fetch_column(
    rs: &mut dyn DbResultSet,
    index: i32,
    type_code: i32,
    properties: &StatementProperties,
) -> ProxyResult<ColumnData> {
    if sql_type::is_long(type_code) {
        if properties.long_read_len == 0 {
            return Ok(ColumnData::Null);
        }
        let stream = rs.get_long(index)?;
        return lob::read_long(stream, properties, index);
    }
    if sql_type::is_binary(type_code) {
        return Ok(rs.get_bytes(index)?.map_or(ColumnData::Null, |b| ColumnData::Bytes(b.into())));
    }
    let text = rs.get_string(index)?;
    let text = match text {
        Some(s) if type_code == sql_type::CHAR && properties.chop_blanks => {
            Some(s.trim_end_matches(' ').to_string())
        }
        other => other,
    };
    Ok(text.map_or(ColumnData::Null, ColumnData::Text))
}

/// A client session over a pair of byte streams
pub struct Session<R: Read, W: Write> {
    reader: BufReader<R>,
    writer: W,
    module: BerModule,
    drivers: DriverManager,
    defaults: StatementDefaults,
    state: SessionState,
    connection: Option<Box<dyn DbConnection>>,
    /// The connection was handed to the session and is not closed by it
    embedded: bool,
    supports_keys: bool,
    statements: BTreeMap<i32, StatementHolder>,
    /// Handles closed by a reconnect or disconnect and not yet destroyed
    released: BTreeSet<i32>,
    next_handle: i32,
    keys: KeyCache,
    login: Option<Login>,
    peer: String,
}

impl<R: Read, W: Write> Session<R, W> {
    /// A session that connects with the client's Connect request
    pub fn new(reader: R, writer: W, context: &SessionContext) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            module: context.module.clone(),
            drivers: context.drivers.clone(),
            defaults: context.defaults,
            state: SessionState::Connecting,
            connection: None,
            embedded: false,
            supports_keys: false,
            statements: BTreeMap::new(),
            released: BTreeSet::new(),
            next_handle: 1,
            keys: KeyCache::new(),
            login: None,
            peer: "client".to_string(),
        }
    }

    /// A session around an already open connection
    ///
    /// Connect then only negotiates the encoding, and neither Disconnect
    /// nor the end of the session closes the connection. Use
    /// [`Session::into_connection`] to get it back.
    pub fn embedded(reader: R, writer: W, context: &SessionContext, connection: Box<dyn DbConnection>) -> Self {
        let mut session = Self::new(reader, writer, context);
        session.connection = Some(connection);
        session.embedded = true;
        session
    }

    /// Name used for this session in logs
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = peer.into();
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Encoding currently applied to strings
    pub fn charset(&self) -> Charset {
        self.module.charset()
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_connection(mut self) -> Option<Box<dyn DbConnection>> {
        self.connection.take()
    }

    /// Serve requests until the client disconnects or a fatal error occurs
    ///
    /// Statements and, unless embedded, the connection are released on
    /// every exit path.
    ///
    /// # Errors
    /// Returns the fatal error that ended the session
    pub fn run(&mut self) -> ProxyResult<()> {
        log::info!("session for {} started", self.peer);
        let result = self.serve();
        self.release();
        self.state = SessionState::Disconnected;
        match &result {
            Ok(()) => log::info!("session for {} ended", self.peer),
            Err(e) => log::info!("session for {} ended: {}", self.peer, e),
        }
        result
    }

    fn serve(&mut self) -> ProxyResult<()> {
        loop {
            let request = match self.next_request() {
                Ok(Some(request)) => request,
                Ok(None) => {
                    log::info!("{} closed the connection without disconnecting", self.peer);
                    return Ok(());
                }
                Err(e) => return self.abort(e),
            };
            log::debug!("request: {}", request);

            let is_connect = matches!(request, Request::Connect(_));
            let is_disconnect = matches!(request, Request::Disconnect);
            match self.handle(request) {
                Ok(response) => {
                    self.send(&response)?;
                    if is_disconnect {
                        return Ok(());
                    }
                }
                Err(e) if e.is_recoverable() => {
                    log::debug!("request failed: {}", e);
                    self.send(&Response::Error(ErrorResponse::from_error(&e)))?;
                    if is_connect {
                        log::warn!("connect for {} failed: {}", self.peer, e);
                        return Ok(());
                    }
                }
                Err(e) => return self.abort(e),
            }
        }
    }

    fn next_request(&mut self) -> ProxyResult<Option<Request>> {
        self.module
            .read_from(&mut self.reader)?
            .map(|object| Request::from_ber(&object))
            .transpose()
    }

    fn send(&mut self, response: &Response) -> ProxyResult<()> {
        log::debug!("response: {}", response);
        response.to_ber(self.module.charset()).write_to(&mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Report a fatal error and give up on the session
    fn abort(&mut self, error: ProxyError) -> ProxyResult<()> {
        log::error!("session for {} failed: {}", self.peer, error);
        if let Some(conn) = self.connection.as_mut() {
            if !conn.is_closed() {
                if let Err(e) = conn.rollback() {
                    log::warn!("rollback after failure: {}", e);
                }
            }
        }
        if let Err(e) = self.send(&Response::Error(ErrorResponse::from_error(&error))) {
            log::debug!("could not report failure to {}: {}", self.peer, e);
        }
        Err(error)
    }

    fn close_statements(&mut self) {
        for (handle, mut holder) in std::mem::take(&mut self.statements) {
            log::trace!("closing statement {}", handle);
            holder.close();
            self.released.insert(handle);
        }
    }

    fn release(&mut self) {
        self.close_statements();
        if self.embedded {
            return;
        }
        if let Some(mut conn) = self.connection.take() {
            if let Err(e) = conn.close() {
                log::warn!("closing connection failed: {}", e);
            }
        }
    }

    /// Close all statements and the connection, then connect again with
    /// the URL and credentials of the last Connect
    ///
    /// An embedded session only closes its statements.
    pub fn reconnect(&mut self) -> ProxyResult<()> {
        let login = self
            .login
            .clone()
            .ok_or_else(|| DbdError::new(DbdErrorKind::NotConnected))?;
        self.release();
        if !self.embedded {
            self.connection = Some(self.drivers.connect(&login.url, &login.credentials)?);
        }
        self.keys = KeyCache::new();
        self.state = SessionState::Connected;
        log::info!("{} reconnected to {}", self.peer, login.url);
        Ok(())
    }

    fn connection_mut(&mut self) -> ProxyResult<&mut (dyn DbConnection + 'static)> {
        self.connection
            .as_deref_mut()
            .ok_or_else(|| DbdError::new(DbdErrorKind::NotConnected).into())
    }

    fn handle(&mut self, request: Request) -> ProxyResult<Response> {
        if self.state != SessionState::Connected
            && !matches!(request, Request::Connect(_) | Request::Disconnect)
        {
            return Err(DbdError::new(DbdErrorKind::NotConnected).into());
        }
        match request {
            Request::Connect(connect) => self.connect(connect),
            Request::Disconnect => {
                self.release();
                self.state = SessionState::Disconnected;
                Ok(Response::Disconnect)
            }
            Request::Commit => {
                self.connection_mut()?.commit()?;
                Ok(Response::Commit)
            }
            Request::Rollback => {
                self.connection_mut()?.rollback()?;
                Ok(Response::Rollback)
            }
            Request::Ping => {
                let alive = !self.connection_mut()?.is_closed();
                Ok(Response::Ping { alive })
            }
            Request::Prepare(prepare) => self.prepare(prepare),
            Request::Execute(execute) => self.execute(execute),
            Request::Fetch { handle } => self.fetch(handle),
            Request::GetConnectionProperty { name } => self.connection_property(&name),
            Request::SetConnectionProperty { name, value } => {
                match name.as_str() {
                    AUTO_COMMIT => self.connection_mut()?.set_auto_commit(value == "1")?,
                    _ => {
                        return Err(
                            DbdError::with_args(DbdErrorKind::UnknownProperty, [name.as_str()]).into(),
                        );
                    }
                }
                Ok(Response::SetConnectionProperty)
            }
            Request::GetStatementProperty { handle, name } => self.statement_property(handle, &name),
            Request::SetStatementProperty {
                handle,
                name,
                value,
            } => self.set_statement_property(handle, &name, &value),
            Request::StatementFinish { handle } => {
                lookup(&mut self.statements, handle)?;
                Ok(Response::StatementFinish)
            }
            Request::StatementDestroy { handle } => {
                if self.released.remove(&handle) {
                    log::trace!("statement {} was already closed", handle);
                    return Ok(Response::StatementDestroy);
                }
                let mut holder = self.statements.remove(&handle).ok_or_else(|| {
                    DbdError::with_args(DbdErrorKind::InvalidStatementHandle, [handle.to_string()])
                })?;
                holder.close();
                Ok(Response::StatementDestroy)
            }
            Request::ConnectionFunc(func) => self.connection_func(func),
            Request::StatementFunc { handle, func } => self.statement_func(handle, func),
            Request::GetGeneratedKeys(request) => Ok(self.generated_key(&request)),
        }
    }

    fn connect(&mut self, request: ConnectRequest) -> ProxyResult<Response> {
        let charset = Charset::for_name(&request.encoding())?;
        self.module.set_charset(charset);
        log::debug!("{} uses encoding {}", self.peer, charset.name());

        let url = request.url(charset);
        let credentials = Credentials::new(request.user(charset), request.password(charset))
            .with_properties(request.properties(charset));
        if self.embedded {
            self.close_statements();
            log::info!("{} connected to the embedded connection", self.peer);
        } else {
            self.release();
            self.connection = Some(self.drivers.connect(&url, &credentials)?);
            log::info!("{} connected to {}", self.peer, url);
        }
        self.supports_keys = self
            .connection
            .as_ref()
            .is_some_and(|conn| conn.supports_generated_keys());
        self.login = Some(Login { url, credentials });
        self.state = SessionState::Connected;
        Ok(Response::Connect)
    }

    fn prepare(&mut self, request: PrepareRequest) -> ProxyResult<Response> {
        let keys = if self.supports_keys {
            request.keys
        } else {
            KeyRequest::Off
        };
        let statement = self.connection_mut()?.prepare(&request.sql, keys)?;
        let handle = self.next_handle;
        self.next_handle += 1;
        self.statements
            .insert(handle, StatementHolder::new(statement, (&self.defaults).into()));
        Ok(Response::Prepare { handle })
    }

    fn execute(&mut self, request: ExecuteRequest) -> ProxyResult<Response> {
        let holder = lookup(&mut self.statements, request.handle)?;
        holder.set_result_set(None);
        let values = coerce::bind_values(&request.params)?;
        let statement = holder.statement_mut();
        for (index, value) in (1..).zip(values) {
            log::trace!("parameter {}: {}", index, value);
            statement.set_param(index, value).map_err(|e| {
                DbdError::with_args(
                    DbdErrorKind::SetParameter,
                    [index.to_string(), e.message().to_string()],
                )
                .caused_by(e)
            })?;
        }

        match statement.execute()? {
            ExecuteOutcome::ResultSet(rs) => {
                let columns = i32::try_from(rs.metadata().column_count()).unwrap_or(i32::MAX);
                holder.set_result_set(Some(rs));
                Ok(Response::ExecuteResultSet(columns))
            }
            ExecuteOutcome::UpdateCount(count) => {
                if self.supports_keys {
                    let mut keys = holder.statement_mut().generated_keys()?;
                    let loaded = self.keys.load(keys.as_mut());
                    if let Err(e) = keys.close() {
                        log::warn!("closing generated keys failed: {}", e);
                    }
                    loaded?;
                }
                Ok(Response::ExecuteRows(count))
            }
        }
    }

    fn fetch(&mut self, handle: i32) -> ProxyResult<Response> {
        let holder = lookup(&mut self.statements, handle)?;
        let properties = holder.properties;
        let rs = holder
            .result_set_mut()
            .ok_or_else(|| DbdError::new(DbdErrorKind::NoResultSet))?;
        if !rs.next()? {
            return Ok(Response::Fetch(None));
        }
        let types: Vec<i32> = rs.metadata().columns().iter().map(|c| c.type_code).collect();
        let mut row = Vec::with_capacity(types.len());
        for (index, type_code) in (1..).zip(types) {
            row.push(fetch_column(rs, index, type_code, &properties)?);
        }
        Ok(Response::Fetch(Some(row)))
    }

    fn connection_property(&mut self, name: &str) -> ProxyResult<Response> {
        match name {
            AUTO_COMMIT => {
                let on = self.connection_mut()?.auto_commit()?;
                Ok(Response::GetConnectionProperty(vec![flag(on)]))
            }
            _ => Err(DbdError::with_args(DbdErrorKind::UnknownProperty, [name]).into()),
        }
    }

    fn statement_property(&mut self, handle: i32, name: &str) -> ProxyResult<Response> {
        let holder = lookup(&mut self.statements, handle)?;
        let properties = holder.properties;
        let values = match name {
            CURSOR_NAME => {
                let rs = holder
                    .result_set_mut()
                    .ok_or_else(|| DbdError::new(DbdErrorKind::NoCursor))?;
                match rs.cursor_name() {
                    Ok(cursor) => vec![PropertyValue::from(cursor)],
                    Err(e) => {
                        log::warn!("cursor name unavailable: {}", e);
                        vec![PropertyValue::Null]
                    }
                }
            }
            "NAME" | "TYPE" | "PRECISION" | "SCALE" | "NULLABLE" => {
                let meta = holder
                    .metadata()
                    .ok_or_else(|| DbdError::new(DbdErrorKind::NoMetadata))?;
                meta.columns()
                    .iter()
                    .map(|column| match name {
                        "NAME" => PropertyValue::Text(column.name.clone()),
                        "TYPE" => PropertyValue::Integer(column.type_code),
                        "PRECISION" => PropertyValue::Integer(column.precision),
                        "SCALE" => PropertyValue::from(column.scale),
                        _ => PropertyValue::Integer(column.nullable.code()),
                    })
                    .collect()
            }
            LONG_READ_LEN => vec![PropertyValue::Integer(properties.long_read_len)],
            LONG_TRUNC_OK => vec![flag(properties.long_trunc_ok)],
            CHOP_BLANKS => vec![flag(properties.chop_blanks)],
            LONG_READ_ALL => vec![flag(properties.long_read_all)],
            _ => return Err(DbdError::with_args(DbdErrorKind::UnknownProperty, [name]).into()),
        };
        Ok(Response::GetStatementProperty(values))
    }

    fn set_statement_property(&mut self, handle: i32, name: &str, value: &str) -> ProxyResult<Response> {
        let holder = lookup(&mut self.statements, handle)?;
        let properties = &mut holder.properties;
        match name {
            LONG_READ_LEN => {
                properties.long_read_len = value
                    .trim()
                    .parse()
                    .ok()
                    .filter(|len: &i32| *len >= 0)
                    .ok_or_else(|| {
                        DbdError::with_args(DbdErrorKind::InvalidPropertyValue, [name, value])
                    })?;
            }
            LONG_TRUNC_OK => properties.long_trunc_ok = value == "1",
            CHOP_BLANKS => properties.chop_blanks = value == "1",
            LONG_READ_ALL => properties.long_read_all = value == "1",
            _ => return Err(DbdError::with_args(DbdErrorKind::UnknownProperty, [name]).into()),
        }
        Ok(Response::SetStatementProperty)
    }

    fn connection_func(&mut self, request: FuncRequest) -> ProxyResult<Response> {
        let args = coerce::func_values(&request.params)?;
        let result = func::call_connection(self.connection_mut()?, &request.method, &args)?;
        Ok(Response::ConnectionFunc(result))
    }

    fn statement_func(&mut self, handle: i32, request: FuncRequest) -> ProxyResult<Response> {
        let holder = lookup(&mut self.statements, handle)?;
        let (target, method) = func::parse_method(&request.method)?;
        let args = coerce::func_values(&request.params)?;
        let result = match target {
            FuncTarget::Statement => func::call_statement(holder.statement_mut(), method, &args)?,
            FuncTarget::ResultSet => {
                let rs = holder
                    .result_set_mut()
                    .ok_or_else(|| DbdError::new(DbdErrorKind::NoResultSet))?;
                func::call_result_set(rs, method, &args)?
            }
            FuncTarget::MetaData => {
                let meta = holder
                    .metadata()
                    .ok_or_else(|| DbdError::new(DbdErrorKind::NoMetadata))?;
                func::call_metadata(meta, method, &args)?
            }
        };
        Ok(Response::StatementFunc(result))
    }

    fn generated_key(&self, request: &GeneratedKeysRequest) -> Response {
        Response::GetGeneratedKeys(
            self.keys
                .lookup(request.table.as_deref(), request.column.as_deref()),
        )
    }
}
