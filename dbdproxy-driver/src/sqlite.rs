//! SQLite driver on top of `rusqlite`
//!
//! Accepts `jdbc:sqlite:<path>` and `sqlite:<path>` URLs. An empty path or
//! `:memory:` opens a private in-memory database.
//!
//! SQLite has no session-level auto-commit switch, so it is emulated: with
//! auto-commit off, the first statement after a commit or rollback opens an
//! explicit transaction.
//!
//! Statements keep their SQL and bound values and are re-prepared on every
//! execution. Query results are read completely into memory when the
//! statement executes.

use std::io::Cursor;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use std::time::Duration;

use dbdproxy_core::{DbError, DbResult, KeyRequest, sql_type};
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, InterruptHandle};

use crate::metadata::{ColumnMeta, Nullability, ResultSetMetaData};
use crate::traits::{
    Credentials, DbConnection, DbResultSet, DbStatement, Driver, ExecuteOutcome, LongStream,
};
use crate::value::SqlValue;

const URL_PREFIXES: [&str; 2] = ["jdbc:sqlite:", "sqlite:"];
const MEMORY_PATH: &str = ":memory:";

/// JDBC isolation levels SQLite can honour
const READ_UNCOMMITTED: i32 = 1;
const SERIALIZABLE: i32 = 8;

fn sql_error(err: rusqlite::Error) -> DbError {
    match &err {
        rusqlite::Error::SqliteFailure(ffi, message) => {
            let text = message.clone().unwrap_or_else(|| ffi.to_string());
            let db = DbError::new(text).with_code(ffi.extended_code);
            match ffi.code {
                ErrorCode::ConstraintViolation => db.with_sql_state("23000"),
                ErrorCode::OperationInterrupted => db.with_sql_state("HY008"),
                _ => db,
            }
        }
        _ => DbError::new(err.to_string()),
    }
}

fn closed_error(what: &str) -> DbError {
    DbError::new(format!("{} is closed", what)).with_sql_state("08003")
}

struct Shared {
    conn: Option<Connection>,
    auto_commit: bool,
    isolation: i32,
}

impl Shared {
    fn connection(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or_else(|| closed_error("Connection"))
    }

    /// Open a transaction if auto-commit is off and none is running
    fn begin_if_needed(&self) -> DbResult<()> {
        let conn = self.connection()?;
        if !self.auto_commit && conn.is_autocommit() {
            conn.execute_batch("BEGIN").map_err(sql_error)?;
        }
        Ok(())
    }

    fn end_transaction(&self, sql: &str) -> DbResult<()> {
        let conn = self.connection()?;
        if !conn.is_autocommit() {
            conn.execute_batch(sql).map_err(sql_error)?;
        }
        Ok(())
    }
}

type SharedState = Arc<Mutex<Shared>>;

fn lock(state: &SharedState) -> DbResult<MutexGuard<'_, Shared>> {
    state
        .lock()
        .map_err(|_| DbError::new("SQLite connection mutex poisoned"))
}

/// Driver for SQLite database files
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        Self
    }

    fn path_of(url: &str) -> Option<&str> {
        URL_PREFIXES.iter().find_map(|prefix| url.strip_prefix(prefix))
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> String {
        "sqlite".to_string()
    }

    fn accepts_url(&self, url: &str) -> bool {
        Self::path_of(url).is_some()
    }

    fn connect(&self, url: &str, credentials: &Credentials) -> DbResult<Box<dyn DbConnection>> {
        let path = Self::path_of(url)
            .ok_or_else(|| DbError::new(format!("Not a SQLite URL: {}", url)))?;
        let conn = if path.is_empty() || path == MEMORY_PATH {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(sql_error)?;
        log::debug!("opened SQLite database {:?}", if path.is_empty() { MEMORY_PATH } else { path });

        if let Some(ms) = credentials.property("busy_timeout") {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|_| DbError::new(format!("Invalid busy_timeout: {}", ms)))?;
            conn.busy_timeout(Duration::from_millis(ms)).map_err(sql_error)?;
        }

        let connection = SqliteConnection::new(conn);
        if matches!(credentials.property("read_only"), Some("1") | Some("true")) {
            let guard = lock(&connection.state)?;
            guard
                .connection()?
                .pragma_update(None, "query_only", true)
                .map_err(sql_error)?;
        }
        Ok(Box::new(connection))
    }
}

/// An open SQLite database
pub struct SqliteConnection {
    state: SharedState,
    interrupt: Arc<InterruptHandle>,
}

impl SqliteConnection {
    pub fn new(conn: Connection) -> Self {
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Self {
            state: Arc::new(Mutex::new(Shared {
                conn: Some(conn),
                auto_commit: true,
                isolation: SERIALIZABLE,
            })),
            interrupt,
        }
    }
}

impl DbConnection for SqliteConnection {
    fn prepare(&mut self, sql: &str, keys: KeyRequest) -> DbResult<Box<dyn DbStatement>> {
        let param_count = {
            let shared = lock(&self.state)?;
            let stmt = shared.connection()?.prepare(sql).map_err(sql_error)?;
            stmt.parameter_count()
        };
        log::trace!("prepared {:?} with {} parameters", sql, param_count);
        Ok(Box::new(SqliteStatement {
            state: Arc::clone(&self.state),
            interrupt: Arc::clone(&self.interrupt),
            sql: sql.to_string(),
            params: vec![Value::Null; param_count],
            keys,
            max_rows: 0,
            query_timeout: 0,
            fetch_size: 0,
            update_count: -1,
            last_keys: None,
            closed: false,
        }))
    }

    fn commit(&mut self) -> DbResult<()> {
        lock(&self.state)?.end_transaction("COMMIT")
    }

    fn rollback(&mut self) -> DbResult<()> {
        lock(&self.state)?.end_transaction("ROLLBACK")
    }

    fn close(&mut self) -> DbResult<()> {
        let mut shared = lock(&self.state)?;
        match shared.conn.take() {
            Some(conn) => conn.close().map_err(|(_, err)| sql_error(err)),
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        lock(&self.state).map(|shared| shared.conn.is_none()).unwrap_or(true)
    }

    fn auto_commit(&self) -> DbResult<bool> {
        let shared = lock(&self.state)?;
        shared.connection()?;
        Ok(shared.auto_commit)
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> DbResult<()> {
        let mut shared = lock(&self.state)?;
        if auto_commit && !shared.auto_commit {
            shared.end_transaction("COMMIT")?;
        }
        shared.connection()?;
        shared.auto_commit = auto_commit;
        Ok(())
    }

    fn supports_generated_keys(&self) -> bool {
        true
    }

    fn product_name(&self) -> String {
        "SQLite".to_string()
    }

    fn product_version(&self) -> String {
        rusqlite::version().to_string()
    }

    fn is_read_only(&self) -> DbResult<bool> {
        let shared = lock(&self.state)?;
        shared
            .connection()?
            .pragma_query_value(None, "query_only", |row| row.get::<_, bool>(0))
            .map_err(sql_error)
    }

    fn set_read_only(&mut self, read_only: bool) -> DbResult<()> {
        let shared = lock(&self.state)?;
        shared
            .connection()?
            .pragma_update(None, "query_only", read_only)
            .map_err(sql_error)
    }

    fn catalog(&self) -> DbResult<Option<String>> {
        lock(&self.state)?.connection()?;
        Ok(Some("main".to_string()))
    }

    fn set_catalog(&mut self, catalog: &str) -> DbResult<()> {
        lock(&self.state)?.connection()?;
        log::debug!("ignoring catalog change to {:?}", catalog);
        Ok(())
    }

    fn transaction_isolation(&self) -> DbResult<i32> {
        let shared = lock(&self.state)?;
        shared.connection()?;
        Ok(shared.isolation)
    }

    fn set_transaction_isolation(&mut self, level: i32) -> DbResult<()> {
        let mut shared = lock(&self.state)?;
        let uncommitted = match level {
            READ_UNCOMMITTED => true,
            SERIALIZABLE => false,
            _ => {
                return Err(DbError::new(format!(
                    "Unsupported transaction isolation level {}",
                    level
                )));
            }
        };
        shared
            .connection()?
            .pragma_update(None, "read_uncommitted", uncommitted)
            .map_err(sql_error)?;
        shared.isolation = level;
        Ok(())
    }

    fn native_sql(&self, sql: &str) -> DbResult<String> {
        Ok(sql.to_string())
    }

    fn clear_warnings(&mut self) -> DbResult<()> {
        Ok(())
    }
}

fn bind_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Null(_) => Value::Null,
        SqlValue::Boolean(b) => Value::Integer(i64::from(b)),
        SqlValue::SmallInt(v) => Value::Integer(i64::from(v)),
        SqlValue::Integer(v) => Value::Integer(i64::from(v)),
        SqlValue::BigInt(v) => Value::Integer(v),
        SqlValue::Real(v) => Value::Real(f64::from(v)),
        SqlValue::Double(v) => Value::Real(v),
        SqlValue::Decimal(v) | SqlValue::Text(v) => Value::Text(v),
        SqlValue::Bytes(v) => Value::Blob(v),
    }
}

/// A statement against a [`SqliteConnection`]
pub struct SqliteStatement {
    state: SharedState,
    interrupt: Arc<InterruptHandle>,
    sql: String,
    params: Vec<Value>,
    keys: KeyRequest,
    max_rows: i32,
    query_timeout: i32,
    fetch_size: i32,
    update_count: i32,
    last_keys: Option<SqliteResultSet>,
    closed: bool,
}

impl SqliteStatement {
    fn check_open(&self) -> DbResult<()> {
        if self.closed {
            return Err(closed_error("Statement"));
        }
        Ok(())
    }

    fn row_limit(&self) -> Option<usize> {
        usize::try_from(self.max_rows).ok().filter(|max| *max > 0)
    }
}

impl DbStatement for SqliteStatement {
    fn set_param(&mut self, index: usize, value: SqlValue) -> DbResult<()> {
        self.check_open()?;
        let count = self.params.len();
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.params.get_mut(i))
            .ok_or_else(|| {
                DbError::new(format!(
                    "Parameter index {} out of range (1..{})",
                    index, count
                ))
            })?;
        *slot = bind_value(value);
        Ok(())
    }

    fn execute(&mut self) -> DbResult<ExecuteOutcome> {
        self.check_open()?;
        let limit = self.row_limit();
        let shared = lock(&self.state)?;
        shared.begin_if_needed()?;
        let conn = shared.connection()?;
        if self.query_timeout > 0 {
            conn.busy_timeout(Duration::from_secs(self.query_timeout.unsigned_abs().into()))
                .map_err(sql_error)?;
        }

        let mut stmt = conn.prepare(&self.sql).map_err(sql_error)?;
        for (i, value) in self.params.iter().enumerate() {
            stmt.raw_bind_parameter(i + 1, value).map_err(sql_error)?;
        }

        if stmt.column_count() > 0 {
            let rs = SqliteResultSet::read(&mut stmt, limit)?;
            self.update_count = -1;
            self.last_keys = None;
            return Ok(ExecuteOutcome::ResultSet(Box::new(rs)));
        }

        let changed = stmt.raw_execute().map_err(sql_error)?;
        drop(stmt);
        self.update_count = i32::try_from(changed).unwrap_or(i32::MAX);
        self.last_keys = if changed > 0 && !self.keys.is_off() {
            generated_keys(conn, &self.sql, &self.keys)?
        } else {
            None
        };
        Ok(ExecuteOutcome::UpdateCount(self.update_count))
    }

    fn generated_keys(&mut self) -> DbResult<Box<dyn DbResultSet>> {
        self.check_open()?;
        let keys = self.last_keys.take().unwrap_or_else(SqliteResultSet::empty);
        Ok(Box::new(keys))
    }

    fn close(&mut self) -> DbResult<()> {
        self.closed = true;
        self.last_keys = None;
        Ok(())
    }

    fn max_rows(&self) -> DbResult<i32> {
        self.check_open()?;
        Ok(self.max_rows)
    }

    fn set_max_rows(&mut self, max: i32) -> DbResult<()> {
        self.check_open()?;
        if max < 0 {
            return Err(DbError::new(format!("Invalid max rows {}", max)));
        }
        self.max_rows = max;
        Ok(())
    }

    fn query_timeout(&self) -> DbResult<i32> {
        self.check_open()?;
        Ok(self.query_timeout)
    }

    fn set_query_timeout(&mut self, seconds: i32) -> DbResult<()> {
        self.check_open()?;
        if seconds < 0 {
            return Err(DbError::new(format!("Invalid query timeout {}", seconds)));
        }
        self.query_timeout = seconds;
        Ok(())
    }

    fn fetch_size(&self) -> DbResult<i32> {
        self.check_open()?;
        Ok(self.fetch_size)
    }

    fn set_fetch_size(&mut self, rows: i32) -> DbResult<()> {
        self.check_open()?;
        if rows < 0 {
            return Err(DbError::new(format!("Invalid fetch size {}", rows)));
        }
        self.fetch_size = rows;
        Ok(())
    }

    fn update_count(&self) -> DbResult<i32> {
        self.check_open()?;
        Ok(self.update_count)
    }

    fn clear_parameters(&mut self) -> DbResult<()> {
        self.check_open()?;
        self.params.fill(Value::Null);
        Ok(())
    }

    fn clear_warnings(&mut self) -> DbResult<()> {
        Ok(())
    }

    fn cancel(&mut self) -> DbResult<()> {
        self.check_open()?;
        self.interrupt.interrupt();
        Ok(())
    }
}

static INSERT_TARGET: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^\s*(?:INSERT|REPLACE)(?:\s+OR\s+\w+)?\s+INTO\s+((?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+)(?:\s*\.\s*(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+))?)"#,
    )
});

/// Table an INSERT or REPLACE statement writes to
fn insert_target(sql: &str) -> DbResult<Option<String>> {
    let re = INSERT_TARGET.as_ref().map_err(|e| DbError::new(e.to_string()))?;
    let Some(target) = re.captures(sql).and_then(|c| c.get(1)) else {
        return Ok(None);
    };
    let table = target
        .as_str()
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'));
    Ok(Some(table.to_string()))
}

/// Key column for `table`: its INTEGER PRIMARY KEY, or `rowid`
fn key_column(conn: &Connection, table: &str, keys: &KeyRequest) -> DbResult<String> {
    let mut stmt = conn
        .prepare("SELECT cid, name, type, pk FROM pragma_table_info(?1)")
        .map_err(sql_error)?;
    let info = stmt
        .query_map([table], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .map_err(sql_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sql_error)?;

    let name = match keys {
        KeyRequest::Columns(names) => names.first().cloned(),
        KeyRequest::Indexes(indexes) => indexes.first().and_then(|index| {
            info.iter()
                .find(|(cid, ..)| *cid == i64::from(*index) - 1)
                .map(|(_, name, ..)| name.clone())
        }),
        KeyRequest::Auto | KeyRequest::Off => None,
    };
    if let Some(name) = name {
        return Ok(name);
    }

    let primary: Vec<_> = info.iter().filter(|(.., pk)| *pk > 0).collect();
    match primary.as_slice() {
        [(_, name, ty, _)] if ty.eq_ignore_ascii_case("INTEGER") => Ok(name.clone()),
        _ => Ok("rowid".to_string()),
    }
}

/// Single-row result set holding the rowid of the last insert
fn generated_keys(conn: &Connection, sql: &str, keys: &KeyRequest) -> DbResult<Option<SqliteResultSet>> {
    let Some(table) = insert_target(sql)? else {
        return Ok(None);
    };
    let column = key_column(conn, &table, keys)?;
    let rowid = conn.last_insert_rowid();
    log::trace!("generated key {}.{} = {}", table, column, rowid);
    let meta = ColumnMeta {
        auto_increment: true,
        nullable: Nullability::NoNulls,
        catalog: "main".to_string(),
        ..ColumnMeta::new(column, sql_type::BIGINT).with_table(table)
    };
    Ok(Some(SqliteResultSet::new(
        ResultSetMetaData::new(vec![meta]),
        vec![vec![Value::Integer(rowid)]],
    )))
}

/// SQL type code for a declared column type, following SQLite's affinity
/// rules where they apply
pub fn type_from_declared(declared: &str) -> i32 {
    let upper = declared.to_ascii_uppercase();
    let base = upper.split('(').next().unwrap_or_default().trim();
    let has = |s: &str| base.contains(s);
    if has("BIGINT") {
        sql_type::BIGINT
    } else if has("SMALLINT") {
        sql_type::SMALLINT
    } else if has("TINYINT") {
        sql_type::TINYINT
    } else if has("INT") {
        sql_type::INTEGER
    } else if has("LONGVARCHAR") {
        sql_type::LONGVARCHAR
    } else if has("LONGVARBINARY") {
        sql_type::LONGVARBINARY
    } else if has("CLOB") {
        sql_type::CLOB
    } else if has("VARCHAR") || has("TEXT") {
        sql_type::VARCHAR
    } else if base.starts_with("CHAR") || base.starts_with("CHARACTER") || base == "NCHAR" {
        sql_type::CHAR
    } else if has("BLOB") {
        sql_type::BLOB
    } else if has("BINARY") {
        sql_type::VARBINARY
    } else if has("REAL") {
        sql_type::REAL
    } else if has("FLOA") || has("DOUB") {
        sql_type::DOUBLE
    } else if has("DEC") || has("NUMERIC") {
        sql_type::NUMERIC
    } else if has("BOOL") {
        sql_type::BOOLEAN
    } else if has("TIMESTAMP") || has("DATETIME") {
        sql_type::TIMESTAMP
    } else if has("DATE") {
        sql_type::DATE
    } else if has("TIME") {
        sql_type::TIME
    } else {
        sql_type::VARCHAR
    }
}

fn type_from_value(value: Option<&Value>) -> i32 {
    match value {
        Some(Value::Integer(_)) => sql_type::INTEGER,
        Some(Value::Real(_)) => sql_type::DOUBLE,
        Some(Value::Blob(_)) => sql_type::VARBINARY,
        Some(Value::Text(_)) | Some(Value::Null) | None => sql_type::VARCHAR,
    }
}

/// Precision and scale from a declared type such as `DECIMAL(10,2)`
fn precision_scale(declared: &str) -> (i32, i32) {
    let inner = declared
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(inner, _)| inner);
    let Some(inner) = inner else {
        return (0, 0);
    };
    let mut parts = inner.split(',').map(|p| p.trim().parse::<i32>().unwrap_or(0));
    (parts.next().unwrap_or(0), parts.next().unwrap_or(0))
}

/// Buffered query results
pub struct SqliteResultSet {
    meta: ResultSetMetaData,
    rows: Vec<Vec<Value>>,
    /// Rows consumed by `next`, including the current one
    position: usize,
    last_null: bool,
    closed: bool,
}

impl SqliteResultSet {
    fn new(meta: ResultSetMetaData, rows: Vec<Vec<Value>>) -> Self {
        Self {
            meta,
            rows,
            position: 0,
            last_null: false,
            closed: false,
        }
    }

    fn empty() -> Self {
        Self::new(ResultSetMetaData::default(), Vec::new())
    }

    fn read(stmt: &mut rusqlite::Statement<'_>, limit: Option<usize>) -> DbResult<Self> {
        let declared: Vec<(String, Option<String>)> = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), c.decl_type().map(str::to_string)))
            .collect();

        let mut rows = Vec::new();
        let mut cursor = stmt.raw_query();
        while let Some(row) = cursor.next().map_err(sql_error)? {
            if limit.is_some_and(|max| rows.len() >= max) {
                break;
            }
            let values = (0..declared.len())
                .map(|i| row.get_ref(i).map(Value::from))
                .collect::<Result<Vec<_>, _>>()
                .map_err(sql_error)?;
            rows.push(values);
        }

        let columns = declared
            .into_iter()
            .enumerate()
            .map(|(i, (name, decl))| {
                let (type_code, precision, scale) = match decl.as_deref() {
                    Some(decl) => {
                        let (p, s) = precision_scale(decl);
                        (type_from_declared(decl), p, s)
                    }
                    None => (type_from_value(rows.first().and_then(|r| r.get(i))), 0, 0),
                };
                let mut meta = ColumnMeta::new(name, type_code);
                if let Some(decl) = decl {
                    meta.type_name = decl;
                }
                meta.precision = precision;
                meta.scale = Some(scale);
                meta.nullable = Nullability::Unknown;
                meta
            })
            .collect();
        Ok(Self::new(ResultSetMetaData::new(columns), rows))
    }

    fn check_open(&self) -> DbResult<()> {
        if self.closed {
            return Err(closed_error("ResultSet"));
        }
        Ok(())
    }

    fn value(&mut self, index: i32) -> DbResult<&Value> {
        self.check_open()?;
        self.meta.column(index)?;
        let row = self
            .position
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .ok_or_else(|| DbError::new("No current row"))?;
        let value = usize::try_from(index - 1)
            .ok()
            .and_then(|i| row.get(i))
            .ok_or_else(|| DbError::new(format!("Invalid column index: {}", index)))?;
        self.last_null = matches!(value, Value::Null);
        Ok(value)
    }
}

impl DbResultSet for SqliteResultSet {
    fn next(&mut self) -> DbResult<bool> {
        self.check_open()?;
        if self.position < self.rows.len() {
            self.position += 1;
            Ok(true)
        } else {
            self.position = self.rows.len() + 1;
            Ok(false)
        }
    }

    fn metadata(&self) -> &ResultSetMetaData {
        &self.meta
    }

    fn get_string(&mut self, index: i32) -> DbResult<Option<String>> {
        Ok(match self.value(index)? {
            Value::Null => None,
            Value::Integer(v) => Some(v.to_string()),
            Value::Real(v) => Some(v.to_string()),
            Value::Text(v) => Some(v.clone()),
            Value::Blob(v) => Some(String::from_utf8_lossy(v).into_owned()),
        })
    }

    fn get_bytes(&mut self, index: i32) -> DbResult<Option<Vec<u8>>> {
        Ok(match self.value(index)? {
            Value::Null => None,
            Value::Integer(v) => Some(v.to_string().into_bytes()),
            Value::Real(v) => Some(v.to_string().into_bytes()),
            Value::Text(v) => Some(v.clone().into_bytes()),
            Value::Blob(v) => Some(v.clone()),
        })
    }

    fn get_long(&mut self, index: i32) -> DbResult<Option<LongStream>> {
        let type_code = self.meta.column(index)?.type_code;
        let binary = sql_type::is_binary(type_code) || type_code == sql_type::BLOB;
        if binary {
            Ok(self
                .get_bytes(index)?
                .map(|bytes| LongStream::Binary(Box::new(Cursor::new(bytes)))))
        } else {
            Ok(self.get_string(index)?.map(|text| {
                let chars: Vec<char> = text.chars().collect();
                LongStream::Text(Box::new(chars.into_iter()))
            }))
        }
    }

    fn cursor_name(&self) -> DbResult<Option<String>> {
        self.check_open()?;
        Ok(None)
    }

    fn row(&self) -> DbResult<i32> {
        self.check_open()?;
        if self.position > self.rows.len() {
            return Ok(0);
        }
        Ok(i32::try_from(self.position).unwrap_or(i32::MAX))
    }

    fn fetch_size(&self) -> DbResult<i32> {
        self.check_open()?;
        Ok(0)
    }

    fn was_null(&self) -> DbResult<bool> {
        self.check_open()?;
        Ok(self.last_null)
    }

    fn find_column(&self, label: &str) -> DbResult<i32> {
        self.check_open()?;
        self.meta
            .columns()
            .iter()
            .position(|c| c.label.eq_ignore_ascii_case(label))
            .and_then(|i| i32::try_from(i + 1).ok())
            .ok_or_else(|| DbError::new(format!("No such column: {}", label)))
    }

    fn close(&mut self) -> DbResult<()> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}
