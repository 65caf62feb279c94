//! Driver collaborator traits
//!
//! The proxy talks to databases only through these traits. A [`Driver`]
//! opens a [`DbConnection`], which prepares [`DbStatement`]s, which produce
//! [`DbResultSet`]s.
//!
//! # Object Lifecycle
//!
//! 1. **Connect**: [`Driver::connect`] with a URL and [`Credentials`]
//! 2. **Prepare**: [`DbConnection::prepare`] with SQL and a [`KeyRequest`]
//! 3. **Bind and execute**: [`DbStatement::set_param`] then [`DbStatement::execute`]
//! 4. **Fetch**: [`DbResultSet::next`] and the column accessors
//! 5. **Close**: result sets, statements, then the connection
//!
//! All calls are blocking. The server runs each session on its own thread,
//! so implementations do not need to be re-entrant.

use std::io::Read;

use dbdproxy_core::{DbResult, KeyRequest};

use crate::metadata::ResultSetMetaData;
use crate::value::SqlValue;

/// Login information passed to [`Driver::connect`]
///
/// When neither user nor password is given the driver connects with the
/// property list alone; otherwise it connects with user and password.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
    /// Extra connection properties, in the order the client sent them
    pub properties: Vec<(String, String)>,
}

impl Credentials {
    pub fn new(user: Option<String>, password: Option<String>) -> Self {
        Self {
            user,
            password,
            properties: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: Vec<(String, String)>) -> Self {
        self.properties = properties;
        self
    }

    /// Whether the driver should connect with the property list only
    pub fn uses_properties(&self) -> bool {
        self.user.is_none() && self.password.is_none()
    }

    /// Case-insensitive property lookup
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A database driver
///
/// Drivers are registered with a [`DriverManager`](crate::DriverManager),
/// which asks each in turn whether it accepts a URL.
#[cfg_attr(test, mockall::automock)]
pub trait Driver: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> String;

    /// Whether this driver handles `url`
    fn accepts_url(&self, url: &str) -> bool;

    /// Open a connection
    ///
    /// # Arguments
    /// * `url` - Database URL, already accepted by [`Driver::accepts_url`]
    /// * `credentials` - User, password and connection properties
    ///
    /// # Errors
    /// Returns the driver's error if the database cannot be opened
    fn connect(&self, url: &str, credentials: &Credentials) -> DbResult<Box<dyn DbConnection>>;
}

/// An open database connection
pub trait DbConnection: Send {
    /// Prepare `sql`
    ///
    /// # Arguments
    /// * `sql` - Statement text
    /// * `keys` - Generated keys the statement should make available after
    ///   execution. Drivers that do not support generated keys are only
    ///   ever given [`KeyRequest::Off`].
    ///
    /// # Errors
    /// Returns the driver's error if the SQL is invalid
    fn prepare(&mut self, sql: &str, keys: KeyRequest) -> DbResult<Box<dyn DbStatement>>;

    fn commit(&mut self) -> DbResult<()>;

    fn rollback(&mut self) -> DbResult<()>;

    /// Close the connection; closing twice is not an error
    fn close(&mut self) -> DbResult<()>;

    fn is_closed(&self) -> bool;

    fn auto_commit(&self) -> DbResult<bool>;

    /// Switch auto-commit; turning it on commits any open transaction
    fn set_auto_commit(&mut self, auto_commit: bool) -> DbResult<()>;

    fn supports_generated_keys(&self) -> bool;

    fn product_name(&self) -> String;

    fn product_version(&self) -> String;

    fn is_read_only(&self) -> DbResult<bool>;

    fn set_read_only(&mut self, read_only: bool) -> DbResult<()>;

    fn catalog(&self) -> DbResult<Option<String>>;

    fn set_catalog(&mut self, catalog: &str) -> DbResult<()>;

    fn transaction_isolation(&self) -> DbResult<i32>;

    fn set_transaction_isolation(&mut self, level: i32) -> DbResult<()>;

    /// The SQL the driver would send for `sql`
    fn native_sql(&self, sql: &str) -> DbResult<String>;

    fn clear_warnings(&mut self) -> DbResult<()>;
}

/// What [`DbStatement::execute`] produced
pub enum ExecuteOutcome {
    ResultSet(Box<dyn DbResultSet>),
    UpdateCount(i32),
}

impl std::fmt::Debug for ExecuteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecuteOutcome::ResultSet(rs) => {
                write!(f, "ResultSet({} columns)", rs.metadata().column_count())
            }
            ExecuteOutcome::UpdateCount(count) => write!(f, "UpdateCount({})", count),
        }
    }
}

/// A prepared statement
pub trait DbStatement: Send {
    /// Bind a parameter
    ///
    /// # Arguments
    /// * `index` - 1-based parameter position
    /// * `value` - Value to bind
    ///
    /// # Errors
    /// Returns the driver's error if the position is out of range or the
    /// value cannot be bound
    fn set_param(&mut self, index: usize, value: SqlValue) -> DbResult<()>;

    /// Execute with the currently bound parameters
    ///
    /// # Returns
    /// A result set for queries, otherwise the number of affected rows
    fn execute(&mut self) -> DbResult<ExecuteOutcome>;

    /// Keys generated by the last execution
    ///
    /// A result set with no columns means there are no keys.
    fn generated_keys(&mut self) -> DbResult<Box<dyn DbResultSet>>;

    fn close(&mut self) -> DbResult<()>;

    fn max_rows(&self) -> DbResult<i32>;

    fn set_max_rows(&mut self, max: i32) -> DbResult<()>;

    /// Query timeout in seconds, 0 for none
    fn query_timeout(&self) -> DbResult<i32>;

    fn set_query_timeout(&mut self, seconds: i32) -> DbResult<()>;

    fn fetch_size(&self) -> DbResult<i32>;

    fn set_fetch_size(&mut self, rows: i32) -> DbResult<()>;

    /// Update count of the last execution, -1 if it produced a result set
    fn update_count(&self) -> DbResult<i32>;

    fn clear_parameters(&mut self) -> DbResult<()>;

    fn clear_warnings(&mut self) -> DbResult<()>;

    /// Interrupt a running execution
    fn cancel(&mut self) -> DbResult<()>;
}

/// Streamed access to a long column
pub enum LongStream {
    Binary(Box<dyn Read>),
    Text(Box<dyn Iterator<Item = char>>),
}

/// A forward-only cursor over query results
///
/// Column indexes are 1-based.
pub trait DbResultSet: Send {
    /// Advance to the next row; `false` once the rows are exhausted
    fn next(&mut self) -> DbResult<bool>;

    /// Column descriptions, fixed for the life of the result set
    fn metadata(&self) -> &ResultSetMetaData;

    /// Column value as text, `None` for SQL NULL
    fn get_string(&mut self, index: i32) -> DbResult<Option<String>>;

    /// Column value as raw bytes, `None` for SQL NULL
    fn get_bytes(&mut self, index: i32) -> DbResult<Option<Vec<u8>>>;

    /// Column value as a stream, `None` for SQL NULL
    ///
    /// Binary columns stream bytes and character columns stream chars.
    fn get_long(&mut self, index: i32) -> DbResult<Option<LongStream>>;

    /// Named cursor, if the driver has one
    fn cursor_name(&self) -> DbResult<Option<String>>;

    /// Current 1-based row number, 0 before the first row
    fn row(&self) -> DbResult<i32>;

    fn fetch_size(&self) -> DbResult<i32>;

    /// Whether the last column read was SQL NULL
    fn was_null(&self) -> DbResult<bool>;

    /// 1-based index of the column labelled `label`, ignoring case
    fn find_column(&self, label: &str) -> DbResult<i32>;

    fn close(&mut self) -> DbResult<()>;
}
