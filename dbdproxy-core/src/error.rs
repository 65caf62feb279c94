use thiserror::Error;

use crate::dbd::DbdError;

/// Main error type for proxy operations
///
/// Variants fall into two groups. `Database` and `Dbd` are request-scoped:
/// the session reports them to the client and keeps running. Everything
/// else means the byte stream or the process state can no longer be
/// trusted and ends the session.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("BER decoding error: {0}")]
    Decode(String),

    #[error("BER encoding error: {0}")]
    Encode(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Dbd(#[from] DbdError),
}

impl ProxyError {
    /// Whether the session may continue after reporting this error
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, ProxyError::Database(_) | ProxyError::Dbd(_))
    }
}

/// Result type alias for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

/// An error raised by a database driver
///
/// Mirrors the shape drivers usually report: a message, a vendor error
/// code, an optional five character SQL state and an optional chained
/// cause. The chain is reported to the client one element per link.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DbError {
    message: String,
    code: i32,
    sql_state: Option<String>,
    next: Option<Box<DbError>>,
}

impl DbError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 0,
            sql_state: None,
            next: None,
        }
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }

    /// Append `next` at the end of this error's chain
    pub fn with_next(mut self, next: DbError) -> Self {
        match self.next.take() {
            Some(existing) => self.next = Some(Box::new(existing.with_next(next))),
            None => self.next = Some(Box::new(next)),
        }
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }

    pub fn next(&self) -> Option<&DbError> {
        self.next.as_deref()
    }

    /// Iterate over this error and every chained cause
    pub fn chain(&self) -> impl Iterator<Item = &DbError> {
        std::iter::successors(Some(self), |e| e.next())
    }
}

/// Result type alias for driver operations
pub type DbResult<T> = Result<T, DbError>;
