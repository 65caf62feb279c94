//! Proxy-level request errors
//!
//! These are the errors the proxy itself raises while serving a request,
//! as opposed to errors coming out of the database driver. Each kind has a
//! stable numeric code that is sent to the client in the error code field,
//! and a message template whose `{0}`, `{1}` placeholders are filled from
//! the error's arguments.

use std::fmt;

use thiserror::Error;

use crate::error::DbError;

/// Kinds of proxy-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbdErrorKind {
    UnknownRequest,
    NoResponse,
    GenericException,
    UnsupportedEncoding,
    SetParameter,
    NoResultSet,
    FetchException,
    UnknownProperty,
    NoCursor,
    NoMetadata,
    InvalidStatementHandle,
    ReflectionObjectMissing,
    ReflectionInvalidObject,
    ReflectionException,
    DataTruncation,
    NotConnected,
    InvalidPropertyValue,
    NoSuitableDriver,
}

impl DbdErrorKind {
    /// Numeric code reported to the client
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            DbdErrorKind::UnknownRequest => 1,
            DbdErrorKind::NoResponse => 2,
            DbdErrorKind::GenericException => 3,
            DbdErrorKind::UnsupportedEncoding => 4,
            DbdErrorKind::SetParameter => 5,
            DbdErrorKind::NoResultSet => 6,
            DbdErrorKind::FetchException => 7,
            DbdErrorKind::UnknownProperty => 8,
            DbdErrorKind::NoCursor => 9,
            DbdErrorKind::NoMetadata => 10,
            DbdErrorKind::InvalidStatementHandle => 11,
            DbdErrorKind::ReflectionObjectMissing => 12,
            DbdErrorKind::ReflectionInvalidObject => 13,
            DbdErrorKind::ReflectionException => 14,
            DbdErrorKind::DataTruncation => 15,
            DbdErrorKind::NotConnected => 16,
            DbdErrorKind::InvalidPropertyValue => 17,
            DbdErrorKind::NoSuitableDriver => 18,
        }
    }

    const fn template(self) -> &'static str {
        match self {
            DbdErrorKind::UnknownRequest => "Unknown request type {0}",
            DbdErrorKind::NoResponse => "No response was generated for the request",
            DbdErrorKind::GenericException => "Server exception: {0}",
            DbdErrorKind::UnsupportedEncoding => "Unsupported character encoding: {0}",
            DbdErrorKind::SetParameter => "Error setting parameter {0}: {1}",
            DbdErrorKind::NoResultSet => "No result set is available",
            DbdErrorKind::FetchException => "Error fetching column {0}: {1}",
            DbdErrorKind::UnknownProperty => "Unknown property: {0}",
            DbdErrorKind::NoCursor => "No cursor is available",
            DbdErrorKind::NoMetadata => "No result set metadata is available",
            DbdErrorKind::InvalidStatementHandle => "Invalid statement handle {0}",
            DbdErrorKind::ReflectionObjectMissing => {
                "Method name must be qualified with Statement., ResultSet. or ResultSetMetaData."
            }
            DbdErrorKind::ReflectionInvalidObject => "Invalid object name: {0}",
            DbdErrorKind::ReflectionException => "Method invocation failed: {0}",
            DbdErrorKind::DataTruncation => "Long data truncated in column {0}",
            DbdErrorKind::NotConnected => "No database connection is open",
            DbdErrorKind::InvalidPropertyValue => "Invalid value '{1}' for property {0}",
            DbdErrorKind::NoSuitableDriver => "No suitable driver found for {0}",
        }
    }
}

impl fmt::Display for DbdErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// A proxy-level error with its message arguments and an optional
/// driver error that caused it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", self.message())]
pub struct DbdError {
    kind: DbdErrorKind,
    args: Vec<String>,
    cause: Option<DbError>,
}

impl DbdError {
    pub fn new(kind: DbdErrorKind) -> Self {
        Self {
            kind,
            args: Vec::new(),
            cause: None,
        }
    }

    pub fn with_args<I, S>(kind: DbdErrorKind, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            args: args.into_iter().map(Into::into).collect(),
            cause: None,
        }
    }

    pub fn caused_by(mut self, cause: DbError) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn kind(&self) -> DbdErrorKind {
        self.kind
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    pub fn cause(&self) -> Option<&DbError> {
        self.cause.as_ref()
    }

    /// The message template with placeholders substituted
    ///
    /// Placeholders without a matching argument are left empty.
    pub fn message(&self) -> String {
        let template = self.kind.template();
        let mut out = String::with_capacity(template.len() + 16);
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    if let Ok(index) = after[..end].parse::<usize>() {
                        if let Some(arg) = self.args.get(index) {
                            out.push_str(arg);
                        }
                    } else {
                        out.push_str(&rest[start..start + end + 2]);
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_substitution() {
        let err = DbdError::with_args(DbdErrorKind::SetParameter, ["1", "invalid digit"]);
        assert_eq!(err.message(), "Error setting parameter 1: invalid digit");
        assert_eq!(err.to_string(), err.message());
        assert_eq!(err.code(), 5);
    }

    #[test]
    fn test_missing_argument_left_empty() {
        let err = DbdError::new(DbdErrorKind::InvalidStatementHandle);
        assert_eq!(err.message(), "Invalid statement handle ");
    }

    #[test]
    fn test_codes_are_distinct() {
        use std::collections::HashSet;
        let kinds = [
            DbdErrorKind::UnknownRequest,
            DbdErrorKind::NoResponse,
            DbdErrorKind::GenericException,
            DbdErrorKind::UnsupportedEncoding,
            DbdErrorKind::SetParameter,
            DbdErrorKind::NoResultSet,
            DbdErrorKind::FetchException,
            DbdErrorKind::UnknownProperty,
            DbdErrorKind::NoCursor,
            DbdErrorKind::NoMetadata,
            DbdErrorKind::InvalidStatementHandle,
            DbdErrorKind::ReflectionObjectMissing,
            DbdErrorKind::ReflectionInvalidObject,
            DbdErrorKind::ReflectionException,
            DbdErrorKind::DataTruncation,
            DbdErrorKind::NotConnected,
            DbdErrorKind::InvalidPropertyValue,
            DbdErrorKind::NoSuitableDriver,
        ];
        let codes: HashSet<i32> = kinds.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), kinds.len());
    }
}
