//! Per-statement server state

use dbdproxy_driver::{DbResultSet, DbStatement, ResultSetMetaData};

use crate::config::StatementDefaults;

/// Statement properties a client can change with SetStatementProperty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementProperties {
    pub long_read_len: i32,
    pub long_trunc_ok: bool,
    pub chop_blanks: bool,
    pub long_read_all: bool,
}

impl From<&StatementDefaults> for StatementProperties {
    fn from(defaults: &StatementDefaults) -> Self {
        Self {
            long_read_len: defaults.long_read_len,
            long_trunc_ok: defaults.long_trunc_ok,
            chop_blanks: defaults.chop_blanks,
            long_read_all: defaults.long_read_all,
        }
    }
}

/// A prepared statement, its current result set and its properties
pub struct StatementHolder {
    statement: Box<dyn DbStatement>,
    result_set: Option<Box<dyn DbResultSet>>,
    pub properties: StatementProperties,
}

impl StatementHolder {
    pub fn new(statement: Box<dyn DbStatement>, properties: StatementProperties) -> Self {
        Self {
            statement,
            result_set: None,
            properties,
        }
    }

    pub fn statement_mut(&mut self) -> &mut dyn DbStatement {
        self.statement.as_mut()
    }

    pub fn result_set_mut(&mut self) -> Option<&mut (dyn DbResultSet + 'static)> {
        self.result_set.as_deref_mut()
    }

    /// Metadata of the current result set
    pub fn metadata(&self) -> Option<&ResultSetMetaData> {
        self.result_set.as_deref().map(|rs| rs.metadata())
    }

    /// Replace the current result set, closing the previous one
    pub fn set_result_set(&mut self, result_set: Option<Box<dyn DbResultSet>>) {
        if let Some(mut previous) = self.result_set.take() {
            if let Err(e) = previous.close() {
                log::warn!("closing previous result set failed: {}", e);
            }
        }
        self.result_set = result_set;
    }

    /// Close the result set and the statement, logging any failure
    pub fn close(&mut self) {
        self.set_result_set(None);
        if let Err(e) = self.statement.close() {
            log::warn!("closing statement failed: {}", e);
        }
    }
}

impl std::fmt::Debug for StatementHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementHolder")
            .field("has_result_set", &self.result_set.is_some())
            .field("properties", &self.properties)
            .finish()
    }
}
