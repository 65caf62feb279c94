//! Method calls requested by ConnectionFunc and StatementFunc
//!
//! Only the methods listed here can be called. Each takes its arguments
//! from the request's typed parameters and returns its result as text:
//! booleans become `"1"` or `"0"`, and methods without a result return NULL.

use dbdproxy_core::{DbError, DbResult, DbdError, DbdErrorKind, ProxyResult};
use dbdproxy_driver::{DbConnection, DbResultSet, DbStatement, ResultSetMetaData};

use crate::coerce::FuncValue;

/// Object a StatementFunc method is called on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncTarget {
    Statement,
    ResultSet,
    MetaData,
}

/// Split `Object.method` into its target and method name
///
/// # Errors
/// * `ReflectionObjectMissing` if there is no `.`
/// * `ReflectionInvalidObject` for an unknown object name
pub fn parse_method(qualified: &str) -> Result<(FuncTarget, &str), DbdError> {
    let (object, method) = qualified
        .split_once('.')
        .ok_or_else(|| DbdError::new(DbdErrorKind::ReflectionObjectMissing))?;
    let target = match object {
        "Statement" | "PreparedStatement" => FuncTarget::Statement,
        "ResultSet" => FuncTarget::ResultSet,
        "ResultSetMetaData" => FuncTarget::MetaData,
        _ => {
            return Err(DbdError::with_args(
                DbdErrorKind::ReflectionInvalidObject,
                [object],
            ));
        }
    };
    Ok((target, method))
}

fn flag(value: bool) -> Option<String> {
    Some(if value { "1" } else { "0" }.to_string())
}

fn number(value: i32) -> Option<String> {
    Some(value.to_string())
}

fn no_method(method: &str, args: &[FuncValue]) -> DbdError {
    DbdError::with_args(
        DbdErrorKind::ReflectionException,
        [format!("no method {} taking {} argument(s)", method, args.len())],
    )
}

fn failed(method: &str, err: DbError) -> DbdError {
    DbdError::with_args(DbdErrorKind::ReflectionException, [method]).caused_by(err)
}

/// Arguments of one call, checked by shape
struct Args<'a> {
    method: &'a str,
    values: &'a [FuncValue],
}

impl<'a> Args<'a> {
    fn none(&self) -> Result<(), DbdError> {
        if self.values.is_empty() {
            Ok(())
        } else {
            Err(no_method(self.method, self.values))
        }
    }

    fn single(&self) -> Result<&'a FuncValue, DbdError> {
        match self.values {
            [value] => Ok(value),
            _ => Err(no_method(self.method, self.values)),
        }
    }

    fn int(&self) -> Result<i32, DbdError> {
        self.single()?.as_int().ok_or_else(|| no_method(self.method, self.values))
    }

    fn bool(&self) -> Result<bool, DbdError> {
        self.single()?.as_bool().ok_or_else(|| no_method(self.method, self.values))
    }

    fn text(&self) -> Result<String, DbdError> {
        self.single()?.as_text().ok_or_else(|| no_method(self.method, self.values))
    }
}

/// Run `call`, wrapping a driver failure with the method name
fn invoke<T>(method: &str, call: impl FnOnce() -> DbResult<T>) -> Result<T, DbdError> {
    call().map_err(|e| failed(method, e))
}

/// Call a connection method
pub fn call_connection(
    conn: &mut dyn DbConnection,
    method: &str,
    values: &[FuncValue],
) -> ProxyResult<Option<String>> {
    let args = Args { method, values };
    let result = match method {
        "getAutoCommit" => {
            args.none()?;
            flag(invoke(method, || conn.auto_commit())?)
        }
        "setAutoCommit" => {
            let on = args.bool()?;
            invoke(method, || conn.set_auto_commit(on))?;
            None
        }
        "isClosed" => {
            args.none()?;
            flag(conn.is_closed())
        }
        "isReadOnly" => {
            args.none()?;
            flag(invoke(method, || conn.is_read_only())?)
        }
        "setReadOnly" => {
            let on = args.bool()?;
            invoke(method, || conn.set_read_only(on))?;
            None
        }
        "getCatalog" => {
            args.none()?;
            invoke(method, || conn.catalog())?
        }
        "setCatalog" => {
            let catalog = args.text()?;
            invoke(method, || conn.set_catalog(&catalog))?;
            None
        }
        "getTransactionIsolation" => {
            args.none()?;
            number(invoke(method, || conn.transaction_isolation())?)
        }
        "setTransactionIsolation" => {
            let level = args.int()?;
            invoke(method, || conn.set_transaction_isolation(level))?;
            None
        }
        "nativeSQL" => {
            let sql = args.text()?;
            Some(invoke(method, || conn.native_sql(&sql))?)
        }
        "clearWarnings" => {
            args.none()?;
            invoke(method, || conn.clear_warnings())?;
            None
        }
        "commit" => {
            args.none()?;
            invoke(method, || conn.commit())?;
            None
        }
        "rollback" => {
            args.none()?;
            invoke(method, || conn.rollback())?;
            None
        }
        _ => return Err(no_method(method, values).into()),
    };
    Ok(result)
}

/// Call a statement method
pub fn call_statement(
    stmt: &mut dyn DbStatement,
    method: &str,
    values: &[FuncValue],
) -> ProxyResult<Option<String>> {
    let args = Args { method, values };
    let result = match method {
        "getMaxRows" => {
            args.none()?;
            number(invoke(method, || stmt.max_rows())?)
        }
        "setMaxRows" => {
            let max = args.int()?;
            invoke(method, || stmt.set_max_rows(max))?;
            None
        }
        "getQueryTimeout" => {
            args.none()?;
            number(invoke(method, || stmt.query_timeout())?)
        }
        "setQueryTimeout" => {
            let seconds = args.int()?;
            invoke(method, || stmt.set_query_timeout(seconds))?;
            None
        }
        "getFetchSize" => {
            args.none()?;
            number(invoke(method, || stmt.fetch_size())?)
        }
        "setFetchSize" => {
            let rows = args.int()?;
            invoke(method, || stmt.set_fetch_size(rows))?;
            None
        }
        "getUpdateCount" => {
            args.none()?;
            number(invoke(method, || stmt.update_count())?)
        }
        "clearParameters" => {
            args.none()?;
            invoke(method, || stmt.clear_parameters())?;
            None
        }
        "clearWarnings" => {
            args.none()?;
            invoke(method, || stmt.clear_warnings())?;
            None
        }
        "cancel" => {
            args.none()?;
            invoke(method, || stmt.cancel())?;
            None
        }
        _ => return Err(no_method(method, values).into()),
    };
    Ok(result)
}

/// Call a result set method
pub fn call_result_set(
    rs: &mut dyn DbResultSet,
    method: &str,
    values: &[FuncValue],
) -> ProxyResult<Option<String>> {
    let args = Args { method, values };
    let result = match method {
        "getRow" => {
            args.none()?;
            number(invoke(method, || rs.row())?)
        }
        "getCursorName" => {
            args.none()?;
            invoke(method, || rs.cursor_name())?
        }
        "getFetchSize" => {
            args.none()?;
            number(invoke(method, || rs.fetch_size())?)
        }
        "wasNull" => {
            args.none()?;
            flag(invoke(method, || rs.was_null())?)
        }
        "getString" => {
            let column = args.int()?;
            invoke(method, || rs.get_string(column))?
        }
        "findColumn" => {
            let label = args.text()?;
            number(invoke(method, || rs.find_column(&label))?)
        }
        _ => return Err(no_method(method, values).into()),
    };
    Ok(result)
}

/// Call a result set metadata method
pub fn call_metadata(
    meta: &ResultSetMetaData,
    method: &str,
    values: &[FuncValue],
) -> ProxyResult<Option<String>> {
    let args = Args { method, values };
    if method == "getColumnCount" {
        args.none()?;
        return Ok(number(i32::try_from(meta.column_count()).unwrap_or(i32::MAX)));
    }
    let column = || -> Result<_, DbdError> {
        let index = args.int()?;
        meta.column(index).map_err(|e| failed(method, e))
    };
    let result = match method {
        "getColumnName" => Some(column()?.name.clone()),
        "getColumnLabel" => Some(column()?.label.clone()),
        "getColumnType" => number(column()?.type_code),
        "getColumnTypeName" => Some(column()?.type_name.clone()),
        "getPrecision" => number(column()?.precision),
        "getScale" => number(column()?.scale.unwrap_or(0)),
        "isNullable" => number(column()?.nullable.code()),
        "getTableName" => Some(column()?.table.clone()),
        "getSchemaName" => Some(column()?.schema.clone()),
        "getCatalogName" => Some(column()?.catalog.clone()),
        "isAutoIncrement" => flag(column()?.auto_increment),
        _ => return Err(no_method(method, values).into()),
    };
    Ok(result)
}
