//! SQL type codes
//!
//! Clients send these integer codes as type hints for parameters, and the
//! server reports them back as column types. The numbering is the JDBC
//! `java.sql.Types` numbering, which client libraries already use.

pub const BIT: i32 = -7;
pub const TINYINT: i32 = -6;
pub const SMALLINT: i32 = 5;
pub const INTEGER: i32 = 4;
pub const BIGINT: i32 = -5;
pub const FLOAT: i32 = 6;
pub const REAL: i32 = 7;
pub const DOUBLE: i32 = 8;
pub const NUMERIC: i32 = 2;
pub const DECIMAL: i32 = 3;
pub const CHAR: i32 = 1;
pub const VARCHAR: i32 = 12;
pub const LONGVARCHAR: i32 = -1;
pub const DATE: i32 = 91;
pub const TIME: i32 = 92;
pub const TIMESTAMP: i32 = 93;
pub const BINARY: i32 = -2;
pub const VARBINARY: i32 = -3;
pub const LONGVARBINARY: i32 = -4;
pub const NULL: i32 = 0;
pub const OTHER: i32 = 1111;
pub const BOOLEAN: i32 = 16;
pub const ARRAY: i32 = 2003;
pub const BLOB: i32 = 2004;
pub const CLOB: i32 = 2005;

/// Name of a type code, for logs and metadata
pub fn type_name(code: i32) -> &'static str {
    match code {
        BIT => "BIT",
        TINYINT => "TINYINT",
        SMALLINT => "SMALLINT",
        INTEGER => "INTEGER",
        BIGINT => "BIGINT",
        FLOAT => "FLOAT",
        REAL => "REAL",
        DOUBLE => "DOUBLE",
        NUMERIC => "NUMERIC",
        DECIMAL => "DECIMAL",
        CHAR => "CHAR",
        VARCHAR => "VARCHAR",
        LONGVARCHAR => "LONGVARCHAR",
        DATE => "DATE",
        TIME => "TIME",
        TIMESTAMP => "TIMESTAMP",
        BINARY => "BINARY",
        VARBINARY => "VARBINARY",
        LONGVARBINARY => "LONGVARBINARY",
        NULL => "NULL",
        BOOLEAN => "BOOLEAN",
        ARRAY => "ARRAY",
        BLOB => "BLOB",
        CLOB => "CLOB",
        _ => "OTHER",
    }
}

/// Types whose values are transferred as raw bytes
#[must_use]
pub const fn is_binary(code: i32) -> bool {
    matches!(code, BINARY | VARBINARY | LONGVARBINARY)
}

/// Types whose values are read through the long-data path
#[must_use]
pub const fn is_long(code: i32) -> bool {
    matches!(code, LONGVARBINARY | BLOB | LONGVARCHAR | CLOB)
}
