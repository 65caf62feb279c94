//! Result set column descriptions

use dbdproxy_core::{DbError, DbResult};

/// Whether a column may hold NULL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nullability {
    NoNulls,
    Nullable,
    #[default]
    Unknown,
}

impl Nullability {
    /// The value reported to clients: 0 no nulls, 1 nullable, 2 unknown
    pub const fn code(self) -> i32 {
        match self {
            Nullability::NoNulls => 0,
            Nullability::Nullable => 1,
            Nullability::Unknown => 2,
        }
    }
}

/// Description of one result column
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMeta {
    pub name: String,
    pub label: String,
    /// SQL type code
    pub type_code: i32,
    pub type_name: String,
    pub precision: i32,
    /// `None` when the driver cannot report a scale for the column
    pub scale: Option<i32>,
    pub nullable: Nullability,
    pub table: String,
    pub schema: String,
    pub catalog: String,
    pub auto_increment: bool,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, type_code: i32) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            type_code,
            type_name: dbdproxy_core::sql_type::type_name(type_code).to_string(),
            ..Self::default()
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}

/// Snapshot of a result set's columns, taken when the result set is opened
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSetMetaData {
    columns: Vec<ColumnMeta>,
}

impl ResultSetMetaData {
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        Self { columns }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    /// Column by 1-based index
    pub fn column(&self, index: i32) -> DbResult<&ColumnMeta> {
        usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.columns.get(i))
            .ok_or_else(|| DbError::new(format!("Invalid column index: {}", index)))
    }
}
