//! Cache of the most recently generated keys
//!
//! Each Execute that yields generated keys replaces the whole cache with the
//! last row of its key result set. GetGeneratedKeys then looks values up by
//! table and column name.

use dbdproxy_core::DbResult;
use dbdproxy_driver::DbResultSet;

/// One generated key value and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedKey {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub column: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct KeyCache {
    keys: Option<Vec<GeneratedKey>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.as_ref().is_none_or(Vec::is_empty)
    }

    pub fn replace(&mut self, keys: Vec<GeneratedKey>) {
        self.keys = Some(keys);
    }

    /// Read every row of a generated-keys result set and keep the last one
    ///
    /// A result set without columns leaves the cache untouched.
    pub fn load(&mut self, keys: &mut dyn DbResultSet) -> DbResult<()> {
        let columns = keys.metadata().columns().to_vec();
        if columns.is_empty() {
            return Ok(());
        }
        let mut last = Vec::new();
        while keys.next()? {
            last.clear();
            for (i, column) in (1..).zip(&columns) {
                last.push(GeneratedKey {
                    catalog: column.catalog.clone(),
                    schema: column.schema.clone(),
                    table: column.table.clone(),
                    column: column.name.clone(),
                    value: keys.get_string(i)?,
                });
            }
        }
        log::trace!("cached {} generated keys", last.len());
        self.replace(last);
        Ok(())
    }

    /// Value for the first key matching `table` and `column`, ignoring case
    ///
    /// Either name may be omitted. With neither, the first key matches.
    /// Returns an empty string when nothing matches or the value is NULL.
    pub fn lookup(&self, table: Option<&str>, column: Option<&str>) -> String {
        let matches = |wanted: Option<&str>, actual: &str| {
            wanted.is_none_or(|wanted| wanted.eq_ignore_ascii_case(actual))
        };
        self.keys
            .iter()
            .flatten()
            .find(|key| matches(table, &key.table) && matches(column, &key.column))
            .and_then(|key| key.value.clone())
            .unwrap_or_default()
    }
}
