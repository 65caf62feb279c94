//! Database driver layer for the BER database proxy
//!
//! The server executes client requests through the traits in [`traits`].
//! Drivers are chosen by URL through a [`DriverManager`]. A SQLite driver
//! is built in behind the `sqlite` feature.

pub mod manager;
pub mod metadata;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;
pub mod value;

pub use manager::DriverManager;
pub use metadata::{ColumnMeta, Nullability, ResultSetMetaData};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDriver;
pub use traits::{
    Credentials, DbConnection, DbResultSet, DbStatement, Driver, ExecuteOutcome, LongStream,
};
pub use value::SqlValue;
