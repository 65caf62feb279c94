//! Core types and utilities for the BER database proxy
//!
//! This crate provides the error types, the character encoding contract and
//! the SQL type codes shared by the codec, the protocol catalog, the driver
//! layer and the server.

pub mod charset;
pub mod dbd;
pub mod error;
pub mod keys;
pub mod sql_type;

pub use charset::Charset;
pub use dbd::{DbdError, DbdErrorKind};
pub use error::{DbError, DbResult, ProxyError, ProxyResult};
pub use keys::KeyRequest;
