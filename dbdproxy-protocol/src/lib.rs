//! Message catalog for the BER database proxy
//!
//! Every request and response is a single APPLICATION-class BER value. A
//! response's tag is its request's tag plus 1000. This crate defines the
//! tag numbers, builds the registries that decode them, and converts
//! between decoded values and the typed [`Request`] and [`Response`] enums.
//!
//! # Message Flow
//!
//! ```text
//! client                          server
//!   | -- ConnectRequest ---------> |
//!   | <------------ ConnectResponse|
//!   | -- PrepareRequest ---------> |
//!   | <------ PrepareResponse(h)   |
//!   | -- ExecuteRequest(h, ...) -> |
//!   | <------ ExecuteResponse      |
//!   | -- FetchRequest(h) --------> |   (repeated until no data)
//!   | <------ FetchResponse        |
//!   | -- DisconnectRequest ------> |
//!   | <------ DisconnectResponse   |
//! ```
//!
//! Any request can instead be answered with an ErrorResponse.

pub mod hash;
pub mod module;
pub mod param;
pub mod request;
pub mod response;
pub mod tags;

pub use hash::BerHash;
pub use module::{request_module, response_module};
pub use param::Parameter;
pub use request::{
    ConnectRequest, ExecuteRequest, FuncRequest, GeneratedKeysRequest, PrepareRequest, Request,
};
pub use response::{
    ColumnData, DEFAULT_SQL_STATE, ErrorElement, ErrorResponse, PropertyValue, Response,
};
