//! dbdproxy - a BER wire-protocol database proxy
//!
//! Clients speak a small request/response protocol encoded in ASN.1 BER
//! over TCP. The server runs each request against a database connection
//! it holds on the client's behalf.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `dbdproxy-core`: Errors, proxy error kinds, encodings and SQL type codes
//! - `dbdproxy-ber`: BER identifiers, lengths, values and the decoding registry
//! - `dbdproxy-protocol`: Request and response messages
//! - `dbdproxy-driver`: Database driver traits and the SQLite driver
//! - `dbdproxy-server`: Sessions, configuration and the TCP listener
//!
//! # Usage
//!
//! ```no_run
//! use dbdproxy::server::{ProxyServer, ServerConfig};
//!
//! # async fn demo() -> dbdproxy::ProxyResult<()> {
//! let config = ServerConfig::from_file("dbdproxy.toml")?;
//! ProxyServer::new(config)?.run().await
//! # }
//! ```

// Re-export core types
pub use dbdproxy_core::{Charset, DbError, DbdError, DbdErrorKind, ProxyError, ProxyResult};

pub mod ber {
    pub use dbdproxy_ber::*;
}

pub mod protocol {
    pub use dbdproxy_protocol::*;
}

pub mod driver {
    pub use dbdproxy_driver::*;
}

pub mod server {
    pub use dbdproxy_server::*;
}

/// Filter directive for a log level name
///
/// Accepts the standard level names as well as the legacy trace names
/// `silent`, `fatal`, `brief`, `verbose`, `tedious` and `abusive`.
/// Returns `None` for anything else.
pub fn trace_directive(name: &str) -> Option<&'static str> {
    let directive = match name.trim().to_ascii_lowercase().as_str() {
        "silent" | "off" => "off",
        "fatal" | "error" => "error",
        "brief" | "warn" => "warn",
        "verbose" | "info" => "info",
        "tedious" | "debug" => "debug",
        "abusive" | "trace" | "all" => "trace",
        _ => return None,
    };
    Some(directive)
}
