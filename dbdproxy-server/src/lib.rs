//! Server side of the BER database proxy
//!
//! A client opens a TCP connection, sends a Connect request naming a
//! database URL, and then drives statements through Prepare, Execute and
//! Fetch requests. Each connection gets its own [`Session`], which owns
//! one database connection and every statement prepared on it.

pub mod coerce;
pub mod config;
pub mod func;
pub mod holder;
pub mod keys;
pub mod listener;
pub mod lob;
pub mod server;
pub mod session;

pub use config::{ServerConfig, StatementDefaults};
pub use holder::{StatementHolder, StatementProperties};
pub use keys::{GeneratedKey, KeyCache};
pub use listener::ServerListener;
pub use server::ProxyServer;
pub use session::{Session, SessionContext, SessionState};
