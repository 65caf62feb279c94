//! Server configuration
//!
//! Settings come from an optional TOML file, and the binary overrides
//! them from the command line. Every field has a default except the port.
//!
//! ```toml
//! bind_address = "127.0.0.1"
//! port = 9001
//! trace = "info"
//! max_connections = 64
//!
//! [statement]
//! long_read_len = 4096
//! chop_blanks = true
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use dbdproxy_core::{Charset, ProxyError, ProxyResult};
use serde::Deserialize;

/// Property values every new statement starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatementDefaults {
    /// Maximum number of bytes or characters read from a long column
    pub long_read_len: i32,
    /// Silently truncate long columns instead of failing the fetch
    pub long_trunc_ok: bool,
    /// Strip trailing spaces from CHAR columns
    pub chop_blanks: bool,
    /// Read long columns completely, ignoring `long_read_len`
    pub long_read_all: bool,
}

impl Default for StatementDefaults {
    fn default() -> Self {
        Self {
            long_read_len: 80,
            long_trunc_ok: false,
            chop_blanks: false,
            long_read_all: false,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_address: String,
    /// TCP port; 0 means not configured
    pub port: u16,
    /// Log level, either a level name or one of the legacy trace names
    pub trace: String,
    /// Encoding used for strings until a client connects
    pub encoding: String,
    /// Maximum number of concurrent sessions
    pub max_connections: usize,
    pub statement: StatementDefaults,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 0,
            trace: "warn".to_string(),
            encoding: "ASCII".to_string(),
            max_connections: 256,
            statement: StatementDefaults::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document
    ///
    /// Missing fields take their defaults. The result is not validated.
    pub fn from_toml_str(text: &str) -> ProxyResult<Self> {
        toml::from_str(text).map_err(|e| ProxyError::Config(e.to_string()))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ProxyResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ProxyError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
            .map_err(|e| ProxyError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Check that the configuration can be served
    ///
    /// # Errors
    /// Returns `ProxyError::Config` naming the first invalid setting
    pub fn validate(&self) -> ProxyResult<()> {
        if self.port == 0 {
            return Err(ProxyError::Config("a listen port is required".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ProxyError::Config("max_connections must be at least 1".to_string()));
        }
        if self.statement.long_read_len < 0 {
            return Err(ProxyError::Config(format!(
                "long_read_len must not be negative (got {})",
                self.statement.long_read_len
            )));
        }
        self.socket_addr()?;
        self.bootstrap_charset()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> ProxyResult<SocketAddr> {
        let ip: IpAddr = self.bind_address.trim().parse().map_err(|_| {
            ProxyError::Config(format!("invalid bind address '{}'", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Encoding for strings read before the client's Connect
    pub fn bootstrap_charset(&self) -> ProxyResult<Charset> {
        Charset::for_name(&self.encoding)
            .map_err(|e| ProxyError::Config(format!("encoding: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_need_a_port() {
        let config = ServerConfig::default();
        assert_eq!(config.statement.long_read_len, 80);
        assert_eq!(config.max_connections, 256);
        assert!(matches!(config.validate(), Err(ProxyError::Config(_))));
        assert!(ServerConfig { port: 9001, ..config }.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = ServerConfig::from_toml_str(
            r#"
            port = 9001
            bind_address = "127.0.0.1"

            [statement]
            chop_blanks = true
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 9001);
        assert!(config.statement.chop_blanks);
        assert_eq!(config.statement.long_read_len, 80);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:9001");
        assert_eq!(config.bootstrap_charset().unwrap(), Charset::Ascii);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = ServerConfig::from_toml_str("port = 1\nprot = 2").unwrap_err();
        assert!(matches!(err, ProxyError::Config(_)));
    }

    #[test]
    fn test_validation_failures() {
        let base = ServerConfig {
            port: 9001,
            ..ServerConfig::default()
        };
        let bad_addr = ServerConfig {
            bind_address: "not-an-ip".into(),
            ..base.clone()
        };
        assert!(bad_addr.validate().is_err());
        let bad_encoding = ServerConfig {
            encoding: "no-such-encoding".into(),
            ..base.clone()
        };
        assert!(bad_encoding.validate().is_err());
        let no_sessions = ServerConfig {
            max_connections: 0,
            ..base
        };
        assert!(no_sessions.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = ServerConfig::from_file("/nonexistent/dbdproxy.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dbdproxy.toml"));
    }
}
