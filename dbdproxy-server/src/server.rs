//! Database proxy server
//!
//! Ties a validated [`ServerConfig`] and a set of drivers to a
//! [`ServerListener`].

use std::future::Future;

use dbdproxy_core::ProxyResult;
use dbdproxy_driver::DriverManager;

use crate::config::ServerConfig;
use crate::listener::ServerListener;
use crate::session::SessionContext;

/// BER database proxy server
///
/// # Usage Example
/// ```rust,no_run
/// # async fn demo() -> dbdproxy_core::ProxyResult<()> {
/// use dbdproxy_server::{ProxyServer, ServerConfig};
///
/// let config = ServerConfig::from_toml_str("port = 9001")?;
/// ProxyServer::new(config)?.run().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProxyServer {
    config: ServerConfig,
    drivers: DriverManager,
}

impl ProxyServer {
    /// Create a server with the built-in drivers
    ///
    /// # Errors
    /// Returns `ProxyError::Config` if `config` is invalid
    pub fn new(config: ServerConfig) -> ProxyResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            drivers: DriverManager::with_default_drivers(),
        })
    }

    /// Replace the drivers sessions connect with
    pub fn with_drivers(mut self, drivers: DriverManager) -> Self {
        self.drivers = drivers;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address without accepting yet
    pub async fn bind(self) -> ProxyResult<ServerListener> {
        let context = SessionContext::from_config(&self.config, self.drivers)?;
        log::info!(
            "starting server on port {} with {} driver(s)",
            self.config.port,
            context.drivers.len()
        );
        ServerListener::bind(self.config.socket_addr()?, context, self.config.max_connections).await
    }

    /// Serve until `shutdown` completes
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> ProxyResult<()> {
        self.bind().await?.serve_until(shutdown).await
    }

    /// Serve until the process ends
    pub async fn run(self) -> ProxyResult<()> {
        self.bind().await?.start().await
    }
}
