//! dbdproxy server binary

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dbdproxy::server::{ProxyServer, ServerConfig};
use dbdproxy::trace_directive;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dbdproxy", version, about = "BER wire-protocol database proxy")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "DBD_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "DBD_PORT")]
    port: Option<u16>,

    /// Address to listen on
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (off, error, warn, info, debug, trace, or a legacy trace name)
    #[arg(short, long, env = "DBD_TRACE")]
    trace: Option<String>,

    /// Encoding for strings read before a client connects
    #[arg(long)]
    encoding: Option<String>,

    /// Maximum number of concurrent sessions
    #[arg(long)]
    max_connections: Option<usize>,
}

impl Cli {
    fn load_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => ServerConfig::default(),
        };
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        if let Some(trace) = &self.trace {
            config.trace = trace.clone();
        }
        if let Some(encoding) = &self.encoding {
            config.encoding = encoding.clone();
        }
        if let Some(max) = self.max_connections {
            config.max_connections = max;
        }
        Ok(config)
    }
}

fn init_logging(trace: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let Some(directive) = trace_directive(trace) else {
                bail!("unknown trace level '{}'", trace);
            };
            EnvFilter::new(directive)
        }
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_logging(&config.trace)?;

    let server = ProxyServer::new(config).context("invalid configuration")?;
    log::info!("dbdproxy {} starting", env!("CARGO_PKG_VERSION"));
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("cannot listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            log::info!("shutting down");
        })
        .await
        .context("server failed")?;
    Ok(())
}
