//! TCP listener
//!
//! Accepts client connections and runs one [`Session`] per connection on
//! the blocking thread pool. Sessions never share state, so the only
//! coordination is a semaphore capping how many run at once.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use dbdproxy_core::{ProxyError, ProxyResult};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::session::{Session, SessionContext};

/// Server listener for accepting client connections
///
/// # Usage Example
/// ```rust,no_run
/// # async fn demo(context: dbdproxy_server::SessionContext) -> dbdproxy_core::ProxyResult<()> {
/// use dbdproxy_server::ServerListener;
///
/// let listener = ServerListener::bind("0.0.0.0:9001".parse().unwrap(), context, 64).await?;
/// listener.start().await?;
/// # Ok(())
/// # }
/// ```
pub struct ServerListener {
    listener: TcpListener,
    context: Arc<SessionContext>,
    permits: Arc<Semaphore>,
}

impl ServerListener {
    /// Bind to `address`
    ///
    /// At most `max_connections` sessions are served at once; further
    /// clients wait in the accept backlog.
    ///
    /// # Errors
    /// Returns an I/O error naming the address if binding fails
    pub async fn bind(
        address: SocketAddr,
        context: SessionContext,
        max_connections: usize,
    ) -> ProxyResult<Self> {
        let listener = TcpListener::bind(address).await.map_err(|e| {
            ProxyError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", address, e),
            ))
        })?;
        log::info!("listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            context: Arc::new(context),
            permits: Arc::new(Semaphore::new(max_connections.max(1))),
        })
    }

    pub fn local_addr(&self) -> ProxyResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the process ends
    pub async fn start(self) -> ProxyResult<()> {
        self.serve_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` completes
    ///
    /// Sessions already running are not interrupted; they end when their
    /// client disconnects.
    pub async fn serve_until(self, shutdown: impl Future<Output = ()>) -> ProxyResult<()> {
        tokio::pin!(shutdown);
        loop {
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                permit = self.permits.clone().acquire_owned() => {
                    permit.map_err(|e| ProxyError::Protocol(e.to_string()))?
                }
            };
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        log::error!("Error accepting connection: {}", e);
                        continue;
                    }
                },
            };
            log::info!("Accepted connection from {}", peer);

            let context = Arc::clone(&self.context);
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                if let Err(e) = serve_client(stream, peer, &context) {
                    log::error!("Error handling connection from {}: {}", peer, e);
                }
            });
        }
        log::info!("listener on {} stopped", self.local_addr()?);
        Ok(())
    }
}

/// Run one session on a blocking copy of `stream`
fn serve_client(stream: TcpStream, peer: SocketAddr, context: &SessionContext) -> ProxyResult<()> {
    let stream = stream.into_std()?;
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    let reader = stream.try_clone()?;
    Session::new(reader, stream, context)
        .with_peer(peer.to_string())
        .run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatementDefaults;
    use dbdproxy_ber::{BerContents, BerObject};
    use dbdproxy_core::Charset;
    use dbdproxy_driver::DriverManager;
    use dbdproxy_protocol::{BerHash, ConnectRequest, Request, Response, request_module, response_module};
    use std::io::Write;

    fn context() -> SessionContext {
        SessionContext::new(
            request_module(Charset::Ascii).unwrap(),
            DriverManager::with_default_drivers(),
            StatementDefaults::default(),
        )
    }

    fn round_trip(address: SocketAddr, request: &Request, stream: &mut std::net::TcpStream) -> BerObject {
        let module = response_module(Charset::PLATFORM_DEFAULT).unwrap();
        stream.write_all(&request.to_ber(Charset::PLATFORM_DEFAULT).encode()).unwrap();
        module
            .read_from(stream)
            .unwrap()
            .unwrap_or_else(|| panic!("{} closed the connection", address))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_serves_clients_until_shutdown() {
        let listener = ServerListener::bind("127.0.0.1:0".parse().unwrap(), context(), 4)
            .await
            .unwrap();
        let address = listener.local_addr().unwrap();
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(listener.serve_until(async {
            let _ = stopped.await;
        }));

        let client = tokio::task::spawn_blocking(move || {
            let mut stream = std::net::TcpStream::connect(address).unwrap();
            let connect = Request::Connect(ConnectRequest::new(
                "jdbc:sqlite::memory:",
                None,
                None,
                "",
                BerHash::new(),
                Charset::Ascii,
            ));
            let charset = Charset::PLATFORM_DEFAULT;
            assert!(round_trip(address, &Request::Ping, &mut stream).identifier().is_constructed());
            assert_eq!(round_trip(address, &connect, &mut stream), Response::Connect.to_ber(charset));
            assert_eq!(
                round_trip(address, &Request::Ping, &mut stream),
                Response::Ping { alive: true }.to_ber(charset)
            );
            assert_eq!(
                round_trip(address, &Request::Disconnect, &mut stream),
                Response::Disconnect.to_ber(charset)
            );
        });
        client.await.unwrap();

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bind_failure_names_address() {
        let first = ServerListener::bind("127.0.0.1:0".parse().unwrap(), context(), 1)
            .await
            .unwrap();
        let taken = first.local_addr().unwrap();
        let err = ServerListener::bind(taken, context(), 1).await.err().unwrap();
        assert!(err.to_string().contains(&taken.to_string()));
    }
}
