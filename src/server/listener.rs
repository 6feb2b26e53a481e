//! TCP listener for the RPC server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::rpc::Dispatcher;
use crate::Result;

use super::session::RpcSession;

/// RPC server that accepts TCP connections.
pub struct RpcServer {
    listener: TcpListener,
    semaphore: Arc<Semaphore>,
    max_connections: usize,
    idle_timeout: Duration,
    max_line_bytes: usize,
}

impl RpcServer {
    /// Create a new RpcServer bound to the configured address.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        info!("RPC server listening on {}", local_addr);

        Ok(Self {
            listener,
            semaphore: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            max_line_bytes: config.max_line_bytes,
        })
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Get the maximum number of connections allowed.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Get the number of available connection slots.
    pub fn available_connections(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get the number of active connections.
    pub fn active_connections(&self) -> usize {
        self.max_connections - self.semaphore.available_permits()
    }

    /// Accept a new connection.
    ///
    /// Waits until a connection slot is available (if max connections is
    /// reached) and then accepts the next incoming connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit)> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| crate::ConfabError::Io(std::io::Error::other("semaphore closed")))?;

        let (stream, addr) = self.listener.accept().await?;
        debug!("Accepted connection from {}", addr);

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    /// Run the server, serving every connection with `dispatcher`.
    ///
    /// Each connection gets its own task; a failing connection never affects
    /// the others or the directory.
    pub async fn run(self, dispatcher: Arc<Dispatcher>) -> Result<()> {
        loop {
            match self.accept().await {
                Ok((stream, addr, permit)) => {
                    let session = RpcSession::new(
                        stream,
                        addr,
                        Arc::clone(&dispatcher),
                        self.idle_timeout,
                        self.max_line_bytes,
                    );
                    tokio::spawn(async move {
                        session.run().await;
                        // Permit is dropped here, releasing the connection slot
                        drop(permit);
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// A permit that represents an active connection slot.
///
/// When this permit is dropped, the connection slot is released.
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_config(max_connections: usize) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_connections,
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_server_bind() {
        let server = RpcServer::bind(&test_config(10)).await.unwrap();

        assert!(server.local_addr().is_ok());
        assert_eq!(server.max_connections(), 10);
        assert_eq!(server.available_connections(), 10);
        assert_eq!(server.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_accept_connection() {
        let server = RpcServer::bind(&test_config(10)).await.unwrap();
        let addr = server.local_addr().unwrap();

        let client = TcpStream::connect(addr).await.unwrap();
        let (stream, peer_addr, _permit) = server.accept().await.unwrap();

        assert_eq!(peer_addr, client.local_addr().unwrap());
        assert_eq!(server.active_connections(), 1);
        assert_eq!(server.available_connections(), 9);

        drop(stream);
        drop(client);
    }

    #[tokio::test]
    async fn test_max_connections_limit() {
        let server = RpcServer::bind(&test_config(2)).await.unwrap();
        let addr = server.local_addr().unwrap();

        let _client1 = TcpStream::connect(addr).await.unwrap();
        let (_stream1, _, permit1) = server.accept().await.unwrap();

        let _client2 = TcpStream::connect(addr).await.unwrap();
        let (_stream2, _, permit2) = server.accept().await.unwrap();

        assert_eq!(server.active_connections(), 2);
        assert_eq!(server.available_connections(), 0);

        // The third connect succeeds at the TCP level, but accept() waits
        // for a free slot
        let _client3 = TcpStream::connect(addr).await.unwrap();
        drop(permit1);

        let (_stream3, _, _permit3) = server.accept().await.unwrap();
        assert_eq!(server.active_connections(), 2);

        drop(permit2);
    }

    #[tokio::test]
    async fn test_connection_read_write() {
        let server = RpcServer::bind(&test_config(10)).await.unwrap();
        let addr = server.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).await.unwrap();
        let (mut stream, _, _permit) = server.accept().await.unwrap();

        client.write_all(b"ping\n").await.unwrap();

        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping\n");
    }
}
