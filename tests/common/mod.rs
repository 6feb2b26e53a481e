//! Test helpers for RPC integration tests.
//!
//! Provides a TestServer running the RPC listener on a random port and a
//! RawClient for exchanging hand-written protocol lines.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use confab::config::ServerConfig;
use confab::{Directory, Dispatcher, Limits, RpcClient, RpcServer};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// An RPC server running in the background.
pub struct TestServer {
    addr: SocketAddr,
    directory: Arc<Directory>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with default limits.
    pub async fn start() -> Self {
        Self::with_config(test_config(), Limits::default()).await
    }

    /// Start a server with custom configuration.
    pub async fn with_config(config: ServerConfig, limits: Limits) -> Self {
        let directory = Arc::new(Directory::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&directory), limits));

        let server = RpcServer::bind(&config).await.unwrap();
        let addr = server.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = server.run(dispatcher).await;
        });

        Self {
            addr,
            directory,
            handle,
        }
    }

    /// Get the local address of the server.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the directory behind the server.
    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    /// Connect a typed client.
    pub async fn client(&self) -> RpcClient {
        RpcClient::connect(self.addr).await.unwrap()
    }

    /// Connect a raw line client.
    pub async fn raw_client(&self) -> RawClient {
        RawClient::connect(self.addr).await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Create a server configuration bound to a random local port.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_connections: 16,
        ..ServerConfig::default()
    }
}

/// A client that speaks raw protocol lines.
pub struct RawClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl RawClient {
    /// Connect to the server at the given address.
    pub async fn connect(addr: SocketAddr) -> Result<Self, std::io::Error> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }

    /// Send raw bytes to the server.
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<(), std::io::Error> {
        self.writer.write_all(data).await?;
        self.writer.flush().await
    }

    /// Send a line terminated by `\n`.
    pub async fn send_line(&mut self, line: &str) -> Result<(), std::io::Error> {
        self.send_raw(line.as_bytes()).await?;
        self.send_raw(b"\n").await
    }

    /// Receive one response line, or None once the server closes the
    /// connection.
    pub async fn recv_line(&mut self) -> Result<Option<String>, std::io::Error> {
        let mut line = String::new();
        let n = timeout(DEFAULT_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "no response"))??;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end().to_string()))
    }

    /// Send a line and parse the response as JSON.
    pub async fn request(&mut self, line: &str) -> serde_json::Value {
        self.send_line(line).await.unwrap();
        let response = self.recv_line().await.unwrap().expect("connection closed");
        serde_json::from_str(&response).unwrap()
    }
}
