//! Per-connection request loop for the RPC server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::rpc::{Dispatcher, ErrorCode, ProtocolError, ResponseEnvelope};
use crate::{ConfabError, Result};

/// Outcome of reading one request line.
#[derive(Debug, PartialEq, Eq)]
enum ReadOutcome {
    /// A complete line, without its terminator.
    Line(Vec<u8>),
    /// The line exceeded the maximum length.
    TooLong,
    /// The peer closed the connection.
    Eof,
}

/// A connected RPC caller.
pub struct RpcSession {
    /// Unique session identifier.
    id: Uuid,
    /// Remote peer address.
    peer_addr: SocketAddr,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    dispatcher: Arc<Dispatcher>,
    idle_timeout: Duration,
    max_line_bytes: usize,
    /// Number of requests answered so far.
    requests: u64,
}

impl RpcSession {
    /// Create a new session from a TCP stream.
    pub fn new(
        stream: TcpStream,
        peer_addr: SocketAddr,
        dispatcher: Arc<Dispatcher>,
        idle_timeout: Duration,
        max_line_bytes: usize,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!("Created new session {} for {}", id, peer_addr);

        let (read_half, write_half) = stream.into_split();
        Self {
            id,
            peer_addr,
            reader: BufReader::new(read_half),
            writer: write_half,
            dispatcher,
            idle_timeout,
            max_line_bytes,
            requests: 0,
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the peer address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Serve requests until the peer disconnects, goes idle, or the
    /// connection fails.
    pub async fn run(mut self) {
        info!("Session {} connected from {}", self.id, self.peer_addr);
        match self.serve().await {
            Ok(()) => info!(
                "Session {} closed after {} requests",
                self.id, self.requests
            ),
            Err(e) => warn!("Session {} ended with error: {}", self.id, e),
        }
    }

    async fn serve(&mut self) -> Result<()> {
        loop {
            let outcome = match timeout(self.idle_timeout, self.read_line()).await {
                Ok(outcome) => outcome?,
                Err(_) => {
                    debug!("Session {} idle for {:?}, closing", self.id, self.idle_timeout);
                    return Ok(());
                }
            };

            match outcome {
                ReadOutcome::Eof => return Ok(()),
                ReadOutcome::TooLong => {
                    let error = ProtocolError::new(
                        ErrorCode::LineTooLong,
                        format!("request exceeds {} bytes", self.max_line_bytes),
                    );
                    self.write_response(&ResponseEnvelope::error(None, error))
                        .await?;
                    return Ok(());
                }
                ReadOutcome::Line(bytes) => {
                    let response = match std::str::from_utf8(&bytes) {
                        Ok(line) if line.trim().is_empty() => continue,
                        Ok(line) => self.dispatcher.handle_line(line),
                        Err(_) => ResponseEnvelope::error(
                            None,
                            ProtocolError::malformed("request is not valid UTF-8"),
                        ),
                    };
                    self.requests += 1;
                    self.write_response(&response).await?;
                }
            }
        }
    }

    /// Read one newline-terminated line of at most `max_line_bytes` bytes,
    /// not counting the `\n` or `\r\n` terminator.
    async fn read_line(&mut self) -> Result<ReadOutcome> {
        let limit = self.max_line_bytes as u64 + 2;
        let mut buf = Vec::new();
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut buf)
            .await?;

        if n == 0 {
            return Ok(ReadOutcome::Eof);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > self.max_line_bytes {
            return Ok(ReadOutcome::TooLong);
        }
        // Final line may arrive without a terminator
        Ok(ReadOutcome::Line(buf))
    }

    async fn write_response(&mut self, response: &ResponseEnvelope) -> Result<()> {
        let mut line = serde_json::to_vec(response).map_err(ConfabError::Json)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Directory;
    use crate::rpc::Limits;
    use tokio::net::TcpListener;

    async fn session_pair(max_line_bytes: usize, idle: Duration) -> (RpcSession, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(Directory::new()),
            Limits::default(),
        ));
        let session = RpcSession::new(stream, peer, dispatcher, idle, max_line_bytes);
        (session, client)
    }

    #[tokio::test]
    async fn test_read_line() {
        let (mut session, mut client) = session_pair(64, Duration::from_secs(5)).await;
        client.write_all(b"first\r\nsecond\n").await.unwrap();

        assert_eq!(
            session.read_line().await.unwrap(),
            ReadOutcome::Line(b"first".to_vec())
        );
        assert_eq!(
            session.read_line().await.unwrap(),
            ReadOutcome::Line(b"second".to_vec())
        );

        drop(client);
        assert_eq!(session.read_line().await.unwrap(), ReadOutcome::Eof);
    }

    #[tokio::test]
    async fn test_read_line_too_long() {
        let (mut session, mut client) = session_pair(4, Duration::from_secs(5)).await;
        client.write_all(b"abcdefgh\n").await.unwrap();

        assert_eq!(session.read_line().await.unwrap(), ReadOutcome::TooLong);
    }

    #[tokio::test]
    async fn test_read_line_at_limit() {
        let (mut session, mut client) = session_pair(4, Duration::from_secs(5)).await;
        client.write_all(b"abcd\nefgh\r\n").await.unwrap();

        assert_eq!(
            session.read_line().await.unwrap(),
            ReadOutcome::Line(b"abcd".to_vec())
        );
        assert_eq!(
            session.read_line().await.unwrap(),
            ReadOutcome::Line(b"efgh".to_vec())
        );
    }

    #[tokio::test]
    async fn test_read_line_one_over_limit_with_crlf() {
        let (mut session, mut client) = session_pair(4, Duration::from_secs(5)).await;
        client.write_all(b"abcde\r\n").await.unwrap();

        assert_eq!(session.read_line().await.unwrap(), ReadOutcome::TooLong);
    }

    #[tokio::test]
    async fn test_session_answers_request() {
        let (session, client) = session_pair(1024, Duration::from_secs(5)).await;
        let handle = tokio::spawn(session.run());

        let (read_half, mut write_half) = client.into_split();
        let mut reader = BufReader::new(read_half);
        write_half
            .write_all(b"{\"v\":1,\"id\":1,\"op\":\"create_room\",\"name\":\"general\"}\n")
            .await
            .unwrap();

        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        let response: ResponseEnvelope = serde_json::from_str(&line).unwrap();
        assert_eq!(response.id, Some(1));
        assert_eq!(response.ok, Some(crate::rpc::Reply::Bool(true)));

        drop(write_half);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_session_closes_when_idle() {
        let (session, client) = session_pair(1024, Duration::from_millis(50)).await;
        let handle = tokio::spawn(session.run());

        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(result.is_ok(), "idle session should close on its own");

        let mut client = client;
        let mut buf = [0u8; 1];
        assert_eq!(client.read(&mut buf).await.unwrap(), 0);
    }
}
