//! RPC client for the directory.
//!
//! Each call writes one request line and waits for the matching response, so
//! calls on a single client are strictly sequential. Logical failures come
//! back as `Ok(false)` or `Ok(None)`; anything that prevents the call from
//! completing is an `Err`.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

use crate::chat::{RoomInfo, UserInfo};
use crate::{ConfabError, Result};

use super::protocol::{Reply, Request, RequestEnvelope, ResponseEnvelope};

/// A connection to a directory server.
pub struct RpcClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_id: u64,
}

impl RpcClient {
    /// Connect to the server at the given address.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            next_id: 1,
        })
    }

    /// Send a raw line and read the raw response line.
    pub async fn send_line(&mut self, line: &str) -> Result<String> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        let mut response = String::new();
        let n = self.reader.read_line(&mut response).await?;
        if n == 0 {
            return Err(ConfabError::ConnectionClosed);
        }
        Ok(response.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Perform one request/response exchange.
    pub async fn call(&mut self, request: Request) -> Result<Reply> {
        let id = self.next_id;
        self.next_id += 1;

        let op = request.op_name();
        let line = serde_json::to_string(&RequestEnvelope::new(id, request))?;
        let response: ResponseEnvelope = serde_json::from_str(&self.send_line(&line).await?)?;
        debug!(id, op, "received response");

        if response.id.is_some() && response.id != Some(id) {
            return Err(ConfabError::UnexpectedReply(format!(
                "response id {:?} does not match request id {id}",
                response.id
            )));
        }

        response
            .into_result()
            .map_err(|e| ConfabError::Protocol {
                code: e.code,
                message: e.message,
            })
    }

    async fn call_bool(&mut self, request: Request) -> Result<bool> {
        match self.call(request).await? {
            Reply::Bool(value) => Ok(value),
            other => Err(unexpected("bool", &other)),
        }
    }

    /// Create a room.
    pub async fn create_room(&mut self, name: &str) -> Result<bool> {
        self.call_bool(Request::CreateRoom {
            name: name.to_string(),
        })
        .await
    }

    /// Remove a room.
    pub async fn remove_room(&mut self, name: &str) -> Result<bool> {
        self.call_bool(Request::RemoveRoom {
            name: name.to_string(),
        })
        .await
    }

    /// Look up a room.
    pub async fn search_room(&mut self, name: &str) -> Result<Option<RoomInfo>> {
        let request = Request::SearchRoom {
            name: name.to_string(),
        };
        match self.call(request).await? {
            Reply::Room(room) => Ok(room),
            other => Err(unexpected("room", &other)),
        }
    }

    /// Get the room listing for a user.
    pub async fn list_rooms(&mut self, username: &str) -> Result<String> {
        let request = Request::ListRooms {
            username: username.to_string(),
        };
        match self.call(request).await? {
            Reply::Listing(text) => Ok(text),
            other => Err(unexpected("listing", &other)),
        }
    }

    /// Register a user.
    pub async fn add_client(&mut self, username: &str) -> Result<Option<UserInfo>> {
        let request = Request::AddClient {
            username: username.to_string(),
        };
        match self.call(request).await? {
            Reply::User(user) => Ok(user),
            other => Err(unexpected("user", &other)),
        }
    }

    /// Deregister a user.
    pub async fn remove_client(&mut self, username: &str) -> Result<bool> {
        self.call_bool(Request::RemoveClient {
            username: username.to_string(),
        })
        .await
    }

    /// Look up a user.
    pub async fn search_client(&mut self, username: &str) -> Result<Option<UserInfo>> {
        let request = Request::SearchClient {
            username: username.to_string(),
        };
        match self.call(request).await? {
            Reply::User(user) => Ok(user),
            other => Err(unexpected("user", &other)),
        }
    }

    /// Join a room.
    pub async fn join_room(&mut self, username: &str, room: &str) -> Result<bool> {
        self.call_bool(Request::JoinRoom {
            username: username.to_string(),
            room: room.to_string(),
        })
        .await
    }

    /// Leave a room.
    pub async fn leave_room(&mut self, username: &str, room: &str) -> Result<bool> {
        self.call_bool(Request::LeaveRoom {
            username: username.to_string(),
            room: room.to_string(),
        })
        .await
    }

    /// Post a message to a room.
    pub async fn add_message(&mut self, username: &str, room: &str, body: &str) -> Result<bool> {
        self.call_bool(Request::AddMessage {
            username: username.to_string(),
            room: room.to_string(),
            body: body.to_string(),
        })
        .await
    }

    /// Read a room's rendered messages.
    pub async fn get_messages(&mut self, room: &str) -> Result<Option<Vec<String>>> {
        let request = Request::GetMessages {
            room: room.to_string(),
        };
        match self.call(request).await? {
            Reply::Messages(messages) => Ok(messages),
            other => Err(unexpected("messages", &other)),
        }
    }

    /// Check whether a user may post to a room.
    pub async fn can_send_message(&mut self, username: &str, room: &str) -> Result<bool> {
        self.call_bool(Request::CanSendMessage {
            username: username.to_string(),
            room: room.to_string(),
        })
        .await
    }
}

fn unexpected(expected: &str, reply: &Reply) -> ConfabError {
    ConfabError::UnexpectedReply(format!(
        "expected a {expected} reply, got {}",
        reply.kind()
    ))
}
