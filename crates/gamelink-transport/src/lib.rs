//! Transport abstraction layer for gamelink.
//!
//! Provides the [`Connection`] trait: one ordered, message-framed duplex
//! connection to a game server. The socket runtime only ever talks to a
//! `Connection`, so tests can swap in an in-memory implementation while
//! production code uses [`WebSocketConnection`].
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnection;

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection, used to tag log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single data frame as delivered by the connection.
///
/// Control frames (ping, pong, close) never surface here; they are handled
/// inside the [`Connection`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A UTF-8 text frame. The game protocol only uses these.
    Text(String),
    /// A binary frame.
    Binary(Vec<u8>),
}

impl Frame {
    /// Returns `true` for text frames.
    pub fn is_text(&self) -> bool {
        matches!(self, Frame::Text(_))
    }
}

/// A client-side duplex connection that can send and receive frames.
///
/// The methods return `Send` futures so the socket runtime can drive
/// `recv` from a spawned task while the application sends from its own.
/// Implementations must allow one `recv` and one `send` to be in flight at
/// the same time.
pub trait Connection: Send + Sync + 'static {
    /// Sends a frame to the remote peer.
    fn send(
        &self,
        frame: Frame,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next data frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection closed cleanly: a normal
    /// closure, going-away, or close without a status code, or after
    /// [`abort`](Self::abort) was called. Any other close status is an
    /// error.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Frame>, TransportError>> + Send;

    /// Starts the graceful close handshake.
    ///
    /// The connection stays readable until the peer answers, so a pending
    /// `recv` observes the close like any remote-initiated one.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Forces the connection closed without waiting for the peer.
    ///
    /// Any pending or future `recv` returns `Ok(None)`.
    fn abort(&self);

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
