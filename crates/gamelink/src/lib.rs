//! # gamelink
//!
//! Client runtime for event-based game servers.
//!
//! A game server speaks a small JSON protocol over WebSocket: the client
//! joins, reconnects to or spectates a game with a handshake, then both
//! sides exchange named events. [`Socket`] drives that protocol. It
//! performs the handshake, persists the player's credentials, queues
//! incoming events and hands each one to the callbacks registered for its
//! name.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gamelink::prelude::*;
//!
//! # async fn run() -> Result<(), GameLinkError> {
//! let socket = Socket::connect("localhost:8080").await?;
//! socket.on("move", |origin, event| {
//!     println!("{origin} played {}", event.data);
//! });
//! socket.join("g1", "alice", None).await?;
//! socket.send("move", &serde_json::json!({ "x": 1, "y": 2 })).await?;
//! socket.run_forever().await
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! gamelink-transport   frames over a WebSocket
//! gamelink-protocol    events, envelopes, standard event names
//! gamelink-api         the server's REST endpoints
//! gamelink-session     persisted player credentials
//! gamelink             setup handshake, receive loop, callbacks
//! ```

mod cache;
mod config;
mod correlator;
mod debug;
mod error;
mod listener;
mod registry;
mod socket;
mod state;

#[cfg(test)]
mod mock;

pub use cache::UsernameCache;
pub use config::SocketConfig;
pub use debug::{DebugMessage, DebugSocket, Severities, Severity};
pub use error::GameLinkError;
pub use registry::{CallbackId, CallbackRegistry, EventHandler};
pub use socket::Socket;
pub use state::{CloseReason, ConnectionState};

pub use gamelink_api as api;
pub use gamelink_protocol as protocol;
pub use gamelink_session as session;
pub use gamelink_transport as transport;

/// The types most applications need.
pub mod prelude {
    pub use crate::{
        CallbackId, CloseReason, ConnectionState, DebugSocket, GameLinkError, Socket,
        SocketConfig,
    };
    pub use gamelink_api::{CreateGameRequest, CreatedGame, RegisteredPlayer, ServerInfo};
    pub use gamelink_protocol::{Event, EventWrapper, Origin, standard};
    pub use gamelink_session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
}
