//! REST discovery and handshake calls for gamelink servers.
//!
//! A game server exposes a small HTTP API next to its WebSocket endpoint:
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | GET  | `/api/info` | server name and protocol version |
//! | POST | `/api/games` | create a game instance |
//! | GET  | `/api/games/{id}` | game configuration |
//! | POST | `/api/games/{id}/players` | register a player |
//! | GET  | `/api/games/{id}/players` | roster (player id → username) |
//! | GET  | `/api/games/{id}/players/{pid}` | one player's username |
//!
//! [`GameApi`] is the seam the socket runtime depends on; [`HttpApi`] is the
//! `reqwest` implementation.

use std::collections::HashMap;
use std::future::Future;

mod endpoint;
mod error;
mod http;
mod types;

pub use endpoint::{Endpoint, trim_url};
pub use error::ApiError;
pub use http::HttpApi;
pub use types::{CreateGameRequest, CreatedGame, RegisteredPlayer, ServerInfo};

/// The discovery/handshake collaborator.
///
/// Every method is a single request/response round trip against the
/// server behind [`endpoint`](GameApi::endpoint).
pub trait GameApi: Send + Sync + 'static {
    /// The server this client talks to.
    fn endpoint(&self) -> &Endpoint;

    /// Fetches and validates the server's self-description.
    fn fetch_info(&self) -> impl Future<Output = Result<ServerInfo, ApiError>> + Send;

    /// Creates a new game instance.
    fn create_game(
        &self,
        request: &CreateGameRequest,
    ) -> impl Future<Output = Result<CreatedGame, ApiError>> + Send;

    /// Registers a new player in `game_id`.
    fn register_player(
        &self,
        game_id: &str,
        username: &str,
        join_secret: Option<&str>,
    ) -> impl Future<Output = Result<RegisteredPlayer, ApiError>> + Send;

    /// Looks up a single player's username.
    fn fetch_username(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// Fetches the full roster of `game_id`.
    fn fetch_roster(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<HashMap<String, String>, ApiError>> + Send;

    /// Fetches the game's configuration as raw JSON.
    fn fetch_game_config(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<serde_json::Value, ApiError>> + Send;
}
