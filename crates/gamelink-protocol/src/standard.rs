//! Standard events: the reserved names the runtime itself understands.
//!
//! Everything not listed here is a game-specific event and is opaque to
//! the runtime.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Client → server: join an existing game under a username.
pub const JOIN_GAME: &str = "join_game";

/// Server → client: the join succeeded. Only sent to the joining client.
pub const JOINED_GAME: &str = "joined_game";

/// Client → server: reconnect an existing player.
pub const CONNECT: &str = "connect";

/// Server → client: the reconnect succeeded.
pub const CONNECTED: &str = "connected";

/// Client → server: watch a game without participating.
pub const SPECTATE: &str = "spectate";

/// Client → server: leave the game for good.
pub const LEAVE_GAME: &str = "leave_game";

/// Server → clients: a new player joined. The origin is the new player.
pub const NEW_PLAYER: &str = "new_player";

/// Server → clients: a player left. The origin is the leaving player.
pub const LEFT_GAME: &str = "left_game";

/// Server → clients: a player lost its connection.
pub const DISCONNECTED: &str = "disconnected";

/// Server → clients: a player reconnected.
pub const RECONNECTED: &str = "reconnected";

/// Server → client: roster snapshot, sent on join, reconnect and spectate.
pub const GAME_INFO: &str = "game_info";

/// Either direction: something went wrong.
pub const ERROR: &str = "error";

/// All standard event names.
pub const STANDARD_EVENTS: &[&str] = &[
    JOIN_GAME,
    JOINED_GAME,
    CONNECT,
    CONNECTED,
    SPECTATE,
    LEAVE_GAME,
    NEW_PLAYER,
    LEFT_GAME,
    DISCONNECTED,
    RECONNECTED,
    GAME_INFO,
    ERROR,
];

/// Returns `true` if `name` is one of the reserved event names.
pub fn is_standard_event(name: &str) -> bool {
    STANDARD_EVENTS.contains(&name)
}

/// Payload of [`JOIN_GAME`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGameData {
    pub game_id: String,
    pub username: String,
    /// Required by protected games.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_secret: Option<String>,
}

/// Payload of [`JOINED_GAME`].
///
/// Older servers leave `player_id` out and put the new id in the wrapper's
/// origin instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedGameData {
    #[serde(default)]
    pub player_id: String,
    pub secret: String,
}

/// Payload of [`CONNECT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectData {
    pub game_id: String,
    pub player_id: String,
    pub secret: String,
}

/// Payload of [`CONNECTED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedData {
    pub username: String,
}

/// Payload of [`SPECTATE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectateData {
    pub game_id: String,
}

/// Payload of [`NEW_PLAYER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayerData {
    pub username: String,
}

/// Payload of [`GAME_INFO`]: player id → username.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfoData {
    #[serde(default)]
    pub players: HashMap<String, String>,
}

/// Payload of [`ERROR`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    pub reason: String,
}
