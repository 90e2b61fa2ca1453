//! The credentials a player needs to reconnect.

use serde::{Deserialize, Serialize};

/// A player's credentials for one game on one server.
///
/// `game_url` and `username` form the storage key and are not part of the
/// serialized record; the store fills them back in on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Trimmed server endpoint, e.g. `games.example.com:8080`.
    #[serde(skip)]
    pub game_url: String,

    /// Display name the player joined with.
    #[serde(skip)]
    pub username: String,

    pub game_id: String,
    pub player_id: String,
    pub player_secret: String,
}

impl Session {
    pub fn new(
        game_url: impl Into<String>,
        username: impl Into<String>,
        game_id: impl Into<String>,
        player_id: impl Into<String>,
        player_secret: impl Into<String>,
    ) -> Self {
        Self {
            game_url: game_url.into(),
            username: username.into(),
            game_id: game_id.into(),
            player_id: player_id.into(),
            player_secret: player_secret.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_serializes_only_credentials() {
        let session = Session::new("localhost:8080", "alice", "g1", "p1", "s1");
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "game_id": "g1",
                "player_id": "p1",
                "player_secret": "s1"
            })
        );
    }

    #[test]
    fn test_session_deserializes_without_key_fields() {
        let json = r#"{"game_id":"g1","player_id":"p1","player_secret":"s1"}"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert!(session.game_url.is_empty());
        assert!(session.username.is_empty());
        assert_eq!(session.player_id, "p1");
    }
}
