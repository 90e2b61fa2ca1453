//! Request and response bodies of the REST API.

use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Response of `GET /api/info`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerInfo {
    /// Machine name of the game, e.g. `tictactoe`.
    pub name: String,
    /// Protocol version the server speaks.
    pub cg_version: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Version of the game itself.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub repository_url: String,
}

impl ServerInfo {
    /// Rejects infos missing `name` or `cg_version`.
    pub fn validate(self) -> Result<Self, ApiError> {
        if self.name.is_empty() {
            return Err(ApiError::InvalidInfo("name"));
        }
        if self.cg_version.is_empty() {
            return Err(ApiError::InvalidInfo("cg_version"));
        }
        Ok(self)
    }
}

/// Body of `POST /api/games`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateGameRequest {
    /// Listed in the server's public game list.
    pub public: bool,
    /// Joining requires the join secret returned on creation.
    pub protected: bool,
    /// Game-specific configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl CreateGameRequest {
    pub fn new(public: bool) -> Self {
        Self {
            public,
            ..Self::default()
        }
    }

    pub fn protected(mut self, protected: bool) -> Self {
        self.protected = protected;
        self
    }

    /// Attaches a game configuration.
    pub fn with_config<T: Serialize>(mut self, config: &T) -> Result<Self, ApiError> {
        self.config = Some(serde_json::to_value(config).map_err(ApiError::Encode)?);
        Ok(self)
    }
}

/// Response of `POST /api/games`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedGame {
    pub game_id: String,
    /// Only present for protected games.
    #[serde(default)]
    pub join_secret: Option<String>,
}

/// Response of `POST /api/games/{id}/players`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredPlayer {
    pub player_id: String,
    pub player_secret: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterPlayerBody<'a> {
    pub username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_secret: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsernameBody {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfigBody {
    #[serde(default)]
    pub config: serde_json::Value,
}
