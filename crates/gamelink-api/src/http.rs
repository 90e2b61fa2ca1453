//! [`GameApi`] over HTTP with `reqwest`.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{ConfigBody, RegisterPlayerBody, UsernameBody};
use crate::{
    ApiError, CreateGameRequest, CreatedGame, Endpoint, GameApi, RegisteredPlayer, ServerInfo,
};

const USER_AGENT: &str = concat!("gamelink/", env!("CARGO_PKG_VERSION"));

/// A [`GameApi`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl HttpApi {
    /// Talks to an already-resolved endpoint.
    pub fn new(endpoint: Endpoint) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, endpoint })
    }

    /// Resolves `url` (see [`Endpoint::resolve`]) and builds a client for it.
    pub async fn connect(url: &str, tls_timeout: Duration) -> Result<Self, ApiError> {
        let endpoint = Endpoint::resolve(url, tls_timeout).await?;
        Self::new(endpoint)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint.http_url(path);
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        let response = expect_status(response, StatusCode::OK).await?;
        Ok(response.json().await?)
    }
}

/// Passes `response` through if its status is `expected`; otherwise reads
/// the body into [`ApiError::Status`].
async fn expect_status(response: Response, expected: StatusCode) -> Result<Response, ApiError> {
    let got = response.status();
    if got == expected {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        expected: expected.as_u16(),
        got: got.as_u16(),
        body: body.trim().to_owned(),
    })
}

impl GameApi for HttpApi {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn fetch_info(&self) -> Result<ServerInfo, ApiError> {
        let info: ServerInfo = self.get_json("/api/info").await?;
        info.validate()
    }

    async fn create_game(&self, request: &CreateGameRequest) -> Result<CreatedGame, ApiError> {
        let url = self.endpoint.http_url("/api/games");
        debug!(%url, public = request.public, protected = request.protected, "POST");
        let response = self.client.post(url).json(request).send().await?;
        let response = expect_status(response, StatusCode::CREATED).await?;

        let mut created: CreatedGame = response.json().await?;
        created.join_secret = created.join_secret.filter(|secret| !secret.is_empty());
        Ok(created)
    }

    async fn register_player(
        &self,
        game_id: &str,
        username: &str,
        join_secret: Option<&str>,
    ) -> Result<RegisteredPlayer, ApiError> {
        let url = self.endpoint.http_url(&format!("/api/games/{game_id}/players"));
        debug!(%url, username, "POST");
        let body = RegisterPlayerBody {
            username,
            join_secret,
        };
        let response = self.client.post(url).json(&body).send().await?;
        let response = expect_status(response, StatusCode::CREATED).await?;
        Ok(response.json().await?)
    }

    async fn fetch_username(&self, game_id: &str, player_id: &str) -> Result<String, ApiError> {
        let body: UsernameBody = self
            .get_json(&format!("/api/games/{game_id}/players/{player_id}"))
            .await?;
        Ok(body.username)
    }

    async fn fetch_roster(&self, game_id: &str) -> Result<HashMap<String, String>, ApiError> {
        self.get_json(&format!("/api/games/{game_id}/players")).await
    }

    async fn fetch_game_config(&self, game_id: &str) -> Result<serde_json::Value, ApiError> {
        let body: ConfigBody = self.get_json(&format!("/api/games/{game_id}")).await?;
        Ok(body.config)
    }
}
