#[allow(dead_code)]
mod common;

use common::FakeServer;
use gamelink_api::{ApiError, CreateGameRequest, GameApi};

#[tokio::test]
async fn fetch_info_returns_validated_info() {
    let server = FakeServer::respond(
        200,
        r#"{"name":"tictactoe","cg_version":"0.7","display_name":"Tic Tac Toe"}"#,
    )
    .await;

    let info = server.api().fetch_info().await.unwrap();
    assert_eq!(info.name, "tictactoe");
    assert_eq!(info.cg_version, "0.7");
    assert_eq!(info.display_name, "Tic Tac Toe");

    let requests = server.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/api/info");
}

#[tokio::test]
async fn fetch_info_rejects_empty_name() {
    let server = FakeServer::respond(200, r#"{"name":"","cg_version":"0.7"}"#).await;
    let result = server.api().fetch_info().await;
    assert!(matches!(result, Err(ApiError::InvalidInfo("name"))));
}

#[tokio::test]
async fn create_game_posts_request() {
    let server =
        FakeServer::respond(201, r#"{"game_id":"g1","join_secret":"js"}"#).await;

    let request = CreateGameRequest::new(true).protected(true);
    let created = server.api().create_game(&request).await.unwrap();
    assert_eq!(created.game_id, "g1");
    assert_eq!(created.join_secret.as_deref(), Some("js"));

    let recorded = &server.requests()[0];
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.path, "/api/games");
    let body: serde_json::Value = serde_json::from_str(&recorded.body).unwrap();
    assert_eq!(body, serde_json::json!({"public": true, "protected": true}));
}

#[tokio::test]
async fn create_game_empty_join_secret_is_none() {
    let server = FakeServer::respond(201, r#"{"game_id":"g1","join_secret":""}"#).await;
    let created = server
        .api()
        .create_game(&CreateGameRequest::new(false))
        .await
        .unwrap();
    assert!(created.join_secret.is_none());
}

#[tokio::test]
async fn create_game_requires_created_status() {
    let server = FakeServer::respond(200, r#"{"game_id":"g1"}"#).await;
    let result = server.api().create_game(&CreateGameRequest::new(true)).await;
    assert!(matches!(
        result,
        Err(ApiError::Status {
            expected: 201,
            got: 200,
            ..
        })
    ));
}

#[tokio::test]
async fn register_player_returns_credentials() {
    let server =
        FakeServer::respond(201, r#"{"player_id":"p1","player_secret":"s1"}"#).await;

    let player = server
        .api()
        .register_player("g1", "alice", Some("js"))
        .await
        .unwrap();
    assert_eq!(player.player_id, "p1");
    assert_eq!(player.player_secret, "s1");

    let recorded = &server.requests()[0];
    assert_eq!(recorded.path, "/api/games/g1/players");
    let body: serde_json::Value = serde_json::from_str(&recorded.body).unwrap();
    assert_eq!(body, serde_json::json!({"username": "alice", "join_secret": "js"}));
}

#[tokio::test]
async fn register_player_error_carries_body() {
    let server = FakeServer::respond(403, "wrong join secret").await;
    let err = server
        .api()
        .register_player("g1", "alice", None)
        .await
        .unwrap_err();
    match err {
        ApiError::Status { got, body, .. } => {
            assert_eq!(got, 403);
            assert_eq!(body, "wrong join secret");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_username_reads_username_field() {
    let server = FakeServer::respond(200, r#"{"username":"bob"}"#).await;
    let username = server.api().fetch_username("g1", "p2").await.unwrap();
    assert_eq!(username, "bob");
    assert_eq!(server.requests()[0].path, "/api/games/g1/players/p2");
}

#[tokio::test]
async fn fetch_roster_reads_map() {
    let server = FakeServer::respond(200, r#"{"p1":"alice","p2":"bob"}"#).await;
    let roster = server.api().fetch_roster("g1").await.unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster["p2"], "bob");
    assert_eq!(server.requests()[0].path, "/api/games/g1/players");
}

#[tokio::test]
async fn fetch_game_config_unwraps_config() {
    let server = FakeServer::respond(200, r#"{"config":{"size":3}}"#).await;
    let config = server.api().fetch_game_config("g1").await.unwrap();
    assert_eq!(config, serde_json::json!({"size": 3}));
    assert_eq!(server.requests()[0].path, "/api/games/g1");
}

#[tokio::test]
async fn get_non_ok_status_is_error() {
    let server = FakeServer::respond(404, "").await;
    let result = server.api().fetch_roster("missing").await;
    assert!(matches!(
        result,
        Err(ApiError::Status {
            expected: 200,
            got: 404,
            ..
        })
    ));
}
