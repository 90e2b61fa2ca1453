//! Watches a game and logs roster changes.
//!
//! ```text
//! GAMELINK_URL=localhost:8080 GAMELINK_GAME=<game id> cargo run -p spectator
//! ```
//!
//! With `GAMELINK_USERNAME` set the demo plays instead of watching: it
//! restores the saved session for that name, or joins as a new player.

use gamelink::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "spectator failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), GameLinkError> {
    let url = std::env::var("GAMELINK_URL").unwrap_or_else(|_| "localhost:8080".into());
    let game_id = std::env::var("GAMELINK_GAME")
        .map_err(|_| GameLinkError::InvalidArgument("GAMELINK_GAME is not set".into()))?;

    let socket = Socket::connect(&url).await?;
    if let Some(info) = socket.server_info() {
        info!(game = %info.name, version = %info.version, "server found");
    }

    for name in [
        standard::NEW_PLAYER,
        standard::LEFT_GAME,
        standard::DISCONNECTED,
        standard::RECONNECTED,
    ] {
        socket.on(name, |origin, event| {
            info!(event = %event.name, player = %origin, data = %event.data, "roster changed");
        });
    }
    socket.on(standard::ERROR, |origin, event| {
        warn!(%origin, reason = %event.data["reason"], "error event");
    });

    match std::env::var("GAMELINK_USERNAME") {
        Ok(username) => {
            let session = match socket.restore_session(&username).await {
                Ok(session) => session,
                Err(e) => {
                    info!(error = %e, "no usable saved session, joining");
                    socket.join(&game_id, &username, None).await?
                }
            };
            info!(player_id = %session.player_id, "playing");
        }
        Err(_) => socket.spectate(&game_id).await?,
    }

    let players = socket.usernames();
    info!(count = players.len(), ?players, "roster");

    let events = socket.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            if let Err(e) = events.close().await {
                warn!(error = %e, "close failed");
            }
        }
    });

    socket.run_forever().await
}
