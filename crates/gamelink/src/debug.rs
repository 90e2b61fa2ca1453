//! Debug log streams.
//!
//! Servers publish log messages over separate WebSocket endpoints: one for
//! the whole server, one per game and one per player. A [`DebugSocket`]
//! subscribes to one of them and hands each message to its callbacks until
//! the stream closes.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gamelink_api::Endpoint;
use gamelink_transport::{Connection, Frame, WebSocketConnection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::registry::CallbackId;
use crate::{GameLinkError, SocketConfig};

/// Severity of a debug message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Trace,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Which severities the server should stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Severities {
    pub trace: bool,
    pub info: bool,
    pub warning: bool,
    pub error: bool,
}

impl Default for Severities {
    /// Everything except trace.
    fn default() -> Self {
        Self {
            trace: false,
            info: true,
            warning: true,
            error: true,
        }
    }
}

impl Severities {
    fn flags(&self) -> [(&'static str, bool); 4] {
        [
            ("trace", self.trace),
            ("info", self.info),
            ("warning", self.warning),
            ("error", self.error),
        ]
    }
}

/// One message of a debug stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DebugMessage {
    pub severity: Severity,
    pub message: String,
    /// Structured context, if the server attached any.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

type DebugHandler = Arc<dyn Fn(&DebugMessage) + Send + Sync>;

/// A subscription to one of a server's debug streams.
pub struct DebugSocket {
    endpoint: Endpoint,
    severities: Mutex<Severities>,
    callbacks: Mutex<Vec<(CallbackId, DebugHandler)>>,
    next_id: AtomicU64,
    connected: AtomicBool,
    conn: Mutex<Option<Arc<WebSocketConnection>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DebugSocket {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            severities: Mutex::new(Severities::default()),
            callbacks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            connected: AtomicBool::new(false),
            conn: Mutex::new(None),
        }
    }

    /// Resolves `url` like [`Socket::connect`](crate::Socket::connect) does.
    pub async fn resolve(url: &str) -> Result<Self, GameLinkError> {
        let tls_timeout = SocketConfig::from_env().tls_timeout;
        let endpoint = Endpoint::resolve(url, tls_timeout).await?;
        Ok(Self::new(endpoint))
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn severities(&self) -> Severities {
        *lock(&self.severities)
    }

    /// Chooses which severities to stream. Must be called before
    /// connecting.
    pub fn set_severities(&self, severities: Severities) -> Result<(), GameLinkError> {
        if self.connected.load(Ordering::SeqCst) {
            return Err(GameLinkError::Precondition(
                "severities cannot change after connecting",
            ));
        }
        *lock(&self.severities) = severities;
        Ok(())
    }

    /// Registers a callback for every message.
    pub fn on_message<F>(&self, handler: F) -> CallbackId
    where
        F: Fn(&DebugMessage) + Send + Sync + 'static,
    {
        let id = CallbackId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        lock(&self.callbacks).push((id, Arc::new(handler)));
        id
    }

    pub fn remove_callback(&self, id: CallbackId) {
        lock(&self.callbacks).retain(|(existing, _)| *existing != id);
    }

    /// Streams the server-wide log until it closes.
    pub async fn debug_server(&self) -> Result<(), GameLinkError> {
        self.stream(&["api", "debug"], None).await
    }

    /// Streams one game's log until it closes.
    pub async fn debug_game(&self, game_id: &str) -> Result<(), GameLinkError> {
        self.stream(&["api", "games", game_id, "debug"], None).await
    }

    /// Streams one player's log until it closes.
    pub async fn debug_player(
        &self,
        game_id: &str,
        player_id: &str,
        player_secret: &str,
    ) -> Result<(), GameLinkError> {
        self.stream(
            &["api", "games", game_id, "players", player_id, "debug"],
            Some(player_secret),
        )
        .await
    }

    /// Starts the close handshake; the running stream call then returns.
    pub async fn close(&self) -> Result<(), GameLinkError> {
        let conn = lock(&self.conn).clone();
        if let Some(conn) = conn {
            if let Err(e) = conn.close().await {
                debug!(error = %e, "debug close handshake failed");
                conn.abort();
            }
        }
        Ok(())
    }

    fn url(
        &self,
        segments: &[&str],
        player_secret: Option<&str>,
    ) -> Result<String, GameLinkError> {
        let mut query = Vec::with_capacity(5);
        if let Some(secret) = player_secret {
            query.push(("player_secret", secret));
        }
        for (name, enabled) in self.severities().flags() {
            query.push((name, if enabled { "true" } else { "false" }));
        }
        Ok(self.endpoint.ws_url_with(segments, &query)?)
    }

    async fn stream(
        &self,
        segments: &[&str],
        player_secret: Option<&str>,
    ) -> Result<(), GameLinkError> {
        let url = self.url(segments, player_secret)?;
        if self
            .connected
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(GameLinkError::Precondition("debug socket already connected"));
        }

        let conn = match WebSocketConnection::connect(&url).await {
            Ok(conn) => Arc::new(conn),
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };
        info!(conn_id = %conn.id(), path = %segments.join("/"), "debug stream opened");
        *lock(&self.conn) = Some(Arc::clone(&conn));

        let result = self.listen(&*conn).await;
        *lock(&self.conn) = None;
        result
    }

    /// Reads messages from `conn` until it closes.
    pub(crate) async fn listen<C: Connection>(&self, conn: &C) -> Result<(), GameLinkError> {
        let conn_id = conn.id();
        loop {
            let text = match conn.recv().await? {
                Some(Frame::Text(text)) => text,
                Some(Frame::Binary(_)) => {
                    warn!(%conn_id, "skipping binary debug frame");
                    continue;
                }
                None => {
                    info!(%conn_id, "debug stream closed");
                    return Ok(());
                }
            };

            let message: DebugMessage = match serde_json::from_str(&text) {
                Ok(message) => message,
                Err(e) => {
                    warn!(%conn_id, error = %e, "skipping undecodable debug message");
                    continue;
                }
            };

            let handlers: Vec<DebugHandler> = lock(&self.callbacks)
                .iter()
                .map(|(_, handler)| Arc::clone(handler))
                .collect();
            for handler in &handlers {
                handler(&message);
            }
        }
    }
}

impl fmt::Debug for DebugSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugSocket")
            .field("endpoint", &self.endpoint)
            .field("severities", &self.severities())
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .finish()
    }
}
