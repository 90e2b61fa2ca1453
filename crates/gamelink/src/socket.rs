//! The client socket: setup, sending, draining and teardown.
//!
//! A [`Socket`] starts `Idle` with a live connection. One setup call
//! (`join`, `connect_player`, `spectate` or `restore_session`) performs the
//! handshake through the correlator and then starts the receive loop. From
//! then on events queue up until the application drains them with
//! [`run_forever`](Socket::run_forever) or [`pump_one`](Socket::pump_one),
//! and every drained event goes through the callback registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gamelink_api::{CreateGameRequest, CreatedGame, GameApi, HttpApi, RegisteredPlayer, ServerInfo};
use gamelink_protocol::standard::{
    self, ConnectData, ConnectedData, GameInfoData, JoinGameData, JoinedGameData, NewPlayerData,
    SpectateData,
};
use gamelink_protocol::{
    Event, EventWrapper, JsonCodec, Origin, PROTOCOL_VERSION, ProtocolError, check_version,
    encode_event,
};
use gamelink_session::{FileSessionStore, Session, SessionStore};
use gamelink_transport::{Connection, WebSocketConnection};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::registry::CallbackId;
use crate::state::{ConnectionState, Lifecycle};
use crate::{CallbackRegistry, GameLinkError, SocketConfig, UsernameCache, correlator, listener};

/// A connection to a game server.
///
/// Cheap to clone; clones share the connection, callbacks and caches.
/// Defaults to a WebSocket connection, the HTTP API and file-backed
/// session storage; [`from_parts`](Socket::from_parts) accepts any
/// implementations of the three seams.
pub struct Socket<C: Connection = WebSocketConnection, A = HttpApi, S = FileSessionStore> {
    inner: Arc<Inner<C, A, S>>,
}

struct Inner<C: Connection, A, S> {
    conn: Arc<C>,
    api: A,
    store: S,
    codec: JsonCodec,
    config: SocketConfig,
    info: Option<ServerInfo>,
    registry: CallbackRegistry,
    usernames: Arc<UsernameCache>,
    lifecycle: Lifecycle,
    session: Mutex<Option<Session>>,
    queue: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<EventWrapper>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Connection, A, S> Drop for Inner<C, A, S> {
    fn drop(&mut self) {
        let listener = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = listener {
            handle.abort();
        }
        self.conn.abort();
    }
}

impl<C: Connection, A, S> Clone for Socket<C, A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Socket {
    /// Connects to the server at `url` with configuration from the
    /// environment and sessions stored in the user's data directory.
    ///
    /// See [`connect_with`](Socket::connect_with).
    pub async fn connect(url: &str) -> Result<Self, GameLinkError> {
        let store = FileSessionStore::default_location()?;
        Self::connect_with(url, SocketConfig::from_env(), store).await
    }
}

impl<S: SessionStore> Socket<WebSocketConnection, HttpApi, S> {
    /// Connects to the server at `url`.
    ///
    /// The URL may omit its scheme, in which case TLS is detected. The
    /// server's `/api/info` must name the game and its protocol version; an
    /// incompatible version is logged but not fatal. The WebSocket is
    /// opened at `/api/ws`.
    pub async fn connect_with(
        url: &str,
        config: SocketConfig,
        store: S,
    ) -> Result<Self, GameLinkError> {
        let api = HttpApi::connect(url, config.tls_timeout).await?;
        let info = api.fetch_info().await?;

        let compatibility = check_version(&info.cg_version, PROTOCOL_VERSION);
        if !compatibility.is_compatible() {
            warn!(
                server = %info.cg_version,
                client = PROTOCOL_VERSION,
                ?compatibility,
                "protocol version mismatch"
            );
        }

        let conn = WebSocketConnection::connect(&api.endpoint().ws_url("/api/ws")).await?;
        info!(
            conn_id = %conn.id(),
            game = %info.name,
            endpoint = api.endpoint().host(),
            "connected"
        );

        Ok(Self::build(conn, api, store, config, Some(info)))
    }
}

impl<C: Connection, A: GameApi, S: SessionStore> Socket<C, A, S> {
    /// Wraps an already-open connection.
    pub fn from_parts(conn: C, api: A, store: S, config: SocketConfig) -> Self {
        Self::build(conn, api, store, config, None)
    }

    fn build(conn: C, api: A, store: S, config: SocketConfig, info: Option<ServerInfo>) -> Self {
        let registry = CallbackRegistry::new();
        let usernames = Arc::new(UsernameCache::new());
        register_cache_handlers(&registry, &usernames);

        Self {
            inner: Arc::new(Inner {
                conn: Arc::new(conn),
                api,
                store,
                codec: JsonCodec,
                config,
                info,
                registry,
                usernames,
                lifecycle: Lifecycle::new(),
                session: Mutex::new(None),
                queue: tokio::sync::Mutex::new(None),
                listener: Mutex::new(None),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The trimmed server address, also the key sessions are stored under.
    pub fn game_url(&self) -> &str {
        self.inner.api.endpoint().host()
    }

    /// What the server reported about itself, if connected through
    /// [`connect`](Socket::connect).
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.inner.info.as_ref()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lifecycle.get()
    }

    /// The current game's credentials. Spectators get a session with an
    /// empty player id.
    pub fn session(&self) -> Option<Session> {
        lock(&self.inner.session).clone()
    }

    pub fn is_spectator(&self) -> bool {
        lock(&self.inner.session)
            .as_ref()
            .is_some_and(|session| session.player_id.is_empty())
    }

    pub fn config(&self) -> &SocketConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &A {
        &self.inner.api
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Resolves once the socket is closed, returning the final state.
    pub async fn closed(&self) -> ConnectionState {
        self.inner.lifecycle.wait_closed().await
    }

    // -----------------------------------------------------------------------
    // Callbacks
    // -----------------------------------------------------------------------

    /// Registers `handler` for every event named `name`.
    pub fn on<F>(&self, name: &str, handler: F) -> CallbackId
    where
        F: Fn(&Origin, &Event) + Send + Sync + 'static,
    {
        self.inner.registry.on(name, handler)
    }

    /// Registers `handler` for the next event named `name` only.
    pub fn once<F>(&self, name: &str, handler: F) -> CallbackId
    where
        F: Fn(&Origin, &Event) + Send + Sync + 'static,
    {
        self.inner.registry.once(name, handler)
    }

    /// Removes a callback. Unknown or already-removed ids are ignored.
    pub fn remove_callback(&self, id: CallbackId) {
        self.inner.registry.remove(id);
    }

    // -----------------------------------------------------------------------
    // REST passthroughs
    // -----------------------------------------------------------------------

    /// Creates a game on the server. Does not join it.
    pub async fn create_game(
        &self,
        request: &CreateGameRequest,
    ) -> Result<CreatedGame, GameLinkError> {
        let created = self.inner.api.create_game(request).await?;
        info!(
            game_id = %created.game_id,
            protected = created.join_secret.is_some(),
            "game created"
        );
        Ok(created)
    }

    /// Registers a player over REST. Use the returned credentials with
    /// [`connect_player`](Socket::connect_player).
    pub async fn register_player(
        &self,
        game_id: &str,
        username: &str,
        join_secret: Option<&str>,
    ) -> Result<RegisteredPlayer, GameLinkError> {
        let username = non_empty(username, "empty username")?;
        Ok(self
            .inner
            .api
            .register_player(game_id, username, join_secret)
            .await?)
    }

    /// Fetches and decodes a game's configuration.
    pub async fn fetch_game_config<T: DeserializeOwned>(
        &self,
        game_id: &str,
    ) -> Result<T, GameLinkError> {
        let raw = self.inner.api.fetch_game_config(game_id).await?;
        serde_json::from_value(raw)
            .map_err(|e| GameLinkError::Api(gamelink_api::ApiError::Decode(e)))
    }

    /// Repopulates the username cache from the server's roster.
    pub async fn refresh_roster(&self) -> Result<(), GameLinkError> {
        let game_id = self
            .session()
            .map(|session| session.game_id)
            .ok_or(GameLinkError::Precondition("no game joined"))?;
        let roster = self.inner.api.fetch_roster(&game_id).await?;
        self.inner.usernames.extend(roster);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Setup
    // -----------------------------------------------------------------------

    /// Joins `game_id` as a new player and persists the credentials.
    pub async fn join(
        &self,
        game_id: &str,
        username: &str,
        join_secret: Option<&str>,
    ) -> Result<Session, GameLinkError> {
        let game_id = non_empty(game_id, "empty game id")?;
        let username = non_empty(username, "empty username")?;

        let request = Event::new(
            standard::JOIN_GAME,
            &JoinGameData {
                game_id: game_id.to_owned(),
                username: username.to_owned(),
                join_secret: join_secret.map(str::to_owned),
            },
        )?;

        let key = (self.game_url().to_owned(), username.to_owned(), game_id.to_owned());
        let session = self
            .setup(&request, &[standard::JOINED_GAME], move |mut found| {
                let (game_url, username, game_id) = key;
                let joined = take_response(&mut found, standard::JOINED_GAME)?;
                let data: JoinedGameData = joined.event.decode_data()?;
                let player_id = if data.player_id.is_empty() {
                    joined.origin.player_id().unwrap_or_default().to_owned()
                } else {
                    data.player_id
                };
                if player_id.is_empty() {
                    return Err(ProtocolError::InvalidMessage(
                        "joined_game without a player id".into(),
                    )
                    .into());
                }
                Ok(Session::new(game_url, username, game_id, player_id, data.secret))
            })
            .await?;

        self.inner
            .usernames
            .insert(session.player_id.clone(), session.username.clone());
        self.persist(&session);
        info!(game_id, player_id = %session.player_id, "joined game");
        Ok(session)
    }

    /// Reconnects an existing player and persists the credentials.
    pub async fn connect_player(
        &self,
        game_id: &str,
        player_id: &str,
        player_secret: &str,
    ) -> Result<Session, GameLinkError> {
        let game_id = non_empty(game_id, "empty game id")?;
        let player_id = non_empty(player_id, "empty player id")?;

        let request = Event::new(
            standard::CONNECT,
            &ConnectData {
                game_id: game_id.to_owned(),
                player_id: player_id.to_owned(),
                secret: player_secret.to_owned(),
            },
        )?;

        let key = (
            self.game_url().to_owned(),
            game_id.to_owned(),
            player_id.to_owned(),
            player_secret.to_owned(),
        );
        let session = self
            .setup(&request, &[standard::CONNECTED], move |mut found| {
                let (game_url, game_id, player_id, secret) = key;
                let connected = take_response(&mut found, standard::CONNECTED)?;
                let data: ConnectedData = connected.event.decode_data()?;
                Ok(Session::new(game_url, data.username, game_id, player_id, secret))
            })
            .await?;

        self.inner
            .usernames
            .insert(session.player_id.clone(), session.username.clone());
        self.persist(&session);
        info!(game_id, player_id, "connected to game");
        Ok(session)
    }

    /// Watches `game_id` without joining. Spectators cannot send events.
    pub async fn spectate(&self, game_id: &str) -> Result<(), GameLinkError> {
        let game_id = non_empty(game_id, "empty game id")?;
        let request = Event::new(
            standard::SPECTATE,
            &SpectateData {
                game_id: game_id.to_owned(),
            },
        )?;

        let key = (self.game_url().to_owned(), game_id.to_owned());
        self.setup(&request, &[standard::GAME_INFO], move |_| {
            let (game_url, game_id) = key;
            Ok(Session::new(game_url, "", game_id, "", ""))
        })
        .await?;

        info!(game_id, "spectating game");
        Ok(())
    }

    /// Reconnects with the credentials saved for `username` on this server.
    ///
    /// Credentials the server rejects are removed from the store.
    pub async fn restore_session(&self, username: &str) -> Result<Session, GameLinkError> {
        let saved = self.inner.store.load(self.game_url(), username)?;

        match self
            .connect_player(&saved.game_id, &saved.player_id, &saved.player_secret)
            .await
        {
            Ok(session) => Ok(session),
            Err(e) if e.is_precondition() => Err(e),
            Err(e) => {
                info!(username, error = %e, "discarding stale session");
                if let Err(remove_err) = self.inner.store.remove(self.game_url(), username) {
                    warn!(username, error = %remove_err, "failed to remove session");
                }
                Err(e)
            }
        }
    }

    async fn setup<F>(
        &self,
        request: &Event,
        expected: &[&str],
        finish: F,
    ) -> Result<Session, GameLinkError>
    where
        F: FnOnce(HashMap<String, EventWrapper>) -> Result<Session, GameLinkError> + Send,
    {
        let inner = &self.inner;
        inner.lifecycle.begin_setup()?;

        let outcome = correlator::send_and_await(
            &*inner.conn,
            &inner.codec,
            &inner.registry,
            request,
            expected,
            inner.config.response_timeout,
        )
        .await
        .and_then(finish);

        match outcome {
            Ok(session) => {
                if !self.start(session.clone()).await {
                    debug!("socket closed during setup, discarding response");
                    return Err(GameLinkError::Closed);
                }
                Ok(session)
            }
            Err(e) => Err(self.abandon_setup(e)),
        }
    }

    /// Records the session and starts the receive loop. Returns `false`
    /// without starting anything if the socket was closed meanwhile.
    async fn start(&self, session: Session) -> bool {
        let inner = &self.inner;
        *lock(&inner.session) = Some(session);

        let (tx, rx) = mpsc::unbounded_channel();
        *inner.queue.lock().await = Some(rx);

        if !inner.lifecycle.open() {
            lock(&inner.session).take();
            inner.queue.lock().await.take();
            return false;
        }
        let handle = listener::spawn(
            Arc::clone(&inner.conn),
            inner.codec,
            inner.lifecycle.clone(),
            tx,
        );
        *lock(&inner.listener) = Some(handle);
        true
    }

    fn abandon_setup(&self, err: GameLinkError) -> GameLinkError {
        let lifecycle = &self.inner.lifecycle;
        match err {
            GameLinkError::Transport(e) => {
                warn!(conn_id = %self.inner.conn.id(), error = %e, "connection lost during setup");
                let e = Arc::new(e);
                lifecycle.finish(Err(Arc::clone(&e)));
                GameLinkError::ConnectionLost(e)
            }
            GameLinkError::Closed => {
                lifecycle.finish(Ok(()));
                GameLinkError::Closed
            }
            other => {
                debug!(error = %other, "setup failed");
                lifecycle.abandon_setup();
                other
            }
        }
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.inner.store.save(session) {
            warn!(game_url = %session.game_url, error = %e, "failed to save session");
        }
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    /// Sends a game event with `data` as payload.
    pub async fn send<T: Serialize>(&self, name: &str, data: &T) -> Result<(), GameLinkError> {
        let name = non_empty(name, "empty event name")?;
        let event = Event::new(name, data)?;
        self.send_event(&event).await
    }

    /// Sends a prebuilt event.
    ///
    /// Only players of an open socket may send; anything else is a
    /// [`GameLinkError::Precondition`].
    pub async fn send_event(&self, event: &Event) -> Result<(), GameLinkError> {
        self.check_can_send()?;
        let frame = encode_event(&self.inner.codec, event)?;
        self.inner.conn.send(frame).await?;
        debug!(event = %event.name, "event sent");
        Ok(())
    }

    fn check_can_send(&self) -> Result<(), GameLinkError> {
        if !self.inner.lifecycle.get().is_open() {
            return Err(GameLinkError::Precondition("socket is not open"));
        }
        match lock(&self.inner.session).as_ref() {
            None => Err(GameLinkError::Precondition("no game joined")),
            Some(session) if session.player_id.is_empty() => {
                Err(GameLinkError::Precondition("spectators cannot send events"))
            }
            Some(_) => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Draining
    // -----------------------------------------------------------------------

    /// Dispatches queued events until the connection closes.
    ///
    /// Returns `Ok(())` after a clean close and the transport error
    /// otherwise.
    pub async fn run_forever(&self) -> Result<(), GameLinkError> {
        let mut queue = self.inner.queue.lock().await;
        let Some(rx) = queue.as_mut() else {
            return Err(GameLinkError::Precondition("socket is not open"));
        };

        while let Some(wrapper) = rx.recv().await {
            self.inner.registry.dispatch(&wrapper.origin, &wrapper.event);
        }

        match self.inner.lifecycle.get().terminal_error() {
            None | Some(GameLinkError::Closed) => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Dispatches at most one queued event without waiting.
    ///
    /// Returns `Ok(None)` when nothing is queued (or another task is
    /// draining) and the terminal error once the connection is gone.
    pub fn pump_one(&self) -> Result<Option<EventWrapper>, GameLinkError> {
        let Ok(mut queue) = self.inner.queue.try_lock() else {
            return Ok(None);
        };
        let Some(rx) = queue.as_mut() else {
            return Err(GameLinkError::Precondition("socket is not open"));
        };

        match rx.try_recv() {
            Ok(wrapper) => {
                self.inner.registry.dispatch(&wrapper.origin, &wrapper.event);
                Ok(Some(wrapper))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(self
                .inner
                .lifecycle
                .get()
                .terminal_error()
                .unwrap_or(GameLinkError::Closed)),
        }
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Leaves the current game.
    ///
    /// Drops the application's callbacks, clears the username cache,
    /// removes the saved credentials and tells the server. The connection
    /// stays up. Leaving without a game only clears local state.
    pub async fn leave(&self) -> Result<(), GameLinkError> {
        let state = self.inner.lifecycle.get();
        if matches!(state, ConnectionState::Connecting) {
            return Err(GameLinkError::Precondition(
                "cannot leave while a setup call is pending",
            ));
        }

        self.inner.registry.clear_non_builtin();
        self.inner.usernames.clear();

        let Some(session) = lock(&self.inner.session).take() else {
            debug!("leave without a game");
            return Ok(());
        };

        if !session.player_id.is_empty() {
            if let Err(e) = self.inner.store.remove(&session.game_url, &session.username) {
                warn!(error = %e, "failed to remove session");
            }
        }

        info!(game_id = %session.game_id, "left game");
        if state.is_open() {
            let frame = encode_event(&self.inner.codec, &Event::empty(standard::LEAVE_GAME))?;
            self.inner.conn.send(frame).await?;
        }
        Ok(())
    }

    /// Closes the connection.
    ///
    /// Waits up to `close_grace` for the server to finish the close
    /// handshake, then drops the connection. Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), GameLinkError> {
        let inner = &self.inner;
        if !inner.lifecycle.begin_close() {
            return Ok(());
        }

        let conn_id = inner.conn.id();
        info!(%conn_id, "closing connection");
        if let Err(e) = inner.conn.close().await {
            debug!(%conn_id, error = %e, "close handshake failed");
            inner.conn.abort();
        }

        let listener = lock(&inner.listener).take();
        match listener {
            Some(mut handle) => {
                if tokio::time::timeout(inner.config.close_grace, &mut handle)
                    .await
                    .is_err()
                {
                    warn!(%conn_id, "close grace period elapsed, dropping connection");
                    inner.conn.abort();
                    let _ = handle.await;
                }
            }
            None => inner.conn.abort(),
        }

        inner.lifecycle.finish(Ok(()));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Usernames
    // -----------------------------------------------------------------------

    /// The cached username of `player_id`, without a server round trip.
    pub fn cached_username(&self, player_id: &str) -> Option<String> {
        self.inner.usernames.get(player_id)
    }

    /// A copy of every cached player id → username pair.
    pub fn usernames(&self) -> HashMap<String, String> {
        self.inner.usernames.snapshot()
    }

    /// The username of `player_id`, asking the server on a cache miss.
    ///
    /// Returns an empty string if the name cannot be determined.
    pub async fn username_of(&self, player_id: &str) -> String {
        if let Some(name) = self.inner.usernames.get(player_id) {
            return name;
        }
        let Some(game_id) = self.session().map(|session| session.game_id) else {
            return String::new();
        };

        match self.inner.api.fetch_username(&game_id, player_id).await {
            Ok(name) => {
                if !name.is_empty() {
                    self.inner.usernames.insert(player_id, name.clone());
                }
                name
            }
            Err(e) => {
                debug!(player_id, error = %e, "username lookup failed");
                String::new()
            }
        }
    }
}

impl<C: Connection, A, S> fmt::Debug for Socket<C, A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("conn_id", &self.inner.conn.id())
            .field("state", &self.inner.lifecycle.get())
            .field("callbacks", &self.inner.registry)
            .finish()
    }
}

/// Keeps the username cache in step with the standard roster events.
fn register_cache_handlers(registry: &CallbackRegistry, usernames: &Arc<UsernameCache>) {
    let cache = Arc::clone(usernames);
    registry.register_builtin(standard::NEW_PLAYER, move |origin, event| {
        let Some(player_id) = origin.player_id() else {
            return;
        };
        match event.decode_data::<NewPlayerData>() {
            Ok(data) => cache.insert(player_id, data.username),
            Err(e) => debug!(error = %e, "malformed new_player event"),
        }
    });

    let cache = Arc::clone(usernames);
    registry.register_builtin(standard::LEFT_GAME, move |origin, _| {
        if let Some(player_id) = origin.player_id() {
            cache.remove(player_id);
        }
    });

    let cache = Arc::clone(usernames);
    registry.register_builtin(standard::GAME_INFO, move |_, event| {
        match event.decode_data::<GameInfoData>() {
            Ok(info) => cache.extend(info.players),
            Err(e) => debug!(error = %e, "malformed game_info event"),
        }
    });
}

fn take_response(
    found: &mut HashMap<String, EventWrapper>,
    name: &str,
) -> Result<EventWrapper, GameLinkError> {
    found.remove(name).ok_or_else(|| {
        ProtocolError::InvalidMessage(format!("missing {name} response")).into()
    })
}

fn non_empty<'a>(value: &'a str, what: &'static str) -> Result<&'a str, GameLinkError> {
    let value = value.trim();
    if value.is_empty() {
        Err(GameLinkError::InvalidArgument(what.to_owned()))
    } else {
        Ok(value)
    }
}
