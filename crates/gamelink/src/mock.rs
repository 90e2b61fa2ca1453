//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use gamelink_api::{
    ApiError, CreateGameRequest, CreatedGame, Endpoint, GameApi, RegisteredPlayer, ServerInfo,
};
use gamelink_protocol::Event;
use gamelink_transport::{Connection, ConnectionId, Frame, TransportError};
use tokio::sync::{mpsc, watch};

type Incoming = Result<Option<Frame>, TransportError>;

static NEXT_MOCK_ID: AtomicU64 = AtomicU64::new(1);

/// A [`Connection`] fed by a [`MockPeer`].
pub(crate) struct MockConnection {
    id: ConnectionId,
    incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<Incoming>>,
    sent: Arc<Mutex<Vec<Frame>>>,
    stopped: watch::Sender<bool>,
    finished: AtomicBool,
    close_calls: Arc<AtomicUsize>,
    ignore_close: Arc<AtomicBool>,
}

/// The "server" end of a [`MockConnection`].
pub(crate) struct MockPeer {
    tx: mpsc::UnboundedSender<Incoming>,
    sent: Arc<Mutex<Vec<Frame>>>,
    close_calls: Arc<AtomicUsize>,
    ignore_close: Arc<AtomicBool>,
}

impl MockConnection {
    pub(crate) fn pair() -> (MockConnection, MockPeer) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let close_calls = Arc::new(AtomicUsize::new(0));
        let ignore_close = Arc::new(AtomicBool::new(false));

        let conn = MockConnection {
            id: ConnectionId::new(NEXT_MOCK_ID.fetch_add(1, Ordering::Relaxed)),
            incoming: tokio::sync::Mutex::new(rx),
            sent: Arc::clone(&sent),
            stopped: watch::Sender::new(false),
            finished: AtomicBool::new(false),
            close_calls: Arc::clone(&close_calls),
            ignore_close: Arc::clone(&ignore_close),
        };
        let peer = MockPeer {
            tx,
            sent,
            close_calls,
            ignore_close,
        };
        (conn, peer)
    }
}

impl Connection for MockConnection {
    async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        if self.finished.load(Ordering::SeqCst) || *self.stopped.borrow() {
            return Err(TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock connection closed",
            )));
        }
        self.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Frame>, TransportError> {
        if self.finished.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let mut stopped = self.stopped.subscribe();
        let mut incoming = self.incoming.lock().await;

        let item = tokio::select! {
            biased;
            item = incoming.recv() => item,
            _ = stopped.wait_for(|stopped| *stopped) => Some(Ok(None)),
        };

        match item {
            Some(Ok(Some(frame))) => Ok(Some(frame)),
            Some(Ok(None)) | None => {
                self.finished.store(true, Ordering::SeqCst);
                Ok(None)
            }
            Some(Err(e)) => {
                self.finished.store(true, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if !self.ignore_close.load(Ordering::SeqCst) {
            self.stopped.send_replace(true);
        }
        Ok(())
    }

    fn abort(&self) {
        self.stopped.send_replace(true);
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

impl MockPeer {
    /// Delivers a wrapped event. `origin` is the raw wire value.
    pub(crate) fn push_event(&self, origin: &str, name: &str, data: serde_json::Value) {
        let text = serde_json::json!({
            "origin": origin,
            "event": { "name": name, "data": data },
        })
        .to_string();
        self.push_frame(Frame::Text(text));
    }

    pub(crate) fn push_frame(&self, frame: Frame) {
        let _ = self.tx.send(Ok(Some(frame)));
    }

    /// The server closes the connection normally.
    pub(crate) fn close_clean(&self) {
        let _ = self.tx.send(Ok(None));
    }

    /// The connection fails with `err`.
    pub(crate) fn fail(&self, err: TransportError) {
        let _ = self.tx.send(Err(err));
    }

    /// Makes the server ignore close requests, so only `abort` ends the
    /// connection.
    pub(crate) fn ignore_close(&self) {
        self.ignore_close.store(true, Ordering::SeqCst);
    }

    pub(crate) fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Every event the client sent, in order.
    pub(crate) fn sent_events(&self) -> Vec<Event> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|frame| match frame {
                Frame::Text(text) => serde_json::from_str(text).ok(),
                Frame::Binary(_) => None,
            })
            .collect()
    }
}

/// A [`GameApi`] answering from in-memory tables.
pub(crate) struct MockApi {
    endpoint: Endpoint,
    pub(crate) usernames: Mutex<HashMap<String, String>>,
    pub(crate) roster: Mutex<HashMap<String, String>>,
    pub(crate) config: serde_json::Value,
    pub(crate) username_lookups: AtomicUsize,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self {
            endpoint: Endpoint::new("games.test:8080", false),
            usernames: Mutex::new(HashMap::new()),
            roster: Mutex::new(HashMap::new()),
            config: serde_json::json!({ "size": 3 }),
            username_lookups: AtomicUsize::new(0),
        }
    }

    fn not_found() -> ApiError {
        ApiError::Status {
            expected: 200,
            got: 404,
            body: String::new(),
        }
    }
}

impl GameApi for MockApi {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn fetch_info(&self) -> Result<ServerInfo, ApiError> {
        Err(Self::not_found())
    }

    async fn create_game(&self, request: &CreateGameRequest) -> Result<CreatedGame, ApiError> {
        Ok(CreatedGame {
            game_id: "g1".into(),
            join_secret: request.protected.then(|| "js".to_owned()),
        })
    }

    async fn register_player(
        &self,
        _game_id: &str,
        _username: &str,
        _join_secret: Option<&str>,
    ) -> Result<RegisteredPlayer, ApiError> {
        Ok(RegisteredPlayer {
            player_id: "p9".into(),
            player_secret: "s9".into(),
        })
    }

    async fn fetch_username(&self, _game_id: &str, player_id: &str) -> Result<String, ApiError> {
        self.username_lookups.fetch_add(1, Ordering::SeqCst);
        self.usernames
            .lock()
            .unwrap()
            .get(player_id)
            .cloned()
            .ok_or_else(Self::not_found)
    }

    async fn fetch_roster(&self, _game_id: &str) -> Result<HashMap<String, String>, ApiError> {
        Ok(self.roster.lock().unwrap().clone())
    }

    async fn fetch_game_config(&self, _game_id: &str) -> Result<serde_json::Value, ApiError> {
        Ok(self.config.clone())
    }
}
