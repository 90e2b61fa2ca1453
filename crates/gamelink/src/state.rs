//! Connection lifecycle state machine.
//!
//! Transitions only move forward:
//!
//! ```text
//! Idle → Connecting → Open → Closing → Closed(reason)
//!   ↑         │         │                  ↑
//!   └─────────┘         └──────────────────┘
//!  setup abandoned        receive loop ended
//! ```
//!
//! - **Idle**: connected at the transport level, no game set up yet.
//! - **Connecting**: a setup call (join, connect, spectate) is waiting for
//!   the server's answer.
//! - **Open**: the receive loop is running.
//! - **Closing**: `close` was called and the close handshake is in flight.
//! - **Closed**: terminal. A closed socket is never reused.

use std::fmt;
use std::sync::Arc;

use gamelink_transport::TransportError;
use tokio::sync::watch;

use crate::GameLinkError;

/// Why a socket reached [`ConnectionState::Closed`].
#[derive(Debug, Clone)]
pub enum CloseReason {
    /// Normal closure by either side.
    Clean,
    /// The transport failed.
    Error(Arc<TransportError>),
}

/// Where a socket is in its lifecycle.
#[derive(Debug, Clone)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed(CloseReason),
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }

    /// The error a drain call reports once the socket is closed.
    pub(crate) fn terminal_error(&self) -> Option<GameLinkError> {
        match self {
            Self::Closed(CloseReason::Clean) => Some(GameLinkError::Closed),
            Self::Closed(CloseReason::Error(e)) => {
                Some(GameLinkError::ConnectionLost(Arc::clone(e)))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Closing => write!(f, "Closing"),
            Self::Closed(CloseReason::Clean) => write!(f, "Closed"),
            Self::Closed(CloseReason::Error(e)) => write!(f, "Closed({e})"),
        }
    }
}

/// Shared handle to a socket's state, observable through a watch channel.
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    tx: Arc<watch::Sender<ConnectionState>>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(ConnectionState::Idle)),
        }
    }

    pub(crate) fn get(&self) -> ConnectionState {
        self.tx.borrow().clone()
    }

    /// Idle → Connecting.
    pub(crate) fn begin_setup(&self) -> Result<(), GameLinkError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|state| match state {
            ConnectionState::Idle => {
                *state = ConnectionState::Connecting;
                true
            }
            ConnectionState::Connecting => {
                result = Err(GameLinkError::Precondition("a setup call is already pending"));
                false
            }
            ConnectionState::Open => {
                result = Err(GameLinkError::Precondition(
                    "a game was already set up on this socket",
                ));
                false
            }
            ConnectionState::Closing | ConnectionState::Closed(_) => {
                result = Err(GameLinkError::Precondition("socket is closed"));
                false
            }
        });
        result
    }

    /// Connecting → Idle.
    pub(crate) fn abandon_setup(&self) {
        self.tx.send_if_modified(|state| {
            if matches!(state, ConnectionState::Connecting) {
                *state = ConnectionState::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Connecting → Open.
    pub(crate) fn open(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if matches!(state, ConnectionState::Connecting) {
                *state = ConnectionState::Open;
                true
            } else {
                false
            }
        })
    }

    /// Any non-terminal state → Closing. Returns `false` if the socket is
    /// already closing or closed.
    pub(crate) fn begin_close(&self) -> bool {
        self.tx.send_if_modified(|state| match state {
            ConnectionState::Closing | ConnectionState::Closed(_) => false,
            _ => {
                *state = ConnectionState::Closing;
                true
            }
        })
    }

    /// Moves to `Closed`. A transport error seen while closing is part of
    /// tearing the connection down and counts as a clean close.
    pub(crate) fn finish(&self, outcome: Result<(), Arc<TransportError>>) {
        self.tx.send_if_modified(|state| {
            let reason = match (&*state, outcome) {
                (ConnectionState::Closed(_), _) => return false,
                (ConnectionState::Closing, _) | (_, Ok(())) => CloseReason::Clean,
                (_, Err(e)) => CloseReason::Error(e),
            };
            *state = ConnectionState::Closed(reason);
            true
        });
    }

    /// Resolves once the state is `Closed`.
    pub(crate) async fn wait_closed(&self) -> ConnectionState {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(ConnectionState::is_closed).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.get(),
        }
    }
}
