//! Unified error type for the gamelink runtime.

use std::sync::Arc;

use gamelink_api::ApiError;
use gamelink_protocol::ProtocolError;
use gamelink_session::SessionError;
use gamelink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each wrapping variant generates the `From`
/// impls, so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GameLinkError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Loading, saving or removing credentials failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A REST call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server answered a pending request with an `error` event.
    #[error("server error: {reason}")]
    Server { reason: String },

    /// The connection was closed cleanly.
    #[error("connection closed")]
    Closed,

    /// The connection failed. The same error is reported on every call
    /// after the receive loop stopped.
    #[error("connection lost: {0}")]
    ConnectionLost(Arc<TransportError>),

    /// The call is not allowed in the socket's current state.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),

    /// Caller input was rejected before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No response arrived within the configured response timeout.
    #[error("timed out waiting for a response")]
    Timeout,
}

impl GameLinkError {
    /// Returns `true` for programming-contract violations.
    pub fn is_precondition(&self) -> bool {
        matches!(self, GameLinkError::Precondition(_))
    }

    /// Returns `true` if the socket can no longer be used.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GameLinkError::Closed | GameLinkError::ConnectionLost(_)
        )
    }
}
