//! Error types for the session layer.

/// Errors that can occur while loading, saving or removing credentials.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No credentials are stored for this server and username.
    #[error("no session stored for {username} on {game_url}")]
    NotFound { game_url: String, username: String },

    /// The session has no game URL, so there is no key to store it under.
    #[error("session has an empty game url")]
    MissingGameUrl,

    /// No per-user data directory could be determined.
    #[error("could not determine a data directory for session files")]
    NoDataDir,

    /// Reading or writing the session file failed.
    #[error("session file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The session file could not be written as JSON.
    #[error("failed to encode session: {0}")]
    Encode(#[source] serde_json::Error),

    /// The session file exists but is not valid JSON credentials.
    #[error("failed to decode session: {0}")]
    Decode(#[source] serde_json::Error),
}

impl SessionError {
    /// Returns `true` for [`SessionError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound { .. })
    }
}
