//! Error types for the REST layer.

/// Errors that can occur while talking to a server's HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The URL was empty after trimming.
    #[error("invalid server url: {0:?}")]
    InvalidUrl(String),

    /// The request could not be sent or the response body could not be
    /// read or decoded.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with an unexpected status code.
    #[error("unexpected response status: expected {expected}, got {got}{}", body_suffix(.body))]
    Status { expected: u16, got: u16, body: String },

    /// `/api/info` answered but is missing a required field.
    #[error("invalid server info: empty `{0}` field")]
    InvalidInfo(&'static str),

    /// A request body could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// A response body could not be turned into the requested type.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}
