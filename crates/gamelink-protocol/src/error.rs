//! Error types for the protocol layer.
//!
//! Every variant here is a *framing* problem: the bytes on the wire could
//! not be turned into an event. The socket runtime treats these as
//! recoverable and skips the offending frame.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into JSON).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or a payload
    /// that does not match the requested type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A binary (or otherwise non-text) frame arrived. The protocol is
    /// text-only.
    #[error("invalid message type: expected a text frame")]
    UnexpectedFrame,

    /// The envelope decoded but the event name was empty.
    #[error("decode failed: empty event name")]
    EmptyEventName,

    /// The message is invalid at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
