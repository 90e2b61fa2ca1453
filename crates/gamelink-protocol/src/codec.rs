//! Codec trait and the JSON implementation used on the wire.
//!
//! A "codec" converts between Rust types and raw bytes. The game protocol
//! is JSON over text frames, so [`JsonCodec`] is the only implementation;
//! the trait keeps the runtime independent of that choice.

use gamelink_transport::Frame;
use serde::{Serialize, de::DeserializeOwned};

use crate::{Event, EventWrapper, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the codec is shared between the
/// application task and the background receive loop.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use gamelink_protocol::{Codec, Event, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Event::empty("leave_game")).unwrap();
/// let decoded: Event = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded.name, "leave_game");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

/// Decodes an inbound frame into an [`EventWrapper`].
///
/// # Errors
/// - [`ProtocolError::UnexpectedFrame`] for binary frames
/// - [`ProtocolError::Decode`] for text that isn't a valid envelope
/// - [`ProtocolError::EmptyEventName`] if the event name is empty
pub fn decode_frame<C: Codec>(
    codec: &C,
    frame: &Frame,
) -> Result<EventWrapper, ProtocolError> {
    let Frame::Text(text) = frame else {
        return Err(ProtocolError::UnexpectedFrame);
    };
    let wrapper: EventWrapper = codec.decode(text.as_bytes())?;
    if wrapper.event.name.is_empty() {
        return Err(ProtocolError::EmptyEventName);
    }
    Ok(wrapper)
}

/// Encodes an outbound event as a text frame.
pub fn encode_event<C: Codec>(
    codec: &C,
    event: &Event,
) -> Result<Frame, ProtocolError> {
    let bytes = codec.encode(event)?;
    let text = String::from_utf8(bytes).map_err(|e| {
        ProtocolError::InvalidMessage(format!("encoded event is not UTF-8: {e}"))
    })?;
    Ok(Frame::Text(text))
}
