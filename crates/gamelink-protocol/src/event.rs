//! Event types: the units of communication on the wire.
//!
//! A client sends bare [`Event`]s. The server relays them to other clients
//! wrapped in an [`EventWrapper`] that records who sent the event
//! ([`Origin`]) and, optionally, who it was addressed to ([`EventTarget`]).
//!
//! ```text
//! client → server:  { "name": "move", "data": { "x": 1 } }
//! server → client:  { "origin": "p2",
//!                     "target": { "type": "game", "id": "g1" },
//!                     "event":  { "name": "move", "data": { "x": 1 } } }
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A named message with an opaque JSON payload.
///
/// The runtime routes events purely by `name`; `data` is only interpreted
/// by whoever registered a callback for that name, through
/// [`decode_data`](Self::decode_data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The event name. Never empty for an event that came off the wire.
    pub name: String,

    /// The payload. Missing payloads decode as `null`.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Event {
    /// Builds an event by serializing `data` into the payload.
    pub fn new<T: Serialize>(
        name: impl Into<String>,
        data: &T,
    ) -> Result<Self, ProtocolError> {
        let data = serde_json::to_value(data).map_err(ProtocolError::Encode)?;
        Ok(Self {
            name: name.into(),
            data,
        })
    }

    /// Builds an event with an empty object as payload.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Decodes the payload into `T`.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        T::deserialize(&self.data).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// Who sent an event.
///
/// On the wire this is a plain string: `"server"` for the server itself,
/// `"self"` for events the server attributes to the receiving client, and
/// any other value is a player id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Origin {
    /// The game server.
    #[default]
    Server,
    /// The receiving client, as addressed by the server (wire `"self"`).
    Own,
    /// The local runtime, for events it synthesizes such as framing
    /// errors. Decoding never produces this variant.
    Local,
    /// Another participant, identified by player id.
    Player(String),
}

impl Origin {
    const SERVER: &'static str = "server";
    const OWN: &'static str = "self";

    /// Returns the player id if the event came from a participant.
    pub fn player_id(&self) -> Option<&str> {
        match self {
            Origin::Player(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            Origin::Server => Self::SERVER,
            Origin::Own | Origin::Local => Self::OWN,
            Origin::Player(id) => id,
        }
    }
}

impl From<String> for Origin {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::SERVER => Origin::Server,
            Self::OWN => Origin::Own,
            _ => Origin::Player(value),
        }
    }
}

impl From<Origin> for String {
    fn from(value: Origin) -> Self {
        match value {
            Origin::Player(id) => id,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EventTarget
// ---------------------------------------------------------------------------

/// What kind of recipient an event was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Everyone in the game.
    Game,
    /// One specific socket.
    Socket,
    /// The receiving client itself.
    #[serde(rename = "self")]
    Local,
}

/// The addressee of a relayed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTarget {
    /// Recipient kind.
    #[serde(rename = "type")]
    pub kind: TargetKind,
    /// Game or socket id; empty for [`TargetKind::Local`].
    #[serde(default)]
    pub id: String,
}

// ---------------------------------------------------------------------------
// EventWrapper
// ---------------------------------------------------------------------------

/// An event as received from the server, together with its sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWrapper {
    /// Addressee, if the server included one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<EventTarget>,

    /// Sender. Defaults to the server when missing.
    #[serde(default)]
    pub origin: Origin,

    /// The event itself.
    pub event: Event,
}

impl EventWrapper {
    /// Wraps an event with the given origin and no target.
    pub fn new(origin: Origin, event: Event) -> Self {
        Self {
            target: None,
            origin,
            event,
        }
    }

    /// Shorthand for `self.event.name`.
    pub fn name(&self) -> &str {
        &self.event.name
    }
}
