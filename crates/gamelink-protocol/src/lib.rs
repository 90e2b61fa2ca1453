//! Wire protocol for gamelink.
//!
//! This crate defines the "language" a client and a game server speak:
//!
//! - **Events** ([`Event`], [`EventWrapper`], [`Origin`], [`EventTarget`]):
//!   named messages with an opaque JSON payload, and the envelope the server
//!   wraps around them when relaying.
//! - **Standard events** ([`standard`]): the reserved names the runtime
//!   itself reacts to (handshake, roster, errors).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become text
//!   frames and back.
//! - **Versioning** ([`check_version`]): protocol compatibility rules.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (EventWrapper) → Socket runtime (callbacks)
//! ```
//!
//! The protocol layer never looks inside an event's payload except for the
//! standard events. Everything else is routed by name.

mod codec;
mod error;
mod event;
pub mod standard;
mod version;

pub use codec::{Codec, JsonCodec, decode_frame, encode_event};
pub use error::ProtocolError;
pub use event::{Event, EventTarget, EventWrapper, Origin, TargetKind};
pub use version::{PROTOCOL_VERSION, VersionCheck, check_version};
