//! Request/response correlation for the setup handshake.
//!
//! Setup calls run before the receive loop exists, so the correlator reads
//! the connection itself. Every event it reads still goes through the
//! callback registry, which keeps the built-in handlers (the username
//! cache) current while waiting.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use gamelink_protocol::standard::{self, ErrorData};
use gamelink_protocol::{Event, EventWrapper, JsonCodec, decode_frame, encode_event};
use gamelink_transport::Connection;
use tracing::{debug, warn};

use crate::listener::local_error;
use crate::{CallbackRegistry, GameLinkError};

/// Sends `request` and waits until every name in `expected` has arrived.
///
/// Returns the matching events keyed by name. Unrelated events are
/// dispatched and otherwise ignored. A server `error` event fails the call
/// with the server's reason; undecodable frames are reported as local
/// `error` events and skipped.
pub(crate) async fn send_and_await<C: Connection>(
    conn: &C,
    codec: &JsonCodec,
    registry: &CallbackRegistry,
    request: &Event,
    expected: &[&str],
    timeout: Option<Duration>,
) -> Result<HashMap<String, EventWrapper>, GameLinkError> {
    let frame = encode_event(codec, request)?;
    conn.send(frame).await?;
    debug!(conn_id = %conn.id(), request = %request.name, ?expected, "awaiting response");

    let responses = await_responses(conn, codec, registry, expected);
    match timeout {
        Some(limit) => tokio::time::timeout(limit, responses)
            .await
            .map_err(|_| GameLinkError::Timeout)?,
        None => responses.await,
    }
}

async fn await_responses<C: Connection>(
    conn: &C,
    codec: &JsonCodec,
    registry: &CallbackRegistry,
    expected: &[&str],
) -> Result<HashMap<String, EventWrapper>, GameLinkError> {
    let mut remaining: HashSet<&str> = expected.iter().copied().collect();
    let mut found = HashMap::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let Some(frame) = conn.recv().await? else {
            return Err(GameLinkError::Closed);
        };

        let wrapper = match decode_frame(codec, &frame) {
            Ok(wrapper) => wrapper,
            Err(e) => {
                warn!(conn_id = %conn.id(), error = %e, "skipping undecodable frame");
                let local = local_error(&e);
                registry.dispatch(&local.origin, &local.event);
                continue;
            }
        };

        registry.dispatch(&wrapper.origin, &wrapper.event);

        if remaining.remove(wrapper.name()) {
            found.insert(wrapper.name().to_owned(), wrapper);
            continue;
        }

        if wrapper.name() == standard::ERROR {
            let reason = wrapper
                .event
                .decode_data::<ErrorData>()
                .map(|data| data.reason)
                .unwrap_or_else(|_| "unknown error".to_owned());
            return Err(GameLinkError::Server { reason });
        }

        debug!(event = wrapper.name(), "unrelated event while awaiting response");
    }

    Ok(found)
}
