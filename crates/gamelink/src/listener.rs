//! The background receive loop.
//!
//! One task per open socket reads frames, decodes them and pushes them
//! onto an unbounded queue for the drain side. Framing errors become local
//! `error` events and the loop keeps going. The loop ends on close or
//! transport failure, records the outcome in the [`Lifecycle`], and only
//! then drops the queue's sender, so a consumer that sees the queue closed
//! always finds the terminal state already set.

use std::sync::Arc;

use gamelink_protocol::standard;
use gamelink_protocol::{Event, EventWrapper, JsonCodec, Origin, ProtocolError, decode_frame};
use gamelink_transport::Connection;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::Lifecycle;

/// Builds the synthetic `error` event reported for a bad frame.
pub(crate) fn local_error(err: &ProtocolError) -> EventWrapper {
    let mut data = serde_json::Map::new();
    data.insert("reason".to_owned(), serde_json::Value::String(err.to_string()));
    let event = Event {
        name: standard::ERROR.to_owned(),
        data: serde_json::Value::Object(data),
    };
    EventWrapper::new(Origin::Local, event)
}

/// Spawns the receive loop for `conn`.
pub(crate) fn spawn<C: Connection>(
    conn: Arc<C>,
    codec: JsonCodec,
    lifecycle: Lifecycle,
    tx: mpsc::UnboundedSender<EventWrapper>,
) -> JoinHandle<()> {
    tokio::spawn(run(conn, codec, lifecycle, tx))
}

async fn run<C: Connection>(
    conn: Arc<C>,
    codec: JsonCodec,
    lifecycle: Lifecycle,
    tx: mpsc::UnboundedSender<EventWrapper>,
) {
    let conn_id = conn.id();
    debug!(%conn_id, "receive loop started");

    let outcome = loop {
        let frame = match conn.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!(%conn_id, "connection closed");
                break Ok(());
            }
            Err(e) => {
                warn!(%conn_id, error = %e, "connection lost");
                break Err(Arc::new(e));
            }
        };

        let wrapper = match decode_frame(&codec, &frame) {
            Ok(wrapper) => wrapper,
            Err(e) => {
                warn!(%conn_id, error = %e, "skipping undecodable frame");
                local_error(&e)
            }
        };

        debug!(%conn_id, event = wrapper.name(), origin = %wrapper.origin, "event received");
        if tx.send(wrapper).is_err() {
            debug!(%conn_id, "socket dropped, stopping receive loop");
            break Ok(());
        }
    };

    lifecycle.finish(outcome);
    drop(tx);
}
