//! WebSocket client connection using `tokio-tungstenite`.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionId, Frame, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A WebSocket connection to a game server.
///
/// The stream is split into independently locked halves so the receive
/// loop can wait on `recv` while the application sends.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    aborted: watch::Sender<bool>,
}

impl WebSocketConnection {
    /// Opens a WebSocket connection to `url` (`ws://` or `wss://`).
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (ws, _response) =
            tokio_tungstenite::connect_async(url).await.map_err(|e| {
                TransportError::ConnectFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, url, "opened WebSocket connection");

        let (sink, stream) = ws.split();
        let (aborted, _) = watch::channel(false);
        Ok(Self {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            aborted,
        })
    }
}

impl Connection for WebSocketConnection {
    async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        let msg = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Binary(data) => Message::Binary(data.into()),
        };
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Frame>, TransportError> {
        let aborted = self.aborted.subscribe();
        let mut stream = self.stream.lock().await;
        loop {
            let msg = tokio::select! {
                msg = stream.next() => msg,
                () = wait_for_abort(aborted.clone()) => return Ok(None),
            };
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Frame::Text(text.as_str().to_owned())));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(Frame::Binary(data.to_vec())));
                }
                Some(Ok(Message::Close(frame))) => {
                    return classify_close(self.id, frame);
                }
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(
                    tungstenite::Error::ConnectionClosed
                    | tungstenite::Error::AlreadyClosed,
                ))
                | None => return Ok(None),
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: String::new().into(),
        };
        match self.sink.lock().await.send(Message::Close(Some(frame))).await {
            Ok(())
            | Err(
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::AlreadyClosed,
            ) => Ok(()),
            Err(e) => Err(TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))),
        }
    }

    fn abort(&self) {
        tracing::debug!(id = %self.id, "aborting WebSocket connection");
        self.aborted.send_replace(true);
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Resolves once `abort` has been called.
async fn wait_for_abort(mut aborted: watch::Receiver<bool>) {
    loop {
        if *aborted.borrow_and_update() {
            return;
        }
        if aborted.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Normal closure, going away, and "no status received" are clean; every
/// other close code is reported as an error.
fn classify_close(
    id: ConnectionId,
    frame: Option<CloseFrame>,
) -> Result<Option<Frame>, TransportError> {
    let Some(frame) = frame else {
        tracing::debug!(%id, "connection closed without status");
        return Ok(None);
    };
    match frame.code {
        CloseCode::Normal | CloseCode::Away | CloseCode::Status => {
            tracing::debug!(%id, code = u16::from(frame.code), "connection closed");
            Ok(None)
        }
        code => Err(TransportError::ConnectionClosed(format!(
            "{}: {}",
            u16::from(code),
            frame.reason.as_str()
        ))),
    }
}
